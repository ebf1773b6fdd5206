use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use snpfetch::app::{App, RunOptions, SnpSource};
use snpfetch::client::{EnsemblHttpClient, parse_headers};
use snpfetch::config::ConfigLoader;
use snpfetch::domain::GenomeBuild;
use snpfetch::error::SnpfetchError;
use snpfetch::features::RequestedFeatures;
use snpfetch::output::JsonOutput;

#[derive(Parser)]
#[command(name = "snpfetch")]
#[command(about = "Batch SNP lookup against the Ensembl REST API")]
#[command(version, author)]
struct Cli {
    /// Text file with one SNP identifier per line
    #[arg(short = 'i', long)]
    input: Option<String>,

    /// Cohort JSON file: subcohorts of analyses holding GWAS hits
    #[arg(long)]
    cohort: Option<String>,

    /// Genome build to query
    #[arg(short = 'b', long)]
    build: Option<GenomeBuild>,

    /// REST extension for the batched variation request
    #[arg(short = 'e', long)]
    extension: Option<String>,

    /// Request headers as a JSON object of strings
    #[arg(long)]
    headers: Option<String>,

    /// Feature descriptor as JSON: a field name, or an array mixing names
    /// and [parent, [children]] pairs
    #[arg(long)]
    features: Option<String>,

    /// Config file path (default: snpfetch.json when present)
    #[arg(long)]
    config: Option<String>,

    /// Report file prefix (default: first two '_'-separated parts of the
    /// input file stem)
    #[arg(long)]
    out_prefix: Option<String>,

    /// Append the full extracted entries, keyed by id, to this file
    #[arg(long)]
    dump: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<SnpfetchError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SnpfetchError) -> u8 {
    match error {
        SnpfetchError::FileRead { .. }
        | SnpfetchError::JsonFormat(_)
        | SnpfetchError::JsonIsEmpty
        | SnpfetchError::NoAnalysesFound
        | SnpfetchError::NoSnpsToQuery => 2,
        SnpfetchError::Http(_) | SnpfetchError::RequestFailed { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let resolved = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;

    let build = cli.build.unwrap_or(resolved.build);
    let extension = cli.extension.unwrap_or(resolved.extension);
    let headers = match cli.headers.as_deref() {
        Some(raw) => parse_headers(raw).into_diagnostic()?,
        None => resolved.headers,
    };
    let features = match cli.features.as_deref() {
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(raw)
                .map_err(|err| SnpfetchError::JsonFormat(err.to_string()))
                .into_diagnostic()?;
            Some(RequestedFeatures::from_value(&value).into_diagnostic()?)
        }
        None => resolved.features,
    };

    let source = match (cli.input, cli.cohort) {
        (Some(path), None) => SnpSource::List(Utf8PathBuf::from(path)),
        (None, Some(path)) => SnpSource::Cohort(Utf8PathBuf::from(path)),
        (Some(_), Some(_)) => {
            return Err(miette::Report::msg(
                "pass either --input or --cohort, not both",
            ));
        }
        (None, None) => {
            return Err(miette::Report::msg(
                "an input file is required (try --input or --cohort)",
            ));
        }
    };

    let client = EnsemblHttpClient::new(build, &headers, &extension).into_diagnostic()?;
    let app = App::new(client);
    let options = RunOptions {
        source,
        features,
        out_prefix: cli.out_prefix,
        dump_file: cli.dump.map(Utf8PathBuf::from),
    };
    let result = app.run(options).into_diagnostic()?;

    if cli.json {
        JsonOutput::print_run(&result).into_diagnostic()?;
    }
    Ok(())
}
