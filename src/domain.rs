use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SnpfetchError;

/// Genome assembly version, selecting the Ensembl REST host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum GenomeBuild {
    #[value(name = "37")]
    #[serde(rename = "37")]
    Grch37,
    #[value(name = "38")]
    #[serde(rename = "38")]
    Grch38,
}

impl GenomeBuild {
    /// Host prefix of the REST server for this build. GRCh38 is the
    /// unprefixed default host.
    pub fn host_prefix(&self) -> &'static str {
        match self {
            GenomeBuild::Grch37 => "grch37.",
            GenomeBuild::Grch38 => "",
        }
    }

    pub fn server_url(&self) -> String {
        format!("https://{}rest.ensembl.org", self.host_prefix())
    }
}

impl fmt::Display for GenomeBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenomeBuild::Grch37 => write!(f, "37"),
            GenomeBuild::Grch38 => write!(f, "38"),
        }
    }
}

impl FromStr for GenomeBuild {
    type Err = SnpfetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "37" => Ok(GenomeBuild::Grch37),
            "38" => Ok(GenomeBuild::Grch38),
            _ => Err(SnpfetchError::NonexistentGenomeBuild(value.to_string())),
        }
    }
}
