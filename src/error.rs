use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SnpfetchError {
    #[error("this genome build does not seem to exist: {0}")]
    NonexistentGenomeBuild(String),

    #[error("headers must be a JSON object of strings: {0}")]
    HeadersNotMap(String),

    #[error("at least one request header is required")]
    EmptyHeaders,

    #[error("invalid header entry: {0}")]
    InvalidHeader(String),

    #[error("extension must be a non-empty path starting with '/': {0}")]
    InvalidExtension(String),

    #[error("features container must be a string or an array: {0}")]
    UnsupportedFeaturesContainer(String),

    #[error("this feature is not a string: {0}")]
    FeatureNotString(String),

    #[error("sublevel has too many elements ({0}); expected a parent string and a child list, in that order")]
    SublevelTooManyParts(usize),

    #[error("sublevel has too few elements ({0}); expected a parent string and a child list, in that order")]
    SublevelTooFewParts(usize),

    #[error("sublevel must be a [parent, children] pair: {0}")]
    SublevelNotPair(String),

    #[error("sublevel child list is empty for parent: {0}")]
    EmptySublevel(String),

    #[error("failed to serialize request payload: {0}")]
    Payload(String),

    #[error("escaped content in request payload: {0}")]
    EscapedPayload(String),

    #[error("Ensembl request failed: {0}")]
    Http(String),

    #[error("Ensembl returned status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("decoded records are not a list: {0}")]
    DecodedRecordsNotList(String),

    #[error("this entry has no id field: {0}")]
    RecordHasNoId(String),

    #[error("failed to read {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("input JSON file is malformed: {0}")]
    JsonFormat(String),

    #[error("input JSON file is empty")]
    JsonIsEmpty,

    #[error("no analyses found in the input file")]
    NoAnalysesFound,

    #[error("none of the analyses contain SNPs to query")]
    NoSnpsToQuery,

    #[error("failed to write report {path}: {message}")]
    ReportWrite { path: String, message: String },
}
