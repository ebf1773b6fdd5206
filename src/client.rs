use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::warn;

use crate::domain::GenomeBuild;
use crate::error::SnpfetchError;

pub const DEFAULT_EXTENSION: &str = "/variation/homo_sapiens";
pub const OVERLAP_EXTENSION: &str = "/overlap/region/human/";
pub const DEFAULT_OVERLAP_FEATURES: [&str; 3] = ["variation", "gene", "regulatory"];

pub fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
    ])
}

/// Serializes a batch of SNP identifiers into the request body the
/// variation endpoint expects: `{"ids": [...]}`.
pub fn serialize_ids(ids: &[String]) -> Result<String, SnpfetchError> {
    serde_json::to_string(&serde_json::json!({ "ids": ids }))
        .map_err(|err| SnpfetchError::Payload(err.to_string()))
}

/// Parses the `--headers` flag: a JSON object whose values are all strings.
pub fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>, SnpfetchError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|_| SnpfetchError::HeadersNotMap(raw.to_string()))?;
    let Some(map) = value.as_object() else {
        return Err(SnpfetchError::HeadersNotMap(raw.to_string()));
    };
    let mut headers = BTreeMap::new();
    for (name, value) in map {
        let value = value
            .as_str()
            .ok_or_else(|| SnpfetchError::HeadersNotMap(raw.to_string()))?;
        headers.insert(name.clone(), value.to_string());
    }
    Ok(headers)
}

/// Builds the semicolon-joined query tail for per-location overlap lookups:
/// `content_type=...;accept=...;feature=<f>` per requested feature.
pub fn overlap_query_tail(features: &[&str]) -> String {
    let mut parts = vec![
        "content_type=application/json".to_string(),
        "accept=application/json".to_string(),
    ];
    parts.extend(features.iter().map(|feature| format!("feature={feature}")));
    parts.join(";")
}

pub trait EnsemblClient: Send + Sync {
    /// POSTs one batched identifier payload and returns the decoded JSON
    /// response verbatim.
    fn post_variants(&self, payload: &str) -> Result<Value, SnpfetchError>;

    /// GETs the overlap records for one location, returning the raw body
    /// text.
    fn get_overlap(&self, location: &str, tail: &str) -> Result<String, SnpfetchError>;

    /// The full URL `get_overlap` would request, for diagnostics.
    fn overlap_url(&self, location: &str, tail: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct EnsemblHttpClient {
    client: Client,
    server: String,
    extension: String,
}

impl EnsemblHttpClient {
    /// Validates the whole connection configuration up front; an invalid
    /// build, header set, or extension fails construction and nothing is
    /// left half-set.
    pub fn new(
        build: GenomeBuild,
        headers: &BTreeMap<String, String>,
        extension: &str,
    ) -> Result<Self, SnpfetchError> {
        let header_map = build_header_map(headers)?;
        let extension = validate_extension(extension)?;

        let client = Client::builder()
            .default_headers(header_map)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| SnpfetchError::Http(err.to_string()))?;

        Ok(Self {
            client,
            server: build.server_url(),
            extension,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, SnpfetchError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "Ensembl request failed".to_string());
        Err(SnpfetchError::RequestFailed { status, message })
    }
}

impl EnsemblClient for EnsemblHttpClient {
    fn post_variants(&self, payload: &str) -> Result<Value, SnpfetchError> {
        if payload.contains('\\') {
            // warn and continue: the request is still attempted
            warn!("{}", SnpfetchError::EscapedPayload(payload.to_string()));
        }

        let url = format!("{}{}", self.server, self.extension);
        let response = self
            .client
            .post(&url)
            .body(payload.to_string())
            .send()
            .map_err(|err| SnpfetchError::Http(err.to_string()))?;

        let response = if response.status().is_success() {
            response
        } else {
            // some deployments reject the raw body; retry the same payload
            // as a JSON-encoded body before giving up
            let raw_status = response.status().as_u16();
            warn!(status = raw_status, "raw-body POST rejected, retrying as JSON body");
            let value: Value = serde_json::from_str(payload)
                .map_err(|err| SnpfetchError::Payload(err.to_string()))?;
            let retry = self
                .client
                .post(&url)
                .json(&value)
                .send()
                .map_err(|err| SnpfetchError::Http(err.to_string()))?;
            Self::handle_status(retry)?
        };

        response
            .json::<Value>()
            .map_err(|err| SnpfetchError::Decode(err.to_string()))
    }

    fn get_overlap(&self, location: &str, tail: &str) -> Result<String, SnpfetchError> {
        let url = self.overlap_url(location, tail);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| SnpfetchError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .text()
            .map_err(|err| SnpfetchError::Decode(err.to_string()))
    }

    fn overlap_url(&self, location: &str, tail: &str) -> String {
        format!("{}{}{}?{}", self.server, OVERLAP_EXTENSION, location, tail)
    }
}

fn build_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, SnpfetchError> {
    if headers.is_empty() {
        return Err(SnpfetchError::EmptyHeaders);
    }
    let mut map = HeaderMap::new();
    map.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("snpfetch/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| SnpfetchError::InvalidHeader(err.to_string()))?,
    );
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| SnpfetchError::InvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| SnpfetchError::InvalidHeader(value.clone()))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn validate_extension(extension: &str) -> Result<String, SnpfetchError> {
    if extension.is_empty() || !extension.starts_with('/') {
        return Err(SnpfetchError::InvalidExtension(extension.to_string()));
    }
    Ok(extension.to_string())
}
