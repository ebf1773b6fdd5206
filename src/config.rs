use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{DEFAULT_EXTENSION, default_headers};
use crate::domain::GenomeBuild;
use crate::error::SnpfetchError;
use crate::features::RequestedFeatures;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub features: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub build: GenomeBuild,
    pub extension: String,
    pub headers: BTreeMap<String, String>,
    pub features: Option<RequestedFeatures>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolves `snpfetch.json` (or an explicit path). A missing default
    /// file just yields the defaults; an explicit path must exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SnpfetchError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("snpfetch.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|err| SnpfetchError::FileRead {
            path: config_path.display().to_string(),
            message: err.to_string(),
        })?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| SnpfetchError::JsonFormat(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, SnpfetchError> {
        let build = match config.build {
            Some(code) => code.parse()?,
            None => GenomeBuild::Grch37,
        };
        let extension = config
            .extension
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        let headers = config.headers.unwrap_or_else(default_headers);
        let features = config
            .features
            .as_ref()
            .map(RequestedFeatures::from_value)
            .transpose()?;

        Ok(ResolvedConfig {
            build,
            extension,
            headers,
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_when_empty() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.build, GenomeBuild::Grch37);
        assert_eq!(resolved.extension, DEFAULT_EXTENSION);
        assert_eq!(resolved.headers, default_headers());
        assert!(resolved.features.is_none());
    }

    #[test]
    fn explicit_values_resolve() {
        let config = Config {
            build: Some("38".to_string()),
            extension: Some("/variation/homo_sapiens".to_string()),
            headers: None,
            features: Some(json!(["MAF", ["mappings", ["location"]]])),
        };
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.build, GenomeBuild::Grch38);
        assert_eq!(resolved.features.unwrap().toplevel().len(), 2);
    }

    #[test]
    fn unknown_build_rejected() {
        let config = Config {
            build: Some("19".to_string()),
            ..Config::default()
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, SnpfetchError::NonexistentGenomeBuild(_));
    }
}
