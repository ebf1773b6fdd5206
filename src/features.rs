use serde_json::Value;
use tracing::warn;

use crate::error::SnpfetchError;

/// One entry of a feature specification: either a flat field name or a
/// one-level-nested group pulled from `record[parent][0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    Plain(String),
    Nested {
        parent: String,
        children: Vec<String>,
    },
}

impl Feature {
    pub fn plain(name: impl Into<String>) -> Self {
        Feature::Plain(name.into())
    }

    pub fn nested(parent: impl Into<String>, children: Vec<String>) -> Self {
        Feature::Nested {
            parent: parent.into(),
            children,
        }
    }

    /// Parses a `[parent, children]` descriptor pair. The pair must have
    /// exactly two elements; the second may be a single child name or an
    /// array of child names, all strings.
    pub fn sublevel_from_value(value: &Value) -> Result<Self, SnpfetchError> {
        let Some(parts) = value.as_array() else {
            return Err(SnpfetchError::SublevelNotPair(value.to_string()));
        };
        match parts.len() {
            2 => {}
            n if n > 2 => return Err(SnpfetchError::SublevelTooManyParts(n)),
            n => return Err(SnpfetchError::SublevelTooFewParts(n)),
        }

        let parent = parts[0]
            .as_str()
            .ok_or_else(|| SnpfetchError::FeatureNotString(parts[0].to_string()))?;

        let children = match &parts[1] {
            Value::String(child) => vec![child.clone()],
            Value::Array(items) => {
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    let child = item
                        .as_str()
                        .ok_or_else(|| SnpfetchError::FeatureNotString(item.to_string()))?;
                    children.push(child.to_string());
                }
                children
            }
            other => return Err(SnpfetchError::FeatureNotString(other.to_string())),
        };
        if children.is_empty() {
            return Err(SnpfetchError::EmptySublevel(parent.to_string()));
        }

        Ok(Feature::nested(parent, children))
    }
}

/// Which fields to pull out of each decoded record. Built once, then
/// immutable for the life of a query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestedFeatures {
    toplevel: Vec<Feature>,
}

impl RequestedFeatures {
    pub fn new(toplevel: Vec<Feature>) -> Self {
        Self { toplevel }
    }

    pub fn toplevel(&self) -> &[Feature] {
        &self.toplevel
    }

    /// Builds a specification from a JSON descriptor: a bare string is
    /// promoted to a single-element list; an array may mix field names and
    /// `[parent, children]` pairs. A malformed element is reported and
    /// skipped; the rest of the descriptor still builds. Any other
    /// container shape aborts the build.
    pub fn from_value(value: &Value) -> Result<Self, SnpfetchError> {
        match value {
            Value::String(name) => Ok(Self::new(vec![Feature::plain(name.clone())])),
            Value::Array(items) => {
                let mut toplevel = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(name) => toplevel.push(Feature::plain(name.clone())),
                        Value::Array(_) => match Feature::sublevel_from_value(item) {
                            Ok(feature) => toplevel.push(feature),
                            Err(err) => warn!("skipping feature descriptor: {err}"),
                        },
                        other => {
                            let err = SnpfetchError::FeatureNotString(other.to_string());
                            warn!("skipping feature descriptor: {err}");
                        }
                    }
                }
                Ok(Self::new(toplevel))
            }
            other => Err(SnpfetchError::UnsupportedFeaturesContainer(
                other.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn bare_string_promotes_to_single_feature() {
        let spec = RequestedFeatures::from_value(&json!("MAF")).unwrap();
        assert_eq!(spec.toplevel(), &[Feature::plain("MAF")]);
    }

    #[test]
    fn mixed_descriptor() {
        let spec =
            RequestedFeatures::from_value(&json!(["MAF", ["mappings", ["location"]]])).unwrap();
        assert_eq!(
            spec.toplevel(),
            &[
                Feature::plain("MAF"),
                Feature::nested("mappings", vec!["location".to_string()]),
            ]
        );
    }

    #[test]
    fn single_child_shorthand() {
        let feature = Feature::sublevel_from_value(&json!(["mappings", "location"])).unwrap();
        assert_eq!(
            feature,
            Feature::nested("mappings", vec!["location".to_string()])
        );
    }

    #[test]
    fn non_string_element_is_skipped() {
        let spec = RequestedFeatures::from_value(&json!(["MAF", 42, "name"])).unwrap();
        assert_eq!(
            spec.toplevel(),
            &[Feature::plain("MAF"), Feature::plain("name")]
        );
    }

    #[test]
    fn sublevel_arity_too_many() {
        let err =
            Feature::sublevel_from_value(&json!(["mappings", ["location"], "extra"])).unwrap_err();
        assert_matches!(err, SnpfetchError::SublevelTooManyParts(3));
    }

    #[test]
    fn sublevel_arity_too_few() {
        let err = Feature::sublevel_from_value(&json!(["mappings"])).unwrap_err();
        assert_matches!(err, SnpfetchError::SublevelTooFewParts(1));
    }

    #[test]
    fn sublevel_non_string_parent() {
        let err = Feature::sublevel_from_value(&json!([7, ["location"]])).unwrap_err();
        assert_matches!(err, SnpfetchError::FeatureNotString(_));
    }

    #[test]
    fn sublevel_empty_children() {
        let err = Feature::sublevel_from_value(&json!(["mappings", []])).unwrap_err();
        assert_matches!(err, SnpfetchError::EmptySublevel(_));
    }

    #[test]
    fn unsupported_container_aborts() {
        let err = RequestedFeatures::from_value(&json!({"MAF": true})).unwrap_err();
        assert_matches!(err, SnpfetchError::UnsupportedFeaturesContainer(_));
    }
}
