use std::path::Path;

use crate::error::PredictError;
use crate::features::EncodedFeatureVector;

/// Column order the model expects, one feature name per line of the artifact
///
/// Names are trimmed but otherwise taken as-is: no deduplication and no
/// check against the model's own schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureOrder {
    names: Vec<String>,
}

impl FeatureOrder {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parse(text: &str) -> Self {
        Self::new(text.lines().map(str::trim))
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Pick columns out of `encoded` in this order
    pub fn select(&self, encoded: &EncodedFeatureVector) -> Result<Vec<f64>, PredictError> {
        self.names
            .iter()
            .map(|name| {
                encoded.get(name).ok_or_else(|| PredictError::FeatureMismatch {
                    feature: name.clone(),
                })
            })
            .collect()
    }
}
