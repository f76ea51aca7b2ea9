use serde::Serialize;
use std::fmt;

use crate::model::ModelError;

/// Broad classification of a prediction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Model or feature-order artifact missing or inconsistent
    Configuration,
    /// A request field could not be parsed
    Validation,
    /// Anything else that went wrong during encoding or inference
    Unexpected,
}

/// Prediction error types
#[derive(Debug, Clone, PartialEq)]
pub enum PredictError {
    /// No model was loaded at startup
    ModelUnavailable,
    /// Feature order names a column the encoder does not produce
    FeatureMismatch { feature: String },
    /// A request field failed to parse
    InvalidInput { field: &'static str, detail: String },
    /// Encoding or inference failed for another reason
    Unexpected(String),
}

impl PredictError {
    pub fn invalid_input(field: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelUnavailable | Self::FeatureMismatch { .. } => ErrorKind::Configuration,
            Self::InvalidInput { .. } => ErrorKind::Validation,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelUnavailable => write!(f, "Model unavailable"),
            Self::FeatureMismatch { feature } => {
                write!(f, "Feature order references unknown feature '{}'", feature)
            }
            Self::InvalidInput { field, detail } => {
                write!(f, "Invalid value for {}: {}", field, detail)
            }
            Self::Unexpected(msg) => write!(f, "Unexpected error: {}", msg),
        }
    }
}

impl std::error::Error for PredictError {}

/// Stable identifier used in logs, metrics labels and JSON reports
pub fn error_type_name(error: &PredictError) -> &'static str {
    match error {
        PredictError::ModelUnavailable => "model_unavailable",
        PredictError::FeatureMismatch { .. } => "feature_mismatch",
        PredictError::InvalidInput { .. } => "invalid_input",
        PredictError::Unexpected(_) => "unexpected_error",
    }
}

impl From<ModelError> for PredictError {
    fn from(err: ModelError) -> Self {
        Self::Unexpected(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PredictError::invalid_input("age", "invalid digit found in string");
        assert_eq!(
            error.to_string(),
            "Invalid value for age: invalid digit found in string"
        );
    }

    #[test]
    fn test_error_type_name() {
        assert_eq!(error_type_name(&PredictError::ModelUnavailable), "model_unavailable");
        assert_eq!(
            error_type_name(&PredictError::Unexpected("boom".to_string())),
            "unexpected_error"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(PredictError::ModelUnavailable.kind(), ErrorKind::Configuration);
        assert_eq!(
            PredictError::FeatureMismatch {
                feature: "income".to_string()
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            PredictError::invalid_input("bmi", "bad").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            PredictError::Unexpected("boom".to_string()).kind(),
            ErrorKind::Unexpected
        );
    }

    #[test]
    fn test_model_error_becomes_unexpected() {
        let err: PredictError = ModelError::FeatureCount {
            expected: 11,
            actual: 9,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!(err.to_string().contains("expected 11"));
    }
}
