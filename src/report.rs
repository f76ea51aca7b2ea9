//! Turning a prediction result into something a caller can show
//!
//! Every outcome, successful or not, becomes a [`PredictionReport`] with a
//! human-readable message.

use serde::Serialize;

use crate::config::OutputConfig;
use crate::error::{error_type_name, ErrorKind, PredictError};

/// Outcome of one request, ready for display or serialization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub message: String,
}

impl PredictionReport {
    pub fn is_success(&self) -> bool {
        self.cost.is_some()
    }
}

/// Format a cost with the configured currency symbol and precision
pub fn format_cost(cost: f64, output: &OutputConfig) -> String {
    format!("{}{:.*}", output.currency_symbol, output.precision, cost)
}

fn render_error(error: &PredictError) -> String {
    match error {
        PredictError::ModelUnavailable => {
            "Model not found. Please check the model artifact path.".to_string()
        }
        PredictError::FeatureMismatch { feature } => format!(
            "Model configuration error: feature '{}' is not produced by the encoder.",
            feature
        ),
        PredictError::InvalidInput { field, detail } => format!(
            "Error: Invalid input. Please enter correct values. Details: {}: {}",
            field, detail
        ),
        PredictError::Unexpected(detail) => {
            format!("An unexpected error occurred: {}", detail)
        }
    }
}

pub fn build_report(result: &Result<f64, PredictError>, output: &OutputConfig) -> PredictionReport {
    match result {
        Ok(cost) => PredictionReport {
            status: "ok",
            kind: None,
            cost: Some(*cost),
            message: format!("Predicted Healthcare Cost: {}", format_cost(*cost, output)),
        },
        Err(error) => PredictionReport {
            status: error_type_name(error),
            kind: Some(error.kind()),
            cost: None,
            message: render_error(error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cost_rounds_for_display() {
        let output = OutputConfig::default();
        assert_eq!(format_cost(12345.678, &output), "$12345.68");

        let euros = OutputConfig {
            currency_symbol: "€".to_string(),
            precision: 0,
        };
        assert_eq!(format_cost(12345.678, &euros), "€12346");
    }

    #[test]
    fn test_success_report() {
        let report = build_report(&Ok(29750.0), &OutputConfig::default());
        assert!(report.is_success());
        assert_eq!(report.status, "ok");
        assert_eq!(report.message, "Predicted Healthcare Cost: $29750.00");
    }

    #[test]
    fn test_model_unavailable_report_has_no_cost() {
        let report = build_report(&Err(PredictError::ModelUnavailable), &OutputConfig::default());
        assert!(!report.is_success());
        assert_eq!(report.status, "model_unavailable");
        assert_eq!(report.kind, Some(ErrorKind::Configuration));
        assert!(report.message.starts_with("Model not found"));
    }

    #[test]
    fn test_invalid_input_report_includes_detail() {
        let error = PredictError::invalid_input("age", "invalid digit found in string");
        let report = build_report(&Err(error), &OutputConfig::default());
        assert_eq!(report.kind, Some(ErrorKind::Validation));
        assert!(report.message.contains("Invalid input"));
        assert!(report.message.contains("age: invalid digit found in string"));
    }

    #[test]
    fn test_report_serialization() {
        let report = build_report(
            &Err(PredictError::Unexpected("boom".to_string())),
            &OutputConfig::default(),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "unexpected_error");
        assert_eq!(json["kind"], "unexpected");
        assert!(json.get("cost").is_none());
        assert_eq!(json["message"], "An unexpected error occurred: boom");
    }
}
