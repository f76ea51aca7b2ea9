use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return a handle for rendering
///
/// Fails if a global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "healthcare_predictions_total",
        "Total number of prediction requests by outcome"
    );
    describe_histogram!(
        "healthcare_prediction_duration_seconds",
        "Time spent encoding and scoring one request"
    );
    describe_gauge!(
        "healthcare_model_loaded",
        "1 if a model artifact is loaded, 0 if predictions are unavailable"
    );
    describe_gauge!(
        "healthcare_cost_info",
        "Version and build information"
    );

    gauge!("healthcare_cost_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record one prediction; `outcome` is "ok" or an error type name
pub fn record_prediction(outcome: &'static str, duration: Duration) {
    counter!("healthcare_predictions_total", "outcome" => outcome).increment(1);
    histogram!("healthcare_prediction_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_model_loaded(loaded: bool) {
    gauge!("healthcare_model_loaded").set(if loaded { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metrics() {
        init_metric_descriptions();

        record_prediction("ok", Duration::from_micros(40));
        record_prediction("invalid_input", Duration::from_micros(5));
        record_model_loaded(true);

        // No recorder installed: calls must be harmless no-ops
    }

    #[test]
    fn test_render_with_local_recorder() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_prediction("ok", Duration::from_millis(1));
            record_model_loaded(false);
        });

        let rendered = handle.render();
        assert!(rendered.contains("healthcare_predictions_total{outcome=\"ok\"} 1"));
        assert!(rendered.contains("healthcare_model_loaded 0"));
    }
}
