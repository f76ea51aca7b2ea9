//! The inference pipeline: encode, reorder, score
//!
//! An [`InferencePipeline`] is built once from [`ArtifactsConfig`] and then
//! shared read-only. Nothing in it is mutated after construction, so it can
//! be used from many threads without locking.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{ArtifactsConfig, PipelineConfig};
use crate::error::{error_type_name, PredictError};
use crate::feature_order::FeatureOrder;
use crate::features::{encode, CategoryPolicy, EncodedFeatureVector, RawInput};
use crate::metrics;
use crate::model::{LightGbmModel, Scorer};

/// Whether a model is available for scoring
#[derive(Clone)]
pub enum ModelState {
    Ready(Arc<dyn Scorer>),
    Unavailable { reason: String },
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(model) => f
                .debug_struct("Ready")
                .field("num_features", &model.num_features())
                .finish(),
            Self::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferencePipeline {
    model: ModelState,
    feature_order: FeatureOrder,
    policy: CategoryPolicy,
}

impl InferencePipeline {
    pub fn new(model: ModelState, feature_order: FeatureOrder, policy: CategoryPolicy) -> Self {
        Self {
            model,
            feature_order,
            policy,
        }
    }

    /// Load the model and feature order from disk
    ///
    /// Never fails: a missing or unreadable artifact leaves the pipeline in
    /// the unavailable state and every prediction reports it.
    pub fn load(artifacts: &ArtifactsConfig, pipeline: &PipelineConfig) -> Self {
        let feature_order = match FeatureOrder::load(&artifacts.feature_order_path) {
            Ok(order) => {
                info!(
                    path = %artifacts.feature_order_path.display(),
                    features = order.len(),
                    "Loaded feature order"
                );
                Some(order)
            }
            Err(e) => {
                warn!(
                    path = %artifacts.feature_order_path.display(),
                    error = %e,
                    "Feature order file could not be read"
                );
                None
            }
        };

        let model = match (&feature_order, LightGbmModel::from_file(&artifacts.model_path)) {
            (None, _) => ModelState::Unavailable {
                reason: format!(
                    "feature order file {} could not be read",
                    artifacts.feature_order_path.display()
                ),
            },
            (Some(_), Ok(model)) => {
                info!(
                    path = %artifacts.model_path.display(),
                    trees = model.num_trees(),
                    features = model.num_features(),
                    objective = model.objective(),
                    "Loaded model"
                );
                ModelState::Ready(Arc::new(model))
            }
            (Some(_), Err(e)) => {
                warn!(
                    path = %artifacts.model_path.display(),
                    error = %e,
                    "Model not loaded, predictions will be unavailable"
                );
                ModelState::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        metrics::record_model_loaded(model.is_ready());

        Self::new(
            model,
            feature_order.unwrap_or_default(),
            pipeline.category_policy(),
        )
    }

    pub fn model(&self) -> &ModelState {
        &self.model
    }

    pub fn feature_order(&self) -> &FeatureOrder {
        &self.feature_order
    }

    pub fn policy(&self) -> CategoryPolicy {
        self.policy
    }

    /// Encode a raw request into the fixed-schema vector
    pub fn encode(&self, raw: &RawInput) -> Result<EncodedFeatureVector, PredictError> {
        encode(raw, self.policy)
    }

    /// Predict the cost for one request
    ///
    /// The returned value is the model output as-is; rounding for display
    /// happens in [`crate::report`].
    pub fn predict(&self, raw: &RawInput) -> Result<f64, PredictError> {
        let start = Instant::now();
        let result = self.run(raw);

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => error_type_name(e),
        };
        metrics::record_prediction(outcome, start.elapsed());
        debug!(
            outcome,
            duration_us = start.elapsed().as_micros() as u64,
            "Prediction finished"
        );

        result
    }

    fn run(&self, raw: &RawInput) -> Result<f64, PredictError> {
        let encoded = self.encode(raw)?;
        let row = self.feature_order.select(&encoded)?;

        let model = match &self.model {
            ModelState::Ready(model) => model,
            ModelState::Unavailable { .. } => return Err(PredictError::ModelUnavailable),
        };

        Ok(model.predict_row(&row)?)
    }
}
