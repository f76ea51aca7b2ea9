pub mod config;
pub mod error;
pub mod feature_order;
pub mod features;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod report;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use error::{ErrorKind, PredictError};
pub use features::{EncodedFeatureVector, RawInput};
pub use pipeline::InferencePipeline;

/// Initialize tracing/logging
///
/// Logs go to stderr so stdout only carries prediction output. `json`
/// switches to the structured formatter.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
