use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::features::CategoryPolicy;

pub const ENV_PREFIX: &str = "HEALTHCARE_COST";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactsConfig {
    pub model_path: PathBuf,
    pub feature_order_path: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("lightgbm_healthcare_model.txt"),
            feature_order_path: PathBuf::from("important_features.txt"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Reject categorical values outside the known options instead of
    /// zero-filling their indicator group
    pub strict_categories: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strict_categories: true,
        }
    }
}

impl PipelineConfig {
    pub fn category_policy(&self) -> CategoryPolicy {
        if self.strict_categories {
            CategoryPolicy::Strict
        } else {
            CategoryPolicy::ZeroFill
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub currency_symbol: String,
    pub precision: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            precision: 2,
        }
    }
}

/// Load configuration: built-in defaults, then the TOML file if it exists,
/// then `HEALTHCARE_COST__SECTION__KEY` environment variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let defaults = Config::default();
    let config = config::Config::builder()
        .add_source(config::File::from_str(
            &toml::to_string(&defaults)?,
            config::FileFormat::Toml,
        ))
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.artifacts.model_path.as_os_str().is_empty() {
        anyhow::bail!("artifacts.model_path cannot be empty");
    }

    if cfg.artifacts.feature_order_path.as_os_str().is_empty() {
        anyhow::bail!("artifacts.feature_order_path cannot be empty");
    }

    if cfg.output.precision > 10 {
        anyhow::bail!(
            "output.precision must be at most 10, got {}",
            cfg.output.precision
        );
    }

    Ok(())
}
