use anyhow::Result;
use colored::Colorize;
use healthcare_cost::config::{self, Config};
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Displays the effective configuration after defaults, file and environment
pub fn show(path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!(path = %path.display(), "Loading configuration for display");

    let cfg = config::load_config(path)?;

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(&cfg)?;
    println!("{}", toml_string);

    info!("Configuration displayed successfully");
    Ok(())
}

/// Execute the config validate command
///
/// Validates the configuration and reports whether the artifacts exist
pub fn validate(path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!(path = %path.display(), "Validating configuration file");

    let cfg = config::load_config(path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    for line in artifact_summary(&cfg) {
        println!("  {}", line);
    }
    println!(
        "  Unknown categories: {}",
        if cfg.pipeline.strict_categories {
            "rejected"
        } else {
            "zero-filled"
        }
    );

    info!("Configuration validation successful");
    Ok(())
}

/// One line per artifact with its path and whether it exists
fn artifact_summary(cfg: &Config) -> Vec<String> {
    [
        ("Model", cfg.artifacts.model_path.as_path()),
        ("Feature order", cfg.artifacts.feature_order_path.as_path()),
    ]
    .into_iter()
    .map(|(label, path)| {
        let status = if path.exists() { "found" } else { "missing" };
        format!("{}: {} ({})", label, path.display(), status)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_summary_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.txt");
        std::fs::write(&model_path, "tree\n").unwrap();

        let mut cfg = Config::default();
        cfg.artifacts.model_path = model_path;
        cfg.artifacts.feature_order_path = dir.path().join("features.txt");

        let summary = artifact_summary(&cfg);
        assert!(summary[0].starts_with("Model:"));
        assert!(summary[0].ends_with("(found)"));
        assert!(summary[1].ends_with("(missing)"));
    }
}
