use anyhow::Result;
use colored::Colorize;
use healthcare_cost::{config, report, InferencePipeline, RawInput};
use std::path::Path;
use tracing::info;

/// Execute the predict command
///
/// Per-request failures are printed as part of the report, not returned as
/// errors; only configuration loading can fail the command.
pub fn execute(config_path: &Path, raw: RawInput, json: bool) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let pipeline = InferencePipeline::load(&cfg.artifacts, &cfg.pipeline);

    let result = pipeline.predict(&raw);
    let report = report::build_report(&result, &cfg.output);

    info!(status = report.status, "Prediction completed");

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_success() {
        println!("{}", report.message.green().bold());
    } else {
        println!("{}", report.message.red());
    }

    Ok(())
}
