use anyhow::{Context, Result};
use healthcare_cost::config::{self, OutputConfig};
use healthcare_cost::report::{self, PredictionReport};
use healthcare_cost::{metrics, ErrorKind, InferencePipeline, RawInput};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// One output line of a batch run
#[derive(Debug, Serialize)]
struct BatchLine {
    line: usize,
    #[serde(flatten)]
    report: PredictionReport,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct BatchSummary {
    total: usize,
    succeeded: usize,
}

/// Execute the batch command
///
/// Reads one JSON object per line. A malformed or failing line produces an
/// error report for that line and the batch continues.
pub fn execute(config_path: &Path, input: &Path, metrics_path: Option<&Path>) -> Result<()> {
    let cfg = config::load_config(config_path)?;

    let metrics_handle = match metrics_path {
        Some(_) => Some(metrics::init_metrics()?),
        None => None,
    };

    let pipeline = InferencePipeline::load(&cfg.artifacts, &cfg.pipeline);

    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(input)
            .with_context(|| format!("failed to open batch input {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let stdout = io::stdout();
    let summary = run(&pipeline, &cfg.output, reader, stdout.lock())?;

    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.total - summary.succeeded,
        "Batch completed"
    );

    if let (Some(path), Some(handle)) = (metrics_path, metrics_handle) {
        std::fs::write(path, handle.render())
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "Metrics snapshot written");
    }

    Ok(())
}

fn run<R: BufRead, W: Write>(
    pipeline: &InferencePipeline,
    output: &OutputConfig,
    reader: R,
    mut writer: W,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    // Raw bytes so a line that is not UTF-8 is reported instead of ending the run
    for (idx, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let report = match serde_json::from_slice::<RawInput>(&line) {
            Ok(raw) => report::build_report(&pipeline.predict(&raw), output),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Skipping malformed batch line");
                PredictionReport {
                    status: "malformed_input",
                    kind: Some(ErrorKind::Validation),
                    cost: None,
                    message: format!("Error: Invalid input. Details: {}", e),
                }
            }
        };

        summary.total += 1;
        if report.is_success() {
            summary.succeeded += 1;
        }

        let record = BatchLine {
            line: idx + 1,
            report,
        };
        serde_json::to_writer(&mut writer, &record)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(summary)
}
