//! Text summary builder for CLI output.
//!
//! Formats one line per mode of a finished batch plus a closing tally.

use crate::model::{BatchReport, ModeOutcome};
use std::time::Duration;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished batch.
pub(crate) fn build_text_summary(report: &BatchReport) -> TextSummary {
    let mut lines = Vec::new();
    let mut completed = 0usize;

    for outcome in &report.outcomes {
        let code = outcome.code();
        match outcome {
            ModeOutcome::Completed { report, .. } => {
                completed += 1;
                let status = match report.exit_code {
                    Some(c) => format!("exit {c}"),
                    None => "killed by signal".to_string(),
                };
                let outputs = if report.tagged_outputs.is_empty() {
                    "-".to_string()
                } else {
                    report
                        .tagged_outputs
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                };
                // Millisecond resolution keeps humantime output short.
                let elapsed = Duration::from_millis(report.elapsed.as_millis() as u64);
                lines.push(format!(
                    "Mode {code} ({}): {status} in {}, log {}, outputs: {outputs}",
                    report.tag,
                    humantime::format_duration(elapsed),
                    report.log_file.display(),
                ));
                for error in &report.tagging_errors {
                    lines.push(format!("  tagging failed: {error}"));
                }
            }
            ModeOutcome::Failed { error, .. } => {
                lines.push(format!("Mode {code}: failed ({error})"));
            }
        }
    }

    lines.push(format!(
        "{completed}/{} modes completed (check the log files for analysis errors)",
        report.outcomes.len()
    ));

    TextSummary { lines }
}
