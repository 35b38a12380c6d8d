//! Batch controller.
//!
//! Runs the requested modes one after another and records an outcome for each.

use crate::engine::Runner;
use crate::error::RunnerResult;
use crate::model::{BatchConfig, BatchReport, InfoEvent, ModeOutcome, RunEvent, RunReport};
use crate::modes;
use tokio::sync::mpsc::UnboundedSender;

/// Run every mode in order. A failing mode is reported and the batch moves on.
pub(crate) async fn run_batch(
    cfg: &BatchConfig,
    mode_codes: &[i64],
    event_tx: &UnboundedSender<RunEvent>,
) -> BatchReport {
    let mut report = BatchReport::default();
    for &code in mode_codes {
        let outcome = match run_mode(cfg, code, event_tx).await {
            Ok(r) => ModeOutcome::Completed { code, report: r },
            Err(e) => {
                tracing::warn!(code, error = %e, "mode failed");
                let error = e.to_string();
                let _ = event_tx.send(RunEvent::Info(InfoEvent::ModeFailed {
                    code,
                    error: error.clone(),
                }));
                ModeOutcome::Failed { code, error }
            }
        };
        report.outcomes.push(outcome);
    }
    report
}

async fn run_mode(
    cfg: &BatchConfig,
    code: i64,
    event_tx: &UnboundedSender<RunEvent>,
) -> RunnerResult<RunReport> {
    let mode = modes::resolve(code)?;
    let spec = cfg.run_spec(mode);
    let _ = event_tx.send(RunEvent::Info(InfoEvent::ModeStarted {
        code,
        tag: spec.tag.clone(),
    }));
    Runner::new(spec).execute(event_tx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RunState, DEFAULT_OUTPUT_FILES};
    use std::path::Path;
    use tokio::sync::mpsc;

    fn config(dir: &Path, suffix: &str) -> BatchConfig {
        BatchConfig {
            shared_args: "-b --aod-file @listfiles.txt".into(),
            tag_suffix: suffix.into(),
            output_files: DEFAULT_OUTPUT_FILES.iter().map(|s| s.to_string()).collect(),
            verbose: false,
            remove_script: false,
            shell: "bash".into(),
            work_dir: dir.to_path_buf(),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn modes_run_sequentially_with_own_logs() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let report = run_batch(&config(dir.path(), ""), &[0, 4], &tx).await;

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].code(), 0);
        assert_eq!(report.outcomes[1].code(), 4);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o, ModeOutcome::Completed { .. })));
        assert!(dir.path().join("log_trackqa.log").exists());
        assert!(dir.path().join("log_tpc.log").exists());
        assert!(dir.path().join("tmpscriptTrackQA.sh").exists());
        assert!(dir.path().join("tmpscriptTPC.sh").exists());

        // The first run reaches Done before the second one starts.
        let events = drain(&mut rx);
        let order: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::RunStarted { tag, .. } => Some(format!("start:{tag}")),
                RunEvent::StateChanged {
                    tag,
                    state: RunState::Done,
                } => Some(format!("done:{tag}")),
                _ => None,
            })
            .collect();
        assert_eq!(
            order,
            vec!["start:TrackQA", "done:TrackQA", "start:TPC", "done:TPC"]
        );
    }

    #[tokio::test]
    async fn unknown_mode_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let report = run_batch(&config(dir.path(), "_b"), &[99, 4], &tx).await;

        assert!(matches!(
            &report.outcomes[0],
            ModeOutcome::Failed { code: 99, error } if error.contains("unknown mode 99")
        ));
        match &report.outcomes[1] {
            ModeOutcome::Completed { report, .. } => {
                assert_eq!(report.tag, "TPC_b");
                assert_eq!(report.log_file, dir.path().join("log_tpc_b.log"));
            }
            other => panic!("expected completed mode, got {other:?}"),
        }

        let events = drain(&mut rx);
        let starts = events
            .iter()
            .filter(|e| matches!(e, RunEvent::RunStarted { .. }))
            .count();
        assert_eq!(starts, 1);
        assert!(matches!(
            events.first(),
            Some(RunEvent::Info(InfoEvent::ModeFailed { code: 99, .. }))
        ));
    }

    #[tokio::test]
    async fn out_of_table_codes_fail_only_their_mode() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        let report = run_batch(&config(dir.path(), ""), &[-1, 4_294_967_296, 4], &tx).await;

        let codes: Vec<i64> = report.outcomes.iter().map(|o| o.code()).collect();
        assert_eq!(codes, vec![-1, 4_294_967_296, 4]);
        assert!(matches!(report.outcomes[0], ModeOutcome::Failed { .. }));
        assert!(matches!(report.outcomes[1], ModeOutcome::Failed { .. }));
        assert!(matches!(report.outcomes[2], ModeOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn launch_failure_is_recorded_per_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), "");
        cfg.shell = "/nonexistent/o2-runner-shell".into();
        let (tx, _rx) = mpsc::unbounded_channel();

        let report = run_batch(&cfg, &[4, 2], &tx).await;

        assert_eq!(report.outcomes.len(), 2);
        for outcome in &report.outcomes {
            assert!(matches!(
                outcome,
                ModeOutcome::Failed { error, .. } if error.contains("failed to launch")
            ));
        }
    }

    #[tokio::test]
    async fn generated_script_uses_shared_args() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        run_batch(&config(dir.path(), ""), &[4], &tx).await;

        let script = std::fs::read_to_string(dir.path().join("tmpscriptTPC.sh")).unwrap();
        assert_eq!(
            script,
            "o2-analysis-pid-tpc --add-qa 1 -b --aod-file @listfiles.txt\n\n"
        );
    }
}
