mod files;
mod pipeline;
mod shell;

pub use files::tagged_name;
pub use pipeline::Pipeline;

use crate::error::{RunnerError, RunnerResult};
use crate::model::{RunEvent, RunReport, RunSpec, RunState};
use std::time::Instant;
use tokio::sync::mpsc;

/// Executes one analysis chain: cleanup, script generation, shell run and output tagging.
pub struct Runner {
    spec: RunSpec,
}

impl Runner {
    pub fn new(spec: RunSpec) -> Self {
        Self { spec }
    }

    #[tracing::instrument(skip_all, fields(tag = %self.spec.tag))]
    pub async fn execute(
        self,
        event_tx: &mpsc::UnboundedSender<RunEvent>,
    ) -> RunnerResult<RunReport> {
        let spec = &self.spec;
        let start = Instant::now();
        let mut state = RunState::Idle;
        let log_file = spec.artifact_path(spec.log_name());

        self.emit(event_tx, RunEvent::RunStarted {
            tag: spec.tag.clone(),
            log_file: log_file.clone(),
        });

        self.advance(&mut state, event_tx);
        self.remove_stale_outputs(event_tx)?;

        let script_name = spec.script_name();
        let script_path = spec.artifact_path(&script_name);
        let pipeline = Pipeline::new(&spec.sub_commands, &spec.shared_args);
        std::fs::write(&script_path, pipeline.build())
            .map_err(|e| RunnerError::io(format!("write script {}", script_path.display()), e))?;
        self.emit(event_tx, RunEvent::ScriptWritten {
            path: script_path.clone(),
        });
        for line in pipeline.lines() {
            self.emit(event_tx, RunEvent::ScriptLine(line));
        }
        self.advance(&mut state, event_tx);

        let invocation = shell::ShellInvocation {
            shell: &spec.shell,
            script: &script_name,
            work_dir: &spec.work_dir,
            log_path: &log_file,
        };
        self.emit(event_tx, RunEvent::Launching {
            command: invocation.display(),
        });
        self.advance(&mut state, event_tx);
        let status = shell::run_script(invocation).await?;
        tracing::debug!(code = ?status.code(), "shell finished");
        self.emit(event_tx, RunEvent::ShellExited {
            code: status.code(),
        });

        let mut script_removed = false;
        if spec.remove_script {
            match files::remove_file(&script_path) {
                Ok(()) => {
                    script_removed = true;
                    self.emit(event_tx, RunEvent::ScriptRemoved {
                        path: script_path.clone(),
                    });
                }
                Err(e) => tracing::warn!(error = %e, "could not remove temporary script"),
            }
        }

        self.advance(&mut state, event_tx);
        let (tagged_outputs, tagging_errors) = self.tag_outputs(event_tx);
        self.emit(event_tx, RunEvent::OutputSummary {
            files: tagged_outputs.clone(),
        });
        self.advance(&mut state, event_tx);

        Ok(RunReport {
            tag: spec.tag.clone(),
            log_file,
            script: script_path,
            script_removed,
            exit_code: status.code(),
            tagged_outputs,
            elapsed: start.elapsed(),
            finished_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            tagging_errors,
        })
    }

    /// Diagnostic events are dropped unless the run is verbose.
    fn emit(&self, event_tx: &mpsc::UnboundedSender<RunEvent>, event: RunEvent) {
        if event.is_diagnostic() && !self.spec.verbose {
            return;
        }
        let _ = event_tx.send(event);
    }

    fn advance(&self, state: &mut RunState, event_tx: &mpsc::UnboundedSender<RunEvent>) {
        if let Some(next) = state.successor() {
            *state = next;
            tracing::debug!(state = ?next, "run state changed");
            self.emit(event_tx, RunEvent::StateChanged {
                tag: self.spec.tag.clone(),
                state: next,
            });
        }
    }

    /// Delete both the bare and the tagged name of every declared output.
    fn remove_stale_outputs(
        &self,
        event_tx: &mpsc::UnboundedSender<RunEvent>,
    ) -> RunnerResult<()> {
        let spec = &self.spec;
        for name in &spec.output_files {
            let candidates = [
                spec.artifact_path(name),
                spec.artifact_path(tagged_name(name, &spec.tag)),
            ];
            for path in candidates {
                match files::remove_file(&path) {
                    Ok(()) => {
                        self.emit(event_tx, RunEvent::FileRemoved { path });
                    }
                    Err(RunnerError::MissingFile { path }) => {
                        self.emit(event_tx, RunEvent::FileMissing { path });
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    /// Rename every produced output. Failures are collected so the run report survives them.
    fn tag_outputs(
        &self,
        event_tx: &mpsc::UnboundedSender<RunEvent>,
    ) -> (Vec<std::path::PathBuf>, Vec<String>) {
        let spec = &self.spec;
        let mut tagged = Vec::new();
        let mut errors = Vec::new();
        for name in &spec.output_files {
            let from = spec.artifact_path(name);
            let to = spec.artifact_path(tagged_name(name, &spec.tag));
            match files::rename_file(&from, &to) {
                Ok(()) => {
                    self.emit(event_tx, RunEvent::FileTagged {
                        from,
                        to: to.clone(),
                    });
                    tagged.push(to);
                }
                Err(RunnerError::MissingFile { path }) => {
                    self.emit(event_tx, RunEvent::FileMissing { path });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not tag output");
                    errors.push(e.to_string());
                }
            }
        }
        (tagged, errors)
    }
}
