use crate::modes::ModeEntry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output files an O2 analysis chain writes by default.
pub const DEFAULT_OUTPUT_FILES: &[&str] = &["AnalysisResults.root", "QAResults.root"];

/// Everything needed for one execution of an analysis chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    pub sub_commands: Vec<String>,
    pub shared_args: String,
    pub tag: String,
    pub output_files: Vec<String>,
    pub verbose: bool,
    #[serde(default)]
    pub remove_script: bool,
    pub shell: String,
    pub work_dir: PathBuf,
}

impl RunSpec {
    pub fn script_name(&self) -> String {
        format!("tmpscript{}.sh", self.tag)
    }

    pub fn log_name(&self) -> String {
        format!("log_{}.log", self.tag.to_lowercase())
    }

    /// Resolve an artifact name against the working directory.
    /// Names stay relative when running in the current directory so messages read naturally.
    pub fn artifact_path(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if self.work_dir.as_os_str().is_empty() || self.work_dir == Path::new(".") {
            name.to_path_buf()
        } else {
            self.work_dir.join(name)
        }
    }
}

/// Settings shared by every mode of a batch invocation.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub shared_args: String,
    pub tag_suffix: String,
    pub output_files: Vec<String>,
    pub verbose: bool,
    pub remove_script: bool,
    pub shell: String,
    pub work_dir: PathBuf,
}

impl BatchConfig {
    pub fn run_spec(&self, mode: &ModeEntry) -> RunSpec {
        RunSpec {
            sub_commands: mode.sub_commands(),
            shared_args: self.shared_args.clone(),
            tag: mode.tag_with_suffix(&self.tag_suffix),
            output_files: self.output_files.clone(),
            verbose: self.verbose,
            remove_script: self.remove_script,
            shell: self.shell.clone(),
            work_dir: self.work_dir.clone(),
        }
    }
}

/// Lifecycle of a single run. States only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Cleaning,
    ScriptWritten,
    Running,
    Tagging,
    Done,
}

impl RunState {
    pub fn successor(self) -> Option<RunState> {
        match self {
            RunState::Idle => Some(RunState::Cleaning),
            RunState::Cleaning => Some(RunState::ScriptWritten),
            RunState::ScriptWritten => Some(RunState::Running),
            RunState::Running => Some(RunState::Tagging),
            RunState::Tagging => Some(RunState::Done),
            RunState::Done => None,
        }
    }
}

/// Progress events emitted by the runner and the batch controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    StateChanged {
        tag: String,
        state: RunState,
    },
    RunStarted {
        tag: String,
        log_file: PathBuf,
    },
    FileRemoved {
        path: PathBuf,
    },
    FileMissing {
        path: PathBuf,
    },
    ScriptWritten {
        path: PathBuf,
    },
    ScriptLine(String),
    Launching {
        command: String,
    },
    ShellExited {
        code: Option<i32>,
    },
    ScriptRemoved {
        path: PathBuf,
    },
    FileTagged {
        from: PathBuf,
        to: PathBuf,
    },
    OutputSummary {
        files: Vec<PathBuf>,
    },
    Info(InfoEvent),
}

impl RunEvent {
    /// Diagnostics are only emitted for verbose runs.
    pub fn is_diagnostic(&self) -> bool {
        !matches!(
            self,
            RunEvent::StateChanged { .. }
                | RunEvent::RunStarted { .. }
                | RunEvent::OutputSummary { .. }
                | RunEvent::Info(_)
        )
    }

    /// Render a human-readable message; `None` for events with no console form.
    pub fn to_message(&self) -> Option<String> {
        let msg = match self {
            RunEvent::StateChanged { .. } => return None,
            RunEvent::RunStarted { log_file, .. } => {
                format!(
                    "\nRunning the tasks with O2... (logfile: {})",
                    log_file.display()
                )
            }
            RunEvent::FileRemoved { path } => format!("Removed {}", path.display()),
            RunEvent::FileMissing { path } => format!("Did not find {}", path.display()),
            RunEvent::ScriptWritten { path } => {
                format!("Writing o2 instructions to {}", path.display())
            }
            RunEvent::ScriptLine(line) => line.trim().to_string(),
            RunEvent::Launching { command } => format!("Running '{command}'"),
            RunEvent::ShellExited { code } => match code {
                Some(c) => format!("Shell exited with status {c}"),
                None => "Shell terminated by signal".to_string(),
            },
            RunEvent::ScriptRemoved { path } => format!("Removed {}", path.display()),
            RunEvent::FileTagged { from, to } => {
                format!("Renamed {} -> {}", from.display(), to.display())
            }
            RunEvent::OutputSummary { files } => {
                let names: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
                format!("Output files: {}", names.join(" "))
            }
            RunEvent::Info(info) => info.to_message(),
        };
        Some(msg)
    }
}

/// Batch-level messages generated outside the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    ModeStarted { code: i64, tag: String },
    ModeFailed { code: i64, error: String },
}

impl InfoEvent {
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::ModeStarted { code, tag } => format!("== mode {code} ({tag}) =="),
            InfoEvent::ModeFailed { code, error } => format!("Mode {code} failed: {error}"),
        }
    }
}

/// Outcome of one runner execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub tag: String,
    pub log_file: PathBuf,
    pub script: PathBuf,
    pub script_removed: bool,
    /// Informational only; a non-zero exit is not treated as a failure.
    pub exit_code: Option<i32>,
    pub tagged_outputs: Vec<PathBuf>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub finished_utc: String,
    /// Rename failures other than a missing source; the remaining outputs are still tagged.
    #[serde(default)]
    pub tagging_errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModeOutcome {
    Completed { code: i64, report: RunReport },
    Failed { code: i64, error: String },
}

impl ModeOutcome {
    pub fn code(&self) -> i64 {
        match self {
            ModeOutcome::Completed { code, .. } | ModeOutcome::Failed { code, .. } => *code,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<ModeOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(tag: &str, work_dir: &str) -> RunSpec {
        RunSpec {
            sub_commands: vec!["true".into()],
            shared_args: String::new(),
            tag: tag.into(),
            output_files: vec![],
            verbose: false,
            remove_script: false,
            shell: "bash".into(),
            work_dir: PathBuf::from(work_dir),
        }
    }

    #[test]
    fn artifact_names_follow_tag() {
        let s = spec("TrackQA_v2", ".");
        assert_eq!(s.script_name(), "tmpscriptTrackQA_v2.sh");
        assert_eq!(s.log_name(), "log_trackqa_v2.log");
        assert_eq!(s.artifact_path("x.root"), PathBuf::from("x.root"));
        let s = spec("TPC", "/data/run");
        assert_eq!(s.artifact_path("x.root"), PathBuf::from("/data/run/x.root"));
    }

    #[test]
    fn state_machine_moves_forward_only() {
        let mut state = RunState::Idle;
        let mut seen = vec![state];
        while let Some(next) = state.successor() {
            state = next;
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                RunState::Idle,
                RunState::Cleaning,
                RunState::ScriptWritten,
                RunState::Running,
                RunState::Tagging,
                RunState::Done
            ]
        );
    }

    #[test]
    fn output_summary_message() {
        let ev = RunEvent::OutputSummary {
            files: vec!["AnalysisResultsQA.root".into(), "QAResultsQA.root".into()],
        };
        assert!(!ev.is_diagnostic());
        assert_eq!(
            ev.to_message().as_deref(),
            Some("Output files: AnalysisResultsQA.root QAResultsQA.root")
        );
        assert!(RunEvent::FileMissing { path: "a".into() }.is_diagnostic());
    }
}
