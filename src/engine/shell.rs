use crate::error::{RunnerError, RunnerResult};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Parameters for running a generated script.
pub(crate) struct ShellInvocation<'a> {
    pub shell: &'a str,
    /// Script path relative to `work_dir`.
    pub script: &'a str,
    pub work_dir: &'a Path,
    pub log_path: &'a Path,
}

impl ShellInvocation<'_> {
    pub fn display(&self) -> String {
        format!("{} {}", self.shell, self.script)
    }
}

/// Run the script to completion with stdout and stderr both sent to the log file.
/// Only a failure to spawn the shell is an error; the exit status is returned as-is.
pub(crate) async fn run_script(inv: ShellInvocation<'_>) -> RunnerResult<ExitStatus> {
    let log = std::fs::File::create(inv.log_path)
        .map_err(|e| RunnerError::io(format!("create log {}", inv.log_path.display()), e))?;
    let log_err = log
        .try_clone()
        .map_err(|e| RunnerError::io(format!("duplicate log handle {}", inv.log_path.display()), e))?;

    let mut cmd = Command::new(inv.shell);
    cmd.arg(inv.script)
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));
    if !inv.work_dir.as_os_str().is_empty() {
        cmd.current_dir(inv.work_dir);
    }

    cmd.status().await.map_err(|source| RunnerError::Launch {
        shell: inv.shell.to_string(),
        source,
    })
}
