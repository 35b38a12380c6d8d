use std::path::PathBuf;
use thiserror::Error;

pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors raised while resolving or executing an analysis run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Mode code has no entry in the mode table.
    #[error("unknown mode {code} (see --list-modes)")]
    UnknownMode { code: i64 },

    /// A cleanup or rename target did not exist. Callers treat this as non-fatal.
    #[error("did not find {}", path.display())]
    MissingFile { path: PathBuf },

    /// The shell process could not be spawned.
    #[error("failed to launch '{shell}': {source}")]
    Launch {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        RunnerError::Io {
            context: context.into(),
            source,
        }
    }
}
