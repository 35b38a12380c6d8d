//! Filesystem helpers for cleanup and tagging of output files.
//!
//! A missing target is reported as [`RunnerError::MissingFile`] so callers can skip it,
//! while every other I/O failure surfaces as [`RunnerError::Io`].

use crate::error::{RunnerError, RunnerResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Insert `tag` before the extension: `AnalysisResults.root` + `QA` -> `AnalysisResultsQA.root`.
/// Names without an extension get the tag appended.
pub fn tagged_name(name: impl AsRef<Path>, tag: &str) -> PathBuf {
    let path = name.as_ref();
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => path.with_file_name(format!(
            "{}{}.{}",
            stem.to_string_lossy(),
            tag,
            ext.to_string_lossy()
        )),
        _ => PathBuf::from(format!("{}{}", path.display(), tag)),
    }
}

fn classify(err: std::io::Error, path: &Path, context: String) -> RunnerError {
    if err.kind() == ErrorKind::NotFound {
        RunnerError::MissingFile {
            path: path.to_path_buf(),
        }
    } else {
        RunnerError::io(context, err)
    }
}

pub fn remove_file(path: &Path) -> RunnerResult<()> {
    std::fs::remove_file(path)
        .map_err(|e| classify(e, path, format!("remove {}", path.display())))
}

pub fn rename_file(from: &Path, to: &Path) -> RunnerResult<()> {
    std::fs::rename(from, to).map_err(|e| {
        classify(
            e,
            from,
            format!("rename {} -> {}", from.display(), to.display()),
        )
    })
}
