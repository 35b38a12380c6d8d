//! Static table of analysis modes.
//!
//! Each mode code selects an ordered chain of O2 workflow executables and the tag
//! used to name its log, script and output files.

use crate::error::{RunnerError, RunnerResult};

/// One row of the mode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeEntry {
    pub code: u32,
    pub tag: &'static str,
    pub sub_commands: &'static [&'static str],
}

impl ModeEntry {
    /// Tag with the user supplied suffix appended.
    pub fn tag_with_suffix(&self, suffix: &str) -> String {
        format!("{}{}", self.tag, suffix)
    }

    pub fn sub_commands(&self) -> Vec<String> {
        self.sub_commands.iter().map(|s| s.to_string()).collect()
    }
}

pub const MODE_TABLE: &[ModeEntry] = &[
    ModeEntry {
        code: 0,
        tag: "TrackQA",
        sub_commands: &[
            "o2-analysis-qa-simple",
            "o2-analysis-qa-efficiency --make-eff 1 --eta-min -0.8 --eta-max 0.8",
            "o2-analysis-trackextension",
            "o2-analysis-alice3-trackselection",
        ],
    },
    ModeEntry {
        code: 1,
        tag: "TOF",
        sub_commands: &[
            "o2-analysis-spectra-tof",
            "o2-analysis-trackextension",
            "o2-analysis-pid-tof --add-qa 1",
            "o2-analysis-alice3-trackselection",
        ],
    },
    ModeEntry {
        code: 2,
        tag: "ResoQA",
        sub_commands: &[
            "o2-analysis-qatask",
            "o2-analysis-trackextension",
            "o2-analysis-alice3-trackselection",
        ],
    },
    ModeEntry {
        code: 3,
        tag: "Efficiency",
        sub_commands: &[
            "o2-analysis-mc-spectra-efficiency",
            "o2-analysis-trackextension",
            "o2-analysis-alice3-trackselection",
        ],
    },
    ModeEntry {
        code: 4,
        tag: "TPC",
        sub_commands: &["o2-analysis-pid-tpc --add-qa 1"],
    },
];

/// Look up a mode code in the table.
pub fn resolve(code: i64) -> RunnerResult<&'static ModeEntry> {
    MODE_TABLE
        .iter()
        .find(|m| i64::from(m.code) == code)
        .ok_or(RunnerError::UnknownMode { code })
}

/// Render the mode table for `--list-modes`.
pub fn describe_modes() -> Vec<String> {
    let mut lines = Vec::new();
    for m in MODE_TABLE {
        lines.push(format!("{:>3}  {}", m.code, m.tag));
        for cmd in m.sub_commands {
            lines.push(format!("       {cmd}"));
        }
    }
    lines
}
