//! Shell pipeline script construction.

/// Continuation appended to every stage except the last.
pub const PIPE_CONTINUATION: &str = " | \\\n \t";

/// One executable in the chain, together with the arguments every stage shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage<'a> {
    pub command: &'a str,
    pub args: &'a str,
}

impl Stage<'_> {
    fn render(&self) -> String {
        format!("{} {}", self.command, self.args)
    }
}

/// Ordered stages forming a single shell pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline<'a> {
    stages: Vec<Stage<'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(sub_commands: &'a [String], shared_args: &'a str) -> Self {
        let stages = sub_commands
            .iter()
            .map(|command| Stage {
                command: command.as_str(),
                args: shared_args,
            })
            .collect();
        Self { stages }
    }

    /// Rendered lines, without the trailing blank line.
    pub fn lines(&self) -> Vec<String> {
        let piped = self.stages.len() > 1;
        let last = self.stages.len().saturating_sub(1);
        self.stages
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                let mut line = stage.render();
                if piped && i != last {
                    line.push_str(PIPE_CONTINUATION);
                }
                line
            })
            .collect()
    }

    /// Full script text: every rendered line followed by a trailing blank line.
    pub fn build(&self) -> String {
        let mut text = self.lines().concat();
        text.push_str("\n\n");
        text
    }
}
