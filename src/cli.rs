use crate::model::{BatchConfig, InfoEvent, RunEvent, DEFAULT_OUTPUT_FILES};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Spawn a blocking writer that renders run events to stdout/stderr.
/// The std handles are locked per message; the tracing subscriber shares stderr.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<RunEvent>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<RunEvent>();
    let handle = tokio::task::spawn_blocking(move || {
        while let Some(ev) = rx.blocking_recv() {
            let Some(msg) = ev.to_message() else {
                continue;
            };
            match ev {
                RunEvent::Info(InfoEvent::ModeFailed { .. }) => {
                    let _ = writeln!(std::io::stderr(), "{}", msg);
                }
                _ => {
                    let _ = writeln!(std::io::stdout(), "{}", msg);
                }
            }
        }

        let _ = std::io::stdout().flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "o2-analysis-runner",
    version,
    about = "Runner for O2 analyses"
)]
pub struct Cli {
    /// Running modes, executed in the given order (see --list-modes)
    #[arg(required_unless_present = "list_modes", allow_negative_numbers = true)]
    pub modes: Vec<i64>,

    /// Input file listing the AODs to process, passed to the workflow as @FILE
    #[arg(short, long, default_value = "listfiles.txt")]
    pub input: String,

    /// Tag appended to each mode's tag for output, log and script names
    #[arg(short, long, default_value = "")]
    pub tag: String,

    /// Verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Background mode (workflows always run with -b; accepted for compatibility)
    #[arg(short = 'b')]
    pub _background: bool,

    /// Remove the temporary script after the run
    #[arg(long)]
    pub remove_script: bool,

    /// Output file to clean up and tag (repeatable; defaults to AnalysisResults.root and QAResults.root)
    #[arg(short, long = "output", value_name = "FILE")]
    pub outputs: Vec<String>,

    /// DPL JSON configuration forwarded as --configuration json://PATH
    #[arg(long, value_name = "PATH")]
    pub configuration: Option<PathBuf>,

    /// Shared memory segment size forwarded to the workflow
    #[arg(long, value_name = "BYTES")]
    pub shm_segment_size: Option<u64>,

    /// Number of AOD readers forwarded to the workflow
    #[arg(long)]
    pub readers: Option<u32>,

    /// Shell used to run the generated script
    #[arg(long, default_value = "bash")]
    pub shell: String,

    /// Directory holding the script, log and output files
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Print the batch report as JSON
    #[arg(long)]
    pub json: bool,

    /// List the available modes and exit
    #[arg(long)]
    pub list_modes: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    if args.list_modes {
        for line in crate::modes::describe_modes() {
            println!("{line}");
        }
        return Ok(());
    }

    if !args.workdir.is_dir() {
        return Err(anyhow::anyhow!(
            "working directory {} does not exist",
            args.workdir.display()
        ));
    }

    let cfg = build_config(&args);
    tracing::debug!(?cfg, modes = ?args.modes, "starting batch");

    let (event_tx, out_handle) = spawn_output_writer();
    let report = crate::orchestrator::run_batch(&cfg, &args.modes, &event_tx).await;
    drop(event_tx);
    out_handle.await.context("output writer task failed")?;

    if args.json {
        let out = serde_json::to_string_pretty(&report)?;
        println!("{out}");
    } else {
        let summary = crate::text_summary::build_text_summary(&report);
        println!();
        for line in summary.lines {
            println!("{line}");
        }
    }

    Ok(())
}

/// Arguments every stage of the pipeline receives.
pub fn shared_args(args: &Cli) -> String {
    let mut parts = vec!["-b".to_string(), format!("--aod-file @{}", args.input)];
    if let Some(size) = args.shm_segment_size {
        parts.push(format!("--shm-segment-size {size}"));
    }
    if let Some(readers) = args.readers {
        parts.push(format!("--readers {readers}"));
    }
    if let Some(path) = args.configuration.as_deref() {
        // Relative paths are resolved by the shell against the run directory.
        let location = if path.is_absolute() {
            path.display().to_string()
        } else {
            format!("$PWD/{}", path.display())
        };
        parts.push(format!("--configuration json://{location}"));
    }
    parts.join(" ")
}

/// Build a `BatchConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> BatchConfig {
    let output_files = if args.outputs.is_empty() {
        DEFAULT_OUTPUT_FILES.iter().map(|s| s.to_string()).collect()
    } else {
        args.outputs.clone()
    };
    BatchConfig {
        shared_args: shared_args(args),
        tag_suffix: args.tag.clone(),
        output_files,
        verbose: args.verbose,
        remove_script: args.remove_script,
        shell: args.shell.clone(),
        work_dir: args.workdir.clone(),
    }
}
