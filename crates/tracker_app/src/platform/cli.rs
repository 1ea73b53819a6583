use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use super::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "vtrack",
    version,
    about = "Upload a video for processing and follow the job until its results are ready"
)]
pub struct Cli {
    /// RON configuration file [default: ./vtrack.ron when present]
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Processing server base URL
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Delay between status checks, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Save the result video and statistics into this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Write an HTML rendering of the results to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub html_report: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, global = true, value_enum)]
    pub log: Option<LogDestination>,

    /// More log detail (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a video and track its processing
    Submit {
        /// Video file to upload
        file: Option<PathBuf>,
    },
    /// Follow a task that is already running
    Watch {
        /// Task id [default: the last submitted task]
        task_id: Option<String>,
    },
}
