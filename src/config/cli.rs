use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "touch-guard")]
#[command(about = "Tapjacking and task-hijack guard: replay traces and check launches")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// How long all touches stay blocked after an obscured touch (ms)
    #[arg(long, env = "TOUCH_GUARD_BLOCK_MS", global = true)]
    pub block_duration_ms: Option<u64>,

    /// Minimum gap between overlay warnings (ms)
    #[arg(long, env = "TOUCH_GUARD_THROTTLE_MS", global = true)]
    pub warning_throttle_ms: Option<u64>,

    /// Host platform API level (partial obstruction needs 29+)
    #[arg(long, global = true)]
    pub api_level: Option<u32>,

    /// Text of the overlay warning
    #[arg(long, global = true)]
    pub warning_message: Option<String>,

    /// Path to config file
    #[arg(long, env = "TOUCH_GUARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a TOML trace of create and touch steps
    Replay {
        /// Trace file
        trace: PathBuf,
    },
    /// Check whether a launch would be terminated as a task hijack
    Launch {
        /// The instance is the root of its task
        #[arg(long)]
        task_root: bool,

        /// Intent action (omit for no intent)
        #[arg(long)]
        action: Option<String>,

        /// Intent category (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Print the merged configuration
    ShowConfig,
}
