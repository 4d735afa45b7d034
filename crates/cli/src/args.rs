//! Command-line surface for `safetrack`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "safetrack", version, about = "Drive the SafeTrack offline cache controller", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, env = "SAFETRACK_SW_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Precache the app shell; activates right away on skip-waiting
    Install,
    /// Delete partitions of other generations and take control
    Activate,
    /// Issue a request through the controller
    Fetch {
        /// Path or absolute URL, resolved against the origin
        url: String,
        /// Request mode: navigate, same-origin, no-cors or cors
        #[arg(long)]
        mode: Option<String>,
        /// Request destination such as document, script, style or image
        #[arg(long)]
        destination: Option<String>,
        #[arg(long, default_value = "GET")]
        method: String,
    },
    /// List partitions with their entry counts
    Partitions,
    /// List the entries of one partition
    Entries { partition: String },
    /// Delete a partition
    Purge { partition: String },
    /// Show generation state and partitions
    Status,
}
