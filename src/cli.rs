use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dubforge")]
#[command(author, version, about = "Automatic video dubbing pipeline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server with the event stream and download endpoints
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Dub a single video from the command line
    Dub {
        /// Source video URL
        #[arg(required = true)]
        url: String,

        /// Download quality (best, medium, low)
        #[arg(long, default_value = "best")]
        quality: String,

        /// Synthesized voice gender (female, male)
        #[arg(long, default_value = "female")]
        voice: String,

        /// Use an external download accelerator if available
        #[arg(long)]
        accelerator: bool,
    },

    /// Display source metadata without starting a job
    Info {
        /// Source video URL
        #[arg(required = true)]
        url: String,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
