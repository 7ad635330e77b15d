use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// bridgeview: developer tooling for the web surface control layer.
#[derive(Parser, Debug)]
#[command(name = "bridgeview", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error, or a filter directive).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify URLs for interception and origin matching.
    Classify {
        /// URLs to classify.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Origin whitelist pattern (repeatable).
        #[arg(short = 'w', long = "whitelist")]
        whitelist: Vec<String>,
    },

    /// Splice a script into an HTML document and write it to stdout.
    Inject {
        /// HTML file to read.
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Script source to inject.
        #[arg(short = 's', long)]
        script: String,

        /// Document charset label (defaults to UTF-8).
        #[arg(short = 'c', long)]
        charset: Option<String>,
    },

    /// Run the interception pipeline against a live URL and write the body to stdout.
    Fetch {
        url: String,

        /// Script injected before page scripts run.
        #[arg(short = 's', long)]
        script: Option<String>,

        /// User agent sent with the fetch.
        #[arg(long)]
        user_agent: Option<String>,
    },

    /// Load and validate a config file, then print it as JSON.
    CheckConfig,
}

pub fn parse() -> Args {
    Args::parse()
}
