use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "anibridge-jellyfin")]
#[command(author, version, about = "Jellyfin library provider for AniBridge")]
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
    /// Validate the provider configuration and connect to Jellyfin
    Validate,

    /// List the library sections visible to the configured user
    Sections,

    /// List the movies or shows of a section
    Items {
        /// Section key or title
        section: String,

        /// Only items the user has watched
        #[arg(long)]
        watched: bool,

        /// Only items added or modified since this RFC 3339 timestamp
        #[arg(long)]
        since: Option<String>,

        /// Only items with these keys
        #[arg(long = "key")]
        keys: Vec<String>,

        /// Print the mapping descriptors of every item
        #[arg(long)]
        mappings: bool,
    },

    /// Show the viewing history of an item
    History {
        /// Section key or title
        section: String,

        /// Item key
        key: String,
    },

    /// Receive Jellyfin webhooks and print the sync decision
    Listen {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "4848")]
        port: u16,
    },

    /// Display version information
    Version,
}
