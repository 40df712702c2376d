//! CLI module for lecnav.

pub mod commands;
mod output;

pub use output::Output;

use crate::segment::SegmentPreset;
use clap::{Args, Parser, Subcommand};

/// lecnav - Lecture transcript navigation
///
/// Index subtitle tracks and find the moments in a lecture or video that answer a question.
#[derive(Parser, Debug)]
#[command(name = "lecnav")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "LECNAV_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Window selection shared by `ingest` and `segment`.
#[derive(Args, Debug, Clone, Copy)]
pub struct WindowArgs {
    /// Window preset (ingest: 30s/15s, raw: 45s/15s by default)
    #[arg(long, default_value = "ingest")]
    pub preset: SegmentPreset,

    /// Window duration in seconds (overrides the preset)
    #[arg(long)]
    pub window: Option<f64>,

    /// Overlap between windows in seconds (overrides the preset)
    #[arg(long)]
    pub overlap: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Segment, embed and index a caption file (SRT, VTT or JSON)
    Ingest {
        /// Caption file path
        file: String,

        /// Source ID (defaults to the file name without extension)
        #[arg(long)]
        source_id: Option<String>,

        /// Display title (defaults to the source ID)
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Print the chunks of a caption file as JSON without indexing
    Segment {
        /// Caption file path
        file: String,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Find the passages that best match a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (defaults to retrieval.default_k)
        #[arg(short)]
        k: Option<usize>,

        /// Only search within this source
        #[arg(short, long)]
        source: Option<String>,
    },

    /// List indexed sources
    List,

    /// Remove a source from the index
    Delete {
        /// Source ID to delete
        source_id: String,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest_with_overrides() {
        let cli = Cli::try_parse_from([
            "lecnav", "-vv", "ingest", "lec.srt", "--title", "Lecture", "--preset", "raw",
            "--overlap", "10",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ingest {
                file,
                source_id,
                title,
                window,
            } => {
                assert_eq!(file, "lec.srt");
                assert!(source_id.is_none());
                assert_eq!(title.as_deref(), Some("Lecture"));
                assert_eq!(window.preset, SegmentPreset::Raw);
                assert_eq!(window.overlap, Some(10.0));
                assert!(window.window.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["lecnav", "search", "binary trees", "-k", "5", "--source", "lec1"])
            .unwrap();
        match cli.command {
            Commands::Search { query, k, source } => {
                assert_eq!(query, "binary trees");
                assert_eq!(k, Some(5));
                assert_eq!(source.as_deref(), Some("lec1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_preset() {
        assert!(Cli::try_parse_from(["lecnav", "segment", "a.srt", "--preset", "huge"]).is_err());
    }
}
