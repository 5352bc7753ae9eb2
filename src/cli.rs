//! Command-line interface for voxshift
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Voice transformation pipeline: upload, transcribe, re-voice, download
#[derive(Parser, Debug)]
#[command(
    name = "voxshift",
    version,
    about = "Voice transformation pipeline: upload, transcribe, re-voice, download"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Server URL for client commands
    #[arg(long, global = true, value_name = "URL", default_value = crate::defaults::SERVER_URL)]
    pub server: String,

    /// Client request timeout. Examples: 30s, 2m, 90
    #[arg(long, global = true, value_name = "DURATION", default_value = "60s", value_parser = parse_timeout)]
    pub timeout: Duration,
}

/// Parse a timeout string.
///
/// Bare numbers are seconds; anything else goes through `humantime`
/// (`30s`, `5m`, `1m30s`).
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let duration = match s.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(s).map_err(|e| e.to_string())?,
    };
    if duration.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(duration)
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (foreground)
    Serve {
        /// Address to bind (default: 127.0.0.1:8000)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Directory for stored audio
        #[arg(long, value_name = "DIR", conflicts_with = "in_memory")]
        storage: Option<PathBuf>,

        /// Keep audio in memory only
        #[arg(long)]
        in_memory: bool,
    },

    /// Upload an audio file
    Upload {
        /// Audio file to upload
        file: PathBuf,
    },

    /// Transcribe an audio file or a previously uploaded asset
    Transcribe {
        /// Audio file to upload and transcribe
        #[arg(conflicts_with = "audio_id", required_unless_present = "audio_id")]
        file: Option<PathBuf>,

        /// Id of an already uploaded asset
        #[arg(long, value_name = "ID")]
        audio_id: Option<String>,
    },

    /// Synthesize speech with a preset voice or an uploaded sample
    Synthesize {
        /// Text to speak
        text: String,

        /// Voice preset id (see `voxshift voices list`)
        #[arg(
            long,
            value_name = "ID",
            conflicts_with = "reference_audio",
            required_unless_present = "reference_audio"
        )]
        voice: Option<String>,

        /// Uploaded audio id to use as the reference voice
        #[arg(long, value_name = "ID")]
        reference_audio: Option<String>,

        /// Save the result here instead of only printing its id
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Download stored audio
    Download {
        /// Audio id
        id: String,

        /// Output file (default: server-suggested name)
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Show server health
    Status,

    /// Browse the built-in voice catalog
    Voices {
        #[command(subcommand)]
        action: VoicesAction,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Voice catalog actions
#[derive(Subcommand, Debug)]
pub enum VoicesAction {
    /// List built-in voices
    List,
    /// Search voices by name, description or category
    Search {
        /// Case-insensitive search text
        query: String,
    },
    /// Show one voice
    Show {
        /// Voice id (e.g., wizard-1)
        id: String,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value by key (e.g., server.bind)
    Get {
        /// Dotted key path (e.g., server.bind, synthesis.sample_rate)
        key: String,
    },
    /// Print the effective configuration as TOML
    Dump,
    /// Print the default configuration file path
    Path,
}
