//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use guardrail_sessions::{DEFAULT_MAX_HISTORY, DEFAULT_WINDOW};

#[derive(Parser, Debug)]
#[command(name = "guardrail")]
#[command(version)]
#[command(about = "Content-safety checks for AI conversations")]
pub struct Cli {
    /// Configuration file (.yaml, .yml, .json or .toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the configuration
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Text to evaluate: an argument, a file, or stdin when neither is given
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Text to evaluate; `-` reads stdin
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check content against the rule set
    Check(InputArgs),
    /// Validate AI output (length, emptiness and safety)
    Validate(InputArgs),
    /// Replace personal information with placeholders
    Redact(InputArgs),
    /// Inspect or export the rule set
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Replay a JSON conversation transcript through the session store
    Replay {
        /// Transcript file: a JSON array of {session_id?, user_id, content, timestamp?}
        transcript: PathBuf,

        /// Messages retained per session
        #[arg(long, default_value_t = DEFAULT_MAX_HISTORY)]
        max_history: usize,

        /// Recent messages shown per session
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
    },
    /// Write the default configuration to a file
    Init {
        /// Destination; the extension selects the format
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List rules in evaluation order
    List {
        /// Only show enabled rules
        #[arg(long)]
        enabled: bool,
    },
    /// Save the active rule set as a configuration file
    Export {
        /// Destination; the extension selects the format
        path: PathBuf,
    },
}
