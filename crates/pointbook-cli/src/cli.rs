use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "pointbook")]
#[command(about = "Submit activity points with offline draft recovery")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Optional path to the local drafts file
    #[arg(long, global = true, value_name = "PATH")]
    pub drafts_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit an activity with its evidence file
    Submit(SubmitArgs),
    /// Inspect and manage locally saved drafts
    Drafts {
        #[command(subcommand)]
        command: DraftsCommands,
    },
    /// Retry every saved draft
    Retry {
        /// Keep running, retrying every SECS seconds until Ctrl-C
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// List activities confirmed by the server
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the stored access token
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
pub struct SubmitArgs {
    /// Activity title
    #[arg(long)]
    pub title: String,
    /// What you did
    #[arg(long)]
    pub description: String,
    /// Activity type id
    #[arg(long, value_name = "ID")]
    pub activity_type: String,
    /// Competency id
    #[arg(long, value_name = "ID")]
    pub competency: String,
    /// Free-text notes
    #[arg(long)]
    pub notes: Option<String>,
    /// Related event id
    #[arg(long, value_name = "ID")]
    pub event: Option<String>,
    /// Recognized course id
    #[arg(long, value_name = "ID")]
    pub course: Option<String>,
    /// Evidence file (PDF, JPEG or PNG, at most 10 MiB)
    #[arg(long, value_name = "PATH")]
    pub evidence: PathBuf,
}

#[derive(Subcommand)]
pub enum DraftsCommands {
    /// List saved drafts, oldest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Discard one draft
    Remove {
        /// Draft ID or unique ID prefix
        id: String,
    },
    /// Export every draft
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Discard every draft
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for pointbook_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Activity-points API base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Per-request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Drafts file for this profile
        #[arg(long = "profile-drafts-path", value_name = "PATH")]
        profile_drafts_path: Option<PathBuf>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved configuration
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store an access token in the OS keychain
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Bearer token (read from stdin when omitted)
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,
    },
    /// Show whether a token is stored for the profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Remove the stored token
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
