/// Command-line arguments.
///
/// Every argument is optional: with none given the tool behaves as a
/// plain interactive prompt session.
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// Walk a directory tree, write a traversal log, email it and trash it.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "dirlog",
    version,
    about = "Walk a directory tree, write a traversal log, email it and move it to the trash",
    after_help = "EXAMPLES:\n    \
        dirlog\n    \
        dirlog --path /srv/data --to ops@example.com\n    \
        DIRLOG_SMTP_USERNAME=me@gmail.com DIRLOG_SMTP_PASSWORD=... dirlog"
)]
pub struct Args {
    /// Directory to traverse (prompted for when omitted)
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Recipient address (prompted for when omitted)
    #[arg(short, long, value_name = "EMAIL")]
    pub to: Option<String>,

    /// Config file (default: <config dir>/dirlog/config.json, if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep the log in the working directory if the email could not be sent
    #[arg(long)]
    pub keep_log_on_failure: bool,

    /// Show debug diagnostics, including the SMTP dialogue
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress the instructions banner and warnings
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Maximum level for the stderr diagnostics subscriber.
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::ERROR
        } else {
            Level::WARN
        }
    }
}
