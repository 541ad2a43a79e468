/// dirlog Core: traversal, log writing, mail dispatch and disposal.
///
/// This crate contains all business logic with zero terminal I/O.
/// Prompts, banners and argument parsing live in `dirlog-cli`.
///
/// # Modules
///
/// - [`model`]: Traversal entries and the log header.
/// - [`scanner`]: Lazy, top-down directory traversal.
/// - [`report`]: Serialises a traversal into the text log artifact.
/// - [`mail`]: Recipient validation, MIME assembly and a blocking SMTP client.
/// - [`platform`]: Host identity and recoverable (trash) deletion.
/// - [`config`]: JSON file + environment configuration.
/// - [`error`]: Typed errors for every step of a run.
pub mod config;
pub mod error;
pub mod mail;
pub mod model;
pub mod platform;
pub mod report;
pub mod scanner;

pub use config::Config;
pub use error::{ConfigError, DispatchError, DisposeError, LogWriteError, TraversalSetupError};
