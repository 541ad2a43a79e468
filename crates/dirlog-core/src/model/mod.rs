/// Data model for a dirlog run.
///
/// Re-exports the per-directory traversal entry and the log header types.
pub mod entry;
pub mod header;

pub use entry::TraversalEntry;
pub use header::{HostIdentity, LogHeader};
