/// Report module: the traversal log artifact.
///
/// [`writer`] holds the exact text format; [`summary`] the counters
/// gathered while writing, which the frontend echoes back to the user.
pub mod summary;
pub mod writer;

pub use summary::TraversalSummary;
pub use writer::{write_log, write_traversal, LogWriter, DEFAULT_ARTIFACT_NAME, SEPARATOR};
