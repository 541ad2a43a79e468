/// dirlog CLI: the interactive terminal frontend.
///
/// All prompting and user-facing text lives here. The work itself
/// (traversal, log writing, dispatch, disposal) is done by `dirlog-core`;
/// [`pipeline::Pipeline`] sequences those steps against injectable
/// input/output streams so the whole run can be driven from tests.
pub mod args;
pub mod banner;
pub mod pipeline;
pub mod prompt;

pub use args::Args;
pub use pipeline::{Outcome, Pipeline, RunOptions, RunReport};
