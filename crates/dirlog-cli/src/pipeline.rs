/// The run sequence: prompt, traverse, write, dispatch, dispose.
///
/// Only dispatch failures are recovered. An unusable root ends the run
/// cleanly with [`Outcome::Aborted`]; log-writing and disposal failures
/// propagate as errors.
use crate::banner::print_banner;
use crate::prompt::prompt;
use anyhow::Context;
use dirlog_core::mail::Dispatcher;
use dirlog_core::model::LogHeader;
use dirlog_core::platform::{Disposal, Disposer};
use dirlog_core::report::{write_traversal, TraversalSummary};
use dirlog_core::scanner::traverse;
use dirlog_core::{Config, DispatchError, TraversalSetupError};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const PATH_PROMPT: &str = "Enter Path: ";
pub const RECIPIENT_PROMPT: &str = "Enter your email id: ";

/// Per-run inputs that may come from the command line instead of prompts.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub path: Option<PathBuf>,
    pub recipient: Option<String>,
    pub show_banner: bool,
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The root could not be traversed; no artifact was created.
    Aborted(TraversalSetupError),
    Completed(RunReport),
}

#[derive(Debug)]
pub struct RunReport {
    pub artifact: PathBuf,
    pub summary: TraversalSummary,
    pub dispatch: Result<(), DispatchError>,
    /// `None` when the artifact was kept after a failed dispatch.
    pub disposal: Option<Disposal>,
}

/// One run against injected collaborators.
pub struct Pipeline<'a> {
    config: &'a Config,
    dispatcher: &'a dyn Dispatcher,
    disposer: &'a dyn Disposer,
    /// Directory the artifact is written to.
    work_dir: PathBuf,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        dispatcher: &'a dyn Dispatcher,
        disposer: &'a dyn Disposer,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            disposer,
            work_dir: work_dir.into(),
        }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.config.artifact_path(&self.work_dir)
    }

    pub fn run(
        &self,
        options: RunOptions,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> anyhow::Result<Outcome> {
        if options.show_banner {
            print_banner(output)?;
        }

        let root = match options.path {
            Some(path) => path,
            None => PathBuf::from(prompt(input, output, PATH_PROMPT)?),
        };

        let traversal = match traverse(&root) {
            Ok(traversal) => traversal,
            Err(err) => {
                writeln!(output, "ERROR OCCURRED: {err}")?;
                info!("Run aborted: {err}");
                return Ok(Outcome::Aborted(err));
            }
        };

        let artifact = self.artifact_path();
        let summary = write_traversal(&artifact, &LogHeader::capture(), traversal)
            .context("Failed to write the traversal log")?;
        writeln!(output, "\nAll done :)")?;
        writeln!(output, "Logged {summary} to {}", artifact.display())?;

        let recipient = match options.recipient {
            Some(recipient) => recipient,
            None => prompt(input, output, RECIPIENT_PROMPT)?,
        };

        let dispatch = self.dispatcher.dispatch(&recipient, &artifact);
        match &dispatch {
            Ok(()) => writeln!(output, "Email sent successfully")?,
            Err(err) => {
                warn!("Dispatch to {recipient:?} failed: {err}");
                writeln!(output, "{err}")?;
            }
        }

        let disposal = if dispatch.is_err() && self.config.keep_log_on_failure {
            writeln!(output, "Log kept at {}", artifact.display())?;
            None
        } else {
            let disposal = self.dispose(&artifact)?;
            writeln!(output, "Log {disposal}")?;
            Some(disposal)
        };

        Ok(Outcome::Completed(RunReport {
            artifact,
            summary,
            dispatch,
            disposal,
        }))
    }

    fn dispose(&self, artifact: &Path) -> anyhow::Result<Disposal> {
        let disposal = self
            .disposer
            .dispose(artifact)
            .with_context(|| format!("Failed to move {} to the trash", artifact.display()))?;
        info!("Disposed of {}: {disposal}", artifact.display());
        Ok(disposal)
    }
}
