/// Log writer: serialises a header and traversal entries to text.
///
/// Layout (`\n` line endings, no trailing newline at end of file):
///
/// ```text
/// THE DIRECTORY TRAVERSAL LOG:
///
/// Date: 2025-04-21
/// Time: 09:05:03.000042
/// Day: Monday
/// Host name: box
/// Username: alice
///
/// ==========================================================================
/// FOLDER: /data
/// ---> Subfolders:
/// ------> A
/// ---> Files:
/// ------> x.txt
/// ```
///
/// Every folder block starts with a blank line and the separator, so the
/// header never ends in a newline and neither does the last block.
use crate::error::LogWriteError;
use crate::model::{LogHeader, TraversalEntry};
use crate::report::TraversalSummary;
use crate::scanner::Traversal;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// File name of the artifact, created in the working directory.
pub const DEFAULT_ARTIFACT_NAME: &str = "directory_traversal_log.txt";

/// Line separating folder blocks (74 `=`).
pub const SEPARATOR: &str =
    "==========================================================================";

const TITLE: &str = "THE DIRECTORY TRAVERSAL LOG:";
const SECTION_PREFIX: &str = "---> ";
const ITEM_PREFIX: &str = "------> ";

/// Streaming writer for the log format.
pub struct LogWriter<W: Write> {
    out: W,
    summary: TraversalSummary,
}

impl<W: Write> LogWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            summary: TraversalSummary::default(),
        }
    }

    /// Title plus date, time, weekday, host and user lines.
    pub fn write_header(&mut self, header: &LogHeader) -> io::Result<()> {
        write!(
            self.out,
            "{TITLE}\n\nDate: {}\nTime: {}\nDay: {}\nHost name: {}\nUsername: {}",
            header.date(),
            header.time(),
            header.weekday(),
            header.host.hostname,
            header.host.username,
        )
    }

    /// One folder block.
    pub fn write_entry(&mut self, entry: &TraversalEntry) -> io::Result<()> {
        write!(self.out, "\n\n{SEPARATOR}")?;
        write!(self.out, "\nFOLDER: {}", entry.folder.display())?;

        write!(self.out, "\n{SECTION_PREFIX}Subfolders:")?;
        for name in &entry.subfolders {
            write!(self.out, "\n{ITEM_PREFIX}{name}")?;
        }

        write!(self.out, "\n{SECTION_PREFIX}Files:")?;
        for name in &entry.files {
            write!(self.out, "\n{ITEM_PREFIX}{name}")?;
        }

        self.summary.folders += 1;
        self.summary.files += entry.files.len() as u64;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<(W, TraversalSummary)> {
        self.out.flush()?;
        Ok((self.out, self.summary))
    }
}

/// Create (or truncate) the artifact at `path` and write the whole log.
///
/// The file is flushed, synced and closed before this returns, so a
/// reader opening `path` afterwards sees the complete document.
pub fn write_log<I>(
    path: &Path,
    header: &LogHeader,
    entries: I,
) -> Result<TraversalSummary, LogWriteError>
where
    I: IntoIterator<Item = TraversalEntry>,
{
    let wrap = |source: io::Error| LogWriteError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(wrap)?;
    let mut writer = LogWriter::new(BufWriter::new(file));
    writer.write_header(header).map_err(wrap)?;
    for entry in entries {
        writer.write_entry(&entry).map_err(wrap)?;
        debug!("Logged {}", entry.folder.display());
    }

    let (buffered, mut summary) = writer.finish().map_err(wrap)?;
    let file = buffered.into_inner().map_err(|e| wrap(e.into_error()))?;
    file.sync_all().map_err(wrap)?;
    summary.bytes_written = file.metadata().map_err(wrap)?.len();
    drop(file);

    info!("Wrote {} ({summary})", path.display());
    Ok(summary)
}

/// [`write_log`] for a [`Traversal`], carrying its skipped-directory count
/// into the summary.
pub fn write_traversal(
    path: &Path,
    header: &LogHeader,
    mut traversal: Traversal,
) -> Result<TraversalSummary, LogWriteError> {
    let mut summary = write_log(path, header, traversal.by_ref())?;
    summary.skipped = traversal.skipped();
    info!("Finished traversal of {}", traversal.root().display());
    Ok(summary)
}
