/// Scanner module: top-down directory traversal.
///
/// [`traverse`] validates the root eagerly and returns a [`Traversal`]: a
/// lazy, finite, single-pass iterator that yields one [`TraversalEntry`] per
/// directory, parent before children (depth-first pre-order).
///
/// Each directory is listed with `jwalk` (serial, sorted by name), so the
/// sequence is stable between runs on the same platform. Ordering across
/// platforms is not guaranteed and should not be relied upon.
pub mod listing;

use crate::error::TraversalSetupError;
use crate::model::TraversalEntry;
use listing::{list_directory, Listing};
use std::io;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Begin a traversal of `root`.
///
/// The root is checked and listed before this returns, so an invalid or
/// unreadable root fails here, before any log artifact exists.
pub fn traverse(root: impl Into<PathBuf>) -> Result<Traversal, TraversalSetupError> {
    let root = root.into();

    let meta = std::fs::metadata(&root).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => TraversalSetupError::NotFound { path: root.clone() },
        _ => TraversalSetupError::Unreadable {
            path: root.clone(),
            source,
        },
    })?;
    if !meta.is_dir() {
        return Err(TraversalSetupError::NotADirectory { path: root });
    }

    let first = list_directory(&root).map_err(|source| TraversalSetupError::Unreadable {
        path: root.clone(),
        source,
    })?;

    info!("Starting traversal of {}", root.display());
    let mut traversal = Traversal {
        root,
        ready: None,
        pending: Vec::new(),
        skipped: 0,
    };
    traversal.accept(first);
    Ok(traversal)
}

/// Lazy traversal of a directory tree. See [`traverse`].
#[derive(Debug)]
pub struct Traversal {
    root: PathBuf,
    /// Entry already listed but not yet handed out (the root, initially).
    ready: Option<TraversalEntry>,
    /// Directories still to visit. The top of the stack is visited next.
    pending: Vec<PathBuf>,
    skipped: u64,
}

impl Traversal {
    /// The root path, exactly as supplied.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of nested directories that could not be listed and were skipped.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn accept(&mut self, listing: Listing) {
        // Reverse so the first listed subfolder is popped first.
        self.pending.extend(listing.descend.into_iter().rev());
        self.ready = Some(listing.entry);
    }
}

impl Iterator for Traversal {
    type Item = TraversalEntry;

    fn next(&mut self) -> Option<TraversalEntry> {
        loop {
            if let Some(entry) = self.ready.take() {
                return Some(entry);
            }

            let dir = self.pending.pop()?;
            match list_directory(&dir) {
                Ok(listing) => {
                    debug!(
                        "Listed {}: {} subfolders, {} files",
                        dir.display(),
                        listing.entry.subfolders.len(),
                        listing.entry.files.len()
                    );
                    self.accept(listing);
                }
                Err(err) => {
                    warn!("Skipping {}: {err}", dir.display());
                    self.skipped += 1;
                }
            }
        }
    }
}

impl FusedIterator for Traversal {}
