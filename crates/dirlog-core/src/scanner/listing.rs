/// Single-directory listing built on `jwalk`.
///
/// `jwalk` is configured for one level (`max_depth(1)`), serial execution and
/// name-sorted output, which gives the traverser a deterministic order
/// without spinning up a rayon pool per directory.
///
/// The traverser calls this once per directory instead of running one
/// recursive walk, so each folder block has its complete child list before
/// any descendant is visited. Subtrees are listed only when the iterator
/// reaches them; one that fails to list is skipped on its own.
use crate::model::TraversalEntry;
use compact_str::CompactString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One directory's contents, split the way the log presents them.
#[derive(Debug)]
pub struct Listing {
    pub entry: TraversalEntry,
    /// Subfolders the traverser should descend into. Excludes symlinked
    /// directories, which are listed but not followed.
    pub descend: Vec<PathBuf>,
}

/// List the direct children of `dir`.
///
/// Fails only if `dir` itself cannot be read. A child that cannot be
/// inspected is logged and left out.
pub fn list_directory(dir: &Path) -> io::Result<Listing> {
    let walker = jwalk::WalkDir::new(dir)
        .max_depth(1)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .parallelism(jwalk::Parallelism::Serial);

    let mut entry = TraversalEntry::new(dir);
    let mut descend = Vec::new();
    let mut saw_root = false;

    for result in walker {
        let child = match result {
            Ok(child) => child,
            Err(err) => {
                let own_failure = err.path().is_none_or(|p| p == dir);
                let kind = err
                    .io_error()
                    .map(io::Error::kind)
                    .unwrap_or(io::ErrorKind::Other);
                if own_failure {
                    return Err(io::Error::new(kind, err.to_string()));
                }
                debug!("Cannot inspect entry in {}: {err}", dir.display());
                continue;
            }
        };

        if child.depth == 0 {
            saw_root = true;
            continue;
        }

        let name = CompactString::new(child.file_name().to_string_lossy());
        let file_type = child.file_type();

        if file_type.is_dir() {
            descend.push(child.path());
            entry.subfolders.push(name);
        } else if file_type.is_symlink() && points_to_dir(&child.path()) {
            entry.subfolders.push(name);
        } else {
            entry.files.push(name);
        }
    }

    if !saw_root {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} disappeared before it could be listed", dir.display()),
        ));
    }

    Ok(Listing { entry, descend })
}

fn points_to_dir(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_dir())
}
