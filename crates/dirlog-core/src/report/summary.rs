/// Counters collected while a traversal is written out.
use std::fmt;

/// What ended up in the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalSummary {
    /// Folder blocks written (one per directory visited).
    pub folders: u64,
    /// File lines written across all blocks.
    pub files: u64,
    /// Nested directories that could not be listed.
    pub skipped: u64,
    /// Size of the finished artifact in bytes.
    pub bytes_written: u64,
}

impl fmt::Display for TraversalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} {}",
            group_thousands(self.folders),
            plural(self.folders, "folder", "folders"),
            group_thousands(self.files),
            plural(self.files, "file", "files"),
        )?;
        if self.skipped > 0 {
            write!(f, " ({} unreadable, skipped)", group_thousands(self.skipped))?;
        }
        Ok(())
    }
}

fn plural(n: u64, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 {
        one
    } else {
        many
    }
}

/// `1234567` -> `1,234,567`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let lead = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
