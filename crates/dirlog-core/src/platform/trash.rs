/// Recoverable deletion of the log artifact.
///
/// - **Windows:** `SHFileOperationW` with `FOF_ALLOWUNDO`, i.e. the Recycle Bin.
/// - **macOS:** a move into `~/.Trash`.
/// - **Other Unix:** the freedesktop.org trash (`$XDG_DATA_HOME/Trash`), with
///   a `.trashinfo` record so desktop file managers can restore the file.
use crate::error::DisposeError;
use std::fs;
#[cfg(unix)]
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
#[cfg(unix)]
use tracing::debug;

/// Where a disposed artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposal {
    /// Moved into a trash directory; the path is its new location.
    Trashed(PathBuf),
    /// Handed to the Windows Recycle Bin.
    RecycleBin,
}

impl std::fmt::Display for Disposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trashed(path) => write!(f, "moved to trash at {}", path.display()),
            Self::RecycleBin => f.write_str("moved to the Recycle Bin"),
        }
    }
}

/// Removes the artifact at the end of a run.
pub trait Disposer {
    fn dispose(&self, path: &Path) -> Result<Disposal, DisposeError>;
}

/// The platform trash.
#[derive(Debug, Clone, Default)]
pub struct TrashDisposer {
    /// Overrides the platform trash directory.
    #[cfg(unix)]
    trash_dir: Option<PathBuf>,
}

impl TrashDisposer {
    /// Use the platform's default trash location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `dir` as the trash directory (freedesktop layout on non-macOS
    /// Unix, a flat directory on macOS). Windows always uses the Recycle Bin.
    #[cfg(unix)]
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            trash_dir: Some(dir.into()),
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    fn trash_dir(&self) -> Result<PathBuf, DisposeError> {
        self.trash_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("Trash")))
            .ok_or(DisposeError::NoTrashLocation)
    }

    #[cfg(target_os = "macos")]
    fn trash_dir(&self) -> Result<PathBuf, DisposeError> {
        self.trash_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|d| d.join(".Trash")))
            .ok_or(DisposeError::NoTrashLocation)
    }
}

impl Disposer for TrashDisposer {
    #[cfg(all(unix, not(target_os = "macos")))]
    fn dispose(&self, path: &Path) -> Result<Disposal, DisposeError> {
        let trash = self.trash_dir()?;
        let dest = trash_freedesktop(&trash, path).map_err(|source| DisposeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Trashed {} -> {}", path.display(), dest.display());
        Ok(Disposal::Trashed(dest))
    }

    #[cfg(target_os = "macos")]
    fn dispose(&self, path: &Path) -> Result<Disposal, DisposeError> {
        let trash = self.trash_dir()?;
        let dest = trash_flat(&trash, path).map_err(|source| DisposeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Trashed {} -> {}", path.display(), dest.display());
        Ok(Disposal::Trashed(dest))
    }

    #[cfg(windows)]
    fn dispose(&self, path: &Path) -> Result<Disposal, DisposeError> {
        recycle(path)?;
        info!("Recycled {}", path.display());
        Ok(Disposal::RecycleBin)
    }
}

/// Name used for the `n`th collision: `log.txt`, `log.2.txt`, `log.3.txt`, ...
#[cfg(unix)]
fn unique_name(original: &Path, attempt: u32) -> String {
    let file_name = original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    if attempt == 0 {
        return file_name;
    }
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(file_name);
    match original.extension() {
        Some(ext) => format!("{stem}.{}.{}", attempt + 1, ext.to_string_lossy()),
        None => format!("{stem}.{}", attempt + 1),
    }
}

/// Rename, falling back to copy + remove when the trash lives on another
/// filesystem.
#[cfg(unix)]
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.raw_os_error() == Some(nix::errno::Errno::EXDEV as i32) => {
            debug!("Cross-device trash move, copying {}", from.display());
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(err) => Err(err),
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn trash_freedesktop(trash: &Path, path: &Path) -> io::Result<PathBuf> {
    use std::io::Write;

    let original = std::path::absolute(path)?;
    // Fail before touching the trash if the artifact is already gone.
    fs::symlink_metadata(&original)?;

    let files_dir = trash.join("files");
    let info_dir = trash.join("info");
    fs::create_dir_all(&files_dir)?;
    fs::create_dir_all(&info_dir)?;

    let deletion_date = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S");
    let record = format!(
        "[Trash Info]\nPath={}\nDeletionDate={deletion_date}\n",
        encode_trash_path(&original)
    );

    for attempt in 0.. {
        let name = unique_name(&original, attempt);
        let info_path = info_dir.join(format!("{name}.trashinfo"));
        // The info file is the reservation: create_new makes the name ours.
        let mut info_file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&info_path)
        {
            Ok(f) => f,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        };
        let dest = files_dir.join(&name);
        if dest.exists() {
            // Orphaned payload without an info file; leave it alone.
            drop(info_file);
            fs::remove_file(&info_path)?;
            continue;
        }

        let moved = info_file
            .write_all(record.as_bytes())
            .and_then(|()| info_file.sync_all())
            .and_then(|()| move_file(&original, &dest));
        if let Err(err) = moved {
            let _ = fs::remove_file(&info_path);
            return Err(err);
        }
        return Ok(dest);
    }
    unreachable!("unbounded attempt counter")
}

#[cfg(target_os = "macos")]
fn trash_flat(trash: &Path, path: &Path) -> io::Result<PathBuf> {
    fs::symlink_metadata(path)?;
    fs::create_dir_all(trash)?;
    for attempt in 0.. {
        let dest = trash.join(unique_name(path, attempt));
        if dest.exists() {
            continue;
        }
        move_file(path, &dest)?;
        return Ok(dest);
    }
    unreachable!("unbounded attempt counter")
}

/// Percent-encode a path for the `Path=` key of a `.trashinfo` file.
/// Unreserved characters and `/` are kept verbatim.
#[cfg(unix)]
fn encode_trash_path(path: &Path) -> String {
    use std::fmt::Write;
    use std::os::unix::ffi::OsStrExt;

    let mut out = String::new();
    for &byte in path.as_os_str().as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

#[cfg(windows)]
fn recycle(path: &Path) -> Result<(), DisposeError> {
    use std::os::windows::ffi::OsStrExt;
    use windows::core::PCWSTR;
    use windows::Win32::UI::Shell::{
        SHFileOperationW, FOF_ALLOWUNDO, FOF_NOCONFIRMATION, FOF_NOERRORUI, FOF_SILENT,
        FO_DELETE, SHFILEOPSTRUCTW,
    };

    let absolute = std::path::absolute(path).map_err(|source| DisposeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if let Err(source) = fs::symlink_metadata(&absolute) {
        return Err(DisposeError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    // pFrom is a list of NUL-terminated paths ending with an extra NUL.
    let mut from: Vec<u16> = absolute.as_os_str().encode_wide().collect();
    from.extend_from_slice(&[0, 0]);

    let mut op = SHFILEOPSTRUCTW {
        wFunc: FO_DELETE,
        pFrom: PCWSTR(from.as_ptr()),
        fFlags: (FOF_ALLOWUNDO | FOF_NOCONFIRMATION | FOF_NOERRORUI | FOF_SILENT) as u16,
        ..Default::default()
    };

    let code = unsafe { SHFileOperationW(&mut op) };
    if code != 0 || op.fAnyOperationsAborted.as_bool() {
        return Err(DisposeError::Shell {
            path: path.to_path_buf(),
            code,
        });
    }
    Ok(())
}
