// Owner-only file helpers shared by the file adapters

use hottub_core::error::{AppError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Owner read/write only
pub(crate) const PRIVATE_MODE: u32 = 0o600;

const MAX_UNIQUE_SUFFIX: u32 = 1_000;

/// Write `contents` to `path` atomically: unique temp file in the same
/// directory, fsync, then rename over the target. Readers see the old or
/// the new file, never a partial one.
pub(crate) fn write_private_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // NamedTempFile is created 0600 on unix
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    set_private(tmp.path())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write `contents` to `base`, or to `base.1`, `base.2`, ... if taken.
/// Never overwrites an existing file; returns the path written.
pub(crate) fn write_private_unique(base: &Path, contents: &[u8]) -> std::io::Result<PathBuf> {
    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    set_private(tmp.path())?;

    for n in 0..MAX_UNIQUE_SUFFIX {
        let candidate = if n == 0 {
            base.to_path_buf()
        } else {
            let mut name = base.as_os_str().to_owned();
            name.push(format!(".{}", n));
            PathBuf::from(name)
        };
        match tmp.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => tmp = e.file,
            Err(e) => return Err(e.error),
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("no free name for {}", base.display()),
    ))
}

/// Restrict an existing file to its owner
pub(crate) fn set_private(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(PRIVATE_MODE))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Append one line to an owner-only file, creating it if needed
pub(crate) fn append_private_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut options = fs::OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_MODE);
    }

    let mut file = options.open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Run blocking filesystem work off the async runtime
pub(crate) async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?
}
