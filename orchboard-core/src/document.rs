//! Reading and rewriting the coordination file.
//!
//! Every operation goes back to disk; nothing is cached between calls.
//!
//! ## `write` — whole-file overwrite
//!
//! 1. Resolve symlinks so the shared target is replaced, not the link.
//! 2. Write the full text to `<target>.orchboard.tmp`.
//! 3. Give the temp file the target's permissions.
//! 4. Rename over the target (atomic on POSIX).
//! 5. On failure, remove the temp file and leave the original intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, BoardError};
use crate::sections::{display_name, parse, SectionSet};

/// Read the whole file, replacing undecodable bytes with U+FFFD.
pub fn load(path: &Path) -> Result<String, BoardError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read the whole file, degrading any failure to an in-band error string.
pub fn read_or_error(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            tracing::warn!("failed to read {}: {}", path.display(), err);
            format!("ERROR reading {}: {err}", display_name(path))
        }
    }
}

/// Current sections for a viewer that has just connected.
pub fn snapshot(path: &Path) -> SectionSet {
    match std::fs::read(path) {
        Ok(bytes) => parse(&String::from_utf8_lossy(&bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => SectionSet::missing(path),
        Err(err) => {
            tracing::warn!("failed to read {}: {}", path.display(), err);
            SectionSet::unavailable(path, &err)
        }
    }
}

/// Replace the file's content with `text`.
pub fn write(path: &Path, text: &str) -> Result<(), BoardError> {
    let target = resolve_target(path)?;
    let tmp = PathBuf::from(format!("{}.orchboard.tmp", target.display()));
    write_with_tmp(&target, text, &tmp)
}

fn resolve_target(path: &Path) -> Result<PathBuf, BoardError> {
    match std::fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(e) => Err(io_err(path, e)),
    }
}

fn write_with_tmp(path: &Path, text: &str, tmp: &Path) -> Result<(), BoardError> {
    std::fs::write(tmp, text).map_err(|e| io_err(tmp, e))?;

    let replaced = copy_permissions(path, tmp).and_then(|()| std::fs::rename(tmp, path));
    if let Err(e) = replaced {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::debug!("wrote: {}", path.display());
    Ok(())
}

fn copy_permissions(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::metadata(from) {
        Ok(meta) => std::fs::set_permissions(to, meta.permissions()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
