//! On-disk layout and ordered replacement of files.
//!
//! An encrypted `notes.txt` becomes two siblings:
//!
//! ```text
//! notes.txt.bye    ciphertext || tag
//! .notes.txt.bye   metadata sidecar
//! ```
//!
//! New files are written through [`Commit`]: each one is staged in a
//! temporary file next to its destination, fsynced, then renamed into place
//! in staging order. Originals are removed only after every rename succeeded.

use crate::error::{ByeError, Result};
use crate::metadata::MetadataBundle;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Suffix appended to the plaintext name to form the ciphertext name
pub const SUFFIX: &str = ".bye";
/// Prefix that turns a ciphertext name into its sidecar name
pub const SIDECAR_PREFIX: &str = ".";

/// `<path>.bye`
pub fn ciphertext_path(source: &Path) -> PathBuf {
    let mut os = source.as_os_str().to_os_string();
    os.push(SUFFIX);
    PathBuf::from(os)
}

/// `.<name>.bye` in the same directory as the ciphertext
pub fn sidecar_path(ciphertext: &Path) -> Result<PathBuf> {
    let name = ciphertext.file_name().ok_or_else(|| {
        ByeError::Usage(format!("Not a file path: {}", ciphertext.display()))
    })?;
    let mut sidecar = OsString::from(SIDECAR_PREFIX);
    sidecar.push(name);
    Ok(ciphertext.with_file_name(sidecar))
}

/// Strip `.bye` from the ciphertext name. Works on the raw name so any
/// name `ciphertext_path` produced maps back.
pub fn plaintext_path(ciphertext: &Path) -> Result<PathBuf> {
    ciphertext
        .file_name()
        .and_then(strip_suffix)
        .map(|stem| ciphertext.with_file_name(stem))
        .ok_or_else(|| {
            ByeError::Usage(format!(
                "Expected a file name ending in {}: {}",
                SUFFIX,
                ciphertext.display()
            ))
        })
}

#[cfg(unix)]
fn strip_suffix(name: &OsStr) -> Option<OsString> {
    use std::os::unix::ffi::OsStrExt;

    name.as_bytes()
        .strip_suffix(SUFFIX.as_bytes())
        .filter(|stem| !stem.is_empty())
        .map(|stem| OsStr::from_bytes(stem).to_os_string())
}

#[cfg(not(unix))]
fn strip_suffix(name: &OsStr) -> Option<OsString> {
    name.to_str()?
        .strip_suffix(SUFFIX)
        .filter(|stem| !stem.is_empty())
        .map(OsString::from)
}

/// Fail with `FileNotFound` unless `path` is an existing regular file
pub fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ByeError::FileNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ByeError::Usage(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Fail with `OutputExists` if `path` is taken and overwriting is not allowed
pub fn ensure_absent(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        return Err(ByeError::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

pub fn read_sidecar(path: &Path) -> Result<MetadataBundle> {
    let bytes = fs::read(path)?;
    MetadataBundle::decode(&bytes)
}

pub fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path)?;
    debug!(path = %path.display(), "removed");
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

struct Staged {
    temp: NamedTempFile,
    dest: PathBuf,
}

/// Ordered write-temp, fsync, rename sequence.
///
/// Temporaries are created owner-only by `tempfile`. Dropping an
/// uncommitted `Commit` deletes them.
pub struct Commit {
    staged: Vec<Staged>,
    force: bool,
}

impl Commit {
    pub fn new(force: bool) -> Self {
        Self {
            staged: Vec::new(),
            force,
        }
    }

    /// Write `bytes` to a temporary file beside `dest` and flush it to disk
    pub fn stage(&mut self, dest: &Path, bytes: &[u8]) -> Result<()> {
        ensure_absent(dest, self.force)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".bye-")
            .suffix(".tmp")
            .tempfile_in(parent_dir(dest))?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        debug!(dest = %dest.display(), bytes = bytes.len(), "staged");
        self.staged.push(Staged {
            temp,
            dest: dest.to_path_buf(),
        });
        Ok(())
    }

    /// Rename every staged file into place, in staging order.
    ///
    /// If a rename fails, files this commit newly created are removed and
    /// the remaining temporaries are discarded. Files it replaced under
    /// `force` are left holding the new contents: the old contents are
    /// already gone, and deleting the replacement would lose both.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let force = self.force;
        let mut placed: Vec<PathBuf> = Vec::with_capacity(self.staged.len());
        let mut created: Vec<PathBuf> = Vec::new();

        for Staged { temp, dest } in self.staged {
            let replacing = force && fs::symlink_metadata(&dest).is_ok();
            let persisted = if force {
                temp.persist(&dest)
            } else {
                temp.persist_noclobber(&dest)
            };

            if let Err(e) = persisted {
                for path in created.iter().rev() {
                    if let Err(cleanup) = fs::remove_file(path) {
                        warn!(path = %path.display(), error = %cleanup, "rollback failed");
                    }
                }
                for path in placed.iter().filter(|p| !created.contains(*p)) {
                    warn!(path = %path.display(), "replaced before a later rename failed");
                }
                if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                    return Err(ByeError::OutputExists(dest));
                }
                return Err(e.error.into());
            }
            if !replacing {
                created.push(dest.clone());
            }
            placed.push(dest);
        }

        let mut dirs: Vec<PathBuf> = placed.iter().map(|p| parent_dir(p)).collect();
        dirs.dedup();
        for dir in &dirs {
            sync_dir(dir)?;
        }

        debug!(files = placed.len(), "committed");
        Ok(placed)
    }
}
