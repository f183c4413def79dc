//! Per-entry filename normalization.
//!
//! macOS and several sync tools store filenames in NFD (decomposed), which
//! makes Korean Hangul show up as individual Jamo. [`decide`] looks at the
//! leaf name of a single path and [`normalize_entry`] renames it in place to
//! its NFC spelling when the two differ.

use std::path::{Path, PathBuf};

use unicode_normalization::{is_nfc, UnicodeNormalization};

use crate::error::{CoreError, CoreResult};

/// Normalises a string to NFC (composed) form.
pub fn nfc_string(s: &str) -> String {
    s.nfc().collect()
}

/// What should happen to a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizationDecision {
    /// The leaf name is already canonical.
    Keep,
    /// The entry should be renamed to `to`, which shares its parent.
    Rename { to: PathBuf },
}

/// A rename that was performed, or would be performed in a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Decides whether the leaf name of `path` needs composing.
///
/// Pure: the filesystem is not consulted. Only the last component is
/// examined and the parent is carried over untouched. Names that are not
/// valid UTF-8 are always kept, since they can't be normalised losslessly.
pub fn decide(path: &Path) -> NormalizationDecision {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return NormalizationDecision::Keep;
    };
    let Some(name) = name.to_str() else {
        return NormalizationDecision::Keep;
    };
    if is_nfc(name) {
        return NormalizationDecision::Keep;
    }

    let canonical = nfc_string(name);
    if canonical == name {
        NormalizationDecision::Keep
    } else {
        NormalizationDecision::Rename {
            to: parent.join(canonical),
        }
    }
}

/// Returns the rename [`normalize_entry`] would perform, without touching disk.
pub fn plan_entry(path: &Path) -> Option<Rename> {
    match decide(path) {
        NormalizationDecision::Keep => None,
        NormalizationDecision::Rename { to } => Some(Rename {
            from: path.to_path_buf(),
            to,
        }),
    }
}

/// Renames the entry at `path` to its NFC name within the same directory.
///
/// Returns `Ok(None)` when the name is already canonical; exactly one
/// `rename` call is made otherwise.
///
/// # Errors
///
/// - [`CoreError::NotFound`] — the entry vanished before it could be renamed.
/// - [`CoreError::AlreadyExists`] — a sibling already carries the canonical
///   name. Nothing is overwritten.
/// - [`CoreError::PermissionDenied`] / [`CoreError::Io`] — the rename failed.
pub fn normalize_entry(path: &Path) -> CoreResult<Option<Rename>> {
    let Some(rename) = plan_entry(path) else {
        return Ok(None);
    };

    // Use symlink_metadata so a dangling symlink still counts as present
    let source = std::fs::symlink_metadata(path).map_err(|e| CoreError::from_io(path, e))?;

    match std::fs::symlink_metadata(&rename.to) {
        Ok(target) if !is_same_entry(&source, &target) => {
            return Err(CoreError::AlreadyExists(rename.to));
        }
        // Normalization-insensitive filesystems resolve the NFC spelling to
        // the entry being renamed; the rename just rewrites its stored name
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(CoreError::from_io(&rename.to, e)),
    }

    std::fs::rename(&rename.from, &rename.to).map_err(|e| CoreError::from_io(path, e))?;
    tracing::info!(
        "Renamed {} -> {}",
        rename.from.display(),
        rename.to.display()
    );
    Ok(Some(rename))
}

#[cfg(unix)]
fn is_same_entry(a: &std::fs::Metadata, b: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn is_same_entry(_a: &std::fs::Metadata, _b: &std::fs::Metadata) -> bool {
    false
}
