//! Recursive subtree normalization.
//!
//! The walk is post-order: every child of a directory is handled before the
//! directory's own name, so each rename uses a path prefix that still exists.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::normalize::{normalize_entry, plan_entry, Rename};

/// Shared flag checked before every entry of a walk.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Walk options.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Whether the walk root's own name is normalized too.
    pub include_root: bool,
    /// Exact entry names that are skipped entirely.
    pub exclude: Vec<String>,
    /// Report planned renames without performing them.
    pub dry_run: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            include_root: true,
            exclude: Vec::new(),
            dry_run: false,
        }
    }
}

/// An entry that could not be normalized.
#[derive(Debug)]
pub struct EntryFailure {
    pub path: PathBuf,
    pub error: CoreError,
}

/// Outcome of a single walk.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub renamed: Vec<Rename>,
    pub failures: Vec<EntryFailure>,
    pub visited: usize,
    pub cancelled: bool,
}

impl NormalizeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    fn fail(&mut self, path: &Path, error: CoreError) {
        tracing::warn!("Could not normalize {}: {error}", path.display());
        self.failures.push(EntryFailure {
            path: path.to_path_buf(),
            error,
        });
    }
}

/// Applies the per-entry normalizer to every entry below a root.
#[derive(Debug, Clone, Default)]
pub struct TreeNormalizer {
    options: TreeOptions,
    cancel: CancelToken,
}

impl TreeNormalizer {
    pub fn new(options: TreeOptions) -> Self {
        Self {
            options,
            cancel: CancelToken::new(),
        }
    }

    /// Attaches a cancellation token shared with the caller.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Same walker with a different `include_root` setting.
    pub fn including_root(&self, include_root: bool) -> Self {
        let mut walker = self.clone();
        walker.options.include_root = include_root;
        walker
    }

    /// Normalizes `root` and everything below it.
    ///
    /// A root that does not exist produces an empty report. Per-entry
    /// failures are collected and never abort the walk.
    pub fn normalize_tree(&self, root: &Path) -> NormalizeReport {
        let mut report = NormalizeReport::default();
        if std::fs::symlink_metadata(root).is_err() {
            tracing::debug!("Walk root {} is gone, nothing to do", root.display());
            return report;
        }
        self.visit(root, self.options.include_root, &mut report);
        tracing::debug!(
            "Walked {}: {} visited, {} renamed, {} failed",
            root.display(),
            report.visited,
            report.renamed.len(),
            report.failures.len()
        );
        report
    }

    fn visit(&self, path: &Path, rename_self: bool, report: &mut NormalizeReport) {
        if self.cancel.is_cancelled() {
            report.cancelled = true;
            return;
        }
        if self.is_excluded(path) {
            return;
        }
        report.visited += 1;

        let metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) => {
                report.fail(path, CoreError::from_io(path, e));
                return;
            }
        };

        // Symlinked directories are renamed by name but never followed
        if metadata.is_dir() {
            match list_children(path) {
                Ok(children) => {
                    for child in children {
                        self.visit(&child, true, report);
                    }
                }
                Err(e) => report.fail(path, e),
            }
        }

        if !rename_self || self.cancel.is_cancelled() {
            return;
        }
        if self.options.dry_run {
            if let Some(planned) = plan_entry(path) {
                report.renamed.push(planned);
            }
            return;
        }
        match normalize_entry(path) {
            Ok(Some(rename)) => report.renamed.push(rename),
            Ok(None) => {}
            Err(e) => report.fail(path, e),
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.options.exclude.iter().any(|ex| ex == name)
    }
}

/// Lists a directory up front so renames don't disturb the iteration.
fn list_children(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| CoreError::from_io(dir, e))?;
    let mut children = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| CoreError::from_io(dir, e))?;
        children.push(entry.path());
    }
    Ok(children)
}
