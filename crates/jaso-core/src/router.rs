//! Classifies filesystem notifications and picks the subtree to re-walk.

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind, RenameMode};

use crate::tree::{NormalizeReport, TreeNormalizer};

/// A filesystem notification, decoded once from the OS watch backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created(PathBuf),
    Modified(PathBuf),
    /// An entry now lives at `to`. `from` is unknown on backends that report
    /// the two halves of a rename separately.
    Moved {
        from: Option<PathBuf>,
        to: PathBuf,
    },
    Other,
}

impl From<notify::Event> for FsEvent {
    fn from(event: notify::Event) -> Self {
        let mut paths = event.paths.into_iter();
        let Some(first) = paths.next() else {
            return FsEvent::Other;
        };

        match event.kind {
            EventKind::Create(_) => FsEvent::Created(first),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match paths.next() {
                Some(to) => FsEvent::Moved {
                    from: Some(first),
                    to,
                },
                None => FsEvent::Moved {
                    from: None,
                    to: first,
                },
            },
            EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => {
                FsEvent::Moved {
                    from: None,
                    to: first,
                }
            }
            // The source half of a rename: that path no longer exists
            EventKind::Modify(ModifyKind::Name(_)) => FsEvent::Other,
            EventKind::Modify(_) => FsEvent::Modified(first),
            _ => FsEvent::Other,
        }
    }
}

/// Returns the path a notification asks us to re-normalize, if any.
///
/// Moves are routed by their destination since the source is gone.
pub fn route(event: &FsEvent) -> Option<&Path> {
    match event {
        FsEvent::Created(path) | FsEvent::Modified(path) => Some(path),
        FsEvent::Moved { to, .. } => Some(to),
        FsEvent::Other => None,
    }
}

/// Runs a tree walk for each routed notification.
///
/// Holds no per-event state; one router can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    walker: TreeNormalizer,
    watch_root: Option<PathBuf>,
}

impl EventRouter {
    pub fn new(walker: TreeNormalizer) -> Self {
        Self {
            walker,
            watch_root: None,
        }
    }

    /// Confines walks to `root`. The root's own name is never changed, since
    /// renaming it would sever the watch registered on it.
    pub fn with_watch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.watch_root = Some(root.into());
        self
    }

    /// Normalizes the subtree the event points at. `None` for ignored kinds.
    pub fn dispatch(&self, event: &FsEvent) -> Option<NormalizeReport> {
        let path = route(event)?;
        tracing::debug!("Routing {event:?} to {}", path.display());
        Some(self.normalize(path))
    }

    /// Normalizes the subtree at `path`, honouring the watch root.
    pub fn normalize(&self, path: &Path) -> NormalizeReport {
        match &self.watch_root {
            Some(root) if path == root => {
                self.walker.including_root(false).normalize_tree(path)
            }
            Some(root) if !path.starts_with(root) => {
                tracing::debug!("Ignoring {} outside {}", path.display(), root.display());
                NormalizeReport::default()
            }
            _ => self.walker.normalize_tree(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};
    use std::fs;
    use tempfile::TempDir;
    use unicode_normalization::UnicodeNormalization;

    fn nfd(s: &str) -> String {
        s.nfd().collect()
    }

    fn notify_event(kind: EventKind, paths: &[&str]) -> notify::Event {
        paths
            .iter()
            .fold(notify::Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn decodes_create() {
        let event = notify_event(EventKind::Create(CreateKind::File), &["/w/a"]);
        assert_eq!(FsEvent::from(event), FsEvent::Created("/w/a".into()));
    }

    #[test]
    fn decodes_content_modify() {
        let event = notify_event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/w/a"],
        );
        assert_eq!(FsEvent::from(event), FsEvent::Modified("/w/a".into()));
    }

    #[test]
    fn decodes_rename_both() {
        let event = notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/w/old", "/w/new"],
        );
        assert_eq!(
            FsEvent::from(event),
            FsEvent::Moved {
                from: Some("/w/old".into()),
                to: "/w/new".into()
            }
        );
    }

    #[test]
    fn decodes_rename_halves() {
        let to = notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/w/new"],
        );
        assert_eq!(
            FsEvent::from(to),
            FsEvent::Moved {
                from: None,
                to: "/w/new".into()
            }
        );

        let from = notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/w/old"],
        );
        assert_eq!(FsEvent::from(from), FsEvent::Other);
    }

    #[test]
    fn decodes_ignored_kinds_as_other() {
        for kind in [
            EventKind::Remove(RemoveKind::File),
            EventKind::Access(AccessKind::Any),
            EventKind::Any,
        ] {
            assert_eq!(FsEvent::from(notify_event(kind, &["/w/a"])), FsEvent::Other);
        }
        let empty = notify_event(EventKind::Create(CreateKind::Any), &[]);
        assert_eq!(FsEvent::from(empty), FsEvent::Other);
    }

    #[test]
    fn route_picks_source_or_destination() {
        let created = FsEvent::Created("/w/a".into());
        assert_eq!(route(&created), Some(Path::new("/w/a")));

        let modified = FsEvent::Modified("/w/b".into());
        assert_eq!(route(&modified), Some(Path::new("/w/b")));

        let moved = FsEvent::Moved {
            from: Some("/w/old".into()),
            to: "/w/sub/new.txt".into(),
        };
        assert_eq!(route(&moved), Some(Path::new("/w/sub/new.txt")));

        assert_eq!(route(&FsEvent::Other), None);
    }

    #[test]
    fn created_event_on_root_composes_file_once() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(root.join(nfd("한글.txt")), "hello").unwrap();

        let router = EventRouter::default();
        let event = FsEvent::Created(root.clone());

        let first = router.dispatch(&event).unwrap();
        assert_eq!(first.renamed.len(), 1);
        assert_eq!(first.renamed[0].to, root.join("한글.txt"));

        let second = router.dispatch(&event).unwrap();
        assert!(second.renamed.is_empty());
    }

    #[test]
    fn moved_event_walks_destination_only() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        let sub = root.join("sub");
        fs::create_dir_all(&sub).unwrap();
        let dest = sub.join(nfd("새.txt"));
        fs::write(&dest, "moved").unwrap();
        // Sibling that a walk from the stale source's directory would touch
        let sibling = root.join(nfd("옆.txt"));
        fs::write(&sibling, "").unwrap();

        let event = FsEvent::Moved {
            from: Some(root.join("old.txt")),
            to: dest.clone(),
        };
        let report = EventRouter::default().dispatch(&event).unwrap();

        assert_eq!(report.renamed.len(), 1);
        assert_eq!(report.renamed[0].from, dest);
        assert_eq!(fs::read_to_string(sub.join("새.txt")).unwrap(), "moved");
        assert!(sibling.exists());
    }

    #[test]
    fn other_event_does_nothing() {
        assert!(EventRouter::default().dispatch(&FsEvent::Other).is_none());
    }

    #[test]
    fn created_event_for_vanished_path_is_empty() {
        let tmp = TempDir::new().unwrap();
        let event = FsEvent::Created(tmp.path().join("already-deleted"));
        let report = EventRouter::default().dispatch(&event).unwrap();
        assert_eq!(report.visited, 0);
    }

    #[test]
    fn watch_root_itself_is_never_renamed() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(nfd("감시"));
        fs::create_dir(&root).unwrap();
        fs::write(root.join(nfd("파일")), "").unwrap();

        let router = EventRouter::default().with_watch_root(root.clone());
        let report = router.dispatch(&FsEvent::Modified(root.clone())).unwrap();

        assert_eq!(report.renamed.len(), 1);
        assert!(root.is_dir());
        assert!(root.join("파일").exists());
    }

    #[test]
    fn paths_outside_watch_root_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("watched");
        fs::create_dir(&root).unwrap();
        let outside = tmp.path().join(nfd("밖"));
        fs::write(&outside, "").unwrap();

        let router = EventRouter::default().with_watch_root(root);
        let report = router.dispatch(&FsEvent::Created(outside.clone())).unwrap();

        assert!(report.renamed.is_empty());
        assert!(outside.exists());
    }
}
