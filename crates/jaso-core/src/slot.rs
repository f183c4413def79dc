//! Ownership of "the current watch", at most one at a time.
//!
//! [`WatchSlot`] replaces the old session by stopping it before the new one
//! starts. [`SessionManager`] adds the start-request flow a host shell runs
//! when the user asks to watch a folder: consult the picker, validate,
//! start, and report every outcome through the alert sink.

use std::path::Path;
use std::sync::Arc;

use crate::config::WatchConfig;
use crate::error::{CoreError, CoreResult};
use crate::session::WatchSession;
use crate::shell::{Alert, AlertLevel, DirectoryPicker};

/// Holds the current [`WatchSession`], if any.
#[derive(Debug, Default)]
pub struct WatchSlot {
    current: Option<WatchSession>,
}

impl WatchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&WatchSession> {
        self.current.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.current.is_some()
    }

    /// Stops and removes the current session. Returns whether there was one.
    pub fn clear(&mut self) -> bool {
        match self.current.take() {
            Some(mut session) => {
                session.stop();
                true
            }
            None => false,
        }
    }

    /// Stops the current session, then starts `session` and installs it.
    ///
    /// The slot is left empty when `session` fails to start.
    pub fn replace(&mut self, mut session: WatchSession, alert: Arc<dyn Alert>) -> CoreResult<()> {
        self.clear();
        session.start(alert)?;
        self.current = Some(session);
        Ok(())
    }
}

/// Drives a [`WatchSlot`] on behalf of the host shell.
pub struct SessionManager {
    slot: WatchSlot,
    config: WatchConfig,
    alert: Arc<dyn Alert>,
}

impl SessionManager {
    pub fn new(config: WatchConfig, alert: Arc<dyn Alert>) -> Self {
        Self {
            slot: WatchSlot::new(),
            config,
            alert,
        }
    }

    pub fn slot(&self) -> &WatchSlot {
        &self.slot
    }

    /// Root of the active session, if one is installed.
    pub fn watching(&self) -> Option<&Path> {
        self.slot.current().map(WatchSession::root)
    }

    /// Handles a "start watching" request.
    ///
    /// Any running session is stopped first. Every outcome, success or not,
    /// is reported through the alert sink; the returned error is for callers
    /// that want to log or branch on it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoDirectorySelected`] — the picker was cancelled.
    /// - [`CoreError::NotADirectory`] — the picked path is not a directory.
    /// - anything [`WatchSession::start`] returns.
    pub fn request_start(&mut self, picker: &mut dyn DirectoryPicker) -> CoreResult<()> {
        if self.slot.clear() {
            self.alert.alert(
                AlertLevel::Info,
                "Stopped the watch that was already running.",
            );
        }

        let path = match picker.pick_directory() {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => {
                self.alert.alert(AlertLevel::Warning, "No folder was selected.");
                return Err(CoreError::NoDirectorySelected);
            }
        };
        if !path.is_dir() {
            self.alert.alert(
                AlertLevel::Warning,
                &format!("Not a valid folder: {}", path.display()),
            );
            return Err(CoreError::NotADirectory(path));
        }

        let session = WatchSession::new(path, self.config.clone());
        match self.slot.replace(session, Arc::clone(&self.alert)) {
            Ok(()) => {
                let root = self.watching().map(Path::to_path_buf).unwrap_or_default();
                self.alert.alert(
                    AlertLevel::Info,
                    &format!(
                        "Watching {}. Decomposed Hangul filenames will be composed automatically.",
                        root.display()
                    ),
                );
                Ok(())
            }
            Err(e) => {
                self.alert.alert(AlertLevel::Error, &format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Stops the active session, if any. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        self.slot.clear()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.slot.clear();
    }
}
