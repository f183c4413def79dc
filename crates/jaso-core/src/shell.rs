//! Interfaces the core needs from its host application.
//!
//! The host supplies a way to pick a directory and a way to show short
//! messages. Both are thin I/O wrappers; the core never waits on either.

use std::path::PathBuf;

/// Severity hint attached to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

/// Fire-and-forget message sink.
///
/// Called from background threads as well as the foreground, so
/// implementations must not block for long.
pub trait Alert: Send + Sync {
    fn alert(&self, level: AlertLevel, message: &str);
}

/// Asks the user for a directory.
///
/// `None` (or an empty path) means the user cancelled.
pub trait DirectoryPicker {
    fn pick_directory(&mut self) -> Option<PathBuf>;
}

impl<F> DirectoryPicker for F
where
    F: FnMut() -> Option<PathBuf>,
{
    fn pick_directory(&mut self) -> Option<PathBuf> {
        self()
    }
}

/// Alert sink that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlert;

impl Alert for LogAlert {
    fn alert(&self, level: AlertLevel, message: &str) {
        match level {
            AlertLevel::Info => tracing::info!("{message}"),
            AlertLevel::Warning => tracing::warn!("{message}"),
            AlertLevel::Error => tracing::error!("{message}"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every alert for later inspection.
    #[derive(Debug, Default)]
    pub struct RecordingAlert {
        messages: Mutex<Vec<(AlertLevel, String)>>,
    }

    impl RecordingAlert {
        pub fn messages(&self) -> Vec<(AlertLevel, String)> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl Alert for RecordingAlert {
        fn alert(&self, level: AlertLevel, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }
}
