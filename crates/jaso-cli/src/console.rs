//! Terminal implementations of the host collaborators.

use std::path::PathBuf;

use jaso_core::{Alert, AlertLevel, DirectoryPicker};

/// Prints alerts for the user; warnings and errors go to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleAlert;

impl Alert for ConsoleAlert {
    fn alert(&self, level: AlertLevel, message: &str) {
        tracing::debug!("alert ({level:?}): {message}");
        match level {
            AlertLevel::Info => println!("{message}"),
            AlertLevel::Warning => eprintln!("warning: {message}"),
            AlertLevel::Error => eprintln!("error: {message}"),
        }
    }
}

/// A picker answered up front, from an argument or a prompt line.
///
/// Yields its path once; a blank answer counts as cancelled.
#[derive(Debug, Clone)]
pub struct GivenDirectory(Option<PathBuf>);

impl GivenDirectory {
    pub fn new(answer: Option<&str>) -> Self {
        let path = answer
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(expand_home);
        Self(path)
    }
}

impl From<PathBuf> for GivenDirectory {
    fn from(path: PathBuf) -> Self {
        Self(Some(path))
    }
}

impl DirectoryPicker for GivenDirectory {
    fn pick_directory(&mut self) -> Option<PathBuf> {
        self.0.take()
    }
}

fn expand_home(input: &str) -> PathBuf {
    match input.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest.trim_start_matches('/')),
            None => PathBuf::from(input),
        },
        _ => PathBuf::from(input),
    }
}
