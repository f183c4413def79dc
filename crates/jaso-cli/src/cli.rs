//! Command-line arguments.

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use jaso_core::{Config, TreeOptions, WatchConfig};

#[derive(Debug, Parser)]
#[command(
    name = "jaso",
    version,
    about = "Keeps filenames composed (NFC) so Hangul never splits into Jamo"
)]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read tuning values from a TOML file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch a folder and compose new or moved-in filenames as they appear
    Watch(WatchArgs),
    /// Compose every filename under a folder once, then exit
    Fix(FixArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Folder to start watching right away
    pub dir: Option<PathBuf>,

    /// Quiet period before a burst of changes is walked
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Entry name to leave alone (repeatable)
    #[arg(long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,
}

impl WatchArgs {
    /// Layers command-line overrides on top of the file configuration.
    pub fn watch_config(&self, base: WatchConfig) -> WatchConfig {
        let mut config = base;
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        config.exclude.extend(self.exclude.iter().cloned());
        config
    }
}

#[derive(Debug, Args)]
pub struct FixArgs {
    /// Folder to normalize
    pub dir: PathBuf,

    /// Only print what would be renamed
    #[arg(long)]
    pub dry_run: bool,

    /// Entry name to leave alone (repeatable)
    #[arg(long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,
}

impl FixArgs {
    pub fn tree_options(&self, base: &WatchConfig) -> TreeOptions {
        let mut exclude = base.exclude.clone();
        exclude.extend(self.exclude.iter().cloned());
        TreeOptions {
            include_root: false,
            exclude,
            dry_run: self.dry_run,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => Ok(Config::default()),
        }
    }

    /// Log filter directive: `-v` flags win over the configured level.
    pub fn log_level(&self, configured: &str) -> String {
        match self.verbose {
            0 => configured.to_string(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_watch_without_dir() {
        let cli = Cli::try_parse_from(["jaso", "watch"]).unwrap();
        match cli.command {
            Command::Watch(args) => {
                assert!(args.dir.is_none());
                assert!(args.debounce_ms.is_none());
            }
            Command::Fix(_) => panic!("expected watch"),
        }
    }

    #[test]
    fn parses_watch_with_options() {
        let cli = Cli::try_parse_from([
            "jaso",
            "-vv",
            "watch",
            "/data",
            "--debounce-ms",
            "50",
            "--exclude",
            ".git",
            "--exclude",
            "node_modules",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.dir, Some(PathBuf::from("/data")));

        let config = args.watch_config(WatchConfig::default());
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.exclude, vec![".git", "node_modules"]);
    }

    #[test]
    fn watch_config_keeps_file_values_without_flags() {
        let cli = Cli::try_parse_from(["jaso", "watch"]).unwrap();
        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        let base = WatchConfig {
            debounce_ms: 500,
            exclude: vec!["tmp".to_string()],
        };
        assert_eq!(args.watch_config(base.clone()), base);
    }

    #[test]
    fn parses_fix() {
        let cli = Cli::try_parse_from(["jaso", "fix", "/data", "--dry-run"]).unwrap();
        let Command::Fix(args) = cli.command else {
            panic!("expected fix");
        };
        assert_eq!(args.dir, PathBuf::from("/data"));

        let options = args.tree_options(&WatchConfig::default());
        assert!(options.dry_run);
        assert!(!options.include_root);
    }

    #[test]
    fn fix_requires_dir() {
        assert!(Cli::try_parse_from(["jaso", "fix"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["jaso"]).is_err());
    }

    #[test]
    fn log_level_from_flags() {
        let quiet = Cli::try_parse_from(["jaso", "watch"]).unwrap();
        assert_eq!(quiet.log_level("warn"), "warn");

        let loud = Cli::try_parse_from(["jaso", "watch", "-v"]).unwrap();
        assert_eq!(loud.log_level("warn"), "debug");
    }

    #[test]
    fn load_config_defaults_without_flag() {
        let cli = Cli::try_parse_from(["jaso", "watch"]).unwrap();
        assert_eq!(cli.load_config().unwrap(), Config::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jaso.toml");
        fs::write(&path, "[watch]\ndebounce_ms = 75\n").unwrap();

        let cli = Cli::try_parse_from([
            "jaso",
            "--config",
            path.to_str().unwrap(),
            "watch",
        ])
        .unwrap();
        assert_eq!(cli.load_config().unwrap().watch.debounce_ms, 75);
    }

    #[test]
    fn load_config_missing_file_errors() {
        let cli = Cli::try_parse_from(["jaso", "--config", "/nonexistent/jaso.toml", "watch"])
            .unwrap();
        let err = cli.load_config().unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }
}
