//! jaso — keeps filenames in a folder composed so Hangul never splits.
//!
//! `jaso watch` runs a watch session and an interactive prompt until the
//! user quits or presses Ctrl-C; the session is always stopped before exit.
//! `jaso fix` normalizes a folder once.

mod cli;
mod console;
mod prompt;

use std::future::Future;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing_subscriber::EnvFilter;

use jaso_core::{Alert, Config, SessionManager, TreeNormalizer};

use crate::cli::{Cli, Command, FixArgs, WatchArgs};
use crate::console::{ConsoleAlert, GivenDirectory};
use crate::prompt::{PromptCommand, HELP};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // Logs go to stderr so alerts and reports on stdout stay readable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level(&config.log.level)));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    match cli.command {
        Command::Watch(args) => run_watch(args, config).await,
        Command::Fix(args) => run_fix(args, config),
    }
}

async fn run_watch(args: WatchArgs, config: Config) -> anyhow::Result<()> {
    let alert: Arc<dyn Alert> = Arc::new(ConsoleAlert);
    let mut manager = SessionManager::new(args.watch_config(config.watch), alert);

    if let Some(dir) = args.dir {
        // Failures were already shown through the alert sink
        let _ = blocking(|| manager.request_start(&mut GivenDirectory::from(dir)));
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match read_line(&mut lines, tokio::signal::ctrl_c()).await? {
            Input::Line(line) => line,
            Input::Eof => break,
            Input::Interrupted => {
                tracing::info!("Interrupted");
                break;
            }
        };

        match prompt::parse(&line) {
            Ok(PromptCommand::Start(Some(dir))) => {
                let mut picker = GivenDirectory::new(Some(&dir));
                let _ = blocking(|| manager.request_start(&mut picker));
            }
            Ok(PromptCommand::Start(None)) => {
                println!("Folder to watch:");
                let answer = match read_line(&mut lines, tokio::signal::ctrl_c()).await? {
                    Input::Line(answer) => Some(answer),
                    Input::Eof => None,
                    Input::Interrupted => {
                        tracing::info!("Interrupted");
                        break;
                    }
                };
                let mut picker = GivenDirectory::new(answer.as_deref());
                let _ = blocking(|| manager.request_start(&mut picker));
            }
            Ok(PromptCommand::Stop) => {
                if blocking(|| manager.stop()) {
                    println!("Stopped watching.");
                } else {
                    println!("Nothing is being watched.");
                }
            }
            Ok(PromptCommand::Status) => match manager.slot().current() {
                Some(session) if session.is_alive() => {
                    println!("Watching {}", session.root().display());
                }
                Some(session) => println!(
                    "Watch on {} has ended; start it again",
                    session.root().display()
                ),
                None => println!("Nothing is being watched."),
            },
            Ok(PromptCommand::Help) => println!("{HELP}"),
            Ok(PromptCommand::Quit) => break,
            Ok(PromptCommand::Empty) => {}
            Err(message) => eprintln!("{message}"),
        }
    }

    blocking(|| manager.stop());
    Ok(())
}

/// One read from the prompt, raced against an interrupt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Line(String),
    Eof,
    Interrupted,
}

async fn read_line<R, I>(lines: &mut Lines<R>, interrupt: I) -> std::io::Result<Input>
where
    R: AsyncBufRead + Unpin,
    I: Future,
{
    tokio::select! {
        line = lines.next_line() => Ok(line?.map_or(Input::Eof, Input::Line)),
        _ = interrupt => Ok(Input::Interrupted),
    }
}

/// Runs session start/stop, which join threads, without stalling the runtime.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    tokio::task::block_in_place(f)
}

fn run_fix(args: FixArgs, config: Config) -> anyhow::Result<()> {
    if !args.dir.is_dir() {
        anyhow::bail!("not a directory: {}", args.dir.display());
    }

    let walker = TreeNormalizer::new(args.tree_options(&config.watch));
    let report = walker.normalize_tree(&args.dir);

    let verb = if args.dry_run { "would rename" } else { "renamed" };
    for rename in &report.renamed {
        println!("{verb}: {} -> {}", rename.from.display(), rename.to.display());
    }
    for failure in &report.failures {
        eprintln!("failed: {}: {}", failure.path.display(), failure.error);
    }
    println!(
        "{} entries checked, {} {verb}, {} failed",
        report.visited,
        report.renamed.len(),
        report.failures.len()
    );

    if !report.failures.is_empty() {
        anyhow::bail!("{} entries could not be normalized", report.failures.len());
    }
    Ok(())
}
