use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use client_core::{load_settings, DisplaySlot, HistoryStore, JokeBoard};
use shared::domain::{HistoryEntry, SourceKind};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; `./jokes.toml` is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Refresh once, print both jokes and exit.
    #[arg(long)]
    once: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Refresh,
    Log,
    Clear,
    Quit,
    Help,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "refresh" => Some(Command::Refresh),
            "l" | "log" | "logs" => Some(Command::Log),
            "c" | "clear" => Some(Command::Clear),
            "q" | "quit" | "exit" => Some(Command::Quit),
            "h" | "help" | "?" => Some(Command::Help),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    info!(?settings, "daily jokes: starting");
    let history = Arc::new(HistoryStore::with_capacity(settings.history_capacity));
    let board = JokeBoard::from_settings(&settings, Arc::clone(&history))
        .context("failed to build joke sources")?;

    refresh_and_render(&board).await;
    if args.once {
        return Ok(());
    }

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Some(Command::Refresh) => refresh_and_render(&board).await,
            Some(Command::Log) => render_history(&history.list().await),
            Some(Command::Clear) => {
                print!("Are you sure you want to clear your joke history? [y/N] ");
                flush_stdout();
                let confirmed = lines
                    .next_line()
                    .await?
                    .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y"));
                if confirmed {
                    history.clear().await;
                    println!("History cleared.");
                }
            }
            Some(Command::Quit) => break,
            Some(Command::Help) => print_help(),
            None if line.trim().is_empty() => {}
            None => println!("Unknown command '{}'. Type 'help' for options.", line.trim()),
        }
        prompt();
    }

    Ok(())
}

async fn refresh_and_render(board: &JokeBoard) {
    println!("Loading...");
    let outcome = board.refresh().await;

    for (kind, title) in [
        (SourceKind::Primary, "Official Joke"),
        (SourceKind::Secondary, "Random Joke"),
    ] {
        println!();
        println!("== {title} ({}) ==", board.source_label(kind));
        match board.slot(kind) {
            DisplaySlot::Loaded(joke) => println!("{}", joke.text),
            DisplaySlot::Unavailable => println!("(could not load this joke)"),
            DisplaySlot::Empty => println!("(no joke yet)"),
        }
    }
    println!();

    if let Some(notice) = outcome.notice {
        eprintln!("Error: {}", notice.message());
    }
}

fn render_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No jokes yet. Refresh to start your log.");
        return;
    }

    println!("{} joke(s) in history, newest first:", entries.len());
    for entry in entries {
        let captured = entry.created_at.with_timezone(&Local);
        println!();
        println!(
            "[{}] {} ({})",
            captured.format("%Y-%m-%d %H:%M:%S"),
            entry.source_label,
            entry.source_kind
        );
        println!("{}", entry.text);
    }
    println!();
}

fn print_help() {
    println!("Commands: r/refresh, l/log, c/clear, q/quit");
}

fn prompt() {
    print!("> ");
    flush_stdout();
}

fn flush_stdout() {
    let _ = io::stdout().flush();
}
