//! Corpsman - offline clinical query assistant.
//!
//! Reads queries from stdin (or answers a single --query), resolves
//! them against the guideline corpus and the session's patient
//! context, and speaks replies through the stdout sink.

use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::{info, Level};

use corpsman::config::EngineConfig;
use corpsman::engine::{Engine, Session, SpeechSink, StdoutSink};

#[derive(Parser)]
#[command(name = "corpsman")]
#[command(about = "Offline clinical guideline assistant", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Corpus directory, overrides the config
    #[arg(long)]
    corpus_dir: Option<PathBuf>,

    /// Answer a single query and exit
    #[arg(long)]
    query: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from_path(path)
            .ok_or_else(|| anyhow::anyhow!("could not load config from {}", path.display()))?,
        None => EngineConfig::load(),
    };
    if let Some(dir) = cli.corpus_dir {
        config.corpus_dir = dir;
    }

    info!("Corpsman v{} starting", env!("CARGO_PKG_VERSION"));
    let engine = Engine::init(&config)?;
    let mut session = Session::new();
    let mut sink = StdoutSink;

    if let Some(query) = cli.query {
        let reply = engine.process_turn(&mut session, &query);
        sink.speak(&reply)?;
        return Ok(());
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "quit" || query == "exit" {
            break;
        }
        let reply = engine.process_turn(&mut session, query);
        sink.speak(&reply)?;
    }

    info!("Session ended after {} turns", session.transcript.len());
    Ok(())
}
