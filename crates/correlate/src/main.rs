//! Correlate - annotates PGN player tags with engine-correlation scores.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use correlate::config::CorrelateConfig;
use correlate::pgn::{read_games, write_games_to_path, PgnGame};
use engine_correlation::{
    evaluate_correlation, resolve_engine_path, strip_correlation, Backoff, EngineSession,
    RunOptions,
};
use tracing_subscriber::EnvFilter;
use uci::{extract_best_move, BestMove, GoOptions};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Parser)]
#[command(name = "correlate")]
#[command(about = "Engine-correlation scoring for PGN game collections")]
struct Cli {
    /// Configuration file (defaults to correlate.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every game and annotate the player tags
    Evaluate {
        /// PGN file to annotate
        input: PathBuf,
        /// Where to write the result (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Search depth per query
        #[arg(long)]
        depth: Option<u32>,
        /// First polling wait of a search in milliseconds
        #[arg(long)]
        wait_ms: Option<u64>,
        /// Re-score players that are already annotated
        #[arg(long)]
        force: bool,
    },
    /// Remove correlation annotations from the player tags
    Strip {
        /// PGN file to clean
        input: PathBuf,
        /// Where to write the result (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Start the engine and show how it sees a position
    Probe {
        /// Position to probe (defaults to the starting position)
        #[arg(long)]
        fen: Option<String>,
        /// Search depth
        #[arg(long)]
        depth: Option<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    let config = CorrelateConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Evaluate {
            input,
            output,
            depth,
            wait_ms,
            force,
        } => {
            let mut games = load_games(&input)?;
            let options = RunOptions {
                depth: depth.unwrap_or(config.analysis.depth),
                wait_ms: wait_ms.unwrap_or(config.analysis.wait_ms),
                force,
            };
            tracing::info!("Loaded {} games from {}", games.len(), input.display());

            let modified = evaluate_correlation(&mut games, &config.engine, &options)
                .context("Correlation run failed")?;

            let output = output.unwrap_or(input);
            save_games(&output, &games)?;
            println!("Annotated {} games, written to {}", modified, output.display());
        }
        Commands::Strip { input, output } => {
            let mut games = load_games(&input)?;
            let modified = strip_correlation(&mut games);
            let output = output.unwrap_or(input);
            save_games(&output, &games)?;
            println!("Stripped {} games, written to {}", modified, output.display());
        }
        Commands::Probe { fen, depth } => {
            let fen = fen.unwrap_or_else(|| START_FEN.to_string());
            let depth = depth.unwrap_or(config.analysis.depth);
            probe(&config, &fen, depth)?;
        }
    }

    Ok(())
}

fn load_games(path: &Path) -> anyhow::Result<Vec<PgnGame>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_games(BufReader::new(file)).with_context(|| format!("Failed to read PGN from {}", path.display()))
}

fn save_games(path: &Path, games: &[PgnGame]) -> anyhow::Result<()> {
    write_games_to_path(path, games).with_context(|| format!("Failed to write PGN to {}", path.display()))
}

fn probe(config: &CorrelateConfig, fen: &str, depth: u32) -> anyhow::Result<()> {
    let path = resolve_engine_path(&config.engine).context("No engine for this platform")?;
    let mut session = EngineSession::start(&path, &config.engine)
        .with_context(|| format!("Failed to start engine {}", path.display()))?;
    println!("Engine: {}", session.name());

    let poll = config.engine.poll_interval();
    let backoff = Backoff::new(
        Duration::from_millis(config.analysis.wait_ms),
        config.engine.wait_growth,
    );
    let client = session.client();
    client.set_position(fen)?;
    println!("Position: {}", client.position_fen(poll)?);

    let response = client.search(GoOptions::depth(depth), backoff)?;
    match extract_best_move(&response)? {
        BestMove::Move(mv) => println!("Best move at depth {}: {}", depth, mv),
        BestMove::NoMove => println!("No legal move at depth {}", depth),
    }

    session.stop().context("Failed to stop engine")?;
    Ok(())
}
