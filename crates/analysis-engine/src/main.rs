//! Analyze a PGN from the command line.
//!
//! Usage: `analyze-pgn <file|-> [--ply N] [--human w|b]`
//!
//! With `--ply`, prints the analysis of that one position. Otherwise every
//! ply of the game is analyzed in order. Output is JSON on stdout.

use std::io::Read;

use anyhow::{bail, Context};
use tracing::info;

use analysis_engine::{preload_game, AnalysisCoordinator, EngineConfig, SideContext};
use chess_core::{position_at, Game, Side};

struct Args {
    source: String,
    ply: Option<i64>,
    human: Option<Side>,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut source = None;
    let mut ply = None;
    let mut human = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--ply" => {
                let value = args.get(i + 1).context("--ply needs a value")?;
                ply = Some(value.parse().with_context(|| format!("bad ply '{value}'"))?);
                i += 1;
            }
            "--human" => {
                let value = args.get(i + 1).context("--human needs a value")?;
                human = Some(value.parse::<Side>().map_err(anyhow::Error::msg)?);
                i += 1;
            }
            other if source.is_none() => source = Some(other.to_string()),
            other => bail!("unexpected argument '{other}'"),
        }
        i += 1;
    }

    let Some(source) = source else {
        bail!("usage: analyze-pgn <file|-> [--ply N] [--human w|b]");
    };
    Ok(Args { source, ply, human })
}

fn read_pgn(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(source).with_context(|| format!("reading {source}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenvy::dotenv();

    let args = parse_args()?;
    let game = Game::parse(&read_pgn(&args.source)?)?;
    let config = EngineConfig::from_env();
    info!(
        plies = game.len(),
        white = game.metadata.white.as_deref().unwrap_or("?"),
        black = game.metadata.black.as_deref().unwrap_or("?"),
        result = game.metadata.result.as_deref().unwrap_or("*"),
        engine = %config.path,
        "Game loaded"
    );

    let coordinator = AnalysisCoordinator::from_config(config);

    let output = match args.ply {
        Some(ply) => {
            let position = position_at(&game, ply);
            let side = SideContext::for_position(&position, args.human);
            let analysis = coordinator.analyze(&game, ply, side).await?;
            serde_json::to_string_pretty(&analysis)?
        }
        None => {
            let plies = preload_game(&coordinator, &game, args.human).await?;
            serde_json::to_string_pretty(&plies)?
        }
    };
    coordinator.analyzer().shutdown().await;

    println!("{output}");
    Ok(())
}
