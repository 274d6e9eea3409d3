use std::path::{Path, PathBuf};

use anyhow::Context;
use chessboard_reader::{BoardReader, MoveResult, ReaderConfig, ReaderError};
use clap::{CommandFactory, Parser};

/// Recommend a move for the chessboard in a photograph.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Board image, cropped to the 64 squares
    image: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let Some(image) = cli.image else {
        println!("Please provide an image path as a command-line argument.");
        if let Err(e) = Cli::command().print_help() {
            log::error!("failed to print usage: {e}");
        }
        return;
    };

    if let Err(e) = run(&image) {
        println!("Critical error in processing: {e:#}");
        log::error!("{e:?}");
    }
}

fn run(image: &Path) -> anyhow::Result<()> {
    let config = ReaderConfig::from_env().context("failed to load configuration")?;

    if !image.exists() {
        return Err(ReaderError::ImageNotFound(image.to_path_buf()).into());
    }

    let mut reader = BoardReader::from_config(config).context("failed to load classifier")?;
    let analysis = reader
        .analyze_file(image)
        .with_context(|| format!("failed to analyse {}", image.display()))?;

    if let (Some(fen), Some(result)) = (&analysis.fen, &analysis.result) {
        println!("FEN: {fen}");
        print_result(result);
    }

    Ok(())
}

fn print_result(result: &MoveResult) {
    match &result.best_move {
        Some(m) => println!("Best Move: {m}"),
        None => println!("Best Move: No move found"),
    }
    println!("Checkmate: {}", result.is_checkmate);
    match result.is_castling {
        Some(castling) => println!("Castling: {castling}"),
        None => println!("Castling: None"),
    }
}
