use std::{fs, path::PathBuf};

use clap::Parser;

use grid::{default_maze, loader::load_file};
use log::LevelFilter::Info;
use simple_logger::SimpleLogger;

#[derive(Parser)]
struct Args {
    /// Maze to normalise instead of the built-in one
    #[clap(long, short = 'f')]
    from: Option<PathBuf>,
    outfile: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let Args { from, outfile } = Args::parse();
    SimpleLogger::new()
        .without_timestamps()
        .with_level(Info)
        .env()
        .init()
        .expect("Failed to init logger");
    let maze = match from {
        Some(path) => load_file(path)?,
        None => default_maze(),
    };
    fs::write(&outfile, maze.to_string())?;
    log::info!("Wrote {}", outfile.display());
    Ok(())
}
