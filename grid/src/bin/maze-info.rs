use std::path::PathBuf;

use clap::Parser;

use deepsize::DeepSizeOf;
use humansize::{format_size, BINARY};
use log::LevelFilter::Info;
use simple_logger::SimpleLogger;

use grid::{loader::load_file, CellKind};

#[derive(Parser)]
struct Args {
    /// Maze file to show info for
    infile: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let Args { infile } = Args::parse();
    SimpleLogger::new()
        .without_timestamps()
        .with_level(Info)
        .env()
        .init()
        .expect("Failed to init logger");
    let maze = load_file(&infile)?;

    println!("File: {}", infile.to_string_lossy());
    println!("Size: {}x{}", maze.grid.width(), maze.grid.height());
    println!("Start: {}", maze.start);
    println!("Goal: {}", maze.goal);
    for kind in CellKind::ALL {
        println!("{kind} tiles: {}", maze.grid.count(kind));
    }
    println!(
        "Unpacked memory: {}",
        format_size(maze.grid.deep_size_of(), BINARY)
    );

    Ok(())
}
