use std::{fs::read_to_string, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use simple_logger::SimpleLogger;

use escape::{config::PartialConfig, AutoSolve, GameSession, SessionState, Step};
use grid::{
    loader::{load_default_paths, load_file},
    CellKind, Grid, LoadedMaze, MazeSource, Position,
};

#[derive(Debug, Parser)]
struct Args {
    /// Configuration file for the session
    #[clap(short)]
    config: Option<PathBuf>,
    /// Maze to play, instead of searching the default locations
    #[clap(short, long)]
    maze: Option<PathBuf>,
    /// Overrides of the configuration file
    #[clap(flatten)]
    session: PartialConfig,
    /// Render the final board to this image
    #[clap(short, long)]
    output: Option<PathBuf>,
    /// Give up after this many auto-play steps
    #[clap(long, default_value = "500")]
    max_steps: usize,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Config {
    session: PartialConfig,
}

const TILE_SIZE: u32 = 24;
const MARKER_SIZE: u32 = 8;

const WALL_COLOR: [u8; 3] = [40, 40, 40];
const CRYSTAL_COLOR: [u8; 3] = [0, 255, 255];
const TRAVERSED_COLOR: [u8; 3] = [192, 192, 192];
const PATH_COLOR: [u8; 3] = [150, 150, 255];
const FLOOR_COLORS: [[u8; 3]; 2] = [[120, 120, 200], [100, 100, 180]];
const PLAYER_COLOR: [u8; 3] = [50, 150, 255];
const GOAL_COLOR: [u8; 3] = [50, 255, 50];

fn tile_color(grid: &Grid, pos: Position) -> [u8; 3] {
    let Ok(cell) = grid.cell_at(pos) else {
        return WALL_COLOR;
    };
    match cell.kind() {
        CellKind::Wall => WALL_COLOR,
        CellKind::Crystal => CRYSTAL_COLOR,
        _ if cell.is_traversed() => TRAVERSED_COLOR,
        _ if cell.is_on_path() => PATH_COLOR,
        _ => FLOOR_COLORS[(pos.x + pos.y) % 2],
    }
}

fn render(session: &GameSession) -> image::RgbImage {
    let grid = session.grid();
    let mut image = image::RgbImage::new(
        TILE_SIZE * grid.width() as u32,
        TILE_SIZE * grid.height() as u32,
    );
    for pos in grid.positions() {
        let [left, top] = [pos.x, pos.y].map(|c| c as u32 * TILE_SIZE);
        let color = tile_color(grid, pos);
        for x in left..left + TILE_SIZE {
            for y in top..top + TILE_SIZE {
                image[(x, y)].0 = color;
            }
        }
    }
    // markers in the middle of their tiles
    let markers = [
        (session.goal_position(), GOAL_COLOR),
        (session.player_position(), PLAYER_COLOR),
    ];
    for (pos, color) in markers {
        let [left, top] =
            [pos.x, pos.y].map(|c| c as u32 * TILE_SIZE + (TILE_SIZE - MARKER_SIZE) / 2);
        for x in left..left + MARKER_SIZE {
            for y in top..top + MARKER_SIZE {
                image[(x, y)].0 = color;
            }
        }
    }
    image
}

fn board(session: &GameSession) -> String {
    let grid = session.grid();
    let mut out = String::with_capacity(grid.len() * 2 + grid.height());
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let pos = Position::new(x, y);
            let c = if pos == session.player_position() {
                '@'
            } else {
                match grid.cell_at(pos) {
                    Ok(cell) if cell.is_reflected() => '+',
                    Ok(cell) if cell.kind() == CellKind::Empty && cell.is_traversed() => '*',
                    Ok(cell) => cell.kind().token(),
                    Err(_) => ' ',
                }
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}

fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .without_timestamps()
        .with_level(if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .env()
        .init()
        .context("While initializing logging")?;

    let Args {
        config,
        maze,
        session: flags,
        output,
        max_steps,
    } = Args::parse();
    let config: Config = config
        .map(|path| {
            read_to_string(path)
                .context("Cannot read config file")
                .and_then(|s| toml::from_str(&s).context("Cannot parse config file"))
        })
        .transpose()
        .context("While loading configs")?
        .unwrap_or_default();
    let config = config.session.merge(flags).or_defaults();

    let loaded = match maze {
        Some(path) => LoadedMaze {
            layout: load_file(&path).context("While loading the maze")?,
            source: MazeSource::File(path),
        },
        None => load_default_paths(),
    };
    println!("Maze: {}", loaded.source);
    let mut session = GameSession::from_loaded(loaded, config);

    match session.request_auto_solve() {
        AutoSolve::Started { steps } => println!("Planned {steps} steps"),
        AutoSolve::NoPathFound => println!("The goal cannot be reached"),
        AutoSolve::AlreadyComplete => (),
    }
    let mut replans = 0;
    for _ in 0..max_steps {
        match session.step(1. / 60.) {
            Step::Moved { replanned, .. } => replans += usize::from(replanned),
            Step::Halted(err) => {
                println!("Auto-play halted: {err}");
                break;
            }
            Step::Idle => break,
        }
    }

    print!("{}", board(&session));
    println!(
        "{} after {} moves ({replans} replans, {} flips, {} cache hits)",
        match session.state() {
            SessionState::Complete => "Escaped",
            _ => "Still trapped",
        },
        session.move_count(),
        session.generation(),
        session.cache().hits()
    );

    if let Some(output) = output {
        render(&session)
            .save(output)
            .context("While saving the image")?;
    }
    Ok(())
}
