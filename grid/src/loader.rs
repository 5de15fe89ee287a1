//! Loading mazes from disk, with the built-in maze as last resort.

use std::{
    fmt::Display,
    fs::read_to_string,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{default_maze, parse, MalformedMazeInput, MazeLayout};

/// Where the game looks for a maze, in order
pub const DEFAULT_MAZE_PATHS: [&str; 3] = ["../assets/maze.txt", "assets/maze.txt", "maze.txt"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: MalformedMazeInput,
    },
}

/// Where a maze came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MazeSource {
    File(PathBuf),
    Default,
}

impl Display for MazeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MazeSource::File(path) => write!(f, "{}", path.display()),
            MazeSource::Default => f.write_str("built-in maze"),
        }
    }
}

/// A maze and its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMaze {
    pub layout: MazeLayout,
    pub source: MazeSource,
}

impl LoadedMaze {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            layout: default_maze(),
            source: MazeSource::Default,
        }
    }
}

impl From<MazeLayout> for LoadedMaze {
    fn from(layout: MazeLayout) -> Self {
        Self {
            layout,
            source: MazeSource::Default,
        }
    }
}

/// Read and parse a single maze file
pub fn load_file(path: impl AsRef<Path>) -> Result<MazeLayout, LoadError> {
    let path = path.as_ref();
    let text = read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    let layout = parse(&text).map_err(|source| LoadError::Malformed {
        path: path.to_owned(),
        source,
    })?;
    log::info!(
        "Loaded a {}x{} maze from {}",
        layout.grid.width(),
        layout.grid.height(),
        path.display()
    );
    Ok(layout)
}

/// Load the first candidate that can be read and parsed, falling back to the
/// built-in maze. Never fails.
pub fn load_first<I, P>(candidates: I) -> LoadedMaze
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    for path in candidates {
        let path = path.as_ref();
        match load_file(path) {
            Ok(layout) => {
                return LoadedMaze {
                    layout,
                    source: MazeSource::File(path.to_owned()),
                }
            }
            Err(LoadError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                log::debug!("No maze at {}", path.display())
            }
            Err(err @ LoadError::Io { .. }) => log::warn!("{err}"),
            Err(LoadError::Malformed { path, source }) => {
                log::warn!("Skipping {}: {source}", path.display())
            }
        }
    }
    log::warn!("No usable maze file found, using the built-in maze");
    LoadedMaze::builtin()
}

/// [`load_first`] over [`DEFAULT_MAZE_PATHS`]
pub fn load_default_paths() -> LoadedMaze {
    load_first(DEFAULT_MAZE_PATHS)
}
