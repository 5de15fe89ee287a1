use lazy_static::lazy_static;

use crate::{CellKind, Grid, MazeLayout, Position};

const WIDTH: usize = 12;
const HEIGHT: usize = 10;
const START: Position = Position::new(1, 1);
const GOAL: Position = Position::new(10, 8);

const OBSTACLES: [(usize, usize); 19] = [
    (2, 2),
    (2, 3),
    (2, 4),
    (4, 2),
    (4, 4),
    (4, 5),
    (4, 6),
    (6, 1),
    (6, 5),
    (6, 7),
    (8, 2),
    (8, 4),
    (8, 6),
    (8, 7),
    (3, 7),
    (5, 7),
    (7, 7),
    (9, 3),
    (9, 5),
];
const CRYSTALS: [(usize, usize); 2] = [(6, 3), (9, 6)];

fn build() -> MazeLayout {
    log::info!("Building the built-in {WIDTH}x{HEIGHT} maze");
    let mut grid = Grid::new(WIDTH, HEIGHT);
    let ring = grid
        .positions()
        .filter(|p| p.x == 0 || p.y == 0 || p.x == WIDTH - 1 || p.y == HEIGHT - 1)
        .collect::<Vec<_>>();
    let placements = ring
        .into_iter()
        .map(|p| (p, CellKind::Wall))
        .chain(OBSTACLES.map(|p| (Position::from(p), CellKind::Wall)))
        .chain(CRYSTALS.map(|p| (Position::from(p), CellKind::Crystal)))
        .chain([(START, CellKind::Start), (GOAL, CellKind::Goal)]);
    for (pos, kind) in placements {
        grid.set_kind(pos, kind)
            .expect("The built-in layout should fit its grid");
    }
    MazeLayout {
        grid,
        start: START,
        goal: GOAL,
    }
}

lazy_static! {
    static ref DEFAULT_MAZE: MazeLayout = build();
}

/// The built-in 12x10 maze, used whenever no maze file can be loaded.
///
/// ```
/// use grid::{default_maze, CellKind, Position};
///
/// let maze = default_maze();
/// assert_eq!((maze.grid.width(), maze.grid.height()), (12, 10));
/// assert_eq!(maze.start, Position::new(1, 1));
/// assert_eq!(maze.goal, Position::new(10, 8));
/// assert_eq!(maze.grid.count(CellKind::Crystal), 2);
/// ```
#[must_use]
pub fn default_maze() -> MazeLayout {
    DEFAULT_MAZE.clone()
}
