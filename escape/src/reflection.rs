//! Crystal reflections.
//!
//! Entering a crystal mirrors the walked tiles across it: along each axis the
//! tile at distance `d` on one side becomes traversed when the tile at `d` on
//! the other side is. A ray stops at the first untraversed source, at a wall,
//! or at the border.

use std::collections::VecDeque;

use grid::{Direction, Grid, OutOfBounds, Position};

/// Outcome of a reflection pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reflection {
    pub crystal: Position,
    /// Tiles that became traversed, in marking order
    pub marked: Vec<Position>,
}

impl Reflection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }
}

fn at_distance(origin: Position, dir: Direction, d: usize) -> Option<Position> {
    let (dx, dy) = dir.offset();
    let d = isize::try_from(d).ok()?;
    origin.offset(dx * d, dy * d)
}

/// Walk one ray, returning the newly marked tiles
fn cast(grid: &mut Grid, crystal: Position, dir: Direction) -> Vec<Position> {
    let mut marked = vec![];
    for d in 1.. {
        let (Some(target), Some(source)) = (
            at_distance(crystal, dir, d),
            at_distance(crystal, dir.opposite(), d),
        ) else {
            break;
        };
        let (Ok(target_cell), Ok(source_cell)) = (grid.cell_at(target), grid.cell_at(source))
        else {
            break;
        };
        if !source_cell.is_traversed() || target_cell.is_wall() {
            break;
        }
        if let Ok(true) = grid.mark_reflected(target) {
            marked.push(target);
        }
    }
    marked
}

/// Propagate traversal marks across `crystal` until nothing changes.
///
/// Running it again without an intervening move marks nothing.
pub fn reflect(grid: &mut Grid, crystal: Position) -> Result<Reflection, OutOfBounds> {
    grid.cell_at(crystal)?;
    let mut report = Reflection {
        crystal,
        marked: vec![],
    };
    let mut queue = VecDeque::from(Direction::ALL);
    while let Some(dir) = queue.pop_front() {
        let marked = cast(grid, crystal, dir);
        if !marked.is_empty() {
            // the opposite ray reads the tiles just marked
            let back = dir.opposite();
            if !queue.contains(&back) {
                queue.push_back(back);
            }
            report.marked.extend(marked);
        }
    }
    if !report.is_empty() {
        log::debug!(
            "Crystal at {crystal} reflected onto {} tiles",
            report.marked.len()
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use grid::{default_maze, CellKind, Grid, Position};

    use crate::reflection::reflect;

    fn row(width: usize, traversed: &[usize]) -> Grid {
        let mut grid = Grid::new(width, 1);
        for x in traversed {
            grid.mark_traversed(Position::new(*x, 0)).unwrap();
        }
        grid
    }

    #[test]
    fn crystal_next_to_the_walk() {
        let mut maze = default_maze();
        maze.grid.mark_traversed(Position::new(5, 3)).unwrap();
        maze.grid.mark_traversed(Position::new(6, 3)).unwrap();
        let report = reflect(&mut maze.grid, Position::new(6, 3)).unwrap();
        assert_eq!(report.marked, [Position::new(7, 3)]);
        let cell = maze.grid.cell_at(Position::new(7, 3)).unwrap();
        assert!(cell.is_traversed() && cell.is_reflected());
        assert!(!maze.grid.cell_at(Position::new(8, 3)).unwrap().is_traversed());
    }

    #[test]
    fn long_ray() {
        let mut grid = row(7, &[0, 1, 2]);
        let report = reflect(&mut grid, Position::new(3, 0)).unwrap();
        assert_eq!(report.marked, [4, 5, 6].map(|x| Position::new(x, 0)));
    }

    #[test]
    fn rays_feed_each_other() {
        let mut grid = row(9, &[1, 4]);
        let report = reflect(&mut grid, Position::new(3, 0)).unwrap();
        assert_eq!(report.marked, [2, 5].map(|x| Position::new(x, 0)));
    }

    #[test]
    fn idempotent() {
        let mut grid = row(9, &[1, 4]);
        reflect(&mut grid, Position::new(3, 0)).unwrap();
        let after_first = grid.clone();
        let second = reflect(&mut grid, Position::new(3, 0)).unwrap();
        assert!(second.is_empty());
        assert_eq!(grid, after_first);
    }

    #[test]
    fn walls_stop_rays() {
        let mut grid = row(6, &[0, 1]);
        grid.set_kind(Position::new(3, 0), CellKind::Wall).unwrap();
        let report = reflect(&mut grid, Position::new(2, 0)).unwrap();
        assert!(report.is_empty());
        for (_, cell) in grid.iter() {
            assert!(!(cell.is_wall() && cell.is_traversed()));
        }
    }

    #[test]
    fn walked_tiles_are_not_reflected() {
        let mut grid = row(5, &[0, 1, 3]);
        reflect(&mut grid, Position::new(2, 0)).unwrap();
        let walked = grid.cell_at(Position::new(3, 0)).unwrap();
        assert!(walked.is_traversed() && !walked.is_reflected());
        let mirrored = grid.cell_at(Position::new(4, 0)).unwrap();
        assert!(mirrored.is_reflected());
    }

    #[test]
    fn out_of_bounds() {
        let mut grid = Grid::new(2, 2);
        assert!(reflect(&mut grid, Position::new(2, 0)).is_err());
    }
}
