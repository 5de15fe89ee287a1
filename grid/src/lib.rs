//! Tile grid of an "Escape the Grid" maze.
//!
//! The grid is a plain typed 2D array: every tile has a [`CellKind`] and a set of
//! [`Marks`] left by searches, the player and crystal reflections. It holds no
//! behaviour beyond bounds-checked lookup and mutation.

use std::fmt::Display;

use bitflags::bitflags;
use deepsize::DeepSizeOf;
use thiserror::Error;

mod default;
pub use default::default_maze;

pub mod format;
pub use format::{parse, MalformedMazeInput};

pub mod loader;
pub use loader::{LoadError, LoadedMaze, MazeSource};

/// A tile coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[inline(always)]
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Move by a signed offset, if the result is still non negative
    /// ```
    /// use grid::Position;
    ///
    /// assert_eq!(Position::new(2, 3).offset(-1, 1), Some(Position::new(1, 4)));
    /// assert_eq!(Position::new(0, 3).offset(-1, 0), None);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn offset(self, dx: isize, dy: isize) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    #[inline(always)]
    #[must_use]
    pub fn step(self, dir: Direction) -> Option<Self> {
        let (dx, dy) = dir.offset();
        self.offset(dx, dy)
    }

    /// Manhattan distance between two tiles
    /// ```
    /// use grid::Position;
    ///
    /// assert_eq!(Position::new(1, 1).manhattan(Position::new(10, 8)), 16);
    /// ```
    #[inline(always)]
    #[must_use]
    pub const fn manhattan(self, other: Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four orthogonal directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Up,
    Right,
    Left,
}

impl Direction {
    /// All directions, in neighbour exploration order
    pub const ALL: [Direction; 4] = [
        Direction::Down,
        Direction::Up,
        Direction::Right,
        Direction::Left,
    ];

    #[inline(always)]
    #[must_use]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::Down => (0, 1),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
        }
    }

    /// Direction of a unit step, if the offset is one
    /// ```
    /// use grid::Direction;
    ///
    /// assert_eq!(Direction::from_offset(0, -1), Some(Direction::Up));
    /// assert_eq!(Direction::from_offset(1, 1), None);
    /// ```
    #[must_use]
    pub const fn from_offset(dx: isize, dy: isize) -> Option<Self> {
        match (dx, dy) {
            (0, 1) => Some(Direction::Down),
            (0, -1) => Some(Direction::Up),
            (1, 0) => Some(Direction::Right),
            (-1, 0) => Some(Direction::Left),
            _ => None,
        }
    }

    #[inline(always)]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }
}

/// What a tile is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, DeepSizeOf)]
pub enum CellKind {
    #[default]
    Empty,
    Wall,
    Start,
    Goal,
    Crystal,
}

impl CellKind {
    pub const ALL: [CellKind; 5] = [
        CellKind::Empty,
        CellKind::Wall,
        CellKind::Start,
        CellKind::Goal,
        CellKind::Crystal,
    ];

    /// Kind described by a maze file token. Unknown tokens are empty floor.
    /// ```
    /// use grid::CellKind;
    ///
    /// assert_eq!(CellKind::from_token("#"), CellKind::Wall);
    /// assert_eq!(CellKind::from_token("K"), CellKind::Crystal);
    /// assert_eq!(CellKind::from_token("x"), CellKind::Empty);
    /// ```
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "#" => CellKind::Wall,
            "S" => CellKind::Start,
            "G" => CellKind::Goal,
            "C" | "K" => CellKind::Crystal,
            _ => CellKind::Empty,
        }
    }

    #[must_use]
    pub const fn token(self) -> char {
        match self {
            CellKind::Empty => '.',
            CellKind::Wall => '#',
            CellKind::Start => 'S',
            CellKind::Goal => 'G',
            CellKind::Crystal => 'C',
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CellKind::Empty => "empty",
            CellKind::Wall => "wall",
            CellKind::Start => "start",
            CellKind::Goal => "goal",
            CellKind::Crystal => "crystal",
        }
    }
}

impl Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Markers left on a tile
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Marks: u8 {
        /// Expanded by the last search
        const VISITED   = 0b0001;
        /// Part of the last reconstructed path
        const ON_PATH   = 0b0010;
        /// Walked on, or reached by a reflection
        const TRAVERSED = 0b0100;
        /// Traversed only because of a reflection
        const REFLECTED = 0b1000;

        /// Marks owned by the pathfinder
        const TRANSIENT = Self::VISITED.bits() | Self::ON_PATH.bits();
    }
}

impl DeepSizeOf for Marks {
    fn deep_size_of_children(&self, _context: &mut deepsize::Context) -> usize {
        0
    }
}

/// A single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, DeepSizeOf)]
pub struct Cell {
    kind: CellKind,
    marks: Marks,
}

impl Cell {
    #[must_use]
    pub const fn new(kind: CellKind) -> Self {
        Self {
            kind,
            marks: Marks::empty(),
        }
    }

    #[inline(always)]
    #[must_use]
    pub const fn kind(&self) -> CellKind {
        self.kind
    }

    #[inline(always)]
    #[must_use]
    pub const fn marks(&self) -> Marks {
        self.marks
    }

    #[inline(always)]
    #[must_use]
    pub fn is_wall(&self) -> bool {
        self.kind == CellKind::Wall
    }

    #[inline(always)]
    #[must_use]
    pub fn is_visited(&self) -> bool {
        self.marks.contains(Marks::VISITED)
    }

    #[inline(always)]
    #[must_use]
    pub fn is_on_path(&self) -> bool {
        self.marks.contains(Marks::ON_PATH)
    }

    #[inline(always)]
    #[must_use]
    pub fn is_traversed(&self) -> bool {
        self.marks.contains(Marks::TRAVERSED)
    }

    #[inline(always)]
    #[must_use]
    pub fn is_reflected(&self) -> bool {
        self.marks.contains(Marks::REFLECTED)
    }

    /// Change the kind. Walls keep no marks.
    pub fn set_kind(&mut self, kind: CellKind) {
        self.kind = kind;
        if kind == CellKind::Wall {
            self.marks = Marks::empty();
        }
    }

    /// Add marks, returning whether anything changed. Walls cannot be marked.
    ///
    /// ```
    /// use grid::{Cell, CellKind, Marks};
    ///
    /// let mut floor = Cell::new(CellKind::Empty);
    /// assert!(floor.mark(Marks::TRAVERSED));
    /// assert!(!floor.mark(Marks::TRAVERSED));
    ///
    /// let mut wall = Cell::new(CellKind::Wall);
    /// assert!(!wall.mark(Marks::ON_PATH));
    /// assert_eq!(wall.marks(), Marks::empty());
    /// ```
    pub fn mark(&mut self, marks: Marks) -> bool {
        if self.is_wall() || self.marks.contains(marks) {
            return false;
        }
        self.marks |= marks;
        true
    }

    /// Mark as reached by a reflection. Tiles already traversed, however they
    /// got there, are left alone.
    pub fn reflect(&mut self) -> bool {
        if self.is_traversed() {
            return false;
        }
        self.mark(Marks::TRAVERSED | Marks::REFLECTED)
    }

    pub fn unmark(&mut self, marks: Marks) {
        self.marks -= marks;
    }
}

/// Access outside of the grid extents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("position {pos} is outside of the {width}x{height} grid")]
pub struct OutOfBounds {
    pub pos: Position,
    pub width: usize,
    pub height: usize,
}

/// A rectangular grid of tiles, stored row by row
#[derive(Debug, Clone, PartialEq, Eq, Hash, DeepSizeOf)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Box<[Cell]>,
}

impl Grid {
    /// A grid of empty floor
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height].into_boxed_slice(),
        }
    }

    #[inline(always)]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of tiles
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline(always)]
    #[must_use]
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Linear index of a tile
    /// ```
    /// use grid::{Grid, Position};
    ///
    /// let grid = Grid::new(4, 3);
    /// assert_eq!(grid.index(Position::new(1, 2)), Some(9));
    /// assert_eq!(grid.index(Position::new(4, 0)), None);
    /// ```
    #[inline(always)]
    #[must_use]
    pub const fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y * self.width + pos.x)
        } else {
            None
        }
    }

    fn out_of_bounds(&self, pos: Position) -> OutOfBounds {
        OutOfBounds {
            pos,
            width: self.width,
            height: self.height,
        }
    }

    pub fn cell_at(&self, pos: Position) -> Result<Cell, OutOfBounds> {
        self.index(pos)
            .map(|i| self.cells[i])
            .ok_or_else(|| self.out_of_bounds(pos))
    }

    pub fn cell_mut(&mut self, pos: Position) -> Result<&mut Cell, OutOfBounds> {
        match self.index(pos) {
            Some(i) => Ok(&mut self.cells[i]),
            None => Err(self.out_of_bounds(pos)),
        }
    }

    /// In bounds and not a wall
    #[must_use]
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.cell_at(pos).is_ok_and(|c| !c.is_wall())
    }

    pub fn set_kind(&mut self, pos: Position, kind: CellKind) -> Result<(), OutOfBounds> {
        self.cell_mut(pos)?.set_kind(kind);
        Ok(())
    }

    /// Mark a tile as walked on. Returns whether the mark is new.
    pub fn mark_traversed(&mut self, pos: Position) -> Result<bool, OutOfBounds> {
        Ok(self.cell_mut(pos)?.mark(Marks::TRAVERSED))
    }

    /// Mark a tile as reached by a reflection. Returns whether the mark is new.
    pub fn mark_reflected(&mut self, pos: Position) -> Result<bool, OutOfBounds> {
        Ok(self.cell_mut(pos)?.reflect())
    }

    /// Drop the search marks, keeping what was traversed
    pub fn clear_transient_marks(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.unmark(Marks::TRANSIENT)
        }
    }

    /// Drop every mark
    pub fn clear_marks(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.unmark(Marks::all())
        }
    }

    /// All positions, row by row
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Position { x, y }))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.positions().zip(self.cells.iter())
    }

    /// Positions of all the tiles of a kind
    pub fn positions_of(&self, kind: CellKind) -> impl Iterator<Item = Position> + '_ {
        self.iter()
            .filter(move |(_, c)| c.kind == kind)
            .map(|(p, _)| p)
    }

    #[must_use]
    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|c| c.kind == kind).count()
    }

    /// In-bounds orthogonal neighbours, in [`Direction::ALL`] order
    pub fn neighbours(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| pos.step(d))
            .filter(|p| self.contains(*p))
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            for (x, cell) in row.iter().enumerate() {
                if x > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", cell.kind.token())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A grid together with its start and goal tiles
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MazeLayout {
    pub grid: Grid,
    pub start: Position,
    pub goal: Position,
}

#[cfg(test)]
mod tests {
    mod cells {
        use crate::{Cell, CellKind, Marks};

        #[test]
        fn walling_drops_marks() {
            let mut cell = Cell::new(CellKind::Empty);
            cell.mark(Marks::TRAVERSED | Marks::ON_PATH);
            cell.set_kind(CellKind::Wall);
            assert_eq!(cell.marks(), Marks::empty());
        }

        #[test]
        fn reflection_keeps_walked_tiles_unreflected() {
            let mut cell = Cell::new(CellKind::Empty);
            cell.mark(Marks::TRAVERSED);
            assert!(!cell.reflect());
            assert!(!cell.is_reflected());

            let mut fresh = Cell::new(CellKind::Crystal);
            assert!(fresh.reflect());
            assert!(fresh.is_traversed() && fresh.is_reflected());
        }
    }

    mod grid {
        use crate::{CellKind, Grid, Marks, OutOfBounds, Position};

        #[test]
        fn out_of_bounds() {
            let grid = Grid::new(3, 2);
            assert_eq!(
                grid.cell_at(Position::new(3, 0)),
                Err(OutOfBounds {
                    pos: Position::new(3, 0),
                    width: 3,
                    height: 2
                })
            );
            assert!(grid.cell_at(Position::new(2, 1)).is_ok());
            assert!(!grid.is_walkable(Position::new(0, 2)));
        }

        #[test]
        fn walkable() {
            let mut grid = Grid::new(3, 3);
            grid.set_kind(Position::new(1, 1), CellKind::Wall).unwrap();
            grid.set_kind(Position::new(2, 2), CellKind::Crystal).unwrap();
            assert!(!grid.is_walkable(Position::new(1, 1)));
            assert!(grid.is_walkable(Position::new(2, 2)));
            assert!(grid.is_walkable(Position::new(0, 0)));
        }

        #[test]
        fn transient_marks_clear_alone() {
            let mut grid = Grid::new(2, 1);
            let p = Position::new(0, 0);
            grid.cell_mut(p)
                .unwrap()
                .mark(Marks::VISITED | Marks::ON_PATH | Marks::TRAVERSED);
            grid.clear_transient_marks();
            assert_eq!(grid.cell_at(p).unwrap().marks(), Marks::TRAVERSED);
            grid.clear_marks();
            assert_eq!(grid.cell_at(p).unwrap().marks(), Marks::empty());
        }

        #[test]
        fn neighbours_order() {
            let grid = Grid::new(3, 3);
            let n: Vec<_> = grid.neighbours(Position::new(1, 1)).collect();
            assert_eq!(
                n,
                [(1, 2), (1, 0), (2, 1), (0, 1)].map(Position::from).to_vec()
            );
            let corner: Vec<_> = grid.neighbours(Position::new(0, 0)).collect();
            assert_eq!(corner, [(0, 1), (1, 0)].map(Position::from).to_vec());
        }

        #[test]
        fn display() {
            let mut grid = Grid::new(3, 2);
            grid.set_kind(Position::new(0, 0), CellKind::Wall).unwrap();
            grid.set_kind(Position::new(2, 1), CellKind::Crystal).unwrap();
            assert_eq!(grid.to_string(), "# . .\n. . C\n");
        }
    }
}
