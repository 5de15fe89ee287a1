//! Shortest routes over the grid, and a cache of them.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, VecDeque},
};

use grid::{CellKind, Grid, Marks, OutOfBounds, Position};
use thiserror::Error;

/// Price of entering a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StepCost {
    #[default]
    Uniform,
    CrystalWeighted {
        crystal: u32,
    },
}

impl StepCost {
    /// Cost of stepping onto a tile of the given kind
    /// ```
    /// use escape::StepCost;
    /// use grid::CellKind;
    ///
    /// let weighted = StepCost::CrystalWeighted { crystal: 3 };
    /// assert_eq!(weighted.of(CellKind::Crystal), 3);
    /// assert_eq!(weighted.of(CellKind::Goal), 1);
    /// assert_eq!(StepCost::Uniform.of(CellKind::Crystal), 1);
    /// ```
    #[inline(always)]
    #[must_use]
    pub const fn of(self, kind: CellKind) -> u32 {
        match (self, kind) {
            (StepCost::CrystalWeighted { crystal }, CellKind::Crystal) => crystal,
            _ => 1,
        }
    }
}

/// A route, both ends included
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    positions: Box<[Position]>,
    cost: u32,
}

impl Path {
    /// Number of positions, one more than the number of moves
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
    #[must_use]
    pub fn first(&self) -> Option<Position> {
        self.positions.first().copied()
    }
    #[must_use]
    pub fn last(&self) -> Option<Position> {
        self.positions.last().copied()
    }
    /// Total price of the moves
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }
    /// Whether the layout changed under this path
    #[must_use]
    pub fn contains_wall(&self, grid: &Grid) -> bool {
        self.positions.iter().any(|p| !grid.is_walkable(*p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("no route from {start} to {goal}")]
    NotFound { start: Position, goal: Position },
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
}

/// Find the cheapest route from `start` to `goal`.
///
/// Search marks are cleared first. Every expanded tile is left `VISITED` and
/// the tiles of the returned path `ON_PATH`.
pub fn solve(
    grid: &mut Grid,
    start: Position,
    goal: Position,
    cost: StepCost,
) -> Result<Path, SolveError> {
    grid.cell_at(start)?;
    grid.cell_at(goal)?;
    grid.clear_transient_marks();
    let not_found = SolveError::NotFound { start, goal };
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return Err(not_found);
    }

    let parents = match cost {
        StepCost::Uniform => breadth_first(grid, start, goal),
        StepCost::CrystalWeighted { .. } => uniform_cost(grid, start, goal, cost),
    }
    .ok_or(not_found)?;

    let width = grid.width();
    let mut positions = vec![goal];
    let mut current = goal;
    while current != start {
        current = parents[current.y * width + current.x]
            .expect("Every reached tile but the start has a parent");
        positions.push(current);
    }
    positions.reverse();
    let total = positions[1..]
        .iter()
        .map(|p| grid.cell_at(*p).map(|c| cost.of(c.kind())))
        .sum::<Result<u32, _>>()?;
    mark_path(grid, &positions);

    log::debug!(
        "Solved {start} -> {goal}: {} moves, cost {total}",
        positions.len() - 1
    );
    Ok(Path {
        positions: positions.into_boxed_slice(),
        cost: total,
    })
}

fn mark_path(grid: &mut Grid, positions: &[Position]) {
    for pos in positions {
        if let Ok(cell) = grid.cell_mut(*pos) {
            cell.mark(Marks::ON_PATH);
        }
    }
}

fn visit(grid: &mut Grid, pos: Position) {
    if let Ok(cell) = grid.cell_mut(pos) {
        cell.mark(Marks::VISITED);
    }
}

/// Parent links of a breadth first search, or `None` if `goal` is unreachable
fn breadth_first(
    grid: &mut Grid,
    start: Position,
    goal: Position,
) -> Option<Vec<Option<Position>>> {
    let width = grid.width();
    let idx = |p: Position| p.y * width + p.x;
    let mut parents = vec![None; grid.len()];
    let mut seen = vec![false; grid.len()];
    let mut queue = VecDeque::from([start]);
    seen[idx(start)] = true;

    while let Some(pos) = queue.pop_front() {
        visit(grid, pos);
        if pos == goal {
            return Some(parents);
        }
        for next in grid.neighbours(pos) {
            if !seen[idx(next)] && grid.is_walkable(next) {
                seen[idx(next)] = true;
                parents[idx(next)] = Some(pos);
                queue.push_back(next);
            }
        }
    }
    None
}

/// Parent links of a Dijkstra search. Ties are broken by insertion order.
fn uniform_cost(
    grid: &mut Grid,
    start: Position,
    goal: Position,
    cost: StepCost,
) -> Option<Vec<Option<Position>>> {
    let width = grid.width();
    let idx = |p: Position| p.y * width + p.x;
    let mut parents = vec![None; grid.len()];
    let mut dist = vec![u32::MAX; grid.len()];
    let mut settled = vec![false; grid.len()];
    let mut heap = BinaryHeap::new();
    let mut seq: u64 = 0;
    dist[idx(start)] = 0;
    heap.push(Reverse((0u32, seq, start)));

    while let Some(Reverse((d, _, pos))) = heap.pop() {
        if settled[idx(pos)] {
            continue;
        }
        settled[idx(pos)] = true;
        visit(grid, pos);
        if pos == goal {
            return Some(parents);
        }
        for next in grid.neighbours(pos) {
            let Ok(cell) = grid.cell_at(next) else {
                continue;
            };
            if cell.is_wall() || settled[idx(next)] {
                continue;
            }
            let nd = d.saturating_add(cost.of(cell.kind()));
            if nd < dist[idx(next)] {
                dist[idx(next)] = nd;
                parents[idx(next)] = Some(pos);
                seq += 1;
                heap.push(Reverse((nd, seq, next)));
            }
        }
    }
    None
}

/// Memo of solved routes, keyed on both ends and the layout generation.
///
/// A cache serves a single [`StepCost`].
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    generation: u64,
    entries: HashMap<(Position, Position, u64), Path>,
    hits: u64,
    misses: u64,
}

impl PathCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached route if still valid, otherwise a fresh [`solve`]
    pub fn get_or_solve(
        &mut self,
        grid: &mut Grid,
        start: Position,
        goal: Position,
        generation: u64,
        cost: StepCost,
    ) -> Result<Path, SolveError> {
        if generation != self.generation {
            let before = self.entries.len();
            self.entries.retain(|(_, _, g), _| *g >= generation);
            log::debug!(
                "Generation {} -> {generation}: dropped {} cached paths",
                self.generation,
                before - self.entries.len()
            );
            self.generation = generation;
        }

        let key = (start, goal, generation);
        if let Some(path) = self.entries.get(&key).cloned() {
            if !path.contains_wall(grid) {
                self.hits += 1;
                log::debug!("Path cache hit {start} -> {goal} ({} hits)", self.hits);
                grid.clear_transient_marks();
                mark_path(grid, path.positions());
                return Ok(path);
            }
            log::debug!("Cached path {start} -> {goal} runs into a wall, evicting");
            self.entries.remove(&key);
        }

        self.misses += 1;
        let path = solve(grid, start, goal, cost)?;
        // only the latest route towards each goal is kept
        self.entries.retain(|(_, g, _), _| *g != goal);
        self.entries.insert(key, path.clone());
        Ok(path)
    }

    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = 0;
        self.hits = 0;
        self.misses = 0;
    }
}
