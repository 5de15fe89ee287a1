//! A single game: the player, the goal, turns and auto-play.

use grid::{
    Cell, CellKind, Direction, Grid, LoadedMaze, MazeLayout, MazeSource, OutOfBounds, Position,
};
use thiserror::Error;

use crate::{
    pathfinder::{Path, PathCache, SolveError},
    reflection::{reflect, Reflection},
    scheduler::{MutationScheduler, Mutations},
    Config,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Loaded, waiting for a start
    #[default]
    Idle,
    Active,
    /// The goal was reached
    Complete,
}

/// Why a move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidMove {
    #[error("the session is not active")]
    NotActive,
    #[error("moves are single orthogonal steps")]
    NotAdjacent,
    #[error("the move leaves the grid")]
    OutOfBounds,
    #[error("{0} is a wall")]
    Wall(Position),
}

/// Everything an accepted move caused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub from: Position,
    pub to: Position,
    /// Set when `to` is a crystal
    pub reflection: Option<Reflection>,
    pub mutations: Mutations,
    pub reached_goal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted(Turn),
    Rejected(InvalidMove),
}

impl MoveOutcome {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSolve {
    Started { steps: usize },
    NoPathFound,
    AlreadyComplete,
}

/// Result of advancing the session clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to play
    Idle,
    Moved { turn: Turn, replanned: bool },
    /// Auto-play stopped, the goal cannot be reached from here
    Halted(SolveError),
}

/// The route auto-play is following
#[derive(Debug, Clone)]
struct Plan {
    path: Path,
    /// Index of the player inside `path`
    cursor: usize,
    goal: Position,
    generation: u64,
}

impl Plan {
    fn next(&self) -> Option<Position> {
        self.path.positions().get(self.cursor + 1).copied()
    }
}

/// Owner of all the game state
#[derive(Debug, Clone)]
pub struct GameSession {
    config: Config,
    /// The maze as loaded, restored on reset
    layout: MazeLayout,
    source: MazeSource,
    grid: Grid,
    player: Position,
    goal: Position,
    state: SessionState,
    scheduler: MutationScheduler,
    cache: PathCache,
    plan: Option<Plan>,
    elapsed: f64,
}

impl GameSession {
    pub fn new(layout: MazeLayout, config: Config) -> Self {
        Self::from_loaded(LoadedMaze::from(layout), config)
    }

    pub fn from_loaded(LoadedMaze { layout, source }: LoadedMaze, config: Config) -> Self {
        let mut session = Self {
            config,
            grid: layout.grid.clone(),
            player: layout.start,
            goal: layout.goal,
            layout,
            source,
            state: SessionState::Idle,
            scheduler: MutationScheduler::new(&config),
            cache: PathCache::new(),
            plan: None,
            elapsed: 0.,
        };
        session.restore();
        session
    }

    fn restore(&mut self) {
        self.grid = self.layout.grid.clone();
        self.grid.clear_marks();
        self.player = self.layout.start;
        self.goal = self.layout.goal;
        if let Err(err) = self.grid.mark_traversed(self.player) {
            log::warn!("Start tile cannot be marked: {err}");
        }
        self.state = SessionState::Idle;
        self.scheduler.reset();
        self.cache.clear();
        self.plan = None;
        self.elapsed = 0.;
    }

    /// Idle -> Active
    pub fn start(&mut self) {
        if self.state == SessionState::Idle {
            log::info!("Session started at {}", self.player);
            self.state = SessionState::Active;
        }
    }

    /// Back to the maze as loaded, in the idle state
    pub fn reset(&mut self) {
        log::info!("Session reset");
        self.restore();
    }

    /// Move the player by one orthogonal step
    pub fn try_move(&mut self, dx: isize, dy: isize) -> MoveOutcome {
        match self.check_move(dx, dy) {
            Ok(to) => {
                if self.plan.take().is_some() {
                    log::info!("Auto-play interrupted by a manual move");
                }
                MoveOutcome::Accepted(self.apply_move(to))
            }
            Err(reason) => {
                log::debug!("Move ({dx}, {dy}) from {} rejected: {reason}", self.player);
                MoveOutcome::Rejected(reason)
            }
        }
    }

    /// Move the player onto a neighbouring tile
    pub fn try_move_to(&mut self, target: Position) -> MoveOutcome {
        if self.state != SessionState::Active {
            return MoveOutcome::Rejected(InvalidMove::NotActive);
        }
        match Direction::ALL
            .into_iter()
            .find(|d| self.player.step(*d) == Some(target))
        {
            Some(dir) => {
                let (dx, dy) = dir.offset();
                self.try_move(dx, dy)
            }
            None => MoveOutcome::Rejected(InvalidMove::NotAdjacent),
        }
    }

    fn check_move(&self, dx: isize, dy: isize) -> Result<Position, InvalidMove> {
        if self.state != SessionState::Active {
            return Err(InvalidMove::NotActive);
        }
        if dx.unsigned_abs() + dy.unsigned_abs() != 1 {
            return Err(InvalidMove::NotAdjacent);
        }
        let to = self
            .player
            .offset(dx, dy)
            .filter(|p| self.grid.contains(*p))
            .ok_or(InvalidMove::OutOfBounds)?;
        if !self.grid.is_walkable(to) {
            return Err(InvalidMove::Wall(to));
        }
        Ok(to)
    }

    /// Walk onto an already validated tile
    fn apply_move(&mut self, to: Position) -> Turn {
        let from = self.player;
        self.player = to;
        if let Err(err) = self.grid.mark_traversed(to) {
            log::warn!("{err}");
        }
        let reflection = match self.grid.cell_at(to).map(|c| c.kind()) {
            Ok(CellKind::Crystal) => reflect(&mut self.grid, to).ok(),
            _ => None,
        };
        self.scheduler.tick();

        let reached_goal = to == self.goal;
        let mutations = if reached_goal {
            log::info!(
                "Goal {} reached in {} moves",
                self.goal,
                self.scheduler.turn_count()
            );
            self.state = SessionState::Complete;
            self.plan = None;
            Mutations::default()
        } else {
            self.scheduler
                .mutate(&mut self.grid, self.player, &mut self.goal)
        };

        Turn {
            from,
            to,
            reflection,
            mutations,
            reached_goal,
        }
    }

    /// Plan a route from the player to the goal and start following it
    pub fn request_auto_solve(&mut self) -> AutoSolve {
        if self.state == SessionState::Complete {
            return AutoSolve::AlreadyComplete;
        }
        self.start();
        match self.replan() {
            Ok(steps) => {
                log::info!("Auto-play started, {steps} steps to go");
                AutoSolve::Started { steps }
            }
            Err(err) => {
                log::warn!("Auto-play not started: {err}");
                AutoSolve::NoPathFound
            }
        }
    }

    /// Replace the plan with a fresh route, returning its number of moves
    fn replan(&mut self) -> Result<usize, SolveError> {
        self.plan = None;
        let generation = self.scheduler.generation();
        let path = self.cache.get_or_solve(
            &mut self.grid,
            self.player,
            self.goal,
            generation,
            self.config.step_cost(),
        )?;
        let steps = path.len().saturating_sub(1);
        self.plan = Some(Plan {
            path,
            cursor: 0,
            goal: self.goal,
            generation,
        });
        Ok(steps)
    }

    fn plan_is_stale(&self, plan: &Plan) -> bool {
        plan.generation != self.scheduler.generation()
            || plan.goal != self.goal
            || plan.path.positions().get(plan.cursor) != Some(&self.player)
            || plan.next().map_or(true, |next| !self.grid.is_walkable(next))
    }

    /// Advance the clock by `dt` seconds, playing one auto-play move if one
    /// is pending
    pub fn step(&mut self, dt: f64) -> Step {
        self.elapsed += dt.max(0.);
        if self.state != SessionState::Active {
            return Step::Idle;
        }
        let Some(plan) = &self.plan else {
            return Step::Idle;
        };

        let replanned = self.plan_is_stale(plan);
        if replanned {
            log::debug!("Plan is stale, replanning from {}", self.player);
            if let Err(err) = self.replan() {
                log::warn!("Auto-play halted: {err}");
                return Step::Halted(err);
            }
        }

        let Some(plan) = self.plan.as_mut() else {
            return Step::Idle;
        };
        let Some(next) = plan.next() else {
            self.plan = None;
            return Step::Idle;
        };
        plan.cursor += 1;
        let turn = self.apply_move(next);
        Step::Moved { turn, replanned }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }
    #[must_use]
    pub const fn player_position(&self) -> Position {
        self.player
    }
    #[must_use]
    pub const fn goal_position(&self) -> Position {
        self.goal
    }
    /// Accepted moves since the last reset
    #[must_use]
    pub const fn move_count(&self) -> u32 {
        self.scheduler.turn_count()
    }
    #[must_use]
    pub const fn turns_since_goal_move(&self) -> u32 {
        self.scheduler.turns_since_goal_move()
    }
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.scheduler.generation()
    }
    #[must_use]
    pub fn is_auto_playing(&self) -> bool {
        self.state == SessionState::Active && self.plan.is_some()
    }
    #[must_use]
    pub fn planned_path(&self) -> Option<&Path> {
        self.plan.as_ref().map(|p| &p.path)
    }
    pub fn cell_snapshot(&self, pos: Position) -> Result<Cell, OutOfBounds> {
        self.grid.cell_at(pos)
    }
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }
    /// Seconds accumulated by [`step`](Self::step)
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }
    #[must_use]
    pub const fn source(&self) -> &MazeSource {
        &self.source
    }
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
    /// The path cache, for its statistics
    #[must_use]
    pub const fn cache(&self) -> &PathCache {
        &self.cache
    }
}
