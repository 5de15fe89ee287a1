//! Turn counted mutations of the maze: wall flips and goal relocations.

use grid::{CellKind, Grid, Position};
use rand::{seq::SliceRandom, SeedableRng};
use rand_wyrand::WyRand;

use crate::Config;

/// What a turn changed in the maze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mutations {
    /// A tile flipped between wall and floor, with its new kind
    pub flipped: Option<(Position, CellKind)>,
    /// Old and new goal
    pub goal_moved: Option<(Position, Position)>,
}

impl Mutations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flipped.is_none() && self.goal_moved.is_none()
    }
}

/// Owner of the turn counters, the mutation randomness and the layout
/// generation
#[derive(Debug, Clone)]
pub struct MutationScheduler {
    rng: WyRand,
    seed: u64,
    turns_per_event: u32,
    turns_to_move_goal: u32,
    turn_count: u32,
    turns_since_goal_move: u32,
    generation: u64,
}

impl MutationScheduler {
    pub fn new(config: &Config) -> Self {
        Self {
            rng: WyRand::seed_from_u64(config.seed),
            seed: config.seed,
            turns_per_event: config.turns_per_event,
            turns_to_move_goal: config.turns_to_move_goal,
            turn_count: 0,
            turns_since_goal_move: 0,
            generation: 0,
        }
    }

    /// Back to turn zero, with the randomness replayed from the seed
    pub fn reset(&mut self) {
        self.rng = WyRand::seed_from_u64(self.seed);
        self.turn_count = 0;
        self.turns_since_goal_move = 0;
        self.generation = 0;
    }

    /// Count an accepted move
    pub fn tick(&mut self) {
        self.turn_count += 1;
        self.turns_since_goal_move += 1;
    }

    #[must_use]
    pub const fn turn_count(&self) -> u32 {
        self.turn_count
    }
    #[must_use]
    pub const fn turns_since_goal_move(&self) -> u32 {
        self.turns_since_goal_move
    }
    /// Number of wall flips so far
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply the policies that are due after the last [`tick`](Self::tick).
    ///
    /// The goal moves first, onto a tile that was floor before this turn. The
    /// tile under the player never changes, and `goal` is kept in step with the
    /// `Goal` tile.
    pub fn mutate(
        &mut self,
        grid: &mut Grid,
        player: Position,
        goal: &mut Position,
    ) -> Mutations {
        let mut mutations = Mutations::default();

        if self.turns_to_move_goal > 0 && self.turns_since_goal_move >= self.turns_to_move_goal {
            self.turns_since_goal_move = 0;
            if let Some(to) = self.relocate_goal(grid, player, *goal) {
                mutations.goal_moved = Some((*goal, to));
                *goal = to;
            }
        }

        if self.turns_per_event > 0 && self.turn_count % self.turns_per_event == 0 {
            mutations.flipped = self.flip(grid, player);
        }

        mutations
    }

    fn flip(&mut self, grid: &mut Grid, player: Position) -> Option<(Position, CellKind)> {
        let candidates: Vec<Position> = grid
            .iter()
            .filter(|(p, c)| {
                *p != player && matches!(c.kind(), CellKind::Empty | CellKind::Wall)
            })
            .map(|(p, _)| p)
            .collect();
        let Some(&pos) = candidates.choose(&mut self.rng) else {
            log::info!("Map event skipped: no tile can flip");
            return None;
        };
        let kind = match grid.cell_at(pos).ok()?.kind() {
            CellKind::Wall => CellKind::Empty,
            _ => CellKind::Wall,
        };
        grid.set_kind(pos, kind).ok()?;
        self.generation += 1;
        log::info!(
            "Map event: {pos} is now {kind} (generation {})",
            self.generation
        );
        Some((pos, kind))
    }

    fn relocate_goal(
        &mut self,
        grid: &mut Grid,
        player: Position,
        goal: Position,
    ) -> Option<Position> {
        let candidates: Vec<Position> = grid
            .positions_of(CellKind::Empty)
            .filter(|p| *p != player)
            .collect();
        let Some(&to) = candidates.choose(&mut self.rng) else {
            log::info!("Goal stays at {goal}: no free tile");
            return None;
        };
        grid.set_kind(goal, CellKind::Empty).ok()?;
        grid.set_kind(to, CellKind::Goal).ok()?;
        log::info!("Goal moved from {goal} to {to}");
        Some(to)
    }
}

#[cfg(test)]
mod tests {
    mod flips {
        use grid::{default_maze, CellKind, Grid, Position};

        use crate::{scheduler::MutationScheduler, Config};

        fn scheduler(turns_per_event: u32) -> MutationScheduler {
            MutationScheduler::new(&Config {
                seed: 17,
                turns_per_event,
                turns_to_move_goal: 0,
                ..Default::default()
            })
        }

        #[test]
        fn one_flip_per_period() {
            let mut maze = default_maze();
            let mut sched = scheduler(5);
            let (player, mut goal) = (maze.start, maze.goal);
            let before = maze.grid.clone();
            let mut flips = 0;
            for turn in 1..=5 {
                sched.tick();
                let m = sched.mutate(&mut maze.grid, player, &mut goal);
                assert_eq!(m.flipped.is_some(), turn == 5);
                flips += usize::from(m.flipped.is_some());
            }
            assert_eq!(flips, 1);
            assert_eq!(sched.generation(), 1);
            let changed = maze
                .grid
                .iter()
                .filter(|(p, c)| before.cell_at(*p).unwrap().kind() != c.kind())
                .count();
            assert_eq!(changed, 1);
        }

        #[test]
        fn special_tiles_never_flip() {
            let mut maze = default_maze();
            let mut sched = scheduler(1);
            let (player, mut goal) = (maze.start, maze.goal);
            for _ in 0..200 {
                sched.tick();
                let m = sched.mutate(&mut maze.grid, player, &mut goal);
                let (pos, _) = m.flipped.unwrap();
                assert_ne!(pos, player);
            }
            assert_eq!(maze.grid.count(CellKind::Crystal), 2);
            assert_eq!(maze.grid.count(CellKind::Start), 1);
            assert_eq!(maze.grid.count(CellKind::Goal), 1);
        }

        #[test]
        fn nothing_to_flip() {
            let mut grid = Grid::new(2, 1);
            grid.set_kind(Position::new(1, 0), CellKind::Goal).unwrap();
            let mut sched = scheduler(1);
            let mut goal = Position::new(1, 0);
            sched.tick();
            let m = sched.mutate(&mut grid, Position::new(0, 0), &mut goal);
            assert!(m.is_empty());
            assert_eq!(sched.generation(), 0);
        }

        #[test]
        fn seeded() {
            let run = || {
                let mut maze = default_maze();
                let mut sched = scheduler(1);
                let mut goal = maze.goal;
                (0..20)
                    .map(|_| {
                        sched.tick();
                        sched.mutate(&mut maze.grid, maze.start, &mut goal)
                    })
                    .collect::<Vec<_>>()
            };
            assert_eq!(run(), run());
        }

        #[test]
        fn reset_replays() {
            let mut maze = default_maze();
            let mut sched = scheduler(1);
            let mut goal = maze.goal;
            sched.tick();
            let first = sched.mutate(&mut maze.grid.clone(), maze.start, &mut goal);
            sched.reset();
            assert_eq!((sched.turn_count(), sched.generation()), (0, 0));
            sched.tick();
            let replay = sched.mutate(&mut maze.grid, maze.start, &mut goal);
            assert_eq!(first, replay);
        }
    }

    mod goal {
        use grid::{default_maze, CellKind};

        use crate::{scheduler::MutationScheduler, Config};

        #[test]
        fn relocates_on_period() {
            let mut maze = default_maze();
            let mut sched = MutationScheduler::new(&Config {
                seed: 3,
                turns_per_event: 0,
                turns_to_move_goal: 10,
                ..Default::default()
            });
            let old = maze.goal;
            let mut goal = maze.goal;
            let before = maze.grid.clone();
            for turn in 1..=10 {
                sched.tick();
                let m = sched.mutate(&mut maze.grid, maze.start, &mut goal);
                assert_eq!(m.goal_moved.is_some(), turn == 10);
            }
            assert_ne!(goal, old);
            assert_eq!(before.cell_at(goal).unwrap().kind(), CellKind::Empty);
            assert_eq!(maze.grid.cell_at(goal).unwrap().kind(), CellKind::Goal);
            assert_eq!(maze.grid.cell_at(old).unwrap().kind(), CellKind::Empty);
            assert_eq!(maze.grid.count(CellKind::Goal), 1);
            assert_eq!(sched.turns_since_goal_move(), 0);
            assert_eq!(sched.turn_count(), 10);
        }
    }
}
