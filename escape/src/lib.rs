//! Simulation core of "Escape the Grid".
//!
//! A [`GameSession`] owns a maze loaded by the [`grid`] crate and plays it
//! turn by turn: moves walk the player and trigger [crystal reflections](reflection),
//! the [`MutationScheduler`] flips walls and relocates the goal, and auto-play
//! follows routes from the [`pathfinder`], replanning whenever they go stale.

pub mod config;
pub use config::{Config, CostModel};

pub mod pathfinder;
pub use pathfinder::{solve, Path, PathCache, SolveError, StepCost};

pub mod reflection;
pub use reflection::{reflect, Reflection};

pub mod scheduler;
pub use scheduler::{MutationScheduler, Mutations};

pub mod session;
pub use session::{AutoSolve, GameSession, InvalidMove, MoveOutcome, SessionState, Step, Turn};
