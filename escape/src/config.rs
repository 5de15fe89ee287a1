use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::pathfinder::StepCost;

/// How steps are priced by the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CostModel {
    /// Every step costs one, shortest path by number of moves
    #[default]
    Uniform,
    /// Entering a crystal costs `crystal_cost`
    CrystalWeighted,
}

/// Config for a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Seed of the mutation scheduler
    pub seed: u64,
    /// Accepted moves between two wall flips, 0 disables them
    pub turns_per_event: u32,
    /// Accepted moves between two goal relocations, 0 disables them
    pub turns_to_move_goal: u32,
    /// Pricing of the solver steps
    pub cost_model: CostModel,
    /// Cost of entering a crystal under [`CostModel::CrystalWeighted`]
    pub crystal_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0,
            turns_per_event: 5,
            turns_to_move_goal: 10,
            cost_model: CostModel::Uniform,
            crystal_cost: 3,
        }
    }
}

impl Config {
    #[must_use]
    pub fn step_cost(&self) -> StepCost {
        match self.cost_model {
            CostModel::Uniform => StepCost::Uniform,
            CostModel::CrystalWeighted => StepCost::CrystalWeighted {
                crystal: self.crystal_cost,
            },
        }
    }
}

/// Partial config for a game session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Parser, Default)]
pub struct PartialConfig {
    /// Seed of the mutation scheduler
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Accepted moves between two wall flips, 0 disables them
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns_per_event: Option<u32>,
    /// Accepted moves between two goal relocations, 0 disables them
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns_to_move_goal: Option<u32>,
    /// Pricing of the solver steps
    #[clap(long, value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_model: Option<CostModel>,
    /// Cost of entering a crystal under the crystal-weighted model
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crystal_cost: Option<u32>,
}
impl PartialConfig {
    /// Layer `other` over `self`
    pub fn merge(self, other: PartialConfig) -> Self {
        Self {
            seed: other.seed.or(self.seed),
            turns_per_event: other.turns_per_event.or(self.turns_per_event),
            turns_to_move_goal: other.turns_to_move_goal.or(self.turns_to_move_goal),
            cost_model: other.cost_model.or(self.cost_model),
            crystal_cost: other.crystal_cost.or(self.crystal_cost),
        }
    }
    pub fn or_defaults(self) -> Config {
        let default = Config::default();
        Config {
            seed: self.seed.unwrap_or(default.seed),
            turns_per_event: self.turns_per_event.unwrap_or(default.turns_per_event),
            turns_to_move_goal: self
                .turns_to_move_goal
                .unwrap_or(default.turns_to_move_goal),
            cost_model: self.cost_model.unwrap_or(default.cost_model),
            crystal_cost: self.crystal_cost.unwrap_or(default.crystal_cost),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{CostModel, PartialConfig};
    use crate::pathfinder::StepCost;
    use crate::Config;

    #[test]
    fn defaults() {
        assert_eq!(PartialConfig::default().or_defaults(), Config::default());
        assert_eq!(Config::default().step_cost(), StepCost::Uniform);
    }

    #[test]
    fn right_side_wins() {
        let file = PartialConfig {
            seed: Some(7),
            turns_per_event: Some(3),
            ..Default::default()
        };
        let flags = PartialConfig {
            seed: Some(42),
            cost_model: Some(CostModel::CrystalWeighted),
            ..Default::default()
        };
        let config = file.merge(flags).or_defaults();
        assert_eq!(config.seed, 42);
        assert_eq!(config.turns_per_event, 3);
        assert_eq!(config.turns_to_move_goal, 10);
        assert_eq!(config.step_cost(), StepCost::CrystalWeighted { crystal: 3 });
    }
}
