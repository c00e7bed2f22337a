use serde::{Deserialize, Serialize};

use crate::domain::network_model::node_pair::LambdaCfg;

/// Fixed physical constants of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock length of one tick in nanoseconds.
    pub time_slot_duration_ns: u32,

    /// Divisor applied to every Store contribution.
    pub store_normalization: f64,

    /// Scoring distribution parameters, currently shared by every node pair.
    pub lambda: LambdaCfg,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { time_slot_duration_ns: 1_000_000, store_normalization: 2e9, lambda: LambdaCfg::default() }
    }
}

/// Protocol used to turn a schedule into one fitness value.
///
/// Each trial advances the network by `base_time_slots + U[0, extra_time_slots]` ticks,
/// reads the score and resets the accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub trials: usize,
    pub base_time_slots: usize,
    pub extra_time_slots: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { trials: 20, base_time_slots: 1000, extra_time_slots: 500 }
    }
}

/// Configuration of the genome operators handed to the search harness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenomeConfig {
    pub simulation: SimulationConfig,
    pub evaluation: EvaluationConfig,

    /// Upper bound of time slots per node in a freshly initialised schedule.
    pub initial_max_time_slots: usize,

    /// Chance that a drawn interface is paired into a Swap when a schedule is initialised.
    pub initial_swap_chance: f64,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            evaluation: EvaluationConfig::default(),
            initial_max_time_slots: 9,
            initial_swap_chance: 0.7,
        }
    }
}
