use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::network_model::node::{DEFAULT_ENTANGLEMENT_FIDELITY_CAPACITY, DEFAULT_EXPECTED_SWAPS_PER_NANOSECOND};

/// Topology and genome descriptor.
///
/// The same document describes a bare topology (nodes, interface counts, physical
/// parameters, fibre links) and a full genome (additionally the per-node time slots).
/// Maps are ordered by key, so serialising a network always yields the same text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NetworkDto {
    pub nodes: BTreeMap<String, NodeDto>,

    /// Keyed by `"<nodeA>-<nodeB>"`, each physical link appears once.
    #[serde(default)]
    pub links: BTreeMap<String, LinkDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeDto {
    pub entanglement_interfaces: usize,
    pub swap_probability: f64,

    /// One array of swap strings (`"<i>-<j>"`) per time slot. Interfaces not mentioned
    /// in a slot store during that slot.
    #[serde(default)]
    pub time_slots: Vec<Vec<String>>,

    #[serde(default = "default_fidelity_capacity", skip_serializing_if = "is_default_fidelity_capacity")]
    pub entanglement_fidelity_capacity: f64,

    #[serde(default = "default_expected_swaps", skip_serializing_if = "is_default_expected_swaps")]
    pub expected_swaps_per_nanosecond: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinkDto {
    /// `"<iA>-<iB>"`, interface of the first and second node of the link key.
    pub interfaces: String,
}

fn default_fidelity_capacity() -> f64 {
    DEFAULT_ENTANGLEMENT_FIDELITY_CAPACITY
}

fn is_default_fidelity_capacity(value: &f64) -> bool {
    *value == DEFAULT_ENTANGLEMENT_FIDELITY_CAPACITY
}

fn default_expected_swaps() -> u32 {
    DEFAULT_EXPECTED_SWAPS_PER_NANOSECOND
}

fn is_default_expected_swaps(value: &u32) -> bool {
    *value == DEFAULT_EXPECTED_SWAPS_PER_NANOSECOND
}

impl NodeDto {
    /// Node description without any schedule.
    pub fn new(entanglement_interfaces: usize, swap_probability: f64) -> Self {
        Self {
            entanglement_interfaces,
            swap_probability,
            time_slots: Vec::new(),
            entanglement_fidelity_capacity: DEFAULT_ENTANGLEMENT_FIDELITY_CAPACITY,
            expected_swaps_per_nanosecond: DEFAULT_EXPECTED_SWAPS_PER_NANOSECOND,
        }
    }
}
