use rand::Rng;

use crate::domain::network_model::entanglement_interface::InterfaceGraph;
use crate::domain::network_model::instruction::{StoreWindow, SwapPair};
use crate::domain::network_model::node_pair::EntanglementLedger;
use crate::domain::network_model::time_slot::{NodeContext, TimeSlot};
use crate::domain::utils::id::NodeId;
use crate::error::ScheduleError;

/// Chance that a time slot is edited when the table mutates its slots.
const SLOT_MUTATION_CHANCE: f64 = 0.2;

/// Swap chance of a time slot appended by mutation.
const APPENDED_SLOT_SWAP_CHANCE: f64 = 0.5;

/// The cyclic schedule of one node.
///
/// Every tick runs in two phases: [`InstructionTable::execute_swaps_next_time_slot`] and then
/// [`InstructionTable::execute_stores_next_time_slot`] for the slot under the cursor. Only the
/// store phase advances the cursor. The table is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionTable {
    node: NodeId,
    time_slots: Vec<TimeSlot>,
    next_time_slot: usize,
    swaps_executed: bool,
}

impl InstructionTable {
    /// An empty list is replaced by a single all-Store slot.
    pub fn new(context: &NodeContext, time_slots: Vec<TimeSlot>) -> Self {
        let mut table = Self { node: context.id, time_slots: Vec::new(), next_time_slot: 0, swaps_executed: false };
        table.reset(context, time_slots);
        table
    }

    /// Parses the descriptor form: one list of swap strings per slot.
    pub fn from_swap_strings(context: &NodeContext, time_slots: &[Vec<String>]) -> Result<Self, ScheduleError> {
        let mut parsed = Vec::with_capacity(time_slots.len());

        for (slot, swap_strings) in time_slots.iter().enumerate() {
            if !swap_strings.is_empty() && context.interface_count < 2 {
                return Err(ScheduleError::SwapWithoutInterfaces { node: context.name.clone() });
            }

            let swap_pairs = swap_strings
                .iter()
                .map(|value| {
                    SwapPair::parse(context.id, value).ok_or_else(|| ScheduleError::MalformedSwap {
                        node: context.name.clone(),
                        slot,
                        value: value.clone(),
                    })
                })
                .collect::<Result<Vec<SwapPair>, ScheduleError>>()?;

            let time_slot = TimeSlot::new(context, &swap_pairs).map_err(|e| ScheduleError::InvalidTimeSlot {
                node: context.name.clone(),
                slot,
                source: Box::new(e),
            })?;

            parsed.push(time_slot);
        }

        if parsed.is_empty() {
            log::warn!("Node {} has no time slots, using a single all-Store slot.", context.name);
        }

        Ok(Self::new(context, parsed))
    }

    /// Replaces the schedule and rewinds the cursor.
    pub fn reset(&mut self, context: &NodeContext, time_slots: Vec<TimeSlot>) {
        self.time_slots = time_slots;
        if self.time_slots.is_empty() {
            self.time_slots.push(TimeSlot::empty(context));
        }
        self.rewind();
    }

    pub fn rewind(&mut self) {
        self.next_time_slot = 0;
        self.swaps_executed = false;
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.time_slots
    }

    pub fn len(&self) -> usize {
        self.time_slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_slots.is_empty()
    }

    pub fn next_time_slot(&self) -> usize {
        self.next_time_slot
    }

    pub fn swaps_executed(&self) -> bool {
        self.swaps_executed
    }

    pub fn to_swap_strings(&self) -> Vec<Vec<String>> {
        self.time_slots.iter().map(TimeSlot::to_swap_strings).collect()
    }

    /// Swap phase of the slot under the cursor. Repeated calls before the store phase do nothing.
    pub fn execute_swaps_next_time_slot(&mut self, graph: &mut InterfaceGraph, swap_probability: f64) {
        if self.swaps_executed {
            return;
        }

        self.time_slots[self.next_time_slot].execute_swaps(graph, swap_probability);
        self.swaps_executed = true;
    }

    /// Store phase of the slot under the cursor, then advances the cursor cyclically.
    ///
    /// # Panics
    /// If the swap phase of the same slot has not run. That is a defect of the tick driver.
    pub fn execute_stores_next_time_slot(&mut self, graph: &InterfaceGraph, ledger: &mut EntanglementLedger, window: &StoreWindow) {
        if !self.swaps_executed {
            panic!(
                "Stores of time slot {} on node {} requested before its swaps were executed.",
                self.next_time_slot, self.node
            );
        }

        self.time_slots[self.next_time_slot].execute_stores(graph, ledger, window);

        self.next_time_slot += 1;
        if self.next_time_slot >= self.time_slots.len() {
            self.next_time_slot = 0;
        }
        self.swaps_executed = false;
    }

    /// Below 0.4 each slot mutates with probability 0.2, below 0.7 a random slot is appended,
    /// otherwise a random slot is removed. Removing the last slot leaves an all-Store slot.
    pub fn mutate<R: Rng + ?Sized>(&mut self, context: &NodeContext, rng: &mut R) {
        let action: f64 = rng.random();

        if action < 0.4 {
            for time_slot in self.time_slots.iter_mut() {
                if rng.random::<f64>() < SLOT_MUTATION_CHANCE {
                    time_slot.mutate(rng);
                }
            }
        } else if action < 0.7 {
            self.time_slots.push(TimeSlot::random(context, APPENDED_SLOT_SWAP_CHANCE, rng));
        } else if self.time_slots.len() == 1 {
            self.time_slots[0] = TimeSlot::empty(context);
        } else {
            let index = rng.random_range(0..self.time_slots.len());
            self.remove_time_slot(index);
        }
    }

    /// The cursor keeps pointing at the same upcoming slot, or wraps if that slot was removed last.
    fn remove_time_slot(&mut self, index: usize) {
        self.time_slots.remove(index);

        if index < self.next_time_slot {
            self.next_time_slot -= 1;
        } else if self.next_time_slot >= self.time_slots.len() {
            self.next_time_slot = 0;
        }
    }
}
