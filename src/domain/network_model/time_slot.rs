use rand::Rng;

use crate::domain::network_model::entanglement_interface::InterfaceGraph;
use crate::domain::network_model::instruction::{Store, StoreWindow, Swap, SwapPair};
use crate::domain::network_model::node_pair::EntanglementLedger;
use crate::domain::utils::id::{InterfaceId, NodeId, NodeName};
use crate::error::ScheduleError;

/// What a schedule needs to know about the node it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    pub id: NodeId,
    pub name: &'a NodeName,
    pub interface_count: usize,
}

/// One tick's instructions of a node.
///
/// Every interface of the node is either an endpoint of exactly one Swap or the target of
/// exactly one Store. The constructors guarantee this partition and mutation preserves it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlot {
    node: NodeId,
    swaps: Vec<Swap>,
    stores: Vec<Store>,
}

impl TimeSlot {
    /// Builds a slot from explicit swap pairs; every interface not mentioned becomes a Store.
    pub fn new(context: &NodeContext, swap_pairs: &[SwapPair]) -> Result<Self, ScheduleError> {
        let mut assigned = vec![false; context.interface_count];

        for interface in swap_pairs.iter().flat_map(|pair| [pair.e1, pair.e2]) {
            if interface.node != context.id {
                return Err(ScheduleError::ForeignInterface { node: context.name.clone(), interface: interface.index });
            }

            match assigned.get_mut(interface.index) {
                None => {
                    return Err(ScheduleError::InterfaceOutOfRange {
                        node: context.name.clone(),
                        interface: interface.index,
                        count: context.interface_count,
                    });
                }
                Some(true) => return Err(ScheduleError::DuplicateInterface { node: context.name.clone(), interface: interface.index }),
                Some(slot) => *slot = true,
            }
        }

        let time_slot = Self::assemble(context, swap_pairs.iter().copied().map(Swap::new).collect());
        time_slot.validate_partition(context)?;

        Ok(time_slot)
    }

    /// A slot in which every interface stores.
    pub fn empty(context: &NodeContext) -> Self {
        Self::assemble(context, Vec::new())
    }

    /// Random pairing: interfaces are drawn one by one and each drawn interface is joined
    /// with a second drawn one with probability `swap_chance`.
    pub fn random<R: Rng + ?Sized>(context: &NodeContext, swap_chance: f64, rng: &mut R) -> Self {
        let mut candidates: Vec<usize> = (0..context.interface_count).collect();
        let mut swaps = Vec::new();

        while candidates.len() > 1 {
            let first = candidates.remove(rng.random_range(0..candidates.len()));

            if rng.random::<f64>() < swap_chance {
                let second = candidates.remove(rng.random_range(0..candidates.len()));
                swaps.push(Swap::new(SwapPair::new(InterfaceId::new(context.id, first), InterfaceId::new(context.id, second))));
            }
        }

        Self::assemble(context, swaps)
    }

    /// Stores for every interface the swaps leave free. The swaps must already be a valid
    /// disjoint set of local pairs.
    fn assemble(context: &NodeContext, swaps: Vec<Swap>) -> Self {
        let mut assigned = vec![false; context.interface_count];
        for swap in &swaps {
            assigned[swap.swap_pair().e1.index] = true;
            assigned[swap.swap_pair().e2.index] = true;
        }

        let stores = assigned
            .iter()
            .enumerate()
            .filter(|(_, assigned)| !**assigned)
            .map(|(index, _)| Store::new(InterfaceId::new(context.id, index)))
            .collect();

        Self { node: context.id, swaps, stores }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn swaps(&self) -> &[Swap] {
        &self.swaps
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn swap_pairs(&self) -> impl Iterator<Item = SwapPair> + '_ {
        self.swaps.iter().map(Swap::swap_pair)
    }

    /// Swap strings in slot order, the descriptor form of this slot.
    pub fn to_swap_strings(&self) -> Vec<String> {
        self.swap_pairs().map(|pair| pair.to_string()).collect()
    }

    /// All interfaces referenced by the slot, swaps first.
    pub fn covered_interfaces(&self) -> Vec<InterfaceId> {
        self.swap_pairs().flat_map(|pair| [pair.e1, pair.e2]).chain(self.stores.iter().map(Store::interface)).collect()
    }

    /// `true` if the instructions cover each of the node's `interface_count` interfaces exactly once.
    pub fn is_partition(&self, interface_count: usize) -> bool {
        let mut seen = vec![false; interface_count];

        for interface in self.covered_interfaces() {
            if interface.node != self.node {
                return false;
            }
            match seen.get_mut(interface.index) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }

        seen.iter().all(|covered| *covered)
    }

    /// Same check as [`TimeSlot::is_partition`], reporting the first offending interface.
    pub fn validate_partition(&self, context: &NodeContext) -> Result<(), ScheduleError> {
        let mut seen = vec![false; context.interface_count];

        for interface in self.covered_interfaces() {
            if interface.node != context.id {
                return Err(ScheduleError::ForeignInterface { node: context.name.clone(), interface: interface.index });
            }
            match seen.get_mut(interface.index) {
                None => {
                    return Err(ScheduleError::InterfaceOutOfRange {
                        node: context.name.clone(),
                        interface: interface.index,
                        count: context.interface_count,
                    });
                }
                Some(true) => return Err(ScheduleError::DuplicateInterface { node: context.name.clone(), interface: interface.index }),
                Some(slot) => *slot = true,
            }
        }

        match seen.iter().position(|covered| !*covered) {
            Some(missing) => Err(ScheduleError::UnassignedInterface { node: context.name.clone(), interface: missing }),
            None => Ok(()),
        }
    }

    pub fn execute_swaps(&self, graph: &mut InterfaceGraph, swap_probability: f64) {
        for swap in &self.swaps {
            swap.execute(graph, swap_probability);
        }
    }

    pub fn execute_stores(&self, graph: &InterfaceGraph, ledger: &mut EntanglementLedger, window: &StoreWindow) {
        for store in &self.stores {
            store.execute(graph, ledger, window);
        }
    }

    /// Structural mutation, one of three equally likely edits:
    /// - split a random Swap into two Stores,
    /// - join two random Stores into a Swap,
    /// - take two random Swaps and re-pair their four interfaces.
    ///
    /// An edit without enough source instructions leaves the slot untouched.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.swaps.len() * 2 + self.stores.len() < 2 {
            return;
        }

        let action: f64 = rng.random();

        if action < 1.0 / 3.0 {
            if self.swaps.is_empty() {
                return;
            }
            let swap = self.swaps.remove(rng.random_range(0..self.swaps.len())).swap_pair();
            self.stores.push(Store::new(swap.e1));
            self.stores.push(Store::new(swap.e2));
        } else if action < 2.0 / 3.0 {
            if self.stores.len() < 2 {
                return;
            }
            let store1 = self.stores.remove(rng.random_range(0..self.stores.len()));
            let store2 = self.stores.remove(rng.random_range(0..self.stores.len()));
            self.swaps.push(Swap::new(SwapPair::new(store1.interface(), store2.interface())));
        } else {
            if self.swaps.len() < 2 {
                return;
            }
            let swap1 = self.swaps.remove(rng.random_range(0..self.swaps.len())).swap_pair();
            let swap2 = self.swaps.remove(rng.random_range(0..self.swaps.len())).swap_pair();

            if rng.random_bool(0.5) {
                self.swaps.push(Swap::new(SwapPair::new(swap1.e1, swap2.e1)));
                self.swaps.push(Swap::new(SwapPair::new(swap1.e2, swap2.e2)));
            } else {
                self.swaps.push(Swap::new(SwapPair::new(swap1.e1, swap2.e2)));
                self.swaps.push(Swap::new(SwapPair::new(swap1.e2, swap2.e1)));
            }
        }
    }
}
