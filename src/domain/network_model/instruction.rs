use std::fmt;

use crate::domain::network_model::entanglement_interface::InterfaceGraph;
use crate::domain::network_model::node_pair::EntanglementLedger;
use crate::domain::utils::id::{InterfaceId, NodeId};

/// Parses `"<i>-<j>"` into two indices. Signs and whitespace are rejected.
pub(crate) fn parse_index_pair(value: &str) -> Option<(usize, usize)> {
    let (first, second) = value.split_once('-')?;

    Some((parse_index(first)?, parse_index(second)?))
}

fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Two interfaces of the same node joined by a Swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapPair {
    pub e1: InterfaceId,
    pub e2: InterfaceId,
}

impl SwapPair {
    pub fn new(e1: InterfaceId, e2: InterfaceId) -> Self {
        Self { e1, e2 }
    }

    /// Builds the pair described by a swap string of `node`; `None` if the text is malformed.
    pub fn parse(node: NodeId, value: &str) -> Option<Self> {
        let (i, j) = parse_index_pair(value)?;

        Some(Self::new(InterfaceId::new(node, i), InterfaceId::new(node, j)))
    }
}

/// The descriptor form, local interface indices joined by `-`.
impl fmt::Display for SwapPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.e1.index, self.e2.index)
    }
}

/// Entanglement swapping at one node.
///
/// The remote partners of the two local interfaces become entangled with each other and
/// the local halves are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    swap_pair: SwapPair,
}

impl Swap {
    pub fn new(swap_pair: SwapPair) -> Self {
        Self { swap_pair }
    }

    pub fn swap_pair(&self) -> SwapPair {
        self.swap_pair
    }

    /// `swap_probability` is the one of the node executing the swap; it is applied to both
    /// new partners.
    pub fn execute(&self, graph: &mut InterfaceGraph, swap_probability: f64) {
        let SwapPair { e1, e2 } = self.swap_pair;

        let e1_pair = graph.interface(e1).entangled_pair();
        let e2_pair = graph.interface(e2).entangled_pair();

        graph.entangle(e1, e2);
        graph.consume(e1);
        graph.consume(e2);

        match (e1_pair, e2_pair) {
            (Some(p1), Some(p2)) => {
                graph.entangle(p1, p2);
                graph.scale_probability(p1, swap_probability);
                graph.scale_probability(p2, swap_probability);
            }
            // Nothing to join with, the remaining half is lost.
            (Some(lonely), None) | (None, Some(lonely)) => graph.disentangle(lonely),
            (None, None) => {}
        }
    }
}

/// Constants of a Store besides the interface state: how many pairs the node generates per
/// nanosecond, for how long, and the normalisation of the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreWindow {
    pub expected_swaps_per_nanosecond: u32,
    pub duration_ns: u32,
    pub normalization: f64,
}

impl StoreWindow {
    /// Expected contribution of an interface that is entangled with certainty.
    pub fn expected_pairs(&self) -> f64 {
        self.expected_swaps_per_nanosecond as f64 * self.duration_ns as f64 / self.normalization
    }
}

/// Harvests the entanglement held by one interface into its node pair's accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Store {
    interface: InterfaceId,
}

impl Store {
    pub fn new(interface: InterfaceId) -> Self {
        Self { interface }
    }

    pub fn interface(&self) -> InterfaceId {
        self.interface
    }

    pub fn execute(&self, graph: &InterfaceGraph, ledger: &mut EntanglementLedger, window: &StoreWindow) {
        let interface = graph.interface(self.interface);

        let Some(partner) = interface.entangled_pair() else {
            log::trace!("Store on {} skipped, interface holds no entanglement.", self.interface);
            return;
        };

        let entanglement = interface.still_entangled_probability() * window.expected_pairs();

        if !ledger.add_shared_entanglement(interface.node(), partner.node, entanglement) {
            log::trace!("Store on {} skipped, partner {} is not part of a tracked node pair.", self.interface, partner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(node: usize, index: usize) -> InterfaceId {
        InterfaceId::new(NodeId(node), index)
    }

    /// Chain A - B - C: B swaps its two interfaces, A and C end up entangled.
    fn chain() -> InterfaceGraph {
        let mut graph = InterfaceGraph::new(&[1, 2, 1]);
        graph.pair(iface(0, 0), iface(1, 0));
        graph.pair(iface(1, 1), iface(2, 0));
        graph.reset_all();
        graph
    }

    #[test]
    fn test_parse_swap_string() {
        assert_eq!(parse_index_pair("0-3"), Some((0, 3)));
        assert_eq!(parse_index_pair("12-7"), Some((12, 7)));
        assert_eq!(parse_index_pair("1"), None);
        assert_eq!(parse_index_pair("a-1"), None);
        assert_eq!(parse_index_pair("1--2"), None);
        assert_eq!(parse_index_pair("0-+1"), None);
        assert_eq!(parse_index_pair("+0-1"), None);
        assert_eq!(parse_index_pair(" 0 - 1"), None);
        assert_eq!(parse_index_pair("0-1 "), None);
        assert_eq!(parse_index_pair("-1"), None);

        let pair = SwapPair::parse(NodeId(4), "2-0").unwrap();
        assert_eq!(pair, SwapPair::new(iface(4, 2), iface(4, 0)));
        assert_eq!(pair.to_string(), "2-0");
    }

    #[test]
    fn test_swap_joins_remote_partners() {
        let mut graph = chain();

        Swap::new(SwapPair::new(iface(1, 0), iface(1, 1))).execute(&mut graph, 0.5);

        assert_eq!(graph.interface(iface(0, 0)).entangled_pair(), Some(iface(2, 0)));
        assert_eq!(graph.interface(iface(2, 0)).entangled_pair(), Some(iface(0, 0)));

        assert_eq!(graph.interface(iface(1, 0)).still_entangled_probability(), 0.0);
        assert_eq!(graph.interface(iface(1, 1)).still_entangled_probability(), 0.0);
        assert_eq!(graph.interface(iface(0, 0)).still_entangled_probability(), 0.5);
        assert_eq!(graph.interface(iface(2, 0)).still_entangled_probability(), 0.5);
    }

    #[test]
    fn test_swap_with_unwired_interface_drops_partner() {
        let mut graph = InterfaceGraph::new(&[1, 2]);
        graph.pair(iface(0, 0), iface(1, 0));
        graph.reset_all();

        Swap::new(SwapPair::new(iface(1, 0), iface(1, 1))).execute(&mut graph, 0.9);

        assert_eq!(graph.interface(iface(0, 0)).entangled_pair(), None);
        assert_eq!(graph.interface(iface(0, 0)).still_entangled_probability(), 0.0);
    }

    #[test]
    fn test_store_window() {
        let window = StoreWindow { expected_swaps_per_nanosecond: 1000, duration_ns: 1_000_000, normalization: 2e9 };

        assert_eq!(window.expected_pairs(), 0.5);
    }
}
