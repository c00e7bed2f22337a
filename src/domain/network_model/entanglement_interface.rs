use crate::domain::utils::id::{InterfaceId, NodeId};

/// One hardware port of a node.
///
/// `fibre_pair` is the physically wired remote port and is set once, when the topology
/// is built. `entangled_pair` is the port currently holding the other half of the live
/// entangled resource; it is rewritten by swaps and restored to `fibre_pair` by
/// [`EntanglementInterface::reset_entangled_pair`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntanglementInterface {
    id: InterfaceId,
    fibre_pair: Option<InterfaceId>,
    entangled_pair: Option<InterfaceId>,
    still_entangled_probability: f64,
}

impl EntanglementInterface {
    pub fn new(id: InterfaceId) -> Self {
        Self { id, fibre_pair: None, entangled_pair: None, still_entangled_probability: 0.0 }
    }

    pub fn id(&self) -> InterfaceId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.id.node
    }

    pub fn index(&self) -> usize {
        self.id.index
    }

    pub fn fibre_pair(&self) -> Option<InterfaceId> {
        self.fibre_pair
    }

    pub fn entangled_pair(&self) -> Option<InterfaceId> {
        self.entangled_pair
    }

    pub fn still_entangled_probability(&self) -> f64 {
        self.still_entangled_probability
    }

    /// Fresh physical-layer entanglement across the fibre.
    pub fn reset_entangled_pair(&mut self) {
        self.entangled_pair = self.fibre_pair;
        self.still_entangled_probability = 1.0;
    }
}

/// All interfaces of one network, stored per node and addressed by [`InterfaceId`].
///
/// Cross-node relations (fibre and entanglement partners) are plain ids resolved through
/// this container, so swapping is a handful of value updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceGraph {
    interfaces: Vec<Vec<EntanglementInterface>>,
}

impl InterfaceGraph {
    /// Creates `interface_counts[n]` unpaired interfaces for node `n`.
    pub fn new(interface_counts: &[usize]) -> Self {
        let interfaces = interface_counts
            .iter()
            .enumerate()
            .map(|(node, count)| (0..*count).map(|index| EntanglementInterface::new(InterfaceId::new(NodeId(node), index))).collect::<Vec<_>>())
            .collect();

        Self { interfaces }
    }

    pub fn num_of_nodes(&self) -> usize {
        self.interfaces.len()
    }

    pub fn interface_count(&self, node: NodeId) -> usize {
        self.interfaces.get(node.index()).map_or(0, Vec::len)
    }

    pub fn contains(&self, id: InterfaceId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: InterfaceId) -> Option<&EntanglementInterface> {
        self.interfaces.get(id.node.index()).and_then(|node| node.get(id.index))
    }

    /// Interfaces of one node in index order.
    pub fn node_interfaces(&self, node: NodeId) -> &[EntanglementInterface] {
        self.interfaces.get(node.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntanglementInterface> {
        self.interfaces.iter().flatten()
    }

    /// Resolves an id that the caller knows to be valid. An unknown id here means the
    /// schedule and the topology went out of sync.
    pub fn interface(&self, id: InterfaceId) -> &EntanglementInterface {
        match self.get(id) {
            Some(interface) => interface,
            None => panic!("Interface {} is not part of the network.", id),
        }
    }

    fn interface_mut(&mut self, id: InterfaceId) -> &mut EntanglementInterface {
        match self.interfaces.get_mut(id.node.index()).and_then(|node| node.get_mut(id.index)) {
            Some(interface) => interface,
            None => panic!("Interface {} is not part of the network.", id),
        }
    }

    /// Wires `a` and `b` as each other's fibre partner. Only used while building a topology.
    pub fn pair(&mut self, a: InterfaceId, b: InterfaceId) {
        self.interface_mut(a).fibre_pair = Some(b);
        self.interface_mut(b).fibre_pair = Some(a);
    }

    /// Makes `a` and `b` each other's entangled partner.
    pub fn entangle(&mut self, a: InterfaceId, b: InterfaceId) {
        self.interface_mut(a).entangled_pair = Some(b);
        self.interface_mut(b).entangled_pair = Some(a);
    }

    /// Drops the entangled resource held by `id`.
    pub fn disentangle(&mut self, id: InterfaceId) {
        let interface = self.interface_mut(id);
        interface.entangled_pair = None;
        interface.still_entangled_probability = 0.0;
    }

    pub fn consume(&mut self, id: InterfaceId) {
        self.interface_mut(id).still_entangled_probability = 0.0;
    }

    pub fn scale_probability(&mut self, id: InterfaceId, factor: f64) {
        self.interface_mut(id).still_entangled_probability *= factor;
    }

    pub fn reset_node(&mut self, node: NodeId) {
        if let Some(interfaces) = self.interfaces.get_mut(node.index()) {
            interfaces.iter_mut().for_each(EntanglementInterface::reset_entangled_pair);
        }
    }

    pub fn reset_all(&mut self) {
        self.interfaces.iter_mut().flatten().for_each(EntanglementInterface::reset_entangled_pair);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(node: usize, index: usize) -> InterfaceId {
        InterfaceId::new(NodeId(node), index)
    }

    #[test]
    fn test_pair_and_reset() {
        let mut graph = InterfaceGraph::new(&[2, 1]);
        graph.pair(iface(0, 1), iface(1, 0));

        assert_eq!(graph.interface(iface(0, 1)).fibre_pair(), Some(iface(1, 0)));
        assert_eq!(graph.interface(iface(1, 0)).fibre_pair(), Some(iface(0, 1)));
        assert_eq!(graph.interface(iface(0, 1)).entangled_pair(), None);
        assert_eq!(graph.interface(iface(0, 1)).still_entangled_probability(), 0.0);

        graph.reset_all();

        assert_eq!(graph.interface(iface(0, 1)).entangled_pair(), Some(iface(1, 0)));
        assert_eq!(graph.interface(iface(0, 1)).still_entangled_probability(), 1.0);

        // Unwired interface has no partner even after a reset.
        assert_eq!(graph.interface(iface(0, 0)).entangled_pair(), None);
        assert_eq!(graph.interface(iface(0, 0)).still_entangled_probability(), 1.0);
    }

    #[test]
    fn test_entangle_keeps_fibre_pair() {
        let mut graph = InterfaceGraph::new(&[1, 1, 1]);
        graph.pair(iface(0, 0), iface(1, 0));
        graph.reset_all();

        graph.entangle(iface(0, 0), iface(2, 0));

        assert_eq!(graph.interface(iface(0, 0)).entangled_pair(), Some(iface(2, 0)));
        assert_eq!(graph.interface(iface(2, 0)).entangled_pair(), Some(iface(0, 0)));
        assert_eq!(graph.interface(iface(0, 0)).fibre_pair(), Some(iface(1, 0)));

        graph.reset_node(NodeId(0));
        assert_eq!(graph.interface(iface(0, 0)).entangled_pair(), Some(iface(1, 0)));
    }

    #[test]
    fn test_lookup_out_of_range() {
        let graph = InterfaceGraph::new(&[1]);

        assert!(graph.contains(iface(0, 0)));
        assert!(!graph.contains(iface(0, 1)));
        assert!(!graph.contains(iface(3, 0)));
        assert_eq!(graph.interface_count(NodeId(3)), 0);
    }
}
