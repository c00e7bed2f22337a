use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::api::network_dto::{LinkDto, NetworkDto};
use crate::config::SimulationConfig;
use crate::domain::network_model::entanglement_interface::InterfaceGraph;
use crate::domain::network_model::instruction::parse_index_pair;
use crate::domain::network_model::node::Node;
use crate::domain::network_model::node_pair::{EntanglementLedger, NodePair};
use crate::domain::utils::id::{InterfaceId, NodeId, NodeName};
use crate::error::ScheduleError;

/// Chance that a node's schedule is edited by [`Network::mutate`].
const NODE_MUTATION_CHANCE: f64 = 0.8;

/// Chance that crossover keeps a node's schedule from the first parent.
const CROSSOVER_KEEP_CHANCE: f64 = 0.5;

/// A repeater network together with the schedules of all its nodes; the chromosome of the
/// schedule search.
///
/// Every tick runs globally in phases: accumulators decay, every node swaps, every node
/// stores, then all interfaces receive fresh link-level entanglement.
#[derive(Debug)]
pub struct Network {
    nodes: Vec<Node>,
    name_index: BTreeMap<String, NodeId>,
    interfaces: InterfaceGraph,
    ledger: EntanglementLedger,
    total_time_slots: usize,
    config: SimulationConfig,
}

impl Network {
    /// Builds the network described by `dto`. Node ids follow the descriptor's name order.
    pub fn from_dto(dto: &NetworkDto, config: SimulationConfig) -> Result<Self, ScheduleError> {
        if dto.nodes.is_empty() {
            return Err(ScheduleError::EmptyTopology);
        }

        // Phase 1: nodes and their schedules
        let mut nodes = Vec::with_capacity(dto.nodes.len());
        let mut name_index = BTreeMap::new();

        for (i, (name, node_dto)) in dto.nodes.iter().enumerate() {
            let id = NodeId(i);
            nodes.push(Node::try_from_dto(id, NodeName::new(name.as_str()), node_dto)?);
            name_index.insert(name.clone(), id);
        }

        // Phase 2: interfaces and node pairs
        let interface_counts: Vec<usize> = nodes.iter().map(Node::interface_count).collect();
        let mut interfaces = InterfaceGraph::new(&interface_counts);
        let ledger = EntanglementLedger::new(&nodes, config.lambda);

        // Phase 3: fibre links, at most one per node pair
        let mut linked_pairs = BTreeSet::new();

        for (key, link) in &dto.links {
            let (a, b) = Self::resolve_link_key(key, &name_index)?;
            if a == b {
                return Err(ScheduleError::SelfLink { link: key.clone() });
            }
            if !linked_pairs.insert(NodePair::key(a, b)) {
                return Err(ScheduleError::DuplicateLink { link: key.clone() });
            }

            let (index_a, index_b) = parse_index_pair(&link.interfaces)
                .ok_or_else(|| ScheduleError::MalformedLink { link: key.clone(), value: link.interfaces.clone() })?;

            let end_a = Self::free_interface(&nodes[a.index()], &interfaces, index_a)?;
            let end_b = Self::free_interface(&nodes[b.index()], &interfaces, index_b)?;
            interfaces.pair(end_a, end_b);
        }
        interfaces.reset_all();

        log::debug!("Network built with {} nodes, {} links and {} node pairs.", nodes.len(), dto.links.len(), ledger.pairs().len());

        Ok(Self { nodes, name_index, interfaces, ledger, total_time_slots: 0, config })
    }

    /// Topology of `dto` with every schedule replaced by a single all-Store slot.
    pub fn with_empty_schedules(dto: &NetworkDto, config: SimulationConfig) -> Result<Self, ScheduleError> {
        let mut network = Self::from_dto(dto, config)?;
        for node in network.nodes.iter_mut() {
            node.set_time_slots(Vec::new());
        }

        Ok(network)
    }

    /// Splits `"<nodeA>-<nodeB>"` at the first `-` that yields two known node names.
    fn resolve_link_key(key: &str, name_index: &BTreeMap<String, NodeId>) -> Result<(NodeId, NodeId), ScheduleError> {
        let mut unknown = None;

        for (split, _) in key.match_indices('-') {
            let (first, second) = (&key[..split], &key[split + 1..]);

            match (name_index.get(first), name_index.get(second)) {
                (Some(&a), Some(&b)) => return Ok((a, b)),
                (None, _) => unknown = unknown.or(Some(first)),
                (_, None) => unknown = unknown.or(Some(second)),
            }
        }

        match unknown {
            Some(name) => Err(ScheduleError::UnknownNode(name.to_string())),
            None => Err(ScheduleError::MalformedLink { link: key.to_string(), value: key.to_string() }),
        }
    }

    fn free_interface(node: &Node, interfaces: &InterfaceGraph, index: usize) -> Result<InterfaceId, ScheduleError> {
        let id = InterfaceId::new(node.id(), index);

        match interfaces.get(id) {
            None => Err(ScheduleError::InterfaceOutOfRange { node: node.name().clone(), interface: index, count: node.interface_count() }),
            Some(interface) if interface.fibre_pair().is_some() => {
                Err(ScheduleError::InterfaceAlreadyLinked { node: node.name().clone(), interface: index })
            }
            Some(_) => Ok(id),
        }
    }

    /// Gives every node `1..=max_time_slots` random time slots.
    pub fn init_random_instruction_tables<R: Rng + ?Sized>(&mut self, rng: &mut R, max_time_slots: usize, swap_chance: f64) {
        for node in self.nodes.iter_mut() {
            node.randomize_schedule(rng, max_time_slots, swap_chance);
        }
    }

    pub fn advance_n_time_slots(&mut self, n: usize) {
        for _ in 0..n {
            self.compute_next_time_slot();
            self.total_time_slots += 1;
        }
    }

    fn compute_next_time_slot(&mut self) {
        self.ledger.decay();

        // All swaps of the tick must be done before any node stores.
        for node in self.nodes.iter_mut() {
            node.execute_swaps(&mut self.interfaces);
        }
        for node in self.nodes.iter_mut() {
            node.execute_stores(&self.interfaces, &mut self.ledger, &self.config);
        }

        self.interfaces.reset_all();
    }

    /// Clears the accumulators and the tick counter. Schedules and cursors are kept.
    pub fn reset(&mut self) {
        self.ledger.reset();
        self.total_time_slots = 0;
    }

    /// Fitness signal: sum of the Poisson-shaped pair scores.
    pub fn amount_entanglement(&self) -> f64 {
        self.ledger.amount_entanglement()
    }

    pub fn total_entanglement(&self) -> f64 {
        self.ledger.total_entanglement()
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for node in self.nodes.iter_mut() {
            if rng.random::<f64>() < NODE_MUTATION_CHANCE {
                node.mutate(rng);
            }
        }
    }

    /// Child with the topology and parameters of `self`. Each node's whole schedule comes
    /// from `other` with probability 0.5.
    pub fn crossover<R: Rng + ?Sized>(&self, other: &Network, rng: &mut R) -> Result<Network, ScheduleError> {
        let mut dto = self.to_dto();
        let other_dto = other.to_dto();

        for (name, node_dto) in dto.nodes.iter_mut() {
            if rng.random::<f64>() < CROSSOVER_KEEP_CHANCE {
                continue;
            }

            match other_dto.nodes.get(name) {
                Some(other_node) if other_node.entanglement_interfaces == node_dto.entanglement_interfaces => {
                    node_dto.time_slots = other_node.time_slots.clone();
                }
                _ => return Err(ScheduleError::IncompatibleParents { node: NodeName::new(name.as_str()) }),
            }
        }

        Network::from_dto(&dto, self.config)
    }

    /// Descriptor of the network. Each link is emitted once, keyed by the lower node name first.
    pub fn to_dto(&self) -> NetworkDto {
        let nodes = self.nodes.iter().map(|node| (node.name().to_string(), node.to_dto())).collect();
        let mut links = BTreeMap::new();

        for interface in self.interfaces.iter() {
            let Some(partner) = interface.fibre_pair() else {
                continue;
            };
            if partner.node < interface.node() {
                continue;
            }

            let key = format!("{}-{}", self.node(interface.node()).name(), self.node(partner.node).name());
            links.insert(key, LinkDto { interfaces: format!("{}-{}", interface.index(), partner.index) });
        }

        NetworkDto { nodes, links }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.node_id(name).map(|id| self.node(id))
    }

    pub fn interfaces(&self) -> &InterfaceGraph {
        &self.interfaces
    }

    pub fn pairs(&self) -> &[NodePair] {
        self.ledger.pairs()
    }

    pub fn pair_shared_entanglement(&self, pair: &NodePair) -> f64 {
        self.ledger.shared_entanglement(pair.first(), pair.second()).unwrap_or(0.0)
    }

    /// Accumulated entanglement between two nodes given by name, in either order.
    pub fn shared_entanglement_between(&self, a: &str, b: &str) -> Option<f64> {
        self.ledger.shared_entanglement(self.node_id(a)?, self.node_id(b)?)
    }

    pub fn total_time_slots(&self) -> usize {
        self.total_time_slots
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn describe(&self, id: Option<InterfaceId>) -> String {
        match id {
            Some(id) => format!("{}:{}", self.node(id.node).name(), id.index),
            None => "nothing".to_string(),
        }
    }
}

/// Copies schedules, accumulators and the tick counter. Cursors are rewound and the interfaces
/// start from a clean link-level state.
impl Clone for Network {
    fn clone(&self) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.iter_mut().for_each(Node::rewind);

        let mut interfaces = self.interfaces.clone();
        interfaces.reset_all();

        Self {
            nodes,
            name_index: self.name_index.clone(),
            interfaces,
            ledger: self.ledger.clone(),
            total_time_slots: self.total_time_slots,
            config: self.config,
        }
    }
}

impl TryFrom<NetworkDto> for Network {
    type Error = ScheduleError;

    fn try_from(dto: NetworkDto) -> Result<Self, Self::Error> {
        Network::from_dto(&dto, SimulationConfig::default())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            writeln!(f, "Node {} has {} interfaces.", node.name(), node.interface_count())?;

            for interface in node.interfaces(&self.interfaces) {
                writeln!(
                    f,
                    "  Interface {} wired to {}, entangled with {} (p = {:.3}).",
                    interface.index(),
                    self.describe(interface.fibre_pair()),
                    self.describe(interface.entangled_pair()),
                    interface.still_entangled_probability()
                )?;
            }

            let schedule: Vec<String> = node.instruction_table().to_swap_strings().iter().map(|slot| format!("[{}]", slot.join(", "))).collect();
            writeln!(f, "  Schedule: {}", schedule.join(" "))?;
        }

        for pair in self.pairs() {
            writeln!(
                f,
                "Pair {}-{} shares {} (expected number of entangled pairs).",
                self.node(pair.first()).name(),
                self.node(pair.second()).name(),
                self.pair_shared_entanglement(pair)
            )?;
        }

        write!(
            f,
            "Total entanglement is {} and the amount of entanglement is {} after {} time slots.",
            self.total_entanglement(),
            self.amount_entanglement(),
            self.total_time_slots
        )
    }
}
