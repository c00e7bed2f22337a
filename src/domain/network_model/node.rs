use rand::Rng;

use crate::api::network_dto::NodeDto;
use crate::config::SimulationConfig;
use crate::domain::network_model::entanglement_interface::{EntanglementInterface, InterfaceGraph};
use crate::domain::network_model::instruction::StoreWindow;
use crate::domain::network_model::instruction_table::InstructionTable;
use crate::domain::network_model::node_pair::EntanglementLedger;
use crate::domain::network_model::time_slot::{NodeContext, TimeSlot};
use crate::domain::utils::id::{NodeId, NodeName};
use crate::error::ScheduleError;

pub const DEFAULT_ENTANGLEMENT_FIDELITY_CAPACITY: f64 = 0.9;
pub const DEFAULT_EXPECTED_SWAPS_PER_NANOSECOND: u32 = 1000;

/// Fixed physical parameters of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeParameters {
    /// Fraction of shared entanglement that survives from one tick to the next.
    pub entanglement_fidelity_capacity: f64,
    pub expected_swaps_per_nanosecond: u32,

    /// Success probability of a swap executed by this node.
    pub swap_probability: f64,
}

impl Default for NodeParameters {
    fn default() -> Self {
        Self {
            entanglement_fidelity_capacity: DEFAULT_ENTANGLEMENT_FIDELITY_CAPACITY,
            expected_swaps_per_nanosecond: DEFAULT_EXPECTED_SWAPS_PER_NANOSECOND,
            swap_probability: 1.0,
        }
    }
}

/// A repeater or end node.
///
/// The interfaces themselves live in the network's [`InterfaceGraph`]; the node knows
/// how many it has and owns the schedule that drives them.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    name: NodeName,
    interface_count: usize,
    params: NodeParameters,
    instruction_table: InstructionTable,
}

impl Node {
    pub fn new(id: NodeId, name: NodeName, interface_count: usize, params: NodeParameters) -> Self {
        let context = NodeContext { id, name: &name, interface_count };
        let instruction_table = InstructionTable::new(&context, Vec::new());

        Self { id, name, interface_count, params, instruction_table }
    }

    /// Builds the node and parses its schedule from the descriptor entry.
    pub fn try_from_dto(id: NodeId, name: NodeName, dto: &NodeDto) -> Result<Self, ScheduleError> {
        let params = NodeParameters {
            entanglement_fidelity_capacity: dto.entanglement_fidelity_capacity,
            expected_swaps_per_nanosecond: dto.expected_swaps_per_nanosecond,
            swap_probability: dto.swap_probability,
        };
        Self::validate_parameters(&name, &params)?;

        let context = NodeContext { id, name: &name, interface_count: dto.entanglement_interfaces };
        let instruction_table = InstructionTable::from_swap_strings(&context, &dto.time_slots)?;

        Ok(Self { id, name, interface_count: dto.entanglement_interfaces, params, instruction_table })
    }

    fn validate_parameters(name: &NodeName, params: &NodeParameters) -> Result<(), ScheduleError> {
        let probabilities = [
            ("swap_probability", params.swap_probability),
            ("entanglement_fidelity_capacity", params.entanglement_fidelity_capacity),
        ];

        for (parameter, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScheduleError::InvalidParameter { node: name.clone(), parameter, value });
            }
        }

        Ok(())
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    pub fn params(&self) -> &NodeParameters {
        &self.params
    }

    pub fn interface_count(&self) -> usize {
        self.interface_count
    }

    pub fn instruction_table(&self) -> &InstructionTable {
        &self.instruction_table
    }

    pub fn context(&self) -> NodeContext<'_> {
        NodeContext { id: self.id, name: &self.name, interface_count: self.interface_count }
    }

    /// This node's interfaces as currently held by `graph`.
    pub fn interfaces<'g>(&self, graph: &'g InterfaceGraph) -> &'g [EntanglementInterface] {
        graph.node_interfaces(self.id)
    }

    pub fn store_window(&self, config: &SimulationConfig) -> StoreWindow {
        StoreWindow {
            expected_swaps_per_nanosecond: self.params.expected_swaps_per_nanosecond,
            duration_ns: config.time_slot_duration_ns,
            normalization: config.store_normalization,
        }
    }

    /// Replaces the schedule, an empty list leaves one all-Store slot.
    pub fn set_time_slots(&mut self, time_slots: Vec<TimeSlot>) {
        let context = NodeContext { id: self.id, name: &self.name, interface_count: self.interface_count };
        self.instruction_table.reset(&context, time_slots);
    }

    /// Draws `1..=max_time_slots` random slots.
    pub fn randomize_schedule<R: Rng + ?Sized>(&mut self, rng: &mut R, max_time_slots: usize, swap_chance: f64) {
        let context = NodeContext { id: self.id, name: &self.name, interface_count: self.interface_count };

        let n_time_slots = rng.random_range(1..=max_time_slots.max(1));
        let time_slots = (0..n_time_slots).map(|_| TimeSlot::random(&context, swap_chance, rng)).collect();

        self.instruction_table.reset(&context, time_slots);
    }

    pub fn rewind(&mut self) {
        self.instruction_table.rewind();
    }

    pub fn execute_swaps(&mut self, graph: &mut InterfaceGraph) {
        self.instruction_table.execute_swaps_next_time_slot(graph, self.params.swap_probability);
    }

    pub fn execute_stores(&mut self, graph: &InterfaceGraph, ledger: &mut EntanglementLedger, config: &SimulationConfig) {
        let window = self.store_window(config);
        self.instruction_table.execute_stores_next_time_slot(graph, ledger, &window);
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let context = NodeContext { id: self.id, name: &self.name, interface_count: self.interface_count };
        self.instruction_table.mutate(&context, rng);
    }

    pub fn to_dto(&self) -> NodeDto {
        NodeDto {
            entanglement_interfaces: self.interface_count,
            swap_probability: self.params.swap_probability,
            time_slots: self.instruction_table.to_swap_strings(),
            entanglement_fidelity_capacity: self.params.entanglement_fidelity_capacity,
            expected_swaps_per_nanosecond: self.params.expected_swaps_per_nanosecond,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_node_from_dto_round_trip() {
        let mut dto = NodeDto::new(4, 0.6);
        dto.time_slots = vec![vec!["0-1".to_string()], vec!["2-3".to_string(), "1-0".to_string()]];
        dto.expected_swaps_per_nanosecond = 500;

        let node = Node::try_from_dto(NodeId(2), NodeName::new("R1"), &dto).unwrap();

        assert_eq!(node.interface_count(), 4);
        assert_eq!(node.params().expected_swaps_per_nanosecond, 500);
        assert_eq!(node.instruction_table().len(), 2);
        assert_eq!(node.to_dto(), dto);
    }

    #[test]
    fn test_invalid_probability_is_rejected() {
        let dto = NodeDto::new(2, 1.5);

        assert_eq!(
            Node::try_from_dto(NodeId(0), NodeName::new("A"), &dto),
            Err(ScheduleError::InvalidParameter { node: NodeName::new("A"), parameter: "swap_probability", value: 1.5 })
        );
    }

    #[test]
    fn test_random_schedule_length() {
        let mut node = Node::new(NodeId(0), NodeName::new("A"), 5, NodeParameters::default());
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            node.randomize_schedule(&mut rng, 9, 0.7);

            let len = node.instruction_table().len();
            assert!((1..=9).contains(&len));
            assert!(node.instruction_table().time_slots().iter().all(|slot| slot.is_partition(5)));
        }
    }
}
