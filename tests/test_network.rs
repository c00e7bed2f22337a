use approx::assert_relative_eq;
use entanglement_scheduler::{
    api::network_dto::{LinkDto, NetworkDto, NodeDto},
    config::SimulationConfig,
    domain::network_model::network::Network,
    error::{Error, ScheduleError},
    load_network,
};

const STAR_TOPOLOGY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/star_topology.json");
const STAR_GENOME: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/star_genome.json");
const MALFORMED_SWAP: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/malformed_swap.json");

fn node(interfaces: usize, swap_probability: f64, time_slots: &[&[&str]]) -> NodeDto {
    let mut dto = NodeDto::new(interfaces, swap_probability);
    dto.time_slots = time_slots.iter().map(|slot| slot.iter().map(|s| s.to_string()).collect()).collect();
    dto
}

fn link(interfaces: &str) -> LinkDto {
    LinkDto { interfaces: interfaces.to_string() }
}

/// Two single-interface nodes joined by one fibre, both storing every tick.
fn two_node_network() -> Network {
    let dto = NetworkDto {
        nodes: [("A".to_string(), node(1, 0.3, &[&[]])), ("B".to_string(), node(1, 0.7, &[&[]]))].into(),
        links: [("A-B".to_string(), link("0-0"))].into(),
    };
    Network::try_from(dto).unwrap()
}

/// A - B - C where B swaps its two interfaces in every tick.
fn chain_network(swap_probability_ends: f64, swap_probability_b: f64) -> Network {
    let dto = NetworkDto {
        nodes: [
            ("A".to_string(), node(1, swap_probability_ends, &[&[]])),
            ("B".to_string(), node(2, swap_probability_b, &[&["0-1"]])),
            ("C".to_string(), node(1, swap_probability_ends, &[&[]])),
        ]
        .into(),
        links: [("A-B".to_string(), link("0-0")), ("B-C".to_string(), link("1-0"))].into(),
    };
    Network::try_from(dto).unwrap()
}

#[test]
fn test_two_stores_on_one_link_accumulate() {
    let mut network = two_node_network();

    network.advance_n_time_slots(1);

    // Both nodes store 1 * 1000 * 1e6 / 2e9 = 0.5 into the same pair.
    assert_relative_eq!(network.shared_entanglement_between("A", "B").unwrap(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(network.shared_entanglement_between("B", "A").unwrap(), 1.0, epsilon = 1e-12);
    assert_eq!(network.total_time_slots(), 1);

    network.advance_n_time_slots(1);

    // Decayed by the default capacity 0.9 before the second harvest.
    assert_relative_eq!(network.shared_entanglement_between("A", "B").unwrap(), 1.9, epsilon = 1e-12);
    assert_eq!(network.total_time_slots(), 2);
}

#[test]
fn test_swaps_complete_before_any_store() {
    let mut network = chain_network(0.1, 0.5);

    network.advance_n_time_slots(1);

    // A stores before B runs its schedule, but still sees the swapped partner C.
    assert_relative_eq!(network.shared_entanglement_between("A", "C").unwrap(), 0.5, epsilon = 1e-12);
    assert_eq!(network.shared_entanglement_between("A", "B").unwrap(), 0.0);
    assert_eq!(network.shared_entanglement_between("B", "C").unwrap(), 0.0);
}

#[test]
fn test_swap_uses_probability_of_executing_node() {
    let mut weak_ends = chain_network(0.1, 0.5);
    let mut strong_ends = chain_network(0.9, 0.5);

    weak_ends.advance_n_time_slots(10);
    strong_ends.advance_n_time_slots(10);
    assert_eq!(weak_ends.total_entanglement(), strong_ends.total_entanglement());

    let mut certain = chain_network(0.1, 1.0);
    certain.advance_n_time_slots(1);
    assert_relative_eq!(certain.shared_entanglement_between("A", "C").unwrap(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_interfaces_reset_after_each_tick() {
    let mut network = chain_network(0.1, 0.5);
    network.advance_n_time_slots(3);

    for interface in network.interfaces().iter() {
        assert_eq!(interface.entangled_pair(), interface.fibre_pair());
        assert_eq!(interface.still_entangled_probability(), 1.0);
    }
}

#[test]
fn test_reset_is_idempotent() {
    let mut network = load_network(STAR_GENOME, SimulationConfig::default()).unwrap();
    network.advance_n_time_slots(57);
    assert!(network.total_entanglement() > 0.0);

    network.reset();
    let once: Vec<f64> = network.pairs().iter().map(|pair| network.pair_shared_entanglement(pair)).collect();

    network.reset();
    let twice: Vec<f64> = network.pairs().iter().map(|pair| network.pair_shared_entanglement(pair)).collect();

    assert_eq!(once, twice);
    assert!(once.iter().all(|shared| *shared == 0.0));
    assert_eq!(network.total_time_slots(), 0);
    assert_eq!(network.amount_entanglement(), 0.0);
}

#[test]
fn test_fresh_network_scores_zero() {
    let network = load_network(STAR_TOPOLOGY, SimulationConfig::default()).unwrap();

    assert_eq!(network.pairs().len(), 10);
    assert_eq!(network.amount_entanglement(), 0.0);
    assert_eq!(network.total_entanglement(), 0.0);
}

#[test]
fn test_star_schedule_two_ticks() {
    let mut network = load_network(STAR_GENOME, SimulationConfig::default()).unwrap();

    network.advance_n_time_slots(2);

    // Tick 1 joins L1-L2 and L3-L4 through the center, tick 2 joins L1-L3 and the center stores on 1 and 3.
    assert_relative_eq!(network.shared_entanglement_between("L1", "L2").unwrap(), 0.85 * 0.9, epsilon = 1e-12);
    assert_relative_eq!(network.shared_entanglement_between("L3", "L4").unwrap(), 0.85 * 0.8, epsilon = 1e-12);
    assert_relative_eq!(network.shared_entanglement_between("L1", "L3").unwrap(), 0.85, epsilon = 1e-12);
    assert_relative_eq!(network.shared_entanglement_between("Center", "L2").unwrap(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(network.shared_entanglement_between("Center", "L4").unwrap(), 1.0, epsilon = 1e-12);
    assert_eq!(network.shared_entanglement_between("Center", "L1").unwrap(), 0.0);

    let center = network.node_by_name("Center").unwrap();
    assert_eq!(center.instruction_table().next_time_slot(), 2);

    network.advance_n_time_slots(1);
    assert_eq!(network.node_by_name("Center").unwrap().instruction_table().next_time_slot(), 0);
}

#[test]
fn test_amount_matches_pair_scores() {
    let config = SimulationConfig::default();
    let mut network = load_network(STAR_GENOME, config).unwrap();

    network.advance_n_time_slots(200);

    let expected: f64 = network.pairs().iter().map(|pair| config.lambda.score(network.pair_shared_entanglement(pair))).sum();
    assert_relative_eq!(network.amount_entanglement(), expected, epsilon = 1e-12);
}

#[test]
fn test_load_errors() {
    match load_network("/nonexistent/topology.json", SimulationConfig::default()) {
        Err(Error::IoError(_)) => {}
        other => panic!("expected an IoError, got {:?}", other),
    }

    match load_network(MALFORMED_SWAP, SimulationConfig::default()) {
        Err(Error::ModelConstructionError(ScheduleError::MalformedSwap { node, slot, value })) => {
            assert_eq!(node.as_str(), "A");
            assert_eq!(slot, 1);
            assert_eq!(value, "0+1");
        }
        other => panic!("expected a MalformedSwap, got {:?}", other),
    }
}
