use thiserror::Error;

use crate::domain::utils::id::NodeName;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse network descriptor JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write generation report: {0}")]
    ReportError(#[from] csv::Error),

    #[error("Failed to build network model: {0}")]
    ModelConstructionError(#[from] ScheduleError),
}

/// Structured construction errors of the network model.
///
/// Every variant names the node (and where applicable the interface, time slot or
/// link key) that made the construction fail, so a broken descriptor can be fixed
/// without bisecting it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("The network descriptor contains no nodes.")]
    EmptyTopology,

    #[error("Node {0} is referenced but not part of the topology.")]
    UnknownNode(String),

    #[error("Interface {interface} of node {node} is out of range (node has {count} interfaces).")]
    InterfaceOutOfRange { node: NodeName, interface: usize, count: usize },

    #[error("Interface {interface} used in a time slot of node {node} belongs to another node.")]
    ForeignInterface { node: NodeName, interface: usize },

    #[error("Interface {interface} of node {node} is assigned more than once in a time slot.")]
    DuplicateInterface { node: NodeName, interface: usize },

    #[error("Interface {interface} of node {node} is neither swapped nor stored in a time slot.")]
    UnassignedInterface { node: NodeName, interface: usize },

    #[error("Time slot {slot} of node {node} contains malformed swap instruction '{value}'.")]
    MalformedSwap { node: NodeName, slot: usize, value: String },

    #[error("Time slot {slot} of node {node} is invalid: {source}")]
    InvalidTimeSlot {
        node: NodeName,
        slot: usize,
        #[source]
        source: Box<ScheduleError>,
    },

    #[error("Node {node} has fewer than 2 interfaces and cannot hold swap instructions.")]
    SwapWithoutInterfaces { node: NodeName },

    #[error("Link '{link}' has malformed interfaces '{value}'.")]
    MalformedLink { link: String, value: String },

    #[error("Link '{link}' connects a node with itself.")]
    SelfLink { link: String },

    #[error("Link '{link}' joins two nodes that are already linked; the descriptor holds one link per node pair.")]
    DuplicateLink { link: String },

    #[error("Interface {interface} of node {node} is already wired to another interface.")]
    InterfaceAlreadyLinked { node: NodeName, interface: usize },

    #[error("Parameter {parameter} of node {node} has invalid value {value}.")]
    InvalidParameter { node: NodeName, parameter: &'static str, value: f64 },

    #[error("Parents disagree on the topology of node {node}.")]
    IncompatibleParents { node: NodeName },
}

pub type Result<T> = std::result::Result<T, Error>;
