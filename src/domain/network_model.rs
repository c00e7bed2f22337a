pub mod entanglement_interface;
pub mod instruction;
pub mod instruction_table;
pub mod network;
pub mod node;
pub mod node_pair;
pub mod time_slot;
