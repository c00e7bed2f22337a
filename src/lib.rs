use crate::api::network_dto::NetworkDto;
use crate::config::SimulationConfig;
use crate::domain::network_model::network::Network;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads a topology or checkpointed genome descriptor and builds the network it describes.
pub fn load_network(file_path: &str, config: SimulationConfig) -> Result<Network> {
    let root_dto: NetworkDto = parse_json_file::<NetworkDto>(file_path)?;
    log::info!("Descriptor '{}' parsed successfully.", file_path);

    let network = Network::from_dto(&root_dto, config)?;
    log::info!("Network with {} nodes and {} node pairs constructed successfully.", network.nodes().len(), network.pairs().len());

    Ok(network)
}
