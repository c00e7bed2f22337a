pub mod genome;
pub mod network_model;
pub mod report;
pub mod utils;
