pub mod graph_transport;
pub mod marketing_api;
