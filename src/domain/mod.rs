// Domain layer: record models and ports (source, store, config).

pub mod model;
pub mod ports;
