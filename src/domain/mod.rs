// Domain layer: warehouse models and ports. Adapters under src/adapters implement the ports.

pub mod model;
pub mod ports;
