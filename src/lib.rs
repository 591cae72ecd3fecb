pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod domain;
pub mod utils;

pub use adapters::{LocalStorage, MemoryWarehouse, PgWarehouse};
pub use config::Settings;
pub use core::{etl::EtlEngine, pipeline::ProgramPipeline};
pub use utils::error::{CarmsError, Result};
