pub mod descriptions;
pub mod etl;
pub mod pipeline;
pub mod transform;

pub use crate::domain::model::{LoadSummary, RawSources, WarehouseSnapshot};
pub use crate::domain::ports::{Pipeline, SourceConfig, Storage, Warehouse};
pub use crate::utils::error::Result;
