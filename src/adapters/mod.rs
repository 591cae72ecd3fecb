// Adapters layer: concrete implementations of the domain ports.

pub mod memory;
pub mod postgres;
pub mod sheets;
pub mod storage;

pub use memory::MemoryWarehouse;
pub use postgres::PgWarehouse;
pub use storage::LocalStorage;
