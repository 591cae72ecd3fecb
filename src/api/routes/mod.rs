pub mod analytics;
pub mod programs;
