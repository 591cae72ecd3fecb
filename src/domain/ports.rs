use crate::domain::model::{
    AnalyticsOverview, DisciplineCount, DisciplineRead, LoadSummary, ProgramDetailRead,
    ProgramFilter, ProgramRead, RawSources, RunStatus, SchoolCount, SchoolRead,
    WarehouseSnapshot,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// Where the load job finds its three source files.
pub trait SourceConfig: Send + Sync {
    fn raw_data_dir(&self) -> &str;
    fn discipline_file(&self) -> &str;
    fn program_file(&self) -> &str;
    fn descriptions_file(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawSources>;
    async fn transform(&self, raw: RawSources) -> Result<WarehouseSnapshot>;
    async fn load(&self, snapshot: WarehouseSnapshot) -> Result<LoadSummary>;
}

/// The relational store behind the load job, the API and the dashboard.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Creates missing tables; existing data is untouched.
    async fn ensure_schema(&self) -> Result<()>;

    /// Replaces all program data with `snapshot` atomically.
    async fn replace_all(&self, snapshot: &WarehouseSnapshot) -> Result<LoadSummary>;

    async fn record_run(&self, status: RunStatus) -> Result<()>;

    async fn list_disciplines(&self) -> Result<Vec<DisciplineRead>>;
    async fn list_schools(&self) -> Result<Vec<SchoolRead>>;
    async fn list_programs(&self, filter: &ProgramFilter) -> Result<Vec<ProgramRead>>;
    async fn get_program(&self, program_id: i64) -> Result<Option<ProgramDetailRead>>;

    async fn overview(&self) -> Result<AnalyticsOverview>;
    async fn counts_by_discipline(&self) -> Result<Vec<DisciplineCount>>;
    async fn counts_by_school(&self) -> Result<Vec<SchoolCount>>;
}
