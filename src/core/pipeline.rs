use crate::adapters::sheets::parse_sheet;
use crate::core::descriptions::parse_descriptions;
use crate::core::transform::{
    assemble_snapshot, transform_disciplines, transform_programs, transform_schools,
};
use crate::domain::model::{LoadSummary, ProgramDescription, RawSources, RawTable, RunStatus, WarehouseSnapshot};
use crate::domain::ports::{Pipeline, SourceConfig, Storage, Warehouse};
use crate::utils::error::Result;
use std::sync::Arc;

/// Spreadsheets and descriptions from storage into a warehouse.
pub struct ProgramPipeline<S: Storage, C: SourceConfig> {
    storage: S,
    config: C,
    warehouse: Arc<dyn Warehouse>,
}

impl<S: Storage, C: SourceConfig> ProgramPipeline<S, C> {
    pub fn new(storage: S, config: C, warehouse: Arc<dyn Warehouse>) -> Self {
        Self {
            storage,
            config,
            warehouse,
        }
    }

    async fn read_sheet(&self, file_name: &str) -> Result<RawTable> {
        let bytes = self.storage.read_file(file_name).await?;
        parse_sheet(file_name, bytes)
    }

    /// Descriptions are optional: any failure is logged and yields none.
    async fn read_descriptions(&self) -> Vec<ProgramDescription> {
        let file_name = self.config.descriptions_file();
        if !self.storage.exists(file_name).await {
            tracing::error!(
                "Error loading descriptions JSON: {} not found in {}",
                file_name,
                self.config.raw_data_dir()
            );
            return Vec::new();
        }

        let parsed = match self.storage.read_file(file_name).await {
            Ok(bytes) => parse_descriptions(&bytes),
            Err(e) => Err(e),
        };
        parsed.unwrap_or_else(|e| {
            tracing::error!("Error loading descriptions JSON: {}", e);
            Vec::new()
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: SourceConfig> Pipeline for ProgramPipeline<S, C> {
    async fn extract(&self) -> Result<RawSources> {
        tracing::debug!("Reading sources from {}", self.config.raw_data_dir());

        let disciplines = self.read_sheet(self.config.discipline_file()).await?;
        let programs = self.read_sheet(self.config.program_file()).await?;
        let descriptions = self.read_descriptions().await;

        Ok(RawSources {
            disciplines,
            programs,
            descriptions,
        })
    }

    async fn transform(&self, raw: RawSources) -> Result<WarehouseSnapshot> {
        let disciplines = transform_disciplines(&raw.disciplines)?;
        tracing::info!("🔄 transform_disciplines_asset: {} rows", disciplines.len());

        let schools = transform_schools(&raw.programs)?;
        tracing::info!("🔄 transform_schools_asset: {} rows", schools.len());

        let programs = transform_programs(&raw.programs)?;
        tracing::info!("🔄 transform_programs_asset: {} rows", programs.len());

        Ok(assemble_snapshot(
            disciplines,
            schools,
            programs,
            raw.descriptions,
        ))
    }

    async fn load(&self, snapshot: WarehouseSnapshot) -> Result<LoadSummary> {
        let loaded = match self.warehouse.ensure_schema().await {
            Ok(()) => self.warehouse.replace_all(&snapshot).await,
            Err(e) => Err(e),
        };

        let status = if loaded.is_ok() {
            RunStatus::Success
        } else {
            RunStatus::Failed
        };
        if let Err(e) = self.warehouse.record_run(status).await {
            tracing::warn!("Could not record ETL run status '{}': {}", status.as_str(), e);
        }

        loaded
    }
}
