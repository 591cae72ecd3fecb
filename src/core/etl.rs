use crate::domain::model::LoadSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::time::{Duration, Instant};

/// One asset produced by a run of the load job.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMaterialization {
    pub asset: &'static str,
    pub rows: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct EtlReport {
    pub summary: LoadSummary,
    pub materializations: Vec<AssetMaterialization>,
    pub duration: Duration,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Materializes every asset in order: extract, transform, then load.
    pub async fn run(&self) -> Result<EtlReport> {
        let started = Instant::now();
        let mut materializations = Vec::with_capacity(7);
        tracing::info!("🚀 Starting load job");
        self.monitor.log_stats("Start");

        let phase = Instant::now();
        let raw = self.pipeline.extract().await?;
        let elapsed = phase.elapsed();
        for (asset, rows) in [
            ("raw_disciplines_df", raw.disciplines.len()),
            ("raw_programs_df", raw.programs.len()),
            ("program_descriptions_df", raw.descriptions.len()),
        ] {
            materializations.push(self.materialized(asset, rows, elapsed));
        }
        self.monitor.log_stats("Extract");

        let phase = Instant::now();
        let snapshot = self.pipeline.transform(raw).await?;
        let elapsed = phase.elapsed();
        for (asset, rows) in [
            ("transform_disciplines_asset", snapshot.disciplines.len()),
            ("transform_schools_asset", snapshot.schools.len()),
            ("transform_programs_asset", snapshot.programs.len()),
        ] {
            materializations.push(self.materialized(asset, rows, elapsed));
        }
        self.monitor.log_stats("Transform");

        let phase = Instant::now();
        let summary = self.pipeline.load(snapshot).await?;
        let rows = summary.disciplines_count
            + summary.schools_count
            + summary.programs_count
            + summary.sections_count;
        materializations.push(self.materialized("load_to_warehouse", rows, phase.elapsed()));
        self.monitor.log_stats("Load");

        tracing::info!(
            "📦 Loaded {} disciplines, {} schools, {} programs, {} sections",
            summary.disciplines_count,
            summary.schools_count,
            summary.programs_count,
            summary.sections_count
        );
        self.monitor.log_final_stats();

        Ok(EtlReport {
            summary,
            materializations,
            duration: started.elapsed(),
        })
    }

    fn materialized(&self, asset: &'static str, rows: usize, duration: Duration) -> AssetMaterialization {
        tracing::info!("✅ Materialized {} ({} rows, {:?})", asset, rows, duration);
        AssetMaterialization {
            asset,
            rows,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{RawSources, WarehouseSnapshot};
    use crate::utils::error::CarmsError;
    use async_trait::async_trait;

    struct StaticPipeline {
        fail_load: bool,
    }

    #[async_trait]
    impl Pipeline for StaticPipeline {
        async fn extract(&self) -> Result<RawSources> {
            Ok(RawSources::default())
        }

        async fn transform(&self, _raw: RawSources) -> Result<WarehouseSnapshot> {
            Ok(WarehouseSnapshot::default())
        }

        async fn load(&self, _snapshot: WarehouseSnapshot) -> Result<LoadSummary> {
            if self.fail_load {
                Err(CarmsError::processing("load", "warehouse unavailable"))
            } else {
                Ok(LoadSummary::default())
            }
        }
    }

    #[tokio::test]
    async fn test_run_materializes_assets_in_order() {
        let engine = EtlEngine::new(StaticPipeline { fail_load: false });
        let report = engine.run().await.unwrap();

        let assets: Vec<&str> = report.materializations.iter().map(|m| m.asset).collect();
        assert_eq!(
            assets,
            vec![
                "raw_disciplines_df",
                "raw_programs_df",
                "program_descriptions_df",
                "transform_disciplines_asset",
                "transform_schools_asset",
                "transform_programs_asset",
                "load_to_warehouse",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_propagates_load_failure() {
        let engine = EtlEngine::new(StaticPipeline { fail_load: true });
        let err = engine.run().await.unwrap_err();
        assert!(err.to_string().contains("warehouse unavailable"));
    }
}
