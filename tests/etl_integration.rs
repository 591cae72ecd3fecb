mod common;

use carms_platform::domain::model::{ProgramFilter, RunStatus};
use carms_platform::domain::ports::Warehouse;
use carms_platform::utils::error::CarmsError;
use carms_platform::{EtlEngine, LocalStorage, MemoryWarehouse, ProgramPipeline, Settings};
use std::sync::Arc;

fn engine(
    settings: &Settings,
    warehouse: Arc<MemoryWarehouse>,
) -> EtlEngine<ProgramPipeline<LocalStorage, Settings>> {
    let storage = LocalStorage::new(settings.raw_data_dir.clone());
    EtlEngine::new(ProgramPipeline::new(storage, settings.clone(), warehouse))
}

#[tokio::test]
async fn test_end_to_end_load_from_csv_sources() {
    let dir = common::source_dir();
    let settings = common::write_sources(dir.path(), true);
    let warehouse = Arc::new(MemoryWarehouse::new());

    let report = engine(&settings, warehouse.clone()).run().await.unwrap();

    assert_eq!(report.summary.disciplines_count, 3);
    assert_eq!(report.summary.schools_count, 3);
    assert_eq!(report.summary.programs_count, 4);
    assert_eq!(report.summary.sections_count, 3);

    let assets: Vec<&str> = report.materializations.iter().map(|m| m.asset).collect();
    assert_eq!(
        assets,
        [
            "raw_disciplines_df",
            "raw_programs_df",
            "program_descriptions_df",
            "transform_disciplines_asset",
            "transform_schools_asset",
            "transform_programs_asset",
            "load_to_warehouse",
        ]
    );

    // unknown discipline 99 is nulled, not rejected
    let orphan = warehouse.get_program(27450).await.unwrap().unwrap();
    assert_eq!(orphan.program.discipline_id, None);
    assert_eq!(orphan.program.school_name.as_deref(), Some("Dalhousie University"));

    let detail = warehouse.get_program(27447).await.unwrap().unwrap();
    let titles: Vec<&str> = detail.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Program Overview", "Rotations"]);
    assert!(detail.program.extra_data.unwrap().contains("27447"));

    let runs = warehouse.runs().await;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Success.as_str());
}

#[tokio::test]
async fn test_rerun_replaces_instead_of_duplicating() {
    let dir = common::source_dir();
    let settings = common::write_sources(dir.path(), true);
    let warehouse = Arc::new(MemoryWarehouse::new());

    engine(&settings, warehouse.clone()).run().await.unwrap();
    engine(&settings, warehouse.clone()).run().await.unwrap();

    let overview = warehouse.overview().await.unwrap();
    assert_eq!(overview.total_programs, 4);
    assert_eq!(overview.total_disciplines, 3);
    assert_eq!(overview.total_schools, 3);
    assert_eq!(overview.avg_sections_per_program, 0.75);

    let programs = warehouse.list_programs(&ProgramFilter::default()).await.unwrap();
    assert_eq!(programs.len(), 4);
    assert_eq!(warehouse.runs().await.len(), 2);
}

#[tokio::test]
async fn test_missing_descriptions_still_loads_programs() {
    let dir = common::source_dir();
    let settings = common::write_sources(dir.path(), false);
    let warehouse = Arc::new(MemoryWarehouse::new());

    let report = engine(&settings, warehouse.clone()).run().await;
    tokio_test::assert_ok!(&report);

    let summary = report.unwrap().summary;
    assert_eq!(summary.programs_count, 4);
    assert_eq!(summary.sections_count, 0);
    assert_eq!(warehouse.overview().await.unwrap().avg_sections_per_program, 0.0);
}

#[tokio::test]
async fn test_missing_spreadsheet_fails_before_loading() {
    let dir = common::source_dir();
    let mut settings = common::write_sources(dir.path(), true);
    settings.program_file = "absent.csv".to_string();
    let warehouse = Arc::new(MemoryWarehouse::new());

    let err = engine(&settings, warehouse.clone()).run().await.unwrap_err();

    assert!(matches!(err, CarmsError::IoError(_)));
    assert!(err.to_string().contains("absent.csv"));
    assert!(warehouse.runs().await.is_empty());
}

#[tokio::test]
async fn test_missing_required_column_is_a_schema_error() {
    let dir = common::source_dir();
    let settings = common::write_sources(dir.path(), false);
    std::fs::write(
        dir.path().join("1503_discipline.csv"),
        "id,discipline\n1,Anesthesiology\n",
    )
    .unwrap();

    let err = engine(&settings, Arc::new(MemoryWarehouse::new()))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, CarmsError::SchemaError { ref column, .. } if column == "discipline_id"));
}
