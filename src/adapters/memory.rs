use crate::domain::model::{
    AnalyticsOverview, Discipline, DisciplineCount, DisciplineRead, EtlRun, LoadSummary, Program,
    ProgramDetailRead, ProgramFilter, ProgramRead, ProgramSectionRead, RunStatus, School,
    SchoolCount, SchoolRead, WarehouseSnapshot,
};
use crate::domain::ports::Warehouse;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    disciplines: BTreeMap<i64, Discipline>,
    schools: BTreeMap<i64, School>,
    programs: BTreeMap<i64, Program>,
    sections: Vec<ProgramSectionRow>,
    runs: Vec<EtlRun>,
}

#[derive(Debug, Clone)]
struct ProgramSectionRow {
    id: i64,
    program_id: i64,
    title: String,
    content: String,
}

/// Warehouse kept in process memory. Used for dry runs and tests; answers
/// every query the same way the PostgreSQL warehouse does.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    tables: RwLock<Tables>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warehouse pre-populated with `snapshot`.
    pub async fn with_snapshot(snapshot: &WarehouseSnapshot) -> Result<Self> {
        let warehouse = Self::new();
        warehouse.replace_all(snapshot).await?;
        Ok(warehouse)
    }

    pub async fn runs(&self) -> Vec<EtlRun> {
        self.tables.read().await.runs.clone()
    }
}

impl Tables {
    fn program_read(&self, program: &Program) -> ProgramRead {
        ProgramRead {
            id: program.id,
            name: program.name.clone(),
            description: program.description.clone(),
            url: program.url.clone(),
            discipline_id: program.discipline_id,
            school_id: program.school_id,
            discipline_name: program
                .discipline_id
                .and_then(|id| self.disciplines.get(&id))
                .map(|d| d.name.clone()),
            school_name: program
                .school_id
                .and_then(|id| self.schools.get(&id))
                .map(|s| s.name.clone()),
            extra_data: program.extra_data.clone(),
        }
    }
}

/// Program counts per name, zero counts included, largest first then by name.
fn ranked_counts<'a>(
    names: impl Iterator<Item = (i64, &'a str)>,
    references: impl Iterator<Item = Option<i64>>,
) -> Vec<(String, i64)> {
    let mut per_id: HashMap<i64, i64> = HashMap::new();
    for id in references.flatten() {
        *per_id.entry(id).or_default() += 1;
    }

    let mut per_name: BTreeMap<&str, i64> = BTreeMap::new();
    for (id, name) in names {
        *per_name.entry(name).or_default() += per_id.get(&id).copied().unwrap_or(0);
    }

    let mut ranked: Vec<(String, i64)> = per_name
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn replace_all(&self, snapshot: &WarehouseSnapshot) -> Result<LoadSummary> {
        let mut tables = self.tables.write().await;

        tables.disciplines = snapshot
            .disciplines
            .iter()
            .map(|d| (d.id, d.clone()))
            .collect();
        tables.schools = snapshot.schools.iter().map(|s| (s.id, s.clone())).collect();
        tables.programs = snapshot.programs.iter().map(|p| (p.id, p.clone())).collect();
        // identity restarts at 1 on every load
        tables.sections = snapshot
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| ProgramSectionRow {
                id: i as i64 + 1,
                program_id: s.program_id,
                title: s.title.clone(),
                content: s.content.clone(),
            })
            .collect();

        Ok(LoadSummary {
            disciplines_count: tables.disciplines.len(),
            schools_count: tables.schools.len(),
            programs_count: tables.programs.len(),
            sections_count: tables.sections.len(),
        })
    }

    async fn record_run(&self, status: RunStatus) -> Result<()> {
        let mut tables = self.tables.write().await;
        let id = tables.runs.len() as i64 + 1;
        tables.runs.push(EtlRun {
            id,
            status: status.as_str().to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn list_disciplines(&self) -> Result<Vec<DisciplineRead>> {
        let tables = self.tables.read().await;
        Ok(tables
            .disciplines
            .values()
            .map(|d| DisciplineRead {
                id: d.id,
                name: d.name.clone(),
            })
            .collect())
    }

    async fn list_schools(&self) -> Result<Vec<SchoolRead>> {
        let tables = self.tables.read().await;
        Ok(tables
            .schools
            .values()
            .map(|s| SchoolRead {
                id: s.id,
                name: s.name.clone(),
            })
            .collect())
    }

    async fn list_programs(&self, filter: &ProgramFilter) -> Result<Vec<ProgramRead>> {
        let tables = self.tables.read().await;
        let search = filter.search_term();

        Ok(tables
            .programs
            .values()
            .filter(|p| filter.school_id.is_none() || p.school_id == filter.school_id)
            .filter(|p| filter.discipline_id.is_none() || p.discipline_id == filter.discipline_id)
            .filter(|p| search.map(|s| p.name.contains(s)).unwrap_or(true))
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .map(|p| tables.program_read(p))
            .collect())
    }

    async fn get_program(&self, program_id: i64) -> Result<Option<ProgramDetailRead>> {
        let tables = self.tables.read().await;
        let Some(program) = tables.programs.get(&program_id) else {
            return Ok(None);
        };

        let sections = tables
            .sections
            .iter()
            .filter(|s| s.program_id == program_id)
            .map(|s| ProgramSectionRead {
                id: s.id,
                title: s.title.clone(),
                content: s.content.clone(),
            })
            .collect();

        Ok(Some(ProgramDetailRead {
            program: tables.program_read(program),
            sections,
        }))
    }

    async fn overview(&self) -> Result<AnalyticsOverview> {
        let tables = self.tables.read().await;
        Ok(AnalyticsOverview::from_totals(
            tables.programs.len() as i64,
            tables.disciplines.len() as i64,
            tables.schools.len() as i64,
            tables.sections.len() as i64,
        ))
    }

    async fn counts_by_discipline(&self) -> Result<Vec<DisciplineCount>> {
        let tables = self.tables.read().await;
        let ranked = ranked_counts(
            tables.disciplines.values().map(|d| (d.id, d.name.as_str())),
            tables.programs.values().map(|p| p.discipline_id),
        );
        Ok(ranked
            .into_iter()
            .map(|(discipline, count)| DisciplineCount { discipline, count })
            .collect())
    }

    async fn counts_by_school(&self) -> Result<Vec<SchoolCount>> {
        let tables = self.tables.read().await;
        let ranked = ranked_counts(
            tables.schools.values().map(|s| (s.id, s.name.as_str())),
            tables.programs.values().map(|p| p.school_id),
        );
        Ok(ranked
            .into_iter()
            .map(|(school, count)| SchoolCount { school, count })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::NewProgramSection;

    fn program(id: i64, name: &str, discipline_id: Option<i64>, school_id: Option<i64>) -> Program {
        Program {
            id,
            name: name.to_string(),
            description: None,
            url: Some(format!("https://www.carms.ca/program/{}", id)),
            discipline_id,
            school_id,
            extra_data: None,
        }
    }

    fn snapshot() -> WarehouseSnapshot {
        WarehouseSnapshot {
            disciplines: vec![
                Discipline { id: 1, name: "Anesthesiology".to_string(), name_fr: None },
                Discipline { id: 2, name: "Family Medicine".to_string(), name_fr: None },
                Discipline { id: 3, name: "Pathology".to_string(), name_fr: None },
            ],
            schools: vec![
                School { id: 10, name: "McGill University".to_string(), province: None },
                School { id: 11, name: "University of Toronto".to_string(), province: None },
            ],
            programs: vec![
                program(100, "Family Medicine - Montreal", Some(2), Some(10)),
                program(101, "Family Medicine - Toronto", Some(2), Some(11)),
                program(102, "Anesthesiology - Toronto", Some(1), Some(11)),
            ],
            sections: vec![
                NewProgramSection { program_id: 101, title: "Overview".to_string(), content: "# Overview".to_string() },
                NewProgramSection { program_id: 101, title: "Training".to_string(), content: "## Training".to_string() },
            ],
        }
    }

    #[tokio::test]
    async fn test_list_programs_joins_names_and_filters() {
        let warehouse = MemoryWarehouse::with_snapshot(&snapshot()).await.unwrap();

        let all = warehouse.list_programs(&ProgramFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].school_name.as_deref(), Some("McGill University"));
        assert_eq!(all[0].discipline_name.as_deref(), Some("Family Medicine"));

        let toronto = ProgramFilter { school_id: Some(11), ..Default::default() };
        assert_eq!(warehouse.list_programs(&toronto).await.unwrap().len(), 2);

        let search = ProgramFilter { search: Some("Family".to_string()), ..Default::default() };
        assert_eq!(warehouse.list_programs(&search).await.unwrap().len(), 2);

        let case_sensitive = ProgramFilter { search: Some("family".to_string()), ..Default::default() };
        assert!(warehouse.list_programs(&case_sensitive).await.unwrap().is_empty());

        let page = ProgramFilter { offset: 1, limit: 1, ..Default::default() };
        let page = warehouse.list_programs(&page).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, 101);
    }

    #[tokio::test]
    async fn test_get_program_with_sections() {
        let warehouse = MemoryWarehouse::with_snapshot(&snapshot()).await.unwrap();

        let detail = warehouse.get_program(101).await.unwrap().unwrap();
        assert_eq!(detail.sections.len(), 2);
        assert_eq!(detail.sections[0].id, 1);
        assert_eq!(detail.sections[1].title, "Training");

        assert!(warehouse.get_program(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counts_include_zero_and_sort_descending() {
        let warehouse = MemoryWarehouse::with_snapshot(&snapshot()).await.unwrap();

        let counts = warehouse.counts_by_discipline().await.unwrap();
        assert_eq!(
            counts,
            vec![
                DisciplineCount { discipline: "Family Medicine".to_string(), count: 2 },
                DisciplineCount { discipline: "Anesthesiology".to_string(), count: 1 },
                DisciplineCount { discipline: "Pathology".to_string(), count: 0 },
            ]
        );

        let schools = warehouse.counts_by_school().await.unwrap();
        assert_eq!(schools[0].school, "University of Toronto");
        assert_eq!(schools[0].count, 2);
    }

    #[tokio::test]
    async fn test_count_ties_sort_by_bytes() {
        let mut data = snapshot();
        data.schools.push(School { id: 12, name: "Université Laval".to_string(), province: None });
        data.programs = vec![
            program(100, "Family Medicine - Quebec", Some(2), Some(12)),
            program(101, "Family Medicine - Toronto", Some(2), Some(11)),
        ];
        let warehouse = MemoryWarehouse::with_snapshot(&data).await.unwrap();

        let names: Vec<String> = warehouse
            .counts_by_school()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.school)
            .collect();
        // 'y' (0x79) sorts before the UTF-8 lead byte of 'é' (0xC3)
        assert_eq!(names, ["University of Toronto", "Université Laval", "McGill University"]);
    }

    #[tokio::test]
    async fn test_replace_all_does_not_accumulate() {
        let warehouse = MemoryWarehouse::with_snapshot(&snapshot()).await.unwrap();
        let summary = warehouse.replace_all(&snapshot()).await.unwrap();

        assert_eq!(summary.programs_count, 3);
        assert_eq!(summary.sections_count, 2);
        let overview = warehouse.overview().await.unwrap();
        assert_eq!(overview.total_programs, 3);
        assert!((overview.avg_sections_per_program - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_record_run_keeps_history() {
        let warehouse = MemoryWarehouse::new();
        warehouse.record_run(RunStatus::Success).await.unwrap();
        warehouse.record_run(RunStatus::Failed).await.unwrap();

        let runs = warehouse.runs().await;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].status, "failed");
    }
}
