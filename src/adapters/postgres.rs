//! PostgreSQL warehouse backed by an sqlx connection pool.

use crate::domain::model::{
    AnalyticsOverview, DisciplineCount, DisciplineRead, LoadSummary, ProgramDetailRead,
    ProgramFilter, ProgramRead, ProgramSectionRead, RunStatus, SchoolCount, SchoolRead,
    WarehouseSnapshot,
};
use crate::domain::ports::Warehouse;
use crate::utils::error::Result;
use crate::utils::validation::mask_password;
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use tracing::{debug, info};

// Seven binds per row at most keeps every statement far below the 65535 bind limit.
const INSERT_CHUNK: usize = 1000;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS discipline (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        name_fr TEXT
    )"#,
    r#"CREATE INDEX IF NOT EXISTS ix_discipline_name ON discipline (name)"#,
    r#"CREATE TABLE IF NOT EXISTS school (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        province TEXT
    )"#,
    r#"CREATE INDEX IF NOT EXISTS ix_school_name ON school (name)"#,
    r#"CREATE TABLE IF NOT EXISTS program (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        url TEXT,
        discipline_id BIGINT REFERENCES discipline (id),
        school_id BIGINT REFERENCES school (id),
        extra_data TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS programsection (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        program_id BIGINT REFERENCES program (id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS etlrun (
        id BIGSERIAL PRIMARY KEY,
        status TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
];

const PROGRAM_SELECT: &str = r#"SELECT p.id, p.name, p.description, p.url, p.discipline_id, p.school_id,
        d.name AS discipline_name, s.name AS school_name, p.extra_data
    FROM program p
    LEFT JOIN discipline d ON d.id = p.discipline_id
    LEFT JOIN school s ON s.id = p.school_id"#;

// Ties sort by byte order (COLLATE "C"), the same order the in-memory warehouse uses.
const DISCIPLINE_COUNTS: &str = r#"SELECT d.name AS label, COUNT(p.id) AS count
    FROM discipline d
    LEFT JOIN program p ON p.discipline_id = d.id
    GROUP BY d.name
    ORDER BY COUNT(p.id) DESC, d.name COLLATE "C" ASC"#;

const SCHOOL_COUNTS: &str = r#"SELECT s.name AS label, COUNT(p.id) AS count
    FROM school s
    LEFT JOIN program p ON p.school_id = s.id
    GROUP BY s.name
    ORDER BY COUNT(p.id) DESC, s.name COLLATE "C" ASC"#;

#[derive(Clone, Debug)]
pub struct PgWarehouse {
    pool: PgPool,
}

impl PgWarehouse {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to warehouse at {}", mask_password(database_url));
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn count_by(&self, sql: &str) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| Ok((row.try_get("label")?, row.try_get("count")?)))
            .collect()
    }
}

/// `LIKE` pattern matching `term` literally anywhere in the value.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn program_from_row(row: &PgRow) -> std::result::Result<ProgramRead, sqlx::Error> {
    Ok(ProgramRead {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        url: row.try_get("url")?,
        discipline_id: row.try_get("discipline_id")?,
        school_id: row.try_get("school_id")?,
        discipline_name: row.try_get("discipline_name")?,
        school_name: row.try_get("school_name")?,
        extra_data: row.try_get("extra_data")?,
    })
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Warehouse schema is in place");
        Ok(())
    }

    async fn replace_all(&self, snapshot: &WarehouseSnapshot) -> Result<LoadSummary> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "TRUNCATE TABLE programsection, program, school, discipline RESTART IDENTITY CASCADE",
        )
        .execute(&mut *tx)
        .await?;

        for chunk in snapshot.disciplines.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO discipline (id, name, name_fr) ");
            qb.push_values(chunk, |mut b, d| {
                b.push_bind(d.id)
                    .push_bind(d.name.clone())
                    .push_bind(d.name_fr.clone());
            });
            qb.build().execute(&mut *tx).await?;
        }

        for chunk in snapshot.schools.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO school (id, name, province) ");
            qb.push_values(chunk, |mut b, s| {
                b.push_bind(s.id)
                    .push_bind(s.name.clone())
                    .push_bind(s.province.clone());
            });
            qb.build().execute(&mut *tx).await?;
        }

        for chunk in snapshot.programs.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO program (id, name, description, url, discipline_id, school_id, extra_data) ",
            );
            qb.push_values(chunk, |mut b, p| {
                b.push_bind(p.id)
                    .push_bind(p.name.clone())
                    .push_bind(p.description.clone())
                    .push_bind(p.url.clone())
                    .push_bind(p.discipline_id)
                    .push_bind(p.school_id)
                    .push_bind(p.extra_data.clone());
            });
            qb.build().execute(&mut *tx).await?;
        }

        for chunk in snapshot.sections.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO programsection (program_id, title, content) ");
            qb.push_values(chunk, |mut b, s| {
                b.push_bind(s.program_id)
                    .push_bind(s.title.clone())
                    .push_bind(s.content.clone());
            });
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(LoadSummary {
            disciplines_count: snapshot.disciplines.len(),
            schools_count: snapshot.schools.len(),
            programs_count: snapshot.programs.len(),
            sections_count: snapshot.sections.len(),
        })
    }

    async fn record_run(&self, status: RunStatus) -> Result<()> {
        sqlx::query("INSERT INTO etlrun (status) VALUES ($1)")
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_disciplines(&self) -> Result<Vec<DisciplineRead>> {
        let rows = sqlx::query("SELECT id, name FROM discipline ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(DisciplineRead {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn list_schools(&self) -> Result<Vec<SchoolRead>> {
        let rows = sqlx::query("SELECT id, name FROM school ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(SchoolRead {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn list_programs(&self, filter: &ProgramFilter) -> Result<Vec<ProgramRead>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(PROGRAM_SELECT);
        qb.push(" WHERE 1=1");

        if let Some(school_id) = filter.school_id {
            qb.push(" AND p.school_id = ");
            qb.push_bind(school_id);
        }
        if let Some(discipline_id) = filter.discipline_id {
            qb.push(" AND p.discipline_id = ");
            qb.push_bind(discipline_id);
        }
        if let Some(search) = filter.search_term() {
            qb.push(" AND p.name LIKE ");
            qb.push_bind(like_pattern(search));
        }

        qb.push(" ORDER BY p.id OFFSET ");
        qb.push_bind(filter.offset);
        qb.push(" LIMIT ");
        qb.push_bind(filter.limit);

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(program_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn get_program(&self, program_id: i64) -> Result<Option<ProgramDetailRead>> {
        let sql = format!("{} WHERE p.id = $1", PROGRAM_SELECT);
        let Some(row) = sqlx::query(&sql)
            .bind(program_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let program = program_from_row(&row)?;

        let section_rows = sqlx::query(
            "SELECT id, title, content FROM programsection WHERE program_id = $1 ORDER BY id",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;

        let sections = section_rows
            .iter()
            .map(|row| {
                Ok(ProgramSectionRead {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    content: row.try_get("content")?,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        Ok(Some(ProgramDetailRead { program, sections }))
    }

    async fn overview(&self) -> Result<AnalyticsOverview> {
        let row = sqlx::query(
            r#"SELECT
                (SELECT COUNT(*) FROM program) AS programs,
                (SELECT COUNT(*) FROM discipline) AS disciplines,
                (SELECT COUNT(*) FROM school) AS schools,
                (SELECT COUNT(*) FROM programsection) AS sections"#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AnalyticsOverview::from_totals(
            row.try_get("programs")?,
            row.try_get("disciplines")?,
            row.try_get("schools")?,
            row.try_get("sections")?,
        ))
    }

    async fn counts_by_discipline(&self) -> Result<Vec<DisciplineCount>> {
        let counts = self
            .count_by(DISCIPLINE_COUNTS)
            .await?;
        Ok(counts
            .into_iter()
            .map(|(discipline, count)| DisciplineCount { discipline, count })
            .collect())
    }

    async fn counts_by_school(&self) -> Result<Vec<SchoolCount>> {
        let counts = self
            .count_by(SCHOOL_COUNTS)
            .await?;
        Ok(counts
            .into_iter()
            .map(|(school, count)| SchoolCount { school, count })
            .collect())
    }
}
