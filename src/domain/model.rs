use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// One spreadsheet cell, independent of the file format it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Integer view of the cell. Whole floats (how Excel stores numbers) and
    /// numeric text are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            CellValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| f as i64)
                })
            }
            _ => None,
        }
    }

    /// Text view of the cell; blank cells give `None`.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            CellValue::Empty => return None,
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) if f.fract() == 0.0 && f.is_finite() => (*f as i64).to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }
}

/// A sheet as read from disk: header row plus data rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn cell<'a>(&self, row: &'a [CellValue], index: Option<usize>) -> &'a CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        index.and_then(|i| row.get(i)).unwrap_or(EMPTY)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A Markdown program description keyed by program identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDescription {
    pub program_id: i64,
    pub title: String,
    pub content: String,
    pub extra_data: String,
}

/// Everything the extract assets produce.
#[derive(Debug, Clone, Default)]
pub struct RawSources {
    pub disciplines: RawTable,
    pub programs: RawTable,
    pub descriptions: Vec<ProgramDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discipline {
    pub id: i64,
    pub name: String,
    pub name_fr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: i64,
    pub name: String,
    pub province: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub discipline_id: Option<i64>,
    pub school_id: Option<i64>,
    /// JSON string with the description metadata.
    pub extra_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProgramSection {
    pub program_id: i64,
    pub title: String,
    pub content: String,
}

/// The complete, referentially consistent contents of the warehouse after a load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarehouseSnapshot {
    pub disciplines: Vec<Discipline>,
    pub schools: Vec<School>,
    pub programs: Vec<Program>,
    pub sections: Vec<NewProgramSection>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub disciplines_count: usize,
    pub schools_count: usize,
    pub programs_count: usize,
    pub sections_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlRun {
    pub id: i64,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

// Read models served by the API and consumed by the dashboard.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineRead {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolRead {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSectionRead {
    pub id: i64,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRead {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub discipline_id: Option<i64>,
    pub school_id: Option<i64>,
    pub discipline_name: Option<String>,
    pub school_name: Option<String>,
    pub extra_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDetailRead {
    #[serde(flatten)]
    pub program: ProgramRead,
    #[serde(default)]
    pub sections: Vec<ProgramSectionRead>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    pub total_programs: i64,
    pub total_disciplines: i64,
    pub total_schools: i64,
    pub avg_sections_per_program: f64,
}

impl AnalyticsOverview {
    pub fn from_totals(programs: i64, disciplines: i64, schools: i64, sections: i64) -> Self {
        let avg_sections_per_program = if programs > 0 {
            sections as f64 / programs as f64
        } else {
            0.0
        };
        Self {
            total_programs: programs,
            total_disciplines: disciplines,
            total_schools: schools,
            avg_sections_per_program,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineCount {
    pub discipline: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolCount {
    pub school: String,
    pub count: i64,
}

/// Program listing filter; `None` fields do not restrict the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramFilter {
    pub school_id: Option<i64>,
    pub discipline_id: Option<i64>,
    pub search: Option<String>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for ProgramFilter {
    fn default() -> Self {
        Self {
            school_id: None,
            discipline_id: None,
            search: None,
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ProgramFilter {
    /// Search text to match, ignoring an empty query string.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}
