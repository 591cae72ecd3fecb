use crate::domain::model::{
    Discipline, NewProgramSection, Program, ProgramDescription, RawTable, School,
    WarehouseSnapshot,
};
use crate::utils::error::{CarmsError, Result};
use std::collections::{HashMap, HashSet};

fn require_column(raw: &RawTable, column: &str) -> Result<usize> {
    raw.column_index(column).ok_or_else(|| CarmsError::SchemaError {
        source_name: raw.source.clone(),
        column: column.to_string(),
    })
}

/// `discipline_id` → `id`, `discipline` → `name`.
pub fn transform_disciplines(raw: &RawTable) -> Result<Vec<Discipline>> {
    let id_col = require_column(raw, "discipline_id")?;
    let name_col = require_column(raw, "discipline")?;

    let mut seen = HashSet::new();
    let mut disciplines = Vec::with_capacity(raw.len());

    for (line, row) in raw.rows.iter().enumerate() {
        let Some(id) = raw.cell(row, Some(id_col)).as_i64() else {
            tracing::warn!("{} row {}: skipping discipline without a numeric id", raw.source, line + 2);
            continue;
        };
        let Some(name) = raw.cell(row, Some(name_col)).as_text() else {
            tracing::warn!("{} row {}: skipping discipline {} without a name", raw.source, line + 2, id);
            continue;
        };
        if !seen.insert(id) {
            tracing::warn!("{}: duplicate discipline id {}, keeping the first", raw.source, id);
            continue;
        }
        disciplines.push(Discipline {
            id,
            name,
            name_fr: None,
        });
    }

    Ok(disciplines)
}

/// Distinct schools referenced by the program master.
pub fn transform_schools(raw: &RawTable) -> Result<Vec<School>> {
    let id_col = require_column(raw, "school_id")?;
    let name_col = require_column(raw, "school_name")?;

    let mut names: HashMap<i64, String> = HashMap::new();
    let mut schools = Vec::new();

    for row in &raw.rows {
        let (Some(id), Some(name)) = (
            raw.cell(row, Some(id_col)).as_i64(),
            raw.cell(row, Some(name_col)).as_text(),
        ) else {
            continue;
        };

        match names.get(&id) {
            None => {
                names.insert(id, name.clone());
                schools.push(School {
                    id,
                    name,
                    province: None,
                });
            }
            Some(existing) if *existing != name => {
                tracing::warn!(
                    "School {} appears as both '{}' and '{}', keeping the first",
                    id,
                    existing,
                    name
                );
            }
            Some(_) => {}
        }
    }

    Ok(schools)
}

/// `program_stream_id` → `id`, `program_name` → `name`, `program_url` → `url`;
/// `school_id` and `discipline_id` pass through. Absent optional columns become null.
pub fn transform_programs(raw: &RawTable) -> Result<Vec<Program>> {
    let id_col = require_column(raw, "program_stream_id")?;
    let name_col = require_column(raw, "program_name")?;
    let url_col = raw.column_index("program_url");
    let school_col = raw.column_index("school_id");
    let discipline_col = raw.column_index("discipline_id");

    for (column, index) in [
        ("program_url", url_col),
        ("school_id", school_col),
        ("discipline_id", discipline_col),
    ] {
        if index.is_none() {
            tracing::warn!("{} has no '{}' column, loading it as null", raw.source, column);
        }
    }

    let mut seen = HashSet::new();
    let mut programs = Vec::with_capacity(raw.len());

    for (line, row) in raw.rows.iter().enumerate() {
        let Some(id) = raw.cell(row, Some(id_col)).as_i64() else {
            tracing::warn!("{} row {}: skipping program without a numeric stream id", raw.source, line + 2);
            continue;
        };
        let Some(name) = raw.cell(row, Some(name_col)).as_text() else {
            tracing::warn!("{} row {}: skipping program {} without a name", raw.source, line + 2, id);
            continue;
        };
        if !seen.insert(id) {
            tracing::warn!("{}: duplicate program stream id {}, keeping the first", raw.source, id);
            continue;
        }

        programs.push(Program {
            id,
            name,
            description: None,
            url: raw.cell(row, url_col).as_text(),
            discipline_id: raw.cell(row, discipline_col).as_i64(),
            school_id: raw.cell(row, school_col).as_i64(),
            extra_data: None,
        });
    }

    Ok(programs)
}

/// Builds the warehouse contents with referential integrity enforced:
/// dangling discipline/school references are nulled, sections of unknown
/// programs dropped, and each program's `extra_data` set from its last description.
pub fn assemble_snapshot(
    disciplines: Vec<Discipline>,
    schools: Vec<School>,
    mut programs: Vec<Program>,
    descriptions: Vec<ProgramDescription>,
) -> WarehouseSnapshot {
    let discipline_ids: HashSet<i64> = disciplines.iter().map(|d| d.id).collect();
    let school_ids: HashSet<i64> = schools.iter().map(|s| s.id).collect();

    let mut dangling_disciplines = 0usize;
    let mut dangling_schools = 0usize;
    for program in &mut programs {
        if let Some(id) = program.discipline_id {
            if !discipline_ids.contains(&id) {
                tracing::debug!("Program {} references unknown discipline {}", program.id, id);
                program.discipline_id = None;
                dangling_disciplines += 1;
            }
        }
        if let Some(id) = program.school_id {
            if !school_ids.contains(&id) {
                tracing::debug!("Program {} references unknown school {}", program.id, id);
                program.school_id = None;
                dangling_schools += 1;
            }
        }
    }
    if dangling_disciplines + dangling_schools > 0 {
        tracing::warn!(
            "Cleared {} unknown discipline and {} unknown school reference(s)",
            dangling_disciplines,
            dangling_schools
        );
    }

    let positions: HashMap<i64, usize> = programs
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();

    let mut sections = Vec::with_capacity(descriptions.len());
    let mut orphaned = 0usize;
    for description in descriptions {
        let Some(&position) = positions.get(&description.program_id) else {
            orphaned += 1;
            continue;
        };
        programs[position].extra_data = Some(description.extra_data);
        sections.push(NewProgramSection {
            program_id: description.program_id,
            title: description.title,
            content: description.content,
        });
    }
    if orphaned > 0 {
        tracing::warn!("Dropped {} description(s) for unknown programs", orphaned);
    }

    WarehouseSnapshot {
        disciplines,
        schools,
        programs,
        sections,
    }
}
