#![allow(dead_code)]

use carms_platform::Settings;
use std::path::Path;
use tempfile::TempDir;

pub const DISCIPLINES_CSV: &str = "\
discipline_id,discipline,discipline_fr
1,Anesthesiology,Anesthésiologie
2,Family Medicine,Médecine familiale
3,Pathology,Pathologie
";

pub const PROGRAMS_CSV: &str = "\
program_stream_id,program_name,program_url,school_id,school_name,discipline_id
27447,Anesthesiology - Toronto,https://www.carms.ca/program/27447,11,University of Toronto,1
27448,Family Medicine - Toronto,https://www.carms.ca/program/27448,11,University of Toronto,2
27449,Family Medicine - Montreal,,10,McGill University,2
27450,Orphan Program - Halifax,,12,Dalhousie University,99
,Missing id,,12,Dalhousie University,1
";

pub const DESCRIPTIONS_JSON: &str = r##"[
  {"page_content": "# Program Overview\nFour year **program** in Toronto.", "metadata": {"source": "https://www.carms.ca/match/1503/27447"}},
  {"page_content": "# Rotations\n<script>alert(1)</script>", "metadata": {"source": "https://www.carms.ca/match/1503/27447"}},
  {"page_content": "# Overview\nCommunity based training.", "metadata": {"source": "https://www.carms.ca/match/1503/27448"}},
  {"page_content": "# Unknown\nNo such program.", "metadata": {"source": "https://www.carms.ca/match/1503/55555"}}
]"##;

/// Writes the CSV fixtures into `dir` and returns settings pointing at them.
pub fn write_sources(dir: &Path, with_descriptions: bool) -> Settings {
    std::fs::write(dir.join("1503_discipline.csv"), DISCIPLINES_CSV).unwrap();
    std::fs::write(dir.join("1503_program_master.csv"), PROGRAMS_CSV).unwrap();
    if with_descriptions {
        std::fs::write(
            dir.join("1503_markdown_program_descriptions.json"),
            DESCRIPTIONS_JSON,
        )
        .unwrap();
    }

    Settings {
        raw_data_dir: dir.to_str().unwrap().to_string(),
        discipline_file: "1503_discipline.csv".to_string(),
        program_file: "1503_program_master.csv".to_string(),
        ..Settings::default()
    }
}

pub fn source_dir() -> TempDir {
    TempDir::new().unwrap()
}
