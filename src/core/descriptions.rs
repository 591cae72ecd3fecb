//! Markdown program descriptions.
//!
//! The source is a JSON array of documents shaped like
//! `{"page_content": "# Title\n...", "metadata": {"source": "https://.../1503/27447"}}`.
//! The program identifier is recovered from the `source` URL.

use crate::domain::model::ProgramDescription;
use crate::utils::error::Result;
use serde_json::Value;

/// Program id encoded in a description source URL: the last path segment if
/// it is numeric, otherwise the one before it. Query strings are ignored.
pub fn program_id_from_source(source: &str) -> Option<i64> {
    let path = source.split('?').next().unwrap_or_default();
    let parts: Vec<&str> = path.split('/').collect();

    let numeric = |s: &&str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let candidate = match parts.as_slice() {
        [.., last] if numeric(last) => last,
        [.., second_last, _] if numeric(second_last) => second_last,
        _ => return None,
    };
    candidate.parse().ok()
}

/// First line of the Markdown with heading markers removed.
pub fn title_from_content(content: &str) -> String {
    content
        .split('\n')
        .next()
        .unwrap_or_default()
        .replace('#', "")
        .trim()
        .to_string()
}

/// Decodes the descriptions document. Items without a usable program id are skipped.
pub fn parse_descriptions(bytes: &[u8]) -> Result<Vec<ProgramDescription>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let items: Vec<Value> = serde_json::from_slice(bytes)?;

    let mut descriptions = Vec::with_capacity(items.len());
    let mut skipped = 0usize;

    for item in &items {
        match description_from_item(item) {
            Some(description) => descriptions.push(description),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} description(s) without a program id", skipped);
    }
    Ok(descriptions)
}

fn description_from_item(item: &Value) -> Option<ProgramDescription> {
    let content = match item.get("page_content") {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return None,
    };

    let metadata = match item.get("metadata") {
        None => Value::Object(Default::default()),
        Some(m @ Value::Object(_)) => m.clone(),
        Some(_) => return None,
    };

    let source = metadata
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let program_id = program_id_from_source(source)?;

    Some(ProgramDescription {
        program_id,
        title: title_from_content(&content),
        content,
        extra_data: metadata.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_id_from_last_segment() {
        assert_eq!(
            program_id_from_source("https://www.carms.ca/match/1503/27447"),
            Some(27447)
        );
    }

    #[test]
    fn test_program_id_from_second_last_segment_and_query() {
        assert_eq!(
            program_id_from_source("https://www.carms.ca/program/27447/details?lang=fr"),
            Some(27447)
        );
        assert_eq!(
            program_id_from_source("https://www.carms.ca/program/27447/?x=1"),
            Some(27447)
        );
    }

    #[test]
    fn test_program_id_missing() {
        assert_eq!(program_id_from_source(""), None);
        assert_eq!(program_id_from_source("https://www.carms.ca/program/about"), None);
        assert_eq!(program_id_from_source("27447a"), None);
    }

    #[test]
    fn test_title_strips_heading_markers() {
        assert_eq!(title_from_content("## Family Medicine #1\nbody"), "Family Medicine 1");
        assert_eq!(title_from_content(""), "");
    }

    #[test]
    fn test_parse_descriptions_document() {
        let json = serde_json::json!([
            {
                "page_content": "# Anesthesiology - Halifax\nProgram overview",
                "metadata": {"source": "https://www.carms.ca/match/1503/100", "lang": "en"}
            },
            {
                "page_content": "# No id here",
                "metadata": {"source": "https://www.carms.ca/about"}
            },
            {
                "page_content": null,
                "metadata": {"source": "https://www.carms.ca/match/1503/101"}
            },
            {
                "metadata": {"source": "https://www.carms.ca/match/1503/102"}
            }
        ]);
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend(serde_json::to_vec(&json).unwrap());

        let descriptions = parse_descriptions(&bytes).unwrap();
        assert_eq!(descriptions.len(), 2);

        assert_eq!(descriptions[0].program_id, 100);
        assert_eq!(descriptions[0].title, "Anesthesiology - Halifax");
        let meta: Value = serde_json::from_str(&descriptions[0].extra_data).unwrap();
        assert_eq!(meta["lang"], "en");

        assert_eq!(descriptions[1].program_id, 102);
        assert_eq!(descriptions[1].content, "");
    }

    #[test]
    fn test_extra_data_keeps_metadata_key_order() {
        let doc = br##"[{"page_content": "# Pathology", "metadata": {"source": "https://www.carms.ca/match/1503/7", "title": "Pathology", "lang": "en", "app": "carms"}}]"##;

        let descriptions = parse_descriptions(doc).unwrap();
        assert_eq!(
            descriptions[0].extra_data,
            r#"{"source":"https://www.carms.ca/match/1503/7","title":"Pathology","lang":"en","app":"carms"}"#
        );
    }

    #[test]
    fn test_parse_descriptions_rejects_non_array() {
        assert!(parse_descriptions(b"{\"page_content\": \"x\"}").is_err());
    }
}
