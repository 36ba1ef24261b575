//! Experience log files
//!
//! One JSON-encoded experience per line. Blank lines are skipped.

use crate::experience::{Experience, ExperienceStore};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read every experience from a JSON-lines file
pub fn read_experience_log(path: &Path) -> Result<Vec<Experience>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read experience log {}", path.display()))?;

    parse_experience_log(&contents)
}

/// Parse JSON-lines text into experiences
pub fn parse_experience_log(contents: &str) -> Result<Vec<Experience>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str::<Experience>(line)
                .with_context(|| format!("Invalid experience on line {}", number + 1))
        })
        .collect()
}

/// Record experiences into a store, returning how many were accepted
pub async fn replay_into(store: &ExperienceStore, experiences: &[Experience]) -> Result<usize> {
    for experience in experiences {
        store
            .record(experience)
            .await
            .with_context(|| format!("Failed to record experience {}", experience.id))?;
    }
    debug!(count = experiences.len(), "experience log replayed");
    Ok(experiences.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experience::{ExperienceFilters, InMemorySemanticStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn line(exp: &Experience) -> String {
        serde_json::to_string(exp).unwrap()
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let a = Experience::new("compute 2+2").with_tool("math_calculate");
        let b = Experience::new("read notes").failed("io_error", "file not found");
        let text = format!("{}\n\n{}\n", line(&a), line(&b));

        let parsed = parse_experience_log(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, a.id);
        assert!(!parsed[1].success);
    }

    #[test]
    fn test_parse_minimal_record() {
        let text = r#"{"id":"e1","timestamp":"2024-01-01T00:00:00Z","query":"q","success":false}"#;
        let parsed = parse_experience_log(text).unwrap();
        assert_eq!(parsed[0].id, "e1");
        assert!(parsed[0].tool_called.is_none());
    }

    #[test]
    fn test_parse_reports_line_number() {
        let good = line(&Experience::new("q"));
        let text = format!("{}\nnot json\n", good);
        let err = parse_experience_log(&text).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_read_and_replay() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        let exp = Experience::new("compute 2+2")
            .with_intent("calculation")
            .with_tool("math_calculate");
        fs::write(&path, line(&exp)).unwrap();

        let experiences = read_experience_log(&path).unwrap();
        let store = ExperienceStore::new(Arc::new(InMemorySemanticStore::new()));
        assert_eq!(replay_into(&store, &experiences).await.unwrap(), 1);

        let found = store
            .query(&ExperienceFilters::new("compute 2+2"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(read_experience_log(Path::new("/nonexistent/log.jsonl")).is_err());
    }
}
