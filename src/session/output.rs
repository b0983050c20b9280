use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::fetch::FetchOutcome;

/// One `=== ANSWER n ===` block per chunk, numbered from 1.
pub fn render_answers(chunks: &[String]) -> String {
    render_sections("ANSWER", chunks.iter().map(String::as_str))
}

pub fn render_sources(outcomes: &[FetchOutcome]) -> String {
    render_sections("Source", outcomes.iter().map(|o| o.content.as_str()))
}

fn render_sections<'a>(label: &str, bodies: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (i, body) in bodies.enumerate() {
        out.push_str(&format!("=== {} {} ===\n", label, i + 1));
        out.push_str(body);
        out.push_str("\n\n");
    }
    out
}

pub fn write_answers(dir: &Path, started_at: i64, chunks: &[String]) -> Result<PathBuf> {
    write_file(dir, &format!("output_{}.txt", started_at), &render_answers(chunks))
}

pub fn write_sources(dir: &Path, started_at: i64, outcomes: &[FetchOutcome]) -> Result<PathBuf> {
    write_file(dir, &format!("sources_{}.txt", started_at), &render_sources(outcomes))
}

fn write_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_chunks_two_sections() {
        let chunks = vec!["First part.".to_string(), "continued.".to_string()];
        assert_eq!(
            render_answers(&chunks),
            "=== ANSWER 1 ===\nFirst part.\n\n=== ANSWER 2 ===\ncontinued.\n\n"
        );
    }

    #[test]
    fn test_write_answers_uses_timestamp() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_answers(tmp.path(), 1700000000, &["only".to_string()]).unwrap();
        assert_eq!(path.file_name().unwrap(), "output_1700000000.txt");
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "=== ANSWER 1 ===\nonly\n\n");
    }

    #[test]
    fn test_sources_keep_empty_entries() {
        let outcomes = vec![
            FetchOutcome {
                requested: "https://a.example".to_string(),
                resolved: Some("https://a.example/".to_string()),
                content: "text".to_string(),
                succeeded: true,
                used_fallback: false,
            },
            FetchOutcome {
                requested: "https://b.example".to_string(),
                resolved: None,
                content: String::new(),
                succeeded: false,
                used_fallback: false,
            },
        ];
        assert_eq!(
            render_sources(&outcomes),
            "=== Source 1 ===\ntext\n\n=== Source 2 ===\n\n\n"
        );
    }
}
