use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, Lines};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct ExampleQuestions {
    example_inputs: Vec<String>,
}

/// Interpret user input as a literal question, or as an index into the
/// example-question file when it parses as an integer.
pub fn resolve_question(input: &str, examples_path: &Path) -> Result<String> {
    let trimmed = input.trim();
    let Ok(index) = trimmed.parse::<i64>() else {
        if trimmed.is_empty() {
            bail!("No question given");
        }
        return Ok(trimmed.to_string());
    };

    let raw = std::fs::read_to_string(examples_path).with_context(|| {
        format!("Example question file {} is missing", examples_path.display())
    })?;
    let examples: ExampleQuestions = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed example question file {}", examples_path.display()))?;

    usize::try_from(index)
        .ok()
        .and_then(|i| examples.example_inputs.get(i))
        .cloned()
        .with_context(|| {
            format!(
                "Question index {} does not exist ({} example questions)",
                index,
                examples.example_inputs.len()
            )
        })
}

/// Prompt until a non-blank line arrives, then resolve it. Blank lines are
/// asked again; only a closed input stream gives up.
pub async fn prompt_question<R, W>(
    input: &mut Lines<R>,
    out: &mut W,
    examples_path: &Path,
) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        write!(
            out,
            "\ntype in your question (a number looks up that index in {}): ",
            examples_path.display()
        )?;
        out.flush()?;
        let Some(line) = input.next_line().await.context("Failed to read question")? else {
            bail!("Input closed before a question was given");
        };
        if line.trim().is_empty() {
            warn!("Empty question, asking again");
            continue;
        }
        return resolve_question(&line, examples_path);
    }
}
