mod answer;
mod fetch;
mod llm;
mod prompts;
mod session;
mod sources;
mod state;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};

use fetch::browser::ChromeLauncher;
use llm::LlmClient;
use session::ResearchSession;
use state::ResearchConfig;

/// Research a question: ask the model for sources, scrape them, answer from what was read.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Question text, or an index into the example question file. Prompted for when absent.
    #[arg(long, env = "SCOUT_QUESTION")]
    question: Option<String>,

    /// Example question file (`{"example_inputs": [...]}`).
    #[arg(long, env = "SCOUT_EXAMPLES", default_value = "example_questions.json")]
    examples: PathBuf,

    /// Memoized question → URL cache.
    #[arg(long, env = "SCOUT_CACHE", default_value = "memoize.json")]
    cache: PathBuf,

    /// Always ask the model for sources, ignoring and not updating the cache.
    #[arg(long)]
    no_cache: bool,

    /// Directory for output_<ts>.txt.
    #[arg(long, env = "SCOUT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Also write the scraped page texts to sources_<ts>.txt.
    #[arg(long)]
    dump_sources: bool,

    /// Show the browser window.
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load env before clap reads env-backed flags.
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    let level = dotenv::var("LOG_LEVEL")
        .ok()
        .and_then(|l| Level::from_str(&l).ok())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let llm = Arc::new(LlmClient::from_env()?);
    info!(model = llm.model(), "LLM client initialized");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let question = match cli.question.filter(|q| !q.trim().is_empty()) {
        Some(q) => session::questions::resolve_question(&q, &cli.examples)?,
        None => {
            session::questions::prompt_question(&mut stdin, &mut std::io::stdout(), &cli.examples)
                .await?
        }
    };
    println!("using the following question: {}", question);

    let config = ResearchConfig {
        use_cache: !cli.no_cache,
        cache_path: cli.cache,
        output_dir: cli.output_dir,
        dump_sources: cli.dump_sources,
        ..ResearchConfig::from_env()
    };
    let launcher = ChromeLauncher::from_env(!cli.headed);
    let session = ResearchSession::new(config, llm);

    let report = session
        .run(&question, &launcher, &mut stdin, &mut std::io::stdout())
        .await?;
    let scraped = report.sources.iter().filter(|s| s.succeeded).count();
    println!(
        "Saved {} answer(s) from {}/{} scraped source(s) to {}",
        report.chunks.len(),
        scraped,
        report.sources.len(),
        report.output_path.display()
    );

    Ok(())
}
