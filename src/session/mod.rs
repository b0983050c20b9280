pub mod output;
pub mod questions;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, Lines};
use tracing::{debug, info, warn};

use crate::answer::{Conversation, Synthesizer};
use crate::fetch::browser::{BrowserLauncher, PageDriver};
use crate::fetch::{FetchOutcome, PageFetcher};
use crate::llm::ChatBackend;
use crate::sources::UrlProposer;
use crate::state::ResearchConfig;

/// User-driven continuation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationState {
    AwaitingConfirmation,
    Continuing,
    Done,
}

impl ContinuationState {
    /// Apply the user's reply; `None` means input was closed.
    pub fn on_reply(self, reply: Option<&str>) -> Self {
        match self {
            ContinuationState::AwaitingConfirmation => match reply.map(str::trim) {
                Some(r) if r.eq_ignore_ascii_case("y") || r.eq_ignore_ascii_case("yes") => {
                    ContinuationState::Continuing
                }
                _ => ContinuationState::Done,
            },
            other => other,
        }
    }

    /// A continuation chunk arrived.
    pub fn on_chunk(self) -> Self {
        match self {
            ContinuationState::Continuing => ContinuationState::AwaitingConfirmation,
            other => other,
        }
    }
}

/// Newline-joined page texts, empty pages included.
pub fn build_context(outcomes: &[FetchOutcome]) -> String {
    outcomes
        .iter()
        .map(|o| o.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug)]
pub struct SessionReport {
    pub chunks: Vec<String>,
    pub sources: Vec<FetchOutcome>,
    pub output_path: PathBuf,
}

pub struct ResearchSession {
    config: ResearchConfig,
    proposer: UrlProposer,
    fetcher: PageFetcher,
    synthesizer: Synthesizer,
}

impl ResearchSession {
    pub fn new(config: ResearchConfig, llm: Arc<dyn ChatBackend>) -> Self {
        let proposer = UrlProposer::new(
            llm.clone(),
            config.proposal,
            config.max_urls,
            config.cache_path.clone(),
        );
        let fetcher = PageFetcher::new(config.fetch.clone());
        let synthesizer = Synthesizer::new(llm, config.synthesis);
        Self {
            config,
            proposer,
            fetcher,
            synthesizer,
        }
    }

    /// Research `question` end to end and persist every answer chunk.
    ///
    /// `input` supplies the continue/stop replies; answers and prompts go to `out`.
    pub async fn run<R, W>(
        &self,
        question: &str,
        launcher: &dyn BrowserLauncher,
        input: &mut Lines<R>,
        out: &mut W,
    ) -> Result<SessionReport>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let started_at = chrono::Utc::now().timestamp();
        info!(question, "Researching question");

        let urls = self
            .proposer
            .propose_urls(question, self.config.use_cache)
            .await?;
        info!(count = urls.len(), "Found potential sources");

        let mut driver = launcher.launch().await?;
        let result = self
            .research(question, &urls, driver.as_mut(), input, out)
            .await;
        if let Err(e) = driver.close().await {
            warn!("Browser teardown failed: {:#}", e);
        }
        let (chunks, sources) = result?;

        if self.config.dump_sources {
            let path = output::write_sources(&self.config.output_dir, started_at, &sources)?;
            info!(path = %path.display(), "Scraped sources saved");
        }
        let output_path = output::write_answers(&self.config.output_dir, started_at, &chunks)?;
        info!(path = %output_path.display(), chunks = chunks.len(), "Answers saved");

        Ok(SessionReport {
            chunks,
            sources,
            output_path,
        })
    }

    async fn research<R, W>(
        &self,
        question: &str,
        urls: &[String],
        driver: &mut dyn PageDriver,
        input: &mut Lines<R>,
        out: &mut W,
    ) -> Result<(Vec<String>, Vec<FetchOutcome>)>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut sources = Vec::with_capacity(urls.len());
        for url in urls {
            let outcome = self.fetcher.fetch(driver, url).await;
            debug!(
                url = %outcome.requested,
                resolved = ?outcome.resolved,
                fallback = outcome.used_fallback,
                chars = outcome.content.len(),
                "Source fetched"
            );
            sources.push(outcome);
        }
        let scraped = sources.iter().filter(|s| s.succeeded).count();
        info!(scraped, total = sources.len(), "Scraping finished");

        let context = build_context(&sources);
        let (first, conversation) = self.synthesizer.answer(question, &context).await?;
        writeln!(out, "\nInitial Answer:\n{}", first)?;

        let chunks = self.continue_loop(first, conversation, input, out).await?;
        writeln!(out, "Finished outputting. Thanks!")?;
        Ok((chunks, sources))
    }

    async fn continue_loop<R, W>(
        &self,
        first: String,
        mut conversation: Conversation,
        input: &mut Lines<R>,
        out: &mut W,
    ) -> Result<Vec<String>>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut chunks = vec![first];
        let mut state = ContinuationState::AwaitingConfirmation;
        loop {
            match state {
                ContinuationState::AwaitingConfirmation => {
                    write!(out, "continue answer? (Y/N) ")?;
                    out.flush()?;
                    let reply = input
                        .next_line()
                        .await
                        .context("Failed to read confirmation")?;
                    state = state.on_reply(reply.as_deref());
                }
                ContinuationState::Continuing => {
                    writeln!(out, "\ngetting next answer ...\n")?;
                    let last = chunks.last().map(String::as_str).unwrap_or_default();
                    let (next, extended) =
                        self.synthesizer.continue_answer(conversation, last).await?;
                    conversation = extended;
                    writeln!(out, "{}", next)?;
                    chunks.push(next);
                    state = state.on_chunk();
                }
                ContinuationState::Done => return Ok(chunks),
            }
        }
    }
}
