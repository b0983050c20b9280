pub mod cache;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::llm::{ChatBackend, CompletionRequest, Message};
use crate::prompts;
use crate::state::Sampling;
use cache::MemoCache;

/// Outcome of reading the model's URL list.
#[derive(Debug, Clone, PartialEq)]
pub enum UrlListParse {
    Urls(Vec<String>),
    Malformed(String),
}

/// Parse a reply that should be nothing but a JSON array of strings.
pub fn parse_url_list(reply: &str) -> UrlListParse {
    match serde_json::from_str::<Vec<String>>(reply.trim()) {
        Ok(urls) => UrlListParse::Urls(urls),
        Err(e) => UrlListParse::Malformed(e.to_string()),
    }
}

/// Asks the model which pages would answer a question.
pub struct UrlProposer {
    llm: Arc<dyn ChatBackend>,
    sampling: Sampling,
    max_urls: usize,
    cache_path: PathBuf,
}

impl UrlProposer {
    pub fn new(
        llm: Arc<dyn ChatBackend>,
        sampling: Sampling,
        max_urls: usize,
        cache_path: PathBuf,
    ) -> Self {
        Self {
            llm,
            sampling,
            max_urls,
            cache_path,
        }
    }

    /// Candidate URLs for `question`. A malformed reply yields an empty list;
    /// LLM request errors propagate.
    pub async fn propose_urls(&self, question: &str, use_cache: bool) -> Result<Vec<String>> {
        if use_cache {
            let cache = MemoCache::load(&self.cache_path);
            if let Some(urls) = cache.get(question) {
                info!(count = urls.len(), "Using memoized sources, no LLM call");
                return Ok(urls.to_vec());
            }
            debug!(entries = cache.len(), "Question not memoized");
        }

        let request = CompletionRequest {
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
            messages: vec![Message::user(prompts::source_urls_prompt(
                question,
                self.max_urls,
            ))],
        };
        let reply = self.llm.complete(&request).await?;

        let mut urls = match parse_url_list(&reply) {
            UrlListParse::Urls(urls) => urls,
            UrlListParse::Malformed(e) => {
                warn!(reply_len = reply.len(), "Model didn't return a JSON URL list, using none: {}", e);
                return Ok(Vec::new());
            }
        };
        if urls.len() > self.max_urls {
            warn!(count = urls.len(), max = self.max_urls, "Too many URLs proposed, truncating");
            urls.truncate(self.max_urls);
        }

        if use_cache {
            // Re-read so entries written since the lookup are kept.
            let mut cache = MemoCache::load(&self.cache_path);
            cache.insert(question, urls.clone());
            if let Err(e) = cache.save() {
                warn!("Failed to memoize sources: {:#}", e);
            }
        }

        Ok(urls)
    }
}
