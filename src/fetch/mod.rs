pub mod browser;
pub mod text;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use url::Url;

use crate::state::FetchPolicy;
use browser::PageDriver;

/// Result of scraping one proposed URL. `content` is empty when `succeeded` is false.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub requested: String,
    /// Page the text was actually taken from.
    pub resolved: Option<String>,
    pub content: String,
    pub succeeded: bool,
    pub used_fallback: bool,
}

impl FetchOutcome {
    fn failed(requested: &str) -> Self {
        Self {
            requested: requested.to_string(),
            resolved: None,
            content: String::new(),
            succeeded: false,
            used_fallback: false,
        }
    }
}

/// Error page titles or an unexpected redirect mean the direct fetch missed.
pub fn needs_fallback(requested: &str, resolved: &str, title: &str) -> bool {
    let title = title.to_lowercase();
    title.contains("404") || title.contains("not found") || !same_url(requested, resolved)
}

fn same_url(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Resolve a result link (absolute, root-relative or protocol-relative) against the page it was read from.
fn resolve_link(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base).with_context(|| format!("Invalid result page URL {}", base))?;
    let target = base
        .join(href.trim())
        .with_context(|| format!("Invalid result link {}", href))?;
    Ok(target.into())
}

pub struct PageFetcher {
    policy: FetchPolicy,
}

impl PageFetcher {
    pub fn new(policy: FetchPolicy) -> Self {
        Self { policy }
    }

    /// Search URL used to recover a dead or redirected link.
    pub fn search_url(&self, url: &str) -> Result<String> {
        let query = match &self.policy.search_hint {
            Some(hint) => format!("{} {}", url, hint),
            None => url.to_string(),
        };
        let search = Url::parse_with_params(&self.policy.search_url, [("q", query.as_str())])
            .with_context(|| format!("Invalid search URL {}", self.policy.search_url))?;
        Ok(search.into())
    }

    /// Scrape `url`. Never fails: errors are logged and yield empty content.
    pub async fn fetch(&self, driver: &mut dyn PageDriver, url: &str) -> FetchOutcome {
        match self.try_fetch(driver, url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(url, "Error scraping: {:#}", e);
                FetchOutcome::failed(url)
            }
        }
    }

    async fn try_fetch(&self, driver: &mut dyn PageDriver, url: &str) -> Result<FetchOutcome> {
        let policy = &self.policy;
        driver.navigate(url).await?;
        driver
            .wait_for(&policy.ready_selector, policy.page_ready_timeout)
            .await?;

        let title = driver.title().await?;
        let resolved = driver.current_url().await?;
        let used_fallback = needs_fallback(url, &resolved, &title);

        if used_fallback {
            debug!(url, resolved = %resolved, title = %title, "Direct fetch missed, searching instead");
            let search = self.search_url(url)?;
            driver.navigate(&search).await?;
            driver
                .wait_for(&policy.result_selector, policy.search_result_timeout)
                .await?;
            let href = driver
                .attribute(&policy.result_selector, "href")
                .await?
                .filter(|h| !h.trim().is_empty())
                .context("First search result has no link")?;
            let target = resolve_link(&driver.current_url().await?, &href)?;
            driver.navigate(&target).await?;
            driver
                .wait_for(&policy.ready_selector, policy.fallback_page_timeout)
                .await?;
        }

        let resolved = driver.current_url().await?;
        info!(url = %resolved, "Scraping");
        let markup = driver.markup().await?;
        let content = text::extract_visible_text(&markup);

        Ok(FetchOutcome {
            requested: url.to_string(),
            resolved: Some(resolved),
            content,
            succeeded: true,
            used_fallback,
        })
    }
}
