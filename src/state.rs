use std::path::PathBuf;
use std::time::Duration;

/// Sampling policy for one kind of completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Knobs for the page fetcher.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub ready_selector: String,
    pub page_ready_timeout: Duration,
    pub search_url: String,
    pub search_hint: Option<String>,
    pub result_selector: String,
    pub search_result_timeout: Duration,
    pub fallback_page_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            ready_selector: "body".to_string(),
            page_ready_timeout: Duration::from_secs(15),
            search_url: "https://www.google.com/search".to_string(),
            search_hint: Some("games".to_string()),
            result_selector: "#search .g:first-child a:first-child".to_string(),
            search_result_timeout: Duration::from_secs(10),
            fallback_page_timeout: Duration::from_secs(12),
        }
    }
}

/// Run-wide research settings.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    pub max_urls: usize,
    pub proposal: Sampling,
    pub synthesis: Sampling,
    pub fetch: FetchPolicy,
    pub use_cache: bool,
    pub cache_path: PathBuf,
    pub output_dir: PathBuf,
    pub dump_sources: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_urls: 6,
            proposal: Sampling {
                temperature: 0.0,
                max_tokens: 300,
            },
            synthesis: Sampling {
                temperature: 0.5,
                max_tokens: 1000,
            },
            fetch: FetchPolicy::default(),
            use_cache: true,
            cache_path: PathBuf::from("memoize.json"),
            output_dir: PathBuf::from("."),
            dump_sources: false,
        }
    }
}

impl ResearchConfig {
    /// Defaults overlaid with `SEARCH_HINT`, `SEARCH_URL` and `PAGE_TIMEOUT_SECS`.
    /// An empty `SEARCH_HINT` disables the hint.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(hint) = dotenv::var("SEARCH_HINT") {
            let hint = hint.trim().to_string();
            config.fetch.search_hint = if hint.is_empty() { None } else { Some(hint) };
        }
        if let Ok(url) = dotenv::var("SEARCH_URL") {
            if !url.trim().is_empty() {
                config.fetch.search_url = url.trim().to_string();
            }
        }
        if let Some(secs) = dotenv::var("PAGE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.fetch.page_ready_timeout = Duration::from_secs(secs);
        }

        config
    }
}
