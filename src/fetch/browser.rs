use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A single stateful browser viewport. Each navigation replaces the current page.
#[async_trait]
pub trait PageDriver: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Wait until `selector` matches an element, failing after `timeout`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    async fn current_url(&mut self) -> Result<String>;

    async fn title(&mut self) -> Result<String>;

    /// Read an attribute of the first element matching `selector`.
    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Full rendered markup of the current page.
    async fn markup(&mut self) -> Result<String>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageDriver>>;
}

/// Launches a local Chrome/Chromium over CDP.
pub struct ChromeLauncher {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl ChromeLauncher {
    pub fn from_env(headless: bool) -> Self {
        let executable = dotenv::var("CHROME_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        Self {
            headless,
            executable,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.request_timeout)
            .window_size(1366, 768)
            .args(["--no-sandbox", "--disable-dev-shm-usage", "--no-first-run"]);
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chrome")?;

        // The CDP connection only makes progress while the handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let msg = e.to_string();
                    if msg.contains("did not match any variant") {
                        continue;
                    }
                    debug!("CDP handler error: {}", msg);
                    if msg.contains("connection closed") || msg.contains("websocket closed") {
                        break;
                    }
                }
            }
            debug!("CDP handler task completed");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e).context("Failed to open browser tab");
            }
        };

        info!(headless = self.headless, "Browser session started");
        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            page,
            handler_task,
        }))
    }
}

pub struct ChromeSession {
    browser: Option<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl PageDriver for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Navigation to {} failed", url))?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let page = &self.page;
        let poll = async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| anyhow!("Timed out after {:?} waiting for `{}`", timeout, selector))
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("No element matches `{}`", selector))?;
        Ok(element.attribute(name).await?)
    }

    async fn markup(&mut self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if let Err(e) = browser.wait().await {
            debug!("Waiting for browser exit failed: {}", e);
        }
        self.handler_task.abort();
        info!("Browser session closed");
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Dropping the Browser kills the child process; the handler would otherwise spin on.
        self.handler_task.abort();
    }
}
