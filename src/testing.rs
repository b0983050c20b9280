//! Scripted collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::fetch::browser::{BrowserLauncher, PageDriver};
use crate::llm::{ChatBackend, CompletionRequest};

/// Replies with queued texts in order and records every request.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedChat {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_error(&self, msg: &str) {
        self.replies.lock().unwrap().push_back(Err(anyhow!(msg.to_string())));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted reply left")))
    }
}

/// What the fake browser shows after navigating to a URL.
#[derive(Debug, Clone)]
pub enum FakePage {
    Page {
        resolved: String,
        title: String,
        markup: String,
        links: HashMap<String, String>,
    },
    Timeout,
}

impl FakePage {
    pub fn html(url: &str, title: &str, markup: &str) -> Self {
        FakePage::Page {
            resolved: url.to_string(),
            title: title.to_string(),
            markup: markup.to_string(),
            links: HashMap::new(),
        }
    }

    pub fn redirect(to: &str, markup: &str) -> Self {
        Self::html(to, "Moved", markup)
    }

    pub fn with_link(mut self, selector: &str, href: &str) -> Self {
        if let FakePage::Page { links, .. } = &mut self {
            links.insert(selector.to_string(), href.to_string());
        }
        self
    }
}

#[derive(Default)]
pub struct FakeBrowserLog {
    pub navigations: Vec<String>,
    pub closed: bool,
    pub launches: usize,
}

/// Browser whose pages are looked up by URL prefix; unknown URLs time out.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pages: Arc<Mutex<Vec<(String, FakePage)>>>,
    log: Arc<Mutex<FakeBrowserLog>>,
    current: Option<FakePage>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url_prefix: &str, page: FakePage) -> Self {
        self.pages
            .lock()
            .unwrap()
            .push((url_prefix.to_string(), page));
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log.lock().unwrap().navigations.clone()
    }

    pub fn closed(&self) -> bool {
        self.log.lock().unwrap().closed
    }

    pub fn launches(&self) -> usize {
        self.log.lock().unwrap().launches
    }

    fn loaded(&self) -> Result<(&String, &String, &String, &HashMap<String, String>)> {
        match &self.current {
            Some(FakePage::Page {
                resolved,
                title,
                markup,
                links,
            }) => Ok((resolved, title, markup, links)),
            Some(FakePage::Timeout) => Err(anyhow!("page never finished loading")),
            None => Err(anyhow!("no page loaded")),
        }
    }
}

#[async_trait]
impl PageDriver for FakeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.log.lock().unwrap().navigations.push(url.to_string());
        let page = self
            .pages
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, page)| page.clone())
            .unwrap_or(FakePage::Timeout);
        self.current = Some(page);
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let (_, _, _, links) = self.loaded().map_err(|_| {
            anyhow!("timed out after {:?} waiting for `{}`", timeout, selector)
        })?;
        if selector == "body" || links.contains_key(selector) {
            Ok(())
        } else {
            Err(anyhow!("timed out after {:?} waiting for `{}`", timeout, selector))
        }
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.loaded()?.0.clone())
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self.loaded()?.1.clone())
    }

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>> {
        let links = self.loaded()?.3;
        Ok(if name == "href" {
            links.get(selector).cloned()
        } else {
            None
        })
    }

    async fn markup(&mut self) -> Result<String> {
        Ok(self.loaded()?.2.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.lock().unwrap().closed = true;
        Ok(())
    }
}

#[async_trait]
impl BrowserLauncher for FakeBrowser {
    async fn launch(&self) -> Result<Box<dyn PageDriver>> {
        self.log.lock().unwrap().launches += 1;
        Ok(Box::new(self.clone()))
    }
}
