//! Page automation seam used by the scraper

use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use scraper::{Html, Selector};

use crate::error::{EpgError, Result};
use crate::net::HttpClient;

/// Minimal browser surface the scraper needs.
///
/// Waiting is condition based: `wait_for` returns once `selector` matches
/// the current page, or fails with [`EpgError::Timeout`] after `timeout`.
pub trait PageDriver {
    /// Load `url`; failures are [`EpgError::Navigation`] or [`EpgError::Timeout`]
    fn open(&mut self, url: &str) -> Result<()>;

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Current page markup
    fn content(&self) -> Result<String>;
}

/// Compile a CSS selector, reporting bad syntax as a browser error
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| EpgError::Browser(format!("invalid selector '{}': {:?}", css, e)))
}

/// Does the markup contain at least one element matching `sel`?
pub fn page_matches(html: &str, sel: &Selector) -> bool {
    Html::parse_document(html).select(sel).next().is_some()
}

/// Driver that loads pages over HTTP and polls them until the awaited
/// markup shows up
pub struct HttpPageDriver {
    client: HttpClient,
    poll_interval: Duration,
    current_url: Option<String>,
    html: String,
}

impl HttpPageDriver {
    pub fn new(client: HttpClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            current_url: None,
            html: String::new(),
        }
    }

    fn load(&mut self, url: &str) -> Result<()> {
        self.html = self.client.get_text(url).map_err(|e| match e {
            EpgError::Timeout { .. } => e,
            other => EpgError::navigation(url, other),
        })?;
        Ok(())
    }
}

impl PageDriver for HttpPageDriver {
    fn open(&mut self, url: &str) -> Result<()> {
        self.current_url = Some(url.to_string());
        self.load(url)
    }

    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<()> {
        let sel = selector(css)?;
        let url = self
            .current_url
            .clone()
            .ok_or_else(|| EpgError::Browser("wait_for called before open".to_string()))?;
        let deadline = Instant::now() + timeout;

        loop {
            if page_matches(&self.html, &sel) {
                return Ok(());
            }
            if Instant::now() + self.poll_interval > deadline {
                return Err(EpgError::timeout(format!("waiting for '{}' on {}", css, url)));
            }
            debug!("'{}' not on {} yet, polling again", css, url);
            thread::sleep(self.poll_interval);
            self.load(&url)?;
        }
    }

    fn content(&self) -> Result<String> {
        if self.current_url.is_none() {
            return Err(EpgError::Browser("no page loaded".to_string()));
        }
        Ok(self.html.clone())
    }
}
