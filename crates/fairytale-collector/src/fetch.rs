//! Blocking HTTP with retries and a polite pause between requests.

use anyhow::{Context, Result, anyhow};
use fairytale_core::util::write_atomic;
use reqwest::blocking::Client;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const USER_AGENT: &str = "FairytaleCollector/0.1 (Educational project)";

const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
const MEDIA_TIMEOUT: Duration = Duration::from_secs(120);
const ATTEMPTS: u32 = 3;

pub struct Fetcher {
    client: Client,
    pause: Duration,
    backoff: Duration,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(PAGE_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            pause: Duration::from_secs(1),
            backoff: Duration::from_secs(1),
        })
    }

    /// Override the pause after each request and the base retry delay.
    pub fn with_delays(mut self, pause: Duration, backoff: Duration) -> Self {
        self.pause = pause;
        self.backoff = backoff;
        self
    }

    pub fn get_text(&self, url: &str) -> Result<String> {
        self.with_retries(url, || {
            let response = self.client.get(url).send()?.error_for_status()?;
            response.text()
        })
    }

    /// Download `url` to `dest`, replacing it atomically. Returns the byte count.
    pub fn download(&self, url: &str, dest: &Path) -> Result<usize> {
        let bytes = self.with_retries(url, || {
            let response = self
                .client
                .get(url)
                .timeout(MEDIA_TIMEOUT)
                .send()?
                .error_for_status()?;
            response.bytes()
        })?;
        write_atomic(dest, &bytes)?;
        info!(url, path = %dest.display(), bytes = bytes.len(), "Downloaded file");
        Ok(bytes.len())
    }

    fn with_retries<T>(
        &self,
        url: &str,
        mut attempt: impl FnMut() -> reqwest::Result<T>,
    ) -> Result<T> {
        let mut last = None;
        for n in 0..ATTEMPTS {
            debug!(url, attempt = n + 1, "GET");
            match attempt() {
                Ok(value) => {
                    thread::sleep(self.pause);
                    return Ok(value);
                }
                Err(err) => {
                    warn!(url, attempt = n + 1, "Request failed: {err}");
                    last = Some(err);
                    if n + 1 < ATTEMPTS {
                        thread::sleep(self.backoff * 2u32.pow(n));
                    }
                }
            }
        }
        Err(match last {
            Some(err) => anyhow!(err).context(format!("Failed to download {url}")),
            None => anyhow!("Failed to download {url}"),
        })
    }
}
