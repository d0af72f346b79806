use std::time::Duration;

use async_trait::async_trait;
use browserless_client::BrowserlessClient;
use rand::Rng;
use tracing::{info, warn};

use hoodrank_common::Config;

use super::ScrapeBackend;
use crate::error::ScrapeError;
use crate::pipeline::{Extraction, ExtractionInput, ExtractionPipeline};

/// Where the HTML comes from.
enum PageSource {
    Direct(reqwest::Client),
    Rendered(BrowserlessClient),
}

/// Fetches the page once (with retries) and runs the static strategies over it.
pub struct HttpBackend {
    url: String,
    source: PageSource,
    max_attempts: u32,
    retry_base: Duration,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        let source = match config.browserless_url.as_deref() {
            Some(base_url) => {
                let client = BrowserlessClient::new(
                    base_url,
                    config.browserless_token.as_deref(),
                    config.timeout(),
                )?
                .with_settle(config.delay())
                .with_user_agent(&config.browser_user_agent);
                PageSource::Rendered(client)
            }
            None => {
                let client = reqwest::Client::builder()
                    .timeout(config.timeout())
                    .user_agent(config.browser_user_agent.as_str())
                    .build()
                    .map_err(|e| ScrapeError::Fetch {
                        url: config.target_url.clone(),
                        message: format!("could not build HTTP client: {e}"),
                    })?;
                PageSource::Direct(client)
            }
        };

        Ok(Self {
            url: config.target_url.clone(),
            source,
            max_attempts: config.scraper_max_retries.max(1),
            retry_base: config.delay(),
        })
    }

    /// Fetch directly with a caller-built client instead of the configured source.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.source = PageSource::Direct(client);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the page, retrying transient failures with backoff
    /// (`base * 3^attempt` plus up to a second of jitter).
    pub async fn fetch(&self) -> Result<String, ScrapeError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once().await {
                Ok(html) => return Ok(html),
                Err(e) if attempt + 1 < self.max_attempts => {
                    let backoff = backoff(self.retry_base, attempt);
                    let jitter = if self.retry_base.is_zero() {
                        Duration::ZERO
                    } else {
                        Duration::from_millis(rand::rng().random_range(0..1000))
                    };
                    warn!(
                        url = self.url.as_str(),
                        attempt = attempt + 1,
                        backoff_secs = backoff.as_secs_f64(),
                        error = %e,
                        "Fetch failed, retrying after backoff"
                    );
                    tokio::time::sleep(backoff.saturating_add(jitter)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self) -> Result<String, ScrapeError> {
        match &self.source {
            PageSource::Rendered(client) => Ok(client.content(&self.url).await?),
            PageSource::Direct(client) => {
                let fetch_err = |e: reqwest::Error| ScrapeError::Fetch {
                    url: self.url.clone(),
                    message: e.to_string(),
                };
                let resp = client
                    .get(&self.url)
                    .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
                    .header("Accept-Language", "en-US,en;q=0.5")
                    .send()
                    .await
                    .map_err(fetch_err)?
                    .error_for_status()
                    .map_err(fetch_err)?;
                resp.text().await.map_err(fetch_err)
            }
        }
    }
}

/// `base * 3^attempt`, saturating instead of overflowing on long retry runs.
fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(3u32.saturating_pow(attempt))
}

#[async_trait]
impl ScrapeBackend for HttpBackend {
    async fn scrape(&self, pipeline: &ExtractionPipeline) -> Result<Extraction, ScrapeError> {
        let html = self.fetch().await?;
        info!(url = self.url.as_str(), bytes = html.len(), "Fetched page");
        Ok(pipeline.run(ExtractionInput::html(&html)).await)
    }

    fn name(&self) -> &str {
        match self.source {
            PageSource::Direct(_) => "http",
            PageSource::Rendered(_) => "browserless",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_triples_per_attempt() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff(base, 0), Duration::from_millis(500));
        assert_eq!(backoff(base, 2), Duration::from_millis(4500));
    }

    #[test]
    fn backoff_saturates_on_late_attempts() {
        assert_eq!(backoff(Duration::from_secs(1), 40), Duration::from_secs(u64::from(u32::MAX)));
        assert_eq!(backoff(Duration::from_secs(u64::MAX / 2), 1), Duration::MAX);
        assert_eq!(backoff(Duration::ZERO, 40), Duration::ZERO);
    }
}
