use std::time::Duration;

use async_trait::async_trait;

use hoodrank_common::Config;

use super::ScrapeBackend;
use crate::error::ScrapeError;
use crate::pipeline::{Extraction, ExtractionPipeline};

/// Browser session settings for the driven backend.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub url: String,
    pub headless: bool,
    pub width: u32,
    pub height: u32,
    pub user_agent: String,
    pub navigation_timeout: Duration,
    /// Wait after navigation before the first snapshot.
    pub load_settle: Duration,
}

impl BrowserSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.target_url.clone(),
            headless: config.scraper_headless,
            width: config.browser_width,
            height: config.browser_height,
            user_agent: config.browser_user_agent.clone(),
            navigation_timeout: config.timeout(),
            load_settle: Duration::from_secs(5),
        }
    }
}

/// Opens the page in a real browser, snapshots it for the static strategies
/// and hands the live page to the driven sweep.
pub struct DrivenBackend {
    settings: BrowserSettings,
}

impl DrivenBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: BrowserSettings::from_config(config),
        }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }
}

#[async_trait]
impl ScrapeBackend for DrivenBackend {
    async fn scrape(&self, pipeline: &ExtractionPipeline) -> Result<Extraction, ScrapeError> {
        #[cfg(feature = "chromium")]
        {
            super::chromium::scrape(&self.settings, pipeline).await
        }
        #[cfg(not(feature = "chromium"))]
        {
            let _ = pipeline;
            Err(ScrapeError::Unavailable(
                "driven backend needs the `chromium` feature".to_string(),
            ))
        }
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "chromium")
    }

    fn name(&self) -> &str {
        "driven"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let config = Config {
            scraper_headless: false,
            browser_width: 1920,
            ..Config::default()
        };
        let backend = DrivenBackend::new(&config);
        assert!(!backend.settings().headless);
        assert_eq!(backend.settings().width, 1920);
        assert_eq!(backend.settings().url, "https://looksmapping.com");
    }

    #[cfg(not(feature = "chromium"))]
    #[tokio::test]
    async fn scrape_without_browser_is_unavailable() {
        let backend = DrivenBackend::new(&Config::default());
        let err = backend.scrape(&ExtractionPipeline::default()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Unavailable(_)));
    }
}
