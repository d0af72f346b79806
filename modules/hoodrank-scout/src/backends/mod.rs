pub mod driven;
pub mod http;

#[cfg(feature = "chromium")]
pub mod chromium;

pub use driven::DrivenBackend;
pub use http::HttpBackend;

use async_trait::async_trait;
use tracing::info;

use hoodrank_common::Config;

use crate::error::ScrapeError;
use crate::pipeline::{Extraction, ExtractionPipeline};

/// A way of getting the target page in front of the extraction pipeline.
#[async_trait]
pub trait ScrapeBackend: Send + Sync {
    async fn scrape(&self, pipeline: &ExtractionPipeline) -> Result<Extraction, ScrapeError>;

    /// Whether this build can run the backend at all.
    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BackendKind {
    /// Plain HTTP fetch (or Browserless render) plus static extraction.
    #[default]
    Http,
    /// Live browser session that can also drive the map.
    Driven,
}

pub fn build_backend(kind: BackendKind, config: &Config) -> Result<Box<dyn ScrapeBackend>, ScrapeError> {
    let backend: Box<dyn ScrapeBackend> = match kind {
        BackendKind::Http => Box::new(HttpBackend::new(config)?),
        BackendKind::Driven => Box::new(DrivenBackend::new(config)),
    };

    if !backend.is_available() {
        return Err(ScrapeError::Unavailable(format!(
            "{} backend is not compiled into this build",
            backend.name()
        )));
    }

    info!(backend = backend.name(), url = config.target_url.as_str(), "Using scrape backend");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_backend_builds_from_defaults() {
        let backend = build_backend(BackendKind::Http, &Config::default()).unwrap();
        assert_eq!(backend.name(), "http");
    }

    #[cfg(not(feature = "chromium"))]
    #[test]
    fn driven_backend_unavailable_without_browser_feature() {
        let err = build_backend(BackendKind::Driven, &Config::default()).err().unwrap();
        assert!(matches!(err, ScrapeError::Unavailable(_)));
    }
}
