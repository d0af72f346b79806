use thiserror::Error;

use crate::driver::ElementHandle;

/// Failures that abort a whole scrape invocation.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Rendering service error: {0}")]
    Browserless(#[from] browserless_client::BrowserlessError),

    #[error("Browser driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Failures reported by a [`DomDriver`](crate::driver::DomDriver). The driven
/// sweep treats all of these as local to one step.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Unknown element handle {0:?}")]
    StaleHandle(ElementHandle),

    #[error("Unsupported selector: {0}")]
    Selector(String),

    #[error("Browser error: {0}")]
    Browser(String),
}
