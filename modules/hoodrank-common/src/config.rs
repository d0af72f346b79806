use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Upper bound on `SCRAPER_DELAY`, in seconds.
pub const MAX_DELAY_SECS: f64 = 3600.0;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Application configuration loaded from environment variables.
/// Every field has a literal default; `.env` is honored via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    // Target
    pub target_url: String,

    // Scraping
    pub scraper_timeout_secs: u64,
    pub scraper_headless: bool,
    pub scraper_max_retries: u32,
    pub scraper_delay_secs: f64,

    // Browser
    pub browser_width: u32,
    pub browser_height: u32,
    pub browser_user_agent: String,

    // Rendering service (optional JS rendering for the HTTP backend)
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,

    // Output
    pub data_output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://looksmapping.com".to_string(),
            scraper_timeout_secs: 30,
            scraper_headless: true,
            scraper_max_retries: 3,
            scraper_delay_secs: 1.0,
            browser_width: 1280,
            browser_height: 800,
            browser_user_agent: DEFAULT_USER_AGENT.to_string(),
            browserless_url: None,
            browserless_token: None,
            data_output_dir: PathBuf::from("./data"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            target_url: env::var("SCRAPER_URL").unwrap_or(defaults.target_url),
            scraper_timeout_secs: parsed_env("SCRAPER_TIMEOUT", defaults.scraper_timeout_secs)?,
            scraper_headless: bool_env("SCRAPER_HEADLESS", defaults.scraper_headless)?,
            scraper_max_retries: parsed_env("SCRAPER_MAX_RETRIES", defaults.scraper_max_retries)?,
            scraper_delay_secs: parsed_env("SCRAPER_DELAY", defaults.scraper_delay_secs)?,
            browser_width: parsed_env("BROWSER_WIDTH", defaults.browser_width)?,
            browser_height: parsed_env("BROWSER_HEIGHT", defaults.browser_height)?,
            browser_user_agent: env::var("BROWSER_USER_AGENT")
                .unwrap_or(defaults.browser_user_agent),
            browserless_url: env::var("BROWSERLESS_URL").ok().filter(|s| !s.is_empty()),
            browserless_token: env::var("BROWSERLESS_TOKEN").ok().filter(|s| !s.is_empty()),
            data_output_dir: env::var("DATA_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_output_dir),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let delay = self.scraper_delay_secs;
        if !(0.0..=MAX_DELAY_SECS).contains(&delay) {
            anyhow::bail!("SCRAPER_DELAY must be between 0 and {MAX_DELAY_SECS} seconds, got {delay}");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.scraper_timeout_secs)
    }

    /// `SCRAPER_DELAY` clamped to `0..=MAX_DELAY_SECS`; NaN counts as zero.
    pub fn delay(&self) -> Duration {
        let secs = self.scraper_delay_secs;
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(secs.min(MAX_DELAY_SECS))
    }

    pub fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let head: String = v.chars().take(5).collect();
                    format!("{head}...({} chars)", v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  SCRAPER_URL: {}", self.target_url);
        tracing::info!("  SCRAPER_TIMEOUT: {}s", self.scraper_timeout_secs);
        tracing::info!("  SCRAPER_HEADLESS: {}", self.scraper_headless);
        tracing::info!("  SCRAPER_MAX_RETRIES: {}", self.scraper_max_retries);
        tracing::info!("  SCRAPER_DELAY: {}s", self.scraper_delay_secs);
        tracing::info!("  BROWSER: {}x{}", self.browser_width, self.browser_height);
        tracing::info!("  BROWSERLESS_URL: {}", self.browserless_url.as_deref().unwrap_or("<not set>"));
        tracing::info!("  BROWSERLESS_TOKEN: {}", preview_opt(&self.browserless_token));
        tracing::info!("  DATA_OUTPUT_DIR: {}", self.data_output_dir.display());
    }
}

fn parsed_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        _ => Ok(default),
    }
}

fn bool_env(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => anyhow::bail!("{key} must be true or false, got {other:?}"),
        },
        _ => Ok(default),
    }
}
