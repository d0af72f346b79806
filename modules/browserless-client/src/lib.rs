pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

/// Request body for `POST /content`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    goto_options: GotoOptions,
    /// Extra settle time after navigation so client-side scripts can populate the DOM.
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    wait_until: &'static str,
    timeout: u64,
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    settle: Option<Duration>,
    user_agent: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            // Browserless needs headroom on top of its own navigation timeout.
            .timeout(timeout + Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            timeout,
            settle: None,
            user_agent: None,
        })
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = Some(settle);
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    fn request_body<'a>(&'a self, url: &'a str) -> ContentRequest<'a> {
        ContentRequest {
            url,
            goto_options: GotoOptions {
                wait_until: "networkidle2",
                timeout: self.timeout.as_millis() as u64,
            },
            wait_for_timeout: self.settle.map(|d| d.as_millis() as u64),
            user_agent: self.user_agent.as_deref(),
        }
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, url: &str) -> Result<String> {
        info!(url, base_url = self.base_url.as_str(), "browserless: rendering page");

        let resp = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&self.request_body(url))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let html = resp.text().await?;
        if html.trim().is_empty() {
            return Err(BrowserlessError::EmptyRender(url.to_string()));
        }

        debug!(url, bytes = html.len(), "browserless: rendered");
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(token: Option<&str>) -> BrowserlessClient {
        BrowserlessClient::new("http://localhost:3000/", token, Duration::from_secs(30))
            .expect("client builds")
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        assert_eq!(client(None).endpoint(), "http://localhost:3000/content");
    }

    #[test]
    fn endpoint_appends_token() {
        assert_eq!(
            client(Some("abc")).endpoint(),
            "http://localhost:3000/content?token=abc"
        );
    }

    #[test]
    fn request_body_carries_navigation_timeout() {
        let c = client(None);
        let body = serde_json::to_value(c.request_body("https://looksmapping.com")).unwrap();
        assert_eq!(body["url"], "https://looksmapping.com");
        assert_eq!(body["gotoOptions"]["waitUntil"], "networkidle2");
        assert_eq!(body["gotoOptions"]["timeout"], 30_000);
        assert!(body.get("waitForTimeout").is_none());
        assert!(body.get("userAgent").is_none());
    }

    #[test]
    fn request_body_includes_optional_settings() {
        let c = client(None)
            .with_settle(Duration::from_millis(1500))
            .with_user_agent("hoodrank-test");
        let body = serde_json::to_value(c.request_body("https://example.com")).unwrap();
        assert_eq!(body["waitForTimeout"], 1500);
        assert_eq!(body["userAgent"], "hoodrank-test");
    }
}
