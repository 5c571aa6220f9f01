use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, time::Duration};

use crate::{Config, model::WeatherPayload};

/// Anything that can answer "what's the weather in `city`".
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, city: &str) -> Result<WeatherPayload>;
}

/// Talks to the weather backend's `GET /weather?city=` route.
#[derive(Debug, Clone)]
pub struct HttpWeatherSource {
    url: String,
    http: Client,
}

impl HttpWeatherSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { url: url.into(), http })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.weather_url(), Duration::from_secs(config.request_timeout_secs))
    }
}

#[async_trait]
impl WeatherSource for HttpWeatherSource {
    async fn fetch(&self, city: &str) -> Result<WeatherPayload> {
        tracing::debug!(url = %self.url, city, "requesting weather");

        let res = self
            .http
            .get(&self.url)
            .query(&[("city", city)])
            .send()
            .await
            .context("Failed to send request to the weather service")?;

        // The backend relays upstream errors (e.g. `cod: "404"`) in the body, so the
        // HTTP status is logged but the body is parsed either way.
        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read weather response body")?;

        if !status.is_success() {
            tracing::debug!(%status, body = %truncate_body(&body), "weather service returned an error status");
        }

        serde_json::from_str(&body).with_context(|| {
            format!("Failed to parse weather JSON (status {status}): {}", truncate_body(&body))
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
