//! HTTP collectors for external artist signals.
//!
//! Every collector owns one rate limiter, shared by all artists in a batch,
//! and waits on it before each request it sends.

pub mod met_museum;
pub mod pageviews;
pub mod wikipedia;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::apt::evidence::{ArtistQuery, EvidenceRecord};
use crate::config::{CollectorConfig, Config};

pub use met_museum::MetMuseumClient;
pub use pageviews::PageviewsClient;
pub use wikipedia::WikipediaClient;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for CollectorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// One external source of artist evidence.
///
/// `Ok(None)` means the source has no entry for the artist.
#[async_trait]
pub trait Collector: Send + Sync {
    fn source(&self) -> &'static str;

    async fn collect(&self, query: &ArtistQuery) -> Result<Option<EvidenceRecord>, CollectorError>;
}

pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[must_use]
pub fn rate_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Client with the configured user agent, timeout and optional bearer token.
pub fn http_client(user_agent: &str, config: &CollectorConfig) -> Result<Client, CollectorError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = config.api_token() {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| CollectorError::Transport(format!("invalid api token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
        .default_headers(headers)
        .build()
        .map_err(CollectorError::from)
}

/// Rate-limited GET returning `None` on 404.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    limiter: &Limiter,
    url: &str,
) -> Result<Option<T>, CollectorError> {
    limiter.until_ready().await;
    debug!(url, "collector request");

    let response = client.get(url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(CollectorError::Status { status, body });
    }

    let body = response.text().await?;
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|e| CollectorError::Malformed(e.to_string()))
}

/// Maps a count onto 0-100 on a log scale, reaching 100 at `saturation`.
#[must_use]
pub fn log_scaled(count: f64, saturation: f64) -> f64 {
    if count <= 0.0 || saturation <= 0.0 {
        return 0.0;
    }
    let scaled = 100.0 * count.ln_1p() / saturation.ln_1p();
    (scaled.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

/// Wikipedia title form of a name: spaces become underscores.
#[must_use]
pub fn article_title(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Every enabled collector, built from config.
pub fn build_collectors(config: &Config) -> anyhow::Result<Vec<Arc<dyn Collector>>> {
    let agent = config.collectors.user_agent.as_str();
    let mut collectors: Vec<Arc<dyn Collector>> = Vec::new();

    if config.collectors.wikipedia.enabled {
        collectors.push(Arc::new(WikipediaClient::new(
            agent,
            &config.collectors.wikipedia,
        )?));
    }
    if config.collectors.met_museum.enabled {
        collectors.push(Arc::new(MetMuseumClient::new(
            agent,
            &config.collectors.met_museum,
            config.collectors.met_sample_objects,
        )?));
    }
    if config.collectors.pageviews.enabled {
        collectors.push(Arc::new(PageviewsClient::new(
            agent,
            &config.collectors.pageviews,
        )?));
    }

    Ok(collectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_scaled_bounds() {
        assert!(log_scaled(0.0, 1000.0).abs() < f64::EPSILON);
        assert!((log_scaled(1000.0, 1000.0) - 100.0).abs() < f64::EPSILON);
        assert!((log_scaled(50_000.0, 1000.0) - 100.0).abs() < f64::EPSILON);
        let mid = log_scaled(30.0, 1000.0);
        assert!(mid > 40.0 && mid < 60.0);
    }

    #[test]
    fn test_article_title() {
        assert_eq!(article_title("Lee  Ufan"), "Lee_Ufan");
        assert_eq!(article_title("Jackson Pollock"), "Jackson_Pollock");
    }

    #[test]
    fn test_build_collectors_respects_enabled() {
        let mut config = Config::default();
        config.collectors.pageviews.enabled = false;
        let collectors = build_collectors(&config).unwrap();
        let sources: Vec<_> = collectors.iter().map(|c| c.source()).collect();
        assert_eq!(sources, vec!["wikipedia", "met_museum"]);
    }
}
