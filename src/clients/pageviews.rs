use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Months, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{Collector, CollectorError, Limiter, article_title, get_json, log_scaled, rate_limiter};
use crate::apt::evidence::{ArtistQuery, EvidenceRecord};
use crate::config::CollectorConfig;
use crate::constants::sources::PAGEVIEWS;

/// Mean monthly views at which importance saturates.
const IMPORTANCE_SATURATION_VIEWS: f64 = 500_000.0;

const WINDOW_MONTHS: u32 = 12;

#[derive(Debug, Deserialize)]
struct PageviewsResponse {
    #[serde(default)]
    items: Vec<PageviewsItem>,
}

#[derive(Debug, Deserialize)]
struct PageviewsItem {
    views: u64,
}

/// First and last day of the last twelve complete months, in the
/// `YYYYMMDD00` form the API expects.
fn window(today: NaiveDate) -> Option<(String, String)> {
    let first_of_month = today.with_day(1)?;
    let start = first_of_month.checked_sub_months(Months::new(WINDOW_MONTHS))?;
    let end = first_of_month.pred_opt()?;
    Some((
        format!("{}00", start.format("%Y%m%d")),
        format!("{}00", end.format("%Y%m%d")),
    ))
}

fn record(items: &[PageviewsItem]) -> Option<EvidenceRecord> {
    if items.is_empty() {
        return None;
    }

    let total: u64 = items.iter().map(|i| i.views).sum();
    let mean = total as f64 / items.len() as f64;

    Some(EvidenceRecord {
        total_works_or_mentions: total,
        importance_signal: log_scaled(mean, IMPORTANCE_SATURATION_VIEWS),
        ..EvidenceRecord::new(PAGEVIEWS)
    })
}

#[derive(Clone)]
pub struct PageviewsClient {
    client: Client,
    limiter: Arc<Limiter>,
    base_url: String,
}

impl PageviewsClient {
    pub fn new(user_agent: &str, config: &CollectorConfig) -> Result<Self, CollectorError> {
        Ok(Self {
            client: super::http_client(user_agent, config)?,
            limiter: rate_limiter(config.requests_per_second),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Collector for PageviewsClient {
    fn source(&self) -> &'static str {
        PAGEVIEWS
    }

    async fn collect(&self, query: &ArtistQuery) -> Result<Option<EvidenceRecord>, CollectorError> {
        let (start, end) = window(Utc::now().date_naive())
            .ok_or_else(|| CollectorError::Malformed("date out of range".to_string()))?;

        let url = format!(
            "{}/per-article/en.wikipedia/all-access/user/{}/monthly/{start}/{end}",
            self.base_url,
            urlencoding::encode(&article_title(&query.name))
        );

        let response: Option<PageviewsResponse> =
            get_json(&self.client, &self.limiter, &url).await?;

        Ok(response.and_then(|r| record(&r.items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_covers_complete_months() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let (start, end) = window(today).unwrap();
        assert_eq!(start, "2025030100");
        assert_eq!(end, "2026022800");
    }

    #[test]
    fn test_window_on_first_of_january() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let (start, end) = window(today).unwrap();
        assert_eq!(start, "2025010100");
        assert_eq!(end, "2025123100");
    }

    #[test]
    fn test_record_uses_mean_for_importance() {
        let items: Vec<PageviewsItem> = (0..12).map(|_| PageviewsItem { views: 30_000 }).collect();
        let record = record(&items).unwrap();
        assert_eq!(record.total_works_or_mentions, 360_000);
        assert!(record.category_tags.is_empty());
        assert!(record.importance_signal > 70.0 && record.importance_signal < 90.0);
        assert!(super::record(&[]).is_none());
    }
}
