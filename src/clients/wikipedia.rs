use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Collector, CollectorError, Limiter, article_title, get_json, log_scaled, rate_limiter};
use crate::apt::evidence::{ArtistQuery, EvidenceRecord};
use crate::apt::rules::movement_pattern;
use crate::config::CollectorConfig;
use crate::constants::sources::WIKIPEDIA;

/// Suffixes tried in order when the plain name is a disambiguation page.
const DISAMBIGUATION_SUFFIXES: [&str; 2] = ["(painter)", "(artist)"];

/// Extract word count at which importance saturates.
const IMPORTANCE_SATURATION_WORDS: f64 = 400.0;

const DESCRIPTION_STOPWORDS: &[&str] = &[
    "and", "the", "for", "from", "who", "with", "born", "died", "was", "his", "her",
];

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    page_type: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    extract: String,
}

impl PageSummary {
    fn is_disambiguation(&self) -> bool {
        self.page_type == "disambiguation"
    }
}

#[derive(Clone)]
pub struct WikipediaClient {
    client: Client,
    limiter: Arc<Limiter>,
    base_url: String,
    movements: Regex,
}

impl WikipediaClient {
    pub fn new(user_agent: &str, config: &CollectorConfig) -> Result<Self, CollectorError> {
        Ok(Self {
            client: super::http_client(user_agent, config)?,
            limiter: rate_limiter(config.requests_per_second),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            movements: movement_pattern().map_err(|e| CollectorError::Malformed(e.to_string()))?,
        })
    }

    async fn fetch_summary(&self, title: &str) -> Result<Option<PageSummary>, CollectorError> {
        let url = format!(
            "{}/page/summary/{}",
            self.base_url,
            urlencoding::encode(&article_title(title))
        );
        get_json(&self.client, &self.limiter, &url).await
    }

    /// Summary for the artist, following disambiguation suffixes.
    async fn find_article(&self, name: &str) -> Result<Option<PageSummary>, CollectorError> {
        let mut candidates = vec![name.to_string()];
        candidates.extend(DISAMBIGUATION_SUFFIXES.iter().map(|s| format!("{name} {s}")));

        for title in candidates {
            match self.fetch_summary(&title).await? {
                Some(summary) if summary.is_disambiguation() => {
                    debug!(title = %title, "disambiguation page, trying next title");
                }
                Some(summary) if summary.extract.trim().is_empty() => return Ok(None),
                Some(summary) => return Ok(Some(summary)),
                None => {}
            }
        }

        Ok(None)
    }

    fn tags(&self, summary: &PageSummary) -> Vec<String> {
        let mut tags = BTreeSet::new();

        if let Some(description) = &summary.description {
            for word in description
                .split(|c: char| !c.is_alphabetic() && c != '-')
                .map(str::to_lowercase)
                .filter(|w| w.chars().count() >= 3)
                .filter(|w| !DESCRIPTION_STOPWORDS.contains(&w.as_str()))
            {
                tags.insert(word);
            }
        }

        for found in self.movements.find_iter(&summary.extract) {
            tags.insert(found.as_str().to_lowercase());
        }

        tags.into_iter().collect()
    }

    fn record(&self, summary: &PageSummary) -> EvidenceRecord {
        let words = summary.extract.split_whitespace().count() as u64;

        EvidenceRecord {
            total_works_or_mentions: words,
            importance_signal: log_scaled(words as f64, IMPORTANCE_SATURATION_WORDS),
            category_tags: self.tags(summary),
            free_text_excerpt: Some(summary.extract.trim().to_string()),
            ..EvidenceRecord::new(WIKIPEDIA)
        }
    }
}

#[async_trait]
impl Collector for WikipediaClient {
    fn source(&self) -> &'static str {
        WIKIPEDIA
    }

    async fn collect(&self, query: &ArtistQuery) -> Result<Option<EvidenceRecord>, CollectorError> {
        let Some(summary) = self.find_article(&query.name).await? else {
            return Ok(None);
        };
        debug!(artist = %query.name, title = %summary.title, "wikipedia summary found");
        Ok(Some(self.record(&summary)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WikipediaClient {
        WikipediaClient::new("test-agent", &CollectorConfig::default()).unwrap()
    }

    #[test]
    fn test_summary_to_record() {
        let summary: PageSummary = serde_json::from_value(serde_json::json!({
            "type": "standard",
            "title": "Mark Rothko",
            "description": "American abstract painter (1903-1970)",
            "extract": "Mark Rothko was an American abstract painter associated with Abstract Expressionism and color field painting."
        }))
        .unwrap();

        let record = client().record(&summary);
        assert_eq!(record.source_name, "wikipedia");
        assert_eq!(record.total_works_or_mentions, 15);
        assert!(record.importance_signal > 0.0 && record.importance_signal < 100.0);
        assert!(record.category_tags.contains(&"abstract".to_string()));
        assert!(record.category_tags.contains(&"painter".to_string()));
        assert!(record.category_tags.contains(&"abstract expressionism".to_string()));
    }

    #[test]
    fn test_disambiguation_detection() {
        let summary: PageSummary = serde_json::from_value(serde_json::json!({
            "type": "disambiguation",
            "title": "John Smith",
            "extract": "John Smith may refer to:"
        }))
        .unwrap();
        assert!(summary.is_disambiguation());
    }
}
