use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Collector, CollectorError, Limiter, get_json, log_scaled, rate_limiter};
use crate::apt::evidence::{ArtistQuery, EvidenceRecord};
use crate::config::CollectorConfig;
use crate::constants::sources::MET_MUSEUM;

/// Object count at which importance saturates.
const IMPORTANCE_SATURATION_OBJECTS: f64 = 2000.0;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(rename = "objectIDs", default)]
    object_ids: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct MetObject {
    #[serde(rename = "artistDisplayName", default)]
    artist_display_name: String,
    #[serde(default)]
    department: String,
    #[serde(default)]
    classification: String,
    #[serde(default)]
    tags: Option<Vec<MetTag>>,
}

#[derive(Debug, Deserialize)]
struct MetTag {
    term: String,
}

impl MetObject {
    /// True when every word of the queried name appears in the object's artist.
    fn is_by(&self, name: &str) -> bool {
        let artist = self.artist_display_name.to_lowercase();
        name.split_whitespace()
            .all(|word| artist.contains(&word.to_lowercase()))
    }

    fn terms(&self) -> impl Iterator<Item = String> + '_ {
        [self.department.as_str(), self.classification.as_str()]
            .into_iter()
            .chain(self.tags.iter().flatten().map(|t| t.term.as_str()))
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
    }
}

#[derive(Clone)]
pub struct MetMuseumClient {
    client: Client,
    limiter: Arc<Limiter>,
    base_url: String,
    sample_objects: usize,
}

impl MetMuseumClient {
    pub fn new(
        user_agent: &str,
        config: &CollectorConfig,
        sample_objects: usize,
    ) -> Result<Self, CollectorError> {
        Ok(Self {
            client: super::http_client(user_agent, config)?,
            limiter: rate_limiter(config.requests_per_second),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sample_objects,
        })
    }

    async fn search(&self, name: &str) -> Result<Option<SearchResponse>, CollectorError> {
        let url = format!(
            "{}/search?artistOrCulture=true&q={}",
            self.base_url,
            urlencoding::encode(name)
        );
        get_json(&self.client, &self.limiter, &url).await
    }

    async fn object(&self, id: u64) -> Result<Option<MetObject>, CollectorError> {
        let url = format!("{}/objects/{id}", self.base_url);
        get_json(&self.client, &self.limiter, &url).await
    }
}

fn record(total: u64, samples: &[MetObject]) -> EvidenceRecord {
    let tags: BTreeSet<String> = samples.iter().flat_map(MetObject::terms).collect();

    EvidenceRecord {
        total_works_or_mentions: total,
        importance_signal: log_scaled(total as f64, IMPORTANCE_SATURATION_OBJECTS),
        category_tags: tags.into_iter().collect(),
        ..EvidenceRecord::new(MET_MUSEUM)
    }
}

#[async_trait]
impl Collector for MetMuseumClient {
    fn source(&self) -> &'static str {
        MET_MUSEUM
    }

    async fn collect(&self, query: &ArtistQuery) -> Result<Option<EvidenceRecord>, CollectorError> {
        let Some(search) = self.search(&query.name).await? else {
            return Ok(None);
        };

        let ids = search.object_ids.unwrap_or_default();
        if search.total == 0 || ids.is_empty() {
            return Ok(None);
        }

        let mut samples = Vec::new();
        for id in ids.iter().take(self.sample_objects) {
            if let Some(object) = self.object(*id).await? {
                samples.push(object);
            }
        }

        // The search also matches culture and title text; only keep it if the
        // sample is actually by this artist.
        if !samples.is_empty() && !samples.iter().any(|o| o.is_by(&query.name)) {
            debug!(artist = %query.name, "met search matched no objects by this artist");
            return Ok(None);
        }
        samples.retain(|o| o.is_by(&query.name));

        Ok(Some(record(search.total, &samples)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(artist: &str, department: &str, tags: &[&str]) -> MetObject {
        MetObject {
            artist_display_name: artist.to_string(),
            department: department.to_string(),
            classification: "Paintings".to_string(),
            tags: Some(
                tags.iter()
                    .map(|t| MetTag {
                        term: (*t).to_string(),
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_record_collects_terms() {
        let samples = vec![
            object("Rembrandt (Rembrandt van Rijn)", "European Paintings", &["Portraits", "Men"]),
            object("Rembrandt (Rembrandt van Rijn)", "Drawings and Prints", &["Portraits"]),
        ];

        let record = record(412, &samples);
        assert_eq!(record.source_name, "met_museum");
        assert_eq!(record.total_works_or_mentions, 412);
        assert_eq!(
            record.category_tags,
            vec![
                "drawings and prints",
                "european paintings",
                "men",
                "paintings",
                "portraits"
            ]
        );
        assert!(record.importance_signal > 50.0);
    }

    #[test]
    fn test_artist_name_matching() {
        let o = object("Rembrandt (Rembrandt van Rijn)", "European Paintings", &[]);
        assert!(o.is_by("Rembrandt van Rijn"));
        assert!(!o.is_by("Peter Paul Rubens"));
    }

    #[test]
    fn test_search_response_without_ids() {
        let search: SearchResponse =
            serde_json::from_str(r#"{"total":0,"objectIDs":null}"#).unwrap();
        assert_eq!(search.total, 0);
        assert!(search.object_ids.is_none());
    }
}
