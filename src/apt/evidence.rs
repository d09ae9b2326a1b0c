use serde::{Deserialize, Serialize};

use super::attribution::strip_attribution;

/// Normalized signal from one external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub source_name: String,

    /// Holdings count for museums, mentions or views for text sources
    pub total_works_or_mentions: u64,

    /// Source-specific importance heuristic, 0-100
    pub importance_signal: f64,

    #[serde(default)]
    pub category_tags: Vec<String>,

    #[serde(default)]
    pub free_text_excerpt: Option<String>,
}

impl EvidenceRecord {
    #[must_use]
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            total_works_or_mentions: 0,
            importance_signal: 0.0,
            category_tags: Vec::new(),
            free_text_excerpt: None,
        }
    }
}

/// Result of one collector call.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectorOutcome {
    Found(EvidenceRecord),
    NotFound,
    TransportError(String),
    Malformed(String),
}

impl CollectorOutcome {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NotFound => "not_found",
            Self::TransportError(_) => "transport_error",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// One collector's outcome, tagged with the collector that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedOutcome {
    pub source: String,
    pub outcome: CollectorOutcome,
}

impl SourcedOutcome {
    #[must_use]
    pub fn new(source: impl Into<String>, outcome: CollectorOutcome) -> Self {
        Self {
            source: source.into(),
            outcome,
        }
    }
}

/// What collectors are asked to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistQuery {
    /// Name with any attribution prefix removed
    pub name: String,
    pub nationality: Option<String>,
    pub era: Option<String>,
}

impl ArtistQuery {
    #[must_use]
    pub fn new(name: &str, nationality: Option<&str>, era: Option<&str>) -> Self {
        Self {
            name: strip_attribution(name).to_string(),
            nationality: nationality.map(str::to_string),
            era: era.map(str::to_string),
        }
    }

    /// Cache key shared by every collector for this query.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_strips_attribution() {
        let query = ArtistQuery::new("Workshop of  Peter Paul Rubens", Some("Flemish"), None);
        assert_eq!(query.name, "Peter Paul Rubens");
        assert_eq!(query.cache_key(), "peter paul rubens");
        assert_eq!(query.nationality.as_deref(), Some("Flemish"));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(CollectorOutcome::NotFound.label(), "not_found");
        assert_eq!(
            CollectorOutcome::Found(EvidenceRecord::new("wikipedia")).label(),
            "found"
        );
    }
}
