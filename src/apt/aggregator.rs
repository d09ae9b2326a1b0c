use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::evidence::{CollectorOutcome, EvidenceRecord, SourcedOutcome};
use crate::constants::sources;

/// A collector whose output was dropped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedSource {
    pub source: String,
    pub reason: String,
}

/// Evidence from every contributing collector for one artist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedEvidence {
    /// Collectors that contributed a valid record, sorted
    pub data_sources: Vec<String>,

    /// Tag to the set of sources that reported it
    pub tags: BTreeMap<String, BTreeSet<String>>,

    /// Number of contributing sources that reported at least one tag
    pub tagging_sources: usize,

    /// `(source, text)` pairs in source order
    pub excerpts: Vec<(String, String)>,

    pub total_works: u64,

    /// Reliability-weighted mean of importance signals
    pub importance: f64,

    pub discarded: Vec<DiscardedSource>,

    /// Sources that failed at the transport level
    pub unavailable: Vec<String>,
}

impl MergedEvidence {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_sources.is_empty()
    }

    /// Share of tagging sources that reported `tag` (0 when absent).
    ///
    /// A tag only one of several sources agrees on scores weaker than
    /// one every source reports.
    #[must_use]
    pub fn tag_support(&self, tag: &str) -> f64 {
        if self.tagging_sources == 0 {
            return 0.0;
        }
        self.tags.get(tag).map_or(0.0, |supporters| {
            supporters.len() as f64 / self.tagging_sources as f64
        })
    }

    /// All excerpts joined with newlines.
    #[must_use]
    pub fn excerpt_text(&self) -> String {
        self.excerpts
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// How much a source's importance signal counts relative to the others.
#[must_use]
pub fn source_reliability(source: &str) -> f64 {
    match source {
        sources::WIKIPEDIA => 0.9,
        sources::MET_MUSEUM => 0.8,
        sources::PAGEVIEWS => 0.6,
        _ => 0.5,
    }
}

/// Merges collector outcomes. Never fails: with no usable evidence the
/// result is an empty `MergedEvidence`.
#[must_use]
pub fn merge(outcomes: Vec<SourcedOutcome>) -> MergedEvidence {
    let mut outcomes = outcomes;
    outcomes.sort_by(|a, b| a.source.cmp(&b.source));

    let mut merged = MergedEvidence::default();
    let mut weighted_importance = 0.0;
    let mut total_weight = 0.0;

    for SourcedOutcome { source, outcome } in outcomes {
        match outcome {
            CollectorOutcome::Found(record) => {
                let record = match validate(&source, record) {
                    Ok(record) => record,
                    Err(reason) => {
                        warn!(source = %source, reason = %reason, "Discarding malformed evidence");
                        merged.discarded.push(DiscardedSource { source, reason });
                        continue;
                    }
                };

                let weight = source_reliability(&source);
                weighted_importance += record.importance_signal * weight;
                total_weight += weight;
                merged.total_works = merged.total_works.max(record.total_works_or_mentions);

                if !record.category_tags.is_empty() {
                    merged.tagging_sources += 1;
                }
                for tag in record.category_tags {
                    merged.tags.entry(tag).or_default().insert(source.clone());
                }

                if let Some(text) = record.free_text_excerpt {
                    merged.excerpts.push((source.clone(), text));
                }

                merged.data_sources.push(source);
            }
            CollectorOutcome::NotFound => {
                debug!(source = %source, "No evidence from source");
            }
            CollectorOutcome::TransportError(reason) => {
                debug!(source = %source, reason = %reason, "Source unavailable");
                merged.unavailable.push(source);
            }
            CollectorOutcome::Malformed(reason) => {
                merged.discarded.push(DiscardedSource { source, reason });
            }
        }
    }

    if total_weight > 0.0 {
        merged.importance = weighted_importance / total_weight;
    }

    merged
}

fn validate(source: &str, record: EvidenceRecord) -> Result<EvidenceRecord, String> {
    if record.source_name.trim().is_empty() {
        return Err("empty source name".to_string());
    }
    if !record.source_name.eq_ignore_ascii_case(source) {
        return Err(format!(
            "record claims source '{}' but came from '{source}'",
            record.source_name
        ));
    }
    if !record.importance_signal.is_finite() || !(0.0..=100.0).contains(&record.importance_signal)
    {
        return Err(format!(
            "importance signal {} outside 0-100",
            record.importance_signal
        ));
    }

    let tags: BTreeSet<String> = record
        .category_tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let excerpt = record
        .free_text_excerpt
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    Ok(EvidenceRecord {
        category_tags: tags.into_iter().collect(),
        free_text_excerpt: excerpt,
        ..record
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(source: &str, importance: f64, tags: &[&str]) -> SourcedOutcome {
        SourcedOutcome::new(
            source,
            CollectorOutcome::Found(EvidenceRecord {
                source_name: source.to_string(),
                total_works_or_mentions: 10,
                importance_signal: importance,
                category_tags: tags.iter().map(|t| (*t).to_string()).collect(),
                free_text_excerpt: Some(format!("{source} text")),
            }),
        )
    }

    #[test]
    fn test_empty_input_yields_empty_evidence() {
        let merged = merge(vec![]);
        assert!(merged.is_empty());
        assert!(merged.tags.is_empty());
        assert!(merged.importance.abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_not_found_is_not_an_error() {
        let merged = merge(vec![
            SourcedOutcome::new("wikipedia", CollectorOutcome::NotFound),
            SourcedOutcome::new(
                "met_museum",
                CollectorOutcome::TransportError("timeout".into()),
            ),
        ]);
        assert!(merged.is_empty());
        assert_eq!(merged.unavailable, vec!["met_museum".to_string()]);
    }

    #[test]
    fn test_tags_are_unioned_with_support() {
        let merged = merge(vec![
            found("wikipedia", 80.0, &["Painter", "abstract"]),
            found("met_museum", 60.0, &["painter", "portrait"]),
        ]);

        assert_eq!(merged.data_sources, vec!["met_museum", "wikipedia"]);
        assert_eq!(merged.tagging_sources, 2);
        assert!((merged.tag_support("painter") - 1.0).abs() < f64::EPSILON);
        assert!((merged.tag_support("abstract") - 0.5).abs() < f64::EPSILON);
        assert!((merged.tag_support("portrait") - 0.5).abs() < f64::EPSILON);
        assert!(merged.tag_support("cubism").abs() < f64::EPSILON);
    }

    #[test]
    fn test_importance_is_reliability_weighted() {
        let merged = merge(vec![
            found("wikipedia", 100.0, &[]),
            found("pageviews", 0.0, &[]),
        ]);
        let expected = 100.0 * 0.9 / (0.9 + 0.6);
        assert!((merged.importance - expected).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_records_are_discarded() {
        let merged = merge(vec![
            found("wikipedia", 140.0, &["abstract"]),
            found("met_museum", 50.0, &[]),
        ]);
        assert_eq!(merged.data_sources, vec!["met_museum"]);
        assert_eq!(merged.discarded.len(), 1);
        assert_eq!(merged.discarded[0].source, "wikipedia");
        assert!(merged.tags.is_empty());
    }

    #[test]
    fn test_merge_is_order_independent() {
        let a = merge(vec![
            found("wikipedia", 70.0, &["a"]),
            found("met_museum", 30.0, &["b"]),
        ]);
        let b = merge(vec![
            found("met_museum", 30.0, &["b"]),
            found("wikipedia", 70.0, &["a"]),
        ]);
        assert_eq!(a, b);
    }
}
