//! Runs every collector for one artist, with caching and per-call timeouts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::apt::evidence::{ArtistQuery, CollectorOutcome, SourcedOutcome};
use crate::clients::{Collector, CollectorError};
use crate::config::{CollectorConfig, Config};
use crate::db::{CachedEvidence, Store};

#[derive(Debug, Clone, Copy)]
struct CollectorPolicy {
    timeout: Duration,
    cache_ttl_hours: i64,
}

impl From<&CollectorConfig> for CollectorPolicy {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds.max(1)),
            cache_ttl_hours: config.cache_ttl_hours,
        }
    }
}

pub struct EvidenceService {
    store: Store,
    collectors: Vec<Arc<dyn Collector>>,
    policies: HashMap<&'static str, CollectorPolicy>,
    fallback: CollectorPolicy,
}

impl EvidenceService {
    #[must_use]
    pub fn new(store: Store, collectors: Vec<Arc<dyn Collector>>, config: &Config) -> Self {
        let policies = config
            .collector_configs()
            .into_iter()
            .map(|(source, collector)| (source, CollectorPolicy::from(collector)))
            .collect();

        Self {
            store,
            collectors,
            policies,
            fallback: CollectorPolicy::from(&CollectorConfig::default()),
        }
    }

    #[must_use]
    pub fn sources(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.source()).collect()
    }

    fn policy(&self, source: &str) -> CollectorPolicy {
        self.policies.get(source).copied().unwrap_or(self.fallback)
    }

    /// Outcomes from every collector, in collector order. Never fails:
    /// problems become `TransportError` or `Malformed` outcomes.
    pub async fn gather(&self, query: &ArtistQuery) -> Vec<SourcedOutcome> {
        let lookup_key = query.cache_key();

        join_all(
            self.collectors
                .iter()
                .map(|collector| self.gather_one(collector.as_ref(), query, &lookup_key)),
        )
        .await
    }

    async fn gather_one(
        &self,
        collector: &dyn Collector,
        query: &ArtistQuery,
        lookup_key: &str,
    ) -> SourcedOutcome {
        let source = collector.source();
        let policy = self.policy(source);

        match self.store.cached_evidence(source, lookup_key).await {
            Ok(Some(cached)) => {
                debug!(source, artist = %query.name, "evidence cache hit");
                metrics::counter!(
                    "apt_collector_calls_total",
                    "source" => source,
                    "outcome" => "cache_hit"
                )
                .increment(1);
                let outcome = match cached {
                    CachedEvidence::Found(record) => CollectorOutcome::Found(record),
                    CachedEvidence::NotFound => CollectorOutcome::NotFound,
                };
                return SourcedOutcome::new(source, outcome);
            }
            Ok(None) => {}
            Err(e) => warn!(source, error = %e, "Evidence cache read failed"),
        }

        let outcome = match tokio::time::timeout(policy.timeout, collector.collect(query)).await {
            Err(_) => CollectorOutcome::TransportError(format!(
                "timed out after {}s",
                policy.timeout.as_secs()
            )),
            Ok(Ok(Some(record))) => CollectorOutcome::Found(record),
            Ok(Ok(None)) => CollectorOutcome::NotFound,
            Ok(Err(CollectorError::Malformed(reason))) => CollectorOutcome::Malformed(reason),
            Ok(Err(e)) => CollectorOutcome::TransportError(e.to_string()),
        };

        metrics::counter!(
            "apt_collector_calls_total",
            "source" => source,
            "outcome" => outcome.label()
        )
        .increment(1);

        let cacheable = match &outcome {
            CollectorOutcome::Found(record) => Some(CachedEvidence::Found(record.clone())),
            CollectorOutcome::NotFound => Some(CachedEvidence::NotFound),
            CollectorOutcome::TransportError(reason) => {
                warn!(source, artist = %query.name, error = %reason, "Collector unavailable, treating as no evidence");
                None
            }
            CollectorOutcome::Malformed(reason) => {
                warn!(source, artist = %query.name, error = %reason, "Collector returned malformed data");
                None
            }
        };

        if let Some(entry) = cacheable {
            if let Err(e) = self
                .store
                .cache_evidence(source, lookup_key, &entry, policy.cache_ttl_hours)
                .await
            {
                warn!(source, error = %e, "Evidence cache write failed");
            }
        }

        SourcedOutcome::new(source, outcome)
    }
}
