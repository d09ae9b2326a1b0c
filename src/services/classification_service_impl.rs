//! `SeaORM` implementation of the `ClassificationService` trait.
//!
//! One artist goes through claim, load, evidence, merge, score, resolve and
//! a guarded write. Batches run artists through a buffered stream.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::apt::profile::ProfileDraft;
use crate::apt::resolver::{ResolverSettings, artist_seed, resolve};
use crate::apt::{AptProfile, AxisScorer, merge};
use crate::constants::profile::{
    EXPERT_PRESET_SOURCE, METHOD_NEUTRAL_TIEBREAK, METHOD_RULE_TABLE, PIPELINE_SOURCE,
};
use crate::config::Config;
use crate::db::{Store, WriteOutcome, is_protected_document};
use crate::domain::{ArtistId, WriteMode};
use crate::services::classification_service::{
    BatchOptions, BatchReport, Classification, ClassificationError, ClassificationService,
    ClassifyOptions, ClassifyOutcome,
};
use crate::services::evidence::EvidenceService;
use crate::state::ClassificationContext;

const LOW_SEPARATION_NOTE: &str =
    "scores near neutral; archetype chosen by per-artist tiebreak";

pub struct SeaOrmClassificationService {
    store: Store,
    evidence: EvidenceService,
    scorer: Arc<AxisScorer>,
    settings: ResolverSettings,
    config: Arc<Config>,
    worker_id: String,
}

impl SeaOrmClassificationService {
    #[must_use]
    pub fn new(ctx: &ClassificationContext) -> Self {
        Self {
            store: ctx.store.clone(),
            evidence: EvidenceService::new(ctx.store.clone(), ctx.collectors.clone(), &ctx.config),
            scorer: ctx.scorer.clone(),
            settings: ctx.resolver_settings(),
            config: ctx.config.clone(),
            worker_id: Uuid::new_v4().to_string(),
        }
    }

    async fn run_pipeline(
        &self,
        id: ArtistId,
        options: ClassifyOptions,
    ) -> Result<ClassifyOutcome, ClassificationError> {
        let artist = self
            .store
            .get_artist(id)
            .await?
            .ok_or(ClassificationError::NotFound(id))?;

        if !options.mode.is_forced()
            && artist
                .apt_profile
                .as_deref()
                .is_some_and(is_protected_document)
        {
            return Err(ClassificationError::ProtectedProfile(id));
        }

        let outcomes = self.evidence.gather(&artist.query()).await;
        let merged = merge(outcomes);
        let card = self.scorer.score(&artist.rule_input(&merged));

        let seed = artist_seed(id.value(), &artist.name);
        let resolution = resolve(&card.scores, card.evidence_strength, seed, &self.settings);

        let mut reasoning = card.reasoning();
        let method = if resolution.is_low_separation() {
            if self.config.classification.unknown_on_low_separation {
                info!(artist_id = %id, artist = %artist.name, "Scores near neutral, leaving artist undetermined");
                return Ok(ClassifyOutcome::Undetermined { reasoning });
            }
            reasoning.push_str("; ");
            reasoning.push_str(LOW_SEPARATION_NOTE);
            METHOD_NEUTRAL_TIEBREAK
        } else {
            METHOD_RULE_TABLE
        };

        let profile = AptProfile::from_draft(ProfileDraft {
            scores: &card.scores,
            resolution: &resolution,
            source: PIPELINE_SOURCE,
            method,
            reasoning,
            data_sources: merged.data_sources.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
        let json = profile.to_json()?;

        let classification = Classification {
            profile,
            status: resolution.status,
            discarded: merged.discarded,
        };

        if options.dry_run {
            return Ok(ClassifyOutcome::DryRun(classification));
        }

        match self
            .store
            .write_profile(id, &classification.profile, &json, options.mode)
            .await?
        {
            WriteOutcome::Written => {
                debug!(
                    artist_id = %id,
                    primary = ?classification.profile.primary(),
                    confidence = classification.profile.meta.confidence,
                    "Profile written"
                );
                Ok(ClassifyOutcome::Written(classification))
            }
            WriteOutcome::Unchanged => Ok(ClassifyOutcome::Unchanged(classification)),
            WriteOutcome::RejectedProtected => Err(ClassificationError::ProtectedProfile(id)),
            WriteOutcome::ArtistMissing => Err(ClassificationError::NotFound(id)),
        }
    }

    fn parallelism(&self, options: &BatchOptions) -> usize {
        let requested = options
            .parallelism
            .unwrap_or(self.config.batch.parallelism)
            .max(1);
        let max = self.config.max_parallelism();
        if requested > max {
            warn!(
                requested,
                max, "Parallelism exceeds what the collector rate limits serve, capping"
            );
        }
        requested.min(max)
    }
}

#[async_trait::async_trait]
impl ClassificationService for SeaOrmClassificationService {
    async fn classify_artist(
        &self,
        id: ArtistId,
        options: ClassifyOptions,
    ) -> Result<ClassifyOutcome, ClassificationError> {
        let started = Instant::now();

        if !self
            .store
            .try_claim(id, &self.worker_id, self.config.batch.claim_ttl_seconds)
            .await?
        {
            debug!(artist_id = %id, "Artist claimed by another worker");
            return Ok(ClassifyOutcome::SkippedClaimed);
        }

        let result = self.run_pipeline(id, options).await;

        if let Err(e) = self.store.release_claim(id, &self.worker_id).await {
            warn!(artist_id = %id, error = %e, "Failed to release claim");
        }

        let outcome = match &result {
            Ok(outcome) => outcome.label(),
            Err(ClassificationError::ProtectedProfile(_)) => "rejected_protected",
            Err(_) => "failed",
        };
        metrics::counter!("apt_classifications_total", "outcome" => outcome).increment(1);
        metrics::histogram!("apt_classification_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        result
    }

    async fn classify_batch(&self, options: BatchOptions) -> Result<BatchReport, ClassificationError> {
        match self.store.purge_expired_evidence().await {
            Ok(purged) if purged > 0 => debug!(purged, "Purged expired evidence cache entries"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to purge evidence cache"),
        }

        let ids = self.store.worklist(options.worklist, options.limit).await?;
        info!(
            event = "batch_started",
            artists = ids.len(),
            parallelism = self.parallelism(&options),
            "Starting classification batch"
        );

        Ok(self.classify_ids(&ids, options).await)
    }

    async fn classify_ids(&self, ids: &[ArtistId], options: BatchOptions) -> BatchReport {
        let started = Instant::now();
        let delay = Duration::from_millis(self.config.batch.delay_millis);
        let per_artist = ClassifyOptions {
            mode: options.mode,
            dry_run: false,
        };

        let mut results = futures::stream::iter(ids.iter().copied())
            .map(|id| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                (id, self.classify_artist(id, per_artist).await)
            })
            .buffer_unordered(self.parallelism(&options));

        let mut report = BatchReport::default();
        while let Some((id, result)) = results.next().await {
            if let Err(e) = &result {
                if e.is_fatal() {
                    error!(artist_id = %id, error = %e, "Fatal error, aborting batch");
                    report.aborted = Some(e.to_string());
                    break;
                }
                if !matches!(e, ClassificationError::ProtectedProfile(_)) {
                    warn!(artist_id = %id, error = %e, "Classification failed");
                }
            }
            report.record(id, &result);
        }

        report.elapsed = started.elapsed();
        info!(
            event = "batch_completed",
            written = report.written,
            unchanged = report.unchanged,
            undetermined = report.undetermined,
            rejected_protected = report.rejected_protected,
            skipped_claimed = report.skipped_claimed,
            failed = report.failures.len(),
            aborted = report.aborted.is_some(),
            duration_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Classification batch finished"
        );

        report
    }

    async fn curate(&self, id: ArtistId, raw: &str) -> Result<AptProfile, ClassificationError> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut profile = AptProfile::parse_stored(raw, &now)?.into_profile();
        profile.meta.source = EXPERT_PRESET_SOURCE.to_string();
        profile.meta.timestamp = now;
        let json = profile.to_json()?;

        match self
            .store
            .write_profile(id, &profile, &json, WriteMode::Force)
            .await?
        {
            WriteOutcome::ArtistMissing => Err(ClassificationError::NotFound(id)),
            _ => {
                info!(artist_id = %id, primary = ?profile.primary(), "Stored expert preset");
                Ok(profile)
            }
        }
    }

    async fn reset(&self, include_protected: bool) -> Result<u64, ClassificationError> {
        Ok(self.store.reset_profiles(include_protected).await?)
    }
}
