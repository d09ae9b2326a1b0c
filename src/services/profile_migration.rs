//! Brings stored profiles to the current schema version.
//!
//! Two inputs: documents already embedded in `artists.apt_profile` in a
//! legacy shape, and rows of the `artist_apt_mappings` table.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::apt::legacy::{self, LegacyHints};
use crate::apt::{AptProfile, StoredProfile};
use crate::db::{Store, WriteOutcome};
use crate::domain::{ArtistId, WriteMode};
use crate::services::classification_service::ClassificationError;

#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Embedded legacy documents rewritten as version 1
    pub converted: usize,
    /// Mapping rows written to artists
    pub imported: usize,
    pub already_current: usize,
    /// Mapping rows skipped because the artist already has a profile
    pub skipped_existing: usize,
    pub rejected_protected: usize,
    pub failures: Vec<(ArtistId, String)>,
}

impl MigrationReport {
    fn count(&mut self, id: ArtistId, outcome: WriteOutcome, written: impl FnOnce(&mut Self)) {
        match outcome {
            WriteOutcome::Written => written(self),
            WriteOutcome::Unchanged => self.already_current += 1,
            WriteOutcome::RejectedProtected => self.rejected_protected += 1,
            WriteOutcome::ArtistMissing => self
                .failures
                .push((id, ClassificationError::NotFound(id).to_string())),
        }
    }
}

pub struct ProfileMigrationService {
    store: Store,
}

impl ProfileMigrationService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Converts every legacy profile it can find.
    ///
    /// Embedded documents keep their `meta.source`, so converting a legacy
    /// expert preset leaves it protected. Mapping rows only fill artists
    /// without a profile unless `mode` is forced.
    pub async fn migrate(&self, mode: WriteMode) -> Result<MigrationReport, ClassificationError> {
        let mut report = MigrationReport::default();
        let now = chrono::Utc::now().to_rfc3339();

        let artists = self.store.list_artists().await?;
        let mut with_profile = HashSet::new();

        for artist in &artists {
            let Some(raw) = artist.apt_profile.as_deref() else {
                continue;
            };
            with_profile.insert(artist.id);

            match AptProfile::parse_stored(raw, &now) {
                Ok(StoredProfile::Current(_)) => report.already_current += 1,
                Ok(StoredProfile::Migrated(profile)) => {
                    // Same document in a new shape: protection does not apply.
                    let id = artist.artist_id();
                    let outcome = self.write(id, &profile, WriteMode::Force).await?;
                    report.count(id, outcome, |r| r.converted += 1);
                }
                Err(e) => {
                    warn!(artist_id = artist.id, error = %e, "Cannot migrate stored profile");
                    report.failures.push((artist.artist_id(), e.to_string()));
                }
            }
        }

        let mut seen = HashSet::new();
        for mapping in self.store.legacy_mappings().await? {
            // Rows are newest first per artist; only the newest counts.
            if !seen.insert(mapping.artist_id) {
                continue;
            }

            let id = ArtistId::new(mapping.artist_id);
            if with_profile.contains(&mapping.artist_id) && !mode.is_forced() {
                report.skipped_existing += 1;
                continue;
            }

            let hints = LegacyHints {
                confidence: mapping.confidence_score,
                source: mapping.mapping_method.clone(),
                notes: mapping.mapping_notes.clone(),
            };

            let converted = serde_json::from_str::<serde_json::Value>(&mapping.apt_profile)
                .map_err(crate::apt::ProfileError::from)
                .and_then(|value| {
                    if value.get("version").is_some() {
                        AptProfile::from_json(&mapping.apt_profile)
                    } else {
                        legacy::migrate(&value, &hints, &now)
                    }
                });

            match converted {
                Ok(profile) => {
                    let outcome = self.write(id, &profile, mode).await?;
                    report.count(id, outcome, |r| r.imported += 1);
                }
                Err(e) => {
                    warn!(artist_id = mapping.artist_id, mapping_id = mapping.id, error = %e, "Cannot migrate mapping row");
                    report.failures.push((id, e.to_string()));
                }
            }
        }

        info!(
            event = "legacy_migration_completed",
            converted = report.converted,
            imported = report.imported,
            already_current = report.already_current,
            skipped_existing = report.skipped_existing,
            rejected_protected = report.rejected_protected,
            failed = report.failures.len(),
            "Legacy profile migration finished"
        );

        Ok(report)
    }

    async fn write(
        &self,
        id: ArtistId,
        profile: &AptProfile,
        mode: WriteMode,
    ) -> Result<WriteOutcome, ClassificationError> {
        let json = profile.to_json()?;
        Ok(self.store.write_profile(id, profile, &json, mode).await?)
    }
}
