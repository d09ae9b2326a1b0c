//! Domain service for artist classification.
//!
//! This module provides the [`ClassificationService`] trait, covering the
//! single-artist pipeline, batch runs, expert curation and profile reset.

use std::time::Duration;

use crate::apt::aggregator::DiscardedSource;
use crate::apt::resolver::ResolutionStatus;
use crate::apt::{AptProfile, ProfileError};
use crate::domain::{ArtistId, Worklist, WriteMode};
use sea_orm::DbErr;
use thiserror::Error;

/// Domain errors for classification.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Artist {0} not found")]
    NotFound(ArtistId),

    #[error("Artist {0} has a protected profile; use --force to overwrite")]
    ProtectedProfile(ArtistId),

    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    #[error("Database error: {0}")]
    Database(String),

    /// Connection to the database is gone; a batch cannot continue.
    #[error("Database connection lost: {0}")]
    Connection(String),
}

impl ClassificationError {
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<DbErr> for ClassificationError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::Connection(err.to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ClassificationError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DbErr>() {
            Some(DbErr::Conn(_) | DbErr::ConnectionAcquire(_)) => {
                Self::Connection(format!("{err:#}"))
            }
            _ => Self::Database(format!("{err:#}")),
        }
    }
}

/// A profile produced by the pipeline, with what went into it.
#[derive(Debug, Clone)]
pub struct Classification {
    pub profile: AptProfile,
    pub status: ResolutionStatus,
    pub discarded: Vec<DiscardedSource>,
}

#[derive(Debug, Clone)]
pub enum ClassifyOutcome {
    Written(Classification),
    /// Stored profile already had the same content
    Unchanged(Classification),
    /// Computed but not persisted
    DryRun(Classification),
    /// Scores too close to neutral and the config asks for no guess
    Undetermined { reasoning: String },
    /// Another worker holds the claim on this artist
    SkippedClaimed,
}

impl ClassifyOutcome {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Written(_) => "written",
            Self::Unchanged(_) => "unchanged",
            Self::DryRun(_) => "dry_run",
            Self::Undetermined { .. } => "undetermined",
            Self::SkippedClaimed => "skipped_claimed",
        }
    }

    #[must_use]
    pub const fn classification(&self) -> Option<&Classification> {
        match self {
            Self::Written(c) | Self::Unchanged(c) | Self::DryRun(c) => Some(c),
            Self::Undetermined { .. } | Self::SkippedClaimed => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOptions {
    pub mode: WriteMode,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub worklist: Worklist,
    pub limit: Option<u64>,
    pub mode: WriteMode,
    /// Overrides `batch.parallelism`
    pub parallelism: Option<usize>,
}

/// Per-outcome counts for one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub written: usize,
    pub unchanged: usize,
    pub undetermined: usize,
    pub rejected_protected: usize,
    pub skipped_claimed: usize,
    pub failures: Vec<(ArtistId, String)>,
    /// Set when a fatal error stopped the batch early
    pub aborted: Option<String>,
    pub elapsed: Duration,
}

impl BatchReport {
    #[must_use]
    pub fn processed(&self) -> usize {
        self.written
            + self.unchanged
            + self.undetermined
            + self.rejected_protected
            + self.skipped_claimed
            + self.failures.len()
    }

    pub(crate) fn record(&mut self, id: ArtistId, result: &Result<ClassifyOutcome, ClassificationError>) {
        match result {
            Ok(ClassifyOutcome::Written(_)) => self.written += 1,
            Ok(ClassifyOutcome::Unchanged(_) | ClassifyOutcome::DryRun(_)) => self.unchanged += 1,
            Ok(ClassifyOutcome::Undetermined { .. }) => self.undetermined += 1,
            Ok(ClassifyOutcome::SkippedClaimed) => self.skipped_claimed += 1,
            Err(ClassificationError::ProtectedProfile(_)) => self.rejected_protected += 1,
            Err(e) => self.failures.push((id, e.to_string())),
        }
    }
}

/// Domain service trait for classification.
#[async_trait::async_trait]
pub trait ClassificationService: Send + Sync {
    /// Runs the full pipeline for one artist.
    ///
    /// # Errors
    ///
    /// - Returns [`ClassificationError::NotFound`] if the artist does not exist
    /// - Returns [`ClassificationError::ProtectedProfile`] if the stored profile
    ///   is protected and `options.mode` is not forced
    /// - Returns [`ClassificationError::Connection`] if the database is gone
    async fn classify_artist(
        &self,
        id: ArtistId,
        options: ClassifyOptions,
    ) -> Result<ClassifyOutcome, ClassificationError>;

    /// Classifies the worklist selected by `options`.
    ///
    /// Per-artist failures are collected in the report; only loading the
    /// worklist itself can fail.
    async fn classify_batch(&self, options: BatchOptions) -> Result<BatchReport, ClassificationError>;

    /// Classifies exactly `ids`, in any order.
    async fn classify_ids(&self, ids: &[ArtistId], options: BatchOptions) -> BatchReport;

    /// Stores a hand-written profile as an expert preset.
    ///
    /// # Errors
    ///
    /// - Returns [`ClassificationError::InvalidProfile`] if `raw` is not a
    ///   valid current or legacy profile
    async fn curate(&self, id: ArtistId, raw: &str) -> Result<AptProfile, ClassificationError>;

    /// Clears profiles so the next batch reclassifies them.
    async fn reset(&self, include_protected: bool) -> Result<u64, ClassificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_fatal() {
        let err = ClassificationError::from(DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "closed".into(),
        )));
        assert!(err.is_fatal());

        let wrapped = anyhow::Error::new(DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "closed".into(),
        )))
        .context("loading artist");
        assert!(ClassificationError::from(wrapped).is_fatal());

        let other = ClassificationError::from(DbErr::RecordNotFound("artist".into()));
        assert!(!other.is_fatal());
    }

    #[test]
    fn test_report_counts_outcomes() {
        let mut report = BatchReport::default();
        report.record(
            ArtistId::new(1),
            &Ok(ClassifyOutcome::Undetermined {
                reasoning: String::new(),
            }),
        );
        report.record(
            ArtistId::new(2),
            &Err(ClassificationError::ProtectedProfile(ArtistId::new(2))),
        );
        report.record(ArtistId::new(3), &Err(ClassificationError::NotFound(ArtistId::new(3))));

        assert_eq!(report.undetermined, 1);
        assert_eq!(report.rejected_protected, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.processed(), 3);
    }
}
