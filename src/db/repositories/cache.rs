use crate::apt::EvidenceRecord;
use crate::entities::{evidence_cache, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::debug;

/// A cached collector answer. Transport failures are never cached.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedEvidence {
    Found(EvidenceRecord),
    NotFound,
}

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_fresh(&self, source: &str, lookup_key: &str) -> Result<Option<CachedEvidence>> {
        let now = chrono::Utc::now().to_rfc3339();

        let entry = EvidenceCache::find()
            .filter(evidence_cache::Column::Source.eq(source))
            .filter(evidence_cache::Column::LookupKey.eq(lookup_key))
            .filter(evidence_cache::Column::ExpiresAt.gt(&now))
            .one(&self.conn)
            .await?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        match entry.payload {
            None => Ok(Some(CachedEvidence::NotFound)),
            Some(payload) => match serde_json::from_str::<EvidenceRecord>(&payload) {
                Ok(record) => Ok(Some(CachedEvidence::Found(record))),
                Err(e) => {
                    debug!(source, lookup_key, error = %e, "Ignoring unreadable cache entry");
                    Ok(None)
                }
            },
        }
    }

    pub async fn put(
        &self,
        source: &str,
        lookup_key: &str,
        evidence: &CachedEvidence,
        ttl_hours: i64,
    ) -> Result<()> {
        let payload = match evidence {
            CachedEvidence::Found(record) => Some(serde_json::to_string(record)?),
            CachedEvidence::NotFound => None,
        };

        let now = chrono::Utc::now();
        let expires_at = now + chrono::Duration::hours(ttl_hours.max(0));

        let active_model = evidence_cache::ActiveModel {
            source: Set(source.to_string()),
            lookup_key: Set(lookup_key.to_string()),
            payload: Set(payload),
            fetched_at: Set(now.to_rfc3339()),
            expires_at: Set(expires_at.to_rfc3339()),
            ..Default::default()
        };

        EvidenceCache::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    evidence_cache::Column::Source,
                    evidence_cache::Column::LookupKey,
                ])
                .update_columns([
                    evidence_cache::Column::Payload,
                    evidence_cache::Column::FetchedAt,
                    evidence_cache::Column::ExpiresAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    /// Drops expired entries; returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = EvidenceCache::delete_many()
            .filter(evidence_cache::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
