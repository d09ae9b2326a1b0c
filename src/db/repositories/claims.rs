use crate::entities::{classification_claims, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Row-level claims so two workers never classify the same artist at once.
pub struct ClaimRepository {
    conn: DatabaseConnection,
}

impl ClaimRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Claims `artist_id` for `worker_id`, reclaiming claims older than
    /// `ttl_seconds`. Returns false when another worker holds a live claim.
    pub async fn try_claim(&self, artist_id: i32, worker_id: &str, ttl_seconds: i64) -> Result<bool> {
        let now = chrono::Utc::now();
        let stale_before = (now - chrono::Duration::seconds(ttl_seconds.max(0))).to_rfc3339();

        ClassificationClaims::delete_many()
            .filter(classification_claims::Column::ArtistId.eq(artist_id))
            .filter(classification_claims::Column::ClaimedAt.lt(stale_before))
            .exec(&self.conn)
            .await?;

        let active_model = classification_claims::ActiveModel {
            artist_id: Set(artist_id),
            worker_id: Set(worker_id.to_string()),
            claimed_at: Set(now.to_rfc3339()),
        };

        let inserted = ClassificationClaims::insert(active_model)
            .on_conflict(
                OnConflict::column(classification_claims::Column::ArtistId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(inserted == 1)
    }

    pub async fn release(&self, artist_id: i32, worker_id: &str) -> Result<()> {
        ClassificationClaims::delete_many()
            .filter(classification_claims::Column::ArtistId.eq(artist_id))
            .filter(classification_claims::Column::WorkerId.eq(worker_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
