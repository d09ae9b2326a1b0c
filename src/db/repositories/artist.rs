use crate::apt::profile::is_protected_source;
use crate::apt::AptProfile;
use crate::constants::profile::PROTECTED_SOURCES;
use crate::domain::{Worklist, WriteMode};
use crate::entities::{artists, prelude::*};
use crate::models::artist::{Artist, NewArtist};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};

/// Result of a guarded profile write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Stored document already has the same content
    Unchanged,
    /// Stored document is an expert preset or manual curation
    RejectedProtected,
    ArtistMissing,
}

/// `meta.source` (or a top-level `source`) of a stored document, read leniently so legacy and
/// otherwise invalid documents still report their origin.
fn stored_source(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value
        .get("meta")
        .and_then(|meta| meta.get("source"))
        .or_else(|| value.get("source"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

#[must_use]
pub fn is_protected_document(raw: &str) -> bool {
    stored_source(raw).is_some_and(|source| is_protected_source(&source))
}

pub struct ArtistRepository {
    conn: DatabaseConnection,
}

impl ArtistRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: artists::Model) -> Artist {
        Artist {
            id: model.id,
            name: model.name,
            name_ko: model.name_ko,
            nationality: model.nationality,
            era: model.era,
            birth_year: model.birth_year,
            death_year: model.death_year,
            biography: model.biography,
            follower_count: model.follower_count,
            is_verified: model.is_verified,
            apt_profile: model.apt_profile,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn add(&self, artist: &NewArtist) -> anyhow::Result<i32> {
        let now = chrono::Utc::now().to_rfc3339();
        let active_model = artists::ActiveModel {
            name: Set(artist.name.trim().to_string()),
            name_ko: Set(artist.name_ko.clone()),
            nationality: Set(artist.nationality.clone()),
            era: Set(artist.era.clone()),
            birth_year: Set(artist.birth_year),
            death_year: Set(artist.death_year),
            biography: Set(artist.biography.clone()),
            follower_count: Set(artist.follower_count.max(0)),
            is_verified: Set(artist.is_verified),
            apt_profile: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        info!(artist_id = model.id, name = %model.name, "Added artist");
        Ok(model.id)
    }

    pub async fn get(&self, id: i32) -> anyhow::Result<Option<Artist>> {
        let row = Artists::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn list(&self) -> anyhow::Result<Vec<Artist>> {
        let rows = Artists::find()
            .order_by_asc(artists::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Artist ids to classify, in id order.
    pub async fn worklist(&self, worklist: Worklist, limit: Option<u64>) -> anyhow::Result<Vec<i32>> {
        let mut query = Artists::find()
            .select_only()
            .column(artists::Column::Id)
            .order_by_asc(artists::Column::Id);

        if worklist == Worklist::Unclassified {
            query = query.filter(artists::Column::AptProfile.is_null());
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        Ok(query.into_tuple::<i32>().all(&self.conn).await?)
    }

    /// Writes `json` unless the stored profile is protected or identical.
    ///
    /// The read and the write share one transaction.
    pub async fn write_profile(
        &self,
        id: i32,
        profile: &AptProfile,
        json: &str,
        mode: WriteMode,
    ) -> anyhow::Result<WriteOutcome> {
        let txn = self.conn.begin().await?;

        let Some(row) = Artists::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(WriteOutcome::ArtistMissing);
        };

        if let Some(stored) = row.apt_profile.as_deref() {
            if is_protected_document(stored) && !mode.is_forced() {
                txn.rollback().await?;
                debug!(artist_id = id, "Stored profile is protected, skipping write");
                return Ok(WriteOutcome::RejectedProtected);
            }

            let unchanged = AptProfile::from_json(stored)
                .is_ok_and(|current| current.same_content(profile));
            if unchanged {
                txn.rollback().await?;
                return Ok(WriteOutcome::Unchanged);
            }
        }

        Artists::update_many()
            .col_expr(artists::Column::AptProfile, Expr::value(json))
            .col_expr(
                artists::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(artists::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(WriteOutcome::Written)
    }

    /// Stores a document as-is, bypassing validation.
    pub async fn set_raw_profile(&self, id: i32, raw: Option<&str>) -> anyhow::Result<()> {
        Artists::update_many()
            .col_expr(
                artists::Column::AptProfile,
                Expr::value(raw.map(str::to_string)),
            )
            .filter(artists::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Clears every profile in one statement, keeping protected ones
    /// unless `include_protected`.
    pub async fn reset_profiles(&self, include_protected: bool) -> anyhow::Result<u64> {
        let mut update = Artists::update_many()
            .col_expr(
                artists::Column::AptProfile,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                artists::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(artists::Column::AptProfile.is_not_null());

        if !include_protected {
            let protected = PROTECTED_SOURCES
                .iter()
                .map(|s| format!("'{s}'"))
                .collect::<Vec<_>>()
                .join(", ");
            update = update.filter(Expr::cust(format!(
                "(CASE WHEN json_valid(apt_profile) \
                 THEN lower(trim(coalesce(json_extract(apt_profile, '$.meta.source'), \
                 json_extract(apt_profile, '$.source'), ''))) \
                 ELSE '' END) NOT IN ({protected})"
            )));
        }

        let result = update.exec(&self.conn).await?;
        info!(
            cleared = result.rows_affected,
            include_protected, "Reset artist profiles"
        );
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_document_detection() {
        assert!(is_protected_document(
            r#"{"version":1,"meta":{"source":"expert_preset"}}"#
        ));
        assert!(is_protected_document(
            r#"{"meta":{"source":"manual_curation","reasoning":["x"]}}"#
        ));
        assert!(!is_protected_document(
            r#"{"version":1,"meta":{"source":"rule_based_v1"}}"#
        ));
        assert!(is_protected_document(
            r#"{"source":"Expert_Preset","primary_types":[]}"#
        ));
        assert!(!is_protected_document("not json"));
    }
}
