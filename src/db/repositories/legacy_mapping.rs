use crate::entities::{artist_apt_mappings, prelude::*};
use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};

/// A row of the legacy mapping table.
#[derive(Debug, Clone)]
pub struct LegacyMapping {
    pub id: i32,
    pub artist_id: i32,
    pub apt_profile: String,
    pub confidence_score: Option<f64>,
    pub mapping_method: Option<String>,
    pub mapping_notes: Option<String>,
}

pub struct LegacyMappingRepository {
    conn: DatabaseConnection,
}

impl LegacyMappingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Every mapping, newest first within each artist.
    pub async fn list(&self) -> Result<Vec<LegacyMapping>> {
        let rows = ArtistAptMappings::find()
            .order_by_asc(artist_apt_mappings::Column::ArtistId)
            .order_by_desc(artist_apt_mappings::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|m| LegacyMapping {
                id: m.id,
                artist_id: m.artist_id,
                apt_profile: m.apt_profile,
                confidence_score: m.confidence_score,
                mapping_method: m.mapping_method,
                mapping_notes: m.mapping_notes,
            })
            .collect())
    }

    pub async fn add(
        &self,
        artist_id: i32,
        apt_profile: &str,
        confidence_score: Option<f64>,
        mapping_method: Option<&str>,
        mapping_notes: Option<&str>,
    ) -> Result<i32> {
        let active_model = artist_apt_mappings::ActiveModel {
            artist_id: Set(artist_id),
            apt_profile: Set(apt_profile.to_string()),
            confidence_score: Set(confidence_score),
            mapping_method: Set(mapping_method.map(str::to_string)),
            mapping_notes: Set(mapping_notes.map(str::to_string)),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = ArtistAptMappings::insert(active_model)
            .exec(&self.conn)
            .await?;
        Ok(result.last_insert_id)
    }
}
