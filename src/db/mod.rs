use crate::apt::AptProfile;
use crate::domain::{ArtistId, Worklist, WriteMode};
use crate::models::artist::{Artist, NewArtist};
use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::artist::{WriteOutcome, is_protected_document};
pub use repositories::cache::CachedEvidence;
pub use repositories::legacy_mapping::LegacyMapping;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn from_config(config: &crate::config::Config) -> Result<Self> {
        Self::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
    }

    fn artist_repo(&self) -> repositories::artist::ArtistRepository {
        repositories::artist::ArtistRepository::new(self.conn.clone())
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }

    fn claim_repo(&self) -> repositories::claims::ClaimRepository {
        repositories::claims::ClaimRepository::new(self.conn.clone())
    }

    fn legacy_repo(&self) -> repositories::legacy_mapping::LegacyMappingRepository {
        repositories::legacy_mapping::LegacyMappingRepository::new(self.conn.clone())
    }

    // ========== Artist Repository Methods ==========

    pub async fn add_artist(&self, artist: &NewArtist) -> Result<ArtistId> {
        self.artist_repo().add(artist).await.map(ArtistId::new)
    }

    pub async fn get_artist(&self, id: ArtistId) -> Result<Option<Artist>> {
        self.artist_repo().get(id.value()).await
    }

    pub async fn list_artists(&self) -> Result<Vec<Artist>> {
        self.artist_repo().list().await
    }

    pub async fn worklist(&self, worklist: Worklist, limit: Option<u64>) -> Result<Vec<ArtistId>> {
        let ids = self.artist_repo().worklist(worklist, limit).await?;
        Ok(ids.into_iter().map(ArtistId::new).collect())
    }

    pub async fn write_profile(
        &self,
        id: ArtistId,
        profile: &AptProfile,
        json: &str,
        mode: WriteMode,
    ) -> Result<WriteOutcome> {
        self.artist_repo()
            .write_profile(id.value(), profile, json, mode)
            .await
    }

    pub async fn set_raw_profile(&self, id: ArtistId, raw: Option<&str>) -> Result<()> {
        self.artist_repo().set_raw_profile(id.value(), raw).await
    }

    pub async fn reset_profiles(&self, include_protected: bool) -> Result<u64> {
        self.artist_repo().reset_profiles(include_protected).await
    }

    // ========== Evidence Cache Repository Methods ==========

    pub async fn cached_evidence(
        &self,
        source: &str,
        lookup_key: &str,
    ) -> Result<Option<CachedEvidence>> {
        self.cache_repo().get_fresh(source, lookup_key).await
    }

    pub async fn cache_evidence(
        &self,
        source: &str,
        lookup_key: &str,
        evidence: &CachedEvidence,
        ttl_hours: i64,
    ) -> Result<()> {
        self.cache_repo()
            .put(source, lookup_key, evidence, ttl_hours)
            .await
    }

    pub async fn purge_expired_evidence(&self) -> Result<u64> {
        self.cache_repo().purge_expired().await
    }

    // ========== Claim Repository Methods ==========

    pub async fn try_claim(&self, id: ArtistId, worker_id: &str, ttl_seconds: i64) -> Result<bool> {
        self.claim_repo()
            .try_claim(id.value(), worker_id, ttl_seconds)
            .await
    }

    pub async fn release_claim(&self, id: ArtistId, worker_id: &str) -> Result<()> {
        self.claim_repo().release(id.value(), worker_id).await
    }

    // ========== Legacy Mapping Repository Methods ==========

    pub async fn legacy_mappings(&self) -> Result<Vec<LegacyMapping>> {
        self.legacy_repo().list().await
    }

    pub async fn add_legacy_mapping(
        &self,
        id: ArtistId,
        apt_profile: &str,
        confidence_score: Option<f64>,
        mapping_method: Option<&str>,
        mapping_notes: Option<&str>,
    ) -> Result<i32> {
        self.legacy_repo()
            .add(
                id.value(),
                apt_profile,
                confidence_score,
                mapping_method,
                mapping_notes,
            )
            .await
    }
}
