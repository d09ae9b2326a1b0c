//! Store, cache, claim and legacy migration tests on a throwaway SQLite file.

use sayu_apt::apt::{AptProfile, ArchetypeCode, EvidenceRecord};
use sayu_apt::constants::profile::{EXPERT_PRESET_SOURCE, METHOD_LEGACY_MIGRATION};
use sayu_apt::db::{CachedEvidence, Store};
use sayu_apt::domain::{ArtistId, Worklist, WriteMode};
use sayu_apt::models::artist::NewArtist;
use sayu_apt::services::ProfileMigrationService;

async fn test_store() -> Store {
    let db_path = std::env::temp_dir().join(format!(
        "sayu-apt-persistence-test-{}.db",
        uuid::Uuid::new_v4()
    ));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test database")
}

fn top_level_preset() -> &'static str {
    r#"{"source":"expert_preset","primary_types":[{"type":"LAEF","weight":0.7}]}"#
}

fn legacy_preset() -> String {
    serde_json::json!({
        "meta": {"source": "expert_preset", "confidence": 0.85, "reasoning": ["Pop art"]},
        "dimensions": {"L": 30, "S": 70, "A": 40, "R": 60, "E": 45, "M": 55, "F": 35, "C": 65},
        "primary_types": [{"type": "SREC", "weight": 0.8}, {"type": "SRMC", "weight": 0.2}]
    })
    .to_string()
}

#[tokio::test]
async fn test_worklist_selects_unclassified_artists() {
    let store = test_store().await;
    let a = store.add_artist(&NewArtist::named("Jane Doe")).await.unwrap();
    let b = store.add_artist(&NewArtist::named("John Roe")).await.unwrap();
    let c = store.add_artist(&NewArtist::named("Ada Poe")).await.unwrap();

    store.set_raw_profile(b, Some(&legacy_preset())).await.unwrap();

    let pending = store.worklist(Worklist::Unclassified, None).await.unwrap();
    assert_eq!(pending, vec![a, c]);

    let limited = store.worklist(Worklist::All, Some(2)).await.unwrap();
    assert_eq!(limited, vec![a, b]);

    let artist = store.get_artist(b).await.unwrap().unwrap();
    assert_eq!(artist.name, "John Roe");
    assert!(artist.is_classified());
    assert!(store.get_artist(ArtistId::new(777)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reset_keeps_protected_profiles() {
    let store = test_store().await;
    let plain = store.add_artist(&NewArtist::named("Jane Doe")).await.unwrap();
    let preset = store.add_artist(&NewArtist::named("Andy Warhol")).await.unwrap();
    let broken = store.add_artist(&NewArtist::named("John Roe")).await.unwrap();

    store
        .set_raw_profile(
            plain,
            Some(r#"{"meta":{"source":"rule_based_v1"},"primary_types":[{"type":"LAEF","weight":1}]}"#),
        )
        .await
        .unwrap();
    store.set_raw_profile(preset, Some(&legacy_preset())).await.unwrap();
    store.set_raw_profile(broken, Some("not json")).await.unwrap();

    assert_eq!(store.reset_profiles(false).await.unwrap(), 2);
    assert!(store.get_artist(preset).await.unwrap().unwrap().is_classified());
    assert!(!store.get_artist(broken).await.unwrap().unwrap().is_classified());

    assert_eq!(store.reset_profiles(true).await.unwrap(), 1);
    assert!(!store.get_artist(preset).await.unwrap().unwrap().is_classified());
}

#[tokio::test]
async fn test_reset_keeps_presets_with_top_level_source() {
    let store = test_store().await;
    let preset = store.add_artist(&NewArtist::named("Andy Warhol")).await.unwrap();
    store.set_raw_profile(preset, Some(top_level_preset())).await.unwrap();

    assert_eq!(store.reset_profiles(false).await.unwrap(), 0);
    assert_eq!(
        store.get_artist(preset).await.unwrap().unwrap().apt_profile.as_deref(),
        Some(top_level_preset())
    );

    assert_eq!(store.reset_profiles(true).await.unwrap(), 1);
    assert!(!store.get_artist(preset).await.unwrap().unwrap().is_classified());
}

#[tokio::test]
async fn test_evidence_cache_expiry() {
    let store = test_store().await;
    let mut record = EvidenceRecord::new("wikipedia");
    record.total_works_or_mentions = 42;

    store
        .cache_evidence("wikipedia", "jane doe", &CachedEvidence::Found(record.clone()), 24)
        .await
        .unwrap();
    store
        .cache_evidence("met_museum", "jane doe", &CachedEvidence::NotFound, 24)
        .await
        .unwrap();
    store
        .cache_evidence("pageviews", "jane doe", &CachedEvidence::NotFound, 0)
        .await
        .unwrap();

    assert_eq!(
        store.cached_evidence("wikipedia", "jane doe").await.unwrap(),
        Some(CachedEvidence::Found(record))
    );
    assert_eq!(
        store.cached_evidence("met_museum", "jane doe").await.unwrap(),
        Some(CachedEvidence::NotFound)
    );
    assert_eq!(store.cached_evidence("pageviews", "jane doe").await.unwrap(), None);
    assert_eq!(store.cached_evidence("wikipedia", "john roe").await.unwrap(), None);

    assert_eq!(store.purge_expired_evidence().await.unwrap(), 1);
}

#[tokio::test]
async fn test_claims_are_exclusive_until_stale() {
    let store = test_store().await;
    let id = store.add_artist(&NewArtist::named("Jane Doe")).await.unwrap();

    assert!(store.try_claim(id, "worker-a", 600).await.unwrap());
    assert!(!store.try_claim(id, "worker-b", 600).await.unwrap());

    // Releasing someone else's claim is a no-op.
    store.release_claim(id, "worker-b").await.unwrap();
    assert!(!store.try_claim(id, "worker-b", 600).await.unwrap());

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(store.try_claim(id, "worker-b", 0).await.unwrap());

    store.release_claim(id, "worker-b").await.unwrap();
    assert!(store.try_claim(id, "worker-a", 600).await.unwrap());
}

#[tokio::test]
async fn test_protected_write_needs_force() {
    let store = test_store().await;
    let id = store.add_artist(&NewArtist::named("Andy Warhol")).await.unwrap();
    store.set_raw_profile(id, Some(&legacy_preset())).await.unwrap();

    let now = chrono::Utc::now().to_rfc3339();
    let replacement = AptProfile::parse_stored(
        r#"{"primary_types":[{"type":"LAEF","weight":1}]}"#,
        &now,
    )
    .unwrap()
    .into_profile();
    let json = replacement.to_json().unwrap();

    let outcome = store
        .write_profile(id, &replacement, &json, WriteMode::RespectProtected)
        .await
        .unwrap();
    assert_eq!(outcome, sayu_apt::db::WriteOutcome::RejectedProtected);

    let outcome = store
        .write_profile(id, &replacement, &json, WriteMode::Force)
        .await
        .unwrap();
    assert_eq!(outcome, sayu_apt::db::WriteOutcome::Written);
    assert_eq!(
        store.get_artist(id).await.unwrap().unwrap().apt_profile.as_deref(),
        Some(json.as_str())
    );

    let outcome = store
        .write_profile(ArtistId::new(999), &replacement, &json, WriteMode::Force)
        .await
        .unwrap();
    assert_eq!(outcome, sayu_apt::db::WriteOutcome::ArtistMissing);
}

#[tokio::test]
async fn test_legacy_migration_converts_embedded_and_mapped_profiles() {
    let store = test_store().await;
    let embedded = store.add_artist(&NewArtist::named("Andy Warhol")).await.unwrap();
    let mapped = store.add_artist(&NewArtist::named("Jane Doe")).await.unwrap();
    let covered = store.add_artist(&NewArtist::named("John Roe")).await.unwrap();
    let broken = store.add_artist(&NewArtist::named("Ada Poe")).await.unwrap();

    store.set_raw_profile(embedded, Some(&legacy_preset())).await.unwrap();
    store.set_raw_profile(broken, Some("{\"primary_types\": []}")).await.unwrap();

    // Older row first; only the newest one is used.
    store
        .add_legacy_mapping(
            mapped,
            r#"{"primaryTypes":[{"type":"SRMC","weight":0.9}]}"#,
            Some(40.0),
            Some("rule_based_analysis"),
            None,
        )
        .await
        .unwrap();
    store
        .add_legacy_mapping(
            mapped,
            r#"{"primaryTypes":[{"type":"LAEF","weight":0.6},{"type":"LAEC","weight":0.3}]}"#,
            Some(72.0),
            Some("rule_based_analysis_v2"),
            Some("migrated from spreadsheet"),
        )
        .await
        .unwrap();
    store
        .add_legacy_mapping(
            covered,
            r#"{"primary_types":[{"type":"SAEF","weight":1.0}]}"#,
            None,
            None,
            None,
        )
        .await
        .unwrap();
    store
        .set_raw_profile(
            covered,
            Some(r#"{"primary_types":[{"type":"LRMC","weight":1.0}]}"#),
        )
        .await
        .unwrap();

    let service = ProfileMigrationService::new(store.clone());
    let report = service.migrate(WriteMode::RespectProtected).await.unwrap();

    assert_eq!(report.converted, 2);
    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped_existing, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, broken);

    let now = chrono::Utc::now().to_rfc3339();
    let load = |raw: Option<String>| AptProfile::from_json(&raw.unwrap()).unwrap();

    let preset = load(store.get_artist(embedded).await.unwrap().unwrap().apt_profile);
    assert_eq!(preset.meta.source, EXPERT_PRESET_SOURCE);
    assert_eq!(preset.primary(), Some(ArchetypeCode::Srec));
    assert_eq!(preset.meta.classification_method, METHOD_LEGACY_MIGRATION);

    let imported = load(store.get_artist(mapped).await.unwrap().unwrap().apt_profile);
    assert_eq!(imported.primary(), Some(ArchetypeCode::Laef));
    assert_eq!(imported.primary_types.len(), 2);
    assert!((imported.meta.confidence - 0.72).abs() < 1e-9);
    assert_eq!(imported.meta.source, "rule_based_analysis_v2");

    let kept = load(store.get_artist(covered).await.unwrap().unwrap().apt_profile);
    assert_eq!(kept.primary(), Some(ArchetypeCode::Lrmc));
    assert!(AptProfile::parse_stored(&kept.to_json().unwrap(), &now).is_ok());

    // A second run finds everything current.
    let again = service.migrate(WriteMode::RespectProtected).await.unwrap();
    assert_eq!(again.converted, 0);
    assert_eq!(again.imported, 0);
    assert_eq!(again.already_current, 3);
}

#[tokio::test]
async fn test_forced_migration_lets_mappings_replace_profiles() {
    let store = test_store().await;
    let id = store.add_artist(&NewArtist::named("John Roe")).await.unwrap();
    store
        .set_raw_profile(id, Some(r#"{"primary_types":[{"type":"LRMC","weight":1.0}]}"#))
        .await
        .unwrap();
    store
        .add_legacy_mapping(
            id,
            r#"{"primary_types":[{"type":"SAEF","weight":1.0}]}"#,
            Some(0.9),
            None,
            None,
        )
        .await
        .unwrap();

    let report = ProfileMigrationService::new(store.clone())
        .migrate(WriteMode::Force)
        .await
        .unwrap();
    assert_eq!(report.converted, 1);
    assert_eq!(report.imported, 1);

    let raw = store.get_artist(id).await.unwrap().unwrap().apt_profile.unwrap();
    let profile = AptProfile::from_json(&raw).unwrap();
    assert_eq!(profile.primary(), Some(ArchetypeCode::Saef));
}

#[tokio::test]
async fn test_migration_keeps_top_level_preset_source() {
    let store = test_store().await;
    let id = store.add_artist(&NewArtist::named("Andy Warhol")).await.unwrap();
    store.set_raw_profile(id, Some(top_level_preset())).await.unwrap();

    let report = ProfileMigrationService::new(store.clone())
        .migrate(WriteMode::RespectProtected)
        .await
        .unwrap();
    assert_eq!(report.converted, 1);

    let raw = store.get_artist(id).await.unwrap().unwrap().apt_profile.unwrap();
    let profile = AptProfile::from_json(&raw).unwrap();
    assert_eq!(profile.meta.source, EXPERT_PRESET_SOURCE);
    assert!(profile.is_protected());
    assert_eq!(profile.primary(), Some(ArchetypeCode::Laef));

    // Still protected from a plain reset after the rewrite.
    assert_eq!(store.reset_profiles(false).await.unwrap(), 0);
}
