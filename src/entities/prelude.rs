pub use super::artist_apt_mappings::Entity as ArtistAptMappings;
pub use super::artists::Entity as Artists;
pub use super::classification_claims::Entity as ClassificationClaims;
pub use super::evidence_cache::Entity as EvidenceCache;
