pub mod prelude;

pub mod artist_apt_mappings;
pub mod artists;
pub mod classification_claims;
pub mod evidence_cache;
