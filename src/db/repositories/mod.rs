pub mod artist;
pub mod cache;
pub mod claims;
pub mod legacy_mapping;
