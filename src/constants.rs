pub mod cache {

    pub const EVIDENCE_TTL_HOURS: i64 = 24;
}

pub mod profile {

    pub const SCHEMA_VERSION: u32 = 1;

    /// `meta.source` written by the automatic pipeline
    pub const PIPELINE_SOURCE: &str = "rule_based_v1";

    pub const METHOD_RULE_TABLE: &str = "rule_table_euclidean";

    pub const METHOD_NEUTRAL_TIEBREAK: &str = "rule_table_neutral_tiebreak";

    pub const METHOD_LEGACY_MIGRATION: &str = "legacy_migration";

    pub const EXPERT_PRESET_SOURCE: &str = "expert_preset";

    /// Profiles carrying one of these sources are never overwritten without force
    pub const PROTECTED_SOURCES: &[&str] = &[EXPERT_PRESET_SOURCE, "manual_curation"];
}

pub mod sources {

    pub const WIKIPEDIA: &str = "wikipedia";

    pub const MET_MUSEUM: &str = "met_museum";

    pub const PAGEVIEWS: &str = "pageviews";
}
