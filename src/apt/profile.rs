//! The persisted `apt_profile` document.
//!
//! Version 1 is the only shape written. Anything without a `version` field
//! is treated as a legacy document and goes through [`super::legacy`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::archetype::ArchetypeCode;
use super::axis::{Axis, AxisScores, SubScores, MAX_SCORE, MIN_SCORE};
use super::resolver::{PrimaryType, Resolution};
use crate::constants::profile::{PROTECTED_SOURCES, SCHEMA_VERSION};

/// Tolerance for comparing stored floats against derived values.
const EPSILON: f64 = 0.011;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported profile version {0}")]
    UnsupportedVersion(u64),

    #[error("invalid profile: {0}")]
    Invalid(String),

    #[error("unrecognized legacy profile: {0}")]
    UnrecognizedLegacy(String),
}

fn invalid(message: impl Into<String>) -> ProfileError {
    ProfileError::Invalid(message.into())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dimensions {
    #[serde(rename = "L_S")]
    pub l_s: f64,
    #[serde(rename = "A_R")]
    pub a_r: f64,
    #[serde(rename = "E_M")]
    pub e_m: f64,
    #[serde(rename = "F_C")]
    pub f_c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<SubScores>,
}

impl Dimensions {
    #[must_use]
    pub fn from_scores(scores: &AxisScores) -> Self {
        Self {
            l_s: scores.get(Axis::LoneSocial),
            a_r: scores.get(Axis::AbstractRepresentational),
            e_m: scores.get(Axis::EmotionalMeaning),
            f_c: scores.get(Axis::FlowConstructive),
            sub: scores.sub_scores().copied(),
        }
    }

    #[must_use]
    pub const fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::LoneSocial => self.l_s,
            Axis::AbstractRepresentational => self.a_r,
            Axis::EmotionalMeaning => self.e_m,
            Axis::FlowConstructive => self.f_c,
        }
    }

    #[must_use]
    pub fn to_scores(&self) -> AxisScores {
        match self.sub {
            Some(sub) => AxisScores::from_sub_scores(sub),
            None => AxisScores::from_main(self.l_s, self.a_r, self.e_m, self.f_c),
        }
    }

    fn validate(&self) -> Result<(), ProfileError> {
        for axis in Axis::ALL {
            let value = self.get(axis);
            if !value.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(invalid(format!("{axis} score {value} outside 0-100")));
            }
        }

        if let Some(sub) = &self.sub {
            if !sub.in_range() {
                return Err(invalid("sub-score outside 0-100"));
            }
            for axis in Axis::ALL {
                if (sub.axis_score(axis) - self.get(axis)).abs() > EPSILON {
                    return Err(invalid(format!(
                        "{axis} score {} does not match its sub-scores",
                        self.get(axis)
                    )));
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileMeta {
    pub confidence: f64,
    pub source: String,
    pub reasoning: String,
    pub data_sources: Vec<String>,
    pub classification_method: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AptProfile {
    pub version: u32,
    pub dimensions: Dimensions,
    pub primary_types: Vec<PrimaryType>,
    pub meta: ProfileMeta,
}

/// A stored document after parsing: either already current, or migrated
/// from a legacy shape and in need of rewriting.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredProfile {
    Current(AptProfile),
    Migrated(AptProfile),
}

impl StoredProfile {
    #[must_use]
    pub fn into_profile(self) -> AptProfile {
        match self {
            Self::Current(profile) | Self::Migrated(profile) => profile,
        }
    }

    #[must_use]
    pub const fn profile(&self) -> &AptProfile {
        match self {
            Self::Current(profile) | Self::Migrated(profile) => profile,
        }
    }

    #[must_use]
    pub const fn was_migrated(&self) -> bool {
        matches!(self, Self::Migrated(_))
    }
}

/// Everything needed to assemble a profile from a pipeline run.
#[derive(Debug, Clone)]
pub struct ProfileDraft<'a> {
    pub scores: &'a AxisScores,
    pub resolution: &'a Resolution,
    pub source: &'a str,
    pub method: &'a str,
    pub reasoning: String,
    pub data_sources: Vec<String>,
    pub timestamp: String,
}

impl AptProfile {
    #[must_use]
    pub fn from_draft(draft: ProfileDraft<'_>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            dimensions: Dimensions::from_scores(draft.scores),
            primary_types: draft.resolution.primary_types.clone(),
            meta: ProfileMeta {
                confidence: draft.resolution.confidence,
                source: draft.source.to_string(),
                reasoning: draft.reasoning,
                data_sources: draft.data_sources,
                classification_method: draft.method.to_string(),
                timestamp: draft.timestamp,
            },
        }
    }

    /// Parses a version-1 document strictly.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ProfileError> {
        match value.get("version").and_then(serde_json::Value::as_u64) {
            Some(v) if v == u64::from(SCHEMA_VERSION) => {}
            Some(v) => return Err(ProfileError::UnsupportedVersion(v)),
            None => return Err(invalid("missing version")),
        }

        let profile: Self = serde_json::from_value(value)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Parses whatever is stored in the column, migrating legacy shapes.
    pub fn parse_stored(json: &str, fallback_timestamp: &str) -> Result<StoredProfile, ProfileError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("version").is_some() {
            Self::from_value(value).map(StoredProfile::Current)
        } else {
            super::legacy::migrate(&value, &super::legacy::LegacyHints::default(), fallback_timestamp)
                .map(StoredProfile::Migrated)
        }
    }

    /// Validates and serializes. Output is stable for equal profiles.
    pub fn to_json(&self) -> Result<String, ProfileError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.version != SCHEMA_VERSION {
            return Err(ProfileError::UnsupportedVersion(u64::from(self.version)));
        }

        self.dimensions.validate()?;
        validate_primary_types(&self.primary_types)?;

        let confidence = self.meta.confidence;
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(invalid(format!("confidence {confidence} outside 0-1")));
        }
        if self.meta.source.trim().is_empty() {
            return Err(invalid("meta.source is empty"));
        }
        if self.meta.classification_method.trim().is_empty() {
            return Err(invalid("meta.classification_method is empty"));
        }

        Ok(())
    }

    #[must_use]
    pub fn is_protected(&self) -> bool {
        is_protected_source(&self.meta.source)
    }

    #[must_use]
    pub fn primary(&self) -> Option<ArchetypeCode> {
        self.primary_types.first().map(|t| t.code)
    }

    /// Equality that ignores `meta.timestamp`.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        let mut a = self.clone();
        a.meta.timestamp.clear();
        let mut b = other.clone();
        b.meta.timestamp.clear();
        a == b
    }
}

#[must_use]
pub fn is_protected_source(source: &str) -> bool {
    PROTECTED_SOURCES
        .iter()
        .any(|protected| protected.eq_ignore_ascii_case(source.trim()))
}

pub fn validate_primary_types(types: &[PrimaryType]) -> Result<(), ProfileError> {
    if types.is_empty() {
        return Err(invalid("primary_types is empty"));
    }
    if types.len() > 3 {
        return Err(invalid(format!("{} primary types, at most 3", types.len())));
    }

    for (i, entry) in types.iter().enumerate() {
        if usize::from(entry.rank) != i + 1 {
            return Err(invalid(format!(
                "primary type {} has rank {}, expected {}",
                entry.code,
                entry.rank,
                i + 1
            )));
        }
        if !entry.weight.is_finite() || entry.weight <= 0.0 || entry.weight > 1.0 {
            return Err(invalid(format!(
                "weight {} of {} outside (0, 1]",
                entry.weight, entry.code
            )));
        }
        if types[..i].iter().any(|earlier| earlier.code == entry.code) {
            return Err(invalid(format!("duplicate primary type {}", entry.code)));
        }
    }

    if types.windows(2).any(|pair| pair[1].weight > pair[0].weight) {
        return Err(invalid("weights increase with rank"));
    }

    let total: f64 = types.iter().map(|t| t.weight).sum();
    if total > 1.0 + 1e-9 {
        return Err(invalid(format!("weights sum to {total}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apt::resolver::{resolve, ResolverSettings};

    fn sample() -> AptProfile {
        let scores = AxisScores::from_main(20.0, 30.0, 70.0, 60.0);
        let resolution = resolve(&scores, 0.6, 3, &ResolverSettings::default());
        AptProfile::from_draft(ProfileDraft {
            scores: &scores,
            resolution: &resolution,
            source: "rule_based_v1",
            method: "rule_table_euclidean",
            reasoning: "test".to_string(),
            data_sources: vec!["wikipedia".to_string()],
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        })
    }

    #[test]
    fn test_roundtrip_preserves_invariants() {
        let profile = sample();
        let json = profile.to_json().unwrap();
        assert!(json.starts_with("{\"version\":1,"));

        let back = AptProfile::from_json(&json).unwrap();
        assert_eq!(back, profile);
        assert_eq!(back.primary(), Some(ArchetypeCode::Lamc));
        back.validate().unwrap();
    }

    #[test]
    fn test_rejects_unknown_fields_and_versions() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["extra"] = serde_json::json!(true);
        assert!(AptProfile::from_json(&value.to_string()).is_err());

        let mut value = serde_json::to_value(sample()).unwrap();
        value["version"] = serde_json::json!(2);
        assert!(matches!(
            AptProfile::from_json(&value.to_string()),
            Err(ProfileError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_rejects_broken_invariants() {
        let mut profile = sample();
        profile.primary_types.clear();
        assert!(profile.validate().is_err());

        let mut profile = sample();
        profile.primary_types[0].weight = 0.01;
        assert!(profile.validate().is_err());

        let mut profile = sample();
        profile.dimensions.l_s = 140.0;
        assert!(profile.validate().is_err());

        let mut profile = sample();
        profile.meta.confidence = 1.5;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_sub_scores_must_match_main() {
        let mut sub = SubScores::neutral();
        sub.solitude = 80.0;
        let scores = AxisScores::from_sub_scores(sub);
        let mut profile = sample();
        profile.dimensions = Dimensions::from_scores(&scores);
        profile.validate().unwrap();

        profile.dimensions.l_s = 45.0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_same_content_ignores_timestamp() {
        let a = sample();
        let mut b = sample();
        b.meta.timestamp = "2027-06-01T12:00:00Z".to_string();
        assert!(a.same_content(&b));
        b.meta.confidence = 0.1;
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_protected_sources() {
        assert!(is_protected_source("expert_preset"));
        assert!(is_protected_source(" Expert_Preset "));
        assert!(!is_protected_source("rule_based_v1"));
    }
}
