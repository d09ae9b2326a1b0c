//! Conversion of legacy `apt_profile` shapes into version 1.
//!
//! Shapes seen in older data:
//! - eight-letter dimensions `{L, S, A, R, E, M, F, C}` where each pair sums to ~100
//! - `primary_types` or `primaryTypes` entries without ranks, sometimes with
//!   letters out of axis order (`RMCL`) or with no valid reading at all (`CFLE`)
//! - `meta.reasoning` as an array, or an `analysis` block instead of `meta`
//! - confidence as a 0-100 percentage

use serde_json::{Map, Value};

use super::archetype::ArchetypeCode;
use super::axis::{round2, Axis, BASELINE};
use super::profile::{AptProfile, Dimensions, ProfileError, ProfileMeta};
use super::resolver::PrimaryType;
use crate::constants::profile::{METHOD_LEGACY_MIGRATION, SCHEMA_VERSION};

const LEGACY_SOURCE: &str = "legacy";

/// Extra facts known about a legacy document, e.g. from its mapping-table row.
#[derive(Debug, Clone, Default)]
pub struct LegacyHints {
    pub confidence: Option<f64>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|v: &f64| v.is_finite())
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Confidence may be stored as a fraction or a percentage.
fn normalize_confidence(raw: f64) -> f64 {
    let value = if raw > 1.0 { raw / 100.0 } else { raw };
    value.clamp(0.0, 1.0)
}

fn letter_dimensions(dims: &Map<String, Value>) -> Option<[f64; 4]> {
    let mut any = false;
    let main = Axis::ALL.map(|axis| {
        let low = number(dims.get(&axis.low_pole().letter().to_string()));
        let high = number(dims.get(&axis.high_pole().letter().to_string()));
        any |= low.is_some() || high.is_some();
        match (low, high) {
            (Some(l), Some(h)) => (h + (100.0 - l)) / 2.0,
            (Some(l), None) => 100.0 - l,
            (None, Some(h)) => h,
            (None, None) => BASELINE,
        }
    });
    any.then_some(main)
}

fn axis_dimensions(dims: &Map<String, Value>) -> Option<[f64; 4]> {
    let values = Axis::ALL.map(|axis| number(dims.get(axis.key())));
    if values.iter().all(Option::is_none) {
        return None;
    }
    Some(values.map(|v| v.unwrap_or(BASELINE)))
}

/// Main scores leaning 25 points toward each pole of the code.
fn dimensions_from_code(code: ArchetypeCode) -> [f64; 4] {
    code.poles()
        .map(|pole| if pole.is_high() { 75.0 } else { 25.0 })
}

fn primary_types(entries: &[Value]) -> Vec<PrimaryType> {
    let count = entries.len().max(1) as f64;
    let mut parsed: Vec<(ArchetypeCode, f64)> = Vec::new();

    for entry in entries {
        let (raw_code, weight) = match entry {
            Value::String(code) => (Some(code.as_str()), None),
            Value::Object(obj) => (
                obj.get("type")
                    .or_else(|| obj.get("code"))
                    .and_then(Value::as_str),
                number(obj.get("weight")),
            ),
            _ => (None, None),
        };

        let Some(raw_code) = raw_code else { continue };
        let Some(code) = raw_code
            .parse::<ArchetypeCode>()
            .ok()
            .or_else(|| ArchetypeCode::from_scrambled(raw_code))
        else {
            continue;
        };

        let weight = weight.unwrap_or(1.0 / count);
        if weight <= 0.0 {
            continue;
        }

        match parsed.iter_mut().find(|(c, _)| *c == code) {
            Some(existing) => existing.1 = existing.1.max(weight),
            None => parsed.push((code, weight)),
        }
    }

    parsed.sort_by(|a, b| b.1.total_cmp(&a.1));
    parsed.truncate(3);

    let total: f64 = parsed.iter().map(|(_, w)| w).sum();
    let scale = if total > 1.0 { total } else { 1.0 };

    parsed
        .into_iter()
        .enumerate()
        .map(|(i, (code, weight))| PrimaryType {
            code,
            weight: ((weight / scale).min(1.0) * 1000.0).floor() / 1000.0,
            rank: u8::try_from(i + 1).unwrap_or(u8::MAX),
        })
        .filter(|t| t.weight > 0.0)
        .collect()
}

/// Converts a legacy document to version 1.
///
/// `now` is used when the document carries no timestamp of its own.
pub fn migrate(value: &Value, hints: &LegacyHints, now: &str) -> Result<AptProfile, ProfileError> {
    let Some(doc) = value.as_object() else {
        return Err(ProfileError::UnrecognizedLegacy(
            "document is not an object".to_string(),
        ));
    };

    let entries = doc
        .get("primary_types")
        .or_else(|| doc.get("primaryTypes"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let types = primary_types(entries);
    let Some(first) = types.first() else {
        return Err(ProfileError::UnrecognizedLegacy(
            "no valid archetype codes".to_string(),
        ));
    };

    let dims = doc
        .get("dimensions")
        .and_then(Value::as_object)
        .and_then(|dims| axis_dimensions(dims).or_else(|| letter_dimensions(dims)))
        .unwrap_or_else(|| dimensions_from_code(first.code))
        .map(|v| round2(v.clamp(0.0, 100.0)));

    let empty = Map::new();
    let meta = doc.get("meta").and_then(Value::as_object).unwrap_or(&empty);
    let analysis = doc
        .get("analysis")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let confidence = number(meta.get("confidence"))
        .or_else(|| number(doc.get("confidence")))
        .or(hints.confidence)
        .map_or(0.5, normalize_confidence);

    let source = text(meta.get("source"))
        .or_else(|| text(doc.get("source")))
        .or_else(|| text(analysis.get("strategy")))
        .or_else(|| hints.source.clone())
        .unwrap_or_else(|| LEGACY_SOURCE.to_string());

    let reasoning = text(meta.get("reasoning"))
        .or_else(|| text(analysis.get("reasoning")))
        .or_else(|| hints.notes.clone())
        .unwrap_or_default();

    let mut data_sources = strings(meta.get("data_sources"));
    if data_sources.is_empty() {
        data_sources = strings(meta.get("dataSources"));
    }
    if data_sources.is_empty() {
        data_sources = strings(analysis.get("sources"));
    }
    data_sources.sort();
    data_sources.dedup();

    let timestamp = text(meta.get("timestamp"))
        .or_else(|| text(meta.get("analyzedAt")))
        .unwrap_or_else(|| now.to_string());

    let profile = AptProfile {
        version: SCHEMA_VERSION,
        dimensions: Dimensions {
            l_s: dims[0],
            a_r: dims[1],
            e_m: dims[2],
            f_c: dims[3],
            sub: None,
        },
        primary_types: types,
        meta: ProfileMeta {
            confidence: (confidence * 1000.0).round() / 1000.0,
            source,
            reasoning,
            data_sources,
            classification_method: METHOD_LEGACY_MIGRATION.to_string(),
            timestamp,
        },
    };

    profile.validate()?;
    Ok(profile)
}
