//! Ranks the 16 archetype codes against an axis-score vector.
//!
//! Each code sits on a corner of the 0-100 hypercube (low pole letter at 0,
//! high pole letter at 100). Codes are ranked by Euclidean distance from the
//! score vector, then by their distance along the A/R axis, then by a
//! rotation seeded from the artist's identity. The last key only matters for
//! exact ties, which is what happens when every score sits at 50.

use serde::{Deserialize, Serialize};

use super::archetype::ArchetypeCode;
use super::axis::{Axis, AxisScores};

/// Distance from the all-neutral point to every corner.
pub const NEUTRAL_DISTANCE: f64 = 100.0;

/// Farthest possible distance between two corners.
pub const MAX_DISTANCE: f64 = 200.0;

/// Weight multipliers by rank, so weights strictly decrease even on ties.
const RANK_DECAY: [f64; 3] = [1.0, 0.8, 0.6];

/// Confidence ceiling when the best code is not separated from the field.
pub const LOW_SEPARATION_CONFIDENCE_CAP: f64 = 0.25;

const SEPARATION_SCALE: f64 = 30.0;
const MARGIN_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimaryType {
    #[serde(rename = "type")]
    pub code: ArchetypeCode,
    pub weight: f64,
    pub rank: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    /// The best code stands clear of the undifferentiated field.
    Separated,
    /// Scores are too close to neutral; the ranking came from the seeded tiebreak.
    LowSeparation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub primary_types: Vec<PrimaryType>,
    pub confidence: f64,
    pub status: ResolutionStatus,
    /// `NEUTRAL_DISTANCE - d1`
    pub separation: f64,
    /// `d2 - d1`
    pub margin: f64,
}

impl Resolution {
    #[must_use]
    pub fn primary(&self) -> Option<ArchetypeCode> {
        self.primary_types.first().map(|t| t.code)
    }

    #[must_use]
    pub const fn is_low_separation(&self) -> bool {
        matches!(self.status, ResolutionStatus::LowSeparation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    pub min_separation: f64,
    pub secondary_distance_cutoff: f64,
    pub max_types: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            min_separation: 4.0,
            secondary_distance_cutoff: 60.0,
            max_types: 3,
        }
    }
}

impl From<&crate::config::ClassificationConfig> for ResolverSettings {
    fn from(config: &crate::config::ClassificationConfig) -> Self {
        Self {
            min_separation: config.min_separation,
            secondary_distance_cutoff: config.secondary_distance_cutoff,
            max_types: config.max_types,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub code: ArchetypeCode,
    pub distance: f64,
    pub ar_distance: f64,
    rotation: usize,
}

/// Euclidean distance from the scores to a code's corner.
#[must_use]
pub fn distance(scores: &AxisScores, code: ArchetypeCode) -> f64 {
    Axis::ALL
        .iter()
        .map(|axis| {
            let delta = scores.get(*axis) - code.pole(*axis).corner();
            delta * delta
        })
        .sum::<f64>()
        .sqrt()
}

/// 64-bit FNV-1a. Output is fixed across toolchains, unlike `DefaultHasher`.
#[must_use]
pub fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

/// Tiebreak seed for an artist: its id and lowercase name.
#[must_use]
pub fn artist_seed(id: i32, name: &str) -> u64 {
    let key = format!("{id}:{}", name.trim().to_lowercase());
    fnv1a(key.as_bytes())
}

/// All 16 codes, best match first.
#[must_use]
pub fn rank_candidates(scores: &AxisScores, seed: u64) -> Vec<Candidate> {
    let offset = (seed % ArchetypeCode::ALL.len() as u64) as usize;

    let mut candidates: Vec<Candidate> = ArchetypeCode::ALL
        .iter()
        .map(|code| {
            let axis = Axis::AbstractRepresentational;
            Candidate {
                code: *code,
                distance: distance(scores, *code),
                ar_distance: (scores.get(axis) - code.pole(axis).corner()).abs(),
                rotation: (code.ordinal() + ArchetypeCode::ALL.len() - offset)
                    % ArchetypeCode::ALL.len(),
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.ar_distance.total_cmp(&b.ar_distance))
            .then(a.rotation.cmp(&b.rotation))
    });
    candidates
}

fn truncate3(value: f64) -> f64 {
    (value * 1000.0).floor() / 1000.0
}

/// Resolves scores to 1-3 weighted codes plus a confidence.
///
/// `evidence_strength` (0-1) is how much real evidence fed the scores.
#[must_use]
pub fn resolve(
    scores: &AxisScores,
    evidence_strength: f64,
    seed: u64,
    settings: &ResolverSettings,
) -> Resolution {
    let ranked = rank_candidates(scores, seed);
    let best = ranked[0];
    let runner_up = ranked[1];

    let max_types = settings.max_types.clamp(1, RANK_DECAY.len());
    let chosen: Vec<Candidate> = ranked
        .iter()
        .take(max_types)
        .enumerate()
        .take_while(|(i, c)| {
            *i == 0 || c.distance - best.distance <= settings.secondary_distance_cutoff
        })
        .map(|(_, c)| *c)
        .collect();

    let raw: Vec<f64> = chosen
        .iter()
        .zip(RANK_DECAY)
        .map(|(c, decay)| (1.0 - c.distance / MAX_DISTANCE) * decay)
        .collect();
    let total: f64 = raw.iter().sum();

    let primary_types = chosen
        .iter()
        .zip(&raw)
        .enumerate()
        .map(|(i, (c, w))| PrimaryType {
            code: c.code,
            weight: truncate3(w / total),
            rank: u8::try_from(i + 1).unwrap_or(u8::MAX),
        })
        .collect();

    let separation = NEUTRAL_DISTANCE - best.distance;
    let margin = runner_up.distance - best.distance;

    let separation_term = (separation / SEPARATION_SCALE).clamp(0.0, 1.0);
    let margin_term = (margin / MARGIN_SCALE).clamp(0.0, 1.0);
    let mut confidence =
        0.55 * evidence_strength.clamp(0.0, 1.0) + 0.35 * separation_term + 0.10 * margin_term;

    let status = if separation < settings.min_separation {
        confidence = confidence.min(LOW_SEPARATION_CONFIDENCE_CAP);
        ResolutionStatus::LowSeparation
    } else {
        ResolutionStatus::Separated
    };

    Resolution {
        primary_types,
        confidence: truncate3(confidence.clamp(0.0, 1.0)),
        status,
        separation,
        margin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apt::axis::Pole;
    use std::collections::HashMap;

    fn scores(l_s: f64, a_r: f64, e_m: f64, f_c: f64) -> AxisScores {
        AxisScores::from_main(l_s, a_r, e_m, f_c)
    }

    fn assert_invariants(resolution: &Resolution) {
        let types = &resolution.primary_types;
        assert!(!types.is_empty() && types.len() <= 3);
        let sum: f64 = types.iter().map(|t| t.weight).sum();
        assert!(sum <= 1.0 + 1e-12, "weights sum to {sum}");
        for pair in types.windows(2) {
            assert!(pair[0].weight > pair[1].weight);
            assert_eq!(pair[1].rank, pair[0].rank + 1);
        }
        assert_eq!(types[0].rank, 1);
        assert!((0.0..=1.0).contains(&resolution.confidence));
    }

    #[test]
    fn test_corner_scores_resolve_to_that_code() {
        let settings = ResolverSettings::default();
        for code in ArchetypeCode::ALL {
            let corner = code.poles().map(Pole::corner);
            let s = scores(corner[0], corner[1], corner[2], corner[3]);
            let resolution = resolve(&s, 1.0, 0, &settings);
            assert_eq!(resolution.primary(), Some(code));
            assert_eq!(resolution.status, ResolutionStatus::Separated);
            assert_invariants(&resolution);
        }
    }

    #[test]
    fn test_invariants_over_grid() {
        let settings = ResolverSettings::default();
        let steps = [0.0, 17.5, 49.0, 50.0, 51.0, 80.0, 100.0];
        for &a in &steps {
            for &b in &steps {
                for &c in &steps {
                    for &d in &steps {
                        let resolution = resolve(&scores(a, b, c, d), 0.5, 99, &settings);
                        assert_invariants(&resolution);
                    }
                }
            }
        }
    }

    #[test]
    fn test_neutral_scores_are_low_confidence() {
        let resolution = resolve(&AxisScores::neutral(), 0.0, 1, &ResolverSettings::default());
        assert_eq!(resolution.status, ResolutionStatus::LowSeparation);
        assert!(resolution.confidence < 0.3);
        assert_eq!(resolution.primary_types.len(), 3);
        assert_invariants(&resolution);
    }

    #[test]
    fn test_neutral_scores_do_not_collapse() {
        let settings = ResolverSettings::default();
        let mut counts: HashMap<ArchetypeCode, usize> = HashMap::new();
        for id in 0..64 {
            let seed = artist_seed(id, &format!("Anonymous Master {id}"));
            let resolution = resolve(&AxisScores::neutral(), 0.0, seed, &settings);
            *counts.entry(resolution.primary().unwrap()).or_default() += 1;
        }
        assert!(counts.len() >= 8, "only {} distinct codes", counts.len());
        assert!(counts.values().all(|n| *n <= 16));
    }

    #[test]
    fn test_ties_prefer_decisive_abstract_axis() {
        // F/C neutral: LAEF and LAEC tie on distance and on A/R; the seed decides.
        let s = scores(10.0, 10.0, 10.0, 50.0);
        let ranked = rank_candidates(&s, 0);
        assert!((ranked[0].distance - ranked[1].distance).abs() < 1e-9);
        let top: Vec<_> = ranked[..2].iter().map(|c| c.code).collect();
        assert!(top.contains(&ArchetypeCode::Laef) && top.contains(&ArchetypeCode::Laec));

        // LR.. and SA.. codes sit at the same distance; SA.. is closer on A/R.
        let s = scores(30.0, 30.0, 50.0, 50.0);
        let ranked = rank_candidates(&s, 7);
        for candidate in &ranked[4..8] {
            assert_eq!(candidate.code.pole(Axis::LoneSocial), Pole::Social);
            assert_eq!(
                candidate.code.pole(Axis::AbstractRepresentational),
                Pole::Abstract
            );
        }
        for candidate in &ranked[8..12] {
            assert_eq!(
                candidate.code.pole(Axis::AbstractRepresentational),
                Pole::Representational
            );
        }
    }

    #[test]
    fn test_confidence_grows_with_margin() {
        let settings = ResolverSettings::default();
        let weak = resolve(&scores(40.0, 40.0, 40.0, 40.0), 0.5, 0, &settings);
        let strong = resolve(&scores(5.0, 5.0, 5.0, 5.0), 0.5, 0, &settings);
        assert!(strong.confidence > weak.confidence);
        assert_eq!(strong.primary(), Some(ArchetypeCode::Laef));
    }

    #[test]
    fn test_max_types_and_cutoff() {
        let settings = ResolverSettings {
            max_types: 1,
            ..ResolverSettings::default()
        };
        let resolution = resolve(&scores(0.0, 0.0, 0.0, 0.0), 1.0, 0, &settings);
        assert_eq!(resolution.primary_types.len(), 1);
        assert!((resolution.primary_types[0].weight - 1.0).abs() < f64::EPSILON);

        let settings = ResolverSettings {
            secondary_distance_cutoff: 10.0,
            ..ResolverSettings::default()
        };
        let resolution = resolve(&scores(0.0, 0.0, 0.0, 0.0), 1.0, 0, &settings);
        assert_eq!(resolution.primary_types.len(), 1);
    }

    #[test]
    fn test_fnv_is_stable() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_ne!(artist_seed(1, "Monet"), artist_seed(2, "Monet"));
        assert_eq!(artist_seed(1, " Monet "), artist_seed(1, "monet"));
    }
}
