use super::axis::{AxisScores, SubScores};
use super::rules::{RuleHit, RuleInput, RuleTable};

/// Biography length that counts as a rich text signal.
const RICH_BIOGRAPHY_CHARS: usize = 200;

/// Output of one scoring pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub scores: AxisScores,
    pub hits: Vec<RuleHit>,
    /// How much real evidence was available, 0-1
    pub evidence_strength: f64,
}

impl ScoreCard {
    /// Human-readable account of the rules that fired, in table order.
    #[must_use]
    pub fn reasoning(&self) -> String {
        if self.hits.is_empty() {
            return "no textual or categorical evidence; all axes at neutral baseline".to_string();
        }

        self.hits
            .iter()
            .map(|hit| format!("{} ({})", hit.rule, hit.terms.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Maps evidence to axis scores through the rule table. Pure: no I/O, no
/// randomness, identical input gives identical output.
#[derive(Debug)]
pub struct AxisScorer {
    rules: RuleTable,
}

impl AxisScorer {
    #[must_use]
    pub const fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    pub fn standard() -> Result<Self, regex::Error> {
        Ok(Self::new(RuleTable::standard()?))
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleTable {
        &self.rules
    }

    #[must_use]
    pub fn score(&self, input: &RuleInput<'_>) -> ScoreCard {
        let hits = self.rules.evaluate(input);

        let mut sub = SubScores::neutral();
        for hit in &hits {
            for adjustment in &hit.applied {
                sub.adjust(adjustment.pole, adjustment.delta);
            }
        }

        ScoreCard {
            scores: AxisScores::from_sub_scores(sub),
            hits,
            evidence_strength: evidence_strength(input),
        }
    }
}

/// Evidence richness used by the confidence formula. Popularity signals
/// only enter here, never into axis scores.
#[must_use]
pub fn evidence_strength(input: &RuleInput<'_>) -> f64 {
    let present = |field: Option<&str>| field.is_some_and(|v| !v.trim().is_empty());

    let mut strength: f64 = 0.0;

    if let Some(bio) = input.biography.map(str::trim).filter(|b| !b.is_empty()) {
        strength += if bio.chars().count() >= RICH_BIOGRAPHY_CHARS {
            0.25
        } else {
            0.15
        };
    }
    if present(input.era) {
        strength += 0.10;
    }
    if present(input.nationality) {
        strength += 0.05;
    }

    let sources = input.evidence.data_sources.len() as f64;
    strength += (0.20 * sources).min(0.60);
    strength += (input.evidence.importance / 100.0).clamp(0.0, 1.0) * 0.10;

    strength.min(1.0)
}
