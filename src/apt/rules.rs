//! The scoring rule table.
//!
//! Every heuristic the scorer applies is a row here: a matcher plus the
//! sub-score adjustments it triggers. Nothing outside this table moves an
//! axis.

use std::collections::BTreeSet;

use regex::Regex;

use super::aggregator::MergedEvidence;
use super::attribution::{attribution_prefix, strip_attribution};
use super::axis::Pole;
use super::axis::Pole::{
    Abstract, Constructive, Emotional, Flow, Lone, Meaning, Representational, Social,
};

/// Keyword rules score each distinct term at most once, up to this many terms.
pub const MAX_KEYWORD_HITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub pole: Pole,
    pub delta: f64,
}

const fn adj(pole: Pole, delta: f64) -> Adjustment {
    Adjustment { pole, delta }
}

/// What a rule looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Whole-word terms in name, era, biography and evidence excerpts; deltas
    /// are per distinct term.
    Keywords(&'static [&'static str]),
    /// Whole-word terms in categorical tags; deltas scale with tag support.
    Tags(&'static [&'static str]),
    /// Catalogue attribution prefix on the artist name.
    AttributionPrefix,
    /// Movement names in the era label, text or tags.
    Movement(&'static [&'static str]),
    /// Terms in the nationality field.
    Nationality(&'static [&'static str]),
    BornBefore(i32),
    BornAfter(i32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub adjustments: &'static [Adjustment],
}

pub static STANDARD_RULES: &[Rule] = &[
    // Vocabulary
    Rule {
        name: "solitude vocabulary",
        matcher: Matcher::Keywords(&[
            "solitary",
            "solitude",
            "reclusive",
            "recluse",
            "isolated",
            "isolation",
            "hermit",
            "withdrawn",
            "introspective",
            "introverted",
            "contemplative",
            "meditative",
            "seclusion",
            "secluded",
            "self-taught",
            "outsider",
            "loner",
            "alone",
        ]),
        adjustments: &[adj(Lone, 8.0)],
    },
    Rule {
        name: "social vocabulary",
        matcher: Matcher::Keywords(&[
            "collaborative",
            "collaboration",
            "collective",
            "community",
            "co-founded",
            "founded",
            "organized",
            "taught",
            "teacher",
            "mentor",
            "students",
            "pupils",
            "salon",
            "friends",
            "friendship",
            "assistants",
            "group",
        ]),
        adjustments: &[adj(Social, 8.0)],
    },
    Rule {
        name: "abstraction vocabulary",
        matcher: Matcher::Keywords(&[
            "abstract",
            "abstraction",
            "non-figurative",
            "non-representational",
            "nonobjective",
            "conceptual",
            "geometric",
            "gestural",
            "avant-garde",
            "monochrome",
        ]),
        adjustments: &[adj(Abstract, 8.0)],
    },
    Rule {
        name: "representation vocabulary",
        matcher: Matcher::Keywords(&[
            "realistic",
            "naturalistic",
            "figurative",
            "portrait",
            "portraits",
            "portraitist",
            "landscape",
            "landscapes",
            "still life",
            "still lifes",
            "genre scenes",
            "anatomy",
            "perspective",
            "lifelike",
            "detailed",
        ]),
        adjustments: &[adj(Representational, 8.0)],
    },
    Rule {
        name: "emotion vocabulary",
        matcher: Matcher::Keywords(&[
            "emotional",
            "emotion",
            "passionate",
            "expressive",
            "intuitive",
            "spontaneous",
            "romantic",
            "dramatic",
            "intense",
            "lyrical",
            "sensual",
            "visceral",
            "melancholy",
            "turbulent",
            "spiritual",
        ]),
        adjustments: &[adj(Emotional, 8.0)],
    },
    Rule {
        name: "meaning vocabulary",
        matcher: Matcher::Keywords(&[
            "intellectual",
            "theoretical",
            "theory",
            "philosophical",
            "philosophy",
            "conceptual",
            "analytical",
            "political",
            "allegory",
            "allegorical",
            "symbolism",
            "symbolic",
            "critique",
            "commentary",
            "research",
            "scientific",
            "mathematical",
            "narrative",
        ]),
        adjustments: &[adj(Meaning, 8.0)],
    },
    Rule {
        name: "flow vocabulary",
        matcher: Matcher::Keywords(&[
            "experimental",
            "innovative",
            "revolutionary",
            "radical",
            "rebellious",
            "unconventional",
            "improvised",
            "improvisation",
            "spontaneous",
            "freedom",
            "automatism",
            "playful",
            "restless",
            "wandering",
        ]),
        adjustments: &[adj(Flow, 8.0)],
    },
    Rule {
        name: "construction vocabulary",
        matcher: Matcher::Keywords(&[
            "traditional",
            "classical",
            "academic",
            "meticulous",
            "disciplined",
            "rigorous",
            "systematic",
            "methodical",
            "precise",
            "precision",
            "trained",
            "apprenticed",
            "apprentice",
            "guild",
            "workshop",
            "craftsmanship",
            "technique",
            "court painter",
        ]),
        adjustments: &[adj(Constructive, 8.0)],
    },
    // Attribution: works catalogued under a master's name by a workshop or
    // follower come out of shared, rule-bound studio practice.
    Rule {
        name: "attribution prefix",
        matcher: Matcher::AttributionPrefix,
        adjustments: &[adj(Constructive, 25.0), adj(Social, 10.0)],
    },
    // Movements
    Rule {
        name: "abstract expressionism",
        matcher: Matcher::Movement(&[
            "abstract expressionism",
            "abstract expressionist",
            "action painting",
            "color field",
        ]),
        adjustments: &[
            adj(Lone, 10.0),
            adj(Abstract, 20.0),
            adj(Emotional, 12.0),
            adj(Flow, 15.0),
        ],
    },
    Rule {
        name: "impressionism",
        matcher: Matcher::Movement(&["impressionism", "impressionist", "plein air"]),
        adjustments: &[adj(Abstract, 10.0), adj(Emotional, 8.0), adj(Flow, 10.0)],
    },
    Rule {
        name: "expressionism",
        matcher: Matcher::Movement(&["expressionism", "expressionist"]),
        adjustments: &[
            adj(Lone, 8.0),
            adj(Abstract, 12.0),
            adj(Emotional, 15.0),
            adj(Flow, 8.0),
        ],
    },
    Rule {
        name: "fauvism",
        matcher: Matcher::Movement(&["fauvism", "fauvist", "fauve"]),
        adjustments: &[adj(Abstract, 8.0), adj(Emotional, 12.0), adj(Flow, 12.0)],
    },
    Rule {
        name: "cubism",
        matcher: Matcher::Movement(&["cubism", "cubist"]),
        adjustments: &[
            adj(Abstract, 15.0),
            adj(Meaning, 10.0),
            adj(Constructive, 5.0),
        ],
    },
    Rule {
        name: "surrealism",
        matcher: Matcher::Movement(&["surrealism", "surrealist"]),
        adjustments: &[adj(Abstract, 18.0), adj(Emotional, 10.0), adj(Flow, 12.0)],
    },
    Rule {
        name: "dada",
        matcher: Matcher::Movement(&["dada", "dadaism", "dadaist"]),
        adjustments: &[adj(Abstract, 12.0), adj(Meaning, 8.0), adj(Flow, 15.0)],
    },
    Rule {
        name: "pop art",
        matcher: Matcher::Movement(&["pop art"]),
        adjustments: &[
            adj(Social, 12.0),
            adj(Meaning, 8.0),
            adj(Constructive, 5.0),
        ],
    },
    Rule {
        name: "minimalism",
        matcher: Matcher::Movement(&["minimalism", "minimalist"]),
        adjustments: &[
            adj(Lone, 10.0),
            adj(Meaning, 12.0),
            adj(Constructive, 15.0),
        ],
    },
    Rule {
        name: "dansaekhwa",
        matcher: Matcher::Movement(&["dansaekhwa", "tansaekhwa"]),
        adjustments: &[
            adj(Lone, 10.0),
            adj(Abstract, 15.0),
            adj(Constructive, 8.0),
        ],
    },
    Rule {
        name: "renaissance",
        matcher: Matcher::Movement(&["renaissance"]),
        adjustments: &[
            adj(Representational, 15.0),
            adj(Meaning, 10.0),
            adj(Constructive, 12.0),
        ],
    },
    Rule {
        name: "baroque",
        matcher: Matcher::Movement(&["baroque"]),
        adjustments: &[
            adj(Representational, 10.0),
            adj(Emotional, 8.0),
            adj(Constructive, 10.0),
        ],
    },
    Rule {
        name: "romanticism",
        matcher: Matcher::Movement(&["romanticism"]),
        adjustments: &[adj(Emotional, 15.0), adj(Flow, 10.0)],
    },
    Rule {
        name: "realism",
        matcher: Matcher::Movement(&["realism", "realist"]),
        adjustments: &[
            adj(Representational, 18.0),
            adj(Meaning, 5.0),
            adj(Constructive, 8.0),
        ],
    },
    // Categorical tags
    Rule {
        name: "abstract holdings",
        matcher: Matcher::Tags(&["abstract", "abstraction", "modern and contemporary art"]),
        adjustments: &[adj(Abstract, 6.0)],
    },
    Rule {
        name: "figurative holdings",
        matcher: Matcher::Tags(&[
            "portrait",
            "portraits",
            "landscape",
            "landscapes",
            "still life",
            "men",
            "women",
            "flowers",
        ]),
        adjustments: &[adj(Representational, 6.0)],
    },
    Rule {
        name: "religious and allegorical subjects",
        matcher: Matcher::Tags(&[
            "religious",
            "christ",
            "saints",
            "virgin mary",
            "allegory",
            "mythology",
        ]),
        adjustments: &[adj(Meaning, 6.0), adj(Constructive, 4.0)],
    },
    Rule {
        name: "decorative and sculptural practice",
        matcher: Matcher::Tags(&[
            "sculpture",
            "decorative arts",
            "ceramics",
            "arms and armor",
        ]),
        adjustments: &[adj(Constructive, 5.0)],
    },
    Rule {
        name: "performance and installation",
        matcher: Matcher::Tags(&["performance", "installation"]),
        adjustments: &[adj(Social, 6.0), adj(Flow, 6.0)],
    },
    // Cultural context
    Rule {
        name: "korean context",
        matcher: Matcher::Nationality(&["korean", "korea"]),
        adjustments: &[adj(Lone, 8.0), adj(Emotional, 10.0), adj(Flow, 5.0)],
    },
    Rule {
        name: "japanese context",
        matcher: Matcher::Nationality(&["japanese", "japan"]),
        adjustments: &[
            adj(Lone, 10.0),
            adj(Abstract, 8.0),
            adj(Constructive, 8.0),
        ],
    },
    Rule {
        name: "chinese context",
        matcher: Matcher::Nationality(&["chinese", "china"]),
        adjustments: &[adj(Meaning, 8.0), adj(Constructive, 10.0)],
    },
    Rule {
        name: "french context",
        matcher: Matcher::Nationality(&["french", "france"]),
        adjustments: &[adj(Abstract, 8.0), adj(Emotional, 5.0), adj(Flow, 8.0)],
    },
    Rule {
        name: "german context",
        matcher: Matcher::Nationality(&["german", "germany"]),
        adjustments: &[adj(Meaning, 10.0), adj(Constructive, 10.0)],
    },
    Rule {
        name: "italian context",
        matcher: Matcher::Nationality(&["italian", "italy"]),
        adjustments: &[adj(Emotional, 8.0), adj(Representational, 5.0)],
    },
    Rule {
        name: "american context",
        matcher: Matcher::Nationality(&["american", "united states"]),
        adjustments: &[adj(Social, 5.0), adj(Flow, 8.0)],
    },
    Rule {
        name: "british context",
        matcher: Matcher::Nationality(&["british", "english", "scottish"]),
        adjustments: &[adj(Meaning, 5.0), adj(Constructive, 5.0)],
    },
    Rule {
        name: "russian context",
        matcher: Matcher::Nationality(&["russian", "russia"]),
        adjustments: &[adj(Emotional, 10.0), adj(Abstract, 5.0)],
    },
    Rule {
        name: "low countries context",
        matcher: Matcher::Nationality(&["dutch", "flemish", "netherlandish"]),
        adjustments: &[adj(Representational, 10.0), adj(Constructive, 8.0)],
    },
    // Period
    Rule {
        name: "pre-modern period",
        matcher: Matcher::BornBefore(1500),
        adjustments: &[
            adj(Representational, 10.0),
            adj(Meaning, 8.0),
            adj(Constructive, 10.0),
        ],
    },
    Rule {
        name: "twentieth-century period",
        matcher: Matcher::BornAfter(1900),
        adjustments: &[adj(Abstract, 10.0), adj(Social, 5.0)],
    },
];

/// Everything rules can look at for one artist.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub name: &'a str,
    pub biography: Option<&'a str>,
    pub nationality: Option<&'a str>,
    pub era: Option<&'a str>,
    pub birth_year: Option<i32>,
    pub evidence: &'a MergedEvidence,
}

/// A rule that fired, with the adjustments actually applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub rule: &'static str,
    pub terms: Vec<String>,
    pub applied: Vec<Adjustment>,
}

struct CompiledRule {
    rule: &'static Rule,
    pattern: Option<Regex>,
}

/// Rules with their term lists compiled to whole-word patterns.
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

impl std::fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleTable")
            .field("rules", &self.rules.len())
            .finish()
    }
}

fn word_pattern(terms: &[&str]) -> Result<Regex, regex::Error> {
    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
}

fn distinct_matches(pattern: &Regex, haystack: &str) -> BTreeSet<String> {
    pattern
        .find_iter(haystack)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Whole-word pattern over every movement name in the standard table.
pub fn movement_pattern() -> Result<Regex, regex::Error> {
    let terms: Vec<&str> = STANDARD_RULES
        .iter()
        .filter_map(|rule| match rule.matcher {
            Matcher::Movement(terms) => Some(terms),
            _ => None,
        })
        .flatten()
        .copied()
        .collect();
    word_pattern(&terms)
}

impl RuleTable {
    pub fn standard() -> Result<Self, regex::Error> {
        Self::new(STANDARD_RULES)
    }

    pub fn new(rules: &'static [Rule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| {
                let pattern = match rule.matcher {
                    Matcher::Keywords(terms)
                    | Matcher::Tags(terms)
                    | Matcher::Movement(terms)
                    | Matcher::Nationality(terms) => Some(word_pattern(terms)?),
                    Matcher::AttributionPrefix
                    | Matcher::BornBefore(_)
                    | Matcher::BornAfter(_) => None,
                };
                Ok(CompiledRule { rule, pattern })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { rules })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &'static Rule> + '_ {
        self.rules.iter().map(|c| c.rule)
    }

    /// Evaluates every rule in table order.
    #[must_use]
    pub fn evaluate(&self, input: &RuleInput<'_>) -> Vec<RuleHit> {
        let text = combined_text(input);

        self.rules
            .iter()
            .filter_map(|compiled| evaluate_rule(compiled, input, &text))
            .collect()
    }
}

fn combined_text(input: &RuleInput<'_>) -> String {
    // The prefix has its own rule; only the bare name joins the text.
    let mut parts: Vec<&str> = vec![strip_attribution(input.name)];
    if let Some(era) = input.era {
        parts.push(era);
    }
    if let Some(bio) = input.biography {
        parts.push(bio);
    }
    for (_, excerpt) in &input.evidence.excerpts {
        parts.push(excerpt);
    }
    parts.join("\n")
}

fn scaled(adjustments: &[Adjustment], factor: f64) -> Vec<Adjustment> {
    adjustments
        .iter()
        .map(|a| adj(a.pole, a.delta * factor))
        .collect()
}

fn evaluate_rule(compiled: &CompiledRule, input: &RuleInput<'_>, text: &str) -> Option<RuleHit> {
    let rule = compiled.rule;
    let hit = |terms: Vec<String>, applied: Vec<Adjustment>| RuleHit {
        rule: rule.name,
        terms,
        applied,
    };

    match (rule.matcher, compiled.pattern.as_ref()) {
        (Matcher::Keywords(_), Some(pattern)) => {
            let terms: Vec<String> = distinct_matches(pattern, text)
                .into_iter()
                .take(MAX_KEYWORD_HITS)
                .collect();
            if terms.is_empty() {
                return None;
            }
            let factor = terms.len() as f64;
            Some(hit(terms, scaled(rule.adjustments, factor)))
        }
        (Matcher::Tags(_), Some(pattern)) => {
            let mut terms = Vec::new();
            let mut support: f64 = 0.0;
            for tag in input.evidence.tags.keys() {
                if pattern.is_match(tag) {
                    terms.push(tag.clone());
                    support = support.max(input.evidence.tag_support(tag));
                }
            }
            if terms.is_empty() {
                return None;
            }
            let factor = 0.5 + 0.5 * support;
            Some(hit(terms, scaled(rule.adjustments, factor)))
        }
        (Matcher::Movement(_), Some(pattern)) => {
            let mut terms = BTreeSet::new();
            if let Some(era) = input.era {
                terms.extend(distinct_matches(pattern, era));
            }
            terms.extend(distinct_matches(pattern, text));
            for tag in input.evidence.tags.keys() {
                terms.extend(distinct_matches(pattern, tag));
            }
            if terms.is_empty() {
                return None;
            }
            Some(hit(terms.into_iter().collect(), rule.adjustments.to_vec()))
        }
        (Matcher::Nationality(_), Some(pattern)) => {
            let nationality = input.nationality?;
            let terms: Vec<String> = distinct_matches(pattern, nationality).into_iter().collect();
            if terms.is_empty() {
                return None;
            }
            Some(hit(terms, rule.adjustments.to_vec()))
        }
        (Matcher::AttributionPrefix, _) => {
            let prefix = attribution_prefix(input.name)?;
            Some(hit(vec![prefix.to_string()], rule.adjustments.to_vec()))
        }
        (Matcher::BornBefore(year), _) => {
            let born = input.birth_year.filter(|b| *b < year)?;
            Some(hit(vec![born.to_string()], rule.adjustments.to_vec()))
        }
        (Matcher::BornAfter(year), _) => {
            let born = input.birth_year.filter(|b| *b > year)?;
            Some(hit(vec![born.to_string()], rule.adjustments.to_vec()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn input<'a>(name: &'a str, bio: Option<&'a str>, evidence: &'a MergedEvidence) -> RuleInput<'a> {
        RuleInput {
            name,
            biography: bio,
            nationality: None,
            era: None,
            birth_year: None,
            evidence,
        }
    }

    fn hit<'a>(hits: &'a [RuleHit], name: &str) -> Option<&'a RuleHit> {
        hits.iter().find(|h| h.rule == name)
    }

    #[test]
    fn test_rule_names_are_unique() {
        let names: BTreeSet<_> = STANDARD_RULES.iter().map(|r| r.name).collect();
        assert_eq!(names.len(), STANDARD_RULES.len());
        let table = RuleTable::standard().unwrap();
        assert_eq!(table.len(), STANDARD_RULES.len());
    }

    #[test]
    fn test_no_signal_no_hits() {
        let table = RuleTable::standard().unwrap();
        let evidence = MergedEvidence::default();
        assert!(table.evaluate(&input("Jane Doe", None, &evidence)).is_empty());
    }

    #[test]
    fn test_keywords_are_whole_words_and_capped() {
        let table = RuleTable::standard().unwrap();
        let evidence = MergedEvidence::default();
        let bio = "A solitary, reclusive hermit who worked alone in seclusion. Solitary again.";
        let hits = table.evaluate(&input("Jane Doe", Some(bio), &evidence));

        let solitude = hit(&hits, "solitude vocabulary").unwrap();
        assert_eq!(solitude.terms.len(), MAX_KEYWORD_HITS);
        assert!((solitude.applied[0].delta - 24.0).abs() < f64::EPSILON);

        let hits = table.evaluate(&input("Jane Doe", Some("abstractly speaking"), &evidence));
        assert!(hit(&hits, "abstraction vocabulary").is_none());
    }

    #[test]
    fn test_attribution_prefix_pushes_constructive() {
        let table = RuleTable::standard().unwrap();
        let evidence = MergedEvidence::default();
        let hits = table.evaluate(&input("Attributed to Jan Steen", None, &evidence));
        let rule = hit(&hits, "attribution prefix").unwrap();
        assert_eq!(rule.terms, vec!["attributed to".to_string()]);
        assert!(
            rule.applied
                .iter()
                .any(|a| a.pole == Pole::Constructive && a.delta > 0.0)
        );
    }

    #[test]
    fn test_movement_matches_era_field() {
        let table = RuleTable::standard().unwrap();
        let evidence = MergedEvidence::default();
        let mut rule_input = input("Jane Doe", None, &evidence);
        rule_input.era = Some("Surrealism");
        let hits = table.evaluate(&rule_input);
        assert!(hit(&hits, "surrealism").is_some());
        assert!(hit(&hits, "realism").is_none());
    }

    #[test]
    fn test_keywords_read_era_and_name() {
        let table = RuleTable::standard().unwrap();
        let evidence = MergedEvidence::default();
        let mut rule_input = input("Jane Doe", None, &evidence);
        rule_input.era = Some("Classical academic tradition");
        let hits = table.evaluate(&rule_input);
        let rule = hit(&hits, "construction vocabulary").unwrap();
        assert_eq!(rule.terms.len(), 2);

        let hits = table.evaluate(&input("The Hermit of Skagen", None, &evidence));
        assert!(hit(&hits, "solitude vocabulary").is_some());

        // Attribution prefixes count once, through their own rule.
        let hits = table.evaluate(&input("Workshop of Jan Steen", None, &evidence));
        assert!(hit(&hits, "attribution prefix").is_some());
        assert!(hit(&hits, "construction vocabulary").is_none());
    }

    #[test]
    fn test_tag_rules_scale_with_support() {
        let table = RuleTable::standard().unwrap();
        let mut evidence = MergedEvidence::default();
        evidence.tagging_sources = 2;
        evidence
            .tags
            .insert("portraits".into(), ["met_museum".to_string()].into());
        let hits = table.evaluate(&input("Jane Doe", None, &evidence));
        let rule = hit(&hits, "figurative holdings").unwrap();
        assert!((rule.applied[0].delta - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_birth_year_rules() {
        let table = RuleTable::standard().unwrap();
        let evidence = MergedEvidence::default();
        let mut rule_input = input("Jane Doe", None, &evidence);
        rule_input.birth_year = Some(1452);
        let hits = table.evaluate(&rule_input);
        assert!(hit(&hits, "pre-modern period").is_some());
        assert!(hit(&hits, "twentieth-century period").is_none());
    }
}
