use serde::{Deserialize, Serialize};
use std::fmt;

/// Neutral starting point for every sub-score.
pub const BASELINE: f64 = 50.0;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// The four bipolar trait axes, in code-letter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    LoneSocial,
    AbstractRepresentational,
    EmotionalMeaning,
    FlowConstructive,
}

impl Axis {
    pub const ALL: [Self; 4] = [
        Self::LoneSocial,
        Self::AbstractRepresentational,
        Self::EmotionalMeaning,
        Self::FlowConstructive,
    ];

    /// Key used in the persisted `dimensions` object.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::LoneSocial => "L_S",
            Self::AbstractRepresentational => "A_R",
            Self::EmotionalMeaning => "E_M",
            Self::FlowConstructive => "F_C",
        }
    }

    /// Pole favoured by scores below 50.
    #[must_use]
    pub const fn low_pole(self) -> Pole {
        match self {
            Self::LoneSocial => Pole::Lone,
            Self::AbstractRepresentational => Pole::Abstract,
            Self::EmotionalMeaning => Pole::Emotional,
            Self::FlowConstructive => Pole::Flow,
        }
    }

    /// Pole favoured by scores above 50.
    #[must_use]
    pub const fn high_pole(self) -> Pole {
        match self {
            Self::LoneSocial => Pole::Social,
            Self::AbstractRepresentational => Pole::Representational,
            Self::EmotionalMeaning => Pole::Meaning,
            Self::FlowConstructive => Pole::Constructive,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::LoneSocial => 0,
            Self::AbstractRepresentational => 1,
            Self::EmotionalMeaning => 2,
            Self::FlowConstructive => 3,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One end of an axis. Each pole owns exactly one sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pole {
    Lone,
    Social,
    Abstract,
    Representational,
    Emotional,
    Meaning,
    Flow,
    Constructive,
}

impl Pole {
    pub const ALL: [Self; 8] = [
        Self::Lone,
        Self::Social,
        Self::Abstract,
        Self::Representational,
        Self::Emotional,
        Self::Meaning,
        Self::Flow,
        Self::Constructive,
    ];

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Lone => 'L',
            Self::Social => 'S',
            Self::Abstract => 'A',
            Self::Representational => 'R',
            Self::Emotional => 'E',
            Self::Meaning => 'M',
            Self::Flow => 'F',
            Self::Constructive => 'C',
        }
    }

    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.letter() == letter.to_ascii_uppercase())
    }

    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Lone | Self::Social => Axis::LoneSocial,
            Self::Abstract | Self::Representational => Axis::AbstractRepresentational,
            Self::Emotional | Self::Meaning => Axis::EmotionalMeaning,
            Self::Flow | Self::Constructive => Axis::FlowConstructive,
        }
    }

    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(
            self,
            Self::Social | Self::Representational | Self::Meaning | Self::Constructive
        )
    }

    /// Name of the sub-score this pole drives.
    #[must_use]
    pub const fn sub_score_name(self) -> &'static str {
        match self {
            Self::Lone => "solitude",
            Self::Social => "sociability",
            Self::Abstract => "abstraction",
            Self::Representational => "representation",
            Self::Emotional => "emotion",
            Self::Meaning => "meaning",
            Self::Flow => "flow",
            Self::Constructive => "construction",
        }
    }

    /// Position of this pole's corner on its axis (0 or 100).
    #[must_use]
    pub const fn corner(self) -> f64 {
        if self.is_high() { MAX_SCORE } else { MIN_SCORE }
    }
}

#[must_use]
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(MIN_SCORE, MAX_SCORE)
}

/// Rounds to two decimals so serialized documents stay stable.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The eight pole strengths, two per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubScores {
    pub solitude: f64,
    pub sociability: f64,
    pub abstraction: f64,
    pub representation: f64,
    pub emotion: f64,
    pub meaning: f64,
    pub flow: f64,
    pub construction: f64,
}

impl Default for SubScores {
    fn default() -> Self {
        Self::neutral()
    }
}

impl SubScores {
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            solitude: BASELINE,
            sociability: BASELINE,
            abstraction: BASELINE,
            representation: BASELINE,
            emotion: BASELINE,
            meaning: BASELINE,
            flow: BASELINE,
            construction: BASELINE,
        }
    }

    #[must_use]
    pub const fn get(&self, pole: Pole) -> f64 {
        match pole {
            Pole::Lone => self.solitude,
            Pole::Social => self.sociability,
            Pole::Abstract => self.abstraction,
            Pole::Representational => self.representation,
            Pole::Emotional => self.emotion,
            Pole::Meaning => self.meaning,
            Pole::Flow => self.flow,
            Pole::Constructive => self.construction,
        }
    }

    fn slot(&mut self, pole: Pole) -> &mut f64 {
        match pole {
            Pole::Lone => &mut self.solitude,
            Pole::Social => &mut self.sociability,
            Pole::Abstract => &mut self.abstraction,
            Pole::Representational => &mut self.representation,
            Pole::Emotional => &mut self.emotion,
            Pole::Meaning => &mut self.meaning,
            Pole::Flow => &mut self.flow,
            Pole::Constructive => &mut self.construction,
        }
    }

    /// Adds `delta` to the pole's sub-score without clamping.
    pub fn adjust(&mut self, pole: Pole, delta: f64) {
        *self.slot(pole) += delta;
    }

    #[must_use]
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for pole in Pole::ALL {
            let slot = out.slot(pole);
            *slot = round2(clamp_score(*slot));
        }
        out
    }

    #[must_use]
    pub fn is_neutral(&self) -> bool {
        Pole::ALL
            .into_iter()
            .all(|p| (self.get(p) - BASELINE).abs() < f64::EPSILON)
    }

    #[must_use]
    pub fn in_range(&self) -> bool {
        Pole::ALL
            .into_iter()
            .all(|p| (MIN_SCORE..=MAX_SCORE).contains(&self.get(p)))
    }

    /// Main score for an axis: `50 + high - low`, clamped.
    #[must_use]
    pub fn axis_score(&self, axis: Axis) -> f64 {
        round2(clamp_score(
            BASELINE + self.get(axis.high_pole()) - self.get(axis.low_pole()),
        ))
    }
}

/// Four main scores plus, when computed by the scorer, the sub-scores behind them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScores {
    main: [f64; 4],
    sub: Option<SubScores>,
}

impl AxisScores {
    /// Derives the main scores from sub-scores. Sub-scores are clamped first.
    #[must_use]
    pub fn from_sub_scores(sub: SubScores) -> Self {
        let sub = sub.clamped();
        let main = Axis::ALL.map(|axis| sub.axis_score(axis));
        Self {
            main,
            sub: Some(sub),
        }
    }

    /// Main scores without sub-scores, as found in migrated legacy profiles.
    #[must_use]
    pub fn from_main(l_s: f64, a_r: f64, e_m: f64, f_c: f64) -> Self {
        Self {
            main: [l_s, a_r, e_m, f_c].map(|v| round2(clamp_score(v))),
            sub: None,
        }
    }

    #[must_use]
    pub fn neutral() -> Self {
        Self::from_sub_scores(SubScores::neutral())
    }

    #[must_use]
    pub const fn get(&self, axis: Axis) -> f64 {
        self.main[axis.index()]
    }

    #[must_use]
    pub const fn main(&self) -> [f64; 4] {
        self.main
    }

    #[must_use]
    pub const fn sub_scores(&self) -> Option<&SubScores> {
        self.sub.as_ref()
    }

    /// Pole the score leans toward, or `None` when exactly neutral.
    #[must_use]
    pub fn leaning(&self, axis: Axis) -> Option<Pole> {
        let value = self.get(axis);
        if value < BASELINE {
            Some(axis.low_pole())
        } else if value > BASELINE {
            Some(axis.high_pole())
        } else {
            None
        }
    }
}
