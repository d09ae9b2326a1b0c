use super::axis::{Axis, Pole};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Static reference data attached to each archetype code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchetypeInfo {
    pub title: &'static str,
    pub title_ko: &'static str,
    pub animal: &'static str,
    pub animal_ko: &'static str,
    pub description: &'static str,
}

/// One of the 16 corners of the four-axis hypercube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArchetypeCode {
    Laef,
    Laec,
    Lamf,
    Lamc,
    Lref,
    Lrec,
    Lrmf,
    Lrmc,
    Saef,
    Saec,
    Samf,
    Samc,
    Sref,
    Srec,
    Srmf,
    Srmc,
}

impl ArchetypeCode {
    pub const ALL: [Self; 16] = [
        Self::Laef,
        Self::Laec,
        Self::Lamf,
        Self::Lamc,
        Self::Lref,
        Self::Lrec,
        Self::Lrmf,
        Self::Lrmc,
        Self::Saef,
        Self::Saec,
        Self::Samf,
        Self::Samc,
        Self::Sref,
        Self::Srec,
        Self::Srmf,
        Self::Srmc,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Laef => "LAEF",
            Self::Laec => "LAEC",
            Self::Lamf => "LAMF",
            Self::Lamc => "LAMC",
            Self::Lref => "LREF",
            Self::Lrec => "LREC",
            Self::Lrmf => "LRMF",
            Self::Lrmc => "LRMC",
            Self::Saef => "SAEF",
            Self::Saec => "SAEC",
            Self::Samf => "SAMF",
            Self::Samc => "SAMC",
            Self::Sref => "SREF",
            Self::Srec => "SREC",
            Self::Srmf => "SRMF",
            Self::Srmc => "SRMC",
        }
    }

    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// The four poles spelled by the code, in axis order.
    #[must_use]
    pub fn poles(self) -> [Pole; 4] {
        let bytes = self.as_str().as_bytes();
        Axis::ALL.map(|axis| {
            let letter = char::from(bytes[axis.index()]);
            if letter == axis.low_pole().letter() {
                axis.low_pole()
            } else {
                axis.high_pole()
            }
        })
    }

    #[must_use]
    pub fn pole(self, axis: Axis) -> Pole {
        self.poles()[axis.index()]
    }

    /// Builds a code from one pole per axis.
    #[must_use]
    pub fn from_poles(poles: [Pole; 4]) -> Option<Self> {
        let code: String = poles.iter().map(|p| p.letter()).collect();
        code.parse().ok()
    }

    /// Normalizes legacy codes whose letters were stored out of axis order
    /// (e.g. `RMCL`). Requires exactly one letter per axis.
    #[must_use]
    pub fn from_scrambled(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.chars().count() != 4 {
            return None;
        }

        let mut slots: [Option<Pole>; 4] = [None; 4];
        for letter in trimmed.chars() {
            let pole = Pole::from_letter(letter)?;
            let slot = &mut slots[pole.axis().index()];
            if slot.is_some() {
                return None;
            }
            *slot = Some(pole);
        }

        let [Some(a), Some(b), Some(c), Some(d)] = slots else {
            return None;
        };
        Self::from_poles([a, b, c, d])
    }

    #[must_use]
    pub const fn info(self) -> ArchetypeInfo {
        match self {
            Self::Laef => ArchetypeInfo {
                title: "The Intuitive Wanderer",
                title_ko: "몽환적 방랑자",
                animal: "fox",
                animal_ko: "여우",
                description: "Your soul speaks in colors and whispers",
            },
            Self::Laec => ArchetypeInfo {
                title: "The Contemplative Scholar",
                title_ko: "감성 큐레이터",
                animal: "cat",
                animal_ko: "고양이",
                description: "Finding profound meaning in artistic silence",
            },
            Self::Lamf => ArchetypeInfo {
                title: "The Philosophical Drifter",
                title_ko: "직관적 탐구자",
                animal: "owl",
                animal_ko: "올빼미",
                description: "Seeking truth through artistic wandering",
            },
            Self::Lamc => ArchetypeInfo {
                title: "The Systematic Theorist",
                title_ko: "철학적 수집가",
                animal: "turtle",
                animal_ko: "거북이",
                description: "Decoding the language of abstraction",
            },
            Self::Lref => ArchetypeInfo {
                title: "The Romantic Observer",
                title_ko: "고독한 관찰자",
                animal: "chameleon",
                animal_ko: "카멜레온",
                description: "Finding poetry in painted life",
            },
            Self::Lrec => ArchetypeInfo {
                title: "The Detail Devotee",
                title_ko: "섬세한 감정가",
                animal: "hedgehog",
                animal_ko: "고슴도치",
                description: "Reading emotions in every brushstroke",
            },
            Self::Lrmf => ArchetypeInfo {
                title: "The Documentary Wanderer",
                title_ko: "디지털 탐험가",
                animal: "octopus",
                animal_ko: "문어",
                description: "Collecting visual truths freely",
            },
            Self::Lrmc => ArchetypeInfo {
                title: "The Technical Master",
                title_ko: "학구적 연구자",
                animal: "beaver",
                animal_ko: "비버",
                description: "Decoding mastery in solitude",
            },
            Self::Saef => ArchetypeInfo {
                title: "The Expressive Connector",
                title_ko: "감성 나눔이",
                animal: "butterfly",
                animal_ko: "나비",
                description: "Sharing wonder with kindred spirits",
            },
            Self::Saec => ArchetypeInfo {
                title: "The Empathetic Guide",
                title_ko: "예술 네트워커",
                animal: "penguin",
                animal_ko: "펭귄",
                description: "Leading others through emotional landscapes",
            },
            Self::Samf => ArchetypeInfo {
                title: "The Idea Catalyst",
                title_ko: "영감 전도사",
                animal: "parrot",
                animal_ko: "앵무새",
                description: "Sparking intellectual adventures together",
            },
            Self::Samc => ArchetypeInfo {
                title: "The Knowledge Architect",
                title_ko: "문화 기획자",
                animal: "deer",
                animal_ko: "사슴",
                description: "Building understanding through shared analysis",
            },
            Self::Sref => ArchetypeInfo {
                title: "The Story Sharer",
                title_ko: "열정적 관람자",
                animal: "dog",
                animal_ko: "강아지",
                description: "Weaving human connections through art",
            },
            Self::Srec => ArchetypeInfo {
                title: "The Emotional Curator",
                title_ko: "따뜻한 안내자",
                animal: "duck",
                animal_ko: "오리",
                description: "Orchestrating shared feeling through art",
            },
            Self::Srmf => ArchetypeInfo {
                title: "The Cultural Explorer",
                title_ko: "지식 멘토",
                animal: "elephant",
                animal_ko: "코끼리",
                description: "Discovering society through shared observation",
            },
            Self::Srmc => ArchetypeInfo {
                title: "The Exhibition Educator",
                title_ko: "체계적 교육자",
                animal: "eagle",
                animal_ko: "독수리",
                description: "Building collective understanding systematically",
            },
        }
    }
}

impl fmt::Display for ArchetypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown archetype code: {0}")]
pub struct UnknownArchetype(pub String);

impl FromStr for ArchetypeCode {
    type Err = UnknownArchetype;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| UnknownArchetype(s.to_string()))
    }
}

impl Serialize for ArchetypeCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ArchetypeCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
