use serde::{Deserialize, Serialize};

use crate::apt::evidence::ArtistQuery;
use crate::apt::rules::RuleInput;
use crate::apt::MergedEvidence;
use crate::domain::ArtistId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: i32,
    pub name: String,
    /// Korean display name
    pub name_ko: Option<String>,
    pub nationality: Option<String>,
    pub era: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub biography: Option<String>,
    pub follower_count: i32,
    pub is_verified: bool,
    pub apt_profile: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Artist {
    #[must_use]
    pub const fn artist_id(&self) -> ArtistId {
        ArtistId::new(self.id)
    }

    #[must_use]
    pub const fn is_classified(&self) -> bool {
        self.apt_profile.is_some()
    }

    #[must_use]
    pub fn query(&self) -> ArtistQuery {
        ArtistQuery::new(
            &self.name,
            self.nationality.as_deref(),
            self.era.as_deref(),
        )
    }

    #[must_use]
    pub fn rule_input<'a>(&'a self, evidence: &'a MergedEvidence) -> RuleInput<'a> {
        RuleInput {
            name: &self.name,
            biography: self.biography.as_deref(),
            nationality: self.nationality.as_deref(),
            era: self.era.as_deref(),
            birth_year: self.birth_year,
            evidence,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewArtist {
    pub name: String,
    pub name_ko: Option<String>,
    pub nationality: Option<String>,
    pub era: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub biography: Option<String>,
    pub follower_count: i32,
    pub is_verified: bool,
}

impl NewArtist {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
