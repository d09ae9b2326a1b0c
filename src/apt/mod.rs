//! Artist personality classification.
//!
//! Pure pipeline stages live here: evidence merge, rule-table scoring,
//! archetype resolution and the persisted profile document. Network and
//! database access stay in `clients`, `db` and `services`.

pub mod aggregator;
pub mod archetype;
pub mod attribution;
pub mod axis;
pub mod evidence;
pub mod legacy;
pub mod profile;
pub mod resolver;
pub mod rules;
pub mod scorer;

pub use aggregator::{MergedEvidence, merge};
pub use archetype::ArchetypeCode;
pub use axis::{Axis, AxisScores, Pole, SubScores};
pub use evidence::{ArtistQuery, CollectorOutcome, EvidenceRecord, SourcedOutcome};
pub use profile::{AptProfile, ProfileError, StoredProfile};
pub use resolver::{PrimaryType, Resolution, ResolverSettings};
pub use scorer::{AxisScorer, ScoreCard};
