pub mod evidence;
pub use evidence::EvidenceService;

pub mod classification_service;
pub mod classification_service_impl;
pub use classification_service::{
    BatchOptions, BatchReport, Classification, ClassificationError, ClassificationService,
    ClassifyOptions, ClassifyOutcome,
};
pub use classification_service_impl::SeaOrmClassificationService;

pub mod profile_migration;
pub use profile_migration::{MigrationReport, ProfileMigrationService};
