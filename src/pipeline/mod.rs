//! Release pipeline
//!
//! Cleaning, artifact inventory, upload instructions and the orchestrator
//! that chains them with the external packaging tools.

pub mod artifacts;
pub mod clean;
pub mod instructions;
pub mod publisher;

pub use artifacts::{ArtifactInventory, ArtifactKind, DistributionArtifact};
pub use clean::ArtifactCleaner;
pub use instructions::UploadInstructions;
pub use publisher::{PackagePublisher, PublishReport, StepRecord};
