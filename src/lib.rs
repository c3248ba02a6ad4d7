pub mod core;
pub mod pipeline;
pub mod security;

pub use self::core::*;
pub use pipeline::{
    ArtifactCleaner, ArtifactInventory, ArtifactKind, DistributionArtifact, PackagePublisher,
    PublishReport, StepRecord, UploadInstructions,
};
pub use security::{CommandError, SafeCommandExecutor};
