//! Gradle and Maven coordinates: version ordering and requirement updates.

pub mod multi_dependency_updater;
pub mod requirements_updater;
pub mod version;

pub use multi_dependency_updater::{
    Dependency, DependencySetLookup, MultiDependencyUpdater, TargetVersionDetails, UpdateError,
    VersionAvailability,
};
pub use requirements_updater::{
    DependencySet, DistributionChecksums, RequirementEntry, RequirementMetadata, RequirementSource,
    RequirementsUpdater,
};
pub use version::GradleVersion;
