//! Updates every dependency that shares a version with the one being bumped.
//!
//! Gradle builds often pin several artifacts through one property
//! (`ext.kotlin_version`) or one `dependencySet` block. Bumping one of them
//! means bumping all of them, and that is only possible when every sibling
//! publishes the target version.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::requirements_updater::{DependencySet, RequirementEntry, RequirementsUpdater};
use super::version::GradleVersion;
use crate::requirement::{GradleRequirement, RequirementParseError};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("update not possible for {0}")]
    NotPossible(String),
    #[error(transparent)]
    Requirement(#[from] RequirementParseError),
}

/// A dependency as declared in the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,
    pub requirements: Vec<RequirementEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_requirements: Option<Vec<RequirementEntry>>,
    pub package_manager: String,
}

impl Dependency {
    pub fn new(name: &str, version: Option<&str>, requirements: Vec<RequirementEntry>) -> Self {
        Self {
            name: name.to_string(),
            version: version.map(str::to_string),
            previous_version: None,
            requirements,
            previous_requirements: None,
            package_manager: "gradle".to_string(),
        }
    }
}

/// Version to move to and the repository it was found in.
#[derive(Debug, Clone)]
pub struct TargetVersionDetails {
    pub version: GradleVersion,
    pub source_url: String,
}

/// Dependencies declared in the build files.
pub trait DependencySetLookup {
    fn declared_dependencies(&self) -> Vec<Dependency>;
}

/// Whether a dependency's repository publishes a version.
pub trait VersionAvailability {
    fn has_version(&self, dependency: &Dependency, version: &GradleVersion) -> bool;
}

/// Bumps a dependency together with its property or dependency-set siblings.
pub struct MultiDependencyUpdater<'a> {
    dependency: &'a Dependency,
    target: Option<TargetVersionDetails>,
    ignored_versions: Vec<String>,
    lookup: &'a dyn DependencySetLookup,
    availability: &'a dyn VersionAvailability,
}

impl<'a> MultiDependencyUpdater<'a> {
    pub fn new(
        dependency: &'a Dependency,
        target: Option<TargetVersionDetails>,
        ignored_versions: Vec<String>,
        lookup: &'a dyn DependencySetLookup,
        availability: &'a dyn VersionAvailability,
    ) -> Self {
        Self {
            dependency,
            target,
            ignored_versions,
            lookup,
            availability,
        }
    }

    fn property_name(&self) -> Option<&str> {
        self.dependency
            .requirements
            .iter()
            .find_map(RequirementEntry::property_name)
    }

    fn dependency_set(&self) -> Option<&DependencySet> {
        self.dependency
            .requirements
            .iter()
            .find_map(RequirementEntry::dependency_set)
    }

    /// Declared dependencies that share the property or dependency set.
    pub fn dependencies_to_update(&self) -> Vec<Dependency> {
        let property_name = self.property_name();
        let dependency_set = self.dependency_set();
        if property_name.is_none() && dependency_set.is_none() {
            return vec![self.dependency.clone()];
        }

        self.lookup
            .declared_dependencies()
            .into_iter()
            .filter(|dep| {
                dep.requirements.iter().any(|req| {
                    (property_name.is_some() && req.property_name() == property_name)
                        || (dependency_set.is_some() && req.dependency_set() == dependency_set)
                })
            })
            .collect()
    }

    fn is_ignored(&self, version: &GradleVersion) -> bool {
        self.ignored_versions.iter().any(|ignored| {
            match GradleRequirement::requirements_array(ignored) {
                Ok(requirements) => requirements.iter().any(|r| r.satisfied_by(version)),
                Err(e) => {
                    tracing::warn!("Invalid ignore condition {}: {}", ignored, e);
                    false
                }
            }
        })
    }

    pub fn update_possible(&self) -> bool {
        let Some(target) = &self.target else {
            return false;
        };
        if self.is_ignored(&target.version) {
            tracing::debug!("Target version {} is ignored", target.version);
            return false;
        }
        self.dependencies_to_update().iter().all(|dep| {
            let available = self.availability.has_version(dep, &target.version);
            if !available {
                tracing::debug!("{} does not publish {}", dep.name, target.version);
            }
            available
        })
    }

    /// One updated dependency per sibling.
    pub fn updated_dependencies(&self) -> Result<Vec<Dependency>, UpdateError> {
        let target = match &self.target {
            Some(target) if self.update_possible() => target,
            _ => return Err(UpdateError::NotPossible(self.dependency.name.clone())),
        };

        self.dependencies_to_update()
            .into_iter()
            .map(|dep| {
                let requirements = self.updated_requirements(&dep, target)?;
                Ok(Dependency {
                    version: Some(target.version.to_string()),
                    previous_version: dep.version.clone(),
                    previous_requirements: Some(dep.requirements.clone()),
                    requirements,
                    ..dep
                })
            })
            .collect()
    }

    fn updated_requirements(
        &self,
        dep: &Dependency,
        target: &TargetVersionDetails,
    ) -> Result<Vec<RequirementEntry>, UpdateError> {
        let property_name = self.property_name();
        let dependency_set = self.dependency_set();
        let properties = property_name.map(str::to_string).into_iter().collect();

        let updater = RequirementsUpdater::new(
            dep.requirements.clone(),
            Some(target.version.clone()),
            &target.source_url,
            properties,
        );
        let updated = updater.updated_requirements()?;

        // Only the shared declaration moves; other declarations keep their version
        Ok(dep
            .requirements
            .iter()
            .zip(updated)
            .map(|(original, updated)| {
                let shared = (property_name.is_some() && original.property_name() == property_name)
                    || (dependency_set.is_some() && original.dependency_set() == dependency_set);
                if shared { updated } else { original.clone() }
            })
            .collect())
    }
}
