//! Per-ecosystem version schemes.
//!
//! Each ecosystem has its own closed version type with its own ordering
//! rules. Generic code such as [`Requirement`](crate::requirement::Requirement)
//! is written against the [`VersionScheme`] capability instead of a
//! particular version type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::docker::DockerVersion;
use crate::gradle::GradleVersion;
use crate::token::{VersionToken, tokenize};

/// Capability shared by every ecosystem's version rules.
pub trait VersionScheme: Send + Sync + 'static {
    /// The ecosystem's version value type
    type Version: Ord + Clone + fmt::Debug + fmt::Display + Send + Sync;

    /// Human readable scheme name
    const NAME: &'static str;

    /// Parses any string into a version. Never fails; malformed input is
    /// still ordered on a best-effort basis.
    fn parse(raw: &str) -> Self::Version;

    /// Whether `raw` matches the ecosystem's version grammar.
    fn is_correct(raw: &str) -> bool;

    /// Lossless token view of `raw`.
    fn tokenize(raw: &str) -> Vec<VersionToken> {
        tokenize(raw)
    }

    /// Leading numeric segments, used to compute pessimistic upper bounds.
    fn release_segments(version: &Self::Version) -> Vec<u64>;

    /// Whether the version carries a pre-release qualifier.
    fn is_prerelease(version: &Self::Version) -> bool;
}

/// Docker image tags (`17.04`, `3.6.2-alpine3.6`, `RELEASE.2025-01-20T14-49-07Z`)
#[derive(Debug, Clone, Copy, Default)]
pub struct Docker;

/// Gradle and Maven coordinates (`23.6-jre`, `1.+`, `1.0.0.RELEASE`)
#[derive(Debug, Clone, Copy, Default)]
pub struct Gradle;

impl VersionScheme for Docker {
    type Version = DockerVersion;

    const NAME: &'static str = "docker";

    fn parse(raw: &str) -> DockerVersion {
        DockerVersion::new(raw)
    }

    fn is_correct(raw: &str) -> bool {
        DockerVersion::is_correct(raw)
    }

    fn release_segments(version: &DockerVersion) -> Vec<u64> {
        version.segments()
    }

    fn is_prerelease(version: &DockerVersion) -> bool {
        version.is_prerelease()
    }
}

impl VersionScheme for Gradle {
    type Version = GradleVersion;

    const NAME: &'static str = "gradle";

    fn parse(raw: &str) -> GradleVersion {
        GradleVersion::new(raw)
    }

    fn is_correct(raw: &str) -> bool {
        GradleVersion::is_correct(raw)
    }

    fn release_segments(version: &GradleVersion) -> Vec<u64> {
        version.segments()
    }

    fn is_prerelease(version: &GradleVersion) -> bool {
        version.is_prerelease()
    }
}

/// Projects leading numeric segments onto `major.minor.patch`.
///
/// Missing components are zero, extra components are dropped. Returns `None`
/// when there are no numeric segments at all.
pub fn semver_projection(segments: &[u64]) -> Option<String> {
    if segments.is_empty() {
        return None;
    }
    let part = |idx: usize| segments.get(idx).copied().unwrap_or(0);
    Some(format!("{}.{}.{}", part(0), part(1), part(2)))
}

/// Runtime selector for a version scheme.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    #[default]
    Docker,
    /// Also covers Maven coordinates
    Gradle,
}

impl Ecosystem {
    /// Get lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Docker => Docker::NAME,
            Ecosystem::Gradle => Gradle::NAME,
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
