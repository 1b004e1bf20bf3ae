//! Rewrites declared Gradle/Maven requirements to point at a new version.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::version::GradleVersion;
use crate::requirement::{GradleRequirement, RequirementParseError};

/// Source type recorded on requirements resolved from a Maven repository
pub const MAVEN_REPO_SOURCE: &str = "maven_repo";

/// Source type of `gradle-wrapper.properties` entries
pub const GRADLE_DISTRIBUTION_SOURCE: &str = "gradle-distribution";

const DISTRIBUTION_URL_PROPERTY: &str = "distributionUrl";
const DISTRIBUTION_CHECKSUM_PROPERTY: &str = "distributionSha256Sum";

/// Version part of `gradle-8.14.2-all.zip` and its `.sha256` companion
static DISTRIBUTION_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"gradle-(?P<version>\d[^/]*?)-(?:all|bin)\.zip")
        .expect("valid distribution url pattern")
});

/// Fetches the published checksum of a Gradle distribution.
pub trait DistributionChecksums {
    /// Contents of the `.sha256` file at `url`, `None` when unavailable.
    fn checksum(&self, url: &str) -> Option<String>;
}

impl<F> DistributionChecksums for F
where
    F: Fn(&str) -> Option<String>,
{
    fn checksum(&self, url: &str) -> Option<String> {
        self(url)
    }
}

struct NoChecksums;

impl DistributionChecksums for NoChecksums {
    fn checksum(&self, _url: &str) -> Option<String> {
        None
    }
}

/// Where a requirement's version is resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    /// Wrapper property the entry was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl RequirementSource {
    pub fn maven_repo(url: &str) -> Self {
        Self {
            kind: MAVEN_REPO_SOURCE.to_string(),
            url: url.to_string(),
            property: None,
        }
    }
}

/// Group and version shared by a `dependencySet` block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencySet {
    pub group: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementMetadata {
    /// Build property the version is read from (`kotlin_version`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_set: Option<DependencySet>,
}

/// One declaration of a dependency in a build file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub file: String,
    pub requirement: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub source: Option<RequirementSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RequirementMetadata>,
}

impl RequirementEntry {
    pub fn new(file: &str, requirement: Option<&str>) -> Self {
        Self {
            file: file.to_string(),
            requirement: requirement.map(str::to_string),
            groups: Vec::new(),
            source: None,
            metadata: None,
        }
    }

    pub fn property_name(&self) -> Option<&str> {
        self.metadata.as_ref()?.property_name.as_deref()
    }

    pub fn dependency_set(&self) -> Option<&DependencySet> {
        self.metadata.as_ref()?.dependency_set.as_ref()
    }
}

/// Updates requirement entries to a target version.
#[derive(Debug, Clone)]
pub struct RequirementsUpdater {
    requirements: Vec<RequirementEntry>,
    latest_version: Option<GradleVersion>,
    source_url: String,
    properties_to_update: Vec<String>,
}

impl RequirementsUpdater {
    pub fn new(
        requirements: Vec<RequirementEntry>,
        latest_version: Option<GradleVersion>,
        source_url: &str,
        properties_to_update: Vec<String>,
    ) -> Self {
        Self {
            requirements,
            latest_version,
            source_url: source_url.to_string(),
            properties_to_update,
        }
    }

    /// Entries rewritten to the latest version. Ranges, entries without a
    /// requirement and entries driven by other properties are returned as-is.
    ///
    /// Wrapper checksum entries can't be updated without downloading the new
    /// checksum and are returned as-is; see
    /// [`Self::updated_requirements_with_checksums`].
    pub fn updated_requirements(&self) -> Result<Vec<RequirementEntry>, RequirementParseError> {
        self.updated_requirements_with_checksums(&NoChecksums)
    }

    /// [`Self::updated_requirements`], with wrapper checksum entries moved to
    /// the new distribution's checksum.
    pub fn updated_requirements_with_checksums(
        &self,
        checksums: &dyn DistributionChecksums,
    ) -> Result<Vec<RequirementEntry>, RequirementParseError> {
        let Some(latest) = &self.latest_version else {
            return Ok(self.requirements.clone());
        };
        self.requirements
            .iter()
            .map(|entry| self.updated_entry(entry, latest, checksums))
            .collect()
    }

    fn updated_entry(
        &self,
        entry: &RequirementEntry,
        latest: &GradleVersion,
        checksums: &dyn DistributionChecksums,
    ) -> Result<RequirementEntry, RequirementParseError> {
        let Some(requirement) = entry.requirement.as_deref() else {
            return Ok(entry.clone());
        };

        if let Some(source) = &entry.source
            && source.kind == GRADLE_DISTRIBUTION_SOURCE
        {
            return Ok(update_distribution(entry, source, latest, checksums));
        }

        if requirement.contains(',') {
            tracing::debug!("Leaving range requirement {} in {} untouched", requirement, entry.file);
            return Ok(entry.clone());
        }
        if let Some(property) = entry.property_name()
            && !self.properties_to_update.iter().any(|p| p == property)
        {
            tracing::debug!("Property {} is not being updated", property);
            return Ok(entry.clone());
        }

        let updated = if GradleVersion::new(requirement).is_dynamic() {
            update_dynamic_requirement(requirement, latest)
        } else {
            update_requirement(requirement, latest)?
        };

        Ok(RequirementEntry {
            requirement: Some(updated),
            source: Some(RequirementSource::maven_repo(&self.source_url)),
            ..entry.clone()
        })
    }
}

/// Replaces the first clause's version text with `latest`.
fn update_requirement(
    requirement: &str,
    latest: &GradleVersion,
) -> Result<String, RequirementParseError> {
    let parsed = GradleRequirement::parse(requirement)?;
    let Some(first) = parsed.clauses().first() else {
        return Ok(requirement.to_string());
    };
    Ok(requirement.replace(&first.version.to_string(), latest.as_str()))
}

/// Keeps the number of fixed segments: `22.+` → `23.+`, `22.1+` → `23.6+`.
fn update_dynamic_requirement(requirement: &str, latest: &GradleVersion) -> String {
    if requirement.trim() == "+" {
        return requirement.to_string();
    }
    let base = requirement.trim().trim_end_matches('+');
    let dotted = base.ends_with('.');
    let precision = base.trim_end_matches('.').split('.').count();

    let segments = latest.segments();
    if segments.is_empty() {
        return requirement.to_string();
    }
    let fixed = segments
        .iter()
        .take(precision)
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    if dotted {
        format!("{fixed}.+")
    } else {
        format!("{fixed}+")
    }
}

/// Puts `latest` in place of the version in a distribution URL.
fn rewrite_distribution_url(url: &str, latest: &GradleVersion) -> Option<String> {
    let version = DISTRIBUTION_VERSION.captures(url)?.name("version")?;
    Some(format!(
        "{}{}{}",
        &url[..version.start()],
        latest.as_str(),
        &url[version.end()..]
    ))
}

/// Wrapper distributions carry the version in their URL, and the checksum
/// entry next to them has to follow the new distribution.
fn update_distribution(
    entry: &RequirementEntry,
    source: &RequirementSource,
    latest: &GradleVersion,
    checksums: &dyn DistributionChecksums,
) -> RequirementEntry {
    let Some(url) = rewrite_distribution_url(&source.url, latest) else {
        tracing::debug!("No Gradle version in distribution url {}", source.url);
        return entry.clone();
    };

    let requirement = match source.property.as_deref() {
        Some(DISTRIBUTION_URL_PROPERTY) => latest.to_string(),
        Some(DISTRIBUTION_CHECKSUM_PROPERTY) => match checksums.checksum(&url) {
            Some(checksum) => checksum.trim().to_string(),
            None => {
                tracing::warn!("No checksum available at {}, keeping {}", url, entry.file);
                return entry.clone();
            }
        },
        _ => return entry.clone(),
    };

    RequirementEntry {
        requirement: Some(requirement),
        source: Some(RequirementSource {
            url,
            ..source.clone()
        }),
        ..entry.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updated(requirement: Option<&str>, latest: Option<&str>) -> RequirementEntry {
        let entry = RequirementEntry::new("pom.xml", requirement);
        let updater =
            RequirementsUpdater::new(vec![entry], latest.map(GradleVersion::new), "new_url", vec![]);
        updater.updated_requirements().unwrap().remove(0)
    }

    #[test]
    fn test_no_latest_version() {
        let entry = updated(Some("23.3-jre"), None);
        assert_eq!(entry, RequirementEntry::new("pom.xml", Some("23.3-jre")));
    }

    #[test]
    fn test_no_requirement() {
        let entry = updated(None, Some("23.6-jre"));
        assert_eq!(entry, RequirementEntry::new("pom.xml", None));
    }

    #[test]
    fn test_soft_requirement() {
        let entry = updated(Some("23.3-jre"), Some("23.6-jre"));
        assert_eq!(entry.requirement.as_deref(), Some("23.6-jre"));
        assert_eq!(entry.source, Some(RequirementSource::maven_repo("new_url")));
    }

    #[test]
    fn test_latest_requirement() {
        let entry = updated(Some("LATEST"), Some("23.6-jre"));
        assert_eq!(entry.requirement.as_deref(), Some("23.6-jre"));
    }

    #[test]
    fn test_multiple_dashes() {
        let entry = updated(Some("v2-rev398-1.24.1"), Some("v2-rev404-1.25.0"));
        assert_eq!(entry.requirement.as_deref(), Some("v2-rev404-1.25.0"));
    }

    #[test]
    fn test_uppercase_requirement() {
        let entry = updated(Some("23.3.RELEASE"), Some("23.6-jre"));
        assert_eq!(entry.requirement.as_deref(), Some("23.6-jre"));
    }

    #[test]
    fn test_hard_requirement() {
        let entry = updated(Some("[23.3-jre]"), Some("23.6-jre"));
        assert_eq!(entry.requirement.as_deref(), Some("[23.6-jre]"));
    }

    #[test]
    fn test_dynamic_requirements() {
        let latest = Some("23.6-jre");
        assert_eq!(updated(Some("22.+"), latest).requirement.as_deref(), Some("23.+"));
        assert_eq!(updated(Some("22.1+"), latest).requirement.as_deref(), Some("23.6+"));
        assert_eq!(updated(Some("+"), latest).requirement.as_deref(), Some("+"));
    }

    #[test]
    fn test_range_is_untouched() {
        let entries = vec![
            RequirementEntry::new("pom.xml", Some("23.3-jre")),
            RequirementEntry::new("another/pom.xml", Some("[23.0,)")),
        ];
        let updater = RequirementsUpdater::new(
            entries,
            Some(GradleVersion::new("23.6-jre")),
            "new_url",
            vec![],
        );
        let result = updater.updated_requirements().unwrap();
        assert_eq!(result[0].requirement.as_deref(), Some("23.6-jre"));
        assert_eq!(result[1], RequirementEntry::new("another/pom.xml", Some("[23.0,)")));
    }

    #[test]
    fn test_multiple_requirements() {
        let entries = vec![
            RequirementEntry::new("pom.xml", Some("23.3-jre")),
            RequirementEntry::new("another/pom.xml", Some("[23.4-jre]")),
        ];
        let updater = RequirementsUpdater::new(
            entries,
            Some(GradleVersion::new("23.6-jre")),
            "new_url",
            vec![],
        );
        let result = updater.updated_requirements().unwrap();
        assert_eq!(result[0].requirement.as_deref(), Some("23.6-jre"));
        assert_eq!(result[1].requirement.as_deref(), Some("[23.6-jre]"));
        assert!(result.iter().all(|r| r.source == Some(RequirementSource::maven_repo("new_url"))));
    }

    #[test]
    fn test_property_requirements() {
        let mut entry = RequirementEntry::new("build.gradle", Some("1.1.4-3"));
        entry.metadata = Some(RequirementMetadata {
            property_name: Some("kotlin_version".to_string()),
            dependency_set: None,
        });
        let latest = Some(GradleVersion::new("23.6-jre"));

        let skipped = RequirementsUpdater::new(vec![entry.clone()], latest.clone(), "new_url", vec![]);
        assert_eq!(skipped.updated_requirements().unwrap()[0], entry);

        let updater =
            RequirementsUpdater::new(vec![entry], latest, "new_url", vec!["kotlin_version".into()]);
        let result = updater.updated_requirements().unwrap();
        assert_eq!(result[0].requirement.as_deref(), Some("23.6-jre"));
        assert_eq!(result[0].property_name(), Some("kotlin_version"));
    }

    const WRAPPER: &str = "gradle/wrapper/gradle-wrapper.properties";
    const ALL_8_14_2: &str = "443c9c8ee2ac1ee0e11881a40f2376d79c66386264a44b24a9f8ca67e633375f";
    const BIN_8_14_3: &str = "bd71102213493060956ec229d946beee57158dbd89d0e62b91bca0fa2c5f3531";
    const ALL_9_0_0: &str = "f759b8dd5204e2e3fa4ca3e73f452f087153cf81bac9561eeb854229cc2c5365";
    const BIN_9_0_0: &str = "8fad3d78296ca518113f3d29016617c7f9367dc005f932bd9d93bf45ba46072b";

    fn distribution_entry(file: &str, version: &str, flavor: &str) -> RequirementEntry {
        RequirementEntry {
            source: Some(RequirementSource {
                kind: GRADLE_DISTRIBUTION_SOURCE.to_string(),
                url: format!(
                    "https://services.gradle.org/distributions/gradle-{version}-{flavor}.zip"
                ),
                property: Some("distributionUrl".to_string()),
            }),
            ..RequirementEntry::new(file, Some(version))
        }
    }

    fn checksum_entry(file: &str, version: &str, flavor: &str, sum: &str) -> RequirementEntry {
        RequirementEntry {
            source: Some(RequirementSource {
                kind: GRADLE_DISTRIBUTION_SOURCE.to_string(),
                url: format!(
                    "https://services.gradle.org/distributions/gradle-{version}-{flavor}.zip.sha256"
                ),
                property: Some("distributionSha256Sum".to_string()),
            }),
            ..RequirementEntry::new(file, Some(sum))
        }
    }

    fn published_checksums(url: &str) -> Option<String> {
        match url {
            "https://services.gradle.org/distributions/gradle-9.0.0-all.zip.sha256" => {
                Some(format!("{ALL_9_0_0}\n"))
            }
            "https://services.gradle.org/distributions/gradle-9.0.0-bin.zip.sha256" => {
                Some(BIN_9_0_0.to_string())
            }
            _ => None,
        }
    }

    fn wrapper_updater(entries: Vec<RequirementEntry>) -> RequirementsUpdater {
        RequirementsUpdater::new(entries, Some(GradleVersion::new("9.0.0")), "new_url", vec![])
    }

    #[test]
    fn test_distribution_url_and_checksum() {
        let updater = wrapper_updater(vec![
            distribution_entry(WRAPPER, "8.14.2", "all"),
            checksum_entry(WRAPPER, "8.14.2", "all", ALL_8_14_2),
        ]);
        let result = updater
            .updated_requirements_with_checksums(&published_checksums)
            .unwrap();

        assert_eq!(result[0], distribution_entry(WRAPPER, "9.0.0", "all"));
        assert_eq!(result[1], checksum_entry(WRAPPER, "9.0.0", "all", ALL_9_0_0));
    }

    #[test]
    fn test_distribution_without_checksum_entry() {
        let updater = wrapper_updater(vec![distribution_entry(WRAPPER, "8.14.2", "all")]);
        let result = updater
            .updated_requirements_with_checksums(&published_checksums)
            .unwrap();
        assert_eq!(result, vec![distribution_entry(WRAPPER, "9.0.0", "all")]);
    }

    #[test]
    fn test_multiple_wrapper_files() {
        let other = "another/gradle/wrapper/gradle-wrapper.properties";
        let updater = wrapper_updater(vec![
            distribution_entry(WRAPPER, "8.14.2", "all"),
            checksum_entry(WRAPPER, "8.14.2", "all", ALL_8_14_2),
            distribution_entry(other, "8.14.3", "bin"),
            checksum_entry(other, "8.14.3", "bin", BIN_8_14_3),
        ]);
        let result = updater
            .updated_requirements_with_checksums(&published_checksums)
            .unwrap();

        assert_eq!(
            result,
            vec![
                distribution_entry(WRAPPER, "9.0.0", "all"),
                checksum_entry(WRAPPER, "9.0.0", "all", ALL_9_0_0),
                distribution_entry(other, "9.0.0", "bin"),
                checksum_entry(other, "9.0.0", "bin", BIN_9_0_0),
            ]
        );
    }

    #[test]
    fn test_checksum_left_alone_when_unavailable() {
        let checksum = checksum_entry(WRAPPER, "8.14.2", "all", "443c9c8e");
        let updater =
            wrapper_updater(vec![distribution_entry(WRAPPER, "8.14.2", "all"), checksum.clone()]);

        let result = updater.updated_requirements().unwrap();
        assert_eq!(result[0], distribution_entry(WRAPPER, "9.0.0", "all"));
        assert_eq!(result[1], checksum);
    }

    #[test]
    fn test_invalid_requirement_is_an_error() {
        let entry = RequirementEntry::new("pom.xml", Some("=> 1.0"));
        let updater =
            RequirementsUpdater::new(vec![entry], Some(GradleVersion::new("2.0")), "new_url", vec![]);
        assert!(updater.updated_requirements().is_err());
    }

    #[test]
    fn test_entry_serialization() {
        let json = serde_json::json!({
            "file": "build.gradle",
            "requirement": "3.6.1",
            "groups": [],
            "source": null,
            "metadata": { "dependency_set": { "group": "com.google.protobuf", "version": "3.6.1" } }
        });
        let entry: RequirementEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.dependency_set().map(|s| s.group.as_str()), Some("com.google.protobuf"));

        let entry = updated(Some("23.3-jre"), Some("23.6-jre"));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["source"]["type"], "maven_repo");
        assert_eq!(value["source"]["url"], "new_url");
    }
}
