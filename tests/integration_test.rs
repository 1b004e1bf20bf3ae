//! Integration tests for dependi-versions

use std::cmp::Ordering;

use dependi_versions::config::Config;
use dependi_versions::docker::{DockerTag, DockerVersion, LatestTagFinder, TagFormat};
use dependi_versions::gradle::{
    Dependency, DependencySetLookup, GradleVersion, MultiDependencyUpdater, RequirementEntry,
    RequirementMetadata, RequirementsUpdater, TargetVersionDetails, VersionAvailability,
};
use dependi_versions::requirement::{DockerRequirement, GradleRequirement, RequirementParseError};
use dependi_versions::scheme::{Docker, Gradle, VersionScheme};
use dependi_versions::token::{join_tokens, tokenize};

/// A newer Node image with an Alpine suffix against an old plain release
#[test]
fn test_alpine_tag_against_plain_release() {
    let node = Docker::parse("20.9.0-alpine3.18");
    assert!(node > Docker::parse("2.4.2"));
    assert_eq!(node.release(), "20.9.0");

    let req = DockerRequirement::new(&["> 20.8.1.alpine3.18", "< 20.9"]).unwrap();
    assert!(!req.satisfied_by(&node));
    assert!(req.satisfied_by_str("20.8.2-alpine3.18"));
}

/// Eclipse Temurin style `release_update` tags
#[test]
fn test_jdk_update_numbers() {
    assert!(DockerVersion::new("11.0.16_8") < DockerVersion::new("11.0.16.1"));
    assert!(DockerVersion::new("17.0.2_8") > DockerVersion::new("17.0.1_12"));

    let mut tags = vec!["17.0.2_8", "11.0.16.1", "17.0.1_12", "11.0.16_8"];
    tags.sort_by_key(|t| DockerVersion::new(t));
    assert_eq!(tags, vec!["11.0.16_8", "11.0.16.1", "17.0.1_12", "17.0.2_8"]);
}

#[test]
fn test_vendor_prefixed_tags() {
    let older = DockerVersion::new("img_20230915.3");
    let newer = DockerVersion::new("img_20231011.1");
    assert!(older < newer);
    assert_eq!(older.to_semver().as_deref(), Some("20230915.3.0"));
    assert!(DockerVersion::is_correct("img_20230915.3"));
}

#[test]
fn test_minio_release_timestamps() {
    let tag = DockerTag::new("RELEASE.2025-01-20T14-49-07Z");
    assert_eq!(tag.format(), TagFormat::ReleaseTimestamp);
    assert!(!DockerTag::new("RELEASE-2025-01-20T14-49-07Z").is_comparable());

    let finder = LatestTagFinder::new([
        "RELEASE.2024-12-18T13-15-44Z",
        "RELEASE.2025-01-20T14-49-07Z",
        "RELEASE.2025-01-20T14-49-07Z-cpuv1",
        "RELEASE-2025-02-01T00-00-00Z",
        "latest",
    ]);
    assert_eq!(
        finder.latest_tag("RELEASE.2024-12-18T13-15-44Z").name(),
        "RELEASE.2025-01-20T14-49-07Z"
    );
    assert_eq!(finder.is_up_to_date("RELEASE.2025-01-20T14-49-07Z"), Some(true));
}

#[test]
fn test_tag_formats_never_mix() {
    let tags: Vec<DockerTag> = [
        "17.04",
        "1803",
        "201708",
        "42",
        "RELEASE.2025-01-20T14-49-07Z",
        "7.2-0.1-g3c6f4e1",
    ]
    .into_iter()
    .map(DockerTag::new)
    .collect();

    for (i, a) in tags.iter().enumerate() {
        for (j, b) in tags.iter().enumerate() {
            if i == j {
                assert!(a.comparable_to(b), "{a} should be comparable to itself");
            } else {
                assert_ne!(a.format(), b.format());
                assert!(!a.comparable_to(b), "{a} and {b} should not be comparable");
            }
        }
    }
}

#[test]
fn test_gradle_null_qualifiers() {
    let one = GradleVersion::new("1");
    for raw in ["1.0", "1-ga", "1.0.FINAL", "1.0.0"] {
        assert_eq!(GradleVersion::new(raw), one, "{raw} should equal 1");
    }
}

#[test]
fn test_gradle_release_train_order() {
    let mut versions: Vec<GradleVersion> = [
        "1.0.0",
        "1.0.0-SNAPSHOT",
        "1.0.0-rc-1",
        "1.0.0-beta-2",
        "1.0.0-alpha",
        "1.0.0-sp-1",
        "0.9.9",
    ]
    .into_iter()
    .map(GradleVersion::new)
    .collect();
    versions.sort();

    let sorted: Vec<&str> = versions.iter().map(GradleVersion::as_str).collect();
    assert_eq!(
        sorted,
        vec![
            "0.9.9",
            "1.0.0-alpha",
            "1.0.0-beta-2",
            "1.0.0-rc-1",
            "1.0.0-SNAPSHOT",
            "1.0.0",
            "1.0.0-sp-1",
        ]
    );
}

#[test]
fn test_dynamic_requirement() {
    let req = GradleRequirement::parse("1.+").unwrap();
    assert!(req.satisfied_by_str("1.11"));
    assert!(req.satisfied_by_str("1.11.1"));
    assert!(!req.satisfied_by_str("2.0"));
}

#[test]
fn test_bracket_range_requirement() {
    let req: GradleRequirement = "[1.0.0,2.0.0)".parse().unwrap();
    assert!(req.satisfied_by_str("1.5.0"));
    assert!(!req.satisfied_by_str("2.0.0"));
    assert!(!req.satisfied_by_str("0.9.0"));
}

#[test]
fn test_requirement_errors_name_the_input() {
    let err = GradleRequirement::parse("=> 1.0").unwrap_err();
    assert_eq!(err, RequirementParseError::InvalidOperator("=> 1.0".to_string()));
    assert!(err.to_string().contains("=> 1.0"));
}

#[test]
fn test_round_trip_is_lossless() {
    for raw in ["20.9.0-alpine3.18", "11.0.16_8", "jdk-11.0.2.7-alpine-slim", "v1.5.0"] {
        assert!(Docker::is_correct(raw), "{raw}");
        assert_eq!(Docker::parse(raw).to_string(), raw);
        assert_eq!(join_tokens(&Docker::tokenize(raw)), raw);
    }
    for raw in ["23.6-jre", "1.0.0.RELEASE", "1.+", "v2-rev398-1.24.1", "Finchley.SR2"] {
        assert!(Gradle::is_correct(raw), "{raw}");
        assert_eq!(Gradle::parse(raw).to_string(), raw);
        assert_eq!(join_tokens(&tokenize(raw)), raw);
    }
}

#[test]
fn test_same_string_different_schemes() {
    // Gradle drops the null qualifier, Docker orders the word below any number
    assert_eq!(Gradle::parse("1.ga").cmp(&Gradle::parse("1")), Ordering::Equal);
    assert_eq!(Docker::parse("1.ga").cmp(&Docker::parse("1")), Ordering::Less);
}

#[test]
fn test_latest_tag_with_ignore_config() {
    let config = Config::from_json(Some(serde_json::json!({
        "ignore": [{ "dependency_name": "ubuntu", "versions": [">= 17.10"] }]
    })));
    let tags = ["12.04", "14.04", "16.04", "17.04", "17.10", "latest"];

    let ignored = config.ignored_requirements::<Docker>("ubuntu");
    let finder = LatestTagFinder::new(tags).with_ignored(ignored);
    assert_eq!(finder.latest_tag("14.04").name(), "17.04");

    let unrestricted = LatestTagFinder::new(tags)
        .with_ignored(config.ignored_requirements::<Docker>("debian"));
    assert_eq!(unrestricted.latest_tag("14.04").name(), "17.10");
}

#[test]
fn test_requirements_updater_end_to_end() {
    let entries = vec![
        RequirementEntry::new("build.gradle", Some("23.3-jre")),
        RequirementEntry::new("app/build.gradle", Some("[23.4-jre]")),
        RequirementEntry::new("lib/build.gradle", Some("22.+")),
        RequirementEntry::new("compat/build.gradle", Some("[23.0,)")),
    ];
    let updater = RequirementsUpdater::new(
        entries,
        Some(GradleVersion::new("23.6-jre")),
        "https://repo.maven.apache.org/maven2",
        vec![],
    );

    let updated = updater.updated_requirements().unwrap();
    let requirements: Vec<Option<&str>> =
        updated.iter().map(|r| r.requirement.as_deref()).collect();
    assert_eq!(
        requirements,
        vec![Some("23.6-jre"), Some("[23.6-jre]"), Some("23.+"), Some("[23.0,)")]
    );
    assert!(updated[3].source.is_none());
}

struct Build(Vec<Dependency>);

impl DependencySetLookup for Build {
    fn declared_dependencies(&self) -> Vec<Dependency> {
        self.0.clone()
    }
}

struct Everything;

impl VersionAvailability for Everything {
    fn has_version(&self, _dependency: &Dependency, _version: &GradleVersion) -> bool {
        true
    }
}

#[test]
fn test_shared_property_update() {
    let entry = RequirementEntry {
        metadata: Some(RequirementMetadata {
            property_name: Some("kotlin_version".to_string()),
            dependency_set: None,
        }),
        ..RequirementEntry::new("build.gradle", Some("1.9.0"))
    };
    let plugin = Dependency::new(
        "org.jetbrains.kotlin:kotlin-gradle-plugin",
        Some("1.9.0"),
        vec![entry.clone()],
    );
    let build = Build(vec![
        plugin.clone(),
        Dependency::new("org.jetbrains.kotlin:kotlin-stdlib", Some("1.9.0"), vec![entry]),
    ]);
    let target = TargetVersionDetails {
        version: GradleVersion::new("2.0.0"),
        source_url: "https://plugins.gradle.org/m2".to_string(),
    };

    let updater =
        MultiDependencyUpdater::new(&plugin, Some(target.clone()), vec![], &build, &Everything);
    let updated = updater.updated_dependencies().unwrap();
    assert_eq!(updated.len(), 2);
    for dep in &updated {
        assert_eq!(dep.version.as_deref(), Some("2.0.0"));
        assert_eq!(dep.previous_version.as_deref(), Some("1.9.0"));
        assert_eq!(dep.requirements[0].requirement.as_deref(), Some("2.0.0"));
    }

    let blocked = MultiDependencyUpdater::new(
        &plugin,
        Some(target),
        vec!["[2.0,)".to_string()],
        &build,
        &Everything,
    );
    assert!(!blocked.update_possible());
    assert!(blocked.updated_dependencies().is_err());
}
