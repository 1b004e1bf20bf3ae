//! Ordering laws checked over every pair and triple of a sample set

use std::cmp::Ordering;

use dependi_versions::scheme::{Docker, Gradle, VersionScheme};

const GRADLE_SAMPLE: &[&str] = &[
    "1",
    "1.0",
    "1.1",
    "1.0.1",
    "1.10",
    "1-1",
    "1-sp",
    "1-alpha",
    "1-alpha-1",
    "1-rc-2",
    "1-snapshot",
    "1-foo",
    "1-foo2",
    "1-foo10",
    "1.+",
    "1.1.+",
    "2",
    "2.0-beta",
    "20181003",
    "v2018-10-03",
    "Finchley",
    "Edgware",
    "1.0.0_100",
    "1.0.0_99",
    "1-1.1",
];

const DOCKER_SAMPLE: &[&str] = &[
    "17.04",
    "17.4.0",
    "17.10",
    "12.04.5",
    "3.7.0a1",
    "3.7.0a2",
    "3.7.0",
    "3.6.2-alpine3.6",
    "20.9.0-alpine3.18",
    "2.4.2",
    "11.0.16_8",
    "11.0.16.1",
    "17.0.2_8",
    "17.0.1_12",
    "img_20230915.3",
    "1.ga",
    "1",
    "1.0.a.0",
    "RELEASE.2025-01-20T14-49-07Z",
    "v1.5.0",
];

/// Every release core combined with every tail, including vendor prefixes,
/// update numbers and pre-release letters.
fn generated_docker_tags() -> Vec<String> {
    let releases = [
        "0", "1", "01", "1.0", "1.2", "1.10", "1.2.0", "2", "1.a", "1.0a1", "1.0b", "v1.2",
        "img_1.2", "RELEASE.2025-01-20T14-49-07Z",
    ];
    let tails = ["", ".0", "_8", "_12", "-alpine3.18", "-1", "a2"];
    releases
        .iter()
        .flat_map(|release| tails.iter().map(move |tail| format!("{release}{tail}")))
        .collect()
}

fn assert_antisymmetric<S: VersionScheme>(sample: &[&str]) {
    let versions: Vec<S::Version> = sample.iter().map(|raw| S::parse(raw)).collect();
    for (i, a) in versions.iter().enumerate() {
        assert_eq!(a.cmp(a), Ordering::Equal, "{} should equal itself", sample[i]);
        for (j, b) in versions.iter().enumerate() {
            assert_eq!(
                a.cmp(b),
                b.cmp(a).reverse(),
                "{} vs {} is not antisymmetric",
                sample[i],
                sample[j]
            );
        }
    }
}

fn assert_transitive<S: VersionScheme>(sample: &[&str]) {
    let versions: Vec<S::Version> = sample.iter().map(|raw| S::parse(raw)).collect();
    for (i, a) in versions.iter().enumerate() {
        for (j, b) in versions.iter().enumerate() {
            for (k, c) in versions.iter().enumerate() {
                if a <= b && b <= c {
                    assert!(
                        a <= c,
                        "{} <= {} <= {} but not {} <= {}",
                        sample[i],
                        sample[j],
                        sample[k],
                        sample[i],
                        sample[k]
                    );
                }
            }
        }
    }
}

#[test]
fn test_gradle_ordering_is_antisymmetric() {
    assert_antisymmetric::<Gradle>(GRADLE_SAMPLE);
}

#[test]
fn test_gradle_ordering_is_transitive() {
    assert_transitive::<Gradle>(GRADLE_SAMPLE);
}

#[test]
fn test_docker_ordering_is_antisymmetric() {
    assert_antisymmetric::<Docker>(DOCKER_SAMPLE);
}

#[test]
fn test_docker_ordering_is_transitive() {
    assert_transitive::<Docker>(DOCKER_SAMPLE);
}

#[test]
fn test_docker_ordering_is_a_total_preorder_over_generated_tags() {
    let generated = generated_docker_tags();
    let sample: Vec<&str> = generated.iter().map(String::as_str).collect();
    assert_antisymmetric::<Docker>(&sample);
    assert_transitive::<Docker>(&sample);
}

#[test]
fn test_sorting_gradle_sample_is_stable_under_permutation() {
    let mut forward: Vec<_> = GRADLE_SAMPLE.iter().map(|raw| Gradle::parse(raw)).collect();
    let mut backward: Vec<_> = GRADLE_SAMPLE.iter().rev().map(|raw| Gradle::parse(raw)).collect();
    forward.sort();
    backward.sort();

    for (a, b) in forward.iter().zip(&backward) {
        assert_eq!(a.cmp(b), Ordering::Equal, "{a} and {b} sorted to the same slot");
    }
}

/// A dot-separated qualifier after a zero sorts below the bare release,
/// while a dash-separated service pack sorts above it and below the dot
/// form. These three versions form a cycle, so they must never be sorted
/// together.
#[test]
fn test_gradle_known_cycle() {
    let rc = Gradle::parse("1.0.RC1");
    let release = Gradle::parse("1");
    let service_pack = Gradle::parse("1-sp");

    assert!(rc < release);
    assert!(release < service_pack);
    assert!(service_pack < rc);
}
