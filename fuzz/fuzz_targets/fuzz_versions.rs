#![no_main]

use dependi_versions::docker::DockerTag;
use dependi_versions::scheme::{Docker, Gradle, VersionScheme};
use dependi_versions::token::{join_tokens, tokenize};
use libfuzzer_sys::fuzz_target;
use std::cmp::Ordering;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let mut lines = content.splitn(3, '\n');
        let first = lines.next().unwrap_or_default();
        let second = lines.next().unwrap_or("1.0");
        let third = lines.next().unwrap_or("2.0");

        for raw in [first, second, third] {
            assert_eq!(join_tokens(&tokenize(raw)), raw, "tokenize must be lossless");

            let tag = DockerTag::new(raw);
            if !tag.is_comparable() {
                assert_eq!(tag.numeric_version(), None);
            }
        }

        let docker = [Docker::parse(first), Docker::parse(second), Docker::parse(third)];
        for a in &docker {
            assert_eq!(a.cmp(a), Ordering::Equal);
            for b in &docker {
                assert_eq!(a.cmp(b), b.cmp(a).reverse(), "docker ordering must be antisymmetric");
                for c in &docker {
                    if a <= b && b <= c {
                        assert!(a <= c, "docker ordering must be transitive: {a} <= {b} <= {c}");
                    }
                }
            }
        }

        // Gradle has known cycles, so only antisymmetry is checked
        let (a, b) = (Gradle::parse(first), Gradle::parse(second));
        assert_eq!(a.cmp(&b), b.cmp(&a).reverse(), "gradle ordering must be antisymmetric");
        assert_eq!(a.cmp(&a), Ordering::Equal);
        let _ = a.to_semver();
    }
});
