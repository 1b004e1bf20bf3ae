//! Docker tag versions.
//!
//! A tag is reduced to its version core through [`DockerTag`] and then
//! ordered segment by segment: digit runs compare numerically, letter runs
//! lexically, and a number always beats a letter run (`1.ga` < `1`).
//! Trailing zeros are insignificant (`17.04` == `17.4.0`).
//!
//! An underscore splits the release from an update number
//! (`11.0.16_8`), which only breaks ties between equal releases.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use super::tag::DockerTag;
use crate::scheme::{Docker, VersionScheme};
use crate::token::{TokenKind, compare_numeric};

static VENDOR_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9]*_(\d.*)$").expect("valid vendor prefix pattern")
});

static CORRECT_RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(?:\.[0-9a-zA-Z]+)*(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$")
        .expect("valid docker release pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Number(String),
    Word(String),
}

fn compare_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Number(x), Segment::Number(y)) => compare_numeric(x, y),
        (Segment::Word(x), Segment::Word(y)) => x.cmp(y),
        (Segment::Number(_), Segment::Word(_)) => Ordering::Greater,
        (Segment::Word(_), Segment::Number(_)) => Ordering::Less,
    }
}

/// Digit runs and letter runs; everything else only separates.
fn scan_segments(text: &str) -> Vec<Segment> {
    Docker::tokenize(text)
        .into_iter()
        .flat_map(|token| match token.kind {
            TokenKind::Numeric => vec![Segment::Number(token.text)],
            TokenKind::Alphabetic => token
                .text
                .split(|c: char| !c.is_ascii_alphabetic())
                .map(|word| Segment::Word(word.to_string()))
                .collect(),
        })
        .filter(|segment| !matches!(segment, Segment::Number(t) | Segment::Word(t) if t.is_empty()))
        .collect()
}

fn is_zero(segment: &Segment) -> bool {
    matches!(segment, Segment::Number(d) if d.bytes().all(|b| b == b'0'))
}

/// Drops trailing zeros from the numeric head and from the tail after the
/// first word, so `1.0.a.0` orders like `1.a`.
fn canonical(segments: Vec<Segment>) -> Vec<Segment> {
    let split = segments
        .iter()
        .position(|s| matches!(s, Segment::Word(_)))
        .unwrap_or(segments.len());
    let mut head = segments;
    let mut tail = head.split_off(split);

    while head.last().is_some_and(is_zero) {
        head.pop();
    }
    while tail.last().is_some_and(is_zero) {
        tail.pop();
    }
    head.extend(tail);
    head
}

fn compare_canonical(a: &[Segment], b: &[Segment]) -> Ordering {
    let zero = Segment::Number("0".to_string());
    let len = a.len().max(b.len());
    for idx in 0..len {
        let left = a.get(idx).unwrap_or(&zero);
        let right = b.get(idx).unwrap_or(&zero);
        let ordering = compare_segments(left, right);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn strip_v(raw: &str) -> &str {
    match raw.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => raw,
    }
}

/// A Docker tag interpreted as a version.
#[derive(Debug, Clone)]
pub struct DockerVersion {
    raw: String,
    release_text: String,
    release: Vec<Segment>,
    update: Vec<Segment>,
}

impl DockerVersion {
    pub fn new(raw: &str) -> Self {
        let (release_text, update_text) = split_release(raw);
        Self {
            raw: raw.to_string(),
            release: canonical(scan_segments(&release_text)),
            update: canonical(scan_segments(&update_text)),
            release_text,
        }
    }

    /// Whether `raw` reduces to a dotted version core.
    pub fn is_correct(raw: &str) -> bool {
        let (release, _) = split_release(raw);
        !release.is_empty() && CORRECT_RELEASE.is_match(&release)
    }

    /// Original tag text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Reduced release core (`20.9.0-alpine3.18` → `20.9.0`).
    pub fn release(&self) -> &str {
        &self.release_text
    }

    /// Leading numeric segments of the release, zeros kept.
    pub fn segments(&self) -> Vec<u64> {
        self.release_text
            .split('.')
            .map_while(|part| part.parse::<u64>().ok())
            .collect()
    }

    /// Whether the release contains a letter run (`3.7.0a2`).
    pub fn is_prerelease(&self) -> bool {
        self.release.iter().any(|s| matches!(s, Segment::Word(_)))
    }

    pub fn to_semver(&self) -> Option<String> {
        crate::scheme::semver_projection(&self.segments())
    }

    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.to_semver()?).ok()
    }
}

/// Splits a tag into its release core and update number.
fn split_release(raw: &str) -> (String, String) {
    let trimmed = raw.trim();
    let unprefixed = VENDOR_PREFIX
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());

    let (release, update) = match unprefixed.split_once('_') {
        Some((release, update)) if update.starts_with(|c: char| c.is_ascii_digit()) => {
            (release, update)
        }
        Some((release, _)) => (release, "0"),
        None => (unprefixed, "0"),
    };
    let release = release.trim_end_matches(['.', '-', '_']);

    let core = DockerTag::new(release)
        .numeric_version()
        .unwrap_or_else(|| strip_v(release).to_string());
    (core.replace('-', "."), update.to_string())
}

impl Ord for DockerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_canonical(&self.release, &other.release)
            .then_with(|| compare_canonical(&self.update, &other.update))
    }
}

impl PartialOrd for DockerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DockerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DockerVersion {}

impl fmt::Display for DockerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for DockerVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl From<&str> for DockerVersion {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
