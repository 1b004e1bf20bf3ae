//! Docker tag classification.
//!
//! A tag such as `jdk-11.0.2.7-alpine-slim` is decomposed into an optional
//! prefix (`jdk-`), a version (`11.0.2.7`) and an optional suffix
//! (`-alpine-slim`). Tags that don't decompose (`latest`, `artful`, bare
//! commit hashes) are not comparable and never get updated.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

const VERSION_PART: &str = r"v?(?P<version>[0-9]+(?:[_.][0-9]+)*(?:\.[a-z0-9]+|(?:(?:-[a-z]+)+-[0-9]+)+|-(?:kb)?[0-9]+)*)";

fn tag_pattern(template: &str) -> Regex {
    let pattern = format!("(?i){}", template.replace("{version}", VERSION_PART));
    Regex::new(&pattern).expect("valid docker tag pattern")
}

/// Grammars tried in order; the first match wins.
static TAG_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        tag_pattern(r"^(?P<prefix>[a-z][a-z0-9.\-_]*-)?{version}$"),
        tag_pattern(r"^{version}(?P<suffix>-[a-z][a-z0-9.\-]*)?$"),
        tag_pattern(r"^(?P<prefix>[a-z\-_]+-)?{version}(?P<suffix>-[a-z\-]+)?$"),
    ]
});

static RELEASE_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<prefix>RELEASE\.)(?P<version>\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}Z)(?P<suffix>-[a-z][a-z0-9.\-]*)?$",
    )
    .expect("valid release timestamp pattern")
});

static SHA_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|-g?)[0-9a-f]{7,}$").expect("valid sha suffix pattern"));

static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[12]\d{3}(?:[.\-]|$)").expect("valid year-month pattern"));

static YEAR_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[12](?:\d{5}|\d{7})(?:[.\-]|$)").expect("valid year-month-day pattern")
});

static BUILD_NUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid build number pattern"));

static KB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)kb").expect("valid kb pattern"));

static WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-[a-z]+").expect("valid word run pattern"));

const RELEASE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";

/// Shape of a tag's version part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagFormat {
    /// `RELEASE.2025-01-20T14-49-07Z`
    ReleaseTimestamp,
    /// Ends in a short or full commit hash (`7.2-0.1-g3c6f4e1`)
    ShaSuffixed,
    /// `1803`, `2019.02`
    YearMonth,
    /// `20170826`, `201708`
    YearMonthDay,
    /// A single integer
    BuildNum,
    Normal,
}

impl TagFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagFormat::ReleaseTimestamp => "release_timestamp",
            TagFormat::ShaSuffixed => "sha_suffixed",
            TagFormat::YearMonth => "year_month",
            TagFormat::YearMonthDay => "year_month_day",
            TagFormat::BuildNum => "build_num",
            TagFormat::Normal => "normal",
        }
    }
}

impl fmt::Display for TagFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TagParts {
    prefix: Option<String>,
    version: String,
    suffix: Option<String>,
    release_timestamp: bool,
}

impl TagParts {
    fn parse(name: &str) -> Option<Self> {
        if let Some(caps) = RELEASE_TIMESTAMP.captures(name) {
            let version = caps.name("version")?.as_str();
            // Shape alone admits impossible dates like month 13
            NaiveDateTime::parse_from_str(version, RELEASE_TIMESTAMP_FORMAT).ok()?;
            return Some(Self {
                prefix: caps.name("prefix").map(|m| m.as_str().to_string()),
                version: version.to_string(),
                suffix: caps.name("suffix").map(|m| m.as_str().to_string()),
                release_timestamp: true,
            });
        }

        TAG_PATTERNS.iter().find_map(|pattern| {
            let caps = pattern.captures(name)?;
            Some(Self {
                prefix: caps.name("prefix").map(|m| m.as_str().to_string()),
                version: caps.name("version")?.as_str().to_string(),
                suffix: caps.name("suffix").map(|m| m.as_str().to_string()),
                release_timestamp: false,
            })
        })
    }
}

/// A classified Docker tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DockerTag {
    name: String,
    parts: Option<TagParts>,
}

impl DockerTag {
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        Self {
            name: name.to_string(),
            parts: TagParts::parse(name),
        }
    }

    /// Full tag name as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the tag decomposes into prefix, version and suffix.
    pub fn is_comparable(&self) -> bool {
        self.parts.is_some()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.parts.as_ref()?.prefix.as_deref()
    }

    /// Raw version part (`11.0.2.7`, `2025-01-20T14-49-07Z`).
    pub fn version(&self) -> Option<&str> {
        self.parts.as_ref().map(|p| p.version.as_str())
    }

    pub fn suffix(&self) -> Option<&str> {
        self.parts.as_ref()?.suffix.as_deref()
    }

    pub fn format(&self) -> TagFormat {
        if self.parts.as_ref().is_some_and(|p| p.release_timestamp) {
            return TagFormat::ReleaseTimestamp;
        }
        if SHA_SUFFIX.is_match(&self.name) {
            return TagFormat::ShaSuffixed;
        }
        let Some(version) = self.version() else {
            return TagFormat::Normal;
        };
        if YEAR_MONTH.is_match(version) {
            TagFormat::YearMonth
        } else if YEAR_MONTH_DAY.is_match(version) {
            TagFormat::YearMonthDay
        } else if BUILD_NUM.is_match(version) {
            TagFormat::BuildNum
        } else {
            TagFormat::Normal
        }
    }

    /// Version part reduced to something a version type can order.
    ///
    /// `kb` markers and dash-separated words are removed and the result is
    /// lowercased. Release timestamps reduce to their 14 digits.
    pub fn numeric_version(&self) -> Option<String> {
        let parts = self.parts.as_ref()?;
        if parts.release_timestamp {
            return Some(parts.version.chars().filter(char::is_ascii_digit).collect());
        }
        let without_kb = KB.replace_all(&parts.version, "");
        let without_words = WORD_RUN.replace_all(&without_kb, "");
        Some(without_words.to_lowercase())
    }

    /// `numeric_version` split on `.` and `-`.
    pub fn segments(&self) -> Vec<String> {
        self.numeric_version()
            .map(|numeric| {
                numeric
                    .split(['.', '-'])
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    }

    /// Number of version segments, 0 when not comparable.
    pub fn precision(&self) -> usize {
        self.segments().len()
    }

    pub fn same_precision(&self, other: &DockerTag) -> bool {
        self.precision() == other.precision()
    }

    /// Whether `other` extends this tag's segments (`17` vs `17.10`).
    pub fn same_but_less_precise(&self, other: &DockerTag) -> bool {
        let mine = self.segments();
        let theirs = other.segments();
        !mine.is_empty() && mine.len() < theirs.len() && theirs.starts_with(&mine)
    }

    /// Whether the tag is exactly its version, give or take `-sdk` or `jdk-`.
    pub fn is_canonical(&self) -> bool {
        let Some(numeric) = self.numeric_version() else {
            return false;
        };
        self.name == numeric
            || self.name == format!("{numeric}-sdk")
            || self.name == format!("jdk-{numeric}")
    }

    /// Whether the version contains letters (`3.7.0a2`).
    pub fn looks_like_prerelease(&self) -> bool {
        self.numeric_version()
            .is_some_and(|numeric| KB.replace_all(&numeric, "").chars().any(|c| c.is_ascii_alphabetic()))
    }

    /// Whether both tags can be ordered against each other.
    ///
    /// They must share prefix, format and suffix. Suffixes of SHA-suffixed
    /// tags are hashes and are allowed to differ.
    pub fn comparable_to(&self, other: &DockerTag) -> bool {
        if !self.is_comparable() || !other.is_comparable() {
            return false;
        }
        let format = self.format();
        if self.prefix() != other.prefix() || format != other.format() {
            return false;
        }
        format == TagFormat::ShaSuffixed || self.suffix() == other.suffix()
    }
}

impl fmt::Display for DockerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for DockerTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}
