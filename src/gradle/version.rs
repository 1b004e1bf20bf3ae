//! Gradle/Maven version ordering.
//!
//! Follows Maven's `ComparableVersion` rules as Gradle applies them:
//!
//! - tokens are split on `.`, `-`, `_` and at digit/letter transitions
//! - `0`, `ga`, `final` and empty tokens are null values and are trimmed from
//!   the end of each dash-separated group (`1` == `1.0` == `1-ga` == `1.0.FINAL`)
//! - well-known qualifiers rank `alpha < beta < milestone < rc < snapshot <
//!   release < sp`; unknown qualifiers sort after all of them
//! - a trailing `+` is a dynamic version that sorts above every release with
//!   the same prefix (`1.+` > `1.11.1`, `1.+` < `2.0`)

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::token::{Separator, TokenKind, compare_numeric, tokenize};

/// Qualifiers trimmed as if absent
const NULL_VALUES: &[&str] = &["0", "final", "ga", ""];

/// Rank of the well-known qualifiers. Release is 6.
const NAMED_QUALIFIERS: &[(&str, u8)] = &[
    ("a", 1),
    ("alpha", 1),
    ("b", 2),
    ("beta", 2),
    ("m", 3),
    ("milestone", 3),
    ("rc", 4),
    ("cr", 4),
    ("pr", 4),
    ("pre", 4),
    ("snapshot", 5),
    ("dev", 5),
    ("ga", 6),
    ("final", 6),
    ("", 6),
    ("sp", 7),
];

const RELEASE_RANK: u8 = 6;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*[0-9a-zA-Z]+(?:\.[0-9a-zA-Z]*)*(?:[_\-+][0-9A-Za-z_-]*(?:\.[0-9A-Za-z_-]*)*)?\s*$",
    )
    .expect("valid gradle version pattern")
});

fn qualifier_rank(qualifier: &str) -> Option<u8> {
    NAMED_QUALIFIERS
        .iter()
        .find(|(name, _)| *name == qualifier)
        .map(|(_, rank)| *rank)
}

/// Whether the token follows a `.` or a dash-like separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    Dot,
    Dash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(String),
    /// Dynamic `+` segment
    Wildcard,
    Qualifier(String),
}

impl Item {
    fn is_null(&self) -> bool {
        match self {
            Item::Number(digits) => digits.bytes().all(|b| b == b'0'),
            Item::Wildcard => false,
            Item::Qualifier(q) => NULL_VALUES.contains(&q.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PrefixedItem {
    prefix: Prefix,
    item: Item,
}

impl PrefixedItem {
    fn hierarchy(&self) -> u8 {
        match (self.prefix, &self.item) {
            (Prefix::Dot, Item::Qualifier(_)) => 1,
            (Prefix::Dash, Item::Qualifier(_)) => 2,
            (Prefix::Dash, _) => 3,
            (Prefix::Dot, _) => 4,
        }
    }

    fn padding_for(other: &PrefixedItem) -> PrefixedItem {
        match other.prefix {
            Prefix::Dot => PrefixedItem {
                prefix: Prefix::Dot,
                item: Item::Number("0".to_string()),
            },
            Prefix::Dash => PrefixedItem {
                prefix: Prefix::Dash,
                item: Item::Qualifier(String::new()),
            },
        }
    }
}

fn compare_prefixed(a: &PrefixedItem, b: &PrefixedItem) -> Ordering {
    a.hierarchy()
        .cmp(&b.hierarchy())
        .then_with(|| compare_items(&a.item, &b.item))
}

fn compare_items(a: &Item, b: &Item) -> Ordering {
    match (a, b) {
        (Item::Wildcard, Item::Wildcard) => Ordering::Equal,
        (Item::Wildcard, _) => Ordering::Greater,
        (_, Item::Wildcard) => Ordering::Less,
        (Item::Number(x), Item::Number(y)) => compare_numeric(x, y),
        (Item::Qualifier(x), Item::Qualifier(y)) => compare_qualifiers(x, y),
        // Hierarchy already separates numbers from qualifiers
        (Item::Number(_), Item::Qualifier(_)) => Ordering::Greater,
        (Item::Qualifier(_), Item::Number(_)) => Ordering::Less,
    }
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    match (qualifier_rank(a), qualifier_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// A Gradle or Maven version.
///
/// Construction never fails. The original string is kept for display; a
/// normalized token list is used for ordering.
#[derive(Debug, Clone)]
pub struct GradleVersion {
    raw: String,
    items: Vec<PrefixedItem>,
}

impl GradleVersion {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            items: normalize(raw),
        }
    }

    /// Whether `raw` matches the Gradle version grammar.
    pub fn is_correct(raw: &str) -> bool {
        !raw.trim().is_empty() && VERSION_PATTERN.is_match(raw)
    }

    /// Original version string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Leading dot-separated numeric segments (`23.6-jre` → `[23, 6]`).
    pub fn segments(&self) -> Vec<u64> {
        let lowered = strip_v(self.raw.trim()).to_lowercase();
        tokenize(&lowered)
            .iter()
            .enumerate()
            .take_while(|(idx, t)| {
                t.kind == TokenKind::Numeric
                    && !t.text.is_empty()
                    && (*idx == 0 || t.separator == Separator::Dot)
            })
            .map_while(|(_, t)| t.as_u64())
            .collect()
    }

    /// Whether any token is a pre-release qualifier (`alpha`, `rc`, `eap`, ...).
    pub fn is_prerelease(&self) -> bool {
        self.items.iter().any(|p| match &p.item {
            Item::Qualifier(q) if q == "eap" => true,
            Item::Qualifier(q) => qualifier_rank(q).is_some_and(|rank| rank < RELEASE_RANK),
            _ => false,
        })
    }

    /// Whether the version ends in a dynamic `+` segment.
    pub fn is_dynamic(&self) -> bool {
        self.items.last().is_some_and(|p| p.item == Item::Wildcard)
    }

    /// Three-component numeric projection (`23.6-jre` → `23.6.0`), `None`
    /// for purely named versions such as `Finchley`.
    pub fn to_semver(&self) -> Option<String> {
        crate::scheme::semver_projection(&self.segments())
    }

    /// [`Self::to_semver`] as a `semver::Version`.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.to_semver()?).ok()
    }
}

fn strip_v(raw: &str) -> &str {
    match raw.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => raw,
    }
}

fn normalize(raw: &str) -> Vec<PrefixedItem> {
    let lowered = strip_v(raw.trim()).to_lowercase();
    let mut tokens = tokenize(&lowered);

    let mut dynamic = false;
    if tokens
        .last()
        .is_some_and(|t| t.separator == Separator::Plus && t.text.is_empty())
    {
        tokens.pop();
        if tokens
            .last()
            .is_some_and(|t| t.separator == Separator::Dot && t.text.is_empty())
        {
            tokens.pop();
        }
        dynamic = true;
    }

    let mut items: Vec<PrefixedItem> = tokens
        .into_iter()
        .enumerate()
        .map(|(idx, token)| {
            let prefix = match token.separator {
                Separator::Dot => Prefix::Dot,
                Separator::None if idx == 0 => Prefix::Dot,
                _ => Prefix::Dash,
            };
            let item = if token.text.is_empty() {
                Item::Number("0".to_string())
            } else if token.kind == TokenKind::Numeric {
                Item::Number(token.text)
            } else {
                Item::Qualifier(token.text)
            };
            PrefixedItem { prefix, item }
        })
        .collect();

    if dynamic {
        items.push(PrefixedItem {
            prefix: Prefix::Dot,
            item: Item::Wildcard,
        });
    }

    let mut items = trim_null_values(items);
    collapse_date(&mut items);
    if let Some(first) = items.first_mut() {
        first.prefix = Prefix::Dot;
    }
    items
}

/// Drops null values from the end of every dash-separated group.
fn trim_null_values(items: Vec<PrefixedItem>) -> Vec<PrefixedItem> {
    let mut trimmed = Vec::with_capacity(items.len());
    let mut group: Vec<PrefixedItem> = Vec::new();

    for item in items {
        if item.prefix == Prefix::Dash && !group.is_empty() {
            flush_group(&mut trimmed, &mut group);
        }
        group.push(item);
    }
    flush_group(&mut trimmed, &mut group);
    trimmed
}

fn flush_group(out: &mut Vec<PrefixedItem>, group: &mut Vec<PrefixedItem>) {
    while group.last().is_some_and(|p| p.item.is_null()) {
        group.pop();
    }
    out.append(group);
}

/// `2018-10-03` compares as `20181003`.
fn collapse_date(items: &mut Vec<PrefixedItem>) {
    let digits: Option<Vec<&str>> = items
        .iter()
        .map(|p| match &p.item {
            Item::Number(d) => Some(d.as_str()),
            _ => None,
        })
        .collect();
    let Some(digits) = digits else {
        return;
    };

    let dashed = items.iter().skip(1).all(|p| p.prefix == Prefix::Dash);
    let lengths: Vec<usize> = digits.iter().map(|d| d.len()).collect();
    if dashed && lengths == [4, 2, 2] {
        let joined = digits.concat();
        *items = vec![PrefixedItem {
            prefix: Prefix::Dot,
            item: Item::Number(joined),
        }];
    }
}

impl Ord for GradleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        for idx in 0..len {
            let ordering = match (self.items.get(idx), other.items.get(idx)) {
                (Some(a), Some(b)) => compare_prefixed(a, b),
                (Some(a), None) => compare_prefixed(a, &PrefixedItem::padding_for(a)),
                (None, Some(b)) => compare_prefixed(&PrefixedItem::padding_for(b), b),
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for GradleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GradleVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GradleVersion {}

impl fmt::Display for GradleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for GradleVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl From<&str> for GradleVersion {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
