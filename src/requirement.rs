//! Version requirements.
//!
//! A [`Requirement`] is a conjunction of operator clauses evaluated with a
//! scheme's ordering. Maven range syntax (`[1.0,2.0)`), Gradle dynamic
//! versions (`1.+`) and bare versions are desugared into clauses at parse
//! time, so matching only ever deals with the seven [`Operator`]s.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::scheme::{Docker, Gradle, VersionScheme};

static CLAUSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<op>~>|>=|<=|!=|=|>|<)?\s*(?P<version>.*)$").expect("valid clause pattern")
});

const OPERATOR_CHARS: &[char] = &['~', '>', '<', '=', '!'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementParseError {
    #[error("invalid operator in requirement '{0}'")]
    InvalidOperator(String),
    #[error("missing version after operator in '{0}'")]
    MissingVersion(String),
    #[error("invalid {scheme} version '{version}'")]
    InvalidVersion { scheme: &'static str, version: String },
    #[error("unbalanced brackets in '{0}'")]
    UnbalancedBrackets(String),
    #[error("malformed range '{0}'")]
    MalformedRange(String),
}

/// Comparison operator of a single clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `~>`
    Pessimistic,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Pessimistic => "~>",
        }
    }
}

impl FromStr for Operator {
    type Err = RequirementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::NotEq),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "~>" => Ok(Operator::Pessimistic),
            other => Err(RequirementParseError::InvalidOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `operator version` pair.
#[derive(Debug, Clone)]
pub struct Clause<S: VersionScheme> {
    pub operator: Operator,
    pub version: S::Version,
}

impl<S: VersionScheme> Clause<S> {
    fn new(operator: Operator, raw: &str) -> Result<Self, RequirementParseError> {
        let raw = raw.trim();
        if !S::is_correct(raw) {
            return Err(RequirementParseError::InvalidVersion {
                scheme: S::NAME,
                version: raw.to_string(),
            });
        }
        Ok(Self {
            operator,
            version: S::parse(raw),
        })
    }

    pub fn satisfied_by(&self, candidate: &S::Version) -> bool {
        let version = &self.version;
        match self.operator {
            Operator::Eq => candidate == version,
            Operator::NotEq => candidate != version,
            Operator::Gt => candidate > version,
            Operator::Gte => candidate >= version,
            Operator::Lt => candidate < version,
            Operator::Lte => candidate <= version,
            Operator::Pessimistic => {
                candidate >= version
                    && below_bump(
                        &S::release_segments(candidate),
                        &S::release_segments(version),
                    )
            }
        }
    }
}

impl<S: VersionScheme> fmt::Display for Clause<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.version)
    }
}

/// `candidate < bump(base)` on zero-padded release segments.
fn below_bump(candidate: &[u64], base: &[u64]) -> bool {
    let mut upper = base.to_vec();
    if upper.len() > 1 {
        upper.pop();
    }
    let Some(last) = upper.last_mut() else {
        return true;
    };
    *last = last.saturating_add(1);

    let len = candidate.len().max(upper.len());
    let pad = |segments: &[u64]| {
        let mut padded = segments.to_vec();
        padded.resize(len, 0);
        padded
    };
    pad(candidate) < pad(&upper)
}

/// A conjunction of clauses. No clauses means any version.
#[derive(Debug, Clone)]
pub struct Requirement<S: VersionScheme> {
    clauses: Vec<Clause<S>>,
}

pub type GradleRequirement = Requirement<Gradle>;
pub type DockerRequirement = Requirement<Docker>;

impl<S: VersionScheme> Requirement<S> {
    /// Parses one requirement string. Top-level commas separate clauses.
    pub fn parse(input: &str) -> Result<Self, RequirementParseError> {
        let mut clauses = Vec::new();
        if input.trim().is_empty() {
            return Ok(Self::from_clauses(clauses));
        }
        for piece in split_top_level(input, |_| true)? {
            clauses.extend(parse_piece::<S>(piece)?);
        }
        Ok(Self::from_clauses(clauses))
    }

    /// Builds one requirement from several strings, all of which must hold.
    pub fn new(inputs: &[&str]) -> Result<Self, RequirementParseError> {
        let mut clauses = Vec::new();
        for input in inputs {
            clauses.extend(Self::parse(input)?.clauses);
        }
        Ok(Self::from_clauses(clauses))
    }

    fn from_clauses(clauses: Vec<Clause<S>>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause<S>] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn satisfied_by(&self, candidate: &S::Version) -> bool {
        self.clauses.iter().all(|clause| clause.satisfied_by(candidate))
    }

    /// Parses `candidate` with the scheme and checks it.
    pub fn satisfied_by_str(&self, candidate: &str) -> bool {
        self.satisfied_by(&S::parse(candidate))
    }

    /// Splits a union of ranges into alternatives.
    ///
    /// `(,1.0.0),(1.0.0,)` yields two requirements; a version satisfies the
    /// union when it satisfies any of them. Strings without a comma after a
    /// closing bracket are a single requirement.
    pub fn requirements_array(input: &str) -> Result<Vec<Self>, RequirementParseError> {
        split_alternatives(input)?
            .into_iter()
            .map(Self::parse)
            .collect()
    }
}

impl<S: VersionScheme> FromStr for Requirement<S> {
    type Err = RequirementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<S: VersionScheme> fmt::Display for Requirement<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str(">= 0");
        }
        for (idx, clause) in self.clauses.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

fn is_open(c: char) -> bool {
    c == '[' || c == '('
}

fn is_close(c: char) -> bool {
    c == ']' || c == ')'
}

/// Splits at depth-zero commas for which `split_here` returns true. The
/// argument is the input text before the comma.
fn split_top_level<'a>(
    input: &'a str,
    split_here: impl Fn(&str) -> bool,
) -> Result<Vec<&'a str>, RequirementParseError> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, c) in input.char_indices() {
        if is_open(c) {
            depth += 1;
        } else if is_close(c) {
            depth = depth
                .checked_sub(1)
                .ok_or_else(|| RequirementParseError::UnbalancedBrackets(input.to_string()))?;
        } else if c == ',' && depth == 0 && split_here(&input[..idx]) {
            pieces.push(&input[start..idx]);
            start = idx + 1;
        }
    }
    if depth != 0 {
        return Err(RequirementParseError::UnbalancedBrackets(input.to_string()));
    }
    pieces.push(&input[start..]);
    Ok(pieces)
}

fn ends_with_close(text: &str) -> bool {
    text.trim_end().ends_with(is_close)
}

fn split_alternatives(input: &str) -> Result<Vec<&str>, RequirementParseError> {
    let groups = split_top_level(input, ends_with_close)?;
    if groups.len() == 1 {
        return Ok(groups);
    }

    let mut alternatives = Vec::new();
    for group in groups {
        let trimmed = group.trim();
        if trimmed.starts_with(is_open) {
            alternatives.push(trimmed);
            continue;
        }
        // `1.0,1.1,[2.0,3.0)`: exact versions first, then one range
        let parts = split_top_level(trimmed, |before| {
            let rest = &trimmed[before.len() + 1..];
            rest.trim_start().starts_with(is_open)
        })?;
        let mut parts = parts.into_iter();
        if let Some(exacts) = parts.next() {
            alternatives.extend(exacts.split(',').map(str::trim));
        }
        alternatives.extend(parts.map(str::trim));
    }
    Ok(alternatives)
}

fn parse_piece<S: VersionScheme>(piece: &str) -> Result<Vec<Clause<S>>, RequirementParseError> {
    let piece = piece.trim();
    if piece.is_empty() {
        return Err(RequirementParseError::MissingVersion(piece.to_string()));
    }
    if piece.starts_with(is_open) || piece.ends_with(is_close) {
        return parse_range::<S>(piece);
    }

    let caps = CLAUSE_PATTERN
        .captures(piece)
        .ok_or_else(|| RequirementParseError::InvalidOperator(piece.to_string()))?;
    let version = caps.name("version").map_or("", |m| m.as_str().trim());
    if version.starts_with(OPERATOR_CHARS) {
        return Err(RequirementParseError::InvalidOperator(piece.to_string()));
    }

    match caps.name("op") {
        Some(op) => {
            if version.is_empty() {
                return Err(RequirementParseError::MissingVersion(piece.to_string()));
            }
            Ok(vec![Clause::new(op.as_str().parse()?, version)?])
        }
        None => match version.strip_suffix('+') {
            Some(prefix) => dynamic_clause::<S>(prefix).map(|clause| vec![clause]),
            None => Ok(vec![Clause::new(Operator::Eq, version)?]),
        },
    }
}

/// `1.+` → `~> 1.0`, `1.2+` → `~> 1.2`, `+` → `>= 0`.
fn dynamic_clause<S: VersionScheme>(prefix: &str) -> Result<Clause<S>, RequirementParseError> {
    if prefix.is_empty() {
        return Clause::new(Operator::Gte, "0");
    }
    if prefix.ends_with('.') {
        Clause::new(Operator::Pessimistic, &format!("{prefix}0"))
    } else {
        Clause::new(Operator::Pessimistic, prefix)
    }
}

fn parse_range<S: VersionScheme>(piece: &str) -> Result<Vec<Clause<S>>, RequirementParseError> {
    let malformed = || RequirementParseError::MalformedRange(piece.to_string());

    let mut chars = piece.chars();
    let (Some(open), Some(close)) = (chars.next(), chars.next_back()) else {
        return Err(malformed());
    };
    if !is_open(open) || !is_close(close) {
        return Err(malformed());
    }
    let inner = chars.as_str();
    if inner.contains(is_open) || inner.contains(is_close) {
        return Err(malformed());
    }

    let Some((lower, upper)) = inner.split_once(',') else {
        let version = inner.trim();
        if open != '[' || close != ']' || version.is_empty() {
            return Err(malformed());
        }
        return Ok(vec![Clause::new(Operator::Eq, version)?]);
    };
    if upper.contains(',') {
        return Err(malformed());
    }

    let (lower, upper) = (lower.trim(), upper.trim());
    if lower.is_empty() && upper.is_empty() {
        return Err(malformed());
    }

    let mut clauses = Vec::with_capacity(2);
    if !lower.is_empty() {
        let operator = if open == '[' { Operator::Gte } else { Operator::Gt };
        clauses.push(Clause::new(operator, lower)?);
    }
    if !upper.is_empty() {
        let operator = if close == ']' { Operator::Lte } else { Operator::Lt };
        clauses.push(Clause::new(operator, upper)?);
    }
    Ok(clauses)
}
