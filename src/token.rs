//! Lossless tokenization of version strings.
//!
//! A version string is split at the separator characters `.`, `-`, `_` and
//! `+`, and at every transition between a digit run and a non-digit run.
//! Each token remembers the separator that preceded it, so joining the
//! tokens back together always reproduces the input exactly.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Separator preceding a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Separator {
    /// First token, or an implicit digit/letter boundary
    None,
    Dot,
    Dash,
    Underscore,
    Plus,
}

impl Separator {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Separator::Dot),
            '-' => Some(Separator::Dash),
            '_' => Some(Separator::Underscore),
            '+' => Some(Separator::Plus),
            _ => None,
        }
    }

    /// The character this separator was written as (empty for `None`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::None => "",
            Separator::Dot => ".",
            Separator::Dash => "-",
            Separator::Underscore => "_",
            Separator::Plus => "+",
        }
    }
}

/// Whether a token is a digit run or anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Numeric,
    Alphabetic,
}

/// A single segment of a version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VersionToken {
    /// Separator written before this token
    pub separator: Separator,
    /// Numeric or alphabetic
    pub kind: TokenKind,
    /// Original text of the token (may be empty between two separators)
    pub text: String,
}

impl VersionToken {
    pub fn is_numeric(&self) -> bool {
        self.kind == TokenKind::Numeric
    }

    /// Numeric value as `u64`, `None` for alphabetic tokens or on overflow.
    pub fn as_u64(&self) -> Option<u64> {
        if self.is_numeric() {
            self.text.parse().ok()
        } else {
            None
        }
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.separator.as_str(), self.text)
    }
}

/// Splits `raw` into tokens.
///
/// Separators produce a new token even when nothing follows them, so
/// `"1.0."` yields three tokens, the last one empty. Joining the result with
/// [`join_tokens`] returns `raw` unchanged.
pub fn tokenize(raw: &str) -> Vec<VersionToken> {
    let mut tokens = Vec::with_capacity(raw.len() / 2 + 1);
    let mut separator = Separator::None;
    let mut current = String::new();
    let mut current_kind: Option<TokenKind> = None;
    let mut pending = raw.is_empty();

    for c in raw.chars() {
        if let Some(sep) = Separator::from_char(c) {
            push_token(&mut tokens, separator, current_kind, &mut current, pending);
            separator = sep;
            current_kind = None;
            pending = true;
            continue;
        }

        let kind = if c.is_ascii_digit() {
            TokenKind::Numeric
        } else {
            TokenKind::Alphabetic
        };

        match current_kind {
            Some(existing) if existing != kind => {
                push_token(&mut tokens, separator, current_kind, &mut current, true);
                separator = Separator::None;
            }
            _ => {}
        }

        current_kind = Some(kind);
        current.push(c);
        pending = true;
    }

    push_token(&mut tokens, separator, current_kind, &mut current, pending);
    tokens
}

fn push_token(
    tokens: &mut Vec<VersionToken>,
    separator: Separator,
    kind: Option<TokenKind>,
    current: &mut String,
    pending: bool,
) {
    if !pending {
        return;
    }
    tokens.push(VersionToken {
        separator,
        kind: kind.unwrap_or(TokenKind::Alphabetic),
        text: std::mem::take(current),
    });
}

/// Rebuilds the original string from its tokens.
pub fn join_tokens(tokens: &[VersionToken]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len() + 1).sum());
    for token in tokens {
        out.push_str(token.separator.as_str());
        out.push_str(&token.text);
    }
    out
}

/// Compares two digit strings by numeric value without parsing them.
///
/// Works for arbitrarily long runs such as `20230915123045`.
pub fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
