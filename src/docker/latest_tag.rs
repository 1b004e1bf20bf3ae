//! Selection of the newest tag a Docker image reference can move to.
//!
//! Registry access stays with the caller: the tag list is passed in as
//! strings and manifest digests are looked up through [`DigestLookup`].

use std::cmp::Ordering;

use thiserror::Error;

use super::tag::DockerTag;
use super::version::DockerVersion;
use crate::requirement::DockerRequirement;

/// Resolves a tag to its manifest digest.
pub trait DigestLookup {
    /// Digest of `tag`, `None` when unknown.
    fn digest(&self, tag: &str) -> Option<String>;
}

impl<F> DigestLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn digest(&self, tag: &str) -> Option<String> {
        self(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LatestTagError {
    #[error("all versions newer than {current} are ignored")]
    AllVersionsIgnored { current: String },
}

fn version_of(tag: &DockerTag) -> Option<DockerVersion> {
    tag.numeric_version().map(|numeric| DockerVersion::new(&numeric))
}

/// Picks the latest tag out of a registry's tag list.
pub struct LatestTagFinder<'a> {
    tags: Vec<DockerTag>,
    ignored: Vec<DockerRequirement>,
    digests: Option<&'a dyn DigestLookup>,
}

impl<'a> LatestTagFinder<'a> {
    pub fn new<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            tags: tags.into_iter().map(|t| DockerTag::new(t.as_ref())).collect(),
            ignored: Vec::new(),
            digests: None,
        }
    }

    /// Versions matching any of these requirements are never selected.
    pub fn with_ignored(mut self, ignored: Vec<DockerRequirement>) -> Self {
        self.ignored = ignored;
        self
    }

    pub fn with_digests(mut self, digests: &'a dyn DigestLookup) -> Self {
        self.digests = Some(digests);
        self
    }

    fn digest_of(&self, tag: &str) -> Option<String> {
        self.digests.and_then(|lookup| lookup.digest(tag))
    }

    /// Latest tag `current` can be updated to, or `current` itself.
    ///
    /// Falls back to `current` when every newer tag is ignored; use
    /// [`Self::try_latest_tag`] to tell that apart from being up to date.
    pub fn latest_tag(&self, current: &str) -> DockerTag {
        self.try_latest_tag(current).unwrap_or_else(|_| DockerTag::new(current))
    }

    /// Like [`Self::latest_tag`], but fails when newer tags exist and the
    /// ignore requirements rule out all of them.
    pub fn try_latest_tag(&self, current: &str) -> Result<DockerTag, LatestTagError> {
        let current_tag = DockerTag::new(current);
        let Some(current_version) = version_of(&current_tag) else {
            tracing::debug!("Tag {} is not comparable, keeping it", current_tag);
            return Ok(current_tag);
        };

        let candidates = self.candidates(&current_tag, &current_version);
        let newer_exists = candidates.iter().any(|(_, version)| *version > current_version);

        let kept: Vec<(DockerTag, DockerVersion)> = candidates
            .into_iter()
            .filter(|(tag, version)| {
                let ignored = self.ignored.iter().any(|req| req.satisfied_by(version));
                if ignored {
                    tracing::debug!("Skipping ignored tag {}", tag);
                }
                !ignored
            })
            .collect();

        if newer_exists && kept.iter().all(|(_, version)| *version <= current_version) {
            tracing::debug!("Every tag newer than {} is ignored", current_tag);
            return Err(LatestTagError::AllVersionsIgnored {
                current: current.to_string(),
            });
        }

        Ok(self.select(current_tag, kept))
    }

    /// Comparable, non-prerelease tags at least as new as `current`.
    fn candidates(
        &self,
        current: &DockerTag,
        current_version: &DockerVersion,
    ) -> Vec<(DockerTag, DockerVersion)> {
        let latest_version = self.version_of_latest_tag();
        let current_is_prerelease = self.is_prerelease(current, latest_version.as_ref());

        self.tags
            .iter()
            .filter(|tag| current.comparable_to(tag))
            .filter_map(|tag| version_of(tag).map(|version| (tag.clone(), version)))
            .filter(|(_, version)| version >= current_version)
            .filter(|(tag, _)| {
                current_is_prerelease || !self.is_prerelease(tag, latest_version.as_ref())
            })
            .collect()
    }

    fn select(
        &self,
        current: DockerTag,
        mut candidates: Vec<(DockerTag, DockerVersion)>,
    ) -> DockerTag {
        candidates.sort_by(|(a_tag, a_version), (b_tag, b_version)| {
            a_version.cmp(b_version).then_with(|| {
                match (a_tag.same_precision(&current), b_tag.same_precision(&current)) {
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    _ => Ordering::Equal,
                }
            })
        });

        let Some((latest, _)) = candidates.last() else {
            tracing::debug!("No candidate tags for {}", current);
            return current;
        };
        if latest.same_precision(&current) {
            return latest.clone();
        }

        let same_precision = candidates
            .iter()
            .rev()
            .map(|(tag, _)| tag)
            .find(|tag| tag.same_precision(&current));
        match same_precision {
            Some(tag)
                if self.digest_of(tag.name()) == self.digest_of(latest.name())
                    && tag.same_but_less_precise(latest) =>
            {
                tracing::debug!("{} is a less precise alias of {}", tag, latest);
                tag.clone()
            }
            _ => latest.clone(),
        }
    }

    /// Whether no newer version than `current` exists. `None` when the tag
    /// can't be ordered at all.
    pub fn is_up_to_date(&self, current: &str) -> Option<bool> {
        let current_version = version_of(&DockerTag::new(current))?;
        let latest = self.latest_tag(current);
        let latest_version = version_of(&latest)?;
        Some(latest_version <= current_version)
    }

    fn latest_digest(&self) -> Option<String> {
        if !self.tags.iter().any(|tag| tag.name() == "latest") {
            return None;
        }
        self.digest_of("latest")
    }

    /// Version of the highest canonical tag sharing `latest`'s digest.
    fn version_of_latest_tag(&self) -> Option<DockerVersion> {
        let latest_digest = self.latest_digest()?;
        let mut canonical: Vec<(&DockerTag, DockerVersion)> = self
            .tags
            .iter()
            .filter(|tag| tag.is_canonical())
            .filter_map(|tag| version_of(tag).map(|version| (tag, version)))
            .collect();
        canonical.sort_by(|(_, a), (_, b)| b.cmp(a));
        canonical
            .into_iter()
            .find(|(tag, _)| self.digest_of(tag.name()).as_deref() == Some(latest_digest.as_str()))
            .map(|(_, version)| version)
    }

    fn is_prerelease(&self, tag: &DockerTag, latest_version: Option<&DockerVersion>) -> bool {
        if tag.looks_like_prerelease() {
            return true;
        }
        match (version_of(tag), latest_version) {
            (Some(version), Some(latest)) => version > *latest,
            _ => false,
        }
    }
}
