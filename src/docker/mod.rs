//! Docker image tags: classification, ordering and latest-tag selection.

pub mod latest_tag;
pub mod tag;
pub mod version;

pub use latest_tag::{DigestLookup, LatestTagError, LatestTagFinder};
pub use tag::{DockerTag, TagFormat};
pub use version::DockerVersion;
