//! Dependi Versions - version ordering and requirement matching
//!
//! This crate orders version strings the way Docker registries and
//! Gradle/Maven repositories do, evaluates requirements against them and
//! computes dependency updates (latest Docker tag, rewritten Gradle
//! requirements).

pub mod config;
pub mod docker;
pub mod gradle;
pub mod requirement;
pub mod scheme;
pub mod token;
