//! ci-jobs Git - Git change detection
//!
//! This crate wraps a git repository and lists the files that differ from a
//! base ref, feeding the core change detector.

mod diff;
mod repository;

pub use repository::{GitRepo, Result};
