//! Version comparison layer
//!
//! Every "latest" decision and every input validation in the resolver goes
//! through [`semver::parse_version`], which reduces framework, CUDA and cuDNN
//! version strings to a comparable `major.minor.patch` triple.
//!
//! # Modules
//!
//! - [`semver`]: parsing, strict ordering and latest-version selection
//! - [`error`]: parse error type

pub mod error;
pub mod semver;
