//! Compatibility resolution layer
//!
//! Loads the TensorFlow, Torch and CUDA base image tables once and answers
//! compatibility queries against them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ TableSource │────▶│    Store    │◀────│  Resolver   │
//! │ (raw JSON)  │     │ (normalize) │     │  (queries)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                                ▼
//!                                         ┌─────────────┐
//!                                         │   Planner   │
//!                                         │(build plan) │
//!                                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`source`]: embedded and directory-backed table sources
//! - [`store`]: decoding and normalization into [`CompatibilityTables`]
//! - [`types`]: table rows and addressing enums
//! - [`resolver`]: CUDA/cuDNN/base image lookups
//! - [`package`]: pip package coordinates per framework
//! - [`plan`]: completing a build request
//! - [`error`]: load and query errors

pub mod error;
pub mod package;
pub mod plan;
pub mod resolver;
pub mod source;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{LoadError, ResolveError};
pub use package::{PythonPackage, parse_requirement};
pub use plan::{BuildPlan, BuildRequest, ResolvedRequirement};
pub use resolver::{CudaPair, DEFAULT_BASE_IMAGE_REPOSITORY, Resolver};
pub use source::{DirectoryTables, EmbeddedTables, TableSource};
pub use store::{CompatibilityTables, load_tables};
pub use types::{CudaBaseImage, Framework, PackageTarget, Table, TfEntry, TorchEntry};
