use std::path::PathBuf;

use thiserror::Error;

use crate::compat::types::{Framework, PackageTarget, Table};
use crate::version::error::VersionParseError;

/// Errors raised while loading the compatibility tables; all of them are fatal at startup
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {table} table from {}: {source}", .path.display())]
    Io {
        table: Table,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {table} table: {source}")]
    Decode {
        table: Table,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {field} version in {table} entry {entry}: {source}")]
    InvalidVersion {
        table: Table,
        entry: String,
        field: &'static str,
        #[source]
        source: VersionParseError,
    },

    #[error(
        "Tag must be in the format <cudaVersion>-cudnn<cudnnVersion>-{{devel,runtime}}-ubuntu<ubuntuVersion>. Invalid tag: {0}"
    )]
    MalformedTag(String),
}

/// Errors returned by resolver queries
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("torch=={torch} doesn't have any compatible CUDA versions")]
    NoCompatibleCuda { torch: String },

    #[error("No {table} entry matches {key}")]
    NoMatch { table: Table, key: String },

    #[error("Cannot pick the latest {what} from an empty list")]
    EmptyInput { what: &'static str },

    #[error("No matching base image for CUDA {cuda} and CuDNN {cudnn}")]
    NoMatchingBaseImage { cuda: String, cudnn: String },

    #[error("No matching {framework} package for version {version} ({target})")]
    NoMatchingPackage {
        framework: Framework,
        version: String,
        target: PackageTarget,
    },

    #[error(
        "The specified CUDA version {cuda} is not compatible with torch=={torch}. Compatible CUDA versions are: {}",
        .compatible.join(", ")
    )]
    IncompatibleCuda {
        cuda: String,
        torch: String,
        compatible: Vec<String>,
    },

    #[error(
        "The specified CUDA version {cuda} is not compatible with CuDNN {cudnn}. Compatible CuDNN versions are: {}",
        .compatible.join(", ")
    )]
    IncompatibleCuDnn {
        cuda: String,
        cudnn: String,
        compatible: Vec<String>,
    },

    #[error("Invalid requirement '{requirement}': {reason}")]
    InvalidRequirement { requirement: String, reason: String },

    #[error(transparent)]
    InvalidVersion(#[from] VersionParseError),
}
