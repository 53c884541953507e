//! Where the raw JSON tables come from

use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::compat::error::LoadError;
use crate::compat::types::Table;

const TF_MATRIX: &str = include_str!("../../data/tf_compatibility_matrix.json");
const TORCH_MATRIX: &str = include_str!("../../data/torch_compatibility_matrix.json");
const CUDA_BASE_IMAGE_TAGS: &str = include_str!("../../data/cuda_base_image_tags.json");

/// Trait for supplying the raw JSON text of each table
#[cfg_attr(test, automock)]
pub trait TableSource: Send + Sync {
    /// Returns the JSON document for `table`
    fn read(&self, table: Table) -> Result<String, LoadError>;
}

/// Tables compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTables;

impl TableSource for EmbeddedTables {
    fn read(&self, table: Table) -> Result<String, LoadError> {
        let data = match table {
            Table::Tensorflow => TF_MATRIX,
            Table::Torch => TORCH_MATRIX,
            Table::CudaBaseImages => CUDA_BASE_IMAGE_TAGS,
        };
        Ok(data.to_string())
    }
}

/// Tables read from a directory holding one JSON file per table
///
/// File names follow [`Table::file_name`].
#[derive(Debug, Clone)]
pub struct DirectoryTables {
    dir: PathBuf,
}

impl DirectoryTables {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TableSource for DirectoryTables {
    fn read(&self, table: Table) -> Result<String, LoadError> {
        let path = self.dir.join(table.file_name());
        debug!("Reading {} table from {}", table, path.display());

        std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            table,
            path,
            source,
        })
    }
}
