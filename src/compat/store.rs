//! Loading and normalizing the three compatibility tables
//!
//! Loading happens in two passes: the JSON is decoded into raw records, and
//! the raw records are then normalized and validated into table rows. The
//! resulting [`CompatibilityTables`] is never mutated afterwards.

use serde::de::DeserializeOwned;
use tracing::info;

use crate::compat::error::LoadError;
use crate::compat::source::{EmbeddedTables, TableSource};
use crate::compat::types::{CudaBaseImage, RawTfEntry, Table, TfEntry, TorchEntry};

/// The loaded TensorFlow, Torch and CUDA base image tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityTables {
    tensorflow: Vec<TfEntry>,
    torch: Vec<TorchEntry>,
    cuda_images: Vec<CudaBaseImage>,
}

/// Load all three tables from `source`
pub fn load_tables<S: TableSource + ?Sized>(source: &S) -> Result<CompatibilityTables, LoadError> {
    let tables = CompatibilityTables::from_json(
        &source.read(Table::Tensorflow)?,
        &source.read(Table::Torch)?,
        &source.read(Table::CudaBaseImages)?,
    )?;

    info!(
        "Loaded compatibility tables: {} TensorFlow, {} Torch, {} CUDA base images",
        tables.tensorflow.len(),
        tables.torch.len(),
        tables.cuda_images.len()
    );

    Ok(tables)
}

impl CompatibilityTables {
    /// Load the tables compiled into the binary
    pub fn embedded() -> Result<Self, LoadError> {
        load_tables(&EmbeddedTables)
    }

    /// Decode and normalize the three JSON documents
    pub fn from_json(tf: &str, torch: &str, cuda_images: &str) -> Result<Self, LoadError> {
        let tf: Vec<RawTfEntry> = decode(Table::Tensorflow, tf)?;
        let torch: Vec<TorchEntry> = decode(Table::Torch, torch)?;
        let tags: Vec<String> = decode(Table::CudaBaseImages, cuda_images)?;

        Self::from_raw(tf, torch, tags.as_slice())
    }

    /// Normalize already-decoded rows
    pub fn from_raw<T: AsRef<str>>(
        tf: Vec<RawTfEntry>,
        torch: Vec<TorchEntry>,
        tags: &[T],
    ) -> Result<Self, LoadError> {
        let tensorflow = tf
            .into_iter()
            .map(TfEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let cuda_images = tags
            .iter()
            .map(|tag| CudaBaseImage::from_tag(tag.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tensorflow,
            torch,
            cuda_images,
        })
    }

    pub fn tensorflow(&self) -> &[TfEntry] {
        &self.tensorflow
    }

    pub fn torch(&self) -> &[TorchEntry] {
        &self.torch
    }

    pub fn cuda_images(&self) -> &[CudaBaseImage] {
        &self.cuda_images
    }

    /// Returns true if any of the three tables has no rows
    pub fn is_empty(&self) -> bool {
        self.tensorflow.is_empty() || self.torch.is_empty() || self.cuda_images.is_empty()
    }
}

fn decode<T: DeserializeOwned>(table: Table, json: &str) -> Result<T, LoadError> {
    serde_json::from_str(json).map_err(|source| LoadError::Decode { table, source })
}
