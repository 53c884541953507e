//! Queries over the compatibility tables
//!
//! Every lookup is a linear scan: the tables hold tens of rows, and row
//! order only matters as the tie-breaker for "latest" selection.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

use crate::compat::error::ResolveError;
use crate::compat::store::CompatibilityTables;
use crate::compat::types::{Framework, Table, TfEntry};
use crate::version::semver::{latest_version, version_greater};

/// Image repository the CUDA base image tags belong to
pub const DEFAULT_BASE_IMAGE_REPOSITORY: &str = "nvidia/cuda";

/// A CUDA version together with the cuDNN major version to pair it with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CudaPair {
    pub cuda: String,
    pub cudnn: String,
}

/// Read-only query interface over loaded [`CompatibilityTables`]
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    tables: &'a CompatibilityTables,
    repository: String,
}

impl<'a> Resolver<'a> {
    pub fn new(tables: &'a CompatibilityTables) -> Self {
        Self {
            tables,
            repository: DEFAULT_BASE_IMAGE_REPOSITORY.to_string(),
        }
    }

    /// Use a different repository when rendering base image references
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    pub fn tables(&self) -> &'a CompatibilityTables {
        self.tables
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// CUDA versions torch `torch` has GPU builds for, in table order
    pub fn cudas_for_torch(&self, torch: &str) -> Result<Vec<String>, ResolveError> {
        let cudas: IndexSet<&str> = self
            .tables
            .torch()
            .iter()
            .filter(|entry| entry.torch_version() == torch)
            .filter_map(|entry| entry.cuda())
            .collect();

        if cudas.is_empty() {
            return Err(ResolveError::NoCompatibleCuda {
                torch: torch.to_string(),
            });
        }

        Ok(cudas.into_iter().map(str::to_string).collect())
    }

    /// CUDA and cuDNN versions TensorFlow `tf` was built against
    pub fn cuda_for_tf(&self, tf: &str) -> Result<CudaPair, ResolveError> {
        self.tf_entry(tf)
            .map(|entry| CudaPair {
                cuda: entry.cuda().to_string(),
                cudnn: entry.cudnn().to_string(),
            })
            .ok_or_else(|| ResolveError::NoMatch {
                table: Table::Tensorflow,
                key: format!("tensorflow=={tf}"),
            })
    }

    /// cuDNN versions that have a base image for `cuda`
    ///
    /// Returns an empty list if there is none; callers pick their own default.
    pub fn cudnns_for_cuda(&self, cuda: &str) -> Vec<String> {
        let cudnns: IndexSet<&str> = self
            .tables
            .cuda_images()
            .iter()
            .filter(|image| image.cuda() == cuda)
            .map(|image| image.cudnn())
            .collect();

        cudnns.into_iter().map(str::to_string).collect()
    }

    /// Greatest CUDA version in `cudas`
    pub fn latest_cuda<S: AsRef<str>>(&self, cudas: &[S]) -> Result<String, ResolveError> {
        latest_version(cudas)?
            .map(str::to_string)
            .ok_or(ResolveError::EmptyInput {
                what: "CUDA version",
            })
    }

    /// Greatest cuDNN version that has a base image for `cuda`
    pub fn latest_cudnn_for_cuda(&self, cuda: &str) -> Result<String, ResolveError> {
        let cudnns = self.cudnns_for_cuda(cuda);

        latest_version(cudnns.as_slice())?
            .map(str::to_string)
            .ok_or_else(|| ResolveError::NoMatch {
                table: Table::CudaBaseImages,
                key: format!("CUDA {cuda}"),
            })
    }

    /// The TensorFlow row with the greatest version
    pub fn latest_tf(&self) -> Result<&'a TfEntry, ResolveError> {
        let mut latest: Option<&'a TfEntry> = None;

        for entry in self.tables.tensorflow() {
            let is_newer = match latest {
                None => true,
                Some(current) => version_greater(entry.tf(), current.tf())?,
            };
            if is_newer {
                latest = Some(entry);
            }
        }

        latest.ok_or(ResolveError::EmptyInput {
            what: "TensorFlow version",
        })
    }

    /// CUDA version of the latest TensorFlow release
    pub fn default_cuda(&self) -> Result<String, ResolveError> {
        let latest = self.latest_tf()?;
        debug!(
            "Default CUDA {} comes from tensorflow=={}",
            latest.cuda(),
            latest.tf()
        );
        Ok(latest.cuda().to_string())
    }

    /// Fully-qualified base image for an exact CUDA/cuDNN pair
    pub fn cuda_base_image_for(&self, cuda: &str, cudnn: &str) -> Result<String, ResolveError> {
        self.tables
            .cuda_images()
            .iter()
            .find(|image| image.cuda() == cuda && image.cudnn() == cudnn)
            .map(|image| image.image_ref(&self.repository))
            .ok_or_else(|| ResolveError::NoMatchingBaseImage {
                cuda: cuda.to_string(),
                cudnn: cudnn.to_string(),
            })
    }

    /// Python versions the row for `framework` at `version` lists as supported
    pub fn supported_pythons(&self, framework: Framework, version: &str) -> Option<&'a [String]> {
        match framework {
            Framework::Tensorflow => self.tf_entry(version).map(TfEntry::pythons),
            _ => self
                .tables
                .torch()
                .iter()
                .find(|entry| entry.bare_version(framework) == Some(version))
                .map(|entry| entry.pythons()),
        }
    }

    pub(crate) fn tf_entry(&self, tf: &str) -> Option<&'a TfEntry> {
        self.tables.tensorflow().iter().find(|entry| entry.tf() == tf)
    }
}
