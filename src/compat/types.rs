//! Table rows and the small enums used to address them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compat::error::LoadError;
use crate::version::semver::parse_version;

/// One of the three compatibility tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// TensorFlow releases and their CUDA/cuDNN build configuration
    Tensorflow,
    /// PyTorch wheels per CUDA flavour
    Torch,
    /// nvidia/cuda image tags
    CudaBaseImages,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Tensorflow, Table::Torch, Table::CudaBaseImages];

    /// Returns the string representation of the table
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Tensorflow => "tensorflow",
            Table::Torch => "torch",
            Table::CudaBaseImages => "cuda_base_images",
        }
    }

    /// File name the table is stored under in a tables directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Table::Tensorflow => "tf_compatibility_matrix.json",
            Table::Torch => "torch_compatibility_matrix.json",
            Table::CudaBaseImages => "cuda_base_image_tags.json",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Python package families that have a row in one of the tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Tensorflow,
    Torch,
    Torchvision,
    Torchaudio,
}

impl Framework {
    /// Returns the PyPI package name of the framework
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Tensorflow => "tensorflow",
            Framework::Torch => "torch",
            Framework::Torchvision => "torchvision",
            Framework::Torchaudio => "torchaudio",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tensorflow" => Ok(Framework::Tensorflow),
            "torch" => Ok(Framework::Torch),
            "torchvision" => Ok(Framework::Torchvision),
            "torchaudio" => Ok(Framework::Torchaudio),
            other => Err(format!("unknown framework: {other}")),
        }
    }
}

/// Whether a package is wanted for a CPU-only build or for a specific CUDA version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageTarget {
    Cpu,
    Gpu { cuda: String },
}

impl PackageTarget {
    pub fn gpu(cuda: impl Into<String>) -> Self {
        PackageTarget::Gpu { cuda: cuda.into() }
    }

    /// CUDA version of a GPU target
    pub fn cuda(&self) -> Option<&str> {
        match self {
            PackageTarget::Cpu => None,
            PackageTarget::Gpu { cuda } => Some(cuda),
        }
    }
}

impl fmt::Display for PackageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageTarget::Cpu => f.write_str("CPU"),
            PackageTarget::Gpu { cuda } => write!(f, "GPU, CUDA {cuda}"),
        }
    }
}

/// TensorFlow row as it appears in the JSON table, before normalization
#[derive(Debug, Clone, Deserialize)]
pub struct RawTfEntry {
    #[serde(rename = "TF")]
    pub tf: String,
    #[serde(rename = "TFCPUPackage")]
    pub tf_cpu_package: String,
    #[serde(rename = "TFGPUPackage")]
    pub tf_gpu_package: String,
    #[serde(rename = "CUDA")]
    pub cuda: String,
    #[serde(rename = "CuDNN")]
    pub cudnn: String,
    #[serde(rename = "Pythons", default)]
    pub pythons: Vec<String>,
}

/// Normalized TensorFlow row
///
/// CUDA is always `major.minor` and cuDNN always `major`, which is the
/// granularity the base image tags carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TfEntry {
    tf: String,
    cpu_package: String,
    gpu_package: String,
    cuda: String,
    cudnn: String,
    pythons: Vec<String>,
}

impl TfEntry {
    pub fn tf(&self) -> &str {
        &self.tf
    }

    /// CPU package spec, e.g. `tensorflow==2.10.0`
    pub fn cpu_package(&self) -> &str {
        &self.cpu_package
    }

    /// GPU package spec, e.g. `tensorflow-gpu==2.4.0`
    pub fn gpu_package(&self) -> &str {
        &self.gpu_package
    }

    pub fn cuda(&self) -> &str {
        &self.cuda
    }

    pub fn cudnn(&self) -> &str {
        &self.cudnn
    }

    pub fn pythons(&self) -> &[String] {
        &self.pythons
    }
}

impl TryFrom<RawTfEntry> for TfEntry {
    type Error = LoadError;

    fn try_from(raw: RawTfEntry) -> Result<Self, Self::Error> {
        let invalid = |field: &'static str| {
            let entry = raw.tf.clone();
            move |source| LoadError::InvalidVersion {
                table: Table::Tensorflow,
                entry,
                field,
                source,
            }
        };

        parse_version(&raw.tf).map_err(invalid("TF"))?;
        let cuda = parse_version(&raw.cuda).map_err(invalid("CUDA"))?;
        let cudnn = parse_version(&raw.cudnn).map_err(invalid("CuDNN"))?;

        Ok(Self {
            cuda: format!("{}.{}", cuda.major, cuda.minor),
            cudnn: cudnn.major.to_string(),
            tf: raw.tf,
            cpu_package: raw.tf_cpu_package,
            gpu_package: raw.tf_gpu_package,
            pythons: raw.pythons,
        })
    }
}

/// PyTorch row; a row without CUDA is a CPU-only build
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TorchEntry {
    #[serde(rename = "Torch")]
    torch: String,
    #[serde(rename = "Torchvision")]
    torchvision: String,
    #[serde(rename = "Torchaudio", default)]
    torchaudio: String,
    #[serde(rename = "IndexURL", default)]
    index_url: String,
    #[serde(rename = "CUDA", default)]
    cuda: Option<String>,
    #[serde(rename = "Pythons", default)]
    pythons: Vec<String>,
}

impl TorchEntry {
    /// Raw torch version including any local suffix, e.g. `2.0.1+cu118`
    pub fn torch(&self) -> &str {
        &self.torch
    }

    pub fn torchvision(&self) -> &str {
        &self.torchvision
    }

    pub fn torchaudio(&self) -> &str {
        &self.torchaudio
    }

    /// Bare torch version used for matching, e.g. `2.0.1`
    pub fn torch_version(&self) -> &str {
        strip_local_version(&self.torch)
    }

    pub fn torchvision_version(&self) -> &str {
        strip_local_version(&self.torchvision)
    }

    pub fn torchaudio_version(&self) -> &str {
        strip_local_version(&self.torchaudio)
    }

    /// Package index the wheels are served from; `None` means the default index
    pub fn index_url(&self) -> Option<&str> {
        Some(self.index_url.as_str()).filter(|url| !url.is_empty())
    }

    pub fn cuda(&self) -> Option<&str> {
        self.cuda.as_deref()
    }

    pub fn is_gpu(&self) -> bool {
        self.cuda.is_some()
    }

    pub fn pythons(&self) -> &[String] {
        &self.pythons
    }

    /// Raw version string of the given torch-family package
    pub(crate) fn raw_version(&self, framework: Framework) -> Option<&str> {
        match framework {
            Framework::Torch => Some(self.torch.as_str()),
            Framework::Torchvision => Some(self.torchvision.as_str()),
            Framework::Torchaudio => Some(self.torchaudio.as_str()).filter(|v| !v.is_empty()),
            Framework::Tensorflow => None,
        }
    }

    /// Bare version string of the given torch-family package
    pub(crate) fn bare_version(&self, framework: Framework) -> Option<&str> {
        self.raw_version(framework).map(strip_local_version)
    }
}

/// Strip a PEP 440 local version label (`+cu118`)
fn strip_local_version(version: &str) -> &str {
    version.split('+').next().unwrap_or(version)
}

/// nvidia/cuda image tag decomposed into its parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CudaBaseImage {
    cuda: String,
    cudnn: String,
    is_devel: bool,
    ubuntu: String,
}

impl CudaBaseImage {
    /// Decompose `<cuda>-cudnn<cudnn>-{devel,runtime}-ubuntu<ubuntu>`
    pub fn from_tag(tag: &str) -> Result<Self, LoadError> {
        let malformed = || LoadError::MalformedTag(tag.to_string());

        let parts: Vec<&str> = tag.split('-').collect();
        let [cuda, cudnn, flavour, ubuntu] = parts[..] else {
            return Err(malformed());
        };

        let cudnn = cudnn.strip_prefix("cudnn").ok_or_else(malformed)?;
        let ubuntu = ubuntu.strip_prefix("ubuntu").ok_or_else(malformed)?;
        let is_devel = match flavour {
            "devel" => true,
            "runtime" => false,
            _ => return Err(malformed()),
        };

        if cuda.is_empty() || cudnn.is_empty() || ubuntu.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            cuda: cuda.to_string(),
            cudnn: cudnn.to_string(),
            is_devel,
            ubuntu: ubuntu.to_string(),
        })
    }

    pub fn cuda(&self) -> &str {
        &self.cuda
    }

    pub fn cudnn(&self) -> &str {
        &self.cudnn
    }

    pub fn is_devel(&self) -> bool {
        self.is_devel
    }

    pub fn ubuntu(&self) -> &str {
        &self.ubuntu
    }

    /// Rebuild the tag from its parts
    pub fn tag(&self) -> String {
        let flavour = if self.is_devel { "devel" } else { "runtime" };
        format!(
            "{}-cudnn{}-{}-ubuntu{}",
            self.cuda, self.cudnn, flavour, self.ubuntu
        )
    }

    /// Fully-qualified image reference, e.g. `nvidia/cuda:11.8-cudnn8-devel-ubuntu22.04`
    pub fn image_ref(&self, repository: &str) -> String {
        format!("{}:{}", repository, self.tag())
    }
}
