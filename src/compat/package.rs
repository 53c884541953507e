//! Pip package coordinates for the framework packages
//!
//! TensorFlow rows carry full package specs (`tensorflow-gpu==2.4.0`) that are
//! split with a PEP 508 parser. Torch-family rows pin the raw, suffixed
//! version (`2.0.1+cu118`) and name the index the wheel is served from.

use std::str::FromStr;

use pep508_rs::pep440_rs::Operator;
use pep508_rs::{Requirement, VerbatimUrl, VersionOrUrl};
use serde::Serialize;

use crate::compat::error::ResolveError;
use crate::compat::resolver::Resolver;
use crate::compat::types::{Framework, PackageTarget};

/// A package pinned to an exact version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PythonPackage {
    pub name: String,
    pub version: String,
    /// Index serving the package; `None` means the default index
    pub index_url: Option<String>,
}

impl PythonPackage {
    /// `name==version` requirement string
    pub fn requirement(&self) -> String {
        format!("{}=={}", self.name, self.version)
    }
}

/// A PEP 508 requirement reduced to what the resolver needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequirement {
    /// The requirement as written
    pub raw: String,
    /// Normalized package name
    pub name: String,
    /// Version pinned with `==`, if any
    pub pinned: Option<String>,
}

impl ParsedRequirement {
    /// Framework this requirement refers to, if it has a table row family
    pub fn framework(&self) -> Option<Framework> {
        Framework::from_str(&self.name).ok()
    }
}

/// Parse a requirement such as `torch==2.0.1` or `numpy>=1.24`
pub fn parse_requirement(requirement: &str) -> Result<ParsedRequirement, ResolveError> {
    let invalid = |reason: String| ResolveError::InvalidRequirement {
        requirement: requirement.to_string(),
        reason,
    };

    let parsed = Requirement::<VerbatimUrl>::from_str(requirement.trim())
        .map_err(|e| invalid(e.to_string()))?;

    let pinned = match &parsed.version_or_url {
        Some(VersionOrUrl::Url(_)) => {
            return Err(invalid("URL requirements are not supported".to_string()));
        }
        Some(VersionOrUrl::VersionSpecifier(specifiers)) => specifiers
            .iter()
            .find(|spec| *spec.operator() == Operator::Equal)
            .map(|spec| spec.version().to_string()),
        None => None,
    };

    Ok(ParsedRequirement {
        raw: requirement.trim().to_string(),
        name: parsed.name.to_string(),
        pinned,
    })
}

/// Split a table package spec (`tensorflow-gpu==2.4.0`) into name and version
fn split_package_spec(spec: &str) -> Result<(String, String), ResolveError> {
    let parsed = parse_requirement(spec)?;
    let version = parsed
        .pinned
        .ok_or_else(|| ResolveError::InvalidRequirement {
            requirement: spec.to_string(),
            reason: "expected a version pinned with ==".to_string(),
        })?;
    Ok((parsed.name, version))
}

impl Resolver<'_> {
    /// Resolve the pip package for `framework` at `version`
    ///
    /// CPU targets match rows without CUDA (TensorFlow rows serve both);
    /// GPU targets match rows built for exactly the requested CUDA version.
    pub fn package(
        &self,
        framework: Framework,
        version: &str,
        target: &PackageTarget,
    ) -> Result<PythonPackage, ResolveError> {
        let package = match framework {
            Framework::Tensorflow => self.tensorflow_package(version, target)?,
            _ => self.torch_family_package(framework, version, target),
        };

        package.ok_or_else(|| ResolveError::NoMatchingPackage {
            framework,
            version: version.to_string(),
            target: target.clone(),
        })
    }

    fn tensorflow_package(
        &self,
        version: &str,
        target: &PackageTarget,
    ) -> Result<Option<PythonPackage>, ResolveError> {
        let entry = self.tables().tensorflow().iter().find(|entry| {
            entry.tf() == version && target.cuda().is_none_or(|cuda| entry.cuda() == cuda)
        });
        let Some(entry) = entry else {
            return Ok(None);
        };

        let spec = match target {
            PackageTarget::Cpu => entry.cpu_package(),
            PackageTarget::Gpu { .. } => entry.gpu_package(),
        };
        let (name, version) = split_package_spec(spec)?;

        Ok(Some(PythonPackage {
            name,
            version,
            index_url: None,
        }))
    }

    fn torch_family_package(
        &self,
        framework: Framework,
        version: &str,
        target: &PackageTarget,
    ) -> Option<PythonPackage> {
        self.tables()
            .torch()
            .iter()
            .filter(|entry| entry.bare_version(framework) == Some(version))
            .find(|entry| entry.cuda() == target.cuda())
            .and_then(|entry| {
                Some(PythonPackage {
                    name: framework.as_str().to_string(),
                    version: entry.raw_version(framework)?.to_string(),
                    index_url: entry.index_url().map(str::to_string),
                })
            })
    }
}
