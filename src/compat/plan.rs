//! Completing a build request into concrete CUDA, base image and package coordinates

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compat::error::ResolveError;
use crate::compat::package::{ParsedRequirement, parse_requirement};
use crate::compat::resolver::Resolver;
use crate::compat::types::{Framework, PackageTarget};

/// What the build asks for; anything left out is filled in from the tables
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildRequest {
    pub gpu: bool,
    pub cuda: Option<String>,
    pub cudnn: Option<String>,
    pub python_version: Option<String>,
    /// PEP 508 requirement strings, e.g. `torch==2.0.1`
    pub python_packages: Vec<String>,
}

/// A requirement ready to hand to pip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRequirement {
    pub requirement: String,
    pub index_url: Option<String>,
}

/// Coordinates the builder consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub cuda: Option<String>,
    pub cudnn: Option<String>,
    pub base_image: Option<String>,
    pub requirements: Vec<ResolvedRequirement>,
    pub warnings: Vec<String>,
}

impl Resolver<'_> {
    /// Resolve a build request into a [`BuildPlan`]
    pub fn plan(&self, request: &BuildRequest) -> Result<BuildPlan, ResolveError> {
        let requirements = request
            .python_packages
            .iter()
            .map(|requirement| parse_requirement(requirement))
            .collect::<Result<Vec<_>, _>>()?;

        let mut plan = BuildPlan::default();

        let target = if request.gpu {
            let (cuda, cudnn) = self.complete_cuda(request, &requirements, &mut plan.warnings)?;
            plan.base_image = Some(self.cuda_base_image_for(&cuda, &cudnn)?);
            plan.cudnn = Some(cudnn);
            plan.cuda = Some(cuda.clone());
            PackageTarget::Gpu { cuda }
        } else {
            PackageTarget::Cpu
        };

        for requirement in &requirements {
            if let Some(python) = &request.python_version
                && let Some(warning) = self.python_warning(requirement, python)
            {
                plan.warnings.push(warning);
            }
            plan.requirements.push(self.resolve_requirement(requirement, &target)?);
        }

        for warning in &plan.warnings {
            warn!("{}", warning);
        }

        Ok(plan)
    }

    /// Fill in CUDA and cuDNN from the pinned framework versions, then from defaults
    fn complete_cuda(
        &self,
        request: &BuildRequest,
        requirements: &[ParsedRequirement],
        warnings: &mut Vec<String>,
    ) -> Result<(String, String), ResolveError> {
        let mut cuda = request.cuda.clone();
        let mut cudnn = request.cudnn.clone();

        if let (Some(cuda), Some(cudnn)) = (&cuda, &cudnn) {
            let compatible = self.cudnns_for_cuda(cuda);
            if !compatible.contains(cudnn) {
                return Err(ResolveError::IncompatibleCuDnn {
                    cuda: cuda.clone(),
                    cudnn: cudnn.clone(),
                    compatible,
                });
            }
        }

        if let Some(torch) = pinned_version(requirements, Framework::Torch) {
            let torch_cudas = self.cudas_for_torch(torch)?;
            match &cuda {
                None => {
                    let latest = self.latest_cuda(&torch_cudas)?;
                    debug!("Setting CUDA to version {} from torch=={}", latest, torch);
                    cuda = Some(latest);
                }
                Some(requested) if !torch_cudas.contains(requested) => {
                    return Err(ResolveError::IncompatibleCuda {
                        cuda: requested.clone(),
                        torch: torch.to_string(),
                        compatible: torch_cudas,
                    });
                }
                Some(_) => {}
            }
        }

        if let Some(tf) = pinned_version(requirements, Framework::Tensorflow) {
            let tf_pair = self.cuda_for_tf(tf)?;
            match &cuda {
                None => {
                    debug!(
                        "Setting CUDA to version {} from tensorflow=={}",
                        tf_pair.cuda, tf
                    );
                    cuda = Some(tf_pair.cuda.clone());
                }
                Some(requested) if *requested != tf_pair.cuda => warnings.push(format!(
                    "CUDA {requested} is not known to be compatible with tensorflow=={tf}. This might cause CUDA problems."
                )),
                Some(_) => {}
            }
            match &cudnn {
                None => cudnn = Some(tf_pair.cudnn),
                Some(requested) if *requested != tf_pair.cudnn => warnings.push(format!(
                    "CuDNN {requested} is not known to be compatible with tensorflow=={tf}. This might cause CUDA problems."
                )),
                Some(_) => {}
            }
        }

        let cuda = match cuda {
            Some(cuda) => cuda,
            None => {
                let cuda = self.default_cuda()?;
                debug!("Setting CUDA to default version {}", cuda);
                cuda
            }
        };
        let cudnn = match cudnn {
            Some(cudnn) => cudnn,
            None => {
                let cudnn = self.latest_cudnn_for_cuda(&cuda)?;
                debug!("Setting CuDNN to version {} for CUDA {}", cudnn, cuda);
                cudnn
            }
        };

        Ok((cuda, cudnn))
    }

    fn resolve_requirement(
        &self,
        requirement: &ParsedRequirement,
        target: &PackageTarget,
    ) -> Result<ResolvedRequirement, ResolveError> {
        let (Some(framework), Some(version)) = (requirement.framework(), &requirement.pinned) else {
            return Ok(ResolvedRequirement {
                requirement: requirement.raw.clone(),
                index_url: None,
            });
        };

        let package = self.package(framework, version, target)?;
        Ok(ResolvedRequirement {
            requirement: package.requirement(),
            index_url: package.index_url,
        })
    }

    fn python_warning(&self, requirement: &ParsedRequirement, python: &str) -> Option<String> {
        let framework = requirement.framework()?;
        let version = requirement.pinned.as_deref()?;
        let pythons = self.supported_pythons(framework, version)?;

        (!pythons.iter().any(|p| p == python)).then(|| {
            format!(
                "{framework}=={version} does not list Python {python} as supported (supported: {})",
                pythons.join(", ")
            )
        })
    }
}

fn pinned_version(requirements: &[ParsedRequirement], framework: Framework) -> Option<&str> {
    requirements
        .iter()
        .find(|requirement| requirement.framework() == Some(framework))
        .and_then(|requirement| requirement.pinned.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::testing::fixture_tables;

    fn gpu_request(packages: &[&str]) -> BuildRequest {
        BuildRequest {
            gpu: true,
            python_packages: packages.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn plan_picks_latest_cuda_for_torch() {
        let tables = fixture_tables();

        let plan = Resolver::new(&tables)
            .plan(&gpu_request(&["torch==2.0.1", "torchvision==0.15.2", "numpy>=1.24"]))
            .unwrap();

        assert_eq!(
            plan,
            BuildPlan {
                cuda: Some("11.8".to_string()),
                cudnn: Some("8".to_string()),
                base_image: Some("nvidia/cuda:11.8-cudnn8-devel-ubuntu22.04".to_string()),
                requirements: vec![
                    ResolvedRequirement {
                        requirement: "torch==2.0.1+cu118".to_string(),
                        index_url: Some("https://download.pytorch.org/whl/cu118".to_string()),
                    },
                    ResolvedRequirement {
                        requirement: "torchvision==0.15.2+cu118".to_string(),
                        index_url: Some("https://download.pytorch.org/whl/cu118".to_string()),
                    },
                    ResolvedRequirement {
                        requirement: "numpy>=1.24".to_string(),
                        index_url: None,
                    },
                ],
                warnings: vec![],
            }
        );
    }

    #[test]
    fn plan_honours_requested_cuda_for_torch() {
        let tables = fixture_tables();
        let request = BuildRequest {
            cuda: Some("11.7".to_string()),
            ..gpu_request(&["torch==2.0.1"])
        };

        let plan = Resolver::new(&tables).plan(&request).unwrap();

        assert_eq!(plan.cuda.as_deref(), Some("11.7"));
        assert_eq!(plan.requirements[0].requirement, "torch==2.0.1+cu117");
    }

    #[test]
    fn plan_rejects_cuda_incompatible_with_torch() {
        let tables = fixture_tables();
        let request = BuildRequest {
            cuda: Some("11.2".to_string()),
            ..gpu_request(&["torch==2.0.1"])
        };

        let err = Resolver::new(&tables).plan(&request).unwrap_err();

        assert_eq!(
            err.to_string(),
            "The specified CUDA version 11.2 is not compatible with torch==2.0.1. Compatible CUDA versions are: 11.7, 11.8"
        );
    }

    #[test]
    fn plan_rejects_cudnn_without_base_image() {
        let tables = fixture_tables();
        let request = BuildRequest {
            cuda: Some("11.8".to_string()),
            cudnn: Some("7".to_string()),
            ..gpu_request(&[])
        };

        let err = Resolver::new(&tables).plan(&request).unwrap_err();

        assert!(matches!(err, ResolveError::IncompatibleCuDnn { compatible, .. } if compatible == ["8"]));
    }

    #[test]
    fn plan_takes_cuda_and_cudnn_from_tensorflow() {
        let tables = fixture_tables();

        let plan = Resolver::new(&tables)
            .plan(&gpu_request(&["tensorflow==2.10.0"]))
            .unwrap();

        assert_eq!(plan.cuda.as_deref(), Some("11.2"));
        assert_eq!(plan.cudnn.as_deref(), Some("8"));
        assert_eq!(
            plan.base_image.as_deref(),
            Some("nvidia/cuda:11.2-cudnn8-devel-ubuntu20.04")
        );
        assert_eq!(plan.requirements[0].requirement, "tensorflow==2.10.0");
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn plan_keeps_requested_cuda_and_cudnn() {
        let tables = fixture_tables();
        let request = BuildRequest {
            cuda: Some("10.2".to_string()),
            cudnn: Some("7".to_string()),
            ..gpu_request(&["pandas"])
        };

        let plan = Resolver::new(&tables).plan(&request).unwrap();

        assert_eq!(
            plan.base_image.as_deref(),
            Some("nvidia/cuda:10.2-cudnn7-devel-ubuntu18.04")
        );
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn plan_warns_when_requested_cudnn_differs_from_tensorflow() {
        let tables = fixture_tables();
        let request = BuildRequest {
            cudnn: Some("7".to_string()),
            ..gpu_request(&["tensorflow==2.10.0"])
        };
        let requirements = vec![parse_requirement("tensorflow==2.10.0").unwrap()];
        let mut warnings = Vec::new();

        let (cuda, cudnn) = Resolver::new(&tables)
            .complete_cuda(&request, &requirements, &mut warnings)
            .unwrap();

        assert_eq!((cuda.as_str(), cudnn.as_str()), ("11.2", "7"));
        assert_eq!(
            warnings,
            vec![
                "CuDNN 7 is not known to be compatible with tensorflow==2.10.0. This might cause CUDA problems."
                    .to_string()
            ]
        );

        // there is no CUDA 11.2 image with cuDNN 7
        let err = Resolver::new(&tables).plan(&request).unwrap_err();
        assert!(matches!(err, ResolveError::NoMatchingBaseImage { .. }));
    }

    #[test]
    fn plan_warns_when_requested_cuda_differs_from_tensorflow() {
        let tables = fixture_tables();
        let request = BuildRequest {
            cuda: Some("11.8".to_string()),
            ..gpu_request(&["pandas", "tensorflow==2.10.0"])
        };

        // tensorflow 2.10.0 has no GPU row for CUDA 11.8
        let err = Resolver::new(&tables).plan(&request).unwrap_err();
        assert!(matches!(err, ResolveError::NoMatchingPackage { .. }));

        let mut warnings = Vec::new();
        let requirements = vec![parse_requirement("tensorflow==2.10.0").unwrap()];
        let (cuda, cudnn) = Resolver::new(&tables)
            .complete_cuda(&request, &requirements, &mut warnings)
            .unwrap();
        assert_eq!((cuda.as_str(), cudnn.as_str()), ("11.8", "8"));
        assert_eq!(
            warnings,
            vec![
                "CUDA 11.8 is not known to be compatible with tensorflow==2.10.0. This might cause CUDA problems."
                    .to_string()
            ]
        );
    }

    #[test]
    fn plan_falls_back_to_default_cuda() {
        let tables = fixture_tables();

        let plan = Resolver::new(&tables).plan(&gpu_request(&["pandas"])).unwrap();

        assert_eq!(plan.cuda.as_deref(), Some("11.8"));
        assert_eq!(plan.cudnn.as_deref(), Some("8"));
        assert_eq!(plan.requirements[0].requirement, "pandas");
    }

    #[test]
    fn plan_for_cpu_build_has_no_cuda() {
        let tables = fixture_tables();
        let request = BuildRequest {
            python_packages: vec!["torch==1.13.1".to_string(), "tensorflow==2.4.0".to_string()],
            ..Default::default()
        };

        let plan = Resolver::new(&tables).plan(&request).unwrap();

        assert_eq!(plan.cuda, None);
        assert_eq!(plan.base_image, None);
        assert_eq!(
            plan.requirements,
            vec![
                ResolvedRequirement {
                    requirement: "torch==1.13.1+cpu".to_string(),
                    index_url: Some("https://download.pytorch.org/whl/cpu".to_string()),
                },
                ResolvedRequirement {
                    requirement: "tensorflow==2.4.0".to_string(),
                    index_url: None,
                },
            ]
        );
    }

    #[test]
    fn plan_warns_about_unsupported_python() {
        let tables = fixture_tables();
        let request = BuildRequest {
            python_version: Some("3.11".to_string()),
            python_packages: vec!["tensorflow==2.4.0".to_string()],
            ..Default::default()
        };

        let plan = Resolver::new(&tables).plan(&request).unwrap();

        assert_eq!(
            plan.warnings,
            vec!["tensorflow==2.4.0 does not list Python 3.11 as supported (supported: 3.6, 3.7, 3.8)".to_string()]
        );
    }

    #[test]
    fn plan_propagates_invalid_requirements() {
        let tables = fixture_tables();

        let err = Resolver::new(&tables)
            .plan(&gpu_request(&["torch @ https://example.com/torch.whl"]))
            .unwrap_err();

        assert!(matches!(err, ResolveError::InvalidRequirement { .. }));
    }

    #[test]
    fn build_request_deserializes_from_camel_case() {
        let request: BuildRequest = serde_json::from_value(serde_json::json!({
            "gpu": true,
            "pythonVersion": "3.10",
            "pythonPackages": ["torch==2.0.1"]
        }))
        .unwrap();

        assert_eq!(
            request,
            BuildRequest {
                gpu: true,
                python_version: Some("3.10".to_string()),
                python_packages: vec!["torch==2.0.1".to_string()],
                ..Default::default()
            }
        );
    }
}
