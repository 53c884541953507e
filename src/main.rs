use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use ml_compat::compat::{
    BuildRequest, CompatibilityTables, DirectoryTables, EmbeddedTables, Framework, PackageTarget,
    Resolver, load_tables,
};
use ml_compat::config::CompatConfig;

#[derive(Parser)]
#[command(name = "ml-compat")]
#[command(version, about = "Resolve compatible CUDA, cuDNN, base images and packages for ML frameworks")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the table JSON files (overrides the config file)
    #[arg(long, global = true)]
    tables_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// CUDA and cuDNN versions a TensorFlow release was built against
    CudaForTf { version: String },
    /// CUDA versions a torch release has GPU builds for
    CudasForTorch { version: String },
    /// cuDNN versions with a base image for a CUDA version
    Cudnns { cuda: String },
    /// Latest TensorFlow release in the table
    LatestTf,
    /// CUDA version used when nothing else decides
    DefaultCuda,
    /// Base image for a CUDA/cuDNN pair
    BaseImage {
        cuda: String,
        /// Defaults to the latest cuDNN available for the CUDA version
        cudnn: Option<String>,
    },
    /// Pinned pip package for a framework
    Package {
        #[arg(value_parser = parse_framework)]
        framework: Framework,
        version: String,
        /// Resolve the GPU package for this CUDA version instead of the CPU one
        #[arg(long)]
        cuda: Option<String>,
    },
    /// Complete a build request into CUDA, base image and package coordinates
    Plan {
        /// PEP 508 requirements, e.g. torch==2.0.1
        requirements: Vec<String>,
        #[arg(long)]
        gpu: bool,
        #[arg(long)]
        cuda: Option<String>,
        #[arg(long)]
        cudnn: Option<String>,
        #[arg(long)]
        python: Option<String>,
    },
}

fn parse_framework(s: &str) -> Result<Framework, String> {
    s.parse()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CompatConfig::load(path)?,
        None => CompatConfig::default(),
    };
    if let Some(dir) = &cli.tables_dir {
        config.tables_dir = Some(dir.clone());
    }

    let _guard = ml_compat::logging::init(&config.log)?;

    let tables = match &config.tables_dir {
        Some(dir) => load_tables(&DirectoryTables::new(dir)),
        None => load_tables(&EmbeddedTables),
    }
    .context("Failed to load compatibility tables")?;
    if tables.is_empty() {
        anyhow::bail!("Compatibility tables must not be empty");
    }

    run(&cli, &config, &tables)
}

fn run(cli: &Cli, config: &CompatConfig, tables: &CompatibilityTables) -> anyhow::Result<()> {
    let resolver = Resolver::new(tables).with_repository(&config.base_image_repository);

    match &cli.command {
        Command::CudaForTf { version } => {
            let pair = resolver.cuda_for_tf(version)?;
            print(cli.json, &pair, || format!("CUDA {}, CuDNN {}", pair.cuda, pair.cudnn))
        }
        Command::CudasForTorch { version } => {
            let cudas = resolver.cudas_for_torch(version)?;
            print(cli.json, &cudas, || cudas.join("\n"))
        }
        Command::Cudnns { cuda } => {
            let cudnns = resolver.cudnns_for_cuda(cuda);
            print(cli.json, &cudnns, || cudnns.join("\n"))
        }
        Command::LatestTf => {
            let latest = resolver.latest_tf()?;
            print(cli.json, latest, || latest.tf().to_string())
        }
        Command::DefaultCuda => {
            let cuda = resolver.default_cuda()?;
            print(cli.json, &cuda, || cuda.clone())
        }
        Command::BaseImage { cuda, cudnn } => {
            let cudnn = match cudnn {
                Some(cudnn) => cudnn.clone(),
                None => {
                    let cudnn = resolver.latest_cudnn_for_cuda(cuda)?;
                    debug!("Using latest CuDNN {} for CUDA {}", cudnn, cuda);
                    cudnn
                }
            };
            let image = resolver.cuda_base_image_for(cuda, &cudnn)?;
            print(cli.json, &image, || image.clone())
        }
        Command::Package {
            framework,
            version,
            cuda,
        } => {
            let target = match cuda {
                Some(cuda) => PackageTarget::gpu(cuda.as_str()),
                None => PackageTarget::Cpu,
            };
            let package = resolver.package(*framework, version, &target)?;
            print(cli.json, &package, || match &package.index_url {
                Some(url) => format!("{} --extra-index-url {}", package.requirement(), url),
                None => package.requirement(),
            })
        }
        Command::Plan {
            requirements,
            gpu,
            cuda,
            cudnn,
            python,
        } => {
            let request = BuildRequest {
                gpu: *gpu,
                cuda: cuda.clone(),
                cudnn: cudnn.clone(),
                python_version: python.clone(),
                python_packages: requirements.clone(),
            };
            let plan = resolver.plan(&request)?;
            print(cli.json, &plan, || {
                let mut lines = Vec::new();
                if let Some(image) = &plan.base_image {
                    lines.push(format!("base image: {image}"));
                }
                for requirement in &plan.requirements {
                    lines.push(match &requirement.index_url {
                        Some(url) => format!("{} --extra-index-url {}", requirement.requirement, url),
                        None => requirement.requirement.clone(),
                    });
                }
                for warning in &plan.warnings {
                    lines.push(format!("warning: {warning}"));
                }
                lines.join("\n")
            })
        }
    }
}

fn print<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
