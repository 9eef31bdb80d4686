//! Keel - convention-based build orchestration CLI
//!
//! ## Commands
//!
//! - `classify`: classify a version token into a build type
//! - `plugins`: list registered plugin variants
//! - `apply`: apply shared conventions and plugin variants to the modules of
//!   a `keel.toml` manifest and print their configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keel_core::{
    init_tracing, BuildEngine, BuildType, Manifest, ModuleConfiguration, OfflineResolver,
    PluginRegistry, RepositoryResolver, BUILD_TYPE_ENV, MANIFEST_FILE,
};
use keel_http::HttpResolver;
use serde::Serialize;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "keel")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convention-based build orchestration", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a version token (snapshot, patch, release)
    Classify {
        /// Version token to classify
        token: String,
    },

    /// List registered plugin variants
    Plugins,

    /// Apply conventions to the modules of a manifest
    Apply {
        /// Path to the workspace manifest
        #[arg(short, long, default_value = MANIFEST_FILE)]
        manifest: PathBuf,

        /// Only apply these modules (default: all)
        #[arg(short = 'p', long = "module")]
        modules: Vec<String>,

        /// Resolve repositories without network access
        #[arg(long)]
        offline: bool,

        /// Override every module's build type token
        #[arg(long, env = BUILD_TYPE_ENV)]
        build_type: Option<String>,
    },
}

/// Outcome of applying one module, as printed by `keel apply`.
#[derive(Debug, Serialize)]
struct ModuleReport {
    module: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    configuration: Option<ModuleConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Classify { token } => {
            let build_type = classify(&token)?;
            println!("{build_type}");
        }
        Commands::Plugins => {
            for id in PluginRegistry::builtin().ids() {
                println!("{id}");
            }
        }
        Commands::Apply {
            manifest,
            modules,
            offline,
            build_type,
        } => {
            let reports = apply(&manifest, &modules, offline, build_type.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);

            let failed = reports.iter().filter(|r| !r.success).count();
            if failed > 0 {
                anyhow::bail!("{} of {} module(s) failed", failed, reports.len());
            }
        }
    }

    Ok(())
}

fn classify(token: &str) -> Result<BuildType> {
    BuildType::classify(token).map_err(Into::into)
}

async fn apply(
    manifest_path: &Path,
    selected: &[String],
    offline: bool,
    build_type: Option<&str>,
) -> Result<Vec<ModuleReport>> {
    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;

    let descriptors = Manifest::select(manifest.module_descriptors_with(build_type), selected)?;

    let resolver: Arc<dyn RepositoryResolver> = if offline {
        Arc::new(OfflineResolver)
    } else {
        Arc::new(HttpResolver::from_env().context("Failed to create repository resolver")?)
    };

    info!(modules = descriptors.len(), offline = offline, "Applying conventions");

    let engine = Arc::new(BuildEngine::new(PluginRegistry::builtin(), &manifest, resolver));
    let names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
    let outcomes = engine.apply_all(descriptors).await;

    let mut reports = Vec::with_capacity(names.len());
    for (module, outcome) in names.into_iter().zip(outcomes) {
        let report = match outcome {
            Ok(applied) => ModuleReport {
                digest: Some(
                    applied
                        .configuration
                        .digest()
                        .with_context(|| format!("Failed to digest module {module}"))?,
                ),
                module,
                success: true,
                attempts: Some(applied.attempts),
                configuration: Some(applied.configuration),
                error: None,
            },
            Err(err) => ModuleReport {
                module,
                success: false,
                attempts: None,
                digest: None,
                configuration: None,
                error: Some(err.to_string()),
            },
        };
        reports.push(report);
    }

    Ok(reports)
}
