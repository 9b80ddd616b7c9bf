//! Graft CLI - command-line front end for interface injection
//!
//! Runs one batch over JSON unit directories:
//! - `plan` lists the injections requested by the plugin units
//! - `patch` weaves them into the target units and writes the results
//! - `config` prints the effective configuration

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use graft_model::ErrorStrategy;
use graft_preloader::{
    JsonUnitStore, Preloader, PreloaderConfig, PreloaderError, UnitSink, WeavePlan,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;

pub use error::{CliError, CliResult};

/// Graft CLI application
#[derive(Debug, Parser)]
#[command(name = "graft")]
#[command(about = "Graft - inject interfaces into compiled units", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "GRAFT_CONFIG")]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// List the injections requested by the plugin units
    Plan {
        /// Folder scanned recursively for plugin units
        #[arg(short, long)]
        plugins: PathBuf,
    },

    /// Weave the requested injections into the target units
    Patch {
        /// Folder scanned recursively for plugin units
        #[arg(short, long)]
        plugins: PathBuf,

        /// Folder holding the target units
        #[arg(short, long)]
        targets: PathBuf,

        /// Folder receiving the patched units
        #[arg(short, long)]
        out: PathBuf,

        /// Also dump every patched unit into this folder
        #[arg(long)]
        devel: Option<String>,
    },

    /// Show configuration
    Config,
}

/// One planned injection, as printed by `graft plan`.
#[derive(Debug, Serialize)]
struct PlannedJob<'a> {
    target_unit: &'a str,
    target_type: &'a str,
    interface: String,
    source_unit: &'a str,
    strategy: ErrorStrategy,
}

fn planned_jobs(plan: &WeavePlan) -> Vec<PlannedJob<'_>> {
    plan.target_units()
        .filter_map(|unit| plan.jobs_for(unit).map(|types| (unit, types)))
        .flat_map(|(unit, types)| {
            types.values().flatten().map(move |job| PlannedJob {
                target_unit: unit,
                target_type: &job.target_type,
                interface: job.interface.full_name(),
                source_unit: &job.interface.scope,
                strategy: job.strategy,
            })
        })
        .collect()
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Load config
    let mut config = PreloaderConfig::load(cli.config.as_deref()).map_err(PreloaderError::from)?;

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    // A subscriber may already be installed when embedded or under test.
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .try_init();

    // Execute command
    match cli.command {
        Commands::Plan { plugins } => {
            let mut preloader = Preloader::new(config);
            let plan = preloader.plan(&JsonUnitStore::new(plugins));
            println!("{}", serde_json::to_string_pretty(&planned_jobs(plan))?);
            Ok(())
        }
        Commands::Patch {
            plugins,
            targets,
            out,
            devel,
        } => {
            if let Some(path) = devel {
                config.devel.enabled = true;
                config.devel.output_path = path;
            }
            patch(config, plugins, targets, out)
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn patch(config: PreloaderConfig, plugins: PathBuf, targets: PathBuf, out: PathBuf) -> CliResult<()> {
    let plugins = JsonUnitStore::new(plugins);
    let targets = JsonUnitStore::new(targets);
    let out = JsonUnitStore::new(out);

    let mut preloader = Preloader::new(config);
    preloader.plan(&plugins);
    let patched = preloader.run(&targets, &out)?;
    let report = preloader.finish();

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_success() {
        return Err(CliError::BatchFailed(report.batch_id.to_string()));
    }

    for unit in &patched {
        let path = out.path_for(&unit.name);
        out.persist(unit, &path).map_err(PreloaderError::from)?;
        info!(unit = %unit.name, path = %path.display(), "Wrote patched unit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_model::{Annotation, MethodDef, TypeDef, TypeRef, Unit};
    use std::path::Path;

    fn store(root: &Path, unit: Unit) -> JsonUnitStore {
        let store = JsonUnitStore::new(root);
        store.persist(&unit, &store.path_for(&unit.name)).unwrap();
        store
    }

    fn plugin() -> Unit {
        Unit::new("TauntMod.dll")
            .with_annotation(Annotation::requires_injections())
            .with_type(
                TypeDef::interface("TauntMod", "ITaunt")
                    .with_annotation(Annotation::inject_interface("Game.Player", Some("Game.dll")))
                    .with_method(MethodDef::interface_slot("Taunt", TypeRef::void())),
            )
    }

    fn arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_parse_patch() {
        let cli = Cli::try_parse_from([
            "graft", "-v", "patch", "-p", "mods", "-t", "managed", "-o", "out", "--devel", "dump",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Patch {
                plugins,
                targets,
                out,
                devel,
            } => {
                assert_eq!(plugins, PathBuf::from("mods"));
                assert_eq!(targets, PathBuf::from("managed"));
                assert_eq!(out, PathBuf::from("out"));
                assert_eq!(devel.as_deref(), Some("dump"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_patch_requires_targets() {
        assert!(Cli::try_parse_from(["graft", "patch", "-p", "mods", "-o", "out"]).is_err());
    }

    #[test]
    fn test_planned_jobs() {
        let mut preloader = Preloader::new(PreloaderConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let plugins = store(dir.path(), plugin());
        let jobs = planned_jobs(preloader.plan(&plugins));

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].target_unit, "Game.dll");
        assert_eq!(jobs[0].target_type, "Game.Player");
        assert_eq!(jobs[0].interface, "TauntMod.ITaunt");
        assert_eq!(jobs[0].source_unit, "TauntMod.dll");
    }

    #[test]
    fn test_patch_writes_units() {
        let dir = tempfile::tempdir().unwrap();
        let plugins = dir.path().join("plugins");
        let targets = dir.path().join("managed");
        let out = dir.path().join("out");
        store(&plugins, plugin());
        store(&targets, Unit::new("Game.dll").with_type(TypeDef::class("Game", "Player")));

        run_with_args([
            "graft".to_string(),
            "patch".into(),
            "--plugins".into(),
            arg(&plugins),
            "--targets".into(),
            arg(&targets),
            "--out".into(),
            arg(&out),
        ])
        .unwrap();

        let unit = JsonUnitStore::read(&out.join("Game.dll.json")).unwrap();
        assert!(unit.type_def("Game.Player").unwrap().method("Taunt").is_some());
    }

    #[test]
    fn test_failed_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let plugins = dir.path().join("plugins");
        let targets = dir.path().join("managed");
        let out = dir.path().join("out");
        store(&plugins, plugin());
        store(
            &targets,
            Unit::new("Game.dll").with_type(
                TypeDef::class("Game", "Player")
                    .with_method(MethodDef::interface_slot("Taunt", TypeRef::void())),
            ),
        );

        let err = run_with_args([
            "graft".to_string(),
            "patch".into(),
            "-p".into(),
            arg(&plugins),
            "-t".into(),
            arg(&targets),
            "-o".into(),
            arg(&out),
        ])
        .unwrap_err();

        assert!(matches!(err, CliError::BatchFailed(_)));
        assert!(!out.join("Game.dll.json").exists());
    }
}
