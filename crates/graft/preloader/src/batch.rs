//! Batch lifecycle: plan, patch every target unit, finish with a report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use graft_model::Unit;
use graft_weaver::{BatchContext, BatchId, BatchStats, JobOutcome, WeavingEngine};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::PreloaderConfig;
use crate::error::{HostError, PreloaderResult};
use crate::host::{UnitResolver, UnitSink, UnitSource};
use crate::plan::{Planner, WeavePlan};

/// Logged by [`Preloader::finish`] when the batch failed.
pub const FAILURE_BANNER: &str = r"
//////////////////////////////////////////////////////////////////
\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\
An error occurred while injecting code,
the patched units are most likely broken and should not be loaded!
//////////////////////////////////////////////////////////////////
\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\\";

/// Summary of one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Plugin units that requested injections.
    pub participants: Vec<String>,
    /// Target units that were patched.
    pub patched: Vec<String>,
    pub jobs: BatchStats,
    pub errored: bool,
}

impl BatchReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn is_success(&self) -> bool {
        !self.errored
    }
}

/// Drives one weaving batch.
///
/// Scanning, patching and finishing follow the host loader's phases:
/// [`plan`](Self::plan) once, [`patch`](Self::patch) per target unit,
/// [`finish`](Self::finish) once. [`run`](Self::run) chains the middle
/// phase for hosts that resolve units by name.
pub struct Preloader {
    config: PreloaderConfig,
    planner: Planner,
    engine: WeavingEngine,
    ctx: BatchContext,
    plan: WeavePlan,
    patched: Vec<String>,
}

impl Preloader {
    pub fn new(config: PreloaderConfig) -> Self {
        info!("Preloader started");
        let planner = Planner::new(config.default_target_unit.clone());
        Self {
            config,
            planner,
            engine: WeavingEngine::new(),
            ctx: BatchContext::new(),
            plan: WeavePlan::new(),
            patched: Vec::new(),
        }
    }

    pub fn config(&self) -> &PreloaderConfig {
        &self.config
    }

    pub fn weave_plan(&self) -> &WeavePlan {
        &self.plan
    }

    pub fn is_errored(&self) -> bool {
        self.ctx.is_errored()
    }

    /// Scan every candidate unit from `source`.
    ///
    /// Malformed candidates are skipped with a warning. Any other host
    /// error, or a malformed injection annotation, fails the batch and
    /// stops scanning.
    pub fn plan<S: UnitSource + ?Sized>(&mut self, source: &S) -> &WeavePlan {
        for candidate in source.enumerate() {
            let unit = match candidate {
                Ok(unit) => unit,
                Err(err) if err.is_skippable() => {
                    warn!(error = %err, "Skipping candidate, not a valid unit");
                    continue;
                }
                Err(err) => {
                    error!(error = %err, "Exception reading candidate units");
                    self.ctx.fail();
                    break;
                }
            };

            if let Err(err) = self.planner.scan(&mut self.plan, &unit) {
                error!(unit = %unit.name, error = %err, "Exception parsing unit");
                self.ctx.fail();
                break;
            }
        }

        info!(
            participants = self.plan.participants().len(),
            jobs = self.plan.job_count(),
            "Found {} units that require injections",
            self.plan.participants().len()
        );
        &self.plan
    }

    /// Units to patch, in discovery order. Empty once the batch failed.
    pub fn target_units(&self) -> Vec<String> {
        if self.ctx.is_errored() {
            return Vec::new();
        }
        self.plan.target_units().map(str::to_string).collect()
    }

    /// Weave every planned job into `unit`.
    pub fn patch(&mut self, unit: &mut Unit) -> Vec<JobOutcome> {
        if self.ctx.is_errored() {
            debug!(unit = %unit.name, "Batch already failed, not patching");
            return Vec::new();
        }
        let Some(jobs) = self.plan.jobs_for(&unit.name) else {
            debug!(unit = %unit.name, "No injections planned");
            return Vec::new();
        };

        let outcomes = self.engine.weave_unit(&mut self.ctx, unit, jobs);
        self.patched.push(unit.name.clone());
        outcomes
    }

    /// Write `unit` to the development output location when enabled.
    pub fn dump<K: UnitSink + ?Sized>(&self, unit: &Unit, sink: &K) -> PreloaderResult<Option<PathBuf>> {
        if !self.config.devel.enabled {
            return Ok(None);
        }
        let path = self.config.devel.output_file(&unit.name);
        warn!(path = %path.display(), "Saving modified unit");
        sink.persist(unit, &path)?;
        Ok(Some(path))
    }

    /// Resolve, patch and dump every target unit; returns the patched units.
    ///
    /// Target units the resolver does not know are skipped with a warning.
    pub fn run<R, K>(&mut self, resolver: &R, sink: &K) -> PreloaderResult<Vec<Unit>>
    where
        R: UnitResolver + ?Sized,
        K: UnitSink + ?Sized,
    {
        let mut patched = Vec::new();
        for unit_name in self.target_units() {
            if self.ctx.is_errored() {
                break;
            }
            let mut unit = match resolver.resolve(&unit_name) {
                Ok(unit) => unit,
                Err(HostError::UnitNotFound(name)) => {
                    warn!(unit = %name, "Target unit not found, skipping");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            info!(unit = %unit_name, "Patching");
            self.patch(&mut unit);
            self.dump(&unit, sink)?;
            patched.push(unit);
        }
        Ok(patched)
    }

    /// End the batch.
    pub fn finish(self) -> BatchReport {
        if self.ctx.is_errored() {
            warn!("{}", FAILURE_BANNER);
        }
        info!(batch = %self.ctx.id(), "Preloader finished");

        BatchReport {
            batch_id: self.ctx.id(),
            started_at: self.ctx.started_at(),
            finished_at: Utc::now(),
            participants: self.plan.participants().to_vec(),
            patched: self.patched,
            jobs: self.ctx.stats().clone(),
            errored: self.ctx.is_errored(),
        }
    }
}
