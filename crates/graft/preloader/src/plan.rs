//! Planning: turning plugin unit annotations into injection jobs.

use graft_model::annotation::{self, find_strategy, INJECT_INTERFACE};
use graft_model::{InterfaceDefinition, KnownAnnotation, ModelResult, Unit};
use graft_weaver::{InjectionJob, JobsByType};
use indexmap::IndexMap;
use tracing::debug;

/// Jobs grouped by target unit, then by target type, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct WeavePlan {
    units: IndexMap<String, JobsByType>,
    participants: Vec<String>,
}

impl WeavePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the units that receive injections.
    pub fn target_units(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn jobs_for(&self, unit_name: &str) -> Option<&JobsByType> {
        self.units.get(unit_name)
    }

    /// Plugin units that requested injections.
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn job_count(&self) -> usize {
        self.units
            .values()
            .flat_map(|types| types.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn push(&mut self, unit_name: String, job: InjectionJob) {
        self.units
            .entry(unit_name)
            .or_default()
            .entry(job.target_type.clone())
            .or_default()
            .push(job);
    }
}

/// Scans plugin units for injection requests.
#[derive(Debug, Clone)]
pub struct Planner {
    default_target_unit: String,
}

impl Planner {
    pub fn new(default_target_unit: impl Into<String>) -> Self {
        Self {
            default_target_unit: default_target_unit.into(),
        }
    }

    /// Add the requests of `unit` to `plan`.
    ///
    /// Returns `Ok(false)` for units that do not carry the
    /// requires-injections marker. The unit-level strategy (terminate when
    /// undeclared) is inherited by every job the unit produces.
    pub fn scan(&self, plan: &mut WeavePlan, unit: &Unit) -> ModelResult<bool> {
        if !annotation::requires_injections(&unit.annotations) {
            return Ok(false);
        }
        debug!(unit = %unit.name, "Unit wants to inject something");

        let strategy = find_strategy(&unit.annotations)?.unwrap_or_default();
        plan.participants.push(unit.name.clone());

        for ty in &unit.types {
            let requests: Vec<_> = ty
                .annotations
                .iter()
                .filter(|a| a.is(INJECT_INTERFACE))
                .collect();
            if requests.is_empty() {
                continue;
            }
            debug!(interface = %ty.full_name(), requests = requests.len(), "Found interface template");

            for request in requests {
                if let Some(KnownAnnotation::InjectInterface {
                    type_name,
                    unit_name,
                }) = KnownAnnotation::decode(request)?
                {
                    let target_unit = unit_name.unwrap_or_else(|| self.default_target_unit.clone());
                    let interface = InterfaceDefinition::new(unit.name.clone(), ty.clone());
                    plan.push(target_unit, InjectionJob::new(type_name, interface, strategy));
                }
            }
        }
        Ok(true)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(graft_model::annotation::DEFAULT_TARGET_UNIT)
    }
}
