//! Weaving engine: per-job orchestration and the batch boundary.

use graft_model::{ErrorStrategy, InterfaceDefinition, Unit, WeaveTarget};
use tracing::{debug, error, info, warn};

use crate::context::{BatchContext, JobOutcome};
use crate::error::{Anomaly, WeaveError, WeaveResult};
use crate::event::EventSynthesizer;
use crate::guard::VisitedSet;
use crate::job::{InjectionJob, JobsByType};
use crate::method::MethodStubSynthesizer;
use crate::policy::PolicyResolver;
use crate::property::PropertySynthesizer;

// ── Job Scope ──────────────────────────────────────────────────────────

/// Everything a synthesizer needs while one job runs.
pub struct JobScope<'a> {
    pub target: WeaveTarget<'a>,
    pub interface: &'a InterfaceDefinition,
    pub visited: VisitedSet,
    /// Interface-level strategy; members may override it.
    pub strategy: ErrorStrategy,
}

impl<'a> JobScope<'a> {
    pub fn new(
        target: WeaveTarget<'a>,
        interface: &'a InterfaceDefinition,
        strategy: ErrorStrategy,
    ) -> Self {
        Self {
            target,
            interface,
            visited: VisitedSet::new(),
            strategy,
        }
    }
}

// ── Engine ─────────────────────────────────────────────────────────────

/// Runs injection jobs against units.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeavingEngine;

impl WeavingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Make `target` implement the job's interface.
    ///
    /// Properties, then events, then the remaining methods of the
    /// interface's own declaration are synthesized; base interfaces are
    /// not flattened. A terminate-strategy anomaly returns
    /// [`WeaveError::Terminated`] and leaves the type partially edited.
    pub fn implement(&self, target: WeaveTarget<'_>, job: &InjectionJob) -> WeaveResult<()> {
        let interface = &job.interface;
        let definition = &interface.definition;
        let strategy = PolicyResolver::resolve(job.strategy, &definition.annotations)?;

        if !definition.is_interface() {
            PolicyResolver::handle(
                Anomaly::StructuralMismatch(format!(
                    "Type '{}' is not an interface",
                    interface.full_name()
                )),
                strategy,
            )?;
        }
        if definition.is_generic() {
            PolicyResolver::handle(
                Anomaly::StructuralMismatch(format!(
                    "Type '{}' is a generic type",
                    interface.full_name()
                )),
                strategy,
            )?;
        }

        debug!(
            interface = %interface.full_name(),
            target = %target.full_name(),
            "Injecting interface"
        );

        let mut scope = JobScope::new(target, interface, strategy);
        let reference = scope.target.import(&interface.reference());

        for property in &definition.properties {
            PropertySynthesizer::synthesize(&mut scope, property)?;
        }
        for event in &definition.events {
            EventSynthesizer::synthesize(&mut scope, event)?;
        }
        for method in &definition.methods {
            MethodStubSynthesizer::synthesize(&mut scope, method)?;
        }

        if !scope.target.ty.implements(&reference) {
            scope.target.ty.interfaces.push(reference);
        }
        Ok(())
    }

    /// Run `job` against its target type in `unit`.
    pub fn implement_in(&self, unit: &mut Unit, job: &InjectionJob) -> WeaveResult<()> {
        let unit_name = unit.name.clone();
        let target = unit
            .target_mut(&job.target_type)
            .ok_or_else(|| WeaveError::UnknownTargetType {
                type_name: job.target_type.clone(),
                unit: unit_name,
            })?;
        self.implement(target, job)
    }

    /// Run one job at the batch boundary.
    ///
    /// Skips when the batch already failed. Any error fails the batch;
    /// nothing propagates past this call.
    pub fn weave(&self, ctx: &mut BatchContext, unit: &mut Unit, job: &InjectionJob) -> JobOutcome {
        let outcome = if ctx.is_errored() {
            debug!(
                interface = %job.interface.full_name(),
                target = %job.target_type,
                "Batch already failed, skipping job"
            );
            JobOutcome::Skipped
        } else {
            match self.implement_in(unit, job) {
                Ok(()) => JobOutcome::Completed,
                Err(WeaveError::Terminated(anomaly)) => {
                    error!(
                        batch = %ctx.id(),
                        interface = %job.interface.full_name(),
                        target = %job.target_type,
                        %anomaly,
                        "Weaving terminated"
                    );
                    JobOutcome::Aborted
                }
                Err(err) => {
                    error!(
                        batch = %ctx.id(),
                        interface = %job.interface.full_name(),
                        target = %job.target_type,
                        error = %err,
                        "Exception while weaving"
                    );
                    JobOutcome::Faulted
                }
            }
        };
        ctx.record(outcome);
        outcome
    }

    /// Run every planned job of `unit`.
    ///
    /// Types are visited in declaration order; each type's jobs run in
    /// plan order. Jobs naming a type the unit does not define are reported
    /// and left out.
    pub fn weave_unit(
        &self,
        ctx: &mut BatchContext,
        unit: &mut Unit,
        jobs_by_type: &JobsByType,
    ) -> Vec<JobOutcome> {
        info!(unit = %unit.name, types = jobs_by_type.len(), "Patching unit");

        for type_name in jobs_by_type.keys() {
            if unit.type_def(type_name).is_none() {
                warn!(unit = %unit.name, target = %type_name, "Target type not found in unit");
            }
        }

        let type_names: Vec<String> = unit.types.iter().map(|t| t.full_name()).collect();
        let mut outcomes = Vec::new();
        for type_name in &type_names {
            let Some(jobs) = jobs_by_type.get(type_name) else {
                continue;
            };
            for job in jobs {
                outcomes.push(self.weave(ctx, unit, job));
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_model::{
        Annotation, MethodDef, PropertyDef, TypeDef, TypeRef,
    };

    fn named_interface() -> InterfaceDefinition {
        let mut name = PropertyDef::new("Name", TypeRef::string());
        name.getter = Some("get_Name".into());
        InterfaceDefinition::new(
            "Mod.dll",
            TypeDef::interface("Mod", "INamed")
                .with_method(MethodDef::interface_slot("get_Name", TypeRef::string()))
                .with_method(MethodDef::interface_slot("Rename", TypeRef::void()).with_param("name", TypeRef::string()))
                .with_property(name),
        )
    }

    fn game_unit() -> Unit {
        Unit::new("Game.dll")
            .with_type(TypeDef::class("Game", "Player"))
            .with_type(TypeDef::class("Game", "Enemy"))
    }

    #[test]
    fn implement_registers_interface_once() {
        let engine = WeavingEngine::new();
        let job = InjectionJob::new("Game.Player", named_interface(), ErrorStrategy::Terminate);
        let mut unit = game_unit();

        engine.implement_in(&mut unit, &job).unwrap();
        engine.implement_in(&mut unit, &job).unwrap();

        let player = unit.type_def("Game.Player").unwrap();
        assert_eq!(player.interfaces, vec![TypeRef::new("Mod.dll", "Mod", "INamed")]);
        assert!(player.method("get_Name").is_some());
        assert!(player.method("Rename").is_some());
        assert!(unit.imports.contains(&TypeRef::new("Mod.dll", "Mod", "INamed")));
    }

    #[test]
    fn accessors_are_not_stubbed_twice() {
        let engine = WeavingEngine::new();
        let job = InjectionJob::new("Game.Player", named_interface(), ErrorStrategy::Terminate);
        let mut unit = game_unit();

        engine.implement_in(&mut unit, &job).unwrap();

        let player = unit.type_def("Game.Player").unwrap();
        let getter = player.method("get_Name").unwrap();
        assert_eq!(getter.body.as_ref().unwrap().touched_fields().len(), 1);
        assert_eq!(player.methods.len(), 2);
    }

    #[test]
    fn generic_interface_terminates_by_default() {
        let mut interface = named_interface();
        interface.definition = interface.definition.with_generic_param("T");
        let job = InjectionJob::new("Game.Player", interface, ErrorStrategy::Terminate);
        let mut unit = game_unit();

        let err = WeavingEngine::new().implement_in(&mut unit, &job).unwrap_err();
        assert!(matches!(err, WeaveError::Terminated(Anomaly::StructuralMismatch(_))));
    }

    #[test]
    fn interface_override_relaxes_shape_check() {
        let mut interface = named_interface();
        interface.definition = TypeDef::class("Mod", "NotAnInterface")
            .with_annotation(Annotation::handle_errors(ErrorStrategy::Ignore));
        let job = InjectionJob::new("Game.Player", interface, ErrorStrategy::Terminate);
        let mut unit = game_unit();

        WeavingEngine::new().implement_in(&mut unit, &job).unwrap();
        assert_eq!(unit.type_def("Game.Player").unwrap().interfaces.len(), 1);
    }

    #[test]
    fn unknown_target_type_is_an_error() {
        let job = InjectionJob::new("Game.Missing", named_interface(), ErrorStrategy::Terminate);
        let mut unit = game_unit();

        let err = WeavingEngine::new().implement_in(&mut unit, &job).unwrap_err();
        assert!(matches!(err, WeaveError::UnknownTargetType { .. }));
    }

    #[test]
    fn termination_skips_remaining_jobs() {
        let engine = WeavingEngine::new();
        let mut broken = named_interface();
        broken.definition = broken.definition.with_generic_param("T");

        let mut jobs = JobsByType::new();
        jobs.insert(
            "Game.Enemy".into(),
            vec![InjectionJob::new("Game.Enemy", named_interface(), ErrorStrategy::Terminate)],
        );
        jobs.insert(
            "Game.Player".into(),
            vec![InjectionJob::new("Game.Player", broken, ErrorStrategy::Terminate)],
        );

        let mut ctx = BatchContext::new();
        let mut unit = game_unit();
        let outcomes = engine.weave_unit(&mut ctx, &mut unit, &jobs);

        // Declaration order: Player first, then Enemy.
        assert_eq!(outcomes, vec![JobOutcome::Aborted, JobOutcome::Skipped]);
        assert!(ctx.is_errored());
        assert!(unit.type_def("Game.Enemy").unwrap().methods.is_empty());
    }

    #[test]
    fn malformed_annotation_faults_the_batch() {
        let mut interface = named_interface();
        interface.definition.annotations.push(
            Annotation::handle_errors(ErrorStrategy::Ignore),
        );
        if let Some(graft_model::ArgValue::Enum(value)) =
            interface.definition.annotations[0].args.get_mut(0).map(|a| &mut a.value)
        {
            *value = 42;
        }
        let job = InjectionJob::new("Game.Player", interface, ErrorStrategy::Terminate);

        let mut ctx = BatchContext::new();
        let outcome = WeavingEngine::new().weave(&mut ctx, &mut game_unit(), &job);
        assert_eq!(outcome, JobOutcome::Faulted);
        assert!(ctx.is_errored());
    }
}
