//! Behavioural tests: woven members are executed with the reference
//! interpreter and checked against the interface contract.

use graft_model::eval::{DelegateHost, Fault, HandlerId, Instance, Interpreter, Value};
use graft_model::{
    Annotation, AnnotationArg, ErrorStrategy, EventDef, Instruction, Member, MethodAttributes,
    MethodBody, MethodDef, PropertyDef, TypeDef, TypeRef, Unit,
};
use graft_weaver::{
    BatchContext, InjectionJob, JobOutcome, JobsByType, PolicyResolver, WeaveError,
    WeavingEngine,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Records every handler invocation and answers with the handler id.
#[derive(Default)]
struct Recorder {
    calls: Vec<(HandlerId, Vec<Value>)>,
}

impl DelegateHost for Recorder {
    fn invoke(&mut self, handler: HandlerId, args: &[Value]) -> Value {
        self.calls.push((handler, args.to_vec()));
        Value::Int(i64::from(handler.0))
    }
}

fn handler_type() -> TypeRef {
    TypeRef::new("Mod.dll", "Mod", "HitHandler")
}

fn tooltip() -> Annotation {
    Annotation::new(TypeRef::new("Mod.dll", "Mod.UI", "TooltipAttribute"))
        .with_arg(AnnotationArg::string("Woven"))
}

/// Interface with one property, one event and two plain methods.
fn combatant() -> graft_model::InterfaceDefinition {
    let mut health = PropertyDef::new("Health", TypeRef::int32());
    health.getter = Some("get_Health".into());
    health.setter = Some("set_Health".into());

    let mut hit = EventDef::new("Hit", handler_type());
    hit.add = Some("add_Hit".into());
    hit.remove = Some("remove_Hit".into());
    hit.raise = Some("raise_Hit".into());

    graft_model::InterfaceDefinition::new(
        "Mod.dll",
        TypeDef::interface("Mod", "ICombatant")
            .with_method(MethodDef::interface_slot("get_Health", TypeRef::int32()))
            .with_method(
                MethodDef::interface_slot("set_Health", TypeRef::void())
                    .with_param("value", TypeRef::int32()),
            )
            .with_method(
                MethodDef::interface_slot("add_Hit", TypeRef::void())
                    .with_param("value", handler_type()),
            )
            .with_method(
                MethodDef::interface_slot("remove_Hit", TypeRef::void())
                    .with_param("value", handler_type()),
            )
            .with_method(
                MethodDef::interface_slot("raise_Hit", TypeRef::int32())
                    .with_param("damage", TypeRef::int32()),
            )
            .with_method(MethodDef::interface_slot("Taunt", TypeRef::void()).with_annotation(tooltip()))
            .with_method(
                MethodDef::interface_slot("Score", TypeRef::int32())
                    .with_annotation(Annotation::handle_errors(ErrorStrategy::Ignore)),
            )
            .with_property(health)
            .with_event(hit),
    )
}

fn game_unit() -> Unit {
    Unit::new("Game.dll").with_type(TypeDef::class("Game", "Player"))
}

fn woven() -> Unit {
    let mut unit = game_unit();
    let job = InjectionJob::new("Game.Player", combatant(), ErrorStrategy::Terminate);
    WeavingEngine::new().implement_in(&mut unit, &job).unwrap();
    unit
}

fn method<'a>(unit: &'a Unit, name: &str) -> &'a MethodDef {
    unit.type_def("Game.Player").unwrap().method(name).unwrap()
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

#[test]
fn void_stub_returns_and_keeps_annotations() {
    let unit = woven();
    let taunt = method(&unit, "Taunt");

    assert_eq!(taunt.body, Some(MethodBody::empty()));
    assert_eq!(taunt.attributes, MethodAttributes::INTERFACE_METHOD);
    assert!(taunt.annotations.contains(&tooltip()));
    assert!(taunt.is_injected());

    let mut host = Recorder::default();
    let result = Interpreter::new(&mut host).call(taunt, &mut Instance::new(), &[]);
    assert_eq!(result, Ok(Value::Null));
}

#[test]
fn non_void_stub_faults_not_implemented() {
    let unit = woven();
    let score = method(&unit, "Score");

    assert!(!score.annotations.iter().any(|a| a.is(graft_model::annotation::HANDLE_ERRORS)));

    let mut host = Recorder::default();
    let result = Interpreter::new(&mut host).call(score, &mut Instance::new(), &[]);
    assert_eq!(result, Err(Fault::NotImplemented("This is a Stub".into())));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn property_set_then_get_round_trips() {
    let unit = woven();
    let player = unit.type_def("Game.Player").unwrap();

    let backing: Vec<_> = player
        .fields
        .iter()
        .filter(|f| f.name == "<Health>k__BackingField")
        .collect();
    assert_eq!(backing.len(), 1);
    assert_eq!(player.properties.len(), 1);

    let mut host = Recorder::default();
    let mut this = Instance::new();
    let mut interp = Interpreter::new(&mut host);

    assert_eq!(interp.call(method(&unit, "get_Health"), &mut this, &[]), Ok(Value::Null));
    interp
        .call(method(&unit, "set_Health"), &mut this, &[Value::Int(75)])
        .unwrap();
    assert_eq!(interp.call(method(&unit, "get_Health"), &mut this, &[]), Ok(Value::Int(75)));
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[test]
fn add_then_remove_leaves_no_handler() {
    let unit = woven();
    let mut host = Recorder::default();
    let mut this = Instance::new();
    let mut interp = Interpreter::new(&mut host);

    interp.call(method(&unit, "add_Hit"), &mut this, &[Value::handler(1)]).unwrap();
    assert_eq!(this.get("Hit"), Value::handler(1));
    interp.call(method(&unit, "remove_Hit"), &mut this, &[Value::handler(1)]).unwrap();
    assert_eq!(this.get("Hit"), Value::Null);
}

#[test]
fn raise_invokes_every_handler_once() {
    let unit = woven();
    let mut host = Recorder::default();
    let mut this = Instance::new();

    let result = {
        let mut interp = Interpreter::new(&mut host);
        for id in 1..=3 {
            interp.call(method(&unit, "add_Hit"), &mut this, &[Value::handler(id)]).unwrap();
        }
        interp.call(method(&unit, "raise_Hit"), &mut this, &[Value::Int(12)])
    };

    // Last handler's result is passed through.
    assert_eq!(result, Ok(Value::Int(3)));
    let invoked: Vec<u32> = host.calls.iter().map(|(h, _)| h.0).collect();
    assert_eq!(invoked, vec![1, 2, 3]);
    assert!(host.calls.iter().all(|(_, args)| args == &[Value::Int(12)]));
}

#[test]
fn raise_without_handlers_is_a_null_reference() {
    let unit = woven();
    let mut host = Recorder::default();
    let result = Interpreter::new(&mut host).call(
        method(&unit, "raise_Hit"),
        &mut Instance::new(),
        &[Value::Int(1)],
    );
    assert!(matches!(result, Err(Fault::NullReference(_))));
}

// ---------------------------------------------------------------------------
// Collisions and policy
// ---------------------------------------------------------------------------

#[test]
fn collision_with_ignore_coerces_without_duplicates() {
    let mut interface = combatant();
    interface
        .definition
        .annotations
        .push(Annotation::handle_errors(ErrorStrategy::Ignore));
    let existing = MethodDef::new("Taunt", MethodAttributes::PRIVATE, TypeRef::void())
        .with_body(MethodBody::new(vec![Instruction::Return]));
    let mut unit = Unit::new("Game.dll").with_type(TypeDef::class("Game", "Player").with_method(existing));

    let mut ctx = BatchContext::new();
    let job = InjectionJob::new("Game.Player", interface, ErrorStrategy::Terminate);
    assert_eq!(WeavingEngine::new().weave(&mut ctx, &mut unit, &job), JobOutcome::Completed);
    assert!(!ctx.is_errored());

    let player = unit.type_def("Game.Player").unwrap();
    let taunts: Vec<_> = player.methods.iter().filter(|m| m.name == "Taunt").collect();
    assert_eq!(taunts.len(), 1);
    assert_eq!(taunts[0].attributes, MethodAttributes::INTERFACE_METHOD);
    assert!(!taunts[0].is_injected());
}

#[test]
fn collision_with_terminate_fails_the_batch() {
    let existing = MethodDef::new("Taunt", MethodAttributes::PUBLIC, TypeRef::void())
        .with_body(MethodBody::empty());
    let mut unit = Unit::new("Game.dll").with_type(TypeDef::class("Game", "Player").with_method(existing));

    let mut ctx = BatchContext::new();
    let job = InjectionJob::new("Game.Player", combatant(), ErrorStrategy::Terminate);
    assert_eq!(WeavingEngine::new().weave(&mut ctx, &mut unit, &job), JobOutcome::Aborted);
    assert!(ctx.is_errored());
    assert_eq!(WeavingEngine::new().weave(&mut ctx, &mut unit, &job), JobOutcome::Skipped);
}

#[test]
fn member_override_wins_over_terminate() {
    // Score is marked Ignore; a hand-written Score must not abort the job.
    let existing = MethodDef::new("Score", MethodAttributes::PUBLIC, TypeRef::int32())
        .with_body(MethodBody::not_implemented("custom"));
    let mut unit = Unit::new("Game.dll").with_type(TypeDef::class("Game", "Player").with_method(existing));

    let job = InjectionJob::new("Game.Player", combatant(), ErrorStrategy::Terminate);
    WeavingEngine::new().implement_in(&mut unit, &job).unwrap();
    assert_eq!(
        method(&unit, "Score").body,
        Some(MethodBody::not_implemented("custom"))
    );
}

#[test]
fn member_override_can_tighten_a_lenient_interface() {
    let mut interface = combatant();
    interface
        .definition
        .annotations
        .push(Annotation::handle_errors(ErrorStrategy::LogWarning));
    interface.definition.methods[5]
        .annotations
        .push(Annotation::handle_errors(ErrorStrategy::Terminate));
    let existing = MethodDef::new("Taunt", MethodAttributes::PUBLIC, TypeRef::void())
        .with_body(MethodBody::empty());
    let mut unit = Unit::new("Game.dll").with_type(TypeDef::class("Game", "Player").with_method(existing));

    let job = InjectionJob::new("Game.Player", interface, ErrorStrategy::Ignore);
    let err = WeavingEngine::new().implement_in(&mut unit, &job).unwrap_err();
    assert!(matches!(err, WeaveError::Terminated(_)));
}

#[test]
fn levels_resolve_most_specific_first() {
    let unit_level = Some(ErrorStrategy::LogError);
    let request = None;
    let interface = Some(ErrorStrategy::Ignore);
    let member = None;
    assert_eq!(
        PolicyResolver::effective(&[unit_level, request, interface, member]),
        ErrorStrategy::Ignore
    );
}

// ---------------------------------------------------------------------------
// Idempotence and shared members
// ---------------------------------------------------------------------------

#[test]
fn weaving_twice_is_idempotent() {
    let mut unit = woven();
    let once = unit.clone();

    let job = InjectionJob::new("Game.Player", combatant(), ErrorStrategy::Terminate);
    WeavingEngine::new().implement_in(&mut unit, &job).unwrap();
    assert_eq!(unit, once);
}

#[test]
fn two_interfaces_sharing_a_method_reuse_the_first_stub() {
    let first = graft_model::InterfaceDefinition::new(
        "Mod.dll",
        TypeDef::interface("Mod", "ITaunting").with_method(MethodDef::interface_slot("Taunt", TypeRef::void())),
    );
    let second = graft_model::InterfaceDefinition::new(
        "Other.dll",
        TypeDef::interface("Other", "ILoud").with_method(MethodDef::interface_slot("Taunt", TypeRef::void())),
    );

    let mut jobs = JobsByType::new();
    jobs.insert(
        "Game.Player".into(),
        vec![
            InjectionJob::new("Game.Player", first, ErrorStrategy::Terminate),
            InjectionJob::new("Game.Player", second, ErrorStrategy::Terminate),
        ],
    );

    let mut ctx = BatchContext::new();
    let mut unit = game_unit();
    let outcomes = WeavingEngine::new().weave_unit(&mut ctx, &mut unit, &jobs);

    assert_eq!(outcomes, vec![JobOutcome::Completed, JobOutcome::Completed]);
    let player = unit.type_def("Game.Player").unwrap();
    assert_eq!(player.methods.len(), 1);
    assert_eq!(player.interfaces.len(), 2);
}
