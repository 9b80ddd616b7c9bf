//! Field-like event synthesis.

use graft_model::{
    ErrorStrategy, EventDef, FieldRef, Instruction, Member, MethodAttributes, MethodBody,
    MethodDef, TypeRef,
};
use tracing::debug;

use crate::accessor::{resolve_method, BackingSlot};
use crate::engine::JobScope;
use crate::error::{Anomaly, WeaveError, WeaveResult};
use crate::guard::{CollisionGuard, MemberKey};
use crate::policy::PolicyResolver;
use crate::projector::AttributeProjector;

/// Synthesizes the handler field and the add, remove and raise accessors
/// for each interface event.
pub struct EventSynthesizer;

impl EventSynthesizer {
    /// Implement `event` on the scope's target.
    ///
    /// The handler field is named after the event. Returns whether any
    /// accessor was synthesized.
    pub fn synthesize(scope: &mut JobScope<'_>, event: &EventDef) -> WeaveResult<bool> {
        if !scope.visited.claim(MemberKey::event(&event.name)) {
            return Ok(false);
        }

        let interface = scope.interface;
        let add = interface.accessor(event.add.as_deref()).filter(|m| m.is_abstract());
        let remove = interface.accessor(event.remove.as_deref()).filter(|m| m.is_abstract());
        let raise = interface.accessor(event.raise.as_deref()).filter(|m| m.is_abstract());
        if add.is_none() && remove.is_none() && raise.is_none() {
            debug!(event = %event.name, "Event has default accessors");
            return Ok(false);
        }

        let strategy = PolicyResolver::resolve(scope.strategy, &event.annotations)?;
        debug!(
            event = %event.name,
            target = %scope.target.full_name(),
            ?strategy,
            "Adding event"
        );

        let event_type = scope.target.import(&event.event_type);
        let mut backing = BackingSlot::new(event.name.clone(), event_type.clone());
        let mut entry = EventDef::new(event.name.clone(), event_type.clone());
        let mut synthesized = false;

        if let Some(source) = add.filter(|m| scope.visited.claim(MemberKey::method(&m.name))) {
            let name = event.add_name();
            let resolution = resolve_method(
                scope,
                &name,
                source,
                MethodAttributes::INTERFACE_ACCESSOR,
                strategy,
                |scope| {
                    let field = backing.field_ref(scope, strategy)?;
                    Ok(subscription_method(&name, &event_type, field, Instruction::CombineDelegates))
                },
            )?;
            synthesized |= resolution.is_synthesized();
            entry.add = Some(name);
        }

        if let Some(source) = remove.filter(|m| scope.visited.claim(MemberKey::method(&m.name))) {
            let name = event.remove_name();
            let resolution = resolve_method(
                scope,
                &name,
                source,
                MethodAttributes::INTERFACE_ACCESSOR,
                strategy,
                |scope| {
                    let field = backing.field_ref(scope, strategy)?;
                    Ok(subscription_method(&name, &event_type, field, Instruction::RemoveDelegate))
                },
            )?;
            synthesized |= resolution.is_synthesized();
            entry.remove = Some(name);
        }

        if let Some(source) = raise.filter(|m| scope.visited.claim(MemberKey::method(&m.name))) {
            let name = event.raise_name();
            let resolution = resolve_method(
                scope,
                &name,
                source,
                MethodAttributes::INTERFACE_ACCESSOR,
                strategy,
                |scope| {
                    let field = backing.field_ref(scope, strategy)?;
                    raise_method(scope, &name, &event_type, source, field)
                },
            )?;
            synthesized |= resolution.is_synthesized();
            entry.raise = Some(name);
        }

        if synthesized {
            Self::register(scope, event, entry, strategy)?;
        }
        Ok(synthesized)
    }

    fn register(
        scope: &mut JobScope<'_>,
        source: &EventDef,
        mut entry: EventDef,
        strategy: ErrorStrategy,
    ) -> WeaveResult<()> {
        match scope.target.ty.event(&entry.name).map(|e| e.is_injected()) {
            Some(true) => Ok(()),
            Some(false) => {
                let type_name = scope.target.full_name();
                PolicyResolver::handle(
                    Anomaly::NameCollision(format!(
                        "Event '{}' is already defined in '{type_name}'",
                        entry.name
                    )),
                    strategy,
                )
            }
            None => {
                let (unit_name, imports, ty) = scope.target.parts();
                AttributeProjector::mark_injected(unit_name, imports, &mut entry.annotations);
                AttributeProjector::project(unit_name, imports, &source.annotations, &mut entry.annotations);
                CollisionGuard::append_unique(&mut ty.events, entry);
                Ok(())
            }
        }
    }
}

/// `add_` / `remove_` accessor: `field = (T)op(field, value)`.
fn subscription_method(name: &str, event_type: &TypeRef, field: FieldRef, op: Instruction) -> MethodDef {
    MethodDef::new(name, MethodAttributes::INTERFACE_ACCESSOR, TypeRef::void())
        .with_param("value", event_type.clone())
        .with_body(MethodBody::new(vec![
            Instruction::LoadThis,
            Instruction::LoadThis,
            Instruction::LoadField {
                field: field.clone(),
            },
            Instruction::LoadArg { index: 1 },
            op,
            Instruction::CastClass {
                target: event_type.clone(),
            },
            Instruction::StoreField { field },
            Instruction::Return,
        ]))
}

/// `raise_` accessor: invokes the handler list with the raise arguments.
///
/// The signature follows the interface raise method; a non-void return
/// passes the last handler's result through.
fn raise_method(
    scope: &mut JobScope<'_>,
    name: &str,
    event_type: &TypeRef,
    source: &MethodDef,
    field: FieldRef,
) -> WeaveResult<MethodDef> {
    let arity = u16::try_from(source.params.len()).map_err(|_| WeaveError::TooManyParameters {
        method: name.to_string(),
        count: source.params.len(),
    })?;

    let return_type = scope.target.import(&source.return_type);
    let mut method = MethodDef::new(name, MethodAttributes::INTERFACE_ACCESSOR, return_type);
    for param in &source.params {
        let param_type = scope.target.import(&param.param_type);
        method = method.with_param(param.name.clone(), param_type);
    }

    let mut instructions = vec![Instruction::LoadThis, Instruction::LoadField { field }];
    instructions.extend((1..=arity).map(|index| Instruction::LoadArg { index }));
    instructions.push(Instruction::InvokeDelegate {
        delegate: event_type.clone(),
        arity,
        returns_value: !method.returns_void(),
    });
    instructions.push(Instruction::Return);
    Ok(method.with_body(MethodBody::new(instructions)))
}
