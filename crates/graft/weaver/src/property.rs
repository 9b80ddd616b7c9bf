//! Auto-property synthesis.

use graft_model::{
    ErrorStrategy, FieldRef, Instruction, Member, MethodAttributes, MethodBody, MethodDef,
    PropertyDef, TypeRef,
};
use tracing::debug;

use crate::accessor::{resolve_method, BackingSlot};
use crate::engine::JobScope;
use crate::error::{Anomaly, WeaveResult};
use crate::guard::{CollisionGuard, MemberKey};
use crate::policy::PolicyResolver;
use crate::projector::AttributeProjector;

/// Synthesizes a backing field, accessors and the property entry for
/// each abstract interface property.
pub struct PropertySynthesizer;

impl PropertySynthesizer {
    /// Implement `property` on the scope's target.
    ///
    /// Returns whether any accessor was synthesized. Properties whose
    /// accessors all carry default bodies are left to the interface.
    pub fn synthesize(scope: &mut JobScope<'_>, property: &PropertyDef) -> WeaveResult<bool> {
        if !scope.visited.claim(MemberKey::property(&property.name)) {
            return Ok(false);
        }

        let interface = scope.interface;
        let getter = interface
            .accessor(property.getter.as_deref())
            .filter(|m| m.is_abstract());
        let setter = interface
            .accessor(property.setter.as_deref())
            .filter(|m| m.is_abstract());
        if getter.is_none() && setter.is_none() {
            debug!(property = %property.name, "Property has default accessors");
            return Ok(false);
        }

        let strategy = PolicyResolver::resolve(scope.strategy, &property.annotations)?;
        debug!(
            property = %property.name,
            target = %scope.target.full_name(),
            ?strategy,
            "Adding property"
        );

        let property_type = scope.target.import(&property.property_type);
        let mut backing = BackingSlot::new(property.backing_field_name(), property_type.clone());
        let mut entry = PropertyDef::new(property.name.clone(), property_type.clone());
        let mut synthesized = false;

        if let Some(source) = getter.filter(|m| scope.visited.claim(MemberKey::method(&m.name))) {
            let name = property.getter_name();
            let resolution = resolve_method(
                scope,
                &name,
                source,
                MethodAttributes::INTERFACE_ACCESSOR,
                strategy,
                |scope| {
                    let field = backing.field_ref(scope, strategy)?;
                    Ok(getter_method(&name, property_type.clone(), field))
                },
            )?;
            synthesized |= resolution.is_synthesized();
            entry.getter = Some(name);
        }

        if let Some(source) = setter.filter(|m| scope.visited.claim(MemberKey::method(&m.name))) {
            let name = property.setter_name();
            let resolution = resolve_method(
                scope,
                &name,
                source,
                MethodAttributes::INTERFACE_ACCESSOR,
                strategy,
                |scope| {
                    let field = backing.field_ref(scope, strategy)?;
                    Ok(setter_method(&name, property_type.clone(), field))
                },
            )?;
            synthesized |= resolution.is_synthesized();
            entry.setter = Some(name);
        }

        if synthesized {
            Self::register(scope, property, entry, strategy)?;
        }
        Ok(synthesized)
    }

    fn register(
        scope: &mut JobScope<'_>,
        source: &PropertyDef,
        mut entry: PropertyDef,
        strategy: ErrorStrategy,
    ) -> WeaveResult<()> {
        match scope.target.ty.property(&entry.name).map(|p| p.is_injected()) {
            Some(true) => Ok(()),
            Some(false) => {
                let type_name = scope.target.full_name();
                PolicyResolver::handle(
                    Anomaly::NameCollision(format!(
                        "Property '{}' is already defined in '{type_name}'",
                        entry.name
                    )),
                    strategy,
                )
            }
            None => {
                let (unit_name, imports, ty) = scope.target.parts();
                AttributeProjector::mark_injected(unit_name, imports, &mut entry.annotations);
                AttributeProjector::project(unit_name, imports, &source.annotations, &mut entry.annotations);
                CollisionGuard::append_unique(&mut ty.properties, entry);
                Ok(())
            }
        }
    }
}

fn getter_method(name: &str, property_type: TypeRef, field: FieldRef) -> MethodDef {
    MethodDef::new(name, MethodAttributes::INTERFACE_ACCESSOR, property_type).with_body(
        MethodBody::new(vec![
            Instruction::LoadThis,
            Instruction::LoadField { field },
            Instruction::Return,
        ]),
    )
}

fn setter_method(name: &str, property_type: TypeRef, field: FieldRef) -> MethodDef {
    MethodDef::new(name, MethodAttributes::INTERFACE_ACCESSOR, TypeRef::void())
        .with_param("value", property_type)
        .with_body(MethodBody::new(vec![
            Instruction::LoadThis,
            Instruction::LoadArg { index: 1 },
            Instruction::StoreField { field },
            Instruction::Return,
        ]))
}
