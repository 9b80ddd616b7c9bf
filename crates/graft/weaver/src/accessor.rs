//! Shared method resolution and lazy backing fields.

use graft_model::{
    ErrorStrategy, FieldAttributes, FieldDef, FieldRef, Member, MethodAttributes, MethodDef,
    TypeRef,
};
use tracing::debug;

use crate::engine::JobScope;
use crate::error::{Anomaly, WeaveResult};
use crate::guard::CollisionGuard;
use crate::policy::PolicyResolver;
use crate::projector::AttributeProjector;

/// What happened to a method slot the weaver wanted to fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    Synthesized,
    /// A hand-written method of that name was reused.
    Coerced,
    AlreadyInjected,
}

impl Resolution {
    pub(crate) fn is_synthesized(self) -> bool {
        matches!(self, Resolution::Synthesized)
    }
}

/// Fill the method slot `name` from interface method `source`.
///
/// An injected method of that name is left untouched. A hand-written one
/// is a collision: after the policy lets it through, its flags become
/// `flags` and `source` annotations are projected onto it. Otherwise
/// `build` produces the new method, which gets the injected marker and
/// the projected annotations before insertion.
pub(crate) fn resolve_method<'a>(
    scope: &mut JobScope<'a>,
    name: &str,
    source: &MethodDef,
    flags: MethodAttributes,
    strategy: ErrorStrategy,
    build: impl FnOnce(&mut JobScope<'a>) -> WeaveResult<MethodDef>,
) -> WeaveResult<Resolution> {
    if let Some(index) = scope.target.ty.methods.iter().position(|m| m.name == name) {
        if scope.target.ty.methods[index].is_injected() {
            debug!(method = name, "Method already injected");
            return Ok(Resolution::AlreadyInjected);
        }

        let type_name = scope.target.full_name();
        PolicyResolver::handle(
            Anomaly::NameCollision(format!("Method '{name}' is already defined in '{type_name}'")),
            strategy,
        )?;

        let (unit_name, imports, ty) = scope.target.parts();
        let existing = &mut ty.methods[index];
        existing.attributes = flags;
        AttributeProjector::project(unit_name, imports, &source.annotations, &mut existing.annotations);
        return Ok(Resolution::Coerced);
    }

    let mut method = build(scope)?;
    let (unit_name, imports, ty) = scope.target.parts();
    AttributeProjector::mark_injected(unit_name, imports, &mut method.annotations);
    AttributeProjector::project(unit_name, imports, &source.annotations, &mut method.annotations);
    debug!(method = name, "Synthesized method");
    CollisionGuard::append_unique(&mut ty.methods, method);
    Ok(Resolution::Synthesized)
}

/// Backing field created on first use by a synthesized accessor.
pub(crate) struct BackingSlot {
    name: String,
    field_type: TypeRef,
    resolved: bool,
}

impl BackingSlot {
    pub(crate) fn new(name: String, field_type: TypeRef) -> Self {
        Self {
            name,
            field_type,
            resolved: false,
        }
    }

    /// Reference to the backing field, creating it on first call.
    ///
    /// A hand-written field of the same name is a collision; when the
    /// policy lets it through, the existing field is used.
    pub(crate) fn field_ref(
        &mut self,
        scope: &mut JobScope<'_>,
        strategy: ErrorStrategy,
    ) -> WeaveResult<FieldRef> {
        if !self.resolved {
            let existing = scope
                .target
                .ty
                .field(&self.name)
                .map(|f| (f.is_injected(), f.field_type.clone()));

            match existing {
                Some((injected, field_type)) => {
                    if !injected {
                        let type_name = scope.target.full_name();
                        PolicyResolver::handle(
                            Anomaly::NameCollision(format!(
                                "Field '{}' is already defined in '{type_name}'",
                                self.name
                            )),
                            strategy,
                        )?;
                    }
                    self.field_type = field_type;
                }
                None => {
                    let mut field =
                        FieldDef::new(self.name.clone(), FieldAttributes::PRIVATE, self.field_type.clone());
                    let (unit_name, imports, ty) = scope.target.parts();
                    AttributeProjector::mark_injected(unit_name, imports, &mut field.annotations);
                    debug!(field = %self.name, "Added backing field");
                    CollisionGuard::append_unique(&mut ty.fields, field);
                }
            }
            self.resolved = true;
        }

        Ok(FieldRef::new(
            scope.target.reference(),
            self.name.clone(),
            self.field_type.clone(),
        ))
    }
}
