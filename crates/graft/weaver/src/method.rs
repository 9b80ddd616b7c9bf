//! Throwing stubs for plain interface methods.

use graft_model::{MethodAttributes, MethodBody, MethodDef};
use tracing::debug;

use crate::accessor::resolve_method;
use crate::engine::JobScope;
use crate::error::WeaveResult;
use crate::guard::MemberKey;
use crate::policy::PolicyResolver;

/// Message carried by the exception a stub throws.
pub const STUB_MESSAGE: &str = "This is a Stub";

/// Synthesizes stubs for abstract interface methods not already claimed
/// as property or event accessors.
pub struct MethodStubSynthesizer;

impl MethodStubSynthesizer {
    /// Returns whether a stub was added.
    pub fn synthesize(scope: &mut JobScope<'_>, method: &MethodDef) -> WeaveResult<bool> {
        if !scope.visited.claim(MemberKey::method(&method.name)) {
            return Ok(false);
        }
        if !method.is_abstract() {
            debug!(method = %method.name, "Method has a default body");
            return Ok(false);
        }

        let strategy = PolicyResolver::resolve(scope.strategy, &method.annotations)?;
        debug!(
            method = %method.name,
            target = %scope.target.full_name(),
            ?strategy,
            "Adding method stub"
        );

        let resolution = resolve_method(
            scope,
            &method.name,
            method,
            MethodAttributes::INTERFACE_METHOD,
            strategy,
            |scope| Ok(stub(scope, method)),
        )?;
        Ok(resolution.is_synthesized())
    }
}

fn stub(scope: &mut JobScope<'_>, source: &MethodDef) -> MethodDef {
    let return_type = scope.target.import(&source.return_type);
    let body = if return_type.is_void() {
        MethodBody::empty()
    } else {
        MethodBody::not_implemented(STUB_MESSAGE)
    };

    let mut method = MethodDef::new(source.name.clone(), MethodAttributes::INTERFACE_METHOD, return_type);
    for param in &source.params {
        let param_type = scope.target.import(&param.param_type);
        method = method.with_param(param.name.clone(), param_type);
    }
    method.with_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_model::{
        Annotation, ErrorStrategy, Instruction, InterfaceDefinition, Member, TypeDef, TypeRef, Unit,
    };

    fn scorer_interface() -> InterfaceDefinition {
        InterfaceDefinition::new(
            "Mod.dll",
            TypeDef::interface("Mod", "IScorer")
                .with_method(
                    MethodDef::interface_slot("Score", TypeRef::int32())
                        .with_param("target", TypeRef::new("Mod.dll", "Mod", "Target")),
                )
                .with_method(MethodDef::interface_slot("Reset", TypeRef::void()))
                .with_method(
                    MethodDef::new("Describe", MethodAttributes::INTERFACE_METHOD, TypeRef::string())
                        .with_body(MethodBody::empty()),
                ),
        )
    }

    #[test]
    fn non_void_stub_throws_and_void_stub_returns() {
        let interface = scorer_interface();
        let mut unit = Unit::new("Game.dll").with_type(TypeDef::class("Game", "Player"));
        let target = unit.target_mut("Game.Player").unwrap();
        let mut scope = JobScope::new(target, &interface, ErrorStrategy::Terminate);

        for method in &interface.definition.methods {
            MethodStubSynthesizer::synthesize(&mut scope, method).unwrap();
        }

        let player = unit.type_def("Game.Player").unwrap();
        assert_eq!(player.methods.len(), 2);

        let score = player.method("Score").unwrap();
        assert_eq!(score.attributes, MethodAttributes::INTERFACE_METHOD);
        assert_eq!(score.body, Some(MethodBody::not_implemented(STUB_MESSAGE)));
        assert!(score.is_injected());
        assert!(unit.imports.contains(&TypeRef::new("Mod.dll", "Mod", "Target")));

        let reset = player.method("Reset").unwrap();
        assert_eq!(reset.body.as_ref().unwrap().instructions, vec![Instruction::Return]);
        assert!(player.method("Describe").is_none());
    }

    #[test]
    fn colliding_method_is_coerced_under_log_error() {
        let mut interface = scorer_interface();
        interface.definition.methods[1]
            .annotations
            .push(Annotation::handle_errors(ErrorStrategy::LogError));
        let player = TypeDef::class("Game", "Player").with_method(
            MethodDef::new("Reset", MethodAttributes::PRIVATE, TypeRef::void())
                .with_body(MethodBody::empty()),
        );
        let mut unit = Unit::new("Game.dll").with_type(player);
        let target = unit.target_mut("Game.Player").unwrap();
        let mut scope = JobScope::new(target, &interface, ErrorStrategy::Terminate);

        let added = MethodStubSynthesizer::synthesize(&mut scope, &interface.definition.methods[1]).unwrap();
        assert!(!added);

        let reset = unit.type_def("Game.Player").unwrap().method("Reset").unwrap();
        assert_eq!(reset.attributes, MethodAttributes::INTERFACE_METHOD);
        assert!(!reset.is_injected());
    }
}
