//! Annotation projection from interface members onto synthesized members.

use graft_model::annotation::{self, HANDLE_ERRORS};
use graft_model::{Annotation, AnnotationArg, ArgValue, ImportTable, NamedArg};

/// Copies annotations across units, importing every referenced type.
pub struct AttributeProjector;

impl AttributeProjector {
    /// Copy `source` annotations onto `target`.
    ///
    /// Strategy annotations are weaving directives and are not copied.
    /// Annotations already present (after import) are skipped. Returns the
    /// number copied.
    pub fn project(
        unit_name: &str,
        imports: &mut ImportTable,
        source: &[Annotation],
        target: &mut Vec<Annotation>,
    ) -> usize {
        let mut copied = 0;
        for annotation in source.iter().filter(|a| !a.is(HANDLE_ERRORS)) {
            let imported = Self::import_annotation(unit_name, imports, annotation);
            if !target.contains(&imported) {
                target.push(imported);
                copied += 1;
            }
        }
        copied
    }

    /// Tag `target` with the injected-member marker.
    pub fn mark_injected(unit_name: &str, imports: &mut ImportTable, target: &mut Vec<Annotation>) {
        if annotation::is_injected(target) {
            return;
        }
        let marker = Annotation::injected_member();
        imports.import(unit_name, &marker.kind);
        target.push(marker);
    }

    fn import_annotation(unit_name: &str, imports: &mut ImportTable, source: &Annotation) -> Annotation {
        let named = |imports: &mut ImportTable, list: &[NamedArg]| -> Vec<NamedArg> {
            list.iter()
                .map(|n| NamedArg {
                    name: n.name.clone(),
                    arg: Self::import_arg(unit_name, imports, &n.arg),
                })
                .collect()
        };

        Annotation {
            kind: imports.import(unit_name, &source.kind),
            args: source
                .args
                .iter()
                .map(|a| Self::import_arg(unit_name, imports, a))
                .collect(),
            properties: named(imports, &source.properties),
            fields: named(imports, &source.fields),
        }
    }

    fn import_arg(unit_name: &str, imports: &mut ImportTable, arg: &AnnotationArg) -> AnnotationArg {
        let value = match &arg.value {
            ArgValue::Type(ty) => ArgValue::Type(imports.import(unit_name, ty)),
            ArgValue::Array(items) => ArgValue::Array(
                items
                    .iter()
                    .map(|item| Self::import_arg(unit_name, imports, item))
                    .collect(),
            ),
            other => other.clone(),
        };
        AnnotationArg::new(imports.import(unit_name, &arg.arg_type), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_model::{ErrorStrategy, TypeRef};

    fn tooltip(text: &str) -> Annotation {
        Annotation::new(TypeRef::new("Mod.dll", "Mod.UI", "TooltipAttribute"))
            .with_arg(AnnotationArg::string(text))
    }

    #[test]
    fn strategy_annotations_are_not_copied() {
        let mut imports = ImportTable::new();
        let source = vec![
            Annotation::handle_errors(ErrorStrategy::Ignore),
            tooltip("Current health"),
        ];
        let mut target = Vec::new();

        let copied = AttributeProjector::project("Game.dll", &mut imports, &source, &mut target);
        assert_eq!(copied, 1);
        assert_eq!(target, vec![tooltip("Current health")]);
        assert!(imports.contains(&TypeRef::new("Mod.dll", "Mod.UI", "TooltipAttribute")));
    }

    #[test]
    fn nested_type_arguments_are_imported() {
        let handler = TypeRef::new("Mod.dll", "Mod", "Handler");
        let fallback = TypeRef::new("Lib.dll", "Lib", "Fallback");
        let element = TypeRef::core("System", "Type");
        let source = vec![Annotation::new(TypeRef::new("Mod.dll", "Mod", "RouteAttribute"))
            .with_arg(AnnotationArg::array(
                element.clone(),
                vec![AnnotationArg::type_of(handler.clone())],
            ))
            .with_property("Fallback", AnnotationArg::type_of(fallback.clone()))];

        let mut imports = ImportTable::new();
        let mut target = Vec::new();
        AttributeProjector::project("Game.dll", &mut imports, &source, &mut target);

        assert_eq!(target, source);
        assert!(imports.contains(&handler));
        assert!(imports.contains(&fallback));
        assert!(!imports.contains(&element));
    }

    #[test]
    fn projection_is_idempotent() {
        let mut imports = ImportTable::new();
        let source = vec![tooltip("a"), tooltip("b")];
        let mut target = vec![tooltip("a")];

        assert_eq!(AttributeProjector::project("Game.dll", &mut imports, &source, &mut target), 1);
        assert_eq!(AttributeProjector::project("Game.dll", &mut imports, &source, &mut target), 0);
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn marker_is_added_once() {
        let mut imports = ImportTable::new();
        let mut target = Vec::new();
        AttributeProjector::mark_injected("Game.dll", &mut imports, &mut target);
        AttributeProjector::mark_injected("Game.dll", &mut imports, &mut target);

        assert_eq!(target, vec![Annotation::injected_member()]);
        assert!(imports.contains(&Annotation::injected_member().kind));
    }
}
