//! Compiled units, type definitions and the import table.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::Annotation;
use crate::member::{EventDef, FieldDef, MethodDef, PropertyDef};
use crate::types::{TypeAttributes, TypeRef};

// ── Type Definition ────────────────────────────────────────────────────

/// A class or interface definition with its four member collections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    pub attributes: TypeAttributes,
    #[serde(default)]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
    /// Implemented interfaces.
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl TypeDef {
    fn with_attributes(
        namespace: impl Into<String>,
        name: impl Into<String>,
        attributes: TypeAttributes,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            attributes,
            generic_params: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            interfaces: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// A public class.
    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_attributes(namespace, name, TypeAttributes::PUBLIC)
    }

    /// A public interface.
    pub fn interface(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_attributes(
            namespace,
            name,
            TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
        )
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Reference to this type as defined in `scope`.
    pub fn reference(&self, scope: &str) -> TypeRef {
        TypeRef::new(scope, self.namespace.clone(), self.name.clone())
    }

    pub fn is_interface(&self) -> bool {
        self.attributes.contains(TypeAttributes::INTERFACE)
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&EventDef> {
        self.events.iter().find(|e| e.name == name)
    }

    /// Whether `interface` is already listed as implemented.
    pub fn implements(&self, interface: &TypeRef) -> bool {
        self.interfaces.contains(interface)
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_event(mut self, event: EventDef) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_generic_param(mut self, name: impl Into<String>) -> Self {
        self.generic_params.push(name.into());
        self
    }

    /// Total number of members across all four collections.
    pub fn member_count(&self) -> usize {
        self.fields.len() + self.methods.len() + self.properties.len() + self.events.len()
    }
}

// ── Interface Definition ───────────────────────────────────────────────

/// An interface template together with the unit that defines it.
///
/// Templates are cloned out of their unit during planning, so weaving
/// never borrows the source unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDefinition {
    pub scope: String,
    pub definition: TypeDef,
}

impl InterfaceDefinition {
    pub fn new(scope: impl Into<String>, definition: TypeDef) -> Self {
        Self {
            scope: scope.into(),
            definition,
        }
    }

    pub fn reference(&self) -> TypeRef {
        self.definition.reference(&self.scope)
    }

    pub fn full_name(&self) -> String {
        self.definition.full_name()
    }

    /// Accessor method named `name`, if declared.
    pub fn accessor(&self, name: Option<&str>) -> Option<&MethodDef> {
        name.and_then(|n| self.definition.method(n))
    }
}

// ── Import Table ───────────────────────────────────────────────────────

/// References to types defined outside a unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportTable {
    references: IndexSet<TypeRef>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `ty` as referenced from `unit_name`, returning the reference
    /// to use inside that unit.
    pub fn import(&mut self, unit_name: &str, ty: &TypeRef) -> TypeRef {
        match &ty.scope {
            Some(scope) if scope != unit_name => {
                if self.references.insert(ty.clone()) {
                    debug!(unit = unit_name, reference = %ty, "Imported type reference");
                }
            }
            _ => {}
        }
        ty.clone()
    }

    pub fn contains(&self, ty: &TypeRef) -> bool {
        self.references.contains(ty)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeRef> {
        self.references.iter()
    }
}

// ── Unit ───────────────────────────────────────────────────────────────

/// A compiled unit: the editable structural view of one container file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub imports: ImportTable,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            types: Vec::new(),
            imports: ImportTable::new(),
        }
    }

    pub fn with_type(mut self, ty: TypeDef) -> Self {
        self.types.push(ty);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Type by full name.
    pub fn type_def(&self, full_name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.full_name() == full_name)
    }

    /// Mutable weaving view of the type named `full_name`.
    pub fn target_mut(&mut self, full_name: &str) -> Option<WeaveTarget<'_>> {
        let unit_name = self.name.as_str();
        let imports = &mut self.imports;
        self.types
            .iter_mut()
            .find(|t| t.full_name() == full_name)
            .map(move |ty| WeaveTarget {
                unit_name,
                imports,
                ty,
            })
    }
}

// ── Weave Target ───────────────────────────────────────────────────────

/// A type being edited together with its unit's import table.
pub struct WeaveTarget<'a> {
    pub unit_name: &'a str,
    pub imports: &'a mut ImportTable,
    pub ty: &'a mut TypeDef,
}

impl WeaveTarget<'_> {
    /// Import `ty` into the target unit.
    pub fn import(&mut self, ty: &TypeRef) -> TypeRef {
        self.imports.import(self.unit_name, ty)
    }

    /// Reference to the type being edited.
    pub fn reference(&self) -> TypeRef {
        self.ty.reference(self.unit_name)
    }

    pub fn full_name(&self) -> String {
        self.ty.full_name()
    }

    /// Split into unit name, import table and type for simultaneous edits.
    pub fn parts(&mut self) -> (&str, &mut ImportTable, &mut TypeDef) {
        (self.unit_name, &mut *self.imports, &mut *self.ty)
    }
}
