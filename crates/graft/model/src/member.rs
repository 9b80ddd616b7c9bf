//! Member definitions: fields, methods, properties and events.

use serde::{Deserialize, Serialize};

use crate::annotation::{self, Annotation};
use crate::body::MethodBody;
use crate::types::{FieldAttributes, MethodAttributes, TypeRef};

/// Behaviour shared by the four member kinds.
pub trait Member {
    /// Member name, unique within its collection.
    fn name(&self) -> &str;

    fn annotations(&self) -> &[Annotation];

    fn annotations_mut(&mut self) -> &mut Vec<Annotation>;

    /// Whether the weaver synthesized this member.
    fn is_injected(&self) -> bool {
        annotation::is_injected(self.annotations())
    }
}

macro_rules! impl_member {
    ($($ty:ty),*) => {
        $(
            impl Member for $ty {
                fn name(&self) -> &str {
                    &self.name
                }

                fn annotations(&self) -> &[Annotation] {
                    &self.annotations
                }

                fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
                    &mut self.annotations
                }
            }
        )*
    };
}

impl_member!(FieldDef, MethodDef, PropertyDef, EventDef);

// ── Field ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub attributes: FieldAttributes,
    pub field_type: TypeRef,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, attributes: FieldAttributes, field_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            attributes,
            field_type,
            annotations: Vec::new(),
        }
    }
}

// ── Method ─────────────────────────────────────────────────────────────

/// A method parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: TypeRef,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, param_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            param_type,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub attributes: MethodAttributes,
    pub return_type: TypeRef,
    #[serde(default)]
    pub params: Vec<ParamDef>,
    /// `None` for abstract methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<MethodBody>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, attributes: MethodAttributes, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            attributes,
            return_type,
            params: Vec::new(),
            body: None,
            annotations: Vec::new(),
        }
    }

    /// An abstract interface slot without a default body.
    pub fn interface_slot(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self::new(
            name,
            MethodAttributes::INTERFACE_METHOD | MethodAttributes::ABSTRACT,
            return_type,
        )
    }

    /// Add a parameter (builder pattern).
    pub fn with_param(mut self, name: impl Into<String>, param_type: TypeRef) -> Self {
        self.params.push(ParamDef::new(name, param_type));
        self
    }

    /// Set the body (builder pattern).
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Add an annotation (builder pattern).
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn is_abstract(&self) -> bool {
        self.attributes.contains(MethodAttributes::ABSTRACT)
    }

    pub fn returns_void(&self) -> bool {
        self.return_type.is_void()
    }
}

// ── Property ───────────────────────────────────────────────────────────

/// A property; accessors are named methods of the same type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub property_type: TypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub getter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, property_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            property_type,
            getter: None,
            setter: None,
            annotations: Vec::new(),
        }
    }

    /// Name of the getter accessor by convention.
    pub fn getter_name(&self) -> String {
        format!("get_{}", self.name)
    }

    /// Name of the setter accessor by convention.
    pub fn setter_name(&self) -> String {
        format!("set_{}", self.name)
    }

    /// Name of the synthesized backing field.
    pub fn backing_field_name(&self) -> String {
        format!("<{}>k__BackingField", self.name)
    }
}

// ── Event ──────────────────────────────────────────────────────────────

/// An event; accessors are named methods of the same type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    /// Delegate type of the handlers.
    pub event_type: TypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raise: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl EventDef {
    pub fn new(name: impl Into<String>, event_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            event_type,
            add: None,
            remove: None,
            raise: None,
            annotations: Vec::new(),
        }
    }

    pub fn add_name(&self) -> String {
        format!("add_{}", self.name)
    }

    pub fn remove_name(&self) -> String {
        format!("remove_{}", self.name)
    }

    pub fn raise_name(&self) -> String {
        format!("raise_{}", self.name)
    }
}
