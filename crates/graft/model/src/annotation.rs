//! Custom annotations and the decoder for the kinds the weaver understands.
//!
//! Annotations are stored exactly as they appear in a unit: an annotation
//! type plus typed positional and named arguments. [`KnownAnnotation`]
//! turns the four weaving-related kinds into typed values; everything
//! else stays opaque and is only ever copied.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::strategy::ErrorStrategy;
use crate::types::TypeRef;

/// Unit that defines the weaving annotation types.
pub const ANNOTATION_SCOPE: &str = "Graft";
/// Namespace of the weaving annotation types.
pub const ANNOTATION_NAMESPACE: &str = "Graft";

pub const INJECT_INTERFACE: &str = "Graft.InjectInterfaceAttribute";
pub const HANDLE_ERRORS: &str = "Graft.HandleErrorsAttribute";
pub const INJECTED_MEMBER: &str = "Graft.InjectedMemberAttribute";
pub const REQUIRES_INJECTIONS: &str = "Graft.RequiresInjectionsAttribute";

/// Target unit assumed when an injection request names none.
pub const DEFAULT_TARGET_UNIT: &str = "Assembly-CSharp.dll";

fn graft_type(name: &str) -> TypeRef {
    TypeRef::new(ANNOTATION_SCOPE, ANNOTATION_NAMESPACE, name)
}

// ── Arguments ──────────────────────────────────────────────────────────

/// Value of an annotation argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Enum(i64),
    String(String),
    /// A type literal; must be re-imported when copied across units.
    Type(TypeRef),
    /// Array of arguments; elements may themselves hold type literals.
    Array(Vec<AnnotationArg>),
}

/// A typed annotation argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationArg {
    pub arg_type: TypeRef,
    pub value: ArgValue,
}

impl AnnotationArg {
    pub fn new(arg_type: TypeRef, value: ArgValue) -> Self {
        Self { arg_type, value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(TypeRef::string(), ArgValue::String(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Self::new(TypeRef::int32(), ArgValue::Int(value))
    }

    pub fn type_of(value: TypeRef) -> Self {
        Self::new(TypeRef::core("System", "Type"), ArgValue::Type(value))
    }

    pub fn array(element_type: TypeRef, items: Vec<AnnotationArg>) -> Self {
        let mut array_type = element_type;
        array_type.name.push_str("[]");
        Self::new(array_type, ArgValue::Array(items))
    }
}

/// A named property or field argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: String,
    pub arg: AnnotationArg,
}

// ── Annotation ─────────────────────────────────────────────────────────

/// A custom annotation attached to a unit, type or member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation type.
    pub kind: TypeRef,
    /// Positional constructor arguments.
    #[serde(default)]
    pub args: Vec<AnnotationArg>,
    /// Named property arguments.
    #[serde(default)]
    pub properties: Vec<NamedArg>,
    /// Named field arguments.
    #[serde(default)]
    pub fields: Vec<NamedArg>,
}

impl Annotation {
    pub fn new(kind: TypeRef) -> Self {
        Self {
            kind,
            args: Vec::new(),
            properties: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Add a positional argument (builder pattern).
    pub fn with_arg(mut self, arg: AnnotationArg) -> Self {
        self.args.push(arg);
        self
    }

    /// Add a named property argument (builder pattern).
    pub fn with_property(mut self, name: impl Into<String>, arg: AnnotationArg) -> Self {
        self.properties.push(NamedArg {
            name: name.into(),
            arg,
        });
        self
    }

    /// Add a named field argument (builder pattern).
    pub fn with_field(mut self, name: impl Into<String>, arg: AnnotationArg) -> Self {
        self.fields.push(NamedArg {
            name: name.into(),
            arg,
        });
        self
    }

    /// Whether the annotation type has the given full name.
    pub fn is(&self, kind: &str) -> bool {
        self.kind.full_name() == kind
    }

    /// Request injection of the annotated interface into `type_name`.
    pub fn inject_interface(type_name: impl Into<String>, unit_name: Option<&str>) -> Self {
        let mut annotation = Self::new(graft_type("InjectInterfaceAttribute"))
            .with_arg(AnnotationArg::string(type_name));
        if let Some(unit) = unit_name {
            annotation = annotation.with_arg(AnnotationArg::string(unit));
        }
        annotation
    }

    /// Override the error handling strategy of the annotated scope.
    pub fn handle_errors(strategy: ErrorStrategy) -> Self {
        Self::new(graft_type("HandleErrorsAttribute")).with_arg(AnnotationArg::new(
            graft_type("ErrorHandlingStrategy"),
            ArgValue::Enum(strategy.value()),
        ))
    }

    /// Marker placed on every member the weaver synthesizes.
    pub fn injected_member() -> Self {
        Self::new(graft_type("InjectedMemberAttribute"))
    }

    /// Marker placed on units that request injections.
    pub fn requires_injections() -> Self {
        Self::new(graft_type("RequiresInjectionsAttribute"))
    }
}

// ── Decoder ────────────────────────────────────────────────────────────

/// Typed view of the annotation kinds that drive weaving.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KnownAnnotation {
    InjectInterface {
        type_name: String,
        unit_name: Option<String>,
    },
    HandleErrors(ErrorStrategy),
    InjectedMember,
    RequiresInjections,
}

impl KnownAnnotation {
    /// Decode an annotation, returning `Ok(None)` for kinds the weaver
    /// does not interpret.
    pub fn decode(annotation: &Annotation) -> ModelResult<Option<Self>> {
        let kind = annotation.kind.full_name();
        let decoded = match kind.as_str() {
            INJECT_INTERFACE => {
                let type_name = match annotation.args.first().map(|a| &a.value) {
                    Some(ArgValue::String(name)) => name.clone(),
                    _ => return Err(malformed(&kind, "expected a target type name")),
                };
                let unit_name = match annotation.args.get(1).map(|a| &a.value) {
                    None | Some(ArgValue::Null) => None,
                    Some(ArgValue::String(unit)) => Some(unit.clone()),
                    Some(_) => return Err(malformed(&kind, "unit name must be a string")),
                };
                Self::InjectInterface {
                    type_name,
                    unit_name,
                }
            }
            HANDLE_ERRORS => match annotation.args.first().map(|a| &a.value) {
                Some(ArgValue::Enum(v)) | Some(ArgValue::Int(v)) => {
                    Self::HandleErrors(ErrorStrategy::from_value(*v)?)
                }
                _ => return Err(malformed(&kind, "expected a strategy value")),
            },
            INJECTED_MEMBER => Self::InjectedMember,
            REQUIRES_INJECTIONS => Self::RequiresInjections,
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}

fn malformed(kind: &str, reason: &str) -> ModelError {
    ModelError::MalformedAnnotation {
        kind: kind.to_string(),
        reason: reason.to_string(),
    }
}

/// The first strategy override among `annotations`, if any.
pub fn find_strategy(annotations: &[Annotation]) -> ModelResult<Option<ErrorStrategy>> {
    for annotation in annotations.iter().filter(|a| a.is(HANDLE_ERRORS)) {
        if let Some(KnownAnnotation::HandleErrors(strategy)) = KnownAnnotation::decode(annotation)? {
            return Ok(Some(strategy));
        }
    }
    Ok(None)
}

/// Whether `annotations` carry the injected-member marker.
pub fn is_injected(annotations: &[Annotation]) -> bool {
    annotations.iter().any(|a| a.is(INJECTED_MEMBER))
}

/// Whether `annotations` carry the injection request marker.
pub fn requires_injections(annotations: &[Annotation]) -> bool {
    annotations.iter().any(|a| a.is(REQUIRES_INJECTIONS))
}
