//! Type references, member references and attribute flag sets.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ── Type Reference ─────────────────────────────────────────────────────

/// Reference to a type by scope and qualified name.
///
/// `scope` names the unit that defines the type. Core types (`void`,
/// primitives, delegates of the runtime library) carry no scope and never
/// need importing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Defining unit, `None` for core types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Namespace, possibly empty.
    #[serde(default)]
    pub namespace: String,
    /// Simple type name.
    pub name: String,
}

impl TypeRef {
    /// Reference a type defined in the unit `scope`.
    pub fn new(
        scope: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            scope: Some(scope.into()),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Reference a core type.
    pub fn core(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: None,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The core `void` type.
    pub fn void() -> Self {
        Self::core("System", "Void")
    }

    /// The core `string` type.
    pub fn string() -> Self {
        Self::core("System", "String")
    }

    /// The core 32-bit integer type.
    pub fn int32() -> Self {
        Self::core("System", "Int32")
    }

    /// Whether this is the core `void` type.
    pub fn is_void(&self) -> bool {
        self.scope.is_none() && self.namespace == "System" && self.name == "Void"
    }

    /// Whether this reference is a core type.
    pub fn is_core(&self) -> bool {
        self.scope.is_none()
    }

    /// `Namespace.Name`, or just `Name` for the global namespace.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "[{}]{}", scope, self.full_name()),
            None => write!(f, "{}", self.full_name()),
        }
    }
}

// ── Field Reference ────────────────────────────────────────────────────

/// Reference to a field, as embedded in method bodies.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub declaring_type: TypeRef,
    pub name: String,
    pub field_type: TypeRef,
}

impl FieldRef {
    pub fn new(declaring_type: TypeRef, name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            field_type,
        }
    }
}

// ── Flags ──────────────────────────────────────────────────────────────

bitflags! {
    /// Visibility and dispatch flags of a method.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MethodAttributes: u32 {
        const PRIVATE = 1 << 0;
        const PUBLIC = 1 << 1;
        const STATIC = 1 << 2;
        const FINAL = 1 << 3;
        const VIRTUAL = 1 << 4;
        const HIDE_BY_SIG = 1 << 5;
        const NEW_SLOT = 1 << 6;
        const ABSTRACT = 1 << 7;
        const SPECIAL_NAME = 1 << 8;

        /// Flags required of a method implementing an interface slot.
        const INTERFACE_METHOD = Self::PUBLIC.bits() | Self::VIRTUAL.bits() | Self::NEW_SLOT.bits();
        /// Flags required of a property or event accessor implementing an interface slot.
        const INTERFACE_ACCESSOR = Self::INTERFACE_METHOD.bits()
            | Self::SPECIAL_NAME.bits()
            | Self::HIDE_BY_SIG.bits();
    }
}

bitflags! {
    /// Visibility and storage flags of a field.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FieldAttributes: u32 {
        const PRIVATE = 1 << 0;
        const PUBLIC = 1 << 1;
        const STATIC = 1 << 2;
        const INIT_ONLY = 1 << 3;
    }
}

bitflags! {
    /// Kind and visibility flags of a type definition.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TypeAttributes: u32 {
        const PUBLIC = 1 << 0;
        const INTERFACE = 1 << 1;
        const ABSTRACT = 1 << 2;
        const SEALED = 1 << 3;
    }
}
