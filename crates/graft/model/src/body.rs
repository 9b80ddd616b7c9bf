//! Method bodies.
//!
//! Bodies are linear instruction sequences for a stack machine. The
//! instruction set covers what synthesized accessors and stubs need;
//! bodies read from a unit are kept as-is and never rewritten.

use serde::{Deserialize, Serialize};

use crate::types::{FieldRef, TypeRef};

/// A single stack-machine instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Push the receiver.
    LoadThis,
    /// Push argument `index`; argument 0 is the receiver.
    LoadArg { index: u16 },
    /// Pop an object, push the value of `field`.
    LoadField { field: FieldRef },
    /// Pop a value and an object, store the value into `field`.
    StoreField { field: FieldRef },
    /// Pop two delegates, push their concatenation.
    CombineDelegates,
    /// Pop a delegate to remove and a source delegate, push the remainder.
    RemoveDelegate,
    /// Check the top value against `target` without popping it.
    CastClass { target: TypeRef },
    /// Pop `arity` arguments and a delegate, invoke it, push its result
    /// unless it returns `void`.
    InvokeDelegate {
        delegate: TypeRef,
        arity: u16,
        returns_value: bool,
    },
    /// Push a string literal.
    LoadString { value: String },
    /// Pop a message, push a new "not implemented" fault object.
    NewNotImplemented,
    /// Pop a fault object and raise it.
    Throw,
    /// Return, with the top of stack as result if one is present.
    Return,
}

/// The body of a concrete method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBody {
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Body that returns immediately.
    pub fn empty() -> Self {
        Self::new(vec![Instruction::Return])
    }

    /// Body that always raises "not implemented" with `message`.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(vec![
            Instruction::LoadString {
                value: message.into(),
            },
            Instruction::NewNotImplemented,
            Instruction::Throw,
        ])
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Fields read or written by this body.
    pub fn touched_fields(&self) -> Vec<&FieldRef> {
        self.instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::LoadField { field } | Instruction::StoreField { field } => Some(field),
                _ => None,
            })
            .collect()
    }
}
