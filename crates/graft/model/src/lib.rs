#![deny(unsafe_code)]
//! # graft-model
//!
//! Editable structural view of a compiled unit.
//!
//! A [`Unit`] owns an ordered list of [`TypeDef`]s and an [`ImportTable`]
//! of references to types defined elsewhere. Types own four independent
//! member collections (fields, methods, properties, events), each keyed
//! by name. Method bodies are linear [`Instruction`] sequences over a
//! small stack machine; with the `test-utils` feature, `eval::Interpreter`
//! executes them so that synthesized members can be checked behaviourally.
//!
//! Annotations are kept in their raw, typed-argument form
//! ([`Annotation`]) and decoded on demand through [`KnownAnnotation`].

pub mod annotation;
pub mod body;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod eval;
pub mod member;
pub mod strategy;
pub mod types;
pub mod unit;

pub use annotation::{Annotation, AnnotationArg, ArgValue, KnownAnnotation, NamedArg};
pub use body::{Instruction, MethodBody};
pub use error::{ModelError, ModelResult};
pub use member::{EventDef, FieldDef, Member, MethodDef, ParamDef, PropertyDef};
pub use strategy::ErrorStrategy;
pub use types::{FieldAttributes, FieldRef, MethodAttributes, TypeAttributes, TypeRef};
pub use unit::{ImportTable, InterfaceDefinition, TypeDef, Unit, WeaveTarget};
