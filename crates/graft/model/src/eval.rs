//! Reference evaluator for method bodies.
//!
//! Executes a [`MethodBody`] against a single receiver instance. Delegate
//! handlers are opaque [`HandlerId`]s; invoking one is forwarded to a
//! [`DelegateHost`], which decides what the handler does and returns.
//!
//! Delegates follow multicast semantics: combining concatenates invocation
//! lists, removing drops the last occurrence of the removed list, and an
//! empty list collapses to `Null`.

use std::collections::HashMap;

use thiserror::Error;

use crate::body::{Instruction, MethodBody};
use crate::member::MethodDef;

/// Maximum depth of the evaluation stack.
const MAX_STACK_DEPTH: usize = 256;

/// Identity of a delegate handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u32);

/// A runtime value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Null,
    /// The receiver.
    This,
    Int(i64),
    Str(String),
    /// A non-empty invocation list.
    Delegate(Vec<HandlerId>),
    /// A "not implemented" fault object, not yet raised.
    NotImplemented(String),
}

impl Value {
    /// A delegate with a single handler.
    pub fn handler(id: u32) -> Self {
        Value::Delegate(vec![HandlerId(id)])
    }

    /// Concatenate two invocation lists.
    pub fn combine(a: Value, b: Value) -> Result<Value, Fault> {
        match (a, b) {
            (Value::Null, b @ (Value::Null | Value::Delegate(_))) => Ok(b),
            (a @ Value::Delegate(_), Value::Null) => Ok(a),
            (Value::Delegate(mut a), Value::Delegate(b)) => {
                a.extend(b);
                Ok(Value::Delegate(a))
            }
            _ => Err(Fault::TypeMismatch {
                expected: "delegate",
            }),
        }
    }

    /// Remove the last occurrence of `value`'s invocation list from `source`.
    pub fn remove(source: Value, value: Value) -> Result<Value, Fault> {
        match (source, value) {
            (Value::Null, Value::Null | Value::Delegate(_)) => Ok(Value::Null),
            (source @ Value::Delegate(_), Value::Null) => Ok(source),
            (Value::Delegate(mut list), Value::Delegate(removed)) => {
                let n = removed.len();
                if n <= list.len() {
                    if let Some(start) = (0..=list.len() - n)
                        .rev()
                        .find(|&i| list[i..i + n] == removed[..])
                    {
                        list.drain(start..start + n);
                    }
                }
                if list.is_empty() {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Delegate(list))
                }
            }
            _ => Err(Fault::TypeMismatch {
                expected: "delegate",
            }),
        }
    }

    /// Handlers in invocation order; empty for `Null`.
    pub fn handlers(&self) -> &[HandlerId] {
        match self {
            Value::Delegate(list) => list,
            _ => &[],
        }
    }
}

/// Field storage of a receiver.
#[derive(Clone, Debug, Default)]
pub struct Instance {
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of field `name`; unset fields read as `Null`.
    pub fn get(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }
}

/// Receives delegate handler invocations.
pub trait DelegateHost {
    fn invoke(&mut self, handler: HandlerId, args: &[Value]) -> Value;
}

/// Faults raised while executing a body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("null reference: {0}")]
    NullReference(String),

    #[error("method '{0}' has no body")]
    MissingBody(String),

    #[error("argument {0} out of range")]
    ArgumentOutOfRange(u16),

    #[error("stack underflow at instruction {0}")]
    StackUnderflow(usize),

    #[error("stack overflow")]
    StackOverflow,

    #[error("type mismatch: expected {expected}")]
    TypeMismatch { expected: &'static str },

    #[error("execution fell off the end of the body")]
    MissingReturn,
}

/// Stack-machine interpreter for method bodies.
pub struct Interpreter<'h> {
    host: &'h mut dyn DelegateHost,
    stack: Vec<Value>,
}

impl<'h> Interpreter<'h> {
    pub fn new(host: &'h mut dyn DelegateHost) -> Self {
        Self {
            host,
            stack: Vec::with_capacity(16),
        }
    }

    /// Call `method` on `this` with `args` (receiver excluded).
    ///
    /// Returns the value left by `Return`, or `Null` for void bodies.
    pub fn call(
        &mut self,
        method: &MethodDef,
        this: &mut Instance,
        args: &[Value],
    ) -> Result<Value, Fault> {
        let body = method
            .body
            .as_ref()
            .ok_or_else(|| Fault::MissingBody(method.name.clone()))?;
        self.run(body, this, args)
    }

    fn run(&mut self, body: &MethodBody, this: &mut Instance, args: &[Value]) -> Result<Value, Fault> {
        self.stack.clear();
        for (pc, inst) in body.instructions.iter().enumerate() {
            match inst {
                Instruction::LoadThis => self.push(Value::This)?,
                Instruction::LoadArg { index: 0 } => self.push(Value::This)?,
                Instruction::LoadArg { index } => {
                    let value = args
                        .get(usize::from(*index) - 1)
                        .cloned()
                        .ok_or(Fault::ArgumentOutOfRange(*index))?;
                    self.push(value)?;
                }
                Instruction::LoadField { field } => {
                    self.pop_receiver(pc, &field.name)?;
                    self.push(this.get(&field.name))?;
                }
                Instruction::StoreField { field } => {
                    let value = self.pop(pc)?;
                    self.pop_receiver(pc, &field.name)?;
                    this.set(field.name.clone(), value);
                }
                Instruction::CombineDelegates => {
                    let b = self.pop(pc)?;
                    let a = self.pop(pc)?;
                    self.push(Value::combine(a, b)?)?;
                }
                Instruction::RemoveDelegate => {
                    let value = self.pop(pc)?;
                    let source = self.pop(pc)?;
                    self.push(Value::remove(source, value)?)?;
                }
                Instruction::CastClass { .. } => match self.stack.last() {
                    Some(Value::Null | Value::Delegate(_)) => {}
                    Some(_) => {
                        return Err(Fault::TypeMismatch {
                            expected: "delegate",
                        })
                    }
                    None => return Err(Fault::StackUnderflow(pc)),
                },
                Instruction::InvokeDelegate {
                    delegate,
                    arity,
                    returns_value,
                } => {
                    let split = self
                        .stack
                        .len()
                        .checked_sub(usize::from(*arity))
                        .ok_or(Fault::StackUnderflow(pc))?;
                    let call_args = self.stack.split_off(split);
                    let handlers = match self.pop(pc)? {
                        Value::Delegate(list) => list,
                        Value::Null => return Err(Fault::NullReference(delegate.full_name())),
                        _ => {
                            return Err(Fault::TypeMismatch {
                                expected: "delegate",
                            })
                        }
                    };
                    let mut result = Value::Null;
                    for handler in handlers {
                        result = self.host.invoke(handler, &call_args);
                    }
                    if *returns_value {
                        self.push(result)?;
                    }
                }
                Instruction::LoadString { value } => self.push(Value::Str(value.clone()))?,
                Instruction::NewNotImplemented => match self.pop(pc)? {
                    Value::Str(message) => self.push(Value::NotImplemented(message))?,
                    _ => {
                        return Err(Fault::TypeMismatch {
                            expected: "string",
                        })
                    }
                },
                Instruction::Throw => match self.pop(pc)? {
                    Value::NotImplemented(message) => return Err(Fault::NotImplemented(message)),
                    Value::Null => return Err(Fault::NullReference("throw".into())),
                    _ => {
                        return Err(Fault::TypeMismatch {
                            expected: "fault object",
                        })
                    }
                },
                Instruction::Return => return Ok(self.stack.pop().unwrap_or(Value::Null)),
            }
        }
        Err(Fault::MissingReturn)
    }

    fn push(&mut self, value: Value) -> Result<(), Fault> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(Fault::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, pc: usize) -> Result<Value, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow(pc))
    }

    fn pop_receiver(&mut self, pc: usize, field: &str) -> Result<(), Fault> {
        match self.pop(pc)? {
            Value::This => Ok(()),
            Value::Null => Err(Fault::NullReference(field.to_string())),
            _ => Err(Fault::TypeMismatch {
                expected: "receiver",
            }),
        }
    }
}
