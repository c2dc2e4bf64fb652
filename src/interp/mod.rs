//! The snippet language engine.
//!
//! Snippets are written in a small JavaScript-flavored language and evaluated
//! by a tree-walking interpreter: [`lexer`] → [`parser`] → [`Machine`]. Each
//! evaluation runs in a fresh machine — fresh global scope, fresh output
//! sink, fresh job queues — so snippets can never observe each other's
//! bindings or timing.
//!
//! Scheduling is deterministic and virtual: promise reactions go on a
//! microtask queue, `setTimeout` callbacks on a timer queue ordered by
//! virtual due-time, and after the top-level statements finish the machine
//! drains both (microtasks first) before the evaluation is considered
//! settled. Nothing ever sleeps on the wall clock; runaway work is cut off
//! by an operation budget and surfaces as a `Timeout` fault.

mod ast;
mod builtins;
mod lexer;
mod machine;
mod parser;
mod scope;
mod value;

pub use machine::{Evaluation, Machine};
pub use value::Value;

use thiserror::Error;

use crate::models::ErrorKind;

/// A fault raised while lexing, parsing, or evaluating a snippet.
///
/// Faults never panic and never escape verification; they are either caught
/// by a `try`/`catch` inside the snippet or recorded as the evaluation's
/// terminal failure.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{}: {message}", .kind.label())]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Range, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }
}
