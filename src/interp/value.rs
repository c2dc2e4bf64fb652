//! Runtime values for the snippet language.
//!
//! Arrays, objects, functions, and promises are shared heap values (`Rc`),
//! matching the reference semantics the catalog's snippets document. The
//! inspection format mirrors what a Node-style `console.log` prints, because
//! expected output in the catalog is written against that format.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::interp::ast::{FuncLit, Param};
use crate::interp::scope::Env;

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<String>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<ObjectData>),
    Function(Rc<Function>),
    Native(NativeFn),
    Method(Rc<BoundMethod>),
    Promise(Rc<RefCell<PromiseState>>),
}

/// An ordered property map. Insertion order is preserved; assigning to an
/// existing key keeps its position, as the spread-merge examples rely on.
#[derive(Debug, Default)]
pub struct ObjectData {
    props: RefCell<Vec<(String, Value)>>,
}

impl ObjectData {
    pub fn with_props(props: Vec<(String, Value)>) -> Rc<Self> {
        Rc::new(Self {
            props: RefCell::new(props),
        })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.props
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn set(&self, key: &str, value: Value) {
        let mut props = self.props.borrow_mut();
        match props.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => props.push((key.to_string(), value)),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.props.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.props.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.borrow().is_empty()
    }
}

/// A user-defined function value: parameters, body, and captured environment.
#[derive(Debug)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: crate::interp::ast::FuncBody,
    pub env: Rc<Env>,
    pub is_async: bool,
}

impl Function {
    pub fn from_lit(lit: &FuncLit, env: Rc<Env>) -> Rc<Self> {
        Rc::new(Self {
            name: lit.name.clone(),
            params: lit.params.clone(),
            body: lit.body.clone(),
            env,
            is_async: lit.is_async,
        })
    }
}

/// Built-in free functions and namespace members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFn {
    ConsoleLog,
    ObjectKeys,
    ObjectValues,
    ObjectEntries,
    ObjectAssign,
    SetTimeout,
    PromiseResolve,
    PromiseReject,
}

/// A built-in method captured together with its receiver at property-access
/// time, so `xs.push` is itself a callable value.
#[derive(Debug)]
pub struct BoundMethod {
    pub recv: Value,
    pub kind: MethodKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    ArrayPush,
    ArrayJoin,
    ArrayMap,
    ArrayIncludes,
    StrToUpperCase,
    StrToLowerCase,
    PromiseThen,
    PromiseCatch,
    /// The `resolve` capability handed to a `new Promise(executor)` executor.
    PromiseResolveCap,
    /// The `reject` capability handed to a `new Promise(executor)` executor.
    PromiseRejectCap,
}

#[derive(Debug, Clone)]
pub struct PromiseState {
    pub inner: PromiseInner,
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone)]
pub enum PromiseInner {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

/// One registered `.then`/`.catch` handler pair and the derived promise it
/// settles.
#[derive(Debug, Clone)]
pub struct Reaction {
    pub on_fulfilled: Option<Value>,
    pub on_rejected: Option<Value>,
    pub target: Rc<RefCell<PromiseState>>,
}

impl PromiseState {
    pub fn pending() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            inner: PromiseInner::Pending,
            reactions: Vec::new(),
        }))
    }

    pub fn fulfilled(value: Value) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            inner: PromiseInner::Fulfilled(value),
            reactions: Vec::new(),
        }))
    }

    pub fn rejected(value: Value) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            inner: PromiseInner::Rejected(value),
            reactions: Vec::new(),
        }))
    }
}

/// A scheduled promise reaction. `payload` is `Ok` for fulfillment and `Err`
/// for rejection.
#[derive(Debug, Clone)]
pub struct Job {
    pub reaction: Reaction,
    pub payload: Result<Value, Value>,
}

pub type JobQueue = VecDeque<Job>;

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(s.into()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(props: Vec<(String, Value)>) -> Self {
        Value::Object(ObjectData::with_props(props))
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) | Value::Object(_) | Value::Promise(_) => "object",
            Value::Function(_) | Value::Native(_) | Value::Method(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Strict (`===`) equality: value equality for primitives, reference
    /// equality for heap values.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Promise(a), Value::Promise(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }

    /// Loose (`==`) equality: strict equality, plus the nullish pair and
    /// number/string coercion.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if self.strict_eq(other) {
            return true;
        }
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Number(n), Value::Str(s)) | (Value::Str(s), Value::Number(n)) => {
                s.trim().parse::<f64>().map(|p| p == *n).unwrap_or(false)
            }
            (Value::Bool(b), other) | (other, Value::Bool(b)) => {
                Value::Number(if *b { 1.0 } else { 0.0 }).loose_eq(other)
            }
            _ => false,
        }
    }
}

/// Format a number the way the host language prints it: integral values
/// without a fractional part, special values by name.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 9.007_199_254_740_992e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Top-level `console.log` rendering: bare strings stay bare, everything
/// else is inspected.
pub fn display(value: &Value) -> String {
    match value {
        Value::Str(s) => s.as_ref().clone(),
        other => inspect(other),
    }
}

/// Nested rendering: strings are quoted, containers print their contents.
pub fn inspect(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::Str(s) => format!("'{s}'"),
        Value::Array(items) => {
            let items = items.borrow();
            if items.is_empty() {
                "[]".to_string()
            } else {
                let inner: Vec<String> = items.iter().map(inspect).collect();
                format!("[ {} ]", inner.join(", "))
            }
        }
        Value::Object(obj) => {
            let entries = obj.entries();
            if entries.is_empty() {
                "{}".to_string()
            } else {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", display_key(k), inspect(v)))
                    .collect();
                format!("{{ {} }}", inner.join(", "))
            }
        }
        Value::Function(f) => match &f.name {
            Some(name) => format!("[Function: {name}]"),
            None => "[Function (anonymous)]".to_string(),
        },
        Value::Native(_) | Value::Method(_) => "[Function (native)]".to_string(),
        Value::Promise(p) => match &p.borrow().inner {
            PromiseInner::Pending => "Promise { <pending> }".to_string(),
            PromiseInner::Fulfilled(v) => format!("Promise {{ {} }}", inspect(v)),
            PromiseInner::Rejected(v) => format!("Promise {{ <rejected> {} }}", inspect(v)),
        },
    }
}

/// String conversion used inside template literals and `join`: like
/// [`display`], but arrays flatten to comma-joined contents and objects
/// collapse to the object tag.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Str(s) => s.as_ref().clone(),
        Value::Array(items) => {
            let items = items.borrow();
            items
                .iter()
                .map(|v| match v {
                    Value::Undefined | Value::Null => String::new(),
                    other => stringify(other),
                })
                .collect::<Vec<_>>()
                .join(",")
        }
        Value::Object(_) => "[object Object]".to_string(),
        other => inspect(other),
    }
}

fn display_key(key: &str) -> String {
    let mut chars = key.chars();
    let ident_start = chars
        .next()
        .map(|c| c.is_alphabetic() || c == '_' || c == '$')
        .unwrap_or(false);
    if ident_start && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        key.to_string()
    } else {
        format!("'{key}'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbers_like_the_host_language() {
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn inspects_nested_containers() {
        let value = Value::object(vec![
            ("a".to_string(), Value::Number(1.0)),
            ("tags".to_string(), Value::array(vec![Value::string("x")])),
        ]);
        assert_eq!(inspect(&value), "{ a: 1, tags: [ 'x' ] }");
    }

    #[test]
    fn top_level_strings_print_bare() {
        assert_eq!(display(&Value::string("plain")), "plain");
        assert_eq!(inspect(&Value::string("plain")), "'plain'");
    }
}
