//! The built-in surface a snippet can reach: `console.log`, the `Object`
//! and `Promise` namespaces, `setTimeout`, and the array/string/promise
//! methods the catalog's examples use.

use std::cell::RefCell;
use std::rc::Rc;

use crate::interp::machine::{Exec, Machine, Signal};
use crate::interp::scope::Env;
use crate::interp::value::{
    display, stringify, BoundMethod, MethodKind, NativeFn, PromiseState, Reaction, Value,
};
use crate::interp::RuntimeError;

/// Populate a fresh global scope with the built-in bindings.
pub(crate) fn install(global: &Rc<Env>) {
    let console = Value::object(vec![(
        "log".to_string(),
        Value::Native(NativeFn::ConsoleLog),
    )]);
    let object_ns = Value::object(vec![
        ("keys".to_string(), Value::Native(NativeFn::ObjectKeys)),
        ("values".to_string(), Value::Native(NativeFn::ObjectValues)),
        ("entries".to_string(), Value::Native(NativeFn::ObjectEntries)),
        ("assign".to_string(), Value::Native(NativeFn::ObjectAssign)),
    ]);
    let promise_ns = Value::object(vec![
        ("resolve".to_string(), Value::Native(NativeFn::PromiseResolve)),
        ("reject".to_string(), Value::Native(NativeFn::PromiseReject)),
    ]);
    let bindings = [
        ("console", console),
        ("Object", object_ns),
        ("Promise", promise_ns),
        ("setTimeout", Value::Native(NativeFn::SetTimeout)),
    ];
    for (name, value) in bindings {
        global
            .declare(name, value, false)
            .expect("global scope starts empty");
    }
}

pub(crate) fn call_native(machine: &mut Machine, native: NativeFn, args: Vec<Value>) -> Exec<Value> {
    match native {
        NativeFn::ConsoleLog => {
            let line = args.iter().map(display).collect::<Vec<_>>().join(" ");
            machine.push_output(&line);
            Ok(Value::Undefined)
        }
        NativeFn::ObjectKeys => {
            let keys = enumerable_keys(args.first(), "Object.keys")?;
            Ok(Value::array(keys.into_iter().map(Value::string).collect()))
        }
        NativeFn::ObjectValues => match args.first() {
            Some(Value::Object(obj)) => Ok(Value::array(
                obj.entries().into_iter().map(|(_, v)| v).collect(),
            )),
            Some(Value::Array(items)) => Ok(Value::array(items.borrow().clone())),
            _ => Err(not_an_object("Object.values")),
        },
        NativeFn::ObjectEntries => match args.first() {
            Some(Value::Object(obj)) => Ok(Value::array(
                obj.entries()
                    .into_iter()
                    .map(|(k, v)| Value::array(vec![Value::string(k), v]))
                    .collect(),
            )),
            Some(Value::Array(items)) => Ok(Value::array(
                items
                    .borrow()
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Value::array(vec![Value::string(i.to_string()), v.clone()]))
                    .collect(),
            )),
            _ => Err(not_an_object("Object.entries")),
        },
        NativeFn::ObjectAssign => {
            let mut args = args.into_iter();
            let target = args.next().unwrap_or(Value::Undefined);
            let Value::Object(obj) = &target else {
                return Err(not_an_object("Object.assign"));
            };
            for source in args {
                if let Value::Object(source) = &source {
                    for (key, value) in source.entries() {
                        obj.set(&key, value);
                    }
                }
            }
            Ok(target)
        }
        NativeFn::SetTimeout => {
            let mut args = args.into_iter();
            let callback = args.next().unwrap_or(Value::Undefined);
            if !is_callable(&callback) {
                return Err(Signal::Error(RuntimeError::type_error(
                    "setTimeout expects a function",
                )));
            }
            let delay = match args.next() {
                Some(Value::Number(n)) if n > 0.0 => n as u64,
                _ => 0,
            };
            let extra: Vec<Value> = args.collect();
            let id = machine.schedule_timer(callback, extra, delay);
            Ok(Value::Number(id as f64))
        }
        NativeFn::PromiseResolve => {
            let value = args.into_iter().next().unwrap_or(Value::Undefined);
            match value {
                // Resolving an existing promise hands it back unchanged.
                Value::Promise(_) => Ok(value),
                other => Ok(Value::Promise(PromiseState::fulfilled(other))),
            }
        }
        NativeFn::PromiseReject => {
            let value = args.into_iter().next().unwrap_or(Value::Undefined);
            Ok(Value::Promise(PromiseState::rejected(value)))
        }
    }
}

pub(crate) fn call_method(
    machine: &mut Machine,
    method: &BoundMethod,
    args: Vec<Value>,
) -> Exec<Value> {
    match (method.kind, &method.recv) {
        (MethodKind::ArrayPush, Value::Array(items)) => {
            let mut items = items.borrow_mut();
            items.extend(args);
            Ok(Value::Number(items.len() as f64))
        }
        (MethodKind::ArrayJoin, Value::Array(items)) => {
            let sep = match args.first() {
                Some(Value::Str(s)) => s.as_ref().clone(),
                _ => ",".to_string(),
            };
            let parts: Vec<String> = items
                .borrow()
                .iter()
                .map(|v| match v {
                    Value::Undefined | Value::Null => String::new(),
                    other => stringify(other),
                })
                .collect();
            Ok(Value::string(parts.join(&sep)))
        }
        (MethodKind::ArrayMap, Value::Array(items)) => {
            let callback = args.into_iter().next().unwrap_or(Value::Undefined);
            let snapshot = items.borrow().clone();
            let mut mapped = Vec::with_capacity(snapshot.len());
            for (i, item) in snapshot.into_iter().enumerate() {
                let result =
                    machine.call_value(&callback, vec![item, Value::Number(i as f64)], "callback")?;
                mapped.push(result);
            }
            Ok(Value::array(mapped))
        }
        (MethodKind::ArrayIncludes, Value::Array(items)) => {
            let needle = args.into_iter().next().unwrap_or(Value::Undefined);
            let found = items.borrow().iter().any(|v| v.strict_eq(&needle));
            Ok(Value::Bool(found))
        }
        (MethodKind::StrToUpperCase, Value::Str(s)) => Ok(Value::string(s.to_uppercase())),
        (MethodKind::StrToLowerCase, Value::Str(s)) => Ok(Value::string(s.to_lowercase())),
        (MethodKind::PromiseThen, Value::Promise(source)) => {
            let mut args = args.into_iter();
            let on_fulfilled = args.next().filter(is_callable);
            let on_rejected = args.next().filter(is_callable);
            Ok(chain(machine, source, on_fulfilled, on_rejected))
        }
        (MethodKind::PromiseCatch, Value::Promise(source)) => {
            let on_rejected = args.into_iter().next().filter(is_callable);
            Ok(chain(machine, source, None, on_rejected))
        }
        (MethodKind::PromiseResolveCap, Value::Promise(promise)) => {
            let value = args.into_iter().next().unwrap_or(Value::Undefined);
            machine.resolve_promise(promise, value);
            Ok(Value::Undefined)
        }
        (MethodKind::PromiseRejectCap, Value::Promise(promise)) => {
            let value = args.into_iter().next().unwrap_or(Value::Undefined);
            machine.reject_promise(promise, value);
            Ok(Value::Undefined)
        }
        // Methods are only minted with a matching receiver in get_property.
        _ => Err(Signal::Error(RuntimeError::type_error(
            "method called on an incompatible receiver",
        ))),
    }
}

/// Register handlers on a promise and hand back the derived promise.
fn chain(
    machine: &mut Machine,
    source: &Rc<RefCell<PromiseState>>,
    on_fulfilled: Option<Value>,
    on_rejected: Option<Value>,
) -> Value {
    let target = PromiseState::pending();
    machine.add_reaction(
        source.clone(),
        Reaction {
            on_fulfilled,
            on_rejected,
            target: target.clone(),
        },
    );
    Value::Promise(target)
}

/// Property access on a non-nullish value. Unknown properties read as
/// `undefined` rather than faulting.
pub(crate) fn get_property(object: &Value, property: &str) -> Value {
    match object {
        Value::Object(obj) => obj.get(property).unwrap_or(Value::Undefined),
        Value::Array(items) => match property {
            "length" => Value::Number(items.borrow().len() as f64),
            "push" => bound(object, MethodKind::ArrayPush),
            "join" => bound(object, MethodKind::ArrayJoin),
            "map" => bound(object, MethodKind::ArrayMap),
            "includes" => bound(object, MethodKind::ArrayIncludes),
            _ => Value::Undefined,
        },
        Value::Str(s) => match property {
            "length" => Value::Number(s.chars().count() as f64),
            "toUpperCase" => bound(object, MethodKind::StrToUpperCase),
            "toLowerCase" => bound(object, MethodKind::StrToLowerCase),
            _ => Value::Undefined,
        },
        Value::Promise(_) => match property {
            "then" => bound(object, MethodKind::PromiseThen),
            "catch" => bound(object, MethodKind::PromiseCatch),
            _ => Value::Undefined,
        },
        _ => Value::Undefined,
    }
}

fn bound(recv: &Value, kind: MethodKind) -> Value {
    Value::Method(Rc::new(BoundMethod {
        recv: recv.clone(),
        kind,
    }))
}

fn is_callable(value: &Value) -> bool {
    matches!(
        value,
        Value::Function(_) | Value::Native(_) | Value::Method(_)
    )
}

fn not_an_object(what: &str) -> Signal {
    Signal::Error(RuntimeError::type_error(format!(
        "{what} expects an object"
    )))
}

fn enumerable_keys(value: Option<&Value>, what: &str) -> Result<Vec<String>, Signal> {
    match value {
        Some(Value::Object(obj)) => Ok(obj.keys()),
        Some(Value::Array(items)) => {
            Ok((0..items.borrow().len()).map(|i| i.to_string()).collect())
        }
        _ => Err(not_an_object(what)),
    }
}
