//! Lexical environments.
//!
//! Environments form a parent chain; every block, function call, and loop
//! iteration gets a fresh child frame, which is what makes each snippet's
//! "different scopes" examples hold. Closures keep their defining frame
//! alive through the `Rc` link.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interp::value::Value;
use crate::interp::RuntimeError;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Debug, Default)]
pub struct Env {
    vars: RefCell<HashMap<String, Binding>>,
    parent: Option<Rc<Env>>,
}

impl Env {
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn child(parent: &Rc<Env>) -> Rc<Self> {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    /// Introduce a binding in this frame. Same-frame duplicates are normally
    /// rejected by the parser; this is the runtime backstop.
    pub fn declare(
        &self,
        name: &str,
        value: Value,
        mutable: bool,
    ) -> Result<(), RuntimeError> {
        let mut vars = self.vars.borrow_mut();
        if vars.contains_key(name) {
            return Err(RuntimeError::syntax(format!(
                "Identifier '{name}' has already been declared"
            )));
        }
        vars.insert(name.to_string(), Binding { value, mutable });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.vars.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.parent.as_ref()?.lookup(name)
    }

    /// Assign to the nearest binding with this name, walking the chain.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        {
            let mut vars = self.vars.borrow_mut();
            if let Some(binding) = vars.get_mut(name) {
                if !binding.mutable {
                    return Err(RuntimeError::type_error(
                        "Assignment to constant variable.",
                    ));
                }
                binding.value = value;
                return Ok(());
            }
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(RuntimeError::reference(format!("{name} is not defined"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_frames_shadow_without_leaking() {
        let root = Env::root();
        root.declare("x", Value::Number(1.0), true).unwrap();

        let inner = Env::child(&root);
        inner.declare("x", Value::Number(2.0), false).unwrap();
        assert!(matches!(inner.lookup("x"), Some(Value::Number(n)) if n == 2.0));
        assert!(matches!(root.lookup("x"), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn assignment_to_const_fails() {
        let root = Env::root();
        root.declare("limit", Value::Number(3.0), false).unwrap();
        let err = root.assign("limit", Value::Number(4.0)).unwrap_err();
        assert_eq!(err.kind, crate::models::ErrorKind::Type);
    }

    #[test]
    fn assignment_walks_the_chain() {
        let root = Env::root();
        root.declare("total", Value::Number(0.0), true).unwrap();
        let inner = Env::child(&root);
        inner.assign("total", Value::Number(5.0)).unwrap();
        assert!(matches!(root.lookup("total"), Some(Value::Number(n)) if n == 5.0));
    }
}
