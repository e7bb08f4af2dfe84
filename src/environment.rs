use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame.  Functions, bound methods and child frames
/// all hold one; the frame lives as long as any of them does.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind (or rebind) `name` in this frame.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up along the whole chain.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrite the nearest existing binding of `name`.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Read a binding from this frame only.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// The frame `distance` hops out from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);
    for _ in 0..distance {
        let next: EnvRef = current.borrow().enclosing()?;
        current = next;
    }
    Some(current)
}

/// Read `name` from exactly `distance` frames out, as computed by the resolver.
pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value, RuntimeError> {
    ancestor(env, distance)
        .and_then(|frame| frame.borrow().get_here(&name.lexeme))
        .ok_or_else(|| undefined(name))
}

/// Write `name` exactly `distance` frames out.
pub fn assign_at(
    env: &EnvRef,
    distance: usize,
    name: &Token,
    value: Value,
) -> Result<(), RuntimeError> {
    let frame: EnvRef = ancestor(env, distance).ok_or_else(|| undefined(name))?;
    frame.borrow_mut().define(&name.lexeme, value);
    Ok(())
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}
