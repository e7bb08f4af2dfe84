use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::LoxFunction;
use crate::error::{Result, RuntimeError};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::{Callable, Value};

/// A class: its methods plus an optional single superclass.
pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look `name` up on this class, then up the superclass chain.  The first
    /// class defining it wins.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name)),
        }
    }

    /// Calling a class takes as many arguments as its `init` does.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Build a new instance and run `init` on it, if the class has one.
    pub fn instantiate(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance: Value = Value::Instance(Rc::new(RefCell::new(Instance::new(Rc::clone(class)))));

        if let Some(initializer) = class.find_method("init") {
            initializer
                .bind(instance.clone())
                .call(interpreter, arguments)?;
        }

        Ok(instance)
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxClass")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name()))
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An object: its class plus fields created on first assignment.
pub struct Instance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property read: own fields shadow methods; methods come back bound to
    /// this instance.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(&name.lexeme) {
            let bound = method.bind(Value::Instance(Rc::clone(instance)));
            return Ok(Value::Callable(Callable::Function(Rc::new(bound))));
        }

        Err(RuntimeError::new(name, format!("Undefined property '{}'.", name.lexeme)).into())
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name())
    }
}
