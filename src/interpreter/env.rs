use super::value::{Callable, Value};
use super::Error;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One link of the scope chain. Variables and functions live in separate
/// namespaces. Reads walk outward to the global scope; writes always land
/// in the scope they are made in.
pub struct Scope {
    parent: Option<Rc<Scope>>,
    variables: RefCell<HashMap<String, Value>>,
    functions: RefCell<HashMap<String, Callable>>,
}

impl Scope {
    pub fn new_global() -> Rc<Self> {
        Rc::new(Scope {
            parent: None,
            variables: RefCell::new(HashMap::new()),
            functions: RefCell::new(HashMap::new()),
        })
    }

    pub fn new_child(parent: &Rc<Scope>) -> Rc<Self> {
        Rc::new(Scope {
            parent: Some(Rc::clone(parent)),
            variables: RefCell::new(HashMap::new()),
            functions: RefCell::new(HashMap::new()),
        })
    }

    pub fn define(&self, name: String, value: Value) {
        self.variables.borrow_mut().insert(name, value);
    }

    pub fn get(&self, name: &str) -> Result<Value, Error> {
        self.lookup(name)
            .ok_or_else(|| Error::UndefinedVariable(name.to_string()))
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.variables
            .borrow()
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.lookup(name)))
    }

    pub fn define_function(&self, name: String, callable: Callable) {
        self.functions.borrow_mut().insert(name, callable);
    }

    /// Absence is left to the caller to report.
    pub fn get_function(&self, name: &str) -> Option<Callable> {
        self.functions
            .borrow()
            .get(name)
            .cloned()
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|parent| parent.get_function(name))
            })
    }

    // Functions hold their defining scope, so a scope that defined functions
    // is part of a reference cycle until its tables are emptied.
    pub(super) fn clear(&self) {
        let variables = std::mem::take(&mut *self.variables.borrow_mut());
        let functions = std::mem::take(&mut *self.functions.borrow_mut());
        drop(variables);
        drop(functions);
    }
}
