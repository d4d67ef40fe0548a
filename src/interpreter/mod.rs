mod env;
pub mod repl;
pub mod stdlib;
mod value;

pub use self::env::Scope;
pub use self::value::{Callable, Function, NativeFunction, Value};

use crate::ast::AST;
use crate::lex::{self, tokenize, Number};
use crate::parse::parse;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Syntax(lex::Error),
    UndefinedVariable(String),
    UndefinedFunction(String),
    Runtime(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(err) => write!(f, "{}", err),
            Error::UndefinedVariable(name) => write!(f, "Undefined variable: {}", name),
            Error::UndefinedFunction(name) => write!(f, "Undefined function: {}", name),
            Error::Runtime(message) => write!(f, "Runtime error: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

impl From<lex::Error> for Error {
    fn from(err: lex::Error) -> Self {
        Error::Syntax(err)
    }
}

/// Name-to-callable table installed into every fresh global scope.
pub type Builtins = HashMap<String, NativeFunction>;

// A bare RECURSE calls whatever function is bound under this name. Nothing
// binds it implicitly.
const RECURSE_TARGET: &str = "__current__";
const MODIFY_SOURCE_TARGET: &str = "source";

/// Result of evaluating one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Value),
    /// Unwinds to the nearest function call, which yields the value.
    Return(Value),
    /// Unwinds all the way out of the run; the run starts over on this source.
    Restart(String),
}

// Evaluates to the plain value of an outcome, or hands any unwinding
// outcome back to the caller.
macro_rules! eval_value {
    ($outcome:expr) => {
        match $outcome? {
            Outcome::Value(val) => val,
            unwind => return Ok(unwind),
        }
    };
}

pub struct Interpreter {
    builtins: Builtins,
    global: Rc<Scope>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_builtins(stdlib::build())
    }

    pub fn with_builtins(builtins: Builtins) -> Self {
        let global = Self::fresh_global(&builtins);
        Interpreter { builtins, global }
    }

    fn fresh_global(builtins: &Builtins) -> Rc<Scope> {
        let global = Scope::new_global();
        for (name, func) in builtins {
            global.define_function(name.clone(), Callable::Native(Rc::clone(func)));
        }
        global
    }

    pub fn global(&self) -> &Rc<Scope> {
        &self.global
    }

    fn reset(&mut self) {
        let old = std::mem::replace(&mut self.global, Self::fresh_global(&self.builtins));
        old.clear();
    }

    /// Runs a program against the session's global scope and returns its
    /// final value. A `MODIFY source` discards every binding and runs the
    /// replacement program from scratch; its result becomes the result here.
    ///
    /// Program recursion maps onto host recursion with no depth limit, so a
    /// program that recurses without end overflows the host stack and aborts
    /// the process.
    pub fn interpret(&mut self, source: &str) -> Result<Value, Error> {
        let mut source = source.to_string();

        loop {
            let tokens = tokenize(&source)?;
            let program = parse(&tokens)?;

            match self.eval(&program, &self.global)? {
                Outcome::Value(val) | Outcome::Return(val) => return Ok(val),
                Outcome::Restart(next) => {
                    self.reset();
                    source = next;
                }
            }
        }
    }

    pub fn eval(&self, node: &AST, scope: &Rc<Scope>) -> Result<Outcome, Error> {
        let val = match node {
            AST::Program(statements) | AST::Block(statements) => {
                return self.eval_block(statements, scope)
            }

            AST::Number(Number::Integer(i)) => Value::Integer(*i),

            AST::Number(Number::Float(x)) => Value::Float(*x),

            AST::String(s) => Value::Str(s.clone()),

            AST::Identifier(name) => scope.get(name)?,

            AST::Assign { name, value } => {
                let val = eval_value!(self.eval(value, scope));
                scope.define(name.clone(), val.clone());
                val
            }

            AST::BinaryOp { op, left, right } => {
                let lhs = eval_value!(self.eval(left, scope));
                let rhs = eval_value!(self.eval(right, scope));
                value::binary_op(*op, &lhs, &rhs)?
            }

            AST::FunctionCall { name, args } => return self.call_named(name, args, scope),

            AST::If {
                condition,
                then_block,
                else_block,
            } => {
                if eval_value!(self.eval(condition, scope)).is_truthy() {
                    return self.eval(then_block, scope);
                }
                match else_block {
                    Some(else_block) => return self.eval(else_block, scope),
                    None => Value::None,
                }
            }

            AST::While { condition, body } => {
                let mut result = Value::None;
                while eval_value!(self.eval(condition, scope)).is_truthy() {
                    result = eval_value!(self.eval(body, scope));
                }
                result
            }

            AST::Define { name, params, body } => {
                let function = Function {
                    params: params.clone(),
                    body: body.as_ref().clone(),
                    env: Rc::clone(scope),
                };
                scope.define_function(name.clone(), Callable::User(Rc::new(function)));
                Value::None
            }

            AST::Return(expr) => return Ok(Outcome::Return(eval_value!(self.eval(expr, scope)))),

            AST::Recurse(args) => return self.call_named(RECURSE_TARGET, args, scope),

            AST::Modify { target, code } => {
                let code = eval_value!(self.eval(code, scope));
                if target != MODIFY_SOURCE_TARGET {
                    Value::None
                } else if let Value::Str(source) = code {
                    return Ok(Outcome::Restart(source));
                } else {
                    return Err(Error::Runtime(format!(
                        "MODIFY {} expects a string, got '{}'",
                        MODIFY_SOURCE_TARGET,
                        code.type_name()
                    )));
                }
            }
        };

        Ok(Outcome::Value(val))
    }

    // Stops at the first unwinding outcome; otherwise yields the value of
    // the last statement.
    fn eval_block(&self, statements: &[AST], scope: &Rc<Scope>) -> Result<Outcome, Error> {
        let mut result = Value::None;
        for stmt in statements {
            result = eval_value!(self.eval(stmt, scope));
        }
        Ok(Outcome::Value(result))
    }

    fn call_named(&self, name: &str, args: &[AST], scope: &Rc<Scope>) -> Result<Outcome, Error> {
        let mut vals = Vec::with_capacity(args.len());
        for arg in args {
            vals.push(eval_value!(self.eval(arg, scope)));
        }

        let callable = scope
            .get_function(name)
            .ok_or_else(|| Error::UndefinedFunction(name.to_string()))?;
        self.call(&callable, vals)
    }

    fn call(&self, callable: &Callable, args: Vec<Value>) -> Result<Outcome, Error> {
        let function = match callable {
            Callable::Native(func) => return Ok(Outcome::Value(func(args.as_slice())?)),
            Callable::User(function) => function,
        };

        // Extra arguments are dropped; missing ones leave their parameter
        // unbound.
        let local = Scope::new_child(&function.env);
        for (param, arg) in function.params.iter().zip(args) {
            local.define(param.clone(), arg);
        }

        match self.eval(&function.body, &local)? {
            Outcome::Return(val) => Ok(Outcome::Value(val)),
            other => Ok(other),
        }
    }
}

// User functions hold the global scope and the global scope holds them, so
// the cycle has to be broken by hand.
impl Drop for Interpreter {
    fn drop(&mut self) {
        self.global.clear();
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
