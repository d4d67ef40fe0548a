use super::env::Scope;
use super::Error;
use crate::ast::{BinaryOperator, AST};
use crate::lex::Number;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Host-provided callable reachable through the function namespace.
pub type NativeFunction = Rc<dyn Fn(&[Value]) -> Result<Value, Error>>;

/// A user function: its parameters, its body, and the scope that was
/// active when its DEFINE ran.
pub struct Function {
    pub(super) params: Vec<String>,
    pub(super) body: AST,
    pub(super) env: Rc<Scope>,
}

#[derive(Clone)]
pub enum Callable {
    Native(NativeFunction),
    User(Rc<Function>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    None,
    Integer(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
        }
    }

    /// Zero, the empty string, false and none are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Integer(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
        }
    }

    // booleans count as 0 and 1
    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Integer(i) => Some(Number::Integer(*i)),
            Value::Float(x) => Some(Number::Float(*x)),
            Value::Bool(b) => Some(Number::Integer(*b as i64)),
            _ => None,
        }
    }

    fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            _ => match (self.as_number(), other.as_number()) {
                (Some(Number::Integer(a)), Some(Number::Integer(b))) => a == b,
                (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
                _ => false,
            },
        }
    }

    fn compare(&self, op: BinaryOperator, other: &Value) -> Result<Option<Ordering>, Error> {
        if let (Value::Str(a), Value::Str(b)) = (self, other) {
            return Ok(Some(a.cmp(b)));
        }

        match (self.as_number(), other.as_number()) {
            (Some(Number::Integer(a)), Some(Number::Integer(b))) => Ok(Some(a.cmp(&b))),
            (Some(a), Some(b)) => Ok(a.as_f64().partial_cmp(&b.as_f64())),
            _ => Err(operand_error(op, self, other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
        }
    }
}

// Shortest round-trip digits. Exponent form below 1e-4 and from 1e16 up,
// with a signed exponent of at least two digits.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return format!("{:.1}", x);
    }

    let sci = format!("{:e}", x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if (-4..16).contains(&exp) {
        if x.fract() == 0.0 {
            format!("{:.1}", x)
        } else {
            format!("{}", x)
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    }
}

fn operand_error(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Error {
    Error::Runtime(format!(
        "unsupported operand types for {}: '{}' and '{}'",
        op,
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn arithmetic(
    op: BinaryOperator,
    lhs: &Value,
    rhs: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, Error> {
    match (lhs.as_number(), rhs.as_number()) {
        (Some(Number::Integer(a)), Some(Number::Integer(b))) => int_op(a, b)
            .map(Value::Integer)
            .ok_or_else(|| Error::Runtime(format!("integer overflow in '{}'", op))),
        (Some(a), Some(b)) => Ok(Value::Float(float_op(a.as_f64(), b.as_f64()))),
        _ => Err(operand_error(op, lhs, rhs)),
    }
}

fn repeat(s: &str, count: &Value) -> Option<Result<Value, Error>> {
    let count = match count.as_number() {
        Some(Number::Integer(n)) => n.max(0) as usize,
        _ => return None,
    };
    if s.is_empty() {
        return Some(Ok(Value::Str(String::new())));
    }

    // Reserving up front turns an impossible length into an error instead
    // of an allocation failure.
    let mut repeated = String::new();
    let reserved = s
        .len()
        .checked_mul(count)
        .map_or(false, |len| repeated.try_reserve_exact(len).is_ok());
    if !reserved {
        return Some(Err(Error::Runtime(
            "repeated string is too long".to_string(),
        )));
    }

    for _ in 0..count {
        repeated.push_str(s);
    }
    Some(Ok(Value::Str(repeated)))
}

/// Applies a binary operator. Both operands are already evaluated.
pub fn binary_op(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    match op {
        BinaryOperator::Add => match (lhs, rhs) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            _ => arithmetic(op, lhs, rhs, i64::checked_add, |a, b| a + b),
        },
        BinaryOperator::Sub => arithmetic(op, lhs, rhs, i64::checked_sub, |a, b| a - b),
        BinaryOperator::Mul => {
            let repeated = match (lhs, rhs) {
                (Value::Str(s), count) | (count, Value::Str(s)) => repeat(s, count),
                _ => None,
            };
            match repeated {
                Some(res) => res,
                None => arithmetic(op, lhs, rhs, i64::checked_mul, |a, b| a * b),
            }
        }
        BinaryOperator::Div => match (lhs.as_number(), rhs.as_number()) {
            (Some(_), Some(b)) if b.as_f64() == 0.0 => {
                Err(Error::Runtime("division by zero".to_string()))
            }
            (Some(a), Some(b)) => Ok(Value::Float(a.as_f64() / b.as_f64())),
            _ => Err(operand_error(op, lhs, rhs)),
        },
        BinaryOperator::Eq => Ok(Value::Bool(lhs.loose_eq(rhs))),
        BinaryOperator::NotEq => Ok(Value::Bool(!lhs.loose_eq(rhs))),
        BinaryOperator::Lt => Ok(Value::Bool(lhs.compare(op, rhs)? == Some(Ordering::Less))),
        BinaryOperator::Gt => Ok(Value::Bool(lhs.compare(op, rhs)? == Some(Ordering::Greater))),
        BinaryOperator::LtEq => Ok(Value::Bool(matches!(
            lhs.compare(op, rhs)?,
            Some(Ordering::Less) | Some(Ordering::Equal)
        ))),
        BinaryOperator::GtEq => Ok(Value::Bool(matches!(
            lhs.compare(op, rhs)?,
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ))),
    }
}
