use super::{Builtins, Error, NativeFunction, Value};
use std::io::{stdin, stdout, Write};
use std::rc::Rc;

fn arity_error(name: &str, args: &[Value]) -> Error {
    Error::Runtime(format!(
        "'{}' takes at most 1 argument, got {}",
        name,
        args.len()
    ))
}

fn print(args: &[Value]) -> Result<Value, Error> {
    let line = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", line);
    Ok(Value::None)
}

fn input(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => {}
        [prompt] => {
            let mut stdout = stdout();
            write!(stdout, "{}", prompt)
                .and_then(|_| stdout.flush())
                .map_err(|err| Error::Runtime(format!("could not write prompt: {}", err)))?;
        }
        _ => return Err(arity_error("input", args)),
    }

    let mut line = String::new();
    match stdin().read_line(&mut line) {
        Err(err) => return Err(Error::Runtime(format!("could not read input: {}", err))),
        Ok(0) => return Err(Error::Runtime("end of input".to_string())),
        _ => {}
    }

    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::Str(line))
}

fn to_str(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => Ok(Value::Str(String::new())),
        [val] => Ok(Value::Str(val.to_string())),
        _ => Err(arity_error("str", args)),
    }
}

fn to_int(args: &[Value]) -> Result<Value, Error> {
    let val = match args {
        [] => return Ok(Value::Integer(0)),
        [val] => val,
        _ => return Err(arity_error("int", args)),
    };

    match val {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        Value::Bool(b) => Ok(Value::Integer(*b as i64)),
        Value::Float(x) => {
            let truncated = x.trunc();
            if truncated.is_finite()
                && truncated >= i64::MIN as f64
                && truncated < i64::MAX as f64
            {
                Ok(Value::Integer(truncated as i64))
            } else {
                Err(Error::Runtime(format!("cannot convert {} to int", x)))
            }
        }
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Integer).map_err(|_| {
            Error::Runtime(format!("invalid literal for int(): '{}'", s))
        }),
        Value::None => Err(Error::Runtime(
            "the argument to 'int' must be a number or a string".to_string(),
        )),
    }
}

fn to_float(args: &[Value]) -> Result<Value, Error> {
    let val = match args {
        [] => return Ok(Value::Float(0.0)),
        [val] => val,
        _ => return Err(arity_error("float", args)),
    };

    match val {
        Value::Integer(i) => Ok(Value::Float(*i as f64)),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Bool(b) => Ok(Value::Float(*b as i64 as f64)),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            Error::Runtime(format!("could not convert string to float: '{}'", s))
        }),
        Value::None => Err(Error::Runtime(
            "the argument to 'float' must be a number or a string".to_string(),
        )),
    }
}

/// The host functions every program starts with.
pub fn build() -> Builtins {
    let mut bindings = Builtins::new();

    let natives: [(&str, fn(&[Value]) -> Result<Value, Error>); 5] = [
        ("print", print),
        ("input", input),
        ("str", to_str),
        ("int", to_int),
        ("float", to_float),
    ];
    for (name, func) in natives.iter() {
        let native: NativeFunction = Rc::new(*func);
        bindings.insert(name.to_string(), native);
    }

    bindings
}
