use super::{Interpreter, Value};
use rustyline::error::ReadlineError;
use rustyline::Editor;

const PROMPT: &str = "smodr> ";

/// What a session shows for a finished run. `None` results show nothing.
pub fn display_result(val: &Value) -> Option<String> {
    match val {
        Value::None => None,
        val => Some(val.to_string()),
    }
}

/// Reads lines until `exit` or end of input, running each against the same
/// interpreter. Errors are reported and the session carries on.
pub fn repl(interpreter: &mut Interpreter) {
    let mut editor = Editor::<()>::new();

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return,
            Err(err) => {
                eprintln!("Error: {}", err);
                return;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") {
            return;
        }
        editor.add_history_entry(line);

        match interpreter.interpret(line) {
            Ok(val) => {
                if let Some(text) = display_result(&val) {
                    println!("{}", text);
                }
            }
            Err(err) => eprintln!("Error: {}", err),
        }
    }
}
