use anyhow::Context;
use smodr::interpreter::repl::{display_result, repl};
use smodr::interpreter::{Builtins, Interpreter};
use std::fs;

fn main() -> anyhow::Result<()> {
    let matches = clap::App::new("smodr")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Aidan Wolk")
        .about("Interpreter for a self-modifying scripting language")
        .arg(
            clap::Arg::with_name("FILE")
                .help("Source file to run. Starts an interactive session if not given.")
                .required(false),
        )
        .arg(
            clap::Arg::with_name("NoBuiltins")
                .long("no-builtins")
                .help("Start without print, input, str, int and float."),
        )
        .get_matches();

    let mut interpreter = if matches.is_present("NoBuiltins") {
        Interpreter::with_builtins(Builtins::new())
    } else {
        Interpreter::new()
    };

    match matches.value_of("FILE") {
        Some(filename) => {
            let source = fs::read_to_string(filename)
                .with_context(|| format!("could not read {}", filename))?;
            let result = interpreter
                .interpret(&source)
                .with_context(|| format!("while running {}", filename))?;
            if let Some(text) = display_result(&result) {
                println!("{}", text);
            }
        }
        None => {
            println!("smodr {}", env!("CARGO_PKG_VERSION"));
            println!("Type 'exit' or press Ctrl-D to quit.");
            repl(&mut interpreter);
        }
    }

    Ok(())
}
