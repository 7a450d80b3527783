use grolang::ast::is_valid_identifier;
use grolang::builtinops::find_builtin_op;
use grolang::environment::Environment;
use grolang::evaluator;
use grolang::parser::{ParseConfig, parse_statement_with_config};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    env_logger::init();

    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("groLang typed expression evaluator");
    println!("Enter statements like: val x: Int = 3");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let mut env = Environment::new();
    let config = ParseConfig {
        handle_comments: true,
    };
    let mut debug_mode = false;

    loop {
        match rl.readline("gro> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(&env);
                        continue;
                    }
                    ":debug" => {
                        debug_mode = !debug_mode;
                        println!("Debug form {}", if debug_mode { "shown" } else { "hidden" });
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                let statement = with_implicit_declaration(line, &env);
                let expr = match parse_statement_with_config(&statement, config) {
                    Ok(expr) => expr,
                    Err(e) => {
                        println!("READ ERROR: {e}");
                        continue;
                    }
                };

                if debug_mode {
                    println!("→ {}", expr.debug_string());
                }

                match evaluator::eval(&expr, &mut env) {
                    Ok(value) => println!("{value}"),
                    Err(e) => println!("EVAL ERROR: {e}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

/// Prefix `var` when the line assigns to a name that is not declared yet
fn with_implicit_declaration(line: &str, env: &Environment) -> String {
    if let Some((target, rest)) = line.split_once('=')
        && is_valid_identifier(target.trim())
        && !matches!(target.trim(), "val" | "var")
        && !rest.starts_with('=')
        && !env.is_defined(target.trim())
    {
        format!("var {line}")
    } else {
        line.to_owned()
    }
}

fn print_help() {
    println!("groLang REPL:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :debug     - Toggle printing the debug form of each statement");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Statements:");
    println!("  val x: Int         declare an immutable binding");
    println!("  var y = 2.5        declare a mutable binding with an inferred type");
    println!("  x = 3              assign (implicitly declares with var if x is new)");
    println!("  print(str(x))      call a built-in function");
    println!("  {{ val a = 1; a }}   evaluate a block in the same environment");
    println!();
    println!("Literals: 42, 1_000, -1.5e3, .5, \"text\", true, false, null, 'symbol");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.bindings();

    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (symbol, value) in bindings {
        if find_builtin_op(&symbol.name).is_some() {
            builtins.push(symbol.name);
        } else {
            user_defined.push((symbol, value));
        }
    }

    if !builtins.is_empty() {
        println!("Classes and functions ({}):", builtins.len());
        let mut col = 0;
        for name in builtins {
            print!("  {name:<15}");
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (symbol, value) in user_defined {
            let keyword = if symbol.mutable { "var" } else { "val" };
            match value {
                Some(value) => {
                    println!("  {keyword} {}: {} = {value}", symbol.name, symbol.declared)
                }
                None => println!("  {keyword} {}: {}", symbol.name, symbol.declared),
            }
        }
    }
}
