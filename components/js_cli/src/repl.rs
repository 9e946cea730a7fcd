//! REPL (Read-Eval-Print Loop) implementation

use crate::error::{CliError, CliResult};
use crate::runtime::Runtime;
use embed_core::ErrorKind;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Run the interactive REPL
///
/// # Arguments
/// * `runtime` - The Runtime instance to use for execution
///
/// # Returns
/// `Ok(())` when REPL exits normally
pub fn run_repl(runtime: &mut Runtime) -> CliResult<()> {
    let mut editor = DefaultEditor::new()?;

    println!("jsembed {}", crate::runtime::VERSION);
    println!("Type JavaScript code, .help for commands or .exit to quit.");
    println!();

    let mut line_buffer = String::new();
    let mut in_multiline = false;

    loop {
        let prompt = if in_multiline { "... " } else { "> " };

        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if !in_multiline && (trimmed == "exit" || trimmed == ".exit" || trimmed == "quit") {
                    println!("Goodbye!");
                    break;
                }

                if !in_multiline && trimmed.starts_with('.') {
                    match handle_repl_command(trimmed, runtime) {
                        Ok(text) => print!("{text}"),
                        Err(e) => eprintln!("Error: {e}"),
                    }
                    continue;
                }

                if in_multiline {
                    line_buffer.push('\n');
                }
                line_buffer.push_str(&line);

                if !is_input_complete(&line_buffer) {
                    in_multiline = true;
                    continue;
                }

                let _ = editor.add_history_entry(&line_buffer);

                match runtime.execute_string(&line_buffer) {
                    Ok(value) => match runtime.display(&value) {
                        Ok(text) => println!("{text}"),
                        Err(e) => eprintln!("Error: {e}"),
                    },
                    Err(e) if is_truncated_input(&e) => {
                        in_multiline = true;
                        continue;
                    }
                    Err(e) => eprintln!("{e}"),
                }

                in_multiline = false;
                line_buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                if in_multiline {
                    println!("^C");
                    line_buffer.clear();
                    in_multiline = false;
                } else {
                    println!("Press Ctrl-D or type .exit to quit");
                }
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// Run a `.command` and return the text to print
fn handle_repl_command(command: &str, runtime: &Runtime) -> CliResult<String> {
    let text = match command {
        ".help" => [
            "REPL Commands:",
            "  .help     - Show this help message",
            "  .clear    - Clear the screen",
            "  .stats    - Show isolate handle and context counts",
            "  .exit     - Exit the REPL",
            "",
        ]
        .join("\n"),
        ".clear" => "\x1B[2J\x1B[1;1H".to_string(),
        ".stats" => {
            let stats = serde_json::to_string_pretty(&runtime.stats())
                .map_err(|e| CliError::Repl(e.to_string()))?;
            format!("{stats}\n")
        }
        _ => format!("Unknown command: {command}\nType .help for available commands\n"),
    };
    Ok(text)
}

/// A syntax error caused by input that simply stopped too early
fn is_truncated_input(error: &CliError) -> bool {
    let CliError::Embed(error) = error else {
        return false;
    };
    error.exception().is_some_and(|exception| {
        let info = exception.info();
        info.kind == ErrorKind::SyntaxError && info.message.contains("end of input")
    })
}

/// Check if the input appears to be complete
///
/// This is a simple heuristic that checks for balanced braces/brackets/parens
fn is_input_complete(input: &str) -> bool {
    let mut brace_count = 0;
    let mut bracket_count = 0;
    let mut paren_count = 0;
    let mut in_string = false;
    let mut string_char = ' ';
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if !in_string {
            match c {
                '"' | '\'' | '`' => {
                    in_string = true;
                    string_char = c;
                }
                '{' => brace_count += 1,
                '}' => brace_count -= 1,
                '[' => bracket_count += 1,
                ']' => bracket_count -= 1,
                '(' => paren_count += 1,
                ')' => paren_count -= 1,
                _ => {}
            }
        } else if c == string_char {
            in_string = false;
        }
    }

    brace_count <= 0 && bracket_count <= 0 && paren_count <= 0 && !in_string
}
