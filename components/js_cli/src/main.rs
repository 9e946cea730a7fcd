//! jsembed: run JavaScript through the embedding core
//!
//! Entry point for the host program. Parses CLI arguments and delegates to
//! the Runtime for execution.

use clap::Parser as ClapParser;
use js_cli::{Cli, CliError, Runtime};
use tracing_subscriber::{fmt, EnvFilter};

fn install_subscriber(trace: bool) {
    let default = if trace { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn report(error: &CliError) -> ! {
    eprintln!("{error}");
    std::process::exit(error.exit_code());
}

fn main() {
    let cli = Cli::parse();
    install_subscriber(cli.trace);

    let mut runtime = match Runtime::from_cli(&cli) {
        Ok(runtime) => runtime.with_echo(true),
        Err(e) => report(&e),
    };

    let outcome = if let Some(file) = &cli.file {
        runtime.execute_file(file).map(Some)
    } else if let Some(code) = &cli.eval {
        runtime.execute_string(code).map(Some)
    } else if cli.repl {
        runtime.repl().map(|()| None)
    } else {
        println!("jsembed {}", js_cli::runtime::VERSION);
        println!();
        println!("Usage:");
        println!("  jsembed --file <FILE>     Execute a JavaScript file");
        println!("  jsembed --eval <CODE>     Evaluate inline JavaScript code");
        println!("  jsembed --repl            Start interactive REPL");
        println!();
        println!("Run 'jsembed --help' for more options.");
        Ok(None)
    };

    match outcome {
        Ok(Some(value)) => {
            // Print result if not undefined
            if !value.is_undefined().unwrap_or(true) {
                match runtime.display(&value) {
                    Ok(text) => println!("{text}"),
                    Err(e) => report(&e),
                }
            }
        }
        Ok(None) => {}
        Err(e) => report(&e),
    }
}
