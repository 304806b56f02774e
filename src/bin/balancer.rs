use balancer::Equation;
use clap::Parser;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::{
    io::{self, BufRead, Write},
    process::ExitCode,
};

/// The environment variable used to set the log level.
const LOG_VARIABLE: &str = "BALANCER_LOG";

#[derive(Parser)]
#[command(
    name = "balancer",
    about = "Balance a chemical equation read from stdin",
    version,
    after_help = "Enter an equation of the form:\n\t_H2O = _H2 + _O2"
)]
struct Cli {}

fn main() -> ExitCode {
    let _ = Cli::parse();
    init_logging();

    let line = match read_equation() {
        Ok(line) => line,
        Err(e) => {
            eprintln!("Unable to read from stdin: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let equation: Equation = match line.trim().parse() {
        Ok(equation) => equation,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    match equation.balance() {
        Ok(balanced) => {
            println!("{}", balanced);
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn read_equation() -> io::Result<String> {
    println!("Enter an equation to balance:");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    Ok(line)
}

fn init_logging() {
    let level = std::env::var(LOG_VARIABLE)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(LevelFilter::Warn);
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();

    // a logger may already be installed, in which case we use that one
    let _ = TermLogger::init(
        level,
        config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}
