//! Entry point for the demo shell.

use std::io;

use clap::Parser;
use schema_shell_repl::Shell;
use tracing_subscriber::EnvFilter;

mod demo;

#[derive(Parser, Debug)]
#[command(
    name = "schema-shell",
    version,
    about = "Interactive schema-driven command shell demo"
)]
struct Cli {
    /// Log filter directive, e.g. "debug" or "schema_shell_repl=trace"
    #[arg(long, default_value = "warn")]
    log: String,

    /// Run a single command line and exit instead of starting the shell
    #[arg(short = 'c', long)]
    command: Option<String>,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let mut shell = Shell::new(demo::build(), stdin.lock(), io::stdout());
    match cli.command {
        Some(line) => {
            shell.process_line(&line)?;
        }
        None => shell.run()?,
    }
    Ok(())
}
