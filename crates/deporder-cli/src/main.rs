#![forbid(unsafe_code)]

mod cmd;
mod output;
mod render;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "deporder: order files by their before/after declarations",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Concatenate sources in dependency order",
        long_about = "Scan a directory, order its files by their `# before:` / `# after:` \
                      headers, and concatenate them between START/END banners.",
        after_help = "EXAMPLES:\n    # Render ./profile.d to stdout\n    deporder compile profile.d\n\n    # Rebuild only when a fragment changed\n    deporder compile profile.d --out profile.sh\n\n    # Report per-fragment timing when sourced\n    deporder compile profile.d --timed"
    )]
    Compile(cmd::compile::CompileArgs),

    #[command(
        about = "Print the computed order",
        after_help = "EXAMPLES:\n    # One name per line\n    deporder order profile.d\n\n    # Emit machine-readable output\n    deporder order profile.d --json"
    )]
    Order(cmd::order::OrderArgs),

    #[command(
        about = "List ordering cycles",
        after_help = "EXAMPLES:\n    # Show which declarations loop\n    deporder cycles profile.d"
    )]
    Cycles(cmd::cycles::CyclesArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DEPORDER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "deporder=debug,info"
        } else {
            "deporder=info,warn"
        })
    });

    let format = env::var("DEPORDER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(?cli, "parsed arguments");

    let output = cli.output_mode();
    let result = match &cli.command {
        Commands::Compile(args) => cmd::compile::run_compile(args),
        Commands::Order(args) => cmd::order::run_order(args, output),
        Commands::Cycles(args) => cmd::cycles::run_cycles(args, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(render_err) = render_error(output, &CliError::from_error(&err)) {
                eprintln!("error: {err:#} (and failed to render it: {render_err})");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::parse_from(["deporder", "order", "--json", "dir"]);
        assert_eq!(cli.output_mode(), OutputMode::Json);
        assert!(matches!(cli.command, Commands::Order(_)));
    }
}
