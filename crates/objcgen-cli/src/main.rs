mod cli;
mod commands;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use commands::dump::DumpArgs;
use commands::emit::EmitArgs;
use commands::inspect::InspectArgs;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "OBJCGEN_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Dump { unit, config, output } => commands::dump::run(DumpArgs {
            unit,
            config,
            color: output.color.should_colorize(),
        }),
        Command::Emit { unit, output, config } => {
            commands::emit::run(EmitArgs { unit, output, config })
        }
        Command::Inspect { image, output } => commands::inspect::run(InspectArgs {
            image,
            color: output.color.should_colorize(),
        }),
    }
}
