use anyhow::Result;
use delegatecheck::cli::{self, Commands};
use delegatecheck::commands::{self, CheckConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `DELEGATECHECK_LOG` (or `RUST_LOG`) wins over `-v`.
fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("DELEGATECHECK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(format!("delegatecheck={default_level}")));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1),
        )
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::parse_args();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Check {
            inputs,
            config,
            format,
            output,
            enable,
            disable,
            fail_on_findings,
        } => commands::handle_check(CheckConfig {
            inputs,
            config,
            format,
            output,
            enable,
            disable,
            fail_on_findings,
        }),
        Commands::ListCheckers { format } => commands::list_checkers(format),
        Commands::Init { force } => commands::init_config(force),
    }
}
