use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "delegatecheck")]
#[command(about = "Static checker for dangling delegate references in Objective-C")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the enabled checkers over exported translation units
    Check {
        /// Translation units in JSON form
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Configuration file (defaults to the nearest .delegatecheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run only these checkers
        #[arg(long = "enable", value_delimiter = ',')]
        enable: Vec<String>,

        /// Never run these checkers
        #[arg(long = "disable", value_delimiter = ',')]
        disable: Vec<String>,

        /// Exit with a non-zero status when anything is reported
        #[arg(long = "fail-on-findings")]
        fail_on_findings: bool,
    },

    /// List the available checkers
    ListCheckers {
        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Write a default .delegatecheck.toml into the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Terminal,
}

impl From<OutputFormat> for crate::diagnostics::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => crate::diagnostics::OutputFormat::Json,
            OutputFormat::Terminal => crate::diagnostics::OutputFormat::Terminal,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
