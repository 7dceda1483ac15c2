use crate::checkers::{CheckerInfo, CheckerRegistry};
use crate::cli::OutputFormat;
use anyhow::Result;
use colored::*;
use std::io::{self, Write};

pub fn list_checkers(format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_checkers(&mut out, CheckerRegistry::available(), format)
}

pub fn write_checkers<W: Write>(
    out: &mut W,
    checkers: &[CheckerInfo],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, checkers)?;
            writeln!(out)?;
        }
        OutputFormat::Terminal => {
            let width = checkers.iter().map(|c| c.name.len()).max().unwrap_or(0);
            for checker in checkers {
                let name = format!("{:width$}", checker.name);
                writeln!(out, "{}  {}", name.bold(), checker.description)?;
            }
        }
    }
    Ok(())
}
