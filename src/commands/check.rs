use crate::ast::load_translation_unit;
use crate::checkers::{AnalysisSummary, CheckerRegistry};
use crate::cli::OutputFormat;
use crate::config::{load_config, load_config_from_path, AnalyzerConfig, CheckersConfig};
use crate::diagnostics::{create_writer, Diagnostic};
use crate::engine::ExplorationStats;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

pub struct CheckConfig {
    pub inputs: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub enable: Vec<String>,
    pub disable: Vec<String>,
    pub fail_on_findings: bool,
}

pub fn handle_check(config: CheckConfig) -> Result<()> {
    let analyzer_config = resolve_config(&config)?;
    let registry = CheckerRegistry::from_config(&analyzer_config);
    log::info!("Enabled checkers: {}", registry.enabled_names().join(", "));

    let summaries = analyze_inputs(&registry, &config.inputs)?;
    let diagnostics = merge_diagnostics(&summaries);
    log_totals(&summaries);

    write_report(&diagnostics, config.format, config.output.as_ref())?;

    if config.fail_on_findings && !diagnostics.is_empty() {
        anyhow::bail!("{} issue(s) reported", diagnostics.len())
    }
    Ok(())
}

/// The configuration file (explicit or discovered) with command-line
/// checker selection applied on top.
pub fn resolve_config(config: &CheckConfig) -> Result<AnalyzerConfig> {
    let mut analyzer_config = match &config.config {
        Some(path) => load_config_from_path(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => load_config(),
    };

    if let Some(unknown) = config
        .enable
        .iter()
        .chain(&config.disable)
        .find(|name| !CheckerRegistry::is_known(name))
    {
        anyhow::bail!(
            "Unknown checker '{}'. Run `delegatecheck list-checkers` to see the available names.",
            unknown
        );
    }

    if !config.enable.is_empty() || !config.disable.is_empty() {
        let mut checkers = analyzer_config.checkers.take().unwrap_or_default();
        apply_overrides(&mut checkers, &config.enable, &config.disable);
        analyzer_config.checkers = Some(checkers);
    }
    Ok(analyzer_config)
}

/// `--enable` replaces the file's enabled list, `--disable` extends its
/// disabled list.
fn apply_overrides(checkers: &mut CheckersConfig, enable: &[String], disable: &[String]) {
    if !enable.is_empty() {
        checkers.enabled = enable.to_vec();
    }
    for name in disable {
        if !checkers.disabled.contains(name) {
            checkers.disabled.push(name.clone());
        }
    }
}

fn analyze_inputs(registry: &CheckerRegistry, inputs: &[PathBuf]) -> Result<Vec<AnalysisSummary>> {
    inputs
        .iter()
        .map(|path| {
            let tu = load_translation_unit(path)
                .with_context(|| format!("Failed to load translation unit {}", path.display()))?;
            let summary = registry.run(&tu);
            log::debug!(
                "{}: {} issue(s), {} duplicate(s) dropped",
                summary.file,
                summary.diagnostics.len(),
                summary.duplicates
            );
            Ok(summary)
        })
        .collect()
}

fn merge_diagnostics(summaries: &[AnalysisSummary]) -> Vec<Diagnostic> {
    summaries
        .iter()
        .flat_map(|summary| summary.diagnostics.iter().cloned())
        .collect()
}

fn log_totals(summaries: &[AnalysisSummary]) {
    let mut totals = ExplorationStats::default();
    for summary in summaries {
        totals += summary.exploration;
    }
    log::info!(
        "Analyzed {} translation unit(s): {} method(s), {} path(s) completed, {} abandoned",
        summaries.len(),
        totals.methods,
        totals.paths_completed,
        totals.paths_abandoned
    );
    if totals.paths_abandoned > 0 {
        log::warn!(
            "{} path(s) exceeded max_paths_per_method and were not explored",
            totals.paths_abandoned
        );
    }
}

fn write_report(
    diagnostics: &[Diagnostic],
    format: OutputFormat,
    output: Option<&PathBuf>,
) -> Result<()> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };
    let mut writer = create_writer(format.into(), sink);
    writer.write_diagnostics(diagnostics)
}
