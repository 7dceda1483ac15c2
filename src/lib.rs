//! Static checker for dangling non-owning references to `self` in
//! Objective-C classes, driven by translation units exported as JSON.

pub mod ast;
pub mod checkers;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod testkit;

pub use crate::ast::{load_translation_unit, parse_translation_unit, TranslationUnit};
pub use crate::checkers::{AnalysisSummary, CheckerRegistry};
pub use crate::config::{AnalyzerConfig, DanglingDelegateConfig};
pub use crate::diagnostics::{create_writer, Diagnostic, OutputFormat, ReportContext};
pub use crate::errors::{Error, Result};
