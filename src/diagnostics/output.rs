use super::{Diagnostic, ReportContext};
use colored::*;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Terminal,
}

pub trait DiagnosticWriter {
    fn write_diagnostics(&mut self, diagnostics: &[Diagnostic]) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    count: usize,
    diagnostics: &'a [Diagnostic],
}

impl<W: Write> DiagnosticWriter for JsonWriter<W> {
    fn write_diagnostics(&mut self, diagnostics: &[Diagnostic]) -> anyhow::Result<()> {
        let report = JsonReport {
            count: diagnostics.len(),
            diagnostics,
        };
        let json = serde_json::to_string_pretty(&report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_one(&mut self, diagnostic: &Diagnostic) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "{}:{}: {}: {} [{}]",
            diagnostic.file,
            diagnostic.range.begin,
            "warning".yellow().bold(),
            diagnostic.title.bold(),
            diagnostic.checker.dimmed()
        )?;
        let origin = match &diagnostic.context {
            ReportContext::Declaration { decl } => format!("in {decl}"),
            ReportContext::Path { class, method, .. } => format!("in -[{class} {method}]"),
        };
        writeln!(self.writer, "  {} ({})", diagnostic.category, origin)?;
        writeln!(self.writer, "  {}", diagnostic.message)?;
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> DiagnosticWriter for TerminalWriter<W> {
    fn write_diagnostics(&mut self, diagnostics: &[Diagnostic]) -> anyhow::Result<()> {
        for diagnostic in diagnostics {
            self.write_one(diagnostic)?;
        }
        let summary = match diagnostics.len() {
            0 => "No issues found".green().to_string(),
            1 => "1 issue found".yellow().to_string(),
            n => format!("{n} issues found").yellow().to_string(),
        };
        writeln!(self.writer, "{summary}")?;
        Ok(())
    }
}

pub fn create_writer(format: OutputFormat, writer: Box<dyn Write>) -> Box<dyn DiagnosticWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceRange;

    fn sample() -> Diagnostic {
        Diagnostic {
            checker: "logic.DoubleBooleanArgument".into(),
            title: "Repeated operand in boolean expression".into(),
            category: "API error".into(),
            message: "Boolean expression contains argument flag more than once.".into(),
            file: "Foo.m".into(),
            range: SourceRange::line(9),
            context: ReportContext::Declaration {
                decl: "-[Foo run]".into(),
            },
        }
    }

    #[test]
    fn test_json_writer_emits_count_and_items() {
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer)
            .write_diagnostics(&[sample()])
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["diagnostics"][0]["checker"], "logic.DoubleBooleanArgument");
        assert_eq!(value["diagnostics"][0]["context"]["kind"], "declaration");
    }

    #[test]
    fn test_terminal_writer_prints_message_and_summary() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        TerminalWriter::new(&mut buffer)
            .write_diagnostics(&[sample()])
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Foo.m:9:1: warning: Repeated operand"));
        assert!(text.contains("more than once"));
        assert!(text.trim_end().ends_with("1 issue found"));
    }
}
