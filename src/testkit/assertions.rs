//! Assertion macros for checker tests.
//!
//! - [`crate::assert_result_ok!`] - Assert Result is Ok and extract value
//! - [`crate::assert_result_err!`] - Assert Result is Err and extract error
//! - [`crate::assert_contains_error!`] - Assert error message contains pattern
//! - [`crate::assert_findings!`] - Assert how many diagnostics mention a pattern
//!
//! # Example
//!
//! ```rust,ignore
//! use delegatecheck::{assert_findings, assert_result_ok};
//!
//! let tu = assert_result_ok!(parse_translation_unit(json, path));
//! let findings = check(&tu);
//! assert_findings!(findings, "_bar.delegate", 1);
//! ```

/// Assert that a Result is Ok and extract the value.
///
/// If the Result is Err, panics with a message showing the error.
#[macro_export]
macro_rules! assert_result_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!(
                "Expected Ok, got Err: {:?}\n  at {}:{}:{}",
                e,
                file!(),
                line!(),
                column!()
            ),
        }
    };
}

/// Assert that a Result is Err and extract the error.
#[macro_export]
macro_rules! assert_result_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!(
                "Expected Err, got Ok: {:?}\n  at {}:{}:{}",
                value,
                file!(),
                line!(),
                column!()
            ),
            Err(e) => e,
        }
    };
}

/// Assert that a Result is Err and its message contains a pattern.
#[macro_export]
macro_rules! assert_contains_error {
    ($result:expr, $pattern:expr) => {{
        let err = $crate::assert_result_err!($result);
        let err_str = err.to_string();
        assert!(
            err_str.contains($pattern),
            "Error '{}' does not contain '{}'\n  at {}:{}:{}",
            err_str,
            $pattern,
            file!(),
            line!(),
            column!()
        );
        err
    }};
}

/// Assert that exactly `$count` diagnostics have a message containing
/// `$pattern`.
#[macro_export]
macro_rules! assert_findings {
    ($diagnostics:expr, $pattern:expr, $count:expr) => {{
        let matching = $diagnostics
            .iter()
            .filter(|d| d.message.contains($pattern))
            .count();
        assert_eq!(
            matching,
            $count,
            "Expected {} diagnostic(s) mentioning '{}', found {}:\n{:#?}\n  at {}:{}:{}",
            $count,
            $pattern,
            matching,
            $diagnostics,
            file!(),
            line!(),
            column!()
        );
    }};
}

#[cfg(test)]
mod tests {
    use crate::ast::SourceRange;
    use crate::diagnostics::{Diagnostic, ReportContext};

    #[test]
    fn test_assert_result_ok_extracts_value() {
        let result: Result<i32, String> = Ok(42);
        assert_eq!(assert_result_ok!(result), 42);
    }

    #[test]
    fn test_assert_contains_error_returns_error() {
        let result: Result<(), String> = Err("file not found: unit.json".into());
        let err = assert_contains_error!(result, "not found");
        assert!(err.contains("unit.json"));
    }

    #[test]
    fn test_assert_findings_counts_matching_messages() {
        let diagnostics = vec![Diagnostic {
            checker: "memory.DanglingDelegate".into(),
            title: "t".into(),
            category: "c".into(),
            message: "stored in _bar.delegate".into(),
            file: "Foo.m".into(),
            range: SourceRange::default(),
            context: ReportContext::Declaration { decl: "Foo".into() },
        }];
        assert_findings!(diagnostics, "_bar.delegate", 1);
        assert_findings!(diagnostics, "_bar.dataSource", 0);
    }
}
