//! Testing infrastructure shared by unit tests and the `tests/` directory.
//!
//! - **[`helpers`]**: one-line builders for expressions, statements and
//!   methods of the closed AST
//! - **[`fixtures`]**: ready-made translation units around the
//!   `Foo`/`Bar`/`delegate` shape
//! - **Assertion macros**: `assert_result_ok!`, `assert_result_err!`,
//!   `assert_contains_error!`, `assert_findings!` (exported at the crate root)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use delegatecheck::checkers::CheckerRegistry;
//! use delegatecheck::testkit::{fixtures, helpers::*};
//!
//! let tu = fixtures::delegate_pair(vec![method(
//!     "dealloc",
//!     vec![stmt(setter(getter(self_ref(), "bar"), "delegate", self_ref()))],
//! )]);
//! let summary = CheckerRegistry::default().run(&tu);
//! assert_eq!(summary.diagnostics.len(), 1);
//! ```

pub mod assertions;
pub mod fixtures;
pub mod helpers;
