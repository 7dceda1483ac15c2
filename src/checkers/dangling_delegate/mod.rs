//! Dangling delegate detection.
//!
//! An object `A` stores `self` into a non-owning property of an object `B`
//! held in one of its fields (`_bar.delegate = self`). When `A` goes away
//! without clearing that property, `B` is left pointing at freed memory.
//!
//! The analysis runs in two phases:
//!
//! 1. [`fact_finder`] scans every method of a class once and records which
//!    fields may come to reference `self`, and through which channel
//!    ([`facts::ClassFacts`]).
//! 2. [`checker::DanglingDelegateChecker`] follows each execution path and
//!    tracks which of those channels have been cleared
//!    ([`state::DelegatePathState`]). Whenever the object in an interesting
//!    field is about to be released, the leftovers are reported.

pub mod checker;
pub mod fact_finder;
pub mod facts;
pub mod matchers;
pub mod policy;
pub mod report;
pub mod state;

pub use checker::{DanglingDelegateChecker, DelegateSession, NAME};
pub use fact_finder::{find_class_facts, FactFinder, MethodRole};
pub use facts::{ClassFacts, ClassFactsCache, FieldFacts, FieldId};
pub use state::{DelegatePathState, DynamicState};
