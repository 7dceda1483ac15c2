//! CLI command implementations.
//!
//! - **check**: run the enabled checkers over exported translation units
//! - **list-checkers**: print the registered checker names
//! - **init**: write a default configuration file

pub mod check;
pub mod init;
pub mod list_checkers;

pub use check::{handle_check, CheckConfig};
pub use init::init_config;
pub use list_checkers::list_checkers;
