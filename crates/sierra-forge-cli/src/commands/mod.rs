//! CLI command implementations for sierra-forge.
//!
//! Each module corresponds to a subcommand (`sierra-forge <command>`).

pub mod generate;
pub mod tokens;
pub mod verify;
