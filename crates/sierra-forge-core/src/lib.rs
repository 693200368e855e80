//! Core library for sierra-forge.
//!
//! Turns the generic, token-bearing Sierra platform template into a concrete,
//! buildable per-application project. The pipeline is:
//!
//! 1. [`metadata::ApplicationMetadata`] validates the application identity
//! 2. [`templates::resolver`] enumerates and classifies template files
//! 3. [`templates::renderer`] substitutes [`tokens::Token`] values
//! 4. [`assembler`] writes the tree through a staging directory
//! 5. [`finalizer`] checks namespace, application id and library name agree
//!
//! [`generator::generate`] runs all of it as one all-or-nothing operation.

pub mod assembler;
pub mod config;
pub mod error;
pub mod finalizer;
pub mod generator;
pub mod metadata;
pub mod report;
pub mod templates;
pub mod tokens;
pub mod toolchain;
pub mod version;
