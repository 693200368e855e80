//! Template system for sierra-forge project generation.
//!
//! A template tree is either a directory on disk or the Android project
//! skeleton compiled into the binary ([`embedded`]). The [`resolver`] turns
//! either one into an ordered list of [`resolver::TemplateFile`] render units,
//! and the [`renderer`] substitutes identity tokens into each unit.
//!
//! ## Token syntax
//!
//! - `${APPLICATION_NAME}` is replaced with the mapped value. Identifiers are
//!   SCREAMING_SNAKE_CASE and must belong to [`crate::tokens::Token`].
//! - `$${CMAKE_CURRENT_SOURCE_DIR}` renders to the literal
//!   `${CMAKE_CURRENT_SOURCE_DIR}`, for build languages that share the syntax.
//!   Vocabulary names cannot be escaped.
//! - `${rootDir}`, `${project.name}` and other non-uppercase forms are left
//!   untouched for Groovy/Kotlin/shell interpolation.
//!
//! Path segments follow the same rules, so a directory named
//! `${APPLICATION_NAME}` is renamed along with the content.

pub mod embedded;
pub mod renderer;
pub mod resolver;
