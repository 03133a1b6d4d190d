//! # SQL Schema Linter Library
//!
//! Pluggable SQL linting over an incrementally built schema model.
//!
//! - [`source`] - Statement splitting and parsing
//! - [`ast`] - Lowering of parsed statements into flat pre-order node streams
//! - [`engine`] - Visit/leave event reconstruction from node depths
//! - [`rules`] - Rule registry, lifetimes, message templates and built-in
//!   rules
//! - [`schema`] - In-memory schema model with a tuple-key lookup index
//! - [`mutation`] - DDL handlers applying statements to the model
//! - [`linter`] - Run driver tying the pieces together
//! - [`snapshot`] - Serializable view of the final model

pub mod app;
pub mod ast;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod linter;
pub mod mutation;
pub mod output;
pub mod rules;
pub mod schema;
pub mod snapshot;
pub mod source;
