//! Sekisho core - export-resolution engine and import/export rules
//!
//! The heart of the crate is the [`exports`] module: per-file export maps, built
//! lazily from swc ASTs and cached by an [`exports::ExportMapRegistry`]. Rules in
//! [`rules`] consume those maps to report unresolved imports, missing named
//! exports, dependency cycles and related module-system problems.

pub mod analysis;
pub mod config;
pub mod diagnostic;
pub mod disable_comments;
pub mod exports;
pub mod fs;
pub mod parser;
pub mod resolve;
pub mod rules;
pub mod visitor;

pub use analysis::AnalysisEngine;
pub use config::{Config, Settings};
pub use diagnostic::Diagnostic;
pub use exports::{ExportEntry, ExportKind, ExportMap, ExportMapError, ExportMapRegistry};
