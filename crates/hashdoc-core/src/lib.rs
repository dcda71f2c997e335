//! hashdoc Core - documentation and embedded test extraction for Perl sources
//!
//! This crate provides the core functionality:
//! - Lexer: Tokenization of Perl source code
//! - Syntax: Grouping tokens into top-level elements
//! - Doc: Comment classification, item building, module extraction, indexing
//!   and Markdown rendering
//! - Testing: Test script synthesis and execution through an external runner
//! - Config: `hashdoc.toml` loading

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lexer module - tokenization of source files
pub mod lexer;

/// Syntax module - top-level element stream
pub mod syntax;

/// Documentation extraction module
pub mod doc;

/// Testing module - embedded test synthesis and execution
pub mod testing;

/// Project configuration
pub mod config;

/// Test utilities - helpers for testing extraction
pub mod testutil;

/// Convenience re-export of lexer
pub use lexer::Lexer;

/// Convenience re-export of configuration types
pub use config::{Config, ConfigError, ExtractConfig, TestConfig};

/// Convenience re-export of the extractor and project batch
pub use doc::{DocExtractor, Module, Project};

/// Convenience re-export of the test runner
pub use testing::{TestError, TestRunner, TestScript, TestSummary};
