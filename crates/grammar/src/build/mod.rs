//! Grammar building.
//!
//! Compiles generated tree-sitter grammar sources (`parser.c` plus an optional
//! external scanner) into the shared libraries [`GrammarLoader`](crate::GrammarLoader)
//! opens. Generating `parser.c` from `grammar.js` stays with the tree-sitter CLI.

mod compile;
mod parallel;

use std::path::PathBuf;

pub use compile::{BuildStatus, build_grammar, c_compiler_available, cxx_compiler_available, grammar_lib_dir};
pub use parallel::{ProgressCallback, build_all_grammars};
use thiserror::Error;

/// Errors that can occur during grammar building.
#[derive(Debug, Error)]
pub enum GrammarBuildError {
	#[error("failed to prepare build directory: {0}")]
	Io(#[from] std::io::Error),
	#[error("compilation failed: {0}")]
	Compilation(String),
	#[error("no parser.c found in {}", .0.display())]
	NoParserSource(PathBuf),
}

/// Result type for grammar build operations.
pub type Result<T> = std::result::Result<T, GrammarBuildError>;
