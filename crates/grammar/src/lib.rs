// Grammar operations report through tracing, never stderr
#![deny(clippy::print_stderr)]

//! Loading support for the compiled `wpl` tree-sitter grammar.
//!
//! The grammar tables are generated from `grammar.js` by `tree-sitter generate`
//! and compiled into a shared library outside this crate. This crate finds that
//! library, opens it and hands out a validated [`GrammarHandle`].
//!
//! # Architecture
//!
//! * [`check`]: The one-shot "can the grammar be loaded" check
//! * [`loader`]: Dynamic grammar loading from shared libraries
//! * [`handle`]: Validated grammar handle, only produced by the loader
//! * [`paths`]: Runtime directories searched for compiled grammars
//! * [`config`]: `grammars.toml` configuration
//! * [`build`]: Compiling generated grammar sources into shared libraries

pub mod build;
pub mod check;
pub mod config;
pub mod handle;
pub mod loader;
pub mod paths;

pub use check::{CheckFailure, GrammarSource, load_checked, verify_grammar_loads};
pub use config::{ConfigError, GrammarConfig, GrammarsConfig};
pub use handle::GrammarHandle;
pub use loader::{ABI_VERSION, GrammarError, GrammarLoader, MIN_COMPATIBLE_ABI_VERSION};
pub use paths::{grammar_library_name, grammar_search_paths, runtime_dir};

/// Name of the grammar this crate exists to load.
pub const WPL_GRAMMAR: &str = "wpl";
