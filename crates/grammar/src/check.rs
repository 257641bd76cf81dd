//! One-shot grammar load check.
//!
//! The check asks the loader for a handle and reports pass or fail. A failure
//! always displays as "Error loading grammar"; the loader's reason is kept as
//! the error source.

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::handle::GrammarHandle;
use crate::loader::{GrammarError, GrammarLoader};

/// The compiled grammar artifact to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarSource {
	/// Resolve the grammar by name through a loader's search paths.
	Named {
		name: String,
		loader: GrammarLoader,
	},
	/// Use an explicit shared library.
	Library { name: String, path: PathBuf },
}

impl GrammarSource {
	/// Grammar `name` resolved through the default search paths.
	pub fn named(name: impl Into<String>) -> Self {
		Self::Named {
			name: name.into(),
			loader: GrammarLoader::from_env(),
		}
	}

	/// Grammar `name` loaded from the library at `path`.
	pub fn library(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
		Self::Library {
			name: name.into(),
			path: path.into(),
		}
	}

	/// Name of the grammar being checked.
	pub fn name(&self) -> &str {
		match self {
			Self::Named { name, .. } | Self::Library { name, .. } => name,
		}
	}
}

/// Outcome of a failed check.
#[derive(Debug, Error)]
pub enum CheckFailure {
	/// The loader could not produce a usable handle.
	#[error("Error loading grammar")]
	GrammarLoadError {
		grammar: String,
		#[source]
		source: GrammarError,
	},
}

/// Loads the grammar described by `source`, returning the handle on success.
pub fn load_checked(source: &GrammarSource) -> Result<GrammarHandle, CheckFailure> {
	let result = match source {
		GrammarSource::Named { name, loader } => loader.load(name),
		GrammarSource::Library { name, path } => GrammarLoader::default().load_from_path(name, path),
	};

	result.map_err(|source_err| CheckFailure::GrammarLoadError {
		grammar: source.name().to_string(),
		source: source_err,
	})
}

/// Verifies that the grammar described by `source` loads into a valid handle.
pub fn verify_grammar_loads(source: &GrammarSource) -> Result<(), CheckFailure> {
	let handle = load_checked(source)?;
	debug!(
		grammar = handle.name(),
		abi = handle.abi_version(),
		symbols = handle.symbol_count(),
		"Grammar check passed"
	);
	Ok(())
}
