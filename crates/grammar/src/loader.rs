//! Grammar loading from shared libraries.
//!
//! A compiled grammar is a shared library exporting `tree_sitter_<name>`, a
//! function returning a pointer to the grammar's static language table. Loading
//! opens the library, calls that function and validates the table header before
//! anything else gets to see the grammar.

use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use thiserror::Error;
use tracing::{debug, warn};
use tree_sitter::Grammar;

use crate::config::GrammarsConfig;
use crate::handle::GrammarHandle;
use crate::paths::{grammar_library_name, grammar_search_paths, language_symbol};

/// Oldest language table ABI the runtime can still parse with.
pub const MIN_COMPATIBLE_ABI_VERSION: u32 = 13;

/// Newest language table ABI the runtime understands.
pub const ABI_VERSION: u32 = 15;

/// Errors that can occur when loading a grammar.
#[derive(Error, Debug)]
pub enum GrammarError {
	/// Grammar library not found in any search path.
	#[error("grammar not found: {name} (searched {} directories)", .searched.len())]
	NotFound { name: String, searched: Vec<PathBuf> },

	/// Failed to load the dynamic library.
	#[error("failed to load grammar library {}: {reason}", .path.display())]
	LoadError { path: PathBuf, reason: String },

	/// Library exists but doesn't export the expected language function.
	#[error("grammar library {} missing language function {symbol}", .path.display())]
	MissingSymbol { path: PathBuf, symbol: String },

	/// Language function returned a null table.
	#[error("language function {symbol} returned a null grammar")]
	NullLanguage { symbol: String },

	/// Table was generated for an ABI the runtime cannot read.
	#[error(
		"grammar {name} has incompatible ABI version {version} (supported {min}..={max})",
		min = MIN_COMPATIBLE_ABI_VERSION,
		max = ABI_VERSION
	)]
	IncompatibleAbi { name: String, version: u32 },

	/// Table declares no symbols at all.
	#[error("grammar {name} has an empty symbol table")]
	EmptyLanguage { name: String },
}

/// Leading fields of a tree-sitter language table.
///
/// Every ABI from 13 onwards starts with these two `uint32_t` fields.
#[repr(C)]
struct LanguageHeader {
	abi_version: u32,
	symbol_count: u32,
}

type LanguageFn = unsafe extern "C" fn() -> *const LanguageHeader;

/// Finds and opens compiled grammars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarLoader {
	search_paths: Vec<PathBuf>,
}

impl GrammarLoader {
	/// Creates a loader searching exactly `search_paths`, in order.
	pub fn new(search_paths: Vec<PathBuf>) -> Self {
		Self { search_paths }
	}

	/// Creates a loader over the default [`grammar_search_paths`].
	pub fn from_env() -> Self {
		Self::new(grammar_search_paths())
	}

	/// Creates a loader searching the configured directories before the defaults.
	pub fn from_config(config: &GrammarsConfig) -> Self {
		let mut search_paths = config.search_paths.clone();
		search_paths.extend(grammar_search_paths());
		Self::new(search_paths)
	}

	/// Directories searched by [`Self::load`].
	pub fn search_paths(&self) -> &[PathBuf] {
		&self.search_paths
	}

	/// Returns the first library matching `name` in the search paths.
	pub fn find_library(&self, name: &str) -> Option<PathBuf> {
		let lib_name = grammar_library_name(name);
		self.search_paths
			.iter()
			.map(|dir| dir.join(&lib_name))
			.find(|path| path.is_file())
	}

	/// Loads a grammar by name from the search paths.
	pub fn load(&self, name: &str) -> Result<GrammarHandle, GrammarError> {
		let Some(path) = self.find_library(name) else {
			debug!(grammar = name, dirs = self.search_paths.len(), "Grammar library not found");
			return Err(GrammarError::NotFound {
				name: name.to_string(),
				searched: self.search_paths.clone(),
			});
		};

		self.load_from_path(name, &path)
	}

	/// Loads grammar `name` from a specific library path.
	pub fn load_from_path(&self, name: &str, path: &Path) -> Result<GrammarHandle, GrammarError> {
		if !path.is_file() {
			return Err(GrammarError::NotFound {
				name: name.to_string(),
				searched: path.parent().map(Path::to_path_buf).into_iter().collect(),
			});
		}

		// SAFETY: Loading a tree-sitter grammar runs no initialisers beyond the C runtime's.
		let library = unsafe { Library::new(path) }.map_err(|e| {
			warn!(grammar = name, path = %path.display(), error = %e, "Failed to open grammar library");
			GrammarError::LoadError {
				path: path.to_path_buf(),
				reason: e.to_string(),
			}
		})?;

		let symbol = language_symbol(name);
		let header = {
			// SAFETY: tree-sitter grammars export the language function with this signature.
			let language_fn: Symbol<'_, LanguageFn> =
				unsafe { library.get(symbol.as_bytes()) }.map_err(|_| GrammarError::MissingSymbol {
					path: path.to_path_buf(),
					symbol: symbol.clone(),
				})?;

			// SAFETY: The function only returns the address of a static table.
			let ptr = unsafe { language_fn() };
			if ptr.is_null() {
				return Err(GrammarError::NullLanguage { symbol });
			}

			// SAFETY: Non-null, points into the still-loaded library, and every
			// supported ABI starts with the header fields.
			unsafe { ptr.read() }
		};

		if !(MIN_COMPATIBLE_ABI_VERSION..=ABI_VERSION).contains(&header.abi_version) {
			return Err(GrammarError::IncompatibleAbi {
				name: name.to_string(),
				version: header.abi_version,
			});
		}

		if header.symbol_count == 0 {
			return Err(GrammarError::EmptyLanguage { name: name.to_string() });
		}

		// SAFETY: The library was just validated as a tree-sitter grammar.
		let grammar = unsafe { Grammar::new(name, path) }.map_err(|e| GrammarError::LoadError {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;

		debug!(
			grammar = name,
			path = %path.display(),
			abi = header.abi_version,
			symbols = header.symbol_count,
			"Loaded grammar"
		);

		Ok(GrammarHandle::new(
			name,
			path,
			header.abi_version,
			header.symbol_count,
			grammar,
			library,
		))
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use serial_test::serial;

	use super::*;

	#[test]
	fn test_missing_library_is_not_found() {
		let dir = tempfile::tempdir().unwrap();
		let loader = GrammarLoader::new(vec![dir.path().to_path_buf()]);

		assert!(loader.find_library("wpl").is_none());
		match loader.load("wpl") {
			Err(GrammarError::NotFound { name, searched }) => {
				assert_eq!(name, "wpl");
				assert_eq!(searched, vec![dir.path().to_path_buf()]);
			}
			other => panic!("expected NotFound, got {other:?}"),
		}
	}

	#[test]
	fn test_corrupted_library_fails_to_open() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(grammar_library_name("wpl"));
		fs::write(&path, b"definitely not an object file").unwrap();

		let loader = GrammarLoader::new(vec![dir.path().to_path_buf()]);
		assert_eq!(loader.find_library("wpl"), Some(path.clone()));

		let err = loader.load("wpl").unwrap_err();
		assert!(matches!(err, GrammarError::LoadError { path: p, .. } if p == path));
	}

	#[test]
	fn test_first_search_path_wins() {
		let first = tempfile::tempdir().unwrap();
		let second = tempfile::tempdir().unwrap();
		let lib_name = grammar_library_name("wpl");
		fs::write(first.path().join(&lib_name), b"").unwrap();
		fs::write(second.path().join(&lib_name), b"").unwrap();

		let loader = GrammarLoader::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
		assert_eq!(loader.find_library("wpl"), Some(first.path().join(&lib_name)));
	}

	#[test]
	fn test_directory_named_like_library_is_skipped() {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir(dir.path().join(grammar_library_name("wpl"))).unwrap();

		let loader = GrammarLoader::new(vec![dir.path().to_path_buf()]);
		assert!(loader.find_library("wpl").is_none());
	}

	#[test]
	#[serial]
	fn test_from_config_puts_configured_dirs_first() {
		let config = GrammarsConfig {
			search_paths: vec![PathBuf::from("/opt/wpl/grammars")],
			..Default::default()
		};
		let loader = GrammarLoader::from_config(&config);
		assert_eq!(loader.search_paths()[0], PathBuf::from("/opt/wpl/grammars"));
	}
}
