//! Validated grammar handle.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tree_sitter::Grammar;

/// A compiled grammar that has passed every load-time check.
///
/// Handles are only created by [`GrammarLoader`](crate::GrammarLoader), so holding
/// one means the language table was non-null, had a supported ABI version and a
/// non-empty symbol table. The shared library stays mapped while any clone of the
/// handle is alive.
#[derive(Clone)]
pub struct GrammarHandle {
	name: String,
	path: PathBuf,
	abi_version: u32,
	symbol_count: u32,
	grammar: Grammar,
	_library: Arc<Library>,
}

impl GrammarHandle {
	pub(crate) fn new(
		name: &str,
		path: &Path,
		abi_version: u32,
		symbol_count: u32,
		grammar: Grammar,
		library: Library,
	) -> Self {
		Self {
			name: name.to_string(),
			path: path.to_path_buf(),
			abi_version,
			symbol_count,
			grammar,
			_library: Arc::new(library),
		}
	}

	/// Grammar name, as used in the `tree_sitter_<name>` symbol.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Shared library the grammar was loaded from.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// ABI version reported by the language table.
	pub fn abi_version(&self) -> u32 {
		self.abi_version
	}

	/// Number of grammar symbols (terminals and nonterminals).
	pub fn symbol_count(&self) -> u32 {
		self.symbol_count
	}

	/// Whether the symbol table is non-empty, which loading already guarantees.
	pub fn is_valid(&self) -> bool {
		self.symbol_count > 0
	}

	/// The runtime grammar, ready to hand to a parser.
	pub fn grammar(&self) -> Grammar {
		self.grammar
	}
}

impl fmt::Debug for GrammarHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GrammarHandle")
			.field("name", &self.name)
			.field("path", &self.path)
			.field("abi_version", &self.abi_version)
			.field("symbol_count", &self.symbol_count)
			.finish_non_exhaustive()
	}
}
