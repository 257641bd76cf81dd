//! Fixture grammars for loader integration tests.
//!
//! Real grammar tables come out of `tree-sitter generate`. The loader only looks
//! at the table header, so these fixtures compile a tiny stand-in table through
//! [`build_grammar`] and let each test pick the header values.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wpl_grammar::build::{BuildStatus, build_grammar, c_compiler_available, cxx_compiler_available};
use wpl_grammar::config::{GrammarConfig, SourceLocation};

const EXPORT_MACRO: &str = r#"
#if defined(_WIN32)
#define FIXTURE_VISIBILITY __declspec(dllexport)
#else
#define FIXTURE_VISIBILITY __attribute__((visibility("default")))
#endif

#ifdef __cplusplus
#define FIXTURE_EXPORT extern "C" FIXTURE_VISIBILITY
#else
#define FIXTURE_EXPORT FIXTURE_VISIBILITY
#endif
"#;

const PARSER_TEMPLATE: &str = r#"
#include <stdint.h>

typedef struct {
	uint32_t abi_version;
	uint32_t symbol_count;
	uint32_t reserved[62];
} FixtureLanguage;

static const FixtureLanguage LANGUAGE = { @ABI@, @SYMBOLS@, { 0 } };

FIXTURE_EXPORT const void *tree_sitter_@EXPORT@(void) {
	return @RETURN@;
}
"#;

const SCANNER_TEMPLATE: &str = r#"
#include <stddef.h>

FIXTURE_EXPORT void *tree_sitter_@EXPORT@_external_scanner_create(void) {
	return NULL;
}
"#;

/// External scanner shipped next to `parser.c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureScanner {
	None,
	/// `src/scanner.c`
	C,
	/// `src/scanner.cc`
	Cxx,
}

/// Shape of a fixture grammar library.
#[derive(Debug, Clone)]
pub struct FixtureGrammar {
	/// Grammar name, used for the library file and the source directory.
	pub name: &'static str,
	/// Grammar name baked into the exported `tree_sitter_<export>` symbol.
	pub export: &'static str,
	pub abi_version: u32,
	pub symbol_count: u32,
	pub null: bool,
	pub scanner: FixtureScanner,
}

impl FixtureGrammar {
	/// A well-formed `wpl` grammar.
	pub fn wpl() -> Self {
		Self {
			name: "wpl",
			export: "wpl",
			abi_version: 14,
			symbol_count: 87,
			null: false,
			scanner: FixtureScanner::None,
		}
	}

	/// Symbol exported by the fixture's external scanner.
	pub fn scanner_symbol(&self) -> String {
		format!("tree_sitter_{}_external_scanner_create", self.export)
	}

	fn render(&self, template: &str) -> String {
		let body = template
			.replace("@ABI@", &self.abi_version.to_string())
			.replace("@SYMBOLS@", &self.symbol_count.to_string())
			.replace("@EXPORT@", self.export)
			.replace("@RETURN@", if self.null { "0" } else { "&LANGUAGE" });
		format!("{EXPORT_MACRO}{body}")
	}

	/// Whether this machine can compile the fixture.
	pub fn compilable(&self) -> bool {
		match self.scanner {
			FixtureScanner::Cxx => cxx_compiler_available(),
			_ => c_compiler_available(),
		}
	}

	/// Writes the generated-looking sources under `root` and returns their config.
	pub fn write_sources(&self, root: &Path) -> GrammarConfig {
		let repo = root.join(format!("tree-sitter-{}", self.name));
		let src = repo.join("src");
		fs::create_dir_all(&src).expect("failed to create fixture src dir");
		fs::write(src.join("parser.c"), self.render(PARSER_TEMPLATE)).expect("failed to write parser.c");

		match self.scanner {
			FixtureScanner::None => {}
			FixtureScanner::C => {
				fs::write(src.join("scanner.c"), self.render(SCANNER_TEMPLATE)).expect("failed to write scanner.c")
			}
			FixtureScanner::Cxx => fs::write(src.join("scanner.cc"), self.render(SCANNER_TEMPLATE))
				.expect("failed to write scanner.cc"),
		}

		GrammarConfig {
			grammar_id: self.name.to_string(),
			source: SourceLocation { path: repo, subpath: None },
		}
	}
}

/// A compiled fixture and the directories backing it.
pub struct Fixture {
	pub config: GrammarConfig,
	pub lib_dir: PathBuf,
	_root: TempDir,
}

impl Fixture {
	/// Path of the compiled library.
	pub fn library(&self) -> PathBuf {
		self.lib_dir.join(wpl_grammar::grammar_library_name(&self.config.grammar_id))
	}
}

/// Compiles `grammar`, or returns `None` when the machine has no suitable compiler.
pub fn compile(grammar: FixtureGrammar) -> Option<Fixture> {
	let _ = tracing_subscriber::fmt::try_init();

	if !grammar.compilable() {
		eprintln!("skipping: no compiler available for fixture grammar {}", grammar.name);
		return None;
	}

	let root = tempfile::tempdir().expect("failed to create temp dir");
	let config = grammar.write_sources(root.path());
	let lib_dir = root.path().join("grammars");

	let status = build_grammar(&config, &lib_dir).expect("fixture grammar failed to compile");
	assert_eq!(status, BuildStatus::Built);

	Some(Fixture {
		config,
		lib_dir,
		_root: root,
	})
}
