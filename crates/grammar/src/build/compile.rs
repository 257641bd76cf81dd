//! Grammar compilation into dynamic libraries.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use tracing::{debug, info};

use super::{GrammarBuildError, Result};
use crate::config::GrammarConfig;
use crate::paths::{RUNTIME_ENV, cache_dir, grammar_library_name, runtime_dir};

/// Status of a build operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
	/// Grammar was already built and up to date.
	AlreadyBuilt,
	/// Grammar was newly built.
	Built,
}

/// Default output directory for compiled grammars.
///
/// `$WPL_RUNTIME/grammars` when set, otherwise the user cache directory. Both are
/// on the default search path.
pub fn grammar_lib_dir() -> PathBuf {
	if std::env::var_os(RUNTIME_ENV).is_some() {
		return runtime_dir().join("grammars");
	}

	cache_dir()
		.map(|d| d.join("grammars"))
		.unwrap_or_else(|| runtime_dir().join("grammars"))
}

/// Returns the first compiler from `candidates` that executes successfully.
fn find_compiler<'a>(candidates: &[&'a str]) -> Option<&'a str> {
	candidates.iter().copied().find(|name| {
		Command::new(name)
			.arg("--version")
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.status()
			.is_ok()
	})
}

const CC_CANDIDATES: &[&str] = &["cc", "clang", "gcc"];
const CXX_CANDIDATES: &[&str] = &["c++", "clang++", "g++"];

/// Resolves C and C++ compilers, preferring `CC`/`CXX` then trying common names.
fn resolve_compilers() -> (Option<&'static str>, Option<&'static str>) {
	static COMPILERS: OnceLock<(Option<&'static str>, Option<&'static str>)> = OnceLock::new();
	*COMPILERS.get_or_init(|| {
		let from_env = |var: &str| std::env::var(var).ok().filter(|s| !s.is_empty()).map(|s| s.leak() as &str);
		let cc = from_env("CC").or_else(|| find_compiler(CC_CANDIDATES));
		let cxx = from_env("CXX").or_else(|| find_compiler(CXX_CANDIDATES));
		(cc, cxx)
	})
}

/// Whether a C compiler could be found for [`build_grammar`].
pub fn c_compiler_available() -> bool {
	resolve_compilers().0.is_some()
}

/// Whether a C++ compiler could be found, needed for grammars with `scanner.cc`.
pub fn cxx_compiler_available() -> bool {
	resolve_compilers().1.is_some()
}

/// Returns true if any source file is newer than the compiled library.
fn needs_recompile(src_dir: &Path, lib_path: &Path) -> bool {
	let Ok(lib_mtime) = fs::metadata(lib_path).and_then(|m| m.modified()) else {
		return true;
	};

	["parser.c", "scanner.c", "scanner.cc"].iter().any(|file| {
		fs::metadata(src_dir.join(file))
			.and_then(|m| m.modified())
			.is_ok_and(|src_mtime| src_mtime > lib_mtime)
	})
}

/// Compiles a generated grammar into a shared library inside `lib_dir`.
///
/// The library is named after the grammar (see
/// [`grammar_library_name`]) so the loader can find it. Nothing is compiled when
/// the library is newer than every source file.
///
/// # Errors
///
/// * [`GrammarBuildError::NoParserSource`] if `parser.c` is missing.
/// * [`GrammarBuildError::Compilation`] if no compiler is found or compiling fails.
pub fn build_grammar(grammar: &GrammarConfig, lib_dir: &Path) -> Result<BuildStatus> {
	let src_dir = grammar.src_dir();
	if !src_dir.join("parser.c").exists() {
		return Err(GrammarBuildError::NoParserSource(src_dir));
	}

	fs::create_dir_all(lib_dir)?;
	let lib_path = lib_dir.join(grammar_library_name(&grammar.grammar_id));

	if !needs_recompile(&src_dir, &lib_path) {
		debug!(grammar = %grammar.grammar_id, lib_path = %lib_path.display(), "Grammar up to date");
		return Ok(BuildStatus::AlreadyBuilt);
	}

	info!(grammar = %grammar.grammar_id, lib_path = %lib_path.display(), "Compiling grammar");

	let needs_cxx = src_dir.join("scanner.cc").exists();
	let (cc, cxx) = resolve_compilers();
	let compiler = if needs_cxx {
		cxx.ok_or_else(|| {
			GrammarBuildError::Compilation(format!(
				"C++ compiler required for {} but none found. Install clang++/g++ or set CXX env var.",
				grammar.grammar_id
			))
		})?
	} else {
		cc.ok_or_else(|| {
			GrammarBuildError::Compilation("C compiler required but none found. Install clang/gcc or set CC env var.".into())
		})?
	};

	let tool = compiler_tool(compiler, needs_cxx)?;
	link_shared_library(&tool, &src_dir, &lib_path, needs_cxx)?;

	if !lib_path.exists() {
		return Err(GrammarBuildError::Compilation(format!(
			"compilation succeeded but library not found at {}",
			lib_path.display()
		)));
	}

	debug!(grammar = %grammar.grammar_id, lib_path = %lib_path.display(), "Successfully compiled grammar");
	Ok(BuildStatus::Built)
}

/// Configures the compiler through [`cc`] so platform flags match a cargo build.
fn compiler_tool(compiler: &str, needs_cxx: bool) -> Result<cc::Tool> {
	let target = std::env::var("TARGET").unwrap_or_else(|_| {
		let arch = std::env::consts::ARCH;
		if cfg!(target_os = "macos") {
			format!("{arch}-apple-darwin")
		} else {
			format!("{arch}-unknown-linux-gnu")
		}
	});

	cc::Build::new()
		.opt_level(3)
		.debug(false)
		.cargo_metadata(false)
		.cargo_warnings(false)
		.warnings(false)
		.host(&target)
		.target(&target)
		.compiler(compiler)
		.cpp(needs_cxx)
		.try_get_compiler()
		.map_err(|e| GrammarBuildError::Compilation(e.to_string()))
}

/// Compiles and links the grammar sources into one shared library.
fn link_shared_library(tool: &cc::Tool, src_dir: &Path, lib_path: &Path, needs_cxx: bool) -> Result<()> {
	if tool.is_like_msvc() {
		return Err(GrammarBuildError::Compilation(
			"MSVC-style compilers are not supported; set CC to clang or gcc".into(),
		));
	}

	let mut cmd = tool.to_command();
	cmd.args(["-shared", "-fPIC", "-fno-exceptions"])
		.arg("-I")
		.arg(src_dir)
		.arg("-o")
		.arg(lib_path)
		.arg(src_dir.join("parser.c"));

	let scanner_c = src_dir.join("scanner.c");
	if needs_cxx {
		cmd.arg("-std=c++14").arg(src_dir.join("scanner.cc")).arg("-lstdc++");
	} else if scanner_c.exists() {
		cmd.arg(&scanner_c);
	}

	#[cfg(target_os = "linux")]
	cmd.arg("-Wl,-z,relro,-z,now");

	run_compiler(cmd)
}

fn run_compiler(mut cmd: Command) -> Result<()> {
	debug!(command = ?cmd, "Running compiler");
	let output = cmd.output().map_err(|e| GrammarBuildError::Compilation(e.to_string()))?;

	if output.status.success() {
		Ok(())
	} else {
		Err(GrammarBuildError::Compilation(String::from_utf8_lossy(&output.stderr).into()))
	}
}
