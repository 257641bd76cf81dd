//! Runtime directories searched for compiled grammars.
//!
//! Compiled grammars are platform shared libraries named after the grammar
//! (`libwpl.so`, `libwpl.dylib`, `wpl.dll`). Directories are searched in order
//! and the first match wins.

use std::env;
use std::path::PathBuf;

/// Environment variable holding extra grammar directories, separated like `PATH`.
pub const GRAMMAR_PATH_ENV: &str = "WPL_GRAMMAR_PATH";

/// Environment variable overriding the runtime directory.
pub const RUNTIME_ENV: &str = "WPL_RUNTIME";

/// Returns the primary runtime directory: `$WPL_RUNTIME` or `~/.local/share/wpl/`.
pub fn runtime_dir() -> PathBuf {
	if let Some(runtime) = env::var_os(RUNTIME_ENV) {
		return PathBuf::from(runtime);
	}

	dirs::data_local_dir()
		.map(|d| d.join("wpl"))
		.unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the cache directory: `~/.cache/wpl/`.
pub fn cache_dir() -> Option<PathBuf> {
	dirs::cache_dir().map(|d| d.join("wpl"))
}

/// Returns directories to search for compiled grammar libraries.
///
/// Order: `$WPL_GRAMMAR_PATH` entries, `$WPL_RUNTIME/grammars`, the workspace
/// `target/grammars` (when run under cargo), then the user cache and data dirs.
pub fn grammar_search_paths() -> Vec<PathBuf> {
	let mut dirs = Vec::new();

	if let Some(paths) = env::var_os(GRAMMAR_PATH_ENV) {
		dirs.extend(env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
	}

	if let Some(runtime) = env::var_os(RUNTIME_ENV) {
		dirs.push(PathBuf::from(runtime).join("grammars"));
	}

	if let Ok(manifest) = env::var("CARGO_MANIFEST_DIR")
		&& let Some(workspace) = PathBuf::from(manifest).ancestors().nth(2)
	{
		dirs.push(workspace.join("target").join("grammars"));
	}

	if let Some(cache) = cache_dir() {
		dirs.push(cache.join("grammars"));
	}

	if let Some(data) = dirs::data_local_dir() {
		dirs.push(data.join("wpl").join("grammars"));
	}

	dirs
}

/// Returns the platform-specific library filename for a grammar.
pub fn grammar_library_name(name: &str) -> String {
	let safe_name = name.replace('-', "_");
	#[cfg(target_os = "macos")]
	{
		format!("lib{safe_name}.dylib")
	}
	#[cfg(target_os = "windows")]
	{
		format!("{safe_name}.dll")
	}
	#[cfg(not(any(target_os = "macos", target_os = "windows")))]
	{
		format!("lib{safe_name}.so")
	}
}

/// Returns the name of the language function a grammar library exports.
pub fn language_symbol(name: &str) -> String {
	format!("tree_sitter_{}", name.replace('-', "_"))
}
