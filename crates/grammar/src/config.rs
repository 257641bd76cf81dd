//! `grammars.toml` configuration.
//!
//! ```toml
//! search-paths = ["/opt/grammars"]
//!
//! [[grammar]]
//! name = "wpl"
//! source = { path = "../tree-sitter-wpl" }
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "WPL_CONFIG";

/// Errors from reading `grammars.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse grammars.toml: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("grammar {0} is configured more than once")]
	Duplicate(String),
}

/// Grammar configuration from `grammars.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GrammarConfig {
	/// The grammar name (used for the library and language symbol names).
	#[serde(rename = "name")]
	pub grammar_id: String,
	/// Where the generated grammar sources live.
	pub source: SourceLocation,
}

/// Local checkout of a generated grammar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceLocation {
	/// Grammar repository root.
	pub path: PathBuf,
	/// Optional subdirectory for repositories holding several grammars.
	#[serde(default)]
	pub subpath: Option<PathBuf>,
}

impl GrammarConfig {
	/// Directory holding `parser.c` and the optional scanner.
	pub fn src_dir(&self) -> PathBuf {
		match &self.source.subpath {
			Some(sub) => self.source.path.join(sub).join("src"),
			None => self.source.path.join("src"),
		}
	}
}

/// Top-level `grammars.toml` structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GrammarsConfig {
	/// Directories searched for compiled grammars before the defaults.
	#[serde(default)]
	pub search_paths: Vec<PathBuf>,
	/// Grammar sources that can be built.
	#[serde(default, rename = "grammar")]
	pub grammars: Vec<GrammarConfig>,
}

impl GrammarsConfig {
	/// Parses a config, without resolving relative paths.
	pub fn parse(content: &str) -> Result<Self, ConfigError> {
		let config: GrammarsConfig = toml::from_str(content)?;

		let mut seen = HashSet::new();
		for grammar in &config.grammars {
			if !seen.insert(grammar.grammar_id.as_str()) {
				return Err(ConfigError::Duplicate(grammar.grammar_id.clone()));
			}
		}

		Ok(config)
	}

	/// Reads a config file, resolving relative paths against its directory.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;

		let mut config = Self::parse(&content)?;
		if let Some(base) = path.parent() {
			config.resolve_relative_to(base);
		}

		debug!(path = %path.display(), grammars = config.grammars.len(), "Loaded grammar config");
		Ok(config)
	}

	/// Loads `$WPL_CONFIG`, else `~/.config/wpl/grammars.toml`, else an empty config.
	pub fn discover() -> Result<Self, ConfigError> {
		if let Some(path) = env::var_os(CONFIG_ENV) {
			return Self::load(Path::new(&path));
		}

		match dirs::config_dir().map(|d| d.join("wpl").join("grammars.toml")) {
			Some(path) if path.is_file() => Self::load(&path),
			_ => Ok(Self::default()),
		}
	}

	/// Returns the configuration for `name`, if any.
	pub fn grammar(&self, name: &str) -> Option<&GrammarConfig> {
		self.grammars.iter().find(|g| g.grammar_id == name)
	}

	fn resolve_relative_to(&mut self, base: &Path) {
		let resolve = |p: &mut PathBuf| {
			if p.is_relative() {
				*p = base.join(&*p);
			}
		};

		self.search_paths.iter_mut().for_each(resolve);
		for grammar in &mut self.grammars {
			resolve(&mut grammar.source.path);
		}
	}
}
