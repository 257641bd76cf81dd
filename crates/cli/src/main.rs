//! `wpl-grammar` command line tool.
//!
//! Builds the wpl grammar from its generated sources and checks that the
//! compiled library loads.

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wpl_grammar::build::{BuildStatus, build_all_grammars, grammar_lib_dir};
use wpl_grammar::{GrammarLoader, GrammarSource, GrammarsConfig, load_checked};

use crate::cli::{Cli, Command};

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match run(cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{e:#}");
			ExitCode::FAILURE
		}
	}
}

fn init_tracing(verbose: bool) {
	let default = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
	let config = match &cli.config {
		Some(path) => GrammarsConfig::load(path),
		None => GrammarsConfig::discover(),
	}
	.context("failed to load grammar config")?;

	match cli.command {
		Command::Check { name, library } => check(&config, name, library),
		Command::Build { only, out } => build(&config, only, out),
		Command::Paths => {
			for dir in GrammarLoader::from_config(&config).search_paths() {
				println!("{}", dir.display());
			}
			Ok(())
		}
	}
}

fn check(config: &GrammarsConfig, name: String, library: Option<PathBuf>) -> anyhow::Result<()> {
	let source = match library {
		Some(path) => GrammarSource::library(name, path),
		None => GrammarSource::Named {
			name,
			loader: GrammarLoader::from_config(config),
		},
	};

	let handle = load_checked(&source)?;
	println!(
		"{}",
		ok_line(handle.name(), handle.abi_version(), handle.symbol_count(), handle.path())
	);
	Ok(())
}

/// Summary printed for a grammar that passed the load check.
fn ok_line(name: &str, abi_version: u32, symbol_count: u32, path: &Path) -> String {
	format!("ok: {name} (abi {abi_version}, {symbol_count} symbols) {}", path.display())
}

fn build(config: &GrammarsConfig, only: Option<Vec<String>>, out: Option<PathBuf>) -> anyhow::Result<()> {
	let grammars: Vec<_> = config
		.grammars
		.iter()
		.filter(|g| only.as_ref().is_none_or(|names| names.contains(&g.grammar_id)))
		.cloned()
		.collect();

	if grammars.is_empty() {
		bail!("no grammars to build; add [[grammar]] entries to grammars.toml");
	}

	let lib_dir = out.unwrap_or_else(grammar_lib_dir);
	info!(count = grammars.len(), lib_dir = %lib_dir.display(), "Building grammars");

	let results = build_all_grammars(
		grammars,
		&lib_dir,
		Some(Box::new(|name: &str, status: &str| println!("{name}: {status}"))),
	);

	let mut failed = 0;
	for (grammar, result) in &results {
		match result {
			Ok(BuildStatus::Built | BuildStatus::AlreadyBuilt) => {}
			Err(e) => {
				failed += 1;
				tracing::error!(grammar = %grammar.grammar_id, error = %e, "Grammar build failed");
			}
		}
	}

	if failed > 0 {
		bail!("{failed} of {} grammars failed to build", results.len());
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::ffi::OsStr;

	use super::*;

	#[test]
	fn test_ok_line_format() {
		assert_eq!(
			ok_line("wpl", 14, 87, Path::new("/tmp/grammars/libwpl.so")),
			"ok: wpl (abi 14, 87 symbols) /tmp/grammars/libwpl.so"
		);
	}

	#[test]
	fn test_check_missing_library_reports_load_error() {
		let dir = tempfile::tempdir().unwrap();
		let config = dir.path().join("grammars.toml");
		std::fs::write(&config, "").unwrap();
		let missing = dir.path().join("libwpl.so");

		let cli = Cli::parse_from([
			OsStr::new("wpl-grammar"),
			OsStr::new("--config"),
			config.as_os_str(),
			OsStr::new("check"),
			OsStr::new("--library"),
			missing.as_os_str(),
		]);
		let err = run(cli).unwrap_err();
		let message = format!("{err:#}");
		assert!(message.starts_with("Error loading grammar"), "{message}");
		assert!(message.contains("grammar not found: wpl"), "{message}");
	}

	#[test]
	fn test_unreadable_config_is_reported() {
		let dir = tempfile::tempdir().unwrap();
		let cli = Cli::parse_from([
			OsStr::new("wpl-grammar"),
			OsStr::new("--config"),
			dir.path().join("missing.toml").as_os_str(),
			OsStr::new("paths"),
		]);
		let err = run(cli).unwrap_err();
		assert!(format!("{err:#}").starts_with("failed to load grammar config"));
	}
}
