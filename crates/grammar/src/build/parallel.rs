//! Parallel grammar building.

use std::path::Path;
use std::sync::mpsc;
use std::thread;

use super::Result;
use super::compile::{BuildStatus, build_grammar};
use crate::config::GrammarConfig;

/// Callback type for progress reporting: `(grammar, status)`.
pub type ProgressCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Build all grammars into `lib_dir` in parallel.
///
/// Results arrive in completion order, not input order.
pub fn build_all_grammars(
	grammars: Vec<GrammarConfig>,
	lib_dir: &Path,
	on_progress: Option<ProgressCallback>,
) -> Vec<(GrammarConfig, Result<BuildStatus>)> {
	if grammars.is_empty() {
		return Vec::new();
	}

	let (tx, rx) = mpsc::channel();
	let num_jobs = thread::available_parallelism().map(|n| n.get()).unwrap_or(4).min(8);

	let chunk_size = grammars.len().div_ceil(num_jobs).max(1);
	let chunks: Vec<Vec<GrammarConfig>> = grammars.chunks(chunk_size).map(|c| c.to_vec()).collect();

	for chunk in chunks {
		let tx = tx.clone();
		let lib_dir = lib_dir.to_path_buf();

		thread::spawn(move || {
			for grammar in chunk {
				let result = build_grammar(&grammar, &lib_dir);
				let _ = tx.send((grammar, result));
			}
		});
	}

	drop(tx);

	let mut results = Vec::new();
	for (grammar, result) in rx {
		if let Some(ref cb) = on_progress {
			let status = match &result {
				Ok(BuildStatus::AlreadyBuilt) => "up to date",
				Ok(BuildStatus::Built) => "built",
				Err(_) => "error",
			};
			cb(&grammar.grammar_id, status);
		}
		results.push((grammar, result));
	}

	results
}
