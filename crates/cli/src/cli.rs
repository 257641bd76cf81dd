use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "wpl-grammar")]
#[command(about = "Build and check the compiled wpl tree-sitter grammar")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Grammar config file (defaults to $WPL_CONFIG or ~/.config/wpl/grammars.toml)
	#[arg(long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Check that a compiled grammar loads
	Check {
		/// Grammar name
		#[arg(default_value = wpl_grammar::WPL_GRAMMAR)]
		name: String,

		/// Load this library instead of searching the grammar paths
		#[arg(long, value_name = "PATH")]
		library: Option<PathBuf>,
	},
	/// Build configured grammars into shared libraries
	Build {
		/// Only build specific grammars (comma-separated)
		#[arg(long, value_delimiter = ',')]
		only: Option<Vec<String>>,

		/// Output directory (defaults to the grammar cache directory)
		#[arg(long, value_name = "DIR")]
		out: Option<PathBuf>,
	},
	/// Print the directories searched for compiled grammars
	Paths,
}
