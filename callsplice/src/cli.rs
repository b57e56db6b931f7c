use crate::rules::Strategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.callsplice.toml):
  Looked up from the first target path upwards, or given with --config.

  [callsplice]
  in_scope = [\"$order\"]      # Identifiers available at every injection point
  extensions = [\"php\"]       # Scanned when a directory is given
  exclude_folders = [\"legacy\"]
  strategy = \"balanced\"      # balanced | pattern

  [[callsplice.rules]]
  name = \"fcm-push\"
  call_target = \"Notification::create\"
  bind_to = \"$notification\"
  owner_key = \"user_id\"
  owner_fallback = \"loop-variable\"  # loop-variable | default-variable | skip | error
  # template = '''...{{binding}} {{owner}} {{loop_var}} {{indent}}...'''
";

/// Options for the default (inject) command.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are legitimately booleans
pub struct InjectArgs {
    /// Files or directories to rewrite. Directories are walked for files
    /// with a configured extension.
    pub paths: Vec<PathBuf>,

    /// Configuration file to use instead of searching for .callsplice.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only run the named rule (repeatable).
    #[arg(short, long = "rule")]
    pub rules: Vec<String>,

    /// Identifier in scope at every injection point, e.g. `$order` (repeatable).
    #[arg(short = 's', long = "in-scope")]
    pub in_scope: Vec<String>,

    /// Matching strategy (overrides config).
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Owner for rules whose owner fallback is `default-variable`.
    #[arg(long)]
    pub default_var: Option<String>,

    /// Extension to scan in directories (repeatable, overrides config).
    #[arg(long = "ext")]
    pub extensions: Vec<String>,

    /// Folders to exclude when walking directories.
    #[arg(short, long, alias = "exclude-folder")]
    pub exclude: Vec<String>,

    /// Show what would be injected without writing any file.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output a JSON report instead of status lines.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output (rules, files, each injection).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Command line interface configuration using `clap`.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "callsplice - insert a statement after every loop-scoped record construction call",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    #[command(subcommand)]
    /// The subcommand to execute; rewriting files when absent.
    pub command: Option<Commands>,

    /// Options for rewriting files.
    #[command(flatten)]
    pub inject: InjectArgs,
}

#[derive(Subcommand, Debug)]
/// Available subcommands.
pub enum Commands {
    /// List the rules in effect
    Rules {
        /// Configuration file to use instead of searching for .callsplice.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create a .callsplice.toml with the built-in rule in the current directory
    Init,
}
