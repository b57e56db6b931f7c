use crate::cli::{Cli, Commands, InjectArgs};
use crate::commands::{build_transformer, run_init, run_inject, run_rules, InjectOptions};
use crate::config::Config;
use crate::utils::expand_targets;

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Runs callsplice with the given arguments, writing to stdout.
///
/// # Errors
///
/// Returns an error if a file cannot be read, transformed, or written.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Runs callsplice with the given arguments, writing results to `writer`.
///
/// Diagnostics go to stderr. Usage and configuration problems return exit
/// code 1; failures while rewriting files are returned as errors.
///
/// # Errors
///
/// Returns an error if a file cannot be read, transformed, or written.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["callsplice".to_owned()];
    program_args.extend(args);
    let cli_var = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(0);
            }
            _ => {
                eprint!("{e}");
                return Ok(1);
            }
        },
    };

    match cli_var.command {
        Some(Commands::Init) => {
            run_init(writer)?;
            Ok(0)
        }
        Some(Commands::Rules { config, json }) => {
            let config = match load_config(config.as_deref(), Path::new(".")) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error: {e}");
                    return Ok(1);
                }
            };
            run_rules(&config.callsplice, json, writer)?;
            Ok(0)
        }
        None => run_inject_command(&cli_var.inject, writer),
    }
}

fn load_config(explicit: Option<&Path>, start: &Path) -> Result<Config> {
    match explicit {
        Some(path) => Config::load_file(path),
        None => Ok(Config::load_from_path(start)),
    }
}

fn run_inject_command<W: std::io::Write>(args: &InjectArgs, writer: &mut W) -> Result<i32> {
    if args.paths.is_empty() {
        eprintln!("Error: no files or directories given. Run `callsplice --help` for usage.");
        return Ok(1);
    }

    let start = args.paths.first().map_or(Path::new("."), PathBuf::as_path);
    let config = match load_config(args.config.as_deref(), start) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(1);
        }
    };
    let settings = &config.callsplice;

    let extensions = if args.extensions.is_empty() {
        settings.extensions()
    } else {
        args.extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_owned())
            .collect()
    };
    let mut exclude_folders = settings.exclude_folders.clone();
    exclude_folders.extend(args.exclude.iter().cloned());

    let transformer = match build_transformer(settings, args) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(1);
        }
    };

    let files = match expand_targets(&args.paths, &extensions, &exclude_folders, args.verbose) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(1);
        }
    };

    if args.verbose && !args.json {
        eprintln!("[VERBOSE] callsplice v{}", env!("CARGO_PKG_VERSION"));
        if let Some(path) = &config.config_file_path {
            eprintln!("[VERBOSE] Config: {}", path.display());
        }
        let names: Vec<&str> = transformer.rules().iter().map(|r| r.name()).collect();
        eprintln!("[VERBOSE] Rules: {names:?}");
        eprintln!("[VERBOSE] Extensions: {extensions:?}");
        eprintln!("[VERBOSE] Exclude folders: {exclude_folders:?}");
        eprintln!("[VERBOSE] Files: {}", files.len());
        eprintln!();
    }

    run_inject(
        &files,
        &transformer,
        InjectOptions {
            dry_run: args.dry_run,
            json: args.json,
            verbose: args.verbose,
        },
        writer,
    )?;
    Ok(0)
}
