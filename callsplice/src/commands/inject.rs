//! The default command: rewrite files.

use crate::cli::InjectArgs;
use crate::config::CallspliceConfig;
use crate::output;
use crate::rules::{CompiledRule, Strategy};
use crate::transform::{Transformation, Transformer};
use crate::utils::normalize_display_path;

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Options for the inject command
#[derive(Debug, Default, Clone, Copy)]
pub struct InjectOptions {
    /// Report only; leave files untouched
    pub dry_run: bool,
    /// Emit a JSON report instead of status lines
    pub json: bool,
    /// Print each injection
    pub verbose: bool,
}

/// Outcome for one file
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// File path as displayed
    pub file: String,
    /// Whether the file was written
    pub written: bool,
    /// Length of the resulting content in characters
    pub characters: usize,
    /// Injections and skipped constructs
    #[serde(flatten)]
    pub transformation: Transformation,
}

/// Outcome for a whole run
#[derive(Debug, Serialize)]
pub struct InjectReport {
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Per-file outcomes, in processing order
    pub files: Vec<FileReport>,
    /// Injections across all files
    pub total_injections: usize,
}

/// Normalize an in-scope identifier to carry its `$` sigil.
fn sigil(name: &str) -> String {
    let name = name.trim();
    if name.starts_with('$') {
        name.to_owned()
    } else {
        format!("${name}")
    }
}

/// Build the transformer from configuration and command-line overrides.
///
/// # Errors
///
/// Returns an error if `--rule` names an unknown rule, a rule fails to
/// compile, or a required identifier is not in scope.
pub fn build_transformer(config: &CallspliceConfig, args: &InjectArgs) -> Result<Transformer> {
    let mut rules = config.effective_rules();
    if let Some(unknown) = args
        .rules
        .iter()
        .find(|wanted| !rules.iter().any(|r| &r.name == *wanted))
    {
        anyhow::bail!("Unknown rule '{unknown}'. Run `callsplice rules` to list the rules in effect.");
    }
    if !args.rules.is_empty() {
        rules.retain(|r| args.rules.contains(&r.name));
    }

    let strategy = args.strategy.or(config.strategy).unwrap_or_default();
    let compiled = compile_rules(rules, strategy)?;

    let scope: FxHashSet<String> = config
        .in_scope
        .iter()
        .chain(&args.in_scope)
        .map(|s| sigil(s))
        .collect();

    let mut transformer = Transformer::new(compiled, &scope)?;
    if let Some(name) = &args.default_var {
        transformer = transformer.with_default_variable(sigil(name));
    }
    Ok(transformer)
}

/// Compile every rule with `strategy` as the default.
///
/// # Errors
///
/// Returns the first compile error.
pub fn compile_rules(
    rules: Vec<crate::rules::InjectionRule>,
    strategy: Strategy,
) -> Result<Vec<CompiledRule>> {
    rules
        .into_iter()
        .map(|rule| CompiledRule::compile(rule, strategy).map_err(anyhow::Error::from))
        .collect()
}

/// Rewrite `files` in order: read, transform, write, report.
///
/// The first failing file aborts the run; files already written stay written.
///
/// # Errors
///
/// Returns an error if a file cannot be read (including invalid UTF-8),
/// transformed, or written, or if writing the report fails.
pub fn run_inject<W: Write>(
    files: &[PathBuf],
    transformer: &Transformer,
    options: InjectOptions,
    writer: &mut W,
) -> Result<InjectReport> {
    let mut reports = Vec::new();

    for file in files {
        let display = normalize_display_path(file);
        let content =
            fs::read_to_string(file).with_context(|| format!("Failed to read {display}"))?;
        let result = transformer
            .transform(&content)
            .with_context(|| format!("Failed to transform {display}"))?;

        if !options.dry_run {
            fs::write(file, &result.output).with_context(|| format!("Failed to write {display}"))?;
        }

        if !options.json {
            if options.dry_run {
                output::print_dry_run(writer, &display, &result)?;
            } else {
                output::print_file_written(writer, &display, &result)?;
            }
            output::print_warnings(writer, &display, &result)?;
            if options.verbose {
                output::print_injections(writer, &display, &result)?;
            }
        }

        reports.push(FileReport {
            file: display,
            written: !options.dry_run,
            characters: result.output.chars().count(),
            transformation: result,
        });
    }

    let report = InjectReport {
        dry_run: options.dry_run,
        total_injections: reports
            .iter()
            .map(|r| r.transformation.injections.len())
            .sum(),
        files: reports,
    };

    if options.json {
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
    }

    Ok(report)
}
