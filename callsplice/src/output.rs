//! Human-readable output for the CLI commands.

use crate::rules::CompiledRule;
use crate::transform::{OwnerOrigin, Transformation};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use std::io::Write;

/// Print the status lines for a rewritten file.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_file_written(
    writer: &mut impl Write,
    display_path: &str,
    result: &Transformation,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "{} {} ({} injected)",
        "Injection complete:".green(),
        display_path,
        result.injections.len()
    )?;
    writeln!(
        writer,
        "File updated: {} characters",
        result.output.chars().count()
    )
}

/// Print what a dry run would have done to a file.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_dry_run(
    writer: &mut impl Write,
    display_path: &str,
    result: &Transformation,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "{} {}: {} injection(s)",
        "[DRY-RUN]".yellow(),
        display_path,
        result.injections.len()
    )?;
    for injection in &result.injections {
        writeln!(
            writer,
            "  Would inject {} after line {} (owner {})",
            injection.rule, injection.line, injection.owner
        )?;
    }
    Ok(())
}

/// Print one line per injection whose owner reference was guessed, and per
/// skipped construct.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_warnings(
    writer: &mut impl Write,
    display_path: &str,
    result: &Transformation,
) -> std::io::Result<()> {
    for injection in result.injections.iter().filter(|i| i.owner_origin.is_fallback()) {
        let source = match injection.owner_origin {
            OwnerOrigin::DefaultVariable => "default variable",
            _ => "loop variable",
        };
        writeln!(
            writer,
            "{} {}:{}: rule '{}' found no owner key, used {} {}",
            "[WARN]".yellow().bold(),
            display_path,
            injection.line,
            injection.rule,
            source,
            injection.owner
        )?;
    }
    for skipped in &result.skipped {
        writeln!(
            writer,
            "{} {}:{}: rule '{}' skipped: {}",
            "[WARN]".yellow().bold(),
            display_path,
            skipped.line,
            skipped.rule,
            skipped.reason
        )?;
    }
    Ok(())
}

/// Print each injection, for verbose mode.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_injections(
    writer: &mut impl Write,
    display_path: &str,
    result: &Transformation,
) -> std::io::Result<()> {
    if result.injections.is_empty() {
        return writeln!(
            writer,
            "[VERBOSE] {display_path}: no constructs matched, content unchanged"
        );
    }
    for injection in &result.injections {
        writeln!(
            writer,
            "[VERBOSE] {}:{}: {} in loop over {}, owner {}",
            display_path,
            injection.line,
            injection.rule,
            injection.loop_var,
            injection.owner
        )?;
    }
    Ok(())
}

/// Print the rules in effect as a table.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_rules_table(writer: &mut impl Write, rules: &[CompiledRule]) -> std::io::Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Rule").add_attribute(Attribute::Bold).fg(Color::Cyan),
            Cell::new("Call").add_attribute(Attribute::Bold).fg(Color::Cyan),
            Cell::new("Binding").add_attribute(Attribute::Bold).fg(Color::Cyan),
            Cell::new("Owner key").add_attribute(Attribute::Bold).fg(Color::Cyan),
            Cell::new("Strategy").add_attribute(Attribute::Bold).fg(Color::Cyan),
            Cell::new("Requires").add_attribute(Attribute::Bold).fg(Color::Cyan),
        ]);

    for compiled in rules {
        let rule = compiled.rule();
        let strategy = format!("{:?}", compiled.strategy()).to_lowercase();
        let requires = if compiled.required_bindings().is_empty() {
            "-".to_owned()
        } else {
            compiled.required_bindings().join(", ")
        };
        table.add_row(vec![
            Cell::new(&rule.name),
            Cell::new(format!("{} > {}([...])", rule.loop_keyword, rule.call_target)),
            Cell::new(&rule.bind_to),
            Cell::new(&rule.owner_key),
            Cell::new(strategy),
            Cell::new(requires),
        ]);
    }

    writeln!(writer, "{table}")
}
