use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::constants::CONFIG_FILENAME;

/// Configuration written by `callsplice init`; mirrors the built-in rule.
pub const DEFAULT_CONFIG: &str = r#"
[callsplice]
# Identifiers in scope at every injection point. The built-in template
# references $order, so it must be listed before files can be rewritten.
in_scope = ["$order"]
extensions = ["php"]
exclude_folders = []
strategy = "balanced"      # balanced | pattern

[[callsplice.rules]]
name = "fcm-push"
loop_keyword = "foreach"
call_target = "Notification::create"
bind_to = "$notification"
owner_key = "user_id"
owner_fallback = "loop-variable"   # loop-variable | default-variable | skip | error
requires = []
# Leave unset for the built-in FCM push block. Placeholders:
# {{binding}} {{owner}} {{loop_var}} {{indent}} {{call_target}}
# template = '''
# {{indent}}$this->fcmService->sendToUser({{owner}}->id, [...]);'''
"#;

/// Executes the init command in the current directory.
///
/// # Errors
///
/// Returns an error if the current directory is unavailable or the file cannot be written.
pub fn run_init<W: Write>(writer: &mut W) -> Result<()> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    run_init_in(&current_dir, writer)
}

/// Executes the init command in a specific directory.
///
/// This is primarily used for testing.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be written.
pub fn run_init_in<W: Write>(root: &Path, writer: &mut W) -> Result<()> {
    writeln!(writer, "Initializing callsplice configuration...")?;

    let config_path = root.join(CONFIG_FILENAME);
    if config_path.exists() {
        writeln!(writer, "  • {CONFIG_FILENAME} already exists - skipping.")?;
    } else {
        fs::write(&config_path, format!("{}\n", DEFAULT_CONFIG.trim()))
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        writeln!(
            writer,
            "  • Created {CONFIG_FILENAME} with the built-in rule."
        )?;
    }

    writeln!(writer, "Initialization complete!")?;
    Ok(())
}
