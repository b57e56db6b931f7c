//! Core library for the callsplice source rewriter.
//!
//! callsplice finds every record construction call that opens a loop body,
//! e.g. `foreach ($xs as $x) { Notification::create([...]); }`, binds the
//! created record to a local name and inserts a follow-up statement right
//! after it. The built-in rule adds an FCM push notification; further rules
//! are declared in `.callsplice.toml`.

#![allow(clippy::similar_names, clippy::items_after_statements)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module defining the command-line interface arguments and structs.
pub mod cli;

/// Module for handling CLI commands and their execution logic.
pub mod commands;

/// Module for loading configuration.
pub mod config;

/// Module containing shared constants and regex patterns.
pub mod constants;

/// Module defining the entry point logic shared by both binaries.
pub mod entry_point;

/// Byte-range edits applied to the original text.
pub mod fix;

/// Module for CLI output formatting with colored text and tables.
pub mod output;

/// Regex matching of constructs, kept for the `pattern` strategy.
pub mod pattern;

/// Injection rules, their compiled form and statement templates.
pub mod rules;

/// Depth-tracking scanner used by the `balanced` strategy.
pub mod scanner;

/// The rewriter that applies rules to source text.
pub mod transform;

/// Module containing utility functions.
/// This includes line indexing and target path expansion.
pub mod utils;

pub use transform::{add_push_notifications, TransformError, Transformation, Transformer};
