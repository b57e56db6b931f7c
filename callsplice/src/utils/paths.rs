//! Path utilities for callsplice.
//!
//! This module consolidates all path-related logic for:
//! - Cross-platform display normalization
//! - Source file discovery with gitignore support

use crate::constants::DEFAULT_EXCLUDE_FOLDERS;
use std::path::{Path, PathBuf};

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" or ".\" prefix (for cleaner output)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use callsplice::utils::normalize_display_path;
///
/// assert_eq!(normalize_display_path(Path::new(".\\app\\Services\\A.php")), "app/Services/A.php");
/// assert_eq!(normalize_display_path(Path::new("./app/B.php")), "app/B.php");
/// ```
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    // Strip Windows extended path prefix if present
    let clean = s.trim_start_matches(r"\\?\");
    let normalized = clean.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Checks if a name matches any exclusion pattern.
/// Supports exact matching and wildcard patterns starting with `*.`.
#[must_use]
pub fn is_excluded(name: &str, excludes: &[String]) -> bool {
    excludes.iter().any(|exclude| {
        exclude
            .strip_prefix('*')
            .filter(|suffix| suffix.starts_with('.'))
            .map_or(name == exclude, |suffix| name.ends_with(suffix))
    })
}

/// Collects files with one of `extensions` below `root`.
///
/// Uses the `ignore` crate to respect .gitignore, .git/info/exclude, and global gitignore
/// in addition to the default exclusions (`vendor`, `node_modules`, `.git`, ...).
/// Results are sorted so files are always processed in the same order.
#[must_use]
pub fn collect_source_files(
    root: &Path,
    extensions: &[String],
    exclude: &[String],
    verbose: bool,
) -> Vec<PathBuf> {
    use ignore::WalkBuilder;

    let mut all_excludes: Vec<String> = exclude.to_vec();
    all_excludes.extend(DEFAULT_EXCLUDE_FOLDERS().iter().map(|&s| s.to_owned()));
    let root_for_filter = root.to_path_buf();

    let walker = WalkBuilder::new(root)
        .hidden(false) // Hidden folders are covered by the default exclusions
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            if entry.path() == root_for_filter {
                return true;
            }
            if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return true;
            }
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !is_excluded(name, &all_excludes))
        })
        .build();

    let mut files = Vec::new();
    for result in walker {
        match result {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    continue;
                }
                let path = entry.path();
                let wanted = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
                if wanted {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) if verbose => eprintln!("[VERBOSE] Walk error: {e}"),
            Err(_) => {}
        }
    }

    files.sort();
    files
}

/// Expands CLI targets into the list of files to rewrite.
///
/// Files are taken as given, whatever their extension; directories are
/// walked with [`collect_source_files`]. Duplicates are dropped.
///
/// # Errors
///
/// Returns an error if a target does not exist.
pub fn expand_targets(
    targets: &[PathBuf],
    extensions: &[String],
    exclude: &[String],
    verbose: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for target in targets {
        if target.is_dir() {
            files.extend(collect_source_files(target, extensions, exclude, verbose));
        } else if target.exists() {
            files.push(target.clone());
        } else {
            anyhow::bail!(
                "The file or directory '{}' does not exist.",
                target.display()
            );
        }
    }

    let mut seen = rustc_hash::FxHashSet::default();
    files.retain(|f| seen.insert(f.clone()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn php() -> Vec<String> {
        vec!["php".to_owned()]
    }

    #[test]
    fn test_is_excluded() {
        let excludes = vec!["vendor".to_owned(), "*.bak".to_owned()];
        assert!(is_excluded("vendor", &excludes));
        assert!(is_excluded("old.bak", &excludes));
        assert!(!is_excluded("vendors", &excludes));
        assert!(!is_excluded("app", &excludes));
    }

    #[test]
    fn test_collect_source_files_filters_and_sorts() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("app/Services"))?;
        fs::create_dir_all(root.join("vendor/pkg"))?;
        fs::create_dir_all(root.join("legacy"))?;
        fs::write(root.join("app/Services/B.php"), "<?php")?;
        fs::write(root.join("app/Services/A.PHP"), "<?php")?;
        fs::write(root.join("app/readme.md"), "#")?;
        fs::write(root.join("vendor/pkg/C.php"), "<?php")?;
        fs::write(root.join("legacy/D.php"), "<?php")?;

        let files = collect_source_files(root, &php(), &["legacy".to_owned()], false);
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["A.PHP", "B.php"]);
        Ok(())
    }

    #[test]
    fn test_expand_targets_missing_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.php");
        let err = expand_targets(&[missing], &php(), &[], false).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_expand_targets_keeps_explicit_files_and_dedups() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("script.inc");
        fs::write(&file, "<?php")?;
        let php_file = dir.path().join("A.php");
        fs::write(&php_file, "<?php")?;

        let files = expand_targets(
            &[file.clone(), dir.path().to_path_buf(), php_file.clone()],
            &php(),
            &[],
            false,
        )?;
        assert_eq!(files, vec![file, php_file]);
        Ok(())
    }
}
