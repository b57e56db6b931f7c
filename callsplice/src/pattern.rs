//! Regex strategy for finding constructs.
//!
//! One expression matches the whole construct. The loop header and the
//! argument body are matched non-greedily with dot-matches-newline, so the
//! argument body ends at the nearest `]);` even when that sequence sits
//! inside a string literal, and the header capture of a loop whose body does
//! not open with the call can stretch into a following loop.

use crate::scanner::ConstructMatch;
use regex::Regex;

/// Build the default expression for a loop keyword and call target.
///
/// The named groups are `header`, `iter`, `var`, `call` and `args`.
#[must_use]
pub fn default_pattern(loop_keyword: &str, call_target: &str) -> String {
    format!(
        r"(?s)(?P<header>{kw} \((?P<iter>.*?) as (?P<var>\$\w+)\)\s*\{{\s*)(?P<call>{target}\(\[(?P<args>.*?)\]\);)",
        kw = regex::escape(loop_keyword),
        target = regex::escape(call_target),
    )
}

/// Capture names from `required` that `re` does not define.
#[must_use]
pub fn missing_captures<'r>(re: &Regex, required: &[&'r str]) -> Vec<&'r str> {
    required
        .iter()
        .copied()
        .filter(|name| !re.capture_names().flatten().any(|n| n == *name))
        .collect()
}

/// Find every match of `re` in `source`, left to right and non-overlapping.
///
/// `re` must define the `header`, `var`, `call` and `args` groups; matches
/// where any of them did not participate are dropped.
#[must_use]
pub fn find_constructs(re: &Regex, source: &str) -> Vec<ConstructMatch> {
    re.captures_iter(source)
        .filter_map(|caps| {
            let header = caps.name("header")?;
            let var = caps.name("var")?;
            let call = caps.name("call")?;
            let args = caps.name("args")?;
            Some(ConstructMatch {
                header: header.range(),
                loop_var: var.as_str().to_owned(),
                call: call.range(),
                args: args.range(),
            })
        })
        .collect()
}
