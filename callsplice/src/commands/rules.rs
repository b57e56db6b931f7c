use crate::config::CallspliceConfig;
use crate::output;
use crate::rules::CompiledRule;

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use super::inject::compile_rules;

#[derive(Serialize)]
struct RuleSummary<'a> {
    name: &'a str,
    loop_keyword: &'a str,
    call_target: &'a str,
    bind_to: &'a str,
    owner_key: &'a str,
    strategy: String,
    requires: &'a [String],
}

impl<'a> From<&'a CompiledRule> for RuleSummary<'a> {
    fn from(compiled: &'a CompiledRule) -> Self {
        let rule = compiled.rule();
        Self {
            name: &rule.name,
            loop_keyword: &rule.loop_keyword,
            call_target: &rule.call_target,
            bind_to: &rule.bind_to,
            owner_key: &rule.owner_key,
            strategy: format!("{:?}", compiled.strategy()).to_lowercase(),
            requires: compiled.required_bindings(),
        }
    }
}

/// List the rules in effect, as a table or JSON.
///
/// Rules are compiled first, so an invalid rule in the configuration is
/// reported here rather than on the first rewrite.
///
/// # Errors
///
/// Returns an error if a rule fails to compile or writing fails.
pub fn run_rules<W: Write>(config: &CallspliceConfig, json: bool, mut writer: W) -> Result<()> {
    let compiled = compile_rules(
        config.effective_rules(),
        config.strategy.unwrap_or_default(),
    )?;

    if json {
        let summaries: Vec<RuleSummary> = compiled.iter().map(RuleSummary::from).collect();
        serde_json::to_writer_pretty(&mut writer, &summaries)?;
        writeln!(writer)?;
    } else {
        output::print_rules_table(&mut writer, &compiled)?;
    }
    Ok(())
}
