//! The text rewriter.
//!
//! For every construct a rule finds, the construction call is rebound to the
//! rule's local name and the rendered template is inserted right after the
//! call's `;`. Everything outside the matches passes through unchanged.

mod error;

pub use error::TransformError;

use crate::fix::{ByteRangeRewriter, EditBuilder};
use crate::rules::{CompiledRule, InjectionRule, OwnerFallback, Strategy, TemplateContext};
use crate::utils::{indentation_at, LineIndex};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Where an injection's owner reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerOrigin {
    /// Read from the owner key in the call arguments.
    Key,
    /// Fell back to the loop's iteration variable.
    LoopVariable,
    /// Fell back to the transformer's default variable.
    DefaultVariable,
}

impl OwnerOrigin {
    /// Whether the owner was guessed rather than read from the arguments.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        !matches!(self, Self::Key)
    }
}

/// One inserted statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Injection {
    /// Rule that produced it.
    pub rule: String,
    /// 1-based line of the construction call, in the text the rule ran on.
    pub line: usize,
    /// Loop iteration variable.
    pub loop_var: String,
    /// Owner reference passed to the injected call.
    pub owner: String,
    /// Where `owner` came from.
    pub owner_origin: OwnerOrigin,
}

/// A construct that was left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    /// Rule that found it.
    pub rule: String,
    /// 1-based line of the construction call.
    pub line: usize,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of running the transformer over one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transformation {
    /// Rewritten text.
    #[serde(skip)]
    pub output: String,
    /// Statements inserted, in order.
    pub injections: Vec<Injection>,
    /// Constructs that matched but were not rewritten.
    pub skipped: Vec<Skipped>,
}

impl Transformation {
    /// Whether anything was inserted.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.injections.is_empty()
    }
}

/// Applies a set of compiled rules to source text.
#[derive(Debug, Clone)]
pub struct Transformer {
    rules: Vec<CompiledRule>,
    default_variable: Option<String>,
}

impl Transformer {
    /// Create a transformer, checking that every identifier the rules need
    /// is in `in_scope`.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::UnboundIdentifier` for the first missing one.
    pub fn new(rules: Vec<CompiledRule>, in_scope: &FxHashSet<String>) -> Result<Self, TransformError> {
        for rule in &rules {
            if let Some(name) = rule
                .required_bindings()
                .iter()
                .find(|name| !in_scope.contains(*name))
            {
                return Err(TransformError::UnboundIdentifier {
                    rule: rule.name().to_owned(),
                    name: name.clone(),
                });
            }
        }
        Ok(Self {
            rules,
            default_variable: None,
        })
    }

    /// Owner used by rules with `owner_fallback = "default-variable"`.
    #[must_use]
    pub fn with_default_variable(mut self, name: impl Into<String>) -> Self {
        self.default_variable = Some(name.into());
        self
    }

    /// Rules in the order they run.
    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Run every rule over `source`, each on the previous rule's output.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule with `owner_fallback = "error"` finds no
    /// owner, or if the edits cannot be applied.
    pub fn transform(&self, source: &str) -> Result<Transformation, TransformError> {
        let mut result = Transformation {
            output: source.to_owned(),
            injections: Vec::new(),
            skipped: Vec::new(),
        };
        for rule in &self.rules {
            let pass = self.apply_rule(rule, &result.output)?;
            result.output = pass.output;
            result.injections.extend(pass.injections);
            result.skipped.extend(pass.skipped);
        }
        Ok(result)
    }

    fn apply_rule(&self, rule: &CompiledRule, source: &str) -> Result<Transformation, TransformError> {
        let config = rule.rule();
        let index = LineIndex::new(source);
        let mut rewriter = ByteRangeRewriter::new(source);
        let mut injections = Vec::new();
        let mut skipped = Vec::new();

        for m in rule.find(source) {
            let line = index.line_index(m.call.start);
            let (owner, owner_origin) = match rule.owner_in(source, &m) {
                Some(owner) => (owner, OwnerOrigin::Key),
                None => match config.owner_fallback {
                    OwnerFallback::LoopVariable => (m.loop_var.clone(), OwnerOrigin::LoopVariable),
                    OwnerFallback::DefaultVariable => match &self.default_variable {
                        Some(name) => (name.clone(), OwnerOrigin::DefaultVariable),
                        None => (m.loop_var.clone(), OwnerOrigin::LoopVariable),
                    },
                    OwnerFallback::Skip => {
                        skipped.push(Skipped {
                            rule: config.name.clone(),
                            line,
                            reason: format!("no '{}' owner reference", config.owner_key),
                        });
                        continue;
                    }
                    OwnerFallback::Error => {
                        return Err(TransformError::MissingOwner {
                            rule: config.name.clone(),
                            key: config.owner_key.clone(),
                            line,
                        });
                    }
                },
            };

            let statement = rule.template().render(&TemplateContext {
                binding: &config.bind_to,
                owner: &owner,
                loop_var: &m.loop_var,
                indent: indentation_at(source, &index, m.call.start),
                call_target: &config.call_target,
            });

            rewriter.add_edits(
                EditBuilder::new()
                    .insert(m.call.start, format!("{} = ", config.bind_to))
                    .insert(m.call.end, statement)
                    .build(),
            );
            injections.push(Injection {
                rule: config.name.clone(),
                line,
                loop_var: m.loop_var,
                owner,
                owner_origin,
            });
        }

        Ok(Transformation {
            output: rewriter.apply()?,
            injections,
            skipped,
        })
    }
}

/// Rewrite `content` with the built-in push-notification rule.
///
/// `default_var` only matters for rules whose owner fallback is
/// `default-variable`; the built-in rule falls back to the loop variable,
/// so it is accepted and ignored here. `in_scope` must contain every
/// identifier the injected statement references (for the built-in rule,
/// `$order`).
///
/// # Errors
///
/// Returns `TransformError::UnboundIdentifier` if `in_scope` lacks a required identifier.
pub fn add_push_notifications(
    content: &str,
    default_var: Option<&str>,
    in_scope: &[&str],
) -> Result<String, TransformError> {
    let rule = CompiledRule::compile(InjectionRule::default(), Strategy::default())?;
    let scope: FxHashSet<String> = in_scope.iter().map(|s| (*s).to_owned()).collect();
    let mut transformer = Transformer::new(vec![rule], &scope)?;
    if let Some(name) = default_var {
        transformer = transformer.with_default_variable(name);
    }
    Ok(transformer.transform(content)?.output)
}
