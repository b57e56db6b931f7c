//! Declarative injection rules.
//!
//! A rule says which construct to look for (loop keyword + construction
//! call), what to bind the created record to, how to find the owner
//! reference, and what statement to inject after the call. Rules come from
//! `[[callsplice.rules]]` tables in the configuration file; without any, the
//! built-in `fcm-push` rule applies.

mod template;

pub use template::{Placeholder, Template, TemplateContext};

use crate::constants::{
    DEFAULT_BINDING, DEFAULT_CALL_TARGET, DEFAULT_LOOP_KEYWORD, DEFAULT_OWNER_KEY,
    DEFAULT_RULE_NAME, DEFAULT_TEMPLATE, PATTERN_CAPTURE_NAMES,
};
use crate::pattern;
use crate::scanner::{ConstructMatch, Scanner};
use crate::transform::TransformError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How constructs are located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Depth-tracking scanner that skips strings and comments.
    #[default]
    Balanced,
    /// Single regular expression with non-greedy captures.
    Pattern,
}

/// What to do when the call arguments carry no owner key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OwnerFallback {
    /// Use the loop's iteration variable. May name the wrong entity when the
    /// loop iterates over something other than the recipients.
    #[default]
    LoopVariable,
    /// Use the transformer's default variable, or the loop variable if none was given.
    DefaultVariable,
    /// Leave the match untouched.
    Skip,
    /// Abort the file.
    Error,
}

/// A rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InjectionRule {
    /// Identifier used in reports and by `--rule`.
    pub name: String,
    /// Loop construct keyword.
    pub loop_keyword: String,
    /// Record construction call, e.g. `Notification::create`.
    pub call_target: String,
    /// Local name the created record is bound to.
    pub bind_to: String,
    /// Array key whose `$var->id` value is the owner reference.
    pub owner_key: String,
    /// Behaviour when `owner_key` is absent.
    pub owner_fallback: OwnerFallback,
    /// Injected statement; the built-in FCM push block when unset.
    pub template: Option<String>,
    /// Identifiers the injected statement needs in scope, on top of the ones
    /// found in the template.
    pub requires: Vec<String>,
    /// Strategy override for this rule.
    pub strategy: Option<Strategy>,
    /// Custom expression for the pattern strategy. Must define the groups
    /// `header`, `var`, `call` and `args`. Implies the pattern strategy.
    pub pattern: Option<String>,
}

impl Default for InjectionRule {
    fn default() -> Self {
        Self {
            name: DEFAULT_RULE_NAME.to_owned(),
            loop_keyword: DEFAULT_LOOP_KEYWORD.to_owned(),
            call_target: DEFAULT_CALL_TARGET.to_owned(),
            bind_to: DEFAULT_BINDING.to_owned(),
            owner_key: DEFAULT_OWNER_KEY.to_owned(),
            owner_fallback: OwnerFallback::default(),
            template: None,
            requires: Vec::new(),
            strategy: None,
            pattern: None,
        }
    }
}

impl InjectionRule {
    /// The built-in rule with a different call target.
    #[must_use]
    pub fn for_call(call_target: impl Into<String>) -> Self {
        Self {
            call_target: call_target.into(),
            ..Self::default()
        }
    }

    /// The template text in effect.
    #[must_use]
    pub fn template_text(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }

    fn invalid(&self, reason: impl Into<String>) -> TransformError {
        TransformError::InvalidRule {
            rule: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn validate(&self) -> Result<(), TransformError> {
        let is_word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_');
        if self.name.trim().is_empty() {
            return Err(self.invalid("name must not be empty"));
        }
        if !is_word(&self.loop_keyword) {
            return Err(self.invalid(format!(
                "loop_keyword '{}' is not a plain word",
                self.loop_keyword
            )));
        }
        if self.call_target.trim().is_empty() {
            return Err(self.invalid("call_target must not be empty"));
        }
        if !self.bind_to.strip_prefix('$').is_some_and(is_word) {
            return Err(self.invalid(format!(
                "bind_to '{}' must be a variable like $notification",
                self.bind_to
            )));
        }
        if !is_word(&self.owner_key) {
            return Err(self.invalid(format!(
                "owner_key '{}' is not a plain word",
                self.owner_key
            )));
        }
        if let Some(bad) = self
            .requires
            .iter()
            .find(|r| !r.strip_prefix('$').is_some_and(is_word))
        {
            return Err(self.invalid(format!("requires entry '{bad}' is not a $variable")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Balanced,
    Pattern(Regex),
}

/// A validated rule, ready to run.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: InjectionRule,
    template: Template,
    matcher: Matcher,
    owner_loose: Regex,
    owner_entry: Regex,
    required: Vec<String>,
}

impl CompiledRule {
    /// Validate `rule` and compile its template and expressions.
    ///
    /// `strategy` applies unless the rule overrides it or carries its own pattern.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid fields, an invalid or incomplete custom
    /// pattern, or an unknown template placeholder.
    pub fn compile(rule: InjectionRule, strategy: Strategy) -> Result<Self, TransformError> {
        rule.validate()?;
        let template = Template::parse(&rule.name, rule.template_text())?;

        let matcher = match (&rule.pattern, rule.strategy.unwrap_or(strategy)) {
            (Some(custom), _) => {
                let re = Regex::new(custom).map_err(|source| TransformError::InvalidPattern {
                    rule: rule.name.clone(),
                    source,
                })?;
                if let Some(name) = pattern::missing_captures(&re, PATTERN_CAPTURE_NAMES).first() {
                    return Err(TransformError::MissingCapture {
                        rule: rule.name.clone(),
                        name: (*name).to_owned(),
                    });
                }
                Matcher::Pattern(re)
            }
            (None, Strategy::Pattern) => {
                let re = Regex::new(&pattern::default_pattern(&rule.loop_keyword, &rule.call_target))
                    .map_err(|source| TransformError::InvalidPattern {
                        rule: rule.name.clone(),
                        source,
                    })?;
                Matcher::Pattern(re)
            }
            (None, Strategy::Balanced) => Matcher::Balanced,
        };

        // Pattern: single-quoted key, `->id` prefix match, anywhere in the
        // arguments. Balanced: either quote, whole `->id`, entry start only.
        let key = regex::escape(&rule.owner_key);
        let compile_owner = |expr: &str| {
            Regex::new(expr).map_err(|source| TransformError::InvalidPattern {
                rule: rule.name.clone(),
                source,
            })
        };
        let owner_loose = compile_owner(&format!(r"'{key}'\s*=>\s*(\$\w+)->id"))?;
        let owner_entry = compile_owner(&format!(r#"^['"]{key}['"]\s*=>\s*(\$\w+)->id\b"#))?;

        let mut required = rule.requires.clone();
        for name in template.free_variables(&rule.bind_to) {
            if !required.contains(&name) {
                required.push(name);
            }
        }

        Ok(Self {
            rule,
            template,
            matcher,
            owner_loose,
            owner_entry,
            required,
        })
    }

    /// The rule as configured.
    #[must_use]
    pub fn rule(&self) -> &InjectionRule {
        &self.rule
    }

    /// Rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.rule.name
    }

    /// The strategy this rule actually runs with.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match self.matcher {
            Matcher::Balanced => Strategy::Balanced,
            Matcher::Pattern(_) => Strategy::Pattern,
        }
    }

    /// Compiled template.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Identifiers that must be in scope wherever this rule injects.
    #[must_use]
    pub fn required_bindings(&self) -> &[String] {
        &self.required
    }

    /// Find every construct this rule targets.
    #[must_use]
    pub fn find(&self, source: &str) -> Vec<ConstructMatch> {
        match &self.matcher {
            Matcher::Balanced => {
                Scanner::new(source).constructs(&self.rule.loop_keyword, &self.rule.call_target)
            }
            Matcher::Pattern(re) => pattern::find_constructs(re, source),
        }
    }

    /// The owner reference named by the call arguments, if any.
    ///
    /// The balanced strategy only looks at top-level array entries, accepts
    /// either quote and needs the whole `->id` attribute. The pattern strategy
    /// takes the first single-quoted `'key' => $x->id` prefix anywhere in the
    /// arguments, so `$u->identity` still yields `$u`.
    #[must_use]
    pub fn owner_in(&self, source: &str, m: &ConstructMatch) -> Option<String> {
        let capture = |re: &Regex, text: &str| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|g| g.as_str().to_owned())
        };
        match self.matcher {
            Matcher::Balanced => Scanner::new(source)
                .split_top_level(m.args.clone())
                .into_iter()
                .find_map(|entry| capture(&self.owner_entry, entry)),
            Matcher::Pattern(_) => capture(&self.owner_loose, m.args_text(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(rule: InjectionRule) -> Result<CompiledRule, TransformError> {
        CompiledRule::compile(rule, Strategy::Balanced)
    }

    #[test]
    fn test_default_rule_requires_order() {
        let rule = compile(InjectionRule::default()).unwrap();
        assert_eq!(rule.required_bindings(), ["$order".to_owned()]);
        assert_eq!(rule.strategy(), Strategy::Balanced);
    }

    #[test]
    fn test_explicit_requires_are_merged() {
        let rule = compile(InjectionRule {
            requires: vec!["$order".to_owned(), "$tenant".to_owned()],
            ..InjectionRule::default()
        })
        .unwrap();
        assert_eq!(
            rule.required_bindings(),
            ["$order".to_owned(), "$tenant".to_owned()]
        );
    }

    #[test]
    fn test_rule_strategy_override() {
        let rule = CompiledRule::compile(
            InjectionRule {
                strategy: Some(Strategy::Pattern),
                ..InjectionRule::default()
            },
            Strategy::Balanced,
        )
        .unwrap();
        assert_eq!(rule.strategy(), Strategy::Pattern);
    }

    #[test]
    fn test_custom_pattern_needs_all_captures() {
        let err = compile(InjectionRule {
            pattern: Some(r"(?P<header>for \{)(?P<call>x\((?P<args>.*?)\);)".to_owned()),
            ..InjectionRule::default()
        })
        .unwrap_err();
        assert!(matches!(err, TransformError::MissingCapture { ref name, .. } if name == "var"));
    }

    #[test]
    fn test_custom_pattern_invalid_regex() {
        let err = compile(InjectionRule {
            pattern: Some("(unclosed".to_owned()),
            ..InjectionRule::default()
        })
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidPattern { .. }));
    }

    #[test]
    fn test_invalid_binding_rejected() {
        let err = compile(InjectionRule {
            bind_to: "notification".to_owned(),
            ..InjectionRule::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("bind_to 'notification'"));
    }

    #[test]
    fn test_owner_top_level_only_in_balanced_mode() {
        let source = "foreach ($xs as $x) { Notification::create(['data' => ['user_id' => $other->id], 'user_id' => $admin->id]); }";
        let balanced = compile(InjectionRule::default()).unwrap();
        let m = &balanced.find(source)[0];
        assert_eq!(balanced.owner_in(source, m).as_deref(), Some("$admin"));

        let pattern = CompiledRule::compile(InjectionRule::default(), Strategy::Pattern).unwrap();
        let m = &pattern.find(source)[0];
        assert_eq!(pattern.owner_in(source, m).as_deref(), Some("$other"));
    }

    #[test]
    fn test_owner_key_requires_whole_id_attribute() {
        let source = "foreach ($xs as $x) { Notification::create([\"user_id\" => $u->identity]); }";
        let rule = compile(InjectionRule::default()).unwrap();
        let m = &rule.find(source)[0];
        assert_eq!(rule.owner_in(source, m), None);
    }

    #[test]
    fn test_pattern_owner_lookup_matches_id_prefix() {
        let source = "foreach ($xs as $x) { Notification::create(['user_id' => $u->identity]); }";
        let pattern = CompiledRule::compile(InjectionRule::default(), Strategy::Pattern).unwrap();
        let m = &pattern.find(source)[0];
        assert_eq!(pattern.owner_in(source, m).as_deref(), Some("$u"));

        let balanced = compile(InjectionRule::default()).unwrap();
        let m = &balanced.find(source)[0];
        assert_eq!(balanced.owner_in(source, m), None);
    }

    #[test]
    fn test_pattern_owner_lookup_needs_single_quotes() {
        let source = "foreach ($xs as $x) { Notification::create([\"user_id\" => $u->id]); }";
        let pattern = CompiledRule::compile(InjectionRule::default(), Strategy::Pattern).unwrap();
        let m = &pattern.find(source)[0];
        assert_eq!(pattern.owner_in(source, m), None);

        let balanced = compile(InjectionRule::default()).unwrap();
        let m = &balanced.find(source)[0];
        assert_eq!(balanced.owner_in(source, m).as_deref(), Some("$u"));
    }
}
