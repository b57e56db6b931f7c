//! Replacement templates with `{{placeholder}}` substitution.

use crate::constants::{IMPLICIT_BINDINGS, PLACEHOLDER_RE, VARIABLE_RE};
use crate::transform::TransformError;

/// A value a template can splice in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The local name the created record is bound to.
    Binding,
    /// The owner reference (`$user`, or the loop variable on fallback).
    Owner,
    /// The loop's per-iteration variable.
    LoopVar,
    /// Leading whitespace of the line holding the construction call.
    Indent,
    /// The construction call target, e.g. `Notification::create`.
    CallTarget,
}

impl Placeholder {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "binding" => Some(Self::Binding),
            "owner" => Some(Self::Owner),
            "loop_var" => Some(Self::LoopVar),
            "indent" => Some(Self::Indent),
            "call_target" => Some(Self::CallTarget),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// Values for one rendering.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// See [`Placeholder::Binding`].
    pub binding: &'a str,
    /// See [`Placeholder::Owner`].
    pub owner: &'a str,
    /// See [`Placeholder::LoopVar`].
    pub loop_var: &'a str,
    /// See [`Placeholder::Indent`].
    pub indent: &'a str,
    /// See [`Placeholder::CallTarget`].
    pub call_target: &'a str,
}

impl TemplateContext<'_> {
    fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Binding => self.binding,
            Placeholder::Owner => self.owner,
            Placeholder::LoopVar => self.loop_var,
            Placeholder::Indent => self.indent,
            Placeholder::CallTarget => self.call_target,
        }
    }
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `text`, rejecting unknown placeholders.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::UnknownPlaceholder` naming `rule`.
    pub fn parse(rule: &str, text: &str) -> Result<Self, TransformError> {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER_RE().captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let placeholder =
                Placeholder::parse(name.as_str()).ok_or_else(|| TransformError::UnknownPlaceholder {
                    rule: rule.to_owned(),
                    name: name.as_str().to_owned(),
                })?;
            if whole.start() > last {
                segments.push(Segment::Literal(text[last..whole.start()].to_owned()));
            }
            segments.push(Segment::Slot(placeholder));
            last = whole.end();
        }
        if last < text.len() {
            segments.push(Segment::Literal(text[last..].to_owned()));
        }
        Ok(Self { segments })
    }

    /// Render with the given values.
    #[must_use]
    pub fn render(&self, ctx: &TemplateContext<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(placeholder) => out.push_str(ctx.value(*placeholder)),
            }
        }
        out
    }

    /// Whether the template uses `placeholder`.
    #[must_use]
    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.segments.contains(&Segment::Slot(placeholder))
    }

    /// `$identifiers` written literally in the template, excluding `$this`
    /// and `binding`, in order of first appearance.
    ///
    /// These are names the injected statement assumes are in scope.
    #[must_use]
    pub fn free_variables(&self, binding: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for segment in &self.segments {
            let Segment::Literal(text) = segment else {
                continue;
            };
            for m in VARIABLE_RE().find_iter(text) {
                let name = m.as_str();
                if name == binding || IMPLICIT_BINDINGS().contains(name) {
                    continue;
                }
                if !found.iter().any(|f| f == name) {
                    found.push(name.to_owned());
                }
            }
        }
        found
    }
}
