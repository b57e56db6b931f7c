use crate::fix::RewriteError;

/// Errors raised while compiling rules or transforming source text.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A rule field has an unusable value.
    #[error("rule '{rule}': {reason}")]
    InvalidRule {
        /// Rule name.
        rule: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A custom pattern does not compile.
    #[error("rule '{rule}': invalid pattern: {source}")]
    InvalidPattern {
        /// Rule name.
        rule: String,
        /// Underlying regex error.
        source: regex::Error,
    },
    /// A custom pattern lacks a required capture group.
    #[error("rule '{rule}': pattern has no capture group named '{name}'")]
    MissingCapture {
        /// Rule name.
        rule: String,
        /// Missing group name.
        name: String,
    },
    /// A template references a placeholder that does not exist.
    #[error("rule '{rule}': unknown template placeholder '{{{{{name}}}}}'")]
    UnknownPlaceholder {
        /// Rule name.
        rule: String,
        /// Placeholder name.
        name: String,
    },
    /// The injected statement needs an identifier the caller did not declare in scope.
    #[error("rule '{rule}' requires '{name}' in scope at the injection point; declare it with --in-scope {name}")]
    UnboundIdentifier {
        /// Rule name.
        rule: String,
        /// Identifier, including the `$` sigil.
        name: String,
    },
    /// No owner key was found and the rule forbids falling back.
    #[error("rule '{rule}': no '{key}' owner reference in the call on line {line}")]
    MissingOwner {
        /// Rule name.
        rule: String,
        /// Owner key that was looked up.
        key: String,
        /// 1-based line of the construction call.
        line: usize,
    },
    /// The collected edits could not be applied.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}
