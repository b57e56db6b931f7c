use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Name of the project configuration file.
pub const CONFIG_FILENAME: &str = ".callsplice.toml";

/// Name of the built-in rule.
pub const DEFAULT_RULE_NAME: &str = "fcm-push";

/// Loop keyword the built-in rule anchors on.
pub const DEFAULT_LOOP_KEYWORD: &str = "foreach";

/// Record construction call the built-in rule looks for.
pub const DEFAULT_CALL_TARGET: &str = "Notification::create";

/// Local name the created record is bound to.
pub const DEFAULT_BINDING: &str = "$notification";

/// Array key whose `$var->id` value names the notification owner.
pub const DEFAULT_OWNER_KEY: &str = "user_id";

/// Statement injected after each matched construction call.
///
/// The block has a fixed shape: it is indented by twelve spaces wherever the
/// call sits, which is the method-body depth of the service classes it was
/// written for. Custom templates can follow the call with `{{indent}}`.
pub const DEFAULT_TEMPLATE: &str = "

            // 🔥 Send FCM push notification
            $this->fcmService->sendToUser({{owner}}->id, [
                'title' => {{binding}}->title,
                'body' => {{binding}}->message,
                'data' => [
                    'notification_id' => {{binding}}->id,
                    'type' => {{binding}}->type,
                    'order_id' => $order->id,
                ],
            ]);";

/// Capture names a custom pattern must define.
pub const PATTERN_CAPTURE_NAMES: &[&str] = &["header", "var", "call", "args"];

/// Extensions scanned when a directory is given.
pub const DEFAULT_EXTENSIONS: &[&str] = &["php"];

/// Regex for `{{name}}` template placeholders.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("Invalid placeholder regex pattern")
    })
}

/// Regex for `$identifier` references inside a template.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_variable_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"\$[A-Za-z_]\w*").expect("Invalid variable regex pattern"))
}

/// Identifiers that are always in scope inside a class method.
pub fn get_implicit_bindings() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert("$this");
        s
    })
}

/// Set of folders to exclude by default.
pub fn get_default_exclude_folders() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert(".git");
        s.insert(".idea");
        s.insert("vendor");
        s.insert("node_modules");
        s.insert("storage");
        s.insert("build");
        s.insert("dist");
        s
    })
}

pub use get_default_exclude_folders as DEFAULT_EXCLUDE_FOLDERS;
pub use get_implicit_bindings as IMPLICIT_BINDINGS;
pub use get_placeholder_re as PLACEHOLDER_RE;
pub use get_variable_re as VARIABLE_RE;
