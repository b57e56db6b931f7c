//! Tests for the rewriter on realistic service code.
#![allow(clippy::unwrap_used)]

use callsplice::pattern::{default_pattern, find_constructs};
use callsplice::rules::{CompiledRule, InjectionRule, OwnerFallback, Strategy};
use callsplice::scanner::scan_constructs;
use callsplice::transform::OwnerOrigin;
use callsplice::{add_push_notifications, TransformError, Transformer};
use regex::Regex;
use rustc_hash::FxHashSet;

const SERVICE: &str = r"<?php

class MoodboardNotificationService
{
    public function notifyDesigners(Order $order, $designers)
    {
        foreach ($designers as $designer) {
            Notification::create([
                'user_id' => $designer->id,
                'title' => 'New moodboard',
                'message' => 'A moodboard was shared with you',
                'type' => 'moodboard',
            ]);
        }
    }
}
";

const EXPECTED: &str = r"<?php

class MoodboardNotificationService
{
    public function notifyDesigners(Order $order, $designers)
    {
        foreach ($designers as $designer) {
            $notification = Notification::create([
                'user_id' => $designer->id,
                'title' => 'New moodboard',
                'message' => 'A moodboard was shared with you',
                'type' => 'moodboard',
            ]);

            // 🔥 Send FCM push notification
            $this->fcmService->sendToUser($designer->id, [
                'title' => $notification->title,
                'body' => $notification->message,
                'data' => [
                    'notification_id' => $notification->id,
                    'type' => $notification->type,
                    'order_id' => $order->id,
                ],
            ]);
        }
    }
}
";

fn scope() -> FxHashSet<String> {
    ["$order".to_owned()].into_iter().collect()
}

fn transformer(rule: InjectionRule, strategy: Strategy) -> Transformer {
    Transformer::new(vec![CompiledRule::compile(rule, strategy).unwrap()], &scope()).unwrap()
}

// =============================================================================
// Built-in rule
// =============================================================================

#[test]
fn test_service_method_is_rewritten() {
    let output = add_push_notifications(SERVICE, None, &["$order"]).unwrap();
    assert_eq!(output, EXPECTED);
}

#[test]
fn test_pattern_strategy_gives_same_output_on_well_formed_input() {
    let result = transformer(InjectionRule::default(), Strategy::Pattern)
        .transform(SERVICE)
        .unwrap();
    assert_eq!(result.output, EXPECTED);
}

#[test]
fn test_no_match_is_identity() {
    let source = "<?php\nforeach ($users as $user) {\n    Log::info($user->name);\n}\n";
    for strategy in [Strategy::Balanced, Strategy::Pattern] {
        let result = transformer(InjectionRule::default(), strategy)
            .transform(source)
            .unwrap();
        assert_eq!(result.output, source);
        assert!(!result.changed());
    }
}

#[test]
fn test_missing_order_in_scope_fails_fast() {
    let err = add_push_notifications(SERVICE, None, &[]).unwrap_err();
    assert!(matches!(
        err,
        TransformError::UnboundIdentifier { ref name, .. } if name == "$order"
    ));
}

#[test]
fn test_default_var_is_ignored_by_builtin_rule() {
    let with = add_push_notifications(SERVICE, Some("$admin"), &["$order"]).unwrap();
    assert_eq!(with, EXPECTED);
}

#[test]
fn test_record_create_scenario() {
    let source = "foreach ($list as $x) { Record::create(['user_id' => $x->id, 'title' => 'T', 'message' => 'M', 'type' => 'K']); }";
    let result = transformer(InjectionRule::for_call("Record::create"), Strategy::Balanced)
        .transform(source)
        .unwrap();

    let output = &result.output;
    assert!(output.starts_with("foreach ($list as $x) { $notification = Record::create(['user_id'"));
    for needle in [
        "sendToUser($x->id, [",
        "$notification->title",
        "$notification->message",
        "$notification->id",
        "$notification->type",
        "$order->id",
    ] {
        assert!(output.contains(needle), "missing {needle} in {output}");
    }
    assert!(output.ends_with("]); }"));
    assert_eq!(result.injections.len(), 1);
}

#[test]
fn test_record_create_scenario_exact_output() {
    let source = "foreach ($list as $x) { Record::create(['user_id' => $x->id, 'title' => 'T', 'message' => 'M', 'type' => 'K']); }";
    let expected = r"foreach ($list as $x) { $notification = Record::create(['user_id' => $x->id, 'title' => 'T', 'message' => 'M', 'type' => 'K']);

            // 🔥 Send FCM push notification
            $this->fcmService->sendToUser($x->id, [
                'title' => $notification->title,
                'body' => $notification->message,
                'data' => [
                    'notification_id' => $notification->id,
                    'type' => $notification->type,
                    'order_id' => $order->id,
                ],
            ]); }";

    for strategy in [Strategy::Balanced, Strategy::Pattern] {
        let result = transformer(InjectionRule::for_call("Record::create"), strategy)
            .transform(source)
            .unwrap();
        assert_eq!(result.output, expected);
    }
}

#[test]
fn test_builtin_block_keeps_fixed_indentation() {
    // The call sits at four spaces; the block stays at twelve.
    let source = "foreach ($users as $user) {\n    Notification::create(['user_id' => $user->id]);\n}\n";
    let expected = r"foreach ($users as $user) {
    $notification = Notification::create(['user_id' => $user->id]);

            // 🔥 Send FCM push notification
            $this->fcmService->sendToUser($user->id, [
                'title' => $notification->title,
                'body' => $notification->message,
                'data' => [
                    'notification_id' => $notification->id,
                    'type' => $notification->type,
                    'order_id' => $order->id,
                ],
            ]);
}
";
    let output = add_push_notifications(source, None, &["$order"]).unwrap();
    assert_eq!(output, expected);
}

#[test]
fn test_indent_placeholder_follows_call_in_custom_template() {
    let source = "foreach ($users as $user) {\n    Notification::create(['user_id' => $user->id]);\n}";
    let rule = InjectionRule {
        template: Some("\n{{indent}}track({{binding}});".to_owned()),
        ..InjectionRule::default()
    };
    let result = Transformer::new(
        vec![CompiledRule::compile(rule, Strategy::Balanced).unwrap()],
        &FxHashSet::default(),
    )
    .unwrap()
    .transform(source)
    .unwrap();
    assert_eq!(
        result.output,
        "foreach ($users as $user) {\n    $notification = Notification::create(['user_id' => $user->id]);\n    track($notification);\n}"
    );
}

#[test]
fn test_non_ascii_source_outside_strings() {
    let source = "<?php\n$café = 'x';\n<h1>Commandes livrées</h1>\nforeach ($clients as $client) {\n    Notification::create(['user_id' => $client->id]);\n}\n";
    let result = transformer(InjectionRule::default(), Strategy::Balanced)
        .transform(source)
        .unwrap();
    assert_eq!(result.injections.len(), 1);
    assert!(result.output.starts_with("<?php\n$café = 'x';\n<h1>Commandes livrées</h1>\n"));
    assert!(result.output.contains("sendToUser($client->id, ["));
}

#[test]
fn test_truncated_heredoc_is_left_alone() {
    let source = "<?php $x = <<<'A";
    for strategy in [Strategy::Balanced, Strategy::Pattern] {
        let result = transformer(InjectionRule::default(), strategy)
            .transform(source)
            .unwrap();
        assert_eq!(result.output, source);
    }
}

// =============================================================================
// Owner reference
// =============================================================================

#[test]
fn test_owner_key_wins_over_loop_variable() {
    let source = "foreach ($roles as $role) {\n    Notification::create(['user_id' => $member->id, 'title' => $role->name]);\n}";
    let result = transformer(InjectionRule::default(), Strategy::Balanced)
        .transform(source)
        .unwrap();
    assert!(result.output.contains("sendToUser($member->id, ["));
    assert!(!result.output.contains("sendToUser($role->id"));
    assert_eq!(result.injections[0].owner, "$member");
    assert_eq!(result.injections[0].owner_origin, OwnerOrigin::Key);
}

#[test]
fn test_missing_owner_falls_back_to_loop_variable() {
    let source = "foreach ($roles as $role) {\n    Notification::create(['title' => 'Role changed']);\n}";
    let result = transformer(InjectionRule::default(), Strategy::Balanced)
        .transform(source)
        .unwrap();
    assert!(result.output.contains("sendToUser($role->id, ["));
    assert_eq!(result.injections[0].owner_origin, OwnerOrigin::LoopVariable);
    assert!(result.injections[0].owner_origin.is_fallback());
}

#[test]
fn test_nested_owner_key_only_counts_at_top_level_when_balanced() {
    let source = "foreach ($teams as $team) { Notification::create(['data' => ['user_id' => $lead->id], 'title' => 'T']); }";

    let balanced = transformer(InjectionRule::default(), Strategy::Balanced)
        .transform(source)
        .unwrap();
    assert_eq!(balanced.injections[0].owner, "$team");

    let pattern = transformer(InjectionRule::default(), Strategy::Pattern)
        .transform(source)
        .unwrap();
    assert_eq!(pattern.injections[0].owner, "$lead");
}

#[test]
fn test_pattern_owner_lookup_stops_at_id_prefix() {
    let source = "foreach ($xs as $x) { Notification::create(['user_id' => $u->identity]); }";

    let pattern = transformer(InjectionRule::default(), Strategy::Pattern)
        .transform(source)
        .unwrap();
    assert_eq!(pattern.injections[0].owner, "$u");
    assert!(pattern.output.contains("sendToUser($u->id, ["));

    let balanced = transformer(InjectionRule::default(), Strategy::Balanced)
        .transform(source)
        .unwrap();
    assert_eq!(balanced.injections[0].owner, "$x");
    assert_eq!(balanced.injections[0].owner_origin, OwnerOrigin::LoopVariable);
}

#[test]
fn test_skip_fallback_reports_construct() {
    let source = "foreach ($roles as $role) { Notification::create(['title' => 'T']); }";
    let result = transformer(
        InjectionRule {
            owner_fallback: OwnerFallback::Skip,
            ..InjectionRule::default()
        },
        Strategy::Balanced,
    )
    .transform(source)
    .unwrap();
    assert_eq!(result.output, source);
    assert_eq!(result.skipped.len(), 1);
}

// =============================================================================
// Matching semantics
// =============================================================================

#[test]
fn test_every_loop_is_rewritten_left_to_right() {
    let source = "foreach ($a as $x) {\n    Notification::create(['user_id' => $x->id]);\n}\nforeach ($b as $y) {\n    Notification::create(['user_id' => $y->id]);\n}\n";
    let result = transformer(InjectionRule::default(), Strategy::Balanced)
        .transform(source)
        .unwrap();
    let lines: Vec<usize> = result.injections.iter().map(|i| i.line).collect();
    assert_eq!(lines, vec![2, 5]);
    assert_eq!(result.output.matches("$notification = Notification::create").count(), 2);
    assert!(
        result.output.find("sendToUser($x->id").unwrap()
            < result.output.find("sendToUser($y->id").unwrap()
    );
}

#[test]
fn test_only_first_call_in_loop_body() {
    let source = "foreach ($users as $user) {\n    Notification::create(['user_id' => $user->id]);\n    Notification::create(['user_id' => $user->manager->id]);\n}";
    for strategy in [Strategy::Balanced, Strategy::Pattern] {
        let result = transformer(InjectionRule::default(), strategy)
            .transform(source)
            .unwrap();
        assert_eq!(result.injections.len(), 1);
        assert_eq!(result.output.matches("$notification = ").count(), 1);
        assert!(result.output.contains("\n    Notification::create(['user_id' => $user->manager->id]);"));
    }
}

#[test]
fn test_second_pass_leaves_rewritten_text_alone() {
    // The rebound call no longer opens the loop body, so nothing matches again.
    for strategy in [Strategy::Balanced, Strategy::Pattern] {
        let t = transformer(InjectionRule::default(), strategy);
        let first = t.transform(SERVICE).unwrap();
        let second = t.transform(&first.output).unwrap();
        assert_eq!(second.output, first.output);
        assert!(second.injections.is_empty());
    }
}

#[test]
fn test_closing_sequence_in_string_truncates_pattern_match() {
    let source = "foreach ($users as $user) {\n    Notification::create([\n        'user_id' => $user->id,\n        'message' => 'Done ]); really',\n    ]);\n}";

    let pattern = transformer(InjectionRule::default(), Strategy::Pattern)
        .transform(source)
        .unwrap();
    // The match ends inside the string literal.
    assert!(pattern
        .output
        .contains("'message' => 'Done ]);\n\n            // 🔥 Send FCM push notification"));
    assert!(pattern.output.ends_with(" really',\n    ]);\n}"));

    let balanced = transformer(InjectionRule::default(), Strategy::Balanced)
        .transform(source)
        .unwrap();
    assert!(balanced.output.contains("'message' => 'Done ]); really',\n    ]);\n\n            // 🔥 Send FCM push notification"));
    assert!(balanced.output.ends_with("                ],\n            ]);\n}"));
}

#[test]
fn test_pattern_header_can_span_into_next_loop() {
    let source = "foreach ($a as $b) {\n    doSomething();\n}\nforeach ($users as $user) {\n    Notification::create(['user_id' => $user->id]);\n}";

    let re = Regex::new(&default_pattern("foreach", "Notification::create")).unwrap();
    let by_pattern = find_constructs(&re, source);
    assert_eq!(by_pattern.len(), 1);
    assert!(by_pattern[0].header_text(source).starts_with("foreach ($a as $b) {"));

    let by_scanner = scan_constructs(source, "foreach", "Notification::create");
    assert_eq!(by_scanner.len(), 1);
    assert!(by_scanner[0].header_text(source).starts_with("foreach ($users as $user) {"));

    // Both agree on the call and loop variable.
    assert_eq!(by_pattern[0].call, by_scanner[0].call);
    assert_eq!(by_pattern[0].loop_var, "$user");
    assert_eq!(by_scanner[0].loop_var, "$user");
}

#[test]
fn test_commented_out_construct_is_ignored_when_balanced() {
    let source = "/*\nforeach ($users as $user) {\n    Notification::create(['user_id' => $user->id]);\n}\n*/\n";
    let result = transformer(InjectionRule::default(), Strategy::Balanced)
        .transform(source)
        .unwrap();
    assert_eq!(result.output, source);
}
