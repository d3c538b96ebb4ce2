use super::*;

#[test]
fn severity_display() {
    insta::assert_snapshot!(format!("{}", Severity::Error), @"error");
    insta::assert_snapshot!(format!("{}", Severity::Warning), @"warning");
}

#[test]
fn report_with_default_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.report(DiagnosticKind::ParseFailed, 0..5).emit();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.has_errors());
    assert!(!diagnostics.has_warnings());
    let msg = diagnostics.iter().next().unwrap();
    insta::assert_snapshot!(msg.to_string(), @"error at 0..5: unable to parse");
}

#[test]
fn report_with_custom_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnusedNoqa, 3..9)
        .message("noqa: L010")
        .emit();

    assert_eq!(diagnostics.warning_count(), 1);
    assert_eq!(diagnostics.error_count(), 0);
    let msg = diagnostics.iter().next().unwrap();
    insta::assert_snapshot!(msg.to_string(), @"warning at 3..9: unused noqa: `noqa: L010`");
}

#[test]
fn rule_violation_message_is_verbatim() {
    assert_eq!(
        DiagnosticKind::RuleViolation.message(Some("L010: Keywords must be upper case.")),
        "L010: Keywords must be upper case."
    );
    assert_eq!(
        DiagnosticKind::FixDropped.message(Some("patch inside template")),
        "fix dropped: patch inside template"
    );
}

#[test]
fn builder_with_fix_and_related() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::RuleViolation, 8..9)
        .message("no space before comma")
        .related_to("list starts here", 7..8)
        .fix("remove whitespace", "")
        .emit();

    let msg = diagnostics.iter().next().unwrap();
    insta::assert_snapshot!(
        msg.to_string(),
        @"error at 8..9: no space before comma (fix: remove whitespace) (related: list starts here at 7..8)"
    );
}

#[test]
fn sorted_orders_by_position_then_priority() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.report(DiagnosticKind::UnusedNoqa, 4..5).emit();
    diagnostics.report(DiagnosticKind::RuleViolation, 0..1).emit();
    diagnostics.report(DiagnosticKind::ParseFailed, 4..6).emit();

    let kinds: Vec<_> = diagnostics.sorted().iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::RuleViolation,
            DiagnosticKind::ParseFailed,
            DiagnosticKind::UnusedNoqa,
        ]
    );
}

#[test]
fn printer_renders_title_and_source_line() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::RuleViolation, 0..6)
        .message("Keywords must be upper case.")
        .emit();

    let out = diagnostics.printer("select 1").path("q.sql").render();
    assert!(out.starts_with("error: Keywords must be upper case."));
    assert!(out.contains("q.sql:1:1"));
    assert!(out.contains("select 1"));
}

#[test]
fn printer_handles_empty_span_at_end() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.report(DiagnosticKind::ParseFailed, 13..13).emit();

    let out = diagnostics.render("SELECT * FROM");
    assert!(out.starts_with("error: unable to parse"));
}

#[test]
fn extend_merges_collections() {
    let mut a = Diagnostics::new();
    a.report(DiagnosticKind::LexFailed, 0..1).emit();
    let mut b = Diagnostics::new();
    b.report(DiagnosticKind::LoopLimitReached, 0..0).emit();

    a.extend(b);
    assert_eq!(a.len(), 2);
    assert_eq!(a.error_count(), 1);
    assert_eq!(a.warning_count(), 1);
}
