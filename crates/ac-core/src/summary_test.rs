use super::*;

fn name(s: &str) -> AlarmName {
    AlarmName::new(s)
}

#[test]
fn test_finish_counts_and_sorts() {
    let mut report = RunReport::new(false);
    report.record(AlarmOutcome::deleted(name("p-c-Errors")));
    report.record(AlarmOutcome::created(name("p-a-Errors")));
    report.record(AlarmOutcome::unchanged(name("p-b-Errors")));
    report.finish();

    assert!(report.success);
    assert_eq!(report.counts.created, 1);
    assert_eq!(report.counts.deleted, 1);
    assert_eq!(report.counts.unchanged, 1);
    assert_eq!(report.alarms[0].name, "p-a-Errors");
    assert!(report.finished_at.is_some());
    assert!(report.duration_ms().unwrap() >= 0);
}

#[test]
fn test_one_failure_fails_the_run() {
    let mut report = RunReport::new(false);
    for n in ["p-1-E", "p-2-E", "p-3-E", "p-4-E"] {
        report.record(AlarmOutcome::created(name(n)));
    }
    report.record(AlarmOutcome::failed(name("p-5-E"), "throttled"));
    report.finish();

    assert!(!report.success);
    assert_eq!(report.counts.created, 4);
    let failed: Vec<_> = report.failures().map(|f| f.name.to_string()).collect();
    assert_eq!(failed, vec!["p-5-E"]);
    assert_eq!(
        report.outcome_of("p-5-E").unwrap().reason.as_deref(),
        Some("throttled")
    );
}

#[test]
fn test_selector_error_fails_the_run() {
    let mut report = RunReport::new(false);
    report.record_selector(SelectorReport {
        selector: SelectorId::new("fns"),
        resource_type: ResourceType::Function,
        matched: 0,
        error: Some("listing failed".to_string()),
    });
    report.finish();
    assert!(!report.success);
    assert_eq!(report.failed_selectors().count(), 1);
}

#[test]
fn test_skipped_counts_against_success_unless_dry_run() {
    let mut applied = RunReport::new(false);
    applied.record(AlarmOutcome::skipped(name("p-a-E"), "cancelled"));
    applied.finish();
    assert!(!applied.success);

    let mut dry = RunReport::new(true);
    dry.record(AlarmOutcome::skipped(name("p-a-E"), "dry run"));
    dry.finish();
    assert!(dry.success);
}

#[test]
fn test_report_serializes_outcomes_lowercase() {
    let mut report = RunReport::new(false);
    report.record(AlarmOutcome::created(name("p-a-Errors")));
    report.finish();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["alarms"][0]["outcome"], "created");
    assert!(json["alarms"][0].get("reason").is_none());
    assert_eq!(json["counts"]["created"], 1);
    assert_eq!(json["success"], true);
}

#[test]
fn test_rejected_alarm_fails_the_run() {
    let mut report = RunReport::new(false);
    report.record(AlarmOutcome::created(name("p-a-Errors")));
    report.record_rejected([RejectedAlarm {
        selector: SelectorId::new("topics"),
        resource_name: "t".repeat(240),
        metric_name: "NumberOfNotificationsFailed".to_string(),
        reason: "too long".to_string(),
    }]);
    report.finish();

    assert!(!report.success);
    assert_eq!(report.counts.created, 1);
    assert_eq!(report.failures().count(), 0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["rejected"][0]["selector"], "topics");
}
