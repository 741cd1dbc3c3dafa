use super::*;
use ac_core::{
    AlarmDefinition, AlarmName, AlarmOutcome, AlarmParams, AlarmUpdate, DesiredAlarmSpec,
    RejectedAlarm, ResourceType, SelectorId, SelectorReport,
};
use std::collections::BTreeMap;

fn spec(name: &str) -> DesiredAlarmSpec {
    let params = AlarmParams::builtin_defaults().resolve().unwrap();
    DesiredAlarmSpec {
        name: AlarmName::new(name),
        selector: SelectorId::new("fns"),
        resource_type: ResourceType::Function,
        resource_name: "f1".to_string(),
        definition: AlarmDefinition::from_params(
            "AWS/Lambda",
            "Errors",
            BTreeMap::from([("FunctionName".to_string(), "f1".to_string())]),
            &params,
        ),
    }
}

#[test]
fn test_exit_code_display_is_empty() {
    let err: anyhow::Error = ExitCode(3).into();
    assert_eq!(err.to_string(), "");
    assert_eq!(err.downcast_ref::<ExitCode>().map(|c| c.0), Some(3));
}

#[test]
fn test_change_set_markers() {
    let plan = ReconciliationPlan {
        to_create: vec![spec("a-new")],
        to_update: vec![
            AlarmUpdate {
                spec: spec("a-changed"),
                changed_fields: vec!["threshold"],
            },
            AlarmUpdate {
                spec: spec("a-forced"),
                changed_fields: vec![],
            },
        ],
        to_delete: vec![AlarmName::new("a-gone")],
        unchanged: vec![spec("a-same")],
        withheld: vec![AlarmName::new("a-kept")],
    };

    assert_eq!(
        change_set_lines(&plan),
        vec![
            "+ a-new",
            "~ a-changed (threshold)",
            "U a-forced",
            "  a-same",
            "! a-kept",
            "- a-gone",
        ]
    );
}

#[test]
fn test_change_set_empty_plan() {
    assert!(change_set_lines(&ReconciliationPlan::default()).is_empty());
}

#[test]
fn test_only_y_confirms() {
    assert!(is_confirmation("y\n"));
    assert!(is_confirmation(" y "));
    assert!(!is_confirmation("yes\n"));
    assert!(!is_confirmation("Y\n"));
    assert!(!is_confirmation("\n"));
}

#[test]
fn test_confirm_prompt_goes_to_given_writer() {
    let mut input = std::io::Cursor::new("y\n");
    let mut out = Vec::new();
    assert!(confirm_with("execute updating above alarms ?", &mut input, &mut out).unwrap());
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "execute updating above alarms ? [y/n]: "
    );

    let mut input = std::io::Cursor::new("n\n");
    assert!(!confirm_with("again ?", &mut input, &mut std::io::sink()).unwrap());
}

#[tokio::test]
async fn test_within_fails_when_planning_outlasts_budget() {
    let err = within(
        Some(Duration::from_millis(20)),
        std::future::pending::<()>(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("nothing was changed"));

    assert_eq!(within(None, async { 7 }).await.unwrap(), 7);
    assert_eq!(
        within(Some(Duration::from_secs(5)), async { 7 }).await.unwrap(),
        7
    );
}

#[test]
fn test_report_lines_list_failures_and_totals() {
    let mut report = RunReport::new(false);
    report.record_selector(SelectorReport {
        selector: SelectorId::new("queues"),
        resource_type: ResourceType::Queue,
        matched: 0,
        error: Some("throttled".to_string()),
    });
    report.record(AlarmOutcome::created(AlarmName::new("a-1")));
    report.record(AlarmOutcome::failed(AlarmName::new("a-2"), "access denied"));
    report.finish();

    let lines = report_lines(&report);
    assert_eq!(lines[0], "selector queues (sqs:queue): throttled");
    assert_eq!(lines[1], "failed a-2: access denied");
    assert!(lines[2].starts_with("Done: 1 created, 0 updated, 0 deleted, 0 unchanged, 1 failed, 0 skipped"));
    assert!(exit_for(&report).is_err());
}

#[test]
fn test_dry_run_report_omits_planned_entries() {
    let mut report = RunReport::new(true);
    report.record(AlarmOutcome::skipped(AlarmName::new("a-1"), "would create"));
    report.finish();

    let lines = report_lines(&report);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Dry run: 0 created"));
    assert!(exit_for(&report).is_ok());
}

#[test]
fn test_report_lines_list_rejected_alarms() {
    let mut report = RunReport::new(false);
    report.record(AlarmOutcome::created(AlarmName::new("a-1")));
    report.record_rejected([RejectedAlarm {
        selector: SelectorId::new("topics"),
        resource_name: "long-topic".to_string(),
        metric_name: "NumberOfNotificationsFailed".to_string(),
        reason: "name too long".to_string(),
    }]);
    report.finish();

    let lines = report_lines(&report);
    assert_eq!(
        lines[0],
        "rejected topics (long-topic, NumberOfNotificationsFailed): name too long"
    );
    assert!(exit_for(&report).is_err());
}
