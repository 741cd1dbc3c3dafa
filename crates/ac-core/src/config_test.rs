use super::*;
use crate::alarm::Statistic;
use serial_test::serial;
use tempfile::tempdir;

const SAMPLE: &str = r#"
globals:
  alarm:
    alarm_name_prefix: acme
    default_alarm_params:
      Period: 300
    alarm_tags:
      ManagedBy: alarm-craft
  resource_filter:
    target_resource_tags:
      Env: prod
resources:
  lambda:
    target_resource_type: lambda:function
    target_resource_tags:
      Owner: teamA
    alarm:
      metrics: [Errors, Throttles]
      alarm_param_overrides:
        Errors:
          Threshold: 5
  queues:
    target_resource_type: sqs:queue
    target_resource_name_pattern: "orders-"
    target_resource_tags:
      Env: staging
    alarm:
      namespace: Custom/SQS
      metrics: [ApproximateAgeOfOldestMessage]
"#;

fn parse(yaml: &str) -> Config {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn test_parse_minimal_config() {
    let config = parse(
        r#"
resources:
  fns:
    target_resource_type: lambda:function
    alarm:
      metrics: [Errors]
"#,
    );
    assert_eq!(config.globals.alarm.alarm_name_prefix, "alarm-craft-autogen");
    assert_eq!(config.globals.api_call_interval_ms, 334);
    assert_eq!(config.globals.max_concurrency, 4);
    assert_eq!(config.globals.max_retries, 5);
    config.validate().unwrap();
}

#[test]
fn test_selectors_keep_file_order() {
    let config = parse(SAMPLE);
    let ids: Vec<_> = config
        .selectors()
        .unwrap()
        .into_iter()
        .map(|s| s.id.into_inner())
        .collect();
    assert_eq!(ids, vec!["lambda", "queues"]);
}

#[test]
fn test_params_are_layered() {
    let config = parse(SAMPLE);
    let selectors = config.selectors().unwrap();
    let lambda = &selectors[0];

    let errors = &lambda.template.metrics[0];
    assert_eq!(errors.metric_name, "Errors");
    assert_eq!(errors.params.threshold, 5.0);
    assert_eq!(errors.params.period, 300);
    assert_eq!(errors.params.statistic, Statistic::Sum);

    let throttles = &lambda.template.metrics[1];
    assert_eq!(throttles.params.threshold, 1.0);
    assert_eq!(throttles.params.period, 300);
}

#[test]
fn test_resource_filter_is_merged() {
    let config = parse(SAMPLE);
    let selectors = config.selectors().unwrap();

    let lambda = &selectors[0];
    assert_eq!(lambda.tags.get("Env").map(String::as_str), Some("prod"));
    assert_eq!(lambda.tags.get("Owner").map(String::as_str), Some("teamA"));

    let queues = &selectors[1];
    assert_eq!(queues.tags.get("Env").map(String::as_str), Some("staging"));
    assert_eq!(queues.template.namespace.as_deref(), Some("Custom/SQS"));
    assert!(queues.matches_name("orders-dlq"));
}

#[test]
fn test_global_name_pattern_applies_when_entry_has_none() {
    let config = parse(
        r#"
globals:
  resource_filter:
    target_resource_name_pattern: "prod-"
resources:
  fns:
    target_resource_type: lambda:function
    alarm:
      metrics: [Errors]
"#,
    );
    let selectors = config.selectors().unwrap();
    assert!(selectors[0].matches_name("prod-api"));
    assert!(!selectors[0].matches_name("dev-api"));
}

#[test]
fn test_validate_rejects_empty_metrics() {
    let config = parse(
        r#"
resources:
  fns:
    target_resource_type: lambda:function
    alarm:
      metrics: []
"#,
    );
    let err = config.validate().unwrap_err();
    assert!(matches!(err, CoreError::InvalidTemplate { .. }));
}

#[test]
fn test_validate_rejects_duplicate_metric() {
    let config = parse(
        r#"
resources:
  fns:
    target_resource_type: lambda:function
    alarm:
      metrics: [Errors, Errors]
"#,
    );
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_override_for_unlisted_metric() {
    let config = parse(
        r#"
resources:
  fns:
    target_resource_type: lambda:function
    alarm:
      metrics: [Errors]
      alarm_param_overrides:
        Throttles: {Threshold: 3}
"#,
    );
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Throttles"));
}

#[test]
fn test_validate_rejects_non_positive_period() {
    let config = parse(
        r#"
globals:
  alarm:
    default_alarm_params:
      Period: 0
resources:
  fns:
    target_resource_type: lambda:function
    alarm:
      metrics: [Errors]
"#,
    );
    let err = config.validate().unwrap_err();
    assert!(matches!(err, CoreError::InvalidTemplate { .. }));
    assert!(err.to_string().contains("Period"));
}

#[test]
fn test_validate_rejects_bad_prefix() {
    let config = parse(
        r#"
globals:
  alarm:
    alarm_name_prefix: "acme-"
"#,
    );
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_non_arn_topic() {
    let config = parse(
        r#"
globals:
  alarm:
    notification_topic_arns: [oncall]
resources:
  fns:
    target_resource_type: lambda:function
    alarm:
      metrics: [Errors]
"#,
    );
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("oncall"));
}

#[test]
fn test_validate_rejects_bad_pattern() {
    let config = parse(
        r#"
resources:
  fns:
    target_resource_type: lambda:function
    target_resource_name_pattern: "[unclosed"
    alarm:
      metrics: [Errors]
"#,
    );
    let err = config.validate().unwrap_err();
    assert!(matches!(err, CoreError::InvalidPattern { .. }));
}

#[test]
fn test_unknown_resource_type_fails_to_parse() {
    let result = serde_yaml::from_str::<Config>(
        r#"
resources:
  fns:
    target_resource_type: ec2:instance
    alarm:
      metrics: [CPUUtilization]
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_unknown_top_level_key_fails_to_parse() {
    assert!(serde_yaml::from_str::<Config>("resorces: {}\n").is_err());
}

#[test]
fn test_load_yaml_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("alarm-config.yaml");
    std::fs::write(&path, SAMPLE).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.resources.len(), 2);
    assert_eq!(config.globals.alarm.alarm_tags.len(), 1);
}

#[test]
fn test_load_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("alarm-config.json");
    std::fs::write(
        &path,
        r#"{"resources": {"topics": {"target_resource_type": "sns:topic",
            "alarm": {"metrics": ["NumberOfNotificationsFailed"]}}}}"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(
        config.resources[0].target_resource_type,
        ResourceType::Topic
    );
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let err = Config::load(&dir.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_reports_parse_error_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "resources: [not, a, map]\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
    assert!(err.to_string().contains("broken.yaml"));
}

#[test]
fn test_discover_prefers_yaml() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("alarm-config.json"), "{}").unwrap();
    std::fs::write(dir.path().join("alarm-config.yaml"), "{}").unwrap();

    let found = Config::discover(dir.path()).unwrap();
    assert!(found.ends_with("alarm-config.yaml"));
}

#[test]
fn test_discover_nothing() {
    let dir = tempdir().unwrap();
    let err = Config::discover(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotDiscovered));
}

#[test]
#[serial]
fn test_load_or_discover_in_current_dir() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("alarm-config.yml"), SAMPLE).unwrap();

    let original = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let result = Config::load_or_discover(None, Path::new("."));
    std::env::set_current_dir(original).unwrap();

    let (path, config) = result.unwrap();
    assert!(path.ends_with("alarm-config.yml"));
    assert_eq!(config.naming().unwrap().prefix(), "acme");
}
