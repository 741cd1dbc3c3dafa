use super::*;

fn definition() -> AlarmDefinition {
    let params = AlarmParams::builtin_defaults().resolve().unwrap();
    AlarmDefinition::from_params(
        "AWS/Lambda",
        "Errors",
        BTreeMap::from([("FunctionName".to_string(), "f1".to_string())]),
        &params,
    )
}

#[test]
fn test_builtin_defaults_resolve() {
    let params = AlarmParams::builtin_defaults().resolve().unwrap();
    assert_eq!(params.statistic, Statistic::Sum);
    assert_eq!(params.period, 60);
    assert_eq!(params.evaluation_periods, 1);
    assert_eq!(params.threshold, 1.0);
    assert_eq!(
        params.comparison_operator,
        ComparisonOperator::GreaterThanOrEqualToThreshold
    );
    assert_eq!(params.treat_missing_data, TreatMissingData::NotBreaching);
}

#[test]
fn test_overlay_prefers_top_layer() {
    let top = AlarmParams {
        threshold: Some(5.0),
        statistic: Some(Statistic::Maximum),
        ..Default::default()
    };
    let merged = AlarmParams::builtin_defaults().overlay(&top);
    assert_eq!(merged.threshold, Some(5.0));
    assert_eq!(merged.statistic, Some(Statistic::Maximum));
    assert_eq!(merged.period, Some(60));
}

#[test]
fn test_resolve_reports_missing_field() {
    let err = AlarmParams::default().resolve().unwrap_err();
    assert!(err.contains("Statistic"));
}

#[test]
fn test_validate_period() {
    for ok in [10, 30, 60, 300, 3600] {
        let p = AlarmParams::builtin_defaults().overlay(&AlarmParams {
            period: Some(ok),
            ..Default::default()
        });
        assert!(p.resolve().is_ok(), "period {} should be accepted", ok);
    }
    for bad in [0, -60, 45, 90] {
        let p = AlarmParams::builtin_defaults().overlay(&AlarmParams {
            period: Some(bad),
            ..Default::default()
        });
        assert!(p.resolve().is_err(), "period {} should be rejected", bad);
    }
}

#[test]
fn test_validate_datapoints_within_evaluation_periods() {
    let p = AlarmParams::builtin_defaults().overlay(&AlarmParams {
        evaluation_periods: Some(3),
        datapoints_to_alarm: Some(4),
        ..Default::default()
    });
    assert!(p.resolve().is_err());

    let p = AlarmParams::builtin_defaults().overlay(&AlarmParams {
        evaluation_periods: Some(3),
        datapoints_to_alarm: Some(2),
        ..Default::default()
    });
    assert!(p.resolve().is_ok());
}

#[test]
fn test_params_deserialize_pascal_case() {
    let yaml = "Threshold: 5\nStatistic: Average\nTreatMissingData: breaching\n";
    let params: AlarmParams = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(params.threshold, Some(5.0));
    assert_eq!(params.statistic, Some(Statistic::Average));
    assert_eq!(params.treat_missing_data, Some(TreatMissingData::Breaching));
}

#[test]
fn test_params_reject_unknown_key() {
    assert!(serde_yaml::from_str::<AlarmParams>("Treshold: 5\n").is_err());
}

#[test]
fn test_api_enum_round_trip() {
    assert_eq!(Statistic::from_api("SampleCount"), Some(Statistic::SampleCount));
    assert_eq!(Statistic::from_api("p99"), None);
    assert_eq!(TreatMissingData::NotBreaching.as_str(), "notBreaching");
    assert_eq!(
        ComparisonOperator::from_api("LessThanThreshold"),
        Some(ComparisonOperator::LessThanThreshold)
    );
}

#[test]
fn test_identical_definitions_have_no_differences() {
    assert!(definition().is_equivalent(&definition()));
}

#[test]
fn test_differences_lists_changed_fields() {
    let a = definition();
    let mut b = definition();
    b.threshold = 5.0;
    b.dimensions
        .insert("FunctionName".to_string(), "f2".to_string());
    assert_eq!(a.differences(&b), vec!["dimensions", "threshold"]);
}

#[test]
fn test_datapoints_compare_by_effective_value() {
    let a = definition();
    let mut b = definition();
    b.datapoints_to_alarm = Some(b.evaluation_periods);
    assert!(a.is_equivalent(&b));
}

#[test]
fn test_empty_description_equals_none() {
    let a = definition();
    let mut b = definition();
    b.description = Some(String::new());
    assert!(a.is_equivalent(&b));

    b.description = Some("hand written".to_string());
    assert_eq!(a.differences(&b), vec!["description"]);
}
