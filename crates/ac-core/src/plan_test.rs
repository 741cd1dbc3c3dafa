use super::*;
use crate::alarm::{AlarmDefinition, AlarmParams};
use crate::names::SelectorId;
use crate::resource::ResourceType;

fn naming() -> AlarmNaming {
    AlarmNaming::new("acme").unwrap()
}

fn spec(resource: &str, metric: &str, threshold: f64) -> DesiredAlarmSpec {
    spec_from("lambda", resource, metric, threshold)
}

fn spec_from(selector: &str, resource: &str, metric: &str, threshold: f64) -> DesiredAlarmSpec {
    let params = AlarmParams::builtin_defaults()
        .overlay(&AlarmParams {
            threshold: Some(threshold),
            ..Default::default()
        })
        .resolve()
        .unwrap();
    DesiredAlarmSpec {
        name: naming().alarm_name(resource, metric).unwrap(),
        selector: SelectorId::new(selector),
        resource_type: ResourceType::Function,
        resource_name: resource.to_string(),
        definition: AlarmDefinition::from_params(
            "AWS/Lambda",
            metric,
            [("FunctionName".to_string(), resource.to_string())].into(),
            &params,
        ),
    }
}

fn existing_from(spec: &DesiredAlarmSpec) -> ExistingAlarm {
    ExistingAlarm {
        name: spec.name.clone(),
        definition: Some(spec.definition.clone()),
        updated_at: None,
    }
}

fn first_run_desired() -> Vec<DesiredAlarmSpec> {
    vec![
        spec("f1", "Errors", 1.0),
        spec("f1", "Throttles", 1.0),
        spec("f2", "Errors", 1.0),
        spec("f2", "Throttles", 1.0),
    ]
}

fn names<'a>(specs: impl IntoIterator<Item = &'a DesiredAlarmSpec>) -> Vec<String> {
    specs.into_iter().map(|s| s.name.to_string()).collect()
}

#[test]
fn test_everything_new_is_created() {
    let plan = Reconciler::new(naming())
        .plan(first_run_desired(), Vec::new())
        .unwrap();
    assert_eq!(plan.to_create.len(), 4);
    assert!(plan.to_update.is_empty());
    assert!(plan.to_delete.is_empty());
}

#[test]
fn test_second_run_is_empty() {
    let existing: Vec<_> = first_run_desired().iter().map(existing_from).collect();
    let plan = Reconciler::new(naming())
        .plan(first_run_desired(), existing)
        .unwrap();
    assert!(plan.is_empty());
    assert_eq!(plan.unchanged.len(), 4);
}

#[test]
fn test_removed_resource_alarms_are_deleted() {
    let existing: Vec<_> = first_run_desired().iter().map(existing_from).collect();
    let desired = vec![spec("f1", "Errors", 1.0), spec("f1", "Throttles", 1.0)];

    let plan = Reconciler::new(naming()).plan(desired, existing).unwrap();

    assert!(plan.to_create.is_empty());
    assert!(plan.to_update.is_empty());
    let deleted: Vec<_> = plan.to_delete.iter().map(|n| n.to_string()).collect();
    assert_eq!(deleted, vec!["acme-f2-Errors", "acme-f2-Throttles"]);
}

#[test]
fn test_threshold_change_updates_only_that_metric() {
    let existing: Vec<_> = first_run_desired().iter().map(existing_from).collect();
    let desired = vec![
        spec("f1", "Errors", 5.0),
        spec("f1", "Throttles", 1.0),
        spec("f2", "Errors", 5.0),
        spec("f2", "Throttles", 1.0),
    ];

    let plan = Reconciler::new(naming()).plan(desired, existing).unwrap();

    assert!(plan.to_create.is_empty());
    assert!(plan.to_delete.is_empty());
    assert_eq!(
        names(plan.to_update.iter().map(|u| &u.spec)),
        vec!["acme-f1-Errors", "acme-f2-Errors"]
    );
    assert!(plan
        .to_update
        .iter()
        .all(|u| u.changed_fields == vec!["threshold"]));
}

#[test]
fn test_unowned_alarms_are_never_deleted() {
    let mut manual = existing_from(&spec("f9", "Errors", 1.0));
    manual.name = AlarmName::new("team-f9-Errors");
    let mut lookalike = manual.clone();
    lookalike.name = AlarmName::new("acmef9-Errors");

    let plan = Reconciler::new(naming())
        .plan(Vec::new(), vec![manual, lookalike])
        .unwrap();
    assert!(plan.to_delete.is_empty());
}

#[test]
fn test_unreadable_existing_alarm_is_updated() {
    let desired = spec("f1", "Errors", 1.0);
    let existing = ExistingAlarm {
        name: desired.name.clone(),
        definition: None,
        updated_at: None,
    };
    let plan = Reconciler::new(naming())
        .plan(vec![desired], vec![existing])
        .unwrap();
    assert_eq!(plan.to_update.len(), 1);
    assert_eq!(plan.to_update[0].changed_fields, vec!["definition"]);
}

#[test]
fn test_update_all_forces_puts() {
    let existing: Vec<_> = first_run_desired().iter().map(existing_from).collect();
    let plan = Reconciler::new(naming())
        .update_all(true)
        .plan(first_run_desired(), existing)
        .unwrap();
    assert_eq!(plan.to_update.len(), 4);
    assert!(plan.to_update.iter().all(AlarmUpdate::is_forced));
    assert!(plan.unchanged.is_empty());
}

#[test]
fn test_conflicting_definitions_fail() {
    let a = spec_from("lambda", "f1", "Errors", 1.0);
    let b = spec_from("critical", "f1", "Errors", 10.0);

    let err = Reconciler::new(naming())
        .plan(vec![a, b], Vec::new())
        .unwrap_err();
    assert!(matches!(err, CoreError::AlarmNameConflict { .. }));
    let message = err.to_string();
    assert!(message.contains("acme-f1-Errors"));
    assert!(message.contains("lambda"));
    assert!(message.contains("critical"));
}

#[test]
fn test_identical_duplicates_collapse() {
    let a = spec_from("lambda", "f1", "Errors", 1.0);
    let b = spec_from("everything", "f1", "Errors", 1.0);
    let plan = Reconciler::new(naming())
        .plan(vec![a, b], Vec::new())
        .unwrap();
    assert_eq!(plan.to_create.len(), 1);
}

#[test]
fn test_plan_is_sorted_regardless_of_input_order() {
    let mut desired = first_run_desired();
    desired.reverse();
    let plan = Reconciler::new(naming()).plan(desired, Vec::new()).unwrap();
    assert_eq!(
        names(&plan.to_create),
        vec![
            "acme-f1-Errors",
            "acme-f1-Throttles",
            "acme-f2-Errors",
            "acme-f2-Throttles"
        ]
    );
}

#[test]
fn test_protected_namespace_withholds_deletes() {
    let mut queue_alarm = existing_from(&spec("q1", "Errors", 1.0));
    if let Some(def) = queue_alarm.definition.as_mut() {
        def.namespace = "AWS/SQS".to_string();
    }
    let lambda_alarm = existing_from(&spec("f2", "Errors", 1.0));
    let unreadable = ExistingAlarm {
        name: AlarmName::new("acme-x-Errors"),
        definition: None,
        updated_at: None,
    };

    let plan = Reconciler::new(naming())
        .protect_namespaces(["AWS/SQS"])
        .plan(Vec::new(), vec![queue_alarm, lambda_alarm, unreadable])
        .unwrap();

    let deleted: Vec<_> = plan.to_delete.iter().map(|n| n.to_string()).collect();
    let withheld: Vec<_> = plan.withheld.iter().map(|n| n.to_string()).collect();
    assert_eq!(deleted, vec!["acme-f2-Errors"]);
    assert_eq!(withheld, vec!["acme-q1-Errors", "acme-x-Errors"]);
}

#[test]
fn test_plan_sets_are_disjoint() {
    let mut existing: Vec<_> = first_run_desired().iter().map(existing_from).collect();
    existing.push(existing_from(&spec("f3", "Errors", 1.0)));
    let desired = vec![
        spec("f1", "Errors", 2.0),
        spec("f1", "Throttles", 1.0),
        spec("f4", "Errors", 1.0),
    ];
    let desired_names: BTreeSet<String> = names(&desired).into_iter().collect();
    let existing_names: BTreeSet<String> =
        existing.iter().map(|e| e.name.to_string()).collect();

    let plan = Reconciler::new(naming()).plan(desired, existing).unwrap();

    let create: BTreeSet<String> = names(&plan.to_create).into_iter().collect();
    let update: BTreeSet<String> = names(plan.to_update.iter().map(|u| &u.spec))
        .into_iter()
        .collect();
    let delete: BTreeSet<String> = plan.to_delete.iter().map(|n| n.to_string()).collect();

    assert!(create.is_disjoint(&update));
    assert!(create.is_disjoint(&delete));
    assert!(update.is_disjoint(&delete));
    assert!(delete.is_subset(&existing_names));
    assert!(create.union(&update).all(|n| desired_names.contains(n)));
    assert_eq!(plan.mutation_count(), 5);
}
