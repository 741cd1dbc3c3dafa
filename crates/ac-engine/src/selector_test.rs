use super::*;
use ac_cloud::{Fault, FaultTarget, MemoryBackend};
use ac_core::{AlarmParams, AlarmTemplate, MetricTemplate, Tags};

const F: &str = "lambda:function";

fn template() -> AlarmTemplate {
    AlarmTemplate {
        namespace: None,
        metrics: vec![MetricTemplate {
            metric_name: "Errors".to_string(),
            params: AlarmParams::builtin_defaults().resolve().unwrap(),
        }],
    }
}

fn selector(id: &str, rt: ResourceType, pattern: Option<&str>, tags: &[(&str, &str)]) -> Selector {
    let tags: Tags = tags
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Selector::new(SelectorId::new(id), rt, pattern, tags, template()).unwrap()
}

fn function_arn(name: &str) -> String {
    format!("arn:aws:lambda:us-east-1:123456789012:function:{}", name)
}

fn resource_selector(backend: Arc<MemoryBackend>) -> ResourceSelector {
    ResourceSelector::new(
        backend,
        Arc::new(ProviderRegistry::with_defaults()),
        RetryPolicy::with_delays(1, Duration::from_millis(1), Duration::from_millis(2)),
    )
    .max_concurrency(2)
}

#[tokio::test]
async fn test_tag_and_semantics() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_resource(F, &function_arn("both"), [("Owner", "teamA"), ("Env", "prod")]);
    backend.add_resource(F, &function_arn("owner-only"), [("Owner", "teamA")]);
    backend.add_resource(F, &function_arn("env-only"), [("Env", "prod")]);

    let s = selector(
        "fns",
        ResourceType::Function,
        None,
        &[("Owner", "teamA"), ("Env", "prod")],
    );
    let matched = resource_selector(backend).match_selector(&s).await.unwrap();

    let names: Vec<_> = matched.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["both"]);
}

#[tokio::test]
async fn test_name_pattern_applied_after_listing() {
    let backend = Arc::new(MemoryBackend::new());
    for name in ["prod-orders", "prod-billing", "dev-orders"] {
        backend.add_resource(F, &function_arn(name), Vec::<(String, String)>::new());
    }
    let s = selector("fns", ResourceType::Function, Some("prod-"), &[]);
    let matched = resource_selector(backend).match_selector(&s).await.unwrap();

    let names: Vec<_> = matched.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["prod-billing", "prod-orders"]);
}

#[tokio::test]
async fn test_zero_resources_is_not_an_error() {
    let backend = Arc::new(MemoryBackend::new());
    let s = selector("topics", ResourceType::Topic, None, &[]);
    let matched = resource_selector(backend).match_selector(&s).await.unwrap();
    assert!(matched.is_empty());
}

#[tokio::test]
async fn test_duplicate_listings_are_deduplicated() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_resource(F, &function_arn("f1"), [("Owner", "teamA")]);
    backend.add_resource(F, &function_arn("f1"), [("Owner", "teamA")]);

    let s = selector("fns", ResourceType::Function, None, &[("Owner", "teamA")]);
    let matched = resource_selector(backend).match_selector(&s).await.unwrap();
    assert_eq!(matched.len(), 1);
}

#[tokio::test]
async fn test_failure_is_scoped_to_one_selector() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_resource(F, &function_arn("f1"), Vec::<(String, String)>::new());
    backend.add_resource(
        "sqs:queue",
        "arn:aws:sqs:us-east-1:123456789012:jobs",
        Vec::<(String, String)>::new(),
    );
    backend.inject(Fault::new(
        FaultTarget::ListResources("sqs:queue".to_string()),
        ac_cloud::memory::throttling_error(),
    ));

    let selectors = vec![
        selector("fns", ResourceType::Function, None, &[]),
        selector("queues", ResourceType::Queue, None, &[]),
    ];
    let matches = resource_selector(backend).match_all(&selectors).await;

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].selector, "fns");
    assert_eq!(matches[0].result.as_ref().unwrap().len(), 1);
    assert_eq!(matches[1].selector, "queues");
    match &matches[1].result {
        Err(EngineError::Discovery { selector, source }) => {
            assert_eq!(selector, "queues");
            assert!(source.is_throttling());
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_provider_is_reported() {
    let backend = Arc::new(MemoryBackend::new());
    let selector_without_provider = ResourceSelector::new(
        backend,
        Arc::new(ProviderRegistry::empty()),
        RetryPolicy::none(),
    );
    let s = selector("fns", ResourceType::Function, None, &[]);
    let err = selector_without_provider
        .match_selector(&s)
        .await
        .unwrap_err();
    assert!(err.is_fatal_config());
}
