use super::*;
use std::sync::atomic::{AtomicU32, Ordering};

fn fast(max_retries: u32) -> RetryPolicy {
    RetryPolicy::with_delays(max_retries, Duration::from_millis(1), Duration::from_millis(5))
}

fn throttled() -> CloudError {
    CloudError::Throttled {
        service: "cloudwatch".to_string(),
        message: "Rate exceeded".to_string(),
    }
}

#[tokio::test]
async fn test_succeeds_after_transient_failures() {
    let calls = AtomicU32::new(0);
    let result = fast(3)
        .run("PutMetricAlarm", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(throttled())
            } else {
                Ok("done")
            }
        })
        .await;
    assert_eq!(result, Ok("done"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_budget_exhaustion_wraps_last_error() {
    let calls = AtomicU32::new(0);
    let result: CloudResult<()> = fast(2)
        .run("PutMetricAlarm", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(throttled())
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let err = result.unwrap_err();
    assert!(err.is_throttling());
    match err {
        CloudError::RetriesExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(*last, throttled());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_retryable_error_is_returned_immediately() {
    let calls = AtomicU32::new(0);
    let result: CloudResult<()> = fast(5)
        .run("DeleteAlarms", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CloudError::Rejected {
                service: "cloudwatch".to_string(),
                code: "ValidationError".to_string(),
                message: "bad".to_string(),
            })
        })
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(CloudError::Rejected { .. })));
}

#[tokio::test]
async fn test_no_retry_policy() {
    let calls = AtomicU32::new(0);
    let result: CloudResult<()> = RetryPolicy::none()
        .run("GetResources", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(throttled())
        })
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        result,
        Err(CloudError::RetriesExhausted { attempts: 1, .. })
    ));
}

#[test]
fn test_delay_stays_within_bounds() {
    let policy = RetryPolicy::new(10);
    for retry in 0..10 {
        let delay = policy.delay(retry);
        assert!(delay >= DEFAULT_MIN_DELAY);
        assert!(delay <= DEFAULT_MAX_DELAY);
    }
}
