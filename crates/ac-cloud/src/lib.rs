//! ac-cloud - Cloud client layer for alarm-craft
//!
//! This crate provides the `ResourceCatalog` and `AlarmStore` traits the
//! engine talks to, pagination and retry helpers, and implementations for
//! AWS and (behind the `test-support` feature) an in-memory backend.

pub mod aws;
pub mod error;
#[cfg(feature = "test-support")]
pub mod memory;
pub mod paginate;
pub mod retry;
pub mod traits;

pub use aws::{AwsBackend, AwsSettings};
pub use error::{CloudError, CloudResult};
#[cfg(feature = "test-support")]
pub use memory::{Fault, FaultTarget, MemoryBackend};
pub use paginate::{collect_all, paginate};
pub use retry::RetryPolicy;
pub use traits::{
    AlarmStore, CloudClient, Page, PutOptions, ResourceCatalog, RestApiSummary, TaggedResource,
    MAX_DELETE_BATCH,
};
