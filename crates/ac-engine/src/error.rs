//! Error types for ac-engine

use ac_cloud::CloudError;
use ac_core::{CoreError, ResourceType};
use thiserror::Error;

/// Reconciliation engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Listing resources for one selector failed after retries (E001)
    #[error("[E001] Discovery failed for selector '{selector}': {source}")]
    Discovery {
        selector: String,
        #[source]
        source: CloudError,
    },

    /// No provider registered for a resource type (E002)
    #[error("[E002] No provider registered for resource type '{0}'")]
    NoProvider(ResourceType),

    /// Listing owned alarms failed after retries (E003)
    #[error("[E003] Failed to list existing alarms: {0}")]
    Inventory(#[source] CloudError),

    /// Configuration or conflict error from the core
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl EngineError {
    /// Errors detected before any mutation that make the config unusable.
    pub fn is_fatal_config(&self) -> bool {
        matches!(self, EngineError::Core(_) | EngineError::NoProvider(_))
    }
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
