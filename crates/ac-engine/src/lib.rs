//! ac-engine - Reconciliation engine for alarm-craft
//!
//! This crate discovers the resources each selector matches, turns them into
//! desired alarm specs, reads the alarms alarm-craft already owns, and
//! applies the resulting plan through the cloud client layer.

pub mod cancel;
pub mod error;
pub mod executor;
pub mod generator;
pub mod inventory;
pub mod providers;
pub mod reconcile;
pub mod selector;

pub use cancel::CancellationFlag;
pub use error::{EngineError, EngineResult};
pub use executor::{ApplyExecutor, ApplyOptions, ApplyResult, OutcomeObserver};
pub use generator::{AlarmSpecGenerator, GeneratedAlarms};
pub use inventory::AlarmInventory;
pub use providers::{Dimensions, ListContext, ProviderRegistry, ResourceProvider};
pub use reconcile::{PlannedRun, Reconciliation};
pub use selector::{ResourceSelector, SelectorMatch};
