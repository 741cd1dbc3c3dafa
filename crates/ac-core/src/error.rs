//! Error types for ac-core

use thiserror::Error;

/// Core error type for alarm-craft
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: No configuration file given and none of the default names exist
    #[error("[C002] Config file not found. Create `alarm-config.yaml` or pass `-c <your-config.yaml>`")]
    ConfigNotDiscovered,

    /// C003: Failed to parse configuration file
    #[error("[C003] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// C004: Invalid configuration value
    #[error("[C004] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C005: Alarm template is structurally invalid
    #[error("[C005] Invalid alarm template in selector '{selector}' for metric '{metric}': {reason}")]
    InvalidTemplate {
        selector: String,
        metric: String,
        reason: String,
    },

    /// C006: Resource name pattern does not compile
    #[error("[C006] Invalid name pattern '{pattern}' in selector '{selector}': {reason}")]
    InvalidPattern {
        selector: String,
        pattern: String,
        reason: String,
    },

    /// C007: Unsupported resource type
    #[error("[C007] Unknown resource type '{value}'. Supported types: {supported}")]
    UnknownResourceType { value: String, supported: String },

    /// C008: Two desired alarms share a name but differ in definition
    #[error("[C008] Alarm name conflict: '{name}' is generated by selectors '{first}' and '{second}' with different definitions")]
    AlarmNameConflict {
        name: String,
        first: String,
        second: String,
    },

    /// C009: IO error with file path context
    #[error("[C009] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
