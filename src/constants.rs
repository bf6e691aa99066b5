// Constants module - centralized default values for configuration
//
// Every default the worker falls back to when a configuration key is omitted.

// =============================================================================
// Queue defaults
// =============================================================================

/// Default number of messages requested per receive call
pub const DEFAULT_MAX_MESSAGES: i32 = 1;

/// Upper bound SQS accepts for MaxNumberOfMessages
pub const MAX_MESSAGES_LIMIT: i32 = 10;

/// Default long-poll wait in seconds
pub const DEFAULT_WAIT_TIME_SECONDS: i32 = 20;

/// Upper bound SQS accepts for WaitTimeSeconds
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;

/// Default pause after a failed receive call, in milliseconds
pub const DEFAULT_RECEIVE_ERROR_BACKOFF_MS: u64 = 1000;

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default font asset location, relative to the working directory
pub const DEFAULT_FONT_PATH: &str = "./Roboto/Roboto-Regular.ttf";

/// Default font size in pixels per em
pub const DEFAULT_FONT_SIZE: f32 = 36.0;

/// Default watermark color
pub const DEFAULT_WATERMARK_COLOR: &str = "#000000";

/// Default watermark alpha (50%)
pub const DEFAULT_WATERMARK_ALPHA: u8 = 128;

// =============================================================================
// Process defaults
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Default log level when neither config nor RUST_LOG set one
pub const DEFAULT_LOG_LEVEL: &str = "info";
