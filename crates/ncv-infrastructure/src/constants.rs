//! Infrastructure constants

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "ncv.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "ncv";

/// Environment variable prefix; nested keys use `__`, e.g.
/// `NCV__PIPELINE__MAX_WORKERS`
pub const CONFIG_ENV_PREFIX: &str = "NCV";

/// Separator between the prefix and nested key segments
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// RULE FILE CONSTANTS
// ============================================================================

/// Extensions picked up from the rules directory
pub const RULE_FILE_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable that overrides the configured log filter
pub const LOG_FILTER_ENV: &str = "NCV_LOG";

/// File name prefix for rolling log files when the path has no stem
pub const DEFAULT_LOG_FILE_PREFIX: &str = "ncv";
