//! Crate-wide names and defaults.

/// Application name used for data directories and log targets.
pub const APP_NAME: &str = "patchline";

/// File name of the configuration document inside a version directory.
pub const CONFIGURATION_FILENAME: &str = "updates.json";

/// File name of a project definition.
pub const PROJECT_FILENAME: &str = "project.json";

/// Locale every record's changelog must carry, and the fallback for lookups.
pub const DEFAULT_LOCALE: &str = "en";

/// Environment variable overriding the projects root.
pub const ROOT_ENV: &str = "PATCHLINE_ROOT";

/// Timeout for remote catalog reads, in seconds.
pub const REMOTE_TIMEOUT_SECS: u64 = 10;
