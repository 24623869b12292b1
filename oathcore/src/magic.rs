/// Name of the environment variable containing the path to the oath configuration file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/oath/config.toml` or `$HOME/.config/oath/config.toml`
///  (2) on Windows: `%APPDATA%\oath\config.toml`
pub const ENV_CONFIG_PATH: &str = "OATH_CONFIG_PATH";

/// Directory name used under the platform configuration directory.
pub const CONFIG_DIR_NAME: &str = "oath";

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// `log` target used by [`LogSink`](crate::ext::trace::LogSink).
pub const TRACE_LOG_TARGET: &str = "oath::trace";

/// `log` target used for ownership diagnostics (violations, outstanding borrows).
pub const LOG_TARGET: &str = "oath";
