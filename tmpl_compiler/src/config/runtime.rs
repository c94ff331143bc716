// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalPreferences {
    /// Whether to log a token summary after each tokenization
    pub log_token_summary: bool,

    /// Whether to log lexer cache hits and misses
    pub log_cache_activity: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            log_token_summary: env::var(env_vars::LEXICAL_LOG_TOKEN_SUMMARY)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_cache_activity: env::var(env_vars::LEXICAL_LOG_CACHE_ACTIVITY)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserPreferences {
    /// Whether to log every statement keyword the parser dispatches on
    pub log_statement_dispatch: bool,
}

impl Default for ParserPreferences {
    fn default() -> Self {
        Self {
            log_statement_dispatch: env::var(env_vars::PARSER_LOG_STATEMENT_DISPATCH)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level forwarded to the logger
    pub min_log_level: LogLevel,

    /// Whether to include file context in log messages
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_file_context: env::var(env_vars::LOGGING_INCLUDE_FILE_CONTEXT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "trace" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub lexical: LexicalPreferences,
    pub parser: ParserPreferences,
    pub logging: LoggingPreferences,
}

static PREFERENCES: OnceLock<RuntimeConfig> = OnceLock::new();

/// Process-wide preferences, read from the environment on first use
pub fn preferences() -> &'static RuntimeConfig {
    PREFERENCES.get_or_init(RuntimeConfig::default)
}

/// Environment variable names for configuration
pub mod env_vars {
    // Lexical
    pub const LEXICAL_LOG_TOKEN_SUMMARY: &str = "TMPL_LEXICAL_LOG_TOKEN_SUMMARY";
    pub const LEXICAL_LOG_CACHE_ACTIVITY: &str = "TMPL_LEXICAL_LOG_CACHE_ACTIVITY";

    // Parser
    pub const PARSER_LOG_STATEMENT_DISPATCH: &str = "TMPL_PARSER_LOG_STATEMENT_DISPATCH";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "TMPL_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "TMPL_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "TMPL_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "TMPL_LOGGING_INCLUDE_FILE_CONTEXT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("0"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("warning"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("trace"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("invalid"), None);
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warning);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(
            LogLevel::Warning.to_events_log_level(),
            crate::logging::LogLevel::Warning
        );
    }

    #[test]
    fn test_env_var_names_use_prefix() {
        for name in [
            env_vars::LEXICAL_LOG_TOKEN_SUMMARY,
            env_vars::LEXICAL_LOG_CACHE_ACTIVITY,
            env_vars::PARSER_LOG_STATEMENT_DISPATCH,
            env_vars::LOGGING_MIN_LEVEL,
        ] {
            assert!(name.starts_with("TMPL_"));
        }
    }
}
