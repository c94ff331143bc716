//! Configuration module for the template compiler
//! Compile-time limits and syntax defaults are generated from TOML by build.rs

// Include generated constants from build.rs
include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("TMPL_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("TMPL_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::compile_time;
    use super::*;

    #[test]
    fn test_syntax_defaults_are_distinct() {
        use compile_time::syntax_defaults::*;

        assert_ne!(BLOCK_START_STRING, VARIABLE_START_STRING);
        assert_ne!(BLOCK_START_STRING, COMMENT_START_STRING);
        assert_ne!(VARIABLE_START_STRING, COMMENT_START_STRING);
    }

    #[test]
    fn test_limits_are_positive() {
        assert!(compile_time::lexer::CACHE_CAPACITY > 0);
        assert!(compile_time::parser::MAX_NESTING_DEPTH > 0);
        assert!(compile_time::file_processing::MAX_FILE_SIZE > 0);
    }

    #[test]
    fn test_source_info() {
        assert!(build_info::source_info().ends_with(".toml"));
    }
}
