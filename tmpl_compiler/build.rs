// build.rs - TOML-driven compile-time constant generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    syntax_defaults: SyntaxDefaults,
    lexer: LexerLimits,
    parser: ParserLimits,
    runtime: RuntimeLimits,
    file_processing: FileProcessingLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct SyntaxDefaults {
    block_start_string: String,
    block_end_string: String,
    variable_start_string: String,
    variable_end_string: String,
    comment_start_string: String,
    comment_end_string: String,
    newline_sequence: String,
    trim_blocks: bool,
    lstrip_blocks: bool,
    keep_trailing_newline: bool,
}

#[derive(serde::Deserialize)]
struct LexerLimits {
    cache_capacity: usize,
    max_token_count: usize,
}

#[derive(serde::Deserialize)]
struct ParserLimits {
    max_nesting_depth: usize,
}

#[derive(serde::Deserialize)]
struct RuntimeLimits {
    max_repeat_length: usize,
}

#[derive(serde::Deserialize)]
struct FileProcessingLimits {
    max_file_size: u64,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_events_per_file: usize,
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=TMPL_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=TMPL_CONFIG_DIR");

    let profile = env::var("TMPL_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("TMPL_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the tmpl_compiler directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_constraints(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_constraints(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_FILE_SIZE: u64 = 1_000_000_000;
    const ABSOLUTE_MAX_NESTING_DEPTH: usize = 4096;

    let defaults = &config.syntax_defaults;
    let delimiters = [
        ("block_start_string", &defaults.block_start_string),
        ("block_end_string", &defaults.block_end_string),
        ("variable_start_string", &defaults.variable_start_string),
        ("variable_end_string", &defaults.variable_end_string),
        ("comment_start_string", &defaults.comment_start_string),
        ("comment_end_string", &defaults.comment_end_string),
    ];
    for (name, value) in delimiters {
        if value.is_empty() {
            panic!("SYNTAX: {} must not be empty", name);
        }
    }

    if defaults.block_start_string == defaults.variable_start_string
        || defaults.block_start_string == defaults.comment_start_string
        || defaults.variable_start_string == defaults.comment_start_string
    {
        panic!("SYNTAX: block, variable and comment start strings must be distinct");
    }

    if !matches!(defaults.newline_sequence.as_str(), "\n" | "\r\n" | "\r") {
        panic!("SYNTAX: newline_sequence must be one of \\n, \\r\\n or \\r");
    }

    if config.lexer.cache_capacity == 0 {
        panic!("LEXER: cache_capacity must be at least 1");
    }

    if config.parser.max_nesting_depth == 0
        || config.parser.max_nesting_depth > ABSOLUTE_MAX_NESTING_DEPTH
    {
        panic!(
            "PARSER: max_nesting_depth must be between 1 and {}",
            ABSOLUTE_MAX_NESTING_DEPTH
        );
    }

    if config.runtime.max_repeat_length == 0 {
        panic!("RUNTIME: max_repeat_length must be at least 1");
    }

    if config.file_processing.max_file_size > ABSOLUTE_MAX_FILE_SIZE {
        panic!("FILES: max_file_size exceeds absolute maximum");
    }

    if config.logging.max_log_events_per_file > config.logging.log_buffer_size {
        panic!("LOGGING: max_log_events_per_file exceeds log_buffer_size");
    }

    if profile == "production" && config.file_processing.max_file_size > 50_000_000 {
        panic!("PRODUCTION: max_file_size too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");
    let defaults = &config.syntax_defaults;

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod syntax_defaults {{
        pub const BLOCK_START_STRING: &str = {:?};
        pub const BLOCK_END_STRING: &str = {:?};
        pub const VARIABLE_START_STRING: &str = {:?};
        pub const VARIABLE_END_STRING: &str = {:?};
        pub const COMMENT_START_STRING: &str = {:?};
        pub const COMMENT_END_STRING: &str = {:?};
        pub const NEWLINE_SEQUENCE: &str = {:?};
        pub const TRIM_BLOCKS: bool = {};
        pub const LSTRIP_BLOCKS: bool = {};
        pub const KEEP_TRAILING_NEWLINE: bool = {};
    }}

    pub mod lexer {{
        pub const CACHE_CAPACITY: usize = {};
        pub const MAX_TOKEN_COUNT: usize = {};
    }}

    pub mod parser {{
        pub const MAX_NESTING_DEPTH: usize = {};
    }}

    pub mod runtime {{
        pub const MAX_REPEAT_LENGTH: usize = {};
    }}

    pub mod file_processing {{
        pub const MAX_FILE_SIZE: u64 = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_EVENTS_PER_FILE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        defaults.block_start_string,
        defaults.block_end_string,
        defaults.variable_start_string,
        defaults.variable_end_string,
        defaults.comment_start_string,
        defaults.comment_end_string,
        defaults.newline_sequence,
        defaults.trim_blocks,
        defaults.lstrip_blocks,
        defaults.keep_trailing_newline,
        config.lexer.cache_capacity,
        config.lexer.max_token_count,
        config.parser.max_nesting_depth,
        config.runtime.max_repeat_length,
        config.file_processing.max_file_size,
        config.logging.log_buffer_size,
        config.logging.max_log_events_per_file,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
