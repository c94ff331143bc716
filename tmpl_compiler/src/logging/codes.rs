//! Consolidated error codes and classification system
//!
//! Single source of truth for every code the compiler emits together with
//! its behavioral metadata.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for error, warning and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_ERROR: Code = Code::new("ERR003");
}

/// Template file error codes
pub mod file_processing {
    use super::Code;

    pub const TEMPLATE_NOT_FOUND: Code = Code::new("E005");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
}

/// Lexical analysis error codes
pub mod lexical {
    use super::Code;

    pub const INVALID_CHARACTER: Code = Code::new("E020");
    pub const INVALID_IDENTIFIER: Code = Code::new("E021");
    pub const INVALID_NUMBER: Code = Code::new("E022");
    pub const UNBALANCED_BRACKET: Code = Code::new("E023");
    pub const UNTERMINATED_COMMENT: Code = Code::new("E024");
    pub const UNTERMINATED_RAW: Code = Code::new("E025");
    pub const TOO_MANY_TOKENS: Code = Code::new("E027");
    pub const INTERNAL_LEXER_ERROR: Code = Code::new("E029");
}

/// Syntax analysis error codes
pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_END: Code = Code::new("E040");
    pub const UNKNOWN_TAG: Code = Code::new("E042");
    pub const GRAMMAR_VIOLATION: Code = Code::new("E043");
    pub const INVALID_ASSIGNMENT: Code = Code::new("E044");
    pub const UNEXPECTED_TOKEN: Code = Code::new("E050");
    pub const INTERNAL_PARSER_ERROR: Code = Code::new("E086");
    pub const MAX_NESTING_DEPTH: Code = Code::new("E087");
}

/// Operator and undefined-value runtime codes
pub mod runtime {
    use super::Code;

    pub const UNDEFINED_VALUE: Code = Code::new("E100");
    pub const UNSUPPORTED_OPERANDS: Code = Code::new("E101");
    pub const DIVISION_BY_ZERO: Code = Code::new("E102");
    pub const NOT_IMPLEMENTED: Code = Code::new("E103");
    pub const INTEGER_OVERFLOW: Code = Code::new("E104");
    pub const CAPABILITY_ERROR: Code = Code::new("E105");

    pub const UNDEFINED_COERCION: Code = Code::new("W100");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const LEXER_TABLE_BUILT: Code = Code::new("I021");
    pub const AST_CONSTRUCTION_COMPLETE: Code = Code::new("I040");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            // System
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal error",
                "File a bug report with the template that triggered it",
            ),
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "Logging or runtime initialization failed",
                "Check that initialization runs once per process",
            ),
            ErrorMetadata::new(
                "ERR003",
                "System",
                Severity::High,
                false,
                true,
                "Invalid syntax configuration",
                "Use distinct start delimiters and a supported newline sequence",
            ),
            // Template files
            ErrorMetadata::new(
                "E005",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "Template file not found",
                "Verify the template path",
            ),
            ErrorMetadata::new(
                "E007",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "Template file exceeds the configured size limit",
                "Split the template or raise max_file_size",
            ),
            ErrorMetadata::new(
                "E009",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "Permission denied reading template",
                "Check file permissions",
            ),
            ErrorMetadata::new(
                "E010",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "Template is not valid UTF-8",
                "Re-encode the template as UTF-8",
            ),
            ErrorMetadata::new(
                "E011",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "I/O error reading template",
                "Check the file system",
            ),
            // Lexical
            ErrorMetadata::new(
                "E020",
                "Lexical",
                Severity::High,
                false,
                true,
                "Character not valid at this position",
                "Remove or quote the offending character",
            ),
            ErrorMetadata::new(
                "E021",
                "Lexical",
                Severity::High,
                false,
                true,
                "Name is not a valid identifier",
                "Use letters, digits and underscores only",
            ),
            ErrorMetadata::new(
                "E022",
                "Lexical",
                Severity::High,
                false,
                true,
                "Numeric literal out of range",
                "Use a smaller literal",
            ),
            ErrorMetadata::new(
                "E023",
                "Lexical",
                Severity::High,
                false,
                true,
                "Unbalanced or mismatched bracket",
                "Close every (, [ and { in the same tag",
            ),
            ErrorMetadata::new(
                "E024",
                "Lexical",
                Severity::High,
                false,
                true,
                "Comment is never closed",
                "Add the comment end delimiter",
            ),
            ErrorMetadata::new(
                "E025",
                "Lexical",
                Severity::High,
                false,
                true,
                "Raw block is never closed",
                "Add an endraw tag",
            ),
            ErrorMetadata::new(
                "E027",
                "Lexical",
                Severity::Critical,
                false,
                true,
                "Token count limit exceeded",
                "Split the template",
            ),
            ErrorMetadata::new(
                "E029",
                "Lexical",
                Severity::Critical,
                false,
                true,
                "Lexer rule table is inconsistent",
                "File a bug report with the syntax configuration in use",
            ),
            // Syntax
            ErrorMetadata::new(
                "E040",
                "Syntax",
                Severity::High,
                false,
                true,
                "Template ended inside an open block",
                "Close every block tag before the end of the template",
            ),
            ErrorMetadata::new(
                "E042",
                "Syntax",
                Severity::High,
                false,
                true,
                "Unknown block tag",
                "Check the tag spelling or register an extension for it",
            ),
            ErrorMetadata::new(
                "E043",
                "Syntax",
                Severity::High,
                false,
                true,
                "Template grammar violation",
                "Check the statement syntax",
            ),
            ErrorMetadata::new(
                "E044",
                "Syntax",
                Severity::High,
                false,
                true,
                "Invalid assignment target",
                "Assign to names, tuples of names or namespace attributes",
            ),
            ErrorMetadata::new(
                "E050",
                "Syntax",
                Severity::High,
                false,
                true,
                "Unexpected token",
                "Check the expression syntax near the reported line",
            ),
            ErrorMetadata::new(
                "E086",
                "Syntax",
                Severity::Critical,
                false,
                true,
                "Internal parser error",
                "File a bug report with the template that triggered it",
            ),
            ErrorMetadata::new(
                "E087",
                "Syntax",
                Severity::High,
                false,
                true,
                "Maximum nesting depth exceeded",
                "Flatten deeply nested blocks or expressions",
            ),
            // Runtime
            ErrorMetadata::new(
                "E100",
                "Runtime",
                Severity::Medium,
                true,
                false,
                "Operation on an undefined value",
                "Define the variable or guard it with a test",
            ),
            ErrorMetadata::new(
                "E101",
                "Runtime",
                Severity::Medium,
                true,
                false,
                "Operator not supported for these operand kinds",
                "Convert operands to compatible types",
            ),
            ErrorMetadata::new(
                "E102",
                "Runtime",
                Severity::Medium,
                true,
                false,
                "Division by zero",
                "Guard the divisor",
            ),
            ErrorMetadata::new(
                "E103",
                "Runtime",
                Severity::Medium,
                true,
                false,
                "Operation not implemented for these operands",
                "Avoid the operation on complex operands",
            ),
            ErrorMetadata::new(
                "E104",
                "Runtime",
                Severity::Medium,
                true,
                false,
                "Integer overflow",
                "Use floating point operands",
            ),
            ErrorMetadata::new(
                "E105",
                "Runtime",
                Severity::Medium,
                true,
                false,
                "Custom operator implementation failed",
                "Check the custom value's operator implementation",
            ),
            ErrorMetadata::new(
                "W100",
                "Runtime",
                Severity::Low,
                true,
                false,
                "Undefined value silently coerced",
                "Define the variable or use a strict undefined to surface the error",
            ),
            // Success
            ErrorMetadata::new(
                "I004",
                "System",
                Severity::Low,
                true,
                false,
                "System initialization completed",
                "None",
            ),
            ErrorMetadata::new(
                "I006",
                "FileProcessing",
                Severity::Low,
                true,
                false,
                "Template file processed",
                "None",
            ),
            ErrorMetadata::new(
                "I020",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Tokenization completed",
                "None",
            ),
            ErrorMetadata::new(
                "I021",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Lexer rule table built",
                "None",
            ),
            ErrorMetadata::new(
                "I040",
                "Syntax",
                Severity::Low,
                true,
                false,
                "Syntax tree constructed",
                "None",
            ),
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
