//! Syntax errors shared by the lexer, token stream and parser
//!
//! Every failure carries the line it was detected on together with the
//! template name and filename, and maps onto a logging code.

use crate::logging::{codes, Code};

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    /// Malformed template source
    #[error("{message}")]
    Template {
        message: String,
        lineno: usize,
        name: Option<String>,
        filename: Option<String>,
        code: Code,
    },

    /// A rule table or state machine bug; never caused by valid input alone
    #[error("internal error: {message}")]
    Internal {
        message: String,
        lineno: usize,
        code: Code,
    },
}

impl SyntaxError {
    /// Create a template error with the given code
    pub fn template(code: Code, message: impl Into<String>, lineno: usize) -> Self {
        Self::Template {
            message: message.into(),
            lineno,
            name: None,
            filename: None,
            code,
        }
    }

    /// Create a grammar violation error
    pub fn grammar(message: impl Into<String>, lineno: usize) -> Self {
        Self::template(codes::syntax::GRAMMAR_VIOLATION, message, lineno)
    }

    /// Create an internal parser error
    pub fn internal(message: impl Into<String>, lineno: usize) -> Self {
        Self::internal_with_code(codes::syntax::INTERNAL_PARSER_ERROR, message, lineno)
    }

    /// Create an internal lexer error
    pub fn lexer_internal(message: impl Into<String>, lineno: usize) -> Self {
        Self::internal_with_code(codes::lexical::INTERNAL_LEXER_ERROR, message, lineno)
    }

    pub fn internal_with_code(code: Code, message: impl Into<String>, lineno: usize) -> Self {
        Self::Internal {
            message: message.into(),
            lineno,
            code,
        }
    }

    /// Attach template name and filename
    pub fn with_template(mut self, template: Option<&str>, file: Option<&str>) -> Self {
        if let Self::Template { name, filename, .. } = &mut self {
            *name = template.map(str::to_string);
            *filename = file.map(str::to_string);
        }
        self
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Template { message, .. } | Self::Internal { message, .. } => message,
        }
    }

    pub fn lineno(&self) -> usize {
        match self {
            Self::Template { lineno, .. } | Self::Internal { lineno, .. } => *lineno,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Template { name, .. } => name.as_deref(),
            Self::Internal { .. } => None,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Template { filename, .. } => filename.as_deref(),
            Self::Internal { .. } => None,
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::Template { code, .. } | Self::Internal { code, .. } => *code,
        }
    }

    /// Check if this error requires halting
    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    /// Get error severity
    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    /// Get recommended action
    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }

    /// `file:line` style location for diagnostics
    pub fn location(&self) -> String {
        let source = self
            .filename()
            .or_else(|| self.name())
            .unwrap_or("<template>");
        format!("{}:{}", source, self.lineno())
    }

    /// Message with location, as printed by the command line front end
    pub fn enhanced_message(&self) -> String {
        format!(
            "{} (line {}, {})",
            self.message(),
            self.lineno(),
            self.location()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let unknown = SyntaxError::template(codes::syntax::UNKNOWN_TAG, "Encountered unknown tag", 1);
        assert_eq!(unknown.error_code().as_str(), "E042");

        let grammar = SyntaxError::grammar("expected call", 3);
        assert_eq!(grammar.error_code().as_str(), "E043");

        let internal = SyntaxError::internal("no group matched", 1);
        assert_eq!(internal.error_code().as_str(), "E086");
        assert!(internal.requires_halt());

        let lexer = SyntaxError::lexer_internal("zero-length match", 1);
        assert_eq!(lexer.error_code().as_str(), "E029");
    }

    #[test]
    fn test_template_context() {
        let error = SyntaxError::grammar("tag name expected", 4)
            .with_template(Some("index"), Some("templates/index.html"));

        assert_eq!(error.to_string(), "tag name expected");
        assert_eq!(error.lineno(), 4);
        assert_eq!(error.name(), Some("index"));
        assert_eq!(error.location(), "templates/index.html:4");
    }

    #[test]
    fn test_internal_errors_ignore_template_context() {
        let error = SyntaxError::internal("zero-length match", 2).with_template(Some("a"), None);

        assert_eq!(error.name(), None);
        assert_eq!(error.location(), "<template>:2");
        assert!(error.enhanced_message().contains("zero-length match"));
    }
}
