//! Syntax configuration and the environment that ties lexer, cache and
//! extensions together

use crate::config::compile_time::syntax_defaults;
use crate::grammar::ast::Node;
use crate::lexical::{Lexer, LexerCache};
use crate::logging::{self, codes, Code};
use crate::runtime::{Undefined, UndefinedKind};
use crate::syntax::{Extension, Parser, SyntaxResult};
use crate::tokens::{Token, TokenStream};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("block, variable and comment start strings must be different")]
    DelimiterConflict,

    #[error("{which} must not be empty")]
    EmptyDelimiter { which: &'static str },

    #[error("newline_sequence set to unknown line ending string: {value:?}")]
    UnsupportedNewline { value: String },

    #[error("failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl EnvironmentError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::ConfigRead { .. } => codes::file_processing::IO_ERROR,
            _ => codes::system::CONFIGURATION_ERROR,
        }
    }
}

/// Line ending that data and string tokens are normalised to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NewlineSequence {
    #[default]
    #[serde(rename = "\n")]
    Lf,
    #[serde(rename = "\r\n")]
    CrLf,
    #[serde(rename = "\r")]
    Cr,
}

impl NewlineSequence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

impl fmt::Display for NewlineSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lf => "lf",
            Self::CrLf => "crlf",
            Self::Cr => "cr",
        })
    }
}

impl FromStr for NewlineSequence {
    type Err = EnvironmentError;

    /// Accepts the literal sequences as well as `lf`, `crlf` and `cr`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "\n" | "lf" | "LF" => Ok(Self::Lf),
            "\r\n" | "crlf" | "CRLF" => Ok(Self::CrLf),
            "\r" | "cr" | "CR" => Ok(Self::Cr),
            other => Err(EnvironmentError::UnsupportedNewline {
                value: other.to_string(),
            }),
        }
    }
}

/// Everything the lexer depends on; equal configs share one cached lexer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    pub block_start_string: String,
    pub block_end_string: String,
    pub variable_start_string: String,
    pub variable_end_string: String,
    pub comment_start_string: String,
    pub comment_end_string: String,
    pub line_statement_prefix: Option<String>,
    pub line_comment_prefix: Option<String>,
    pub trim_blocks: bool,
    pub lstrip_blocks: bool,
    pub newline_sequence: NewlineSequence,
    pub keep_trailing_newline: bool,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            block_start_string: syntax_defaults::BLOCK_START_STRING.to_string(),
            block_end_string: syntax_defaults::BLOCK_END_STRING.to_string(),
            variable_start_string: syntax_defaults::VARIABLE_START_STRING.to_string(),
            variable_end_string: syntax_defaults::VARIABLE_END_STRING.to_string(),
            comment_start_string: syntax_defaults::COMMENT_START_STRING.to_string(),
            comment_end_string: syntax_defaults::COMMENT_END_STRING.to_string(),
            line_statement_prefix: None,
            line_comment_prefix: None,
            trim_blocks: syntax_defaults::TRIM_BLOCKS,
            lstrip_blocks: syntax_defaults::LSTRIP_BLOCKS,
            newline_sequence: syntax_defaults::NEWLINE_SEQUENCE
                .parse()
                .unwrap_or_default(),
            keep_trailing_newline: syntax_defaults::KEEP_TRAILING_NEWLINE,
        }
    }
}

impl SyntaxConfig {
    /// Load a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, EnvironmentError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, EnvironmentError> {
        let source =
            std::fs::read_to_string(path).map_err(|source| EnvironmentError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), EnvironmentError> {
        let delimiters = [
            ("block_start_string", &self.block_start_string),
            ("block_end_string", &self.block_end_string),
            ("variable_start_string", &self.variable_start_string),
            ("variable_end_string", &self.variable_end_string),
            ("comment_start_string", &self.comment_start_string),
            ("comment_end_string", &self.comment_end_string),
        ];
        for (which, value) in delimiters {
            if value.is_empty() {
                return Err(EnvironmentError::EmptyDelimiter { which });
            }
        }
        if self.line_statement_prefix.as_deref() == Some("") {
            return Err(EnvironmentError::EmptyDelimiter {
                which: "line_statement_prefix",
            });
        }
        if self.line_comment_prefix.as_deref() == Some("") {
            return Err(EnvironmentError::EmptyDelimiter {
                which: "line_comment_prefix",
            });
        }

        let starts = [
            &self.block_start_string,
            &self.variable_start_string,
            &self.comment_start_string,
        ];
        if starts[0] == starts[1] || starts[0] == starts[2] || starts[1] == starts[2] {
            return Err(EnvironmentError::DelimiterConflict);
        }
        Ok(())
    }
}

/// Validated syntax configuration plus the extension table and a lexer
/// cache that may be shared with other environments
#[derive(Clone)]
pub struct Environment {
    config: SyntaxConfig,
    extensions: Vec<Arc<dyn Extension>>,
    lexer_cache: Arc<LexerCache>,
    undefined_kind: UndefinedKind,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self
            .extensions
            .iter()
            .flat_map(|extension| extension.tags().iter().copied())
            .collect();
        f.debug_struct("Environment")
            .field("config", &self.config)
            .field("extension_tags", &tags)
            .field("undefined_kind", &self.undefined_kind)
            .finish()
    }
}

impl Environment {
    pub fn new(config: SyntaxConfig) -> Result<Self, EnvironmentError> {
        Self::with_lexer_cache(config, Arc::new(LexerCache::default()))
    }

    pub fn with_lexer_cache(
        config: SyntaxConfig,
        lexer_cache: Arc<LexerCache>,
    ) -> Result<Self, EnvironmentError> {
        config.validate()?;
        Ok(Self {
            config,
            extensions: Vec::new(),
            lexer_cache,
            undefined_kind: UndefinedKind::Lenient,
        })
    }

    /// Flavour of the values `undefined` hands out; lenient unless set
    pub fn with_undefined(mut self, kind: UndefinedKind) -> Self {
        self.undefined_kind = kind;
        self
    }

    pub fn undefined_kind(&self) -> UndefinedKind {
        self.undefined_kind
    }

    /// A fresh undefined value of the configured flavour, reporting to the
    /// global log sink when one is installed
    pub fn undefined(&self) -> Undefined {
        let undefined = Undefined::new(self.undefined_kind);
        match logging::global_sink() {
            Some(logger) => undefined.with_logger(logger),
            None => undefined,
        }
    }

    /// Register a statement extension; later registrations win on tag clashes
    pub fn add_extension(&mut self, extension: Arc<dyn Extension>) {
        self.extensions.push(extension);
    }

    pub fn with_extension(mut self, extension: Arc<dyn Extension>) -> Self {
        self.add_extension(extension);
        self
    }

    pub fn config(&self) -> &SyntaxConfig {
        &self.config
    }

    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    pub fn lexer_cache(&self) -> &Arc<LexerCache> {
        &self.lexer_cache
    }

    pub fn lexer(&self) -> SyntaxResult<Arc<Lexer>> {
        self.lexer_cache.get_or_build(&self.config)
    }

    pub fn tokenize(
        &self,
        source: &str,
        name: Option<&str>,
        filename: Option<&str>,
    ) -> SyntaxResult<TokenStream> {
        self.lexer()?.tokenize(source, name, filename, None)
    }

    /// Lex and wrap `source` without building a stream
    pub fn lex(
        &self,
        source: &str,
        name: Option<&str>,
        filename: Option<&str>,
    ) -> SyntaxResult<Vec<Token>> {
        let lexer = self.lexer()?;
        let raw = lexer.tokeniter(source, name, filename, None)?;
        lexer.wrap(raw, name, filename)
    }

    /// Tokenize and parse `source` into a `Template` node
    pub fn parse(
        &self,
        source: &str,
        name: Option<&str>,
        filename: Option<&str>,
    ) -> SyntaxResult<Node> {
        let stream = self.tokenize(source, name, filename)?;
        Parser::new(stream, &self.extensions).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ast::NodeKind;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_config_is_valid() {
        let config = SyntaxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.block_start_string, "{%");
        assert_eq!(config.newline_sequence, NewlineSequence::Lf);
    }

    #[test]
    fn test_start_delimiters_must_differ() {
        let config = SyntaxConfig {
            variable_start_string: "{%".into(),
            ..SyntaxConfig::default()
        };
        assert_matches!(config.validate(), Err(EnvironmentError::DelimiterConflict));
        assert_matches!(Environment::new(config), Err(EnvironmentError::DelimiterConflict));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let config = SyntaxConfig {
            line_statement_prefix: Some(String::new()),
            ..SyntaxConfig::default()
        };
        assert_matches!(
            config.validate(),
            Err(EnvironmentError::EmptyDelimiter { which: "line_statement_prefix" })
        );
    }

    #[test]
    fn test_toml_config() {
        let config = SyntaxConfig::from_toml_str(
            r##"
            block_start_string = "<%"
            block_end_string = "%>"
            line_statement_prefix = "#"
            newline_sequence = "\r\n"
            trim_blocks = true
            "##,
        )
        .unwrap();
        assert_eq!(config.block_start_string, "<%");
        assert_eq!(config.variable_start_string, "{{");
        assert_eq!(config.line_statement_prefix.as_deref(), Some("#"));
        assert_eq!(config.newline_sequence, NewlineSequence::CrLf);
        assert!(config.trim_blocks);

        assert_matches!(
            SyntaxConfig::from_toml_str("newline_sequence = \"\\t\""),
            Err(EnvironmentError::ConfigParse(_))
        );
    }

    #[test]
    fn test_config_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let error = SyntaxConfig::from_toml_file(&missing).unwrap_err();
        assert_eq!(error.error_code(), codes::file_processing::IO_ERROR);

        let path = dir.path().join("syntax.toml");
        std::fs::write(&path, "comment_start_string = \"{{\"\n").unwrap();
        assert_matches!(
            SyntaxConfig::from_toml_file(&path),
            Err(EnvironmentError::DelimiterConflict)
        );
    }

    #[test]
    fn test_newline_parsing() {
        assert_eq!("crlf".parse::<NewlineSequence>().unwrap(), NewlineSequence::CrLf);
        assert_eq!("\r".parse::<NewlineSequence>().unwrap(), NewlineSequence::Cr);
        assert!("\t".parse::<NewlineSequence>().is_err());
    }

    #[test]
    fn test_environments_share_lexers() {
        let cache = Arc::new(LexerCache::new(4));
        let first = Environment::with_lexer_cache(SyntaxConfig::default(), cache.clone()).unwrap();
        let second = Environment::with_lexer_cache(SyntaxConfig::default(), cache.clone()).unwrap();

        let a = first.lexer().unwrap();
        let b = second.lexer().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_undefined_factory() {
        let env = Environment::new(SyntaxConfig::default()).unwrap();
        assert_eq!(env.undefined_kind(), UndefinedKind::Lenient);
        assert_eq!(env.undefined().with_name("user").render().unwrap(), "");

        let strict = env.with_undefined(UndefinedKind::Strict);
        let undefined = strict.undefined().with_name("user");
        assert_eq!(undefined.kind(), UndefinedKind::Strict);
        assert_matches!(
            undefined.render(),
            Err(crate::runtime::RuntimeError::Undefined { message }) if message == "'user' is undefined"
        );
    }

    #[test]
    fn test_parse_round() {
        let env = Environment::new(SyntaxConfig::default()).unwrap();
        let template = env.parse("Hello {{ name }}!", Some("hello"), None).unwrap();
        assert_matches!(template.kind, NodeKind::Template { ref body } if body.len() == 1);
    }
}
