use crate::environment::EnvironmentError;
use crate::logging::{codes, Code};
use crate::syntax::SyntaxError;
use std::path::PathBuf;

/// Failures of the file-to-AST pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("template too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("template is not valid UTF-8: {}", path.display())]
    InvalidEncoding { path: PathBuf },

    #[error("I/O error reading {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    #[error("invalid configuration: {0}")]
    Environment(#[from] EnvironmentError),
}

impl PipelineError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::TemplateNotFound { .. } => codes::file_processing::TEMPLATE_NOT_FOUND,
            Self::FileTooLarge { .. } => codes::file_processing::FILE_TOO_LARGE,
            Self::PermissionDenied { .. } => codes::file_processing::PERMISSION_DENIED,
            Self::InvalidEncoding { .. } => codes::file_processing::INVALID_ENCODING,
            Self::Io { .. } => codes::file_processing::IO_ERROR,
            Self::Syntax(error) => error.error_code(),
            Self::Environment(error) => error.error_code(),
        }
    }

    /// Line the failure was detected on, when it came from the template text
    pub fn lineno(&self) -> Option<usize> {
        match self {
            Self::Syntax(error) => Some(error.lineno()),
            _ => None,
        }
    }

    pub(crate) fn io(path: &std::path::Path, error: std::io::Error) -> Self {
        let path = path.to_path_buf();
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::TemplateNotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            // read_to_string reports non-UTF-8 input as InvalidData
            std::io::ErrorKind::InvalidData => Self::InvalidEncoding { path },
            _ => Self::Io {
                path,
                message: error.to_string(),
            },
        }
    }
}
