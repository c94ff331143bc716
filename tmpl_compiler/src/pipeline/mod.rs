//! File-to-AST pipeline: read, size-check, lex and parse one template, or
//! discover every template under a directory

mod error;
mod result;

pub use error::PipelineError;
pub use result::PipelineResult;

use crate::config::compile_time::file_processing::MAX_FILE_SIZE;
use crate::environment::Environment;
use crate::logging;
use crate::syntax::Parser;
use crate::tokens::{Token, TokenStream};
use crate::{log_debug, log_error, log_info, log_warning};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Read a template, refusing anything over the compile-time size limit
pub fn read_template(path: &Path) -> Result<String, PipelineError> {
    let metadata = fs::metadata(path).map_err(|error| PipelineError::io(path, error))?;
    if !metadata.is_file() {
        return Err(PipelineError::TemplateNotFound {
            path: path.to_path_buf(),
        });
    }
    if metadata.len() > MAX_FILE_SIZE {
        return Err(PipelineError::FileTooLarge {
            size: metadata.len(),
            max_size: MAX_FILE_SIZE,
        });
    }
    fs::read_to_string(path).map_err(|error| PipelineError::io(path, error))
}

/// Lex a template file into wrapped tokens
pub fn tokenize_file(path: &Path, env: &Environment) -> Result<Vec<Token>, PipelineError> {
    let source = read_template(path)?;
    let (name, filename) = template_names(path);
    Ok(env.lex(&source, Some(&name), Some(&filename))?)
}

/// Process one template file through lexing and parsing
pub fn process_file(path: &Path, env: &Environment) -> Result<PipelineResult, PipelineError> {
    logging::with_file_context(path.to_path_buf(), 0, || {
        log_info!("Processing template", "file" => path.display());

        let result = run_pipeline(path, env);
        match &result {
            Ok(result) => result.log_success(),
            Err(error) => match error.lineno() {
                Some(lineno) => {
                    log_error!(error.error_code(), &error.to_string(), line = lineno,
                        "file" => path.display())
                }
                None => {
                    log_error!(error.error_code(), &error.to_string(), "file" => path.display())
                }
            },
        }
        result
    })
}

fn run_pipeline(path: &Path, env: &Environment) -> Result<PipelineResult, PipelineError> {
    let source = read_template(path)?;
    let size = source.len() as u64;
    let (name, filename) = template_names(path);

    let lex_start = Instant::now();
    let tokens = env.lex(&source, Some(&name), Some(&filename))?;
    let token_count = tokens.len();
    let lex_duration = lex_start.elapsed();

    let parse_start = Instant::now();
    let stream = TokenStream::new(tokens, Some(&name), Some(&filename));
    let ast = Parser::new(stream, env.extensions()).parse()?;
    let parse_duration = parse_start.elapsed();

    Ok(PipelineResult {
        path: path.to_path_buf(),
        ast,
        size,
        token_count,
        lex_duration,
        parse_duration,
    })
}

/// Template name is the file name, filename the path as given
fn template_names(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    (name, path.display().to_string())
}

/// Which files under a directory count as templates
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Extensions without the dot; empty accepts every file
    pub extensions: Vec<String>,
    pub recursive: bool,
    pub max_files: Option<usize>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["html".into(), "j2".into(), "jinja".into(), "txt".into()],
            recursive: true,
            max_files: None,
        }
    }
}

impl DiscoveryOptions {
    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }

    fn is_full(&self, found: usize) -> bool {
        self.max_files.is_some_and(|max| found >= max)
    }
}

/// Collect template files under `dir` in sorted order
pub fn discover_templates(
    dir: &Path,
    options: &DiscoveryOptions,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    visit_directory(dir, options, &mut files)?;
    files.sort();

    log_debug!("Template discovery completed",
        "files_found" => files.len(),
        "directory" => dir.display()
    );
    Ok(files)
}

fn visit_directory(
    dir: &Path,
    options: &DiscoveryOptions,
    files: &mut Vec<PathBuf>,
) -> Result<(), PipelineError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|error| PipelineError::io(dir, error))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| PipelineError::io(dir, error))?;
    entries.sort();

    for path in entries {
        if options.is_full(files.len()) {
            log_warning!("Reached maximum file limit",
                "files_found" => files.len(),
                "directory" => dir.display()
            );
            return Ok(());
        }
        if path.is_dir() {
            if options.recursive {
                visit_directory(&path, options, files)?;
            }
        } else if options.accepts(&path) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SyntaxConfig;
    use crate::grammar::ast::NodeKind;
    use crate::logging::codes;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::TempDir;

    fn env() -> Environment {
        Environment::new(SyntaxConfig::default()).unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_process_file() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "page.html", "Hello {{ name }}!");

        let result = process_file(&path, &env()).unwrap();
        assert_eq!(result.token_count, 5);
        assert_eq!(result.size, 17);
        assert_matches!(result.ast.kind, NodeKind::Template { body } if body.len() == 1);
    }

    #[test]
    fn test_missing_template() {
        let dir = TempDir::new().unwrap();
        let error = process_file(&dir.path().join("nope.html"), &env()).unwrap_err();
        assert_matches!(error, PipelineError::TemplateNotFound { .. });
        assert_eq!(error.error_code(), codes::file_processing::TEMPLATE_NOT_FOUND);
    }

    #[test]
    fn test_directory_is_not_a_template() {
        let dir = TempDir::new().unwrap();
        assert_matches!(
            read_template(dir.path()),
            Err(PipelineError::TemplateNotFound { .. })
        );
    }

    #[test]
    fn test_non_utf8_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.html");
        fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        let error = process_file(&path, &env()).unwrap_err();
        assert_matches!(error, PipelineError::InvalidEncoding { .. });
        assert_eq!(error.error_code(), codes::file_processing::INVALID_ENCODING);
    }

    #[test]
    fn test_io_error_kinds() {
        let path = Path::new("t.html");
        let denied = PipelineError::io(path, std::io::ErrorKind::PermissionDenied.into());
        assert_matches!(denied, PipelineError::PermissionDenied { .. });
        assert_eq!(denied.error_code(), codes::file_processing::PERMISSION_DENIED);

        let other = PipelineError::io(path, std::io::ErrorKind::Interrupted.into());
        assert_matches!(other, PipelineError::Io { .. });
        assert_eq!(other.error_code(), codes::file_processing::IO_ERROR);
    }

    #[test]
    fn test_syntax_error_carries_file_name() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "broken.html", "line\n{% if x %}");

        let error = process_file(&path, &env()).unwrap_err();
        assert_eq!(error.lineno(), Some(2));
        assert_matches!(&error, PipelineError::Syntax(syntax) => {
            assert_eq!(syntax.name(), Some("broken.html"));
            assert_eq!(syntax.error_code(), codes::syntax::UNEXPECTED_END);
        });
    }

    #[test]
    fn test_tokenize_file() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "t.txt", "{{ 1 + 2 }}");
        let tokens = tokenize_file(&path, &env()).unwrap();
        let kinds: Vec<&str> = tokens.iter().map(|token| token.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["variable_begin", "integer", "add", "integer", "variable_end"]
        );
    }

    #[test]
    fn test_discover_templates() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.html", "");
        write(dir.path(), "a.j2", "");
        write(dir.path(), "notes.md", "");
        write(dir.path(), "nested/c.html", "");

        let found = discover_templates(dir.path(), &DiscoveryOptions::default()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|path| path.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names.len(), 3);
        assert!(names[0].ends_with("a.j2"));
        assert!(names.iter().any(|name| name.ends_with("c.html")));

        let flat = DiscoveryOptions {
            recursive: false,
            ..DiscoveryOptions::default()
        };
        assert_eq!(discover_templates(dir.path(), &flat).unwrap().len(), 2);

        let limited = DiscoveryOptions {
            extensions: Vec::new(),
            max_files: Some(1),
            ..DiscoveryOptions::default()
        };
        assert_eq!(discover_templates(dir.path(), &limited).unwrap().len(), 1);
    }
}
