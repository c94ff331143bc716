use crate::grammar::ast::Node;
use std::path::PathBuf;
use std::time::Duration;

/// A template read from disk and parsed
#[derive(Debug)]
pub struct PipelineResult {
    pub path: PathBuf,
    pub ast: Node,
    pub size: u64,
    pub token_count: usize,
    pub lex_duration: Duration,
    pub parse_duration: Duration,
}

impl PipelineResult {
    pub fn total_duration(&self) -> Duration {
        self.lex_duration + self.parse_duration
    }

    pub fn log_success(&self) {
        let total = self.total_duration().as_secs_f64();
        crate::log_success!(
            crate::logging::codes::success::FILE_PROCESSING_SUCCESS,
            "Template processed",
            "file" => self.path.display(),
            "size_bytes" => self.size,
            "tokens" => self.token_count,
            "duration_ms" => format!("{:.2}", total * 1000.0),
            "tokens_per_sec" => format!("{:.0}", self.token_count as f64 / total.max(f64::EPSILON))
        );
    }
}
