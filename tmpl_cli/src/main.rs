//! # tmplc
//!
//! Command line front end for the template compiler: dump tokens, dump the
//! syntax tree, or check a tree of templates for syntax errors.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tmpl_compiler::pipeline::{self, DiscoveryOptions};
use tmpl_compiler::syntax::default_extensions;
use tmpl_compiler::{log_error, log_info, log_success, logging};
use tmpl_compiler::{Environment, NewlineSequence, SyntaxConfig};

#[derive(Parser, Debug)]
#[command(name = "tmplc", version, about = "Template lexer and parser")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    syntax: SyntaxArgs,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the wrapped token list of a template as JSON
    Tokens { file: PathBuf },

    /// Print the syntax tree of a template as JSON
    Parse { file: PathBuf },

    /// Parse a template or every template under a directory
    Check {
        path: PathBuf,

        /// File extensions to check, repeatable (default: html, j2, jinja, txt)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Don't search subdirectories
        #[arg(long)]
        no_recursive: bool,

        /// Stop at this many files
        #[arg(long)]
        max_files: Option<usize>,
    },
}

#[derive(Args, Debug, Default)]
struct SyntaxArgs {
    /// TOML file with syntax settings; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    block_start: Option<String>,
    #[arg(long, global = true)]
    block_end: Option<String>,
    #[arg(long, global = true)]
    variable_start: Option<String>,
    #[arg(long, global = true)]
    variable_end: Option<String>,
    #[arg(long, global = true)]
    comment_start: Option<String>,
    #[arg(long, global = true)]
    comment_end: Option<String>,
    #[arg(long, global = true)]
    line_statement_prefix: Option<String>,
    #[arg(long, global = true)]
    line_comment_prefix: Option<String>,

    #[arg(long, global = true)]
    trim_blocks: bool,
    #[arg(long, global = true)]
    lstrip_blocks: bool,
    #[arg(long, global = true)]
    keep_trailing_newline: bool,

    /// Line ending for data: lf, crlf or cr
    #[arg(long, global = true)]
    newline: Option<NewlineSequence>,
}

impl SyntaxArgs {
    fn build_config(&self) -> Result<SyntaxConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => SyntaxConfig::from_toml_file(path)?,
            None => SyntaxConfig::default(),
        };

        let overrides = [
            (&self.block_start, &mut config.block_start_string),
            (&self.block_end, &mut config.block_end_string),
            (&self.variable_start, &mut config.variable_start_string),
            (&self.variable_end, &mut config.variable_end_string),
            (&self.comment_start, &mut config.comment_start_string),
            (&self.comment_end, &mut config.comment_end_string),
        ];
        for (flag, field) in overrides {
            if let Some(value) = flag {
                *field = value.clone();
            }
        }
        if self.line_statement_prefix.is_some() {
            config.line_statement_prefix = self.line_statement_prefix.clone();
        }
        if self.line_comment_prefix.is_some() {
            config.line_comment_prefix = self.line_comment_prefix.clone();
        }
        config.trim_blocks |= self.trim_blocks;
        config.lstrip_blocks |= self.lstrip_blocks;
        config.keep_trailing_newline |= self.keep_trailing_newline;
        if let Some(newline) = self.newline {
            config.newline_sequence = newline;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    if let Err(error) = logging::init_global_logging() {
        logging::safe_log_error(
            logging::codes::system::INITIALIZATION_FAILURE,
            &format!("global logging unavailable: {}", error),
        );
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut env = Environment::new(cli.syntax.build_config()?)?;
    for extension in default_extensions() {
        env.add_extension(extension);
    }
    log_info!("tmplc starting", "command" => format!("{:?}", cli.command));

    match &cli.command {
        Command::Tokens { file } => {
            let tokens = pipeline::tokenize_file(file, &env)?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Parse { file } => {
            let result = pipeline::process_file(file, &env)?;
            println!("{}", serde_json::to_string_pretty(&result.ast)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            path,
            extensions,
            no_recursive,
            max_files,
        } => {
            let mut options = DiscoveryOptions {
                recursive: !no_recursive,
                max_files: *max_files,
                ..DiscoveryOptions::default()
            };
            if !extensions.is_empty() {
                options.extensions = extensions
                    .iter()
                    .map(|ext| ext.trim_start_matches('.').to_string())
                    .collect();
            }
            check(path, &env, &options)
        }
    }
}

fn check(
    path: &Path,
    env: &Environment,
    options: &DiscoveryOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let files = if path.is_dir() {
        pipeline::discover_templates(path, options)?
    } else {
        vec![path.to_path_buf()]
    };
    if files.is_empty() {
        println!("No templates found in: {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut passed = 0;
    let mut failed = 0;
    let mut tokens = 0;

    for file in &files {
        match pipeline::process_file(file, env) {
            Ok(result) => {
                passed += 1;
                tokens += result.token_count;
                println!("  ✓ {}", file.display());
            }
            Err(error) => {
                failed += 1;
                match error.lineno() {
                    Some(lineno) => println!("  ✗ {}:{}: {}", file.display(), lineno, error),
                    None => println!("  ✗ {}: {}", file.display(), error),
                }
            }
        }
    }

    let duration = start.elapsed();
    let summary = logging::get_processing_summary();
    println!("\n=== Check Summary ===");
    println!("Templates: {}", files.len());
    println!("Passed: {}", passed);
    println!("Failed: {}", failed);
    println!("Warnings: {}", summary.total_warnings);
    println!("Tokens: {}", tokens);
    println!("Duration: {:.2}s", duration.as_secs_f64());
    if failed > 0 {
        println!("\n{}", logging::cargo_style_summary());
        log_error!(
            tmpl_compiler::logging::codes::syntax::GRAMMAR_VIOLATION,
            "Template check failed",
            "failed" => failed,
            "templates" => files.len()
        );
        return Ok(ExitCode::FAILURE);
    }

    log_success!(
        tmpl_compiler::logging::codes::success::FILE_PROCESSING_SUCCESS,
        "Template check completed",
        "templates" => files.len(),
        "duration_ms" => duration.as_millis()
    );
    Ok(ExitCode::SUCCESS)
}
