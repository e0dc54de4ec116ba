//! CLI: load a schema document → rewrite → (inspect | encode | decode)
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use schema_rename::{rewrite, schema_doc, transcode, Node, TranscodeError, Value};

/// Env var consulted for the log filter before `-v` is.
const LOG_ENV: &str = "SCHEMA_RENAME_LOG";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// rename schema fields on the encoded side and transcode JSON documents through the result
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the rewritten schema tree as JSON
    Inspect(InspectOut),
    /// decoded documents → encoded (renamed) documents
    Encode(TranscodeOut),
    /// encoded (renamed) documents → decoded documents
    Decode(TranscodeOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema document (JSON)
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// print the tree as loaded, before rewriting
    #[arg(long)]
    original: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct TranscodeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// output file (stdout if omitted); NDJSON when --ndjson is set, else a JSON array
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// stop at the first document that fails
    #[arg(long)]
    fail_fast: bool,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Encode,
    Decode,
}

/// One input document and where it came from.
struct Document {
    origin: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load_rewritten(&self) -> Result<Node> {
        let original = self.load_original()?;
        let rewritten = rewrite(&original)
            .with_context(|| format!("failed to rewrite schema {}", self.schema.display()))?;
        debug!(root = rewritten.kind(), "schema rewritten");
        Ok(rewritten)
    }

    fn load_original(&self) -> Result<Node> {
        let node = schema_doc::load(&self.schema)?;
        info!(schema = %self.schema.display(), root = node.kind(), "schema loaded");
        Ok(node)
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|error| anyhow!("failed to resolve input file paths: {error}"))?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            for (index, json_value) in self.parse_source(&source, &source_path_str)?.into_iter().enumerate() {
                let origin = if self.ndjson {
                    format!("{source_path_str}:{}", index + 1)
                } else {
                    source_path_str.clone()
                };
                for json_value in self.preprocess(json_value, &origin)? {
                    documents.push(Document { origin: origin.clone(), value: Value::from(json_value) });
                }
            }
        }
        info!(count = documents.len(), "documents loaded");
        Ok(documents)
    }

    fn parse_source(&self, source: &str, source_path_str: &str) -> Result<Vec<serde_json::Value>> {
        if !self.ndjson {
            let json_value = serde_json::from_str::<serde_json::Value>(source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            return Ok(vec![json_value]);
        }
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str::<serde_json::Value>(line).with_context(|| {
                    format!("failed to parse NDJSON line {} ({source_path_str})", index + 1)
                })
            })
            .collect()
    }

    /// Apply `--json-pointer` then `--jq-expr`.
    fn preprocess(&self, json_value: serde_json::Value, origin: &str) -> Result<Vec<serde_json::Value>> {
        let json_value = match self.json_pointer.as_deref() {
            None => json_value,
            Some(pointer) => json_value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} matched nothing in {origin}"))?,
        };
        match self.jq_expr.as_deref() {
            None => Ok(vec![json_value]),
            Some(jq_expr) => crate::jq_exec::apply_filter(jq_expr, &json_value)
                .with_context(|| format!("failed to apply jq expression to {origin}")),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
            EnvFilter::new(match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            })
        });
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Inspect(target) => {
                let node = if target.original {
                    target.schema_settings.load_original()?
                } else {
                    target.schema_settings.load_rewritten()?
                };
                let view_src = serde_json::to_string_pretty(&node.view())?;
                write_output(target.out.as_deref(), &view_src)
            }
            Command::Encode(target) => target.run(Direction::Encode),
            Command::Decode(target) => target.run(Direction::Decode),
        }
    }
}

impl TranscodeOut {
    fn run(&self, direction: Direction) -> Result<()> {
        // 1) schema
        let schema = self.schema_settings.load_rewritten()?;

        // 2) documents
        let documents = self.input_settings.load_documents()?;

        // 3) transcode; documents are independent, the tree is shared read-only
        let results = documents
            .par_iter()
            .map(|doc| transcode_one(&schema, direction, &doc.value))
            .collect::<Vec<_>>();

        let mut outputs = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        for (doc, result) in documents.iter().zip(results) {
            match result {
                Ok(value) => outputs.push(serde_json::Value::from(value)),
                Err(error) => {
                    failed += 1;
                    warn!(origin = %doc.origin, path = error.path(), "document failed");
                    eprintln!("{} {}: {error}", "✗".red().bold(), doc.origin.bold());
                    if self.fail_fast {
                        bail!("stopped at first failure ({})", doc.origin);
                    }
                }
            }
        }

        // 4) emit what succeeded
        let out_src = if self.input_settings.ndjson {
            let lines = outputs
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?;
            lines.join("\n")
        } else {
            serde_json::to_string_pretty(&outputs)?
        };
        write_output(self.out.as_deref(), &out_src)?;

        if failed > 0 {
            bail!("{failed} of {} document(s) failed", documents.len());
        }
        info!(count = outputs.len(), "done");
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn transcode_one(schema: &Node, direction: Direction, value: &Value) -> Result<Value, TranscodeError> {
    match direction {
        Direction::Encode => transcode::encode(schema, value),
        Direction::Decode => transcode::decode(schema, value),
    }
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{src}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
