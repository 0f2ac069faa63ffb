//! Minimal CLI: decode flat forms | export the schema | flatten documents
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use crate::decode::{DecodeOptions, Decoder, DEFAULT_MAX_INDEX, DEFAULT_ROOT};
use crate::error::{ErrorKind, ErrorReport, FieldError};
use crate::flatten::flatten_json;
use crate::form::{FlatForm, FormError};
use crate::schema::{self, Schema};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode bracket-indexed form submissions (`root[a][0][b]=...`) against a typed schema
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    /// more logging on stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode flat-form JSON objects and print the typed documents
    Decode(DecodeOut),
    /// print the JSON Schema a form renderer needs
    Schema(SchemaOut),
    /// turn nested JSON documents into flat bracket-indexed forms
    Flatten(FlattenOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /request/form)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema definition file (JSON); the built-in Person schema if omitted
    #[arg(long)]
    schema: Option<PathBuf>,

    /// literal that bracketed keys start with
    #[arg(long, default_value = DEFAULT_ROOT)]
    root: String,

    /// largest list index a key may address (never more than 1000000)
    #[arg(long, default_value_t = DEFAULT_MAX_INDEX)]
    max_index: usize,
}

#[derive(clap::Parser, Debug)]
struct DecodeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct FlattenOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// literal the generated keys start with
    #[arg(long, default_value = DEFAULT_ROOT)]
    root: String,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One JSON document pulled out of the inputs, with where it came from.
#[derive(Debug, Clone)]
struct Document {
    source: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let mut out = Vec::new();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let source_name = source_path.to_string_lossy().to_string();
            let source = read_source(&source_path)?;
            for (source, value) in self.parse(&source_name, &source)? {
                let value = self.select(&source, value)?;
                match self.jq_expr.as_ref() {
                    None => out.push(Document { source, value }),
                    Some(jq_expr) => {
                        let results = crate::jq_exec::run_jaq(jq_expr, &value)
                            .with_context(|| format!("failed to apply jq expression to {source}"))?;
                        let many = results.len() > 1;
                        for (i, value) in results.into_iter().enumerate() {
                            let source = if many { format!("{source}#{i}") } else { source.clone() };
                            out.push(Document { source, value });
                        }
                    }
                }
            }
        }
        tracing::debug!(documents = out.len(), "loaded inputs");
        Ok(out)
    }

    fn parse(&self, source_name: &str, source: &str) -> Result<Vec<(String, Value)>> {
        if !self.ndjson {
            let value = serde_json::from_str::<Value>(source)
                .with_context(|| format!("failed to parse JSON source file ({source_name})"))?;
            return Ok(vec![(source_name.to_string(), value)]);
        }
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                let name = format!("{source_name}:{}", i + 1);
                let value = serde_json::from_str::<Value>(line)
                    .with_context(|| format!("failed to parse NDJSON line ({name})"))?;
                Ok((name, value))
            })
            .collect()
    }

    fn select(&self, source: &str, value: Value) -> Result<Value> {
        let Some(pointer) = self.json_pointer.as_ref() else {
            return Ok(value);
        };
        match value.pointer(pointer) {
            Some(v) => Ok(v.clone()),
            None => bail!("JSON pointer {pointer} matches nothing in {source}"),
        }
    }
}

impl SchemaSettings {
    fn decoder(&self) -> Result<Decoder> {
        let schema = self.schema()?;
        let options = DecodeOptions { root: self.root.clone(), max_index: self.max_index };
        Ok(Decoder::new(schema).with_options(options))
    }

    fn schema(&self) -> Result<Schema> {
        match self.schema.as_ref() {
            None => crate::model::person_schema().context("built-in schema is invalid"),
            Some(path) => {
                let src = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read schema file {}", path.display()))?;
                schema::def::from_str(&src)
                    .with_context(|| format!("invalid schema file {}", path.display()))
            }
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        init_tracing(self.verbose);
        match &self.cmd {
            Command::Decode(target) => target.run(),
            Command::Schema(target) => {
                let schema = target.schema_settings.schema()?;
                let doc = schema::export::json_schema(&schema);
                write_output(target.out.as_deref(), &doc)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Flatten(target) => {
                let docs = target.input_settings.load()?;
                let forms = docs
                    .iter()
                    .map(|d| flatten_json(&d.value, &target.root).to_json())
                    .collect::<Vec<_>>();
                write_output(target.out.as_deref(), &single_or_many(forms))?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

impl DecodeOut {
    fn run(&self) -> Result<ExitCode> {
        let decoder = self.schema_settings.decoder()?;
        let docs = self.input_settings.load()?;

        // each decode is independent; nothing shared but the read-only decoder
        let outcomes: Vec<(&Document, Result<Value, ErrorReport>)> = docs
            .par_iter()
            .map(|doc| (doc, decode_document(&decoder, doc)))
            .collect();

        let mut failed = 0usize;
        let mut results = Vec::with_capacity(outcomes.len());
        for (doc, outcome) in outcomes {
            match outcome {
                Ok(value) => results.push(json!({ "source": doc.source, "value": value })),
                Err(report) => {
                    failed += 1;
                    print_report(&doc.source, &report);
                    results.push(json!({ "source": doc.source, "errors": report }));
                }
            }
        }
        tracing::info!(total = results.len(), failed, "decoded inputs");

        write_output(self.out.as_deref(), &Value::Array(results))?;
        Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }
}

fn decode_document(decoder: &Decoder, doc: &Document) -> Result<Value, ErrorReport> {
    let form = FlatForm::from_json(&doc.value).map_err(|e| {
        let path = match &e {
            FormError::NestedValue(key) => key.clone(),
            FormError::NotAnObject(_) => decoder.options().root.clone(),
        };
        FieldError::new(path, ErrorKind::TypeMismatch, e.to_string())
    })?;
    decoder.decode(&form).map(|v| v.to_json())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_report(source: &str, report: &ErrorReport) {
    eprintln!("{} {} ({} problem{})",
        "✗".red().bold(),
        source.bold(),
        report.len(),
        if report.len() == 1 { "" } else { "s" },
    );
    for e in report.iter() {
        eprintln!("    {} {} {}", e.path.yellow(), e.kind.as_str().cyan(), e.message);
    }
}

fn single_or_many(mut values: Vec<Value>) -> Value {
    if values.len() == 1 { values.remove(0) } else { Value::Array(values) }
}

fn write_output(out: Option<&Path>, doc: &Value) -> Result<()> {
    let src = serde_json::to_string_pretty(doc)?;
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, &src).with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => {
            #[allow(clippy::print_stdout)]
            {
                println!("{src}");
            }
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read source file {}", path.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
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

        if !has_glob_chars(pattern) {
            // literal path, or '-' for stdin
            out.push(PathBuf::from(pattern));
            continue;
        }

        let before = out.len();
        for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
            out.push(entry?);
        }
        if out.len() == before {
            // explicitly a glob but matched nothing
            bail!("glob pattern matched no files: {pattern}");
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_decode_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "nested-form", "decode", "-i", "a.json", "b.json", "--root", "person", "--jq-expr", ".form",
        ]).unwrap();
        let Command::Decode(target) = cli.cmd else { panic!("expected decode") };
        assert_eq!(target.input_settings.input, vec!["a.json", "b.json"]);
        assert_eq!(target.schema_settings.root, "person");
        assert_eq!(target.schema_settings.max_index, DEFAULT_MAX_INDEX);
        assert_eq!(target.input_settings.jq_expr.as_deref(), Some(".form"));
    }

    #[test]
    fn ndjson_lines_are_separate_documents() {
        let settings = InputSettings { ndjson: true, json_pointer: None, jq_expr: None, input: vec![] };
        let docs = settings.parse("forms.ndjson", "{\"a\":\"1\"}\n\n{\"a\":\"2\"}\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].0, "forms.ndjson:3");
    }

    #[test]
    fn pointer_selects_subdocument() {
        let settings = InputSettings { ndjson: false, json_pointer: Some("/form".into()), jq_expr: None, input: vec![] };
        let value = settings.select("x", json!({ "form": { "name": "Ada" } })).unwrap();
        assert_eq!(value, json!({ "name": "Ada" }));
        assert!(settings.select("x", json!({})).is_err());
    }

    #[test]
    fn nested_input_is_reported_at_its_key() {
        let decoder = Decoder::new(crate::model::person_schema().unwrap());
        let doc = Document { source: "bad.json".into(), value: json!({ "root[address]": { "city": "x" } }) };
        let report = decode_document(&decoder, &doc).unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].path, "root[address]");
        assert_eq!(report.errors()[0].kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn non_object_input_is_reported_at_the_root() {
        let options = DecodeOptions { root: "person".into(), ..DecodeOptions::default() };
        let decoder = Decoder::new(crate::model::person_schema().unwrap()).with_options(options);
        let doc = Document { source: "bad.json".into(), value: json!(["a", "b"]) };
        let report = decode_document(&decoder, &doc).unwrap_err();
        assert_eq!(report.errors()[0].path, "person");
        assert_eq!(report.errors()[0].kind, ErrorKind::TypeMismatch);
    }
}
