//! Minimal CLI: syntax tree JSON → (typed IR JSON | outline)
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::ast::SourceFile;
use crate::config::PipelineConfig;
use crate::error::Error;
use crate::ir::{File, Named, Type};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// lift parsed type declarations into a typed IR, applying a transform pipeline
#[derive(Parser, Debug)]
#[command(name = "typelift", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// debugging: print the parsed arguments and exit
    #[arg(long, global = true)]
    no_op: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// lift and print the typed IR as JSON
    Lift(LiftOut),
    /// lift and print a human-readable outline
    Outline(OutlineOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the syntax tree in each document (e.g. /result/file)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is lifted
    #[arg(long)]
    jq_expr: Option<String>,

    /// transform pipeline (JSON)
    #[arg(long, short)]
    transforms: Option<PathBuf>,

    /// package name for the output (defaults to the pipeline's, then the source's)
    #[arg(long, short)]
    package: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct LiftOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct OutlineOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

/// One syntax tree and where it came from.
#[derive(Debug)]
struct Document {
    origin: String,
    source: SourceFile,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let origin = source_path.to_string_lossy().to_string();
            let bytes = read_source(&source_path)?;
            let json_value = crate::path_de::from_slice_with_path::<serde_json::Value>(&bytes)
                .map_err(|message| Error::Decode {
                    what: "JSON document",
                    origin: origin.clone(),
                    message,
                })?;

            let values = match self.jq_expr.as_ref() {
                None => vec![json_value],
                Some(jq_expr) => crate::jq_exec::select_documents(jq_expr, &json_value)
                    .map_err(|e| Error::Jq { origin: origin.clone(), message: format!("{e:#}") })?,
            };

            for value in values {
                let value = match self.json_pointer.as_deref() {
                    None => value,
                    Some(pointer) => value.pointer(pointer).cloned().ok_or_else(|| Error::Pointer {
                        pointer: pointer.to_string(),
                        origin: origin.clone(),
                    })?,
                };
                let source = crate::path_de::from_value_with_path::<SourceFile>(value)
                    .map_err(|message| Error::Decode {
                        what: "syntax tree",
                        origin: origin.clone(),
                        message,
                    })?;
                documents.push(Document { origin: origin.clone(), source });
            }
        }
        Ok(documents)
    }

    /// Lifts every document in parallel. Each one gets its own transform
    /// list, built from the shared pipeline.
    fn lift_all(&self) -> Result<Vec<File>> {
        let pipeline = match self.transforms.as_deref() {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        let package = self
            .package
            .clone()
            .or_else(|| pipeline.package.clone())
            .unwrap_or_default();

        let documents = self.load_documents()?;
        documents
            .par_iter()
            .map(|doc| -> Result<File> {
                log::info!("lifting {} (package {})", doc.origin, doc.source.package);
                let transforms = pipeline.build()?;
                Ok(File::from_ast(&doc.source, &package, transforms))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        if self.no_color {
            colored::control::set_override(false);
        }
        // debug path
        if self.no_op {
            eprintln!("{self:#?}");
            return Ok(());
        }
        match &self.cmd {
            Command::Lift(target) => {
                let files = target.input_settings.lift_all()?;
                let json_src = match files.as_slice() {
                    [single] => serde_json::to_string_pretty(single)?,
                    many => serde_json::to_string_pretty(many)?,
                };
                if let Some(out) = target.out.as_ref() {
                    write_output(out, &json_src)?;
                } else {
                    println!("{json_src}");
                }
            }
            Command::Outline(target) => {
                for file in target.input_settings.lift_all()? {
                    print!("{}", outline(&file));
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read_source(path: &Path) -> Result<Vec<u8>, Error> {
    let io_error = |source| Error::Io { path: path.to_path_buf(), source };
    if path == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes).map_err(io_error)?;
        return Ok(bytes);
    }
    std::fs::read(path).map_err(io_error)
}

fn write_output(out: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn outline(file: &File) -> String {
    let mut out = format!("{} {}\n", "package".bold(), file.package.green());
    for (key, import) in &file.imports {
        out.push_str(&format!("  {} {} {:?}\n", "import".bold(), key.cyan(), import.path));
    }
    for ty in &file.code {
        match ty {
            Type::Plain(t) => {
                out.push_str(&format!("  {} {} {}\n", "type".bold(), t.name.yellow(), t.ty))
            }
            Type::Array(t) => {
                out.push_str(&format!("  {} {} []{}\n", "type".bold(), t.name.yellow(), t.ty))
            }
            Type::Map(t) => out.push_str(&format!(
                "  {} {} map[{}]{}\n",
                "type".bold(),
                t.name.yellow(),
                t.key_type,
                t.value_type
            )),
            Type::Struct(st) => {
                out.push_str(&format!("  {} {} struct\n", "type".bold(), st.name.yellow()));
                for field in &st.fields {
                    let tags = field
                        .tags
                        .iter()
                        .map(|(k, v)| format!("{k}:{:?}", v.join(",")))
                        .collect::<Vec<_>>()
                        .join(" ");
                    let rendered = match &field.ty {
                        Type::Plain(t) => t.ty.clone(),
                        Type::Array(t) => format!("[]{}", t.ty),
                        Type::Map(t) => format!("map[{}]{}", t.key_type, t.value_type),
                        Type::Struct(_) => "struct{...}".to_string(),
                    };
                    let name = if field.name().is_empty() { "(embedded)" } else { field.name() };
                    if tags.is_empty() {
                        out.push_str(&format!("    {} {}\n", name, rendered));
                    } else {
                        out.push_str(&format!("    {} {} {}\n", name, rendered, tags.dimmed()));
                    }
                }
            }
        }
    }
    out
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

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path ('-' is stdin)
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
