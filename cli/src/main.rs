use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use jsonschema_form_core::{
    build_defaults, changed_paths, walk, EngineOptions, SchemaDocument, TypeWidgets,
    ValidationTree, VariantTracker, WalkContext,
};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "jsonschema-form")]
#[command(about = "Default, prune, inspect and diff settings described by a JSON Schema")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a freshly defaulted object for a schema
    Defaults {
        /// Input JSON Schema file
        schema: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Shape existing settings to a schema: force constants, fill defaults,
    /// drop undeclared keys
    Fill {
        /// Input JSON Schema file
        schema: PathBuf,

        /// Settings file to shape
        data: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the field tree a form would render
    Tree {
        /// Input JSON Schema file
        schema: PathBuf,

        /// Settings file (defaults to an empty object)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Validation results shaped like the settings
        #[arg(long)]
        errors: Option<PathBuf>,

        /// Extra widget binding, HINT=WIDGET (repeatable)
        #[arg(long = "widget", value_parser = parse_widget_binding)]
        widgets: Vec<(String, String)>,

        #[command(flatten)]
        engine: EngineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the JSON Pointers at which two settings files differ
    Diff {
        /// Saved settings
        original: PathBuf,

        /// Edited settings
        current: PathBuf,

        /// Exit with status 1 when the files differ
        #[arg(long)]
        exit_code: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct EngineArgs {
    /// Maximum field tree depth
    #[arg(long, default_value_t = EngineOptions::default().max_depth)]
    max_depth: usize,

    /// Maximum `$ref` hops followed per reference chain
    #[arg(long, default_value_t = EngineOptions::default().max_ref_hops)]
    max_ref_hops: usize,
}

impl From<&EngineArgs> for EngineOptions {
    fn from(args: &EngineArgs) -> Self {
        EngineOptions {
            max_depth: args.max_depth,
            max_ref_hops: args.max_ref_hops,
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output file (defaults to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn parse_widget_binding(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((hint, widget)) if !hint.is_empty() && !widget.is_empty() => {
            Ok((hint.to_string(), widget.to_string()))
        }
        _ => Err(format!("expected HINT=WIDGET, got '{raw}'")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Defaults {
            schema,
            engine,
            output,
        } => {
            let document = load_document(&schema, &engine)?;
            let defaults = build_defaults(document.root(), &document.defs);
            write_json(&defaults, &output)?;
        }
        Commands::Fill {
            schema,
            data,
            engine,
            output,
        } => {
            let document = load_document(&schema, &engine)?;
            let mut data = read_json(&data, "settings")?;
            jsonschema_form_core::fill_defaults(&mut data, document.root(), &document.defs);
            write_json(&data, &output)?;
        }
        Commands::Tree {
            schema,
            data,
            errors,
            widgets,
            engine,
            output,
        } => {
            let document = load_document(&schema, &engine)?;
            let data = match data {
                Some(path) => read_json(&path, "settings")?,
                None => Value::Object(Default::default()),
            };
            let validation = errors
                .map(|path| read_json(&path, "validation results").map(ValidationTree::new))
                .transpose()?;

            let widgets = widgets
                .into_iter()
                .fold(TypeWidgets::standard(), |registry, (hint, widget)| {
                    registry.with(hint, widget)
                });
            let mut context = WalkContext::new(&widgets).with_options((&engine).into());
            if let Some(validation) = &validation {
                context = context.with_validation(validation);
            }

            let mut tracker = VariantTracker::new();
            let tree = walk(&document, &data, &mut tracker, &context);
            write_json(&tree, &output)?;
        }
        Commands::Diff {
            original,
            current,
            exit_code,
            output,
        } => {
            let original = read_json(&original, "original settings")?;
            let current = read_json(&current, "current settings")?;
            let changed: Vec<String> = changed_paths(&original, &current)
                .iter()
                .map(ToString::to_string)
                .collect();
            write_json(&changed, &output)?;

            if exit_code && !changed.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn read_json(path: &Path, what: &str) -> Result<Value> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {what} file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {what} from: {}", path.display()))
}

fn load_document(path: &Path, engine: &EngineArgs) -> Result<SchemaDocument> {
    let schema = read_json(path, "schema")?;
    SchemaDocument::from_value(&schema, &engine.into())
        .with_context(|| format!("Invalid schema document: {}", path.display()))
}

fn write_json<T: serde::Serialize>(val: &T, output: &OutputArgs) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = &output.output {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match output.format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
