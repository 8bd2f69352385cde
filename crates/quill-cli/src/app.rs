//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use quill_core::{locate, Census, Renderer, RendererConfig};
use quill_odf::{OdfArchive, XmlDocument};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::Level;

/// Output format for field listings
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about = "OpenDocument templates with Jinja syntax", long_about = None)]
struct Cli {
    /// Increase logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template (.odt or .fodt) with data
    Render {
        /// Template file
        template: PathBuf,

        /// Output file (defaults to <template>-rendered.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON or TOML file with template values
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Extra value as KEY=VALUE, overriding the data file
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Renderer configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory images are loaded from
        #[arg(long)]
        media_path: Option<PathBuf>,
    },

    /// List the template fields of a document and where they will be placed
    Fields {
        /// Template file
        template: PathBuf,

        /// Renderer configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Options of the render command
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub template: PathBuf,
    pub output: Option<PathBuf>,
    pub data: Option<PathBuf>,
    pub vars: Vec<String>,
    pub config: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            template,
            output,
            data,
            vars,
            config,
            media_path,
        } => {
            let options = RenderOptions {
                template,
                output,
                data,
                vars,
                config,
                media_path,
            };
            let written = render_command(&options)?;
            println!("Rendered: {}", written.display());
        }
        Commands::Fields {
            template,
            config,
            format,
        } => {
            let report = fields_command(&template, config.as_deref())?;
            print_fields(&report, format)?;
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the render command, returning the path written
pub fn render_command(options: &RenderOptions) -> Result<PathBuf> {
    let template_path = &options.template;
    if !template_path.exists() {
        bail!("Template file not found: {}", template_path.display());
    }

    let mut config = load_config(options.config.as_deref())?;
    if let Some(media_path) = &options.media_path {
        config.media.path = Some(media_path.clone());
    } else if config.media.path.is_none() {
        config.media.path = template_path.parent().map(Path::to_path_buf);
    }

    let mut context = match &options.data {
        Some(path) => load_data(path)?,
        None => Map::new(),
    };
    for var in &options.vars {
        let (key, value) = parse_var(var)?;
        context.insert(key, value);
    }

    let template = fs::read(template_path)
        .with_context(|| format!("Failed to read template: {}", template_path.display()))?;
    let renderer = Renderer::with_config(config).context("Invalid renderer configuration")?;

    tracing::info!(template = %template_path.display(), values = context.len(), "rendering");
    let rendered = if is_flat(template_path) {
        renderer.render_flat(&template, &context)
    } else {
        renderer.render(&template, &context)
    }
    .with_context(|| format!("Failed to render template: {}", template_path.display()))?;

    let output_path = options
        .output
        .clone()
        .unwrap_or_else(|| default_output(template_path));
    fs::write(&output_path, rendered)
        .with_context(|| format!("Failed to write output: {}", output_path.display()))?;

    Ok(output_path)
}

/// One field as reported by the fields command
#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub part: String,
    pub content: String,
    pub kind: &'static str,
    pub hint: Option<String>,
    /// Element the tag replaces, or the error that prevents placement
    pub placement: String,
}

/// Execute the fields command
pub fn fields_command(template_path: &Path, config: Option<&Path>) -> Result<Vec<FieldReport>> {
    if !template_path.exists() {
        bail!("Template file not found: {}", template_path.display());
    }

    let config = load_config(config)?;
    let renderer = Renderer::with_config(config).context("Invalid renderer configuration")?;
    let bytes = fs::read(template_path)
        .with_context(|| format!("Failed to read template: {}", template_path.display()))?;

    let parts: Vec<(String, Vec<u8>)> = if is_flat(template_path) {
        vec![(quill_core::job::FLAT_PART.to_string(), bytes)]
    } else {
        let archive = OdfArchive::from_bytes(&bytes)
            .with_context(|| format!("Failed to open package: {}", template_path.display()))?;
        renderer
            .config()
            .render
            .parts
            .iter()
            .filter_map(|name| archive.get(name).map(|data| (name.clone(), data.to_vec())))
            .collect()
    };

    let mut report = Vec::new();
    for (part, data) in parts {
        let doc = XmlDocument::parse(&data).with_context(|| format!("Invalid XML in {part}"))?;
        let fields = renderer
            .scanner()
            .scan(&doc)
            .with_context(|| format!("Malformed template in {part}"))?;
        let census = Census::take(&doc, &fields);

        for field in &fields {
            let placement = match locate(&doc, field, &census) {
                Ok(placement) => {
                    let target = doc.name(placement.target).unwrap_or("?");
                    let mode = if placement.wrapped {
                        "wrap"
                    } else if placement.after {
                        "after"
                    } else if placement.keep_target {
                        "before"
                    } else {
                        "replace"
                    };
                    format!("{mode} {target}")
                }
                Err(fault) => format!("error: {fault}"),
            };
            report.push(FieldReport {
                part: part.clone(),
                content: field.content.clone(),
                kind: field.kind.as_str(),
                hint: field.hint.clone(),
                placement,
            });
        }
    }

    Ok(report)
}

fn print_fields(report: &[FieldReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if report.is_empty() {
                println!("No template fields found.");
            }
            for field in report {
                println!(
                    "{}: {} [{}{}] -> {}",
                    field.part,
                    field.content,
                    field.kind,
                    field
                        .hint
                        .as_deref()
                        .map(|h| format!(", hint: {h}"))
                        .unwrap_or_default(),
                    field.placement
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RendererConfig> {
    let Some(path) = path else {
        return Ok(RendererConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    RendererConfig::from_toml_str(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load template values from a JSON or TOML file
pub fn load_data(path: &Path) -> Result<Map<String, Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;

    let value: Value = match extension(path).as_deref() {
        Some("toml") => toml::from_str(&text)
            .with_context(|| format!("Failed to parse TOML data: {}", path.display()))?,
        _ => serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON data: {}", path.display()))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("Data file must contain a table of values: {}", path.display()),
    }
}

/// Split `KEY=VALUE`; values that parse as JSON keep their type
pub fn parse_var(var: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = var.split_once('=') else {
        bail!("Expected KEY=VALUE, got '{var}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Empty key in '{var}'");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn is_flat(path: &Path) -> bool {
    extension(path).as_deref() == Some("fodt")
}

fn default_output(template: &Path) -> PathBuf {
    let stem = template
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let ext = extension(template).unwrap_or_else(|| "odt".to_string());
    template.with_file_name(format!("{stem}-rendered.{ext}"))
}
