//! retouch: command-line shell for the photo editing core.
//!
//! Loads an image, applies a sequence of tools (with undo/redo between
//! them), optionally sends chat messages through the configured AI
//! gateway, and exports the displayed image. Useful for:
//!
//! - Checking filter output without a browser
//! - Timing individual tools on large images
//! - Exercising an AI backend end to end
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin retouch -- [OPTIONS] <IMAGE_PATH>
//! retouch photo.jpg --step sharpen:amount=80,radius=2 --step undo --step enhance -o out/
//! retouch photo.jpg --settings settings.json --check-gateway --json
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use retouch_export::{DEFAULT_QUALITY, ExportOptions, estimated_size_kb};
use retouch_gateway::{Capabilities, HttpGateway};
use retouch_pipeline::upload::mime_from_file_name;
use retouch_pipeline::{
    ChatOutcome, EditReport, EditorConfig, EditorError, ErrorKind, FilterParams, ImageFormat,
    Session, Settings, Upload,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Apply editing tools to an image and export the result.
#[derive(Parser)]
#[command(name = "retouch", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, WebP).
    image_path: PathBuf,

    /// Edit step, applied in order: `TOOL[:NAME=VALUE,...]`, `undo`, or `redo`.
    ///
    /// Tools: sharpen, denoise, contrast, exposure, color-correct,
    /// red-eye, auto-enhance.
    #[arg(long = "step", short = 's')]
    steps: Vec<Step>,

    /// Chat message sent after all steps; editing requests are applied.
    #[arg(long = "chat")]
    messages: Vec<String>,

    /// Settings JSON (`apiKey`, `apiProvider`, `localModelPath`,
    /// `localModelType`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Base URL of the AI backend.
    #[arg(long, default_value = retouch_gateway::DEFAULT_BASE_URL)]
    gateway_url: String,

    /// Query the AI backend's health and capabilities before editing.
    #[arg(long)]
    check_gateway: bool,

    /// Directory to export the displayed image into.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Export format.
    #[arg(long, value_enum, default_value_t = Format::Png)]
    format: Format,

    /// Export quality for JPEG (10-100).
    #[arg(long, default_value_t = DEFAULT_QUALITY, value_parser = quality_parser())]
    quality: u8,

    /// Export file name, without extension.
    #[arg(long, default_value = retouch_export::DEFAULT_FILENAME)]
    filename: String,

    /// Output a JSON report instead of human-readable lines.
    #[arg(long)]
    json: bool,
}

fn quality_parser() -> clap::builder::RangedU64ValueParser<u8> {
    let min = u64::from(retouch_export::MIN_QUALITY);
    let max = u64::from(retouch_export::MAX_QUALITY);
    clap::builder::RangedU64ValueParser::new().range(min..=max)
}

/// Export format selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Lossless PNG.
    Png,
    /// Lossy JPEG (alpha is dropped).
    Jpeg,
    /// Lossless WebP.
    Webp,
}

impl From<Format> for ImageFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Png => Self::Png,
            Format::Jpeg => Self::Jpeg,
            Format::Webp => Self::WebP,
        }
    }
}

/// One `--step` argument.
#[derive(Clone, Debug, PartialEq)]
enum Step {
    /// Apply a tool with parameters.
    Tool { id: String, params: FilterParams },
    /// Step back in history.
    Undo,
    /// Step forward in history.
    Redo,
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "undo" => return Ok(Self::Undo),
            "redo" => return Ok(Self::Redo),
            "" => return Err("empty step".into()),
            _ => {}
        }
        let (id, params) = s.split_once(':').unwrap_or((s, ""));
        let params = params
            .split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("expected NAME=VALUE, got {pair:?}"))?;
                let value: f64 = value
                    .trim()
                    .parse()
                    .map_err(|e| format!("invalid value for {}: {e}", name.trim()))?;
                Ok((name.trim().to_string(), value))
            })
            .collect::<Result<FilterParams, String>>()?;
        Ok(Self::Tool {
            id: id.trim().to_string(),
            params,
        })
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tool { id, .. } => f.write_str(id),
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
        }
    }
}

/// What one step or chat message did.
#[derive(Debug, Serialize)]
struct StepReport {
    step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    edit: Option<EditReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    history_index: Option<usize>,
}

/// Where the displayed image was written.
#[derive(Debug, Serialize)]
struct ExportReport {
    path: PathBuf,
    bytes: usize,
    estimated_kb: u64,
}

/// What the AI backend reported, for `--check-gateway`.
#[derive(Debug, Serialize)]
struct GatewayReport {
    base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<Capabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Everything the run did, for `--json`.
#[derive(Debug, Serialize)]
struct RunReport {
    file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gateway: Option<GatewayReport>,
    steps: Vec<StepReport>,
    history_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<ExportReport>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let report = match run(&cli) {
        Ok(report) => report,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&report);
    }

    ExitCode::SUCCESS
}

fn load_settings(path: Option<&Path>) -> Result<Settings, String> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    Settings::from_json(&json).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn load_upload(path: &Path) -> Result<Upload, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    let mime = mime_from_file_name(&file_name);
    Upload::new(file_name, mime, &bytes).map_err(|e| format!("Error loading image: {e}"))
}

/// Run one history step, treating a boundary undo/redo as a no-op.
fn history_step(result: Result<(), EditorError>) -> Result<Option<String>, EditorError> {
    match result {
        Ok(()) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NoOp => Ok(Some(e.to_string())),
        Err(e) => Err(e),
    }
}

/// Ask the backend at `base_url` whether it is up and what it supports.
///
/// An unreachable or failing backend is reported, not treated as fatal:
/// client-side tools work without it.
fn check_gateway(base_url: &str, settings: &Settings) -> Result<GatewayReport, String> {
    let gateway = HttpGateway::new(base_url, &settings.api_key)
        .map_err(|e| format!("Error creating AI gateway: {e}"))?;
    let status = gateway.health().and_then(|()| gateway.capabilities());
    info!(
        base_url = gateway.base_url(),
        ok = status.is_ok(),
        "gateway checked"
    );
    let (capabilities, error) = match status {
        Ok(capabilities) => (Some(capabilities), None),
        Err(e) => (None, Some(e.to_string())),
    };
    Ok(GatewayReport {
        base_url: gateway.base_url().to_string(),
        capabilities,
        error,
    })
}

fn run(cli: &Cli) -> Result<RunReport, String> {
    let settings = load_settings(cli.settings.as_deref())?;
    let gateway_report = if cli.check_gateway {
        Some(check_gateway(&cli.gateway_url, &settings)?)
    } else {
        None
    };
    let gateway = retouch_gateway::gateway_from_settings(&settings, &cli.gateway_url)
        .map_err(|e| format!("Error creating AI gateway: {e}"))?;
    let upload = load_upload(&cli.image_path)?;
    let file_name = upload.file_name().to_string();
    info!(
        %file_name,
        steps = cli.steps.len(),
        messages = cli.messages.len(),
        "starting session"
    );

    let mut session = Session::new(EditorConfig::with_settings(settings), gateway);
    session.load_upload(upload);

    let mut steps = Vec::with_capacity(cli.steps.len() + cli.messages.len());
    for step in &cli.steps {
        let mut report = StepReport {
            step: step.to_string(),
            edit: None,
            reply: None,
            note: None,
            history_index: None,
        };
        match step {
            Step::Tool { id, params } => {
                report.edit = Some(
                    session
                        .apply_tool(id, params)
                        .map_err(|e| format!("Error applying {id}: {e}"))?,
                );
            }
            Step::Undo => {
                report.note = history_step(session.undo().map(|_| ()))
                    .map_err(|e| format!("Error undoing: {e}"))?;
            }
            Step::Redo => {
                report.note = history_step(session.redo().map(|_| ()))
                    .map_err(|e| format!("Error redoing: {e}"))?;
            }
        }
        report.history_index = session.history().index();
        steps.push(report);
    }

    for message in &cli.messages {
        let outcome = session
            .send_message(message)
            .map_err(|e| format!("Error sending chat message: {e}"))?;
        let (edit, reply) = match outcome {
            ChatOutcome::Edited(edit) => (Some(edit), None),
            ChatOutcome::Reply(reply) => (None, Some(reply)),
        };
        steps.push(StepReport {
            step: format!("chat: {message}"),
            edit,
            reply,
            note: None,
            history_index: session.history().index(),
        });
    }

    let export = match cli.output {
        Some(ref dir) => Some(export_image(&session, cli, dir)?),
        None => None,
    };

    Ok(RunReport {
        file_name,
        gateway: gateway_report,
        steps,
        history_len: session.history().len(),
        export,
    })
}

fn export_image(session: &Session, cli: &Cli, dir: &Path) -> Result<ExportReport, String> {
    let image = session
        .image()
        .ok_or_else(|| "Error exporting: no image loaded".to_string())?;
    let options = ExportOptions {
        format: cli.format.into(),
        quality: cli.quality,
        filename: cli.filename.clone(),
    };
    let file = retouch_export::export(image, &options)
        .map_err(|e| format!("Error exporting: {e}"))?;
    std::fs::create_dir_all(dir).map_err(|e| format!("Error creating {}: {e}", dir.display()))?;
    let path = dir.join(&file.file_name);
    std::fs::write(&path, &file.bytes)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    Ok(ExportReport {
        path,
        bytes: file.bytes.len(),
        estimated_kb: estimated_size_kb(
            image.dimensions(),
            options.format,
            options.clamped_quality(),
        ),
    })
}

fn print_report(report: &RunReport) {
    println!("Image: {}", report.file_name);
    if let Some(ref gateway) = report.gateway {
        match (&gateway.capabilities, &gateway.error) {
            (Some(capabilities), _) => println!(
                "Gateway {}: ok, AI operations: {}",
                gateway.base_url,
                capabilities.ai_powered.join(", "),
            ),
            (None, Some(error)) => println!("Gateway {}: {error}", gateway.base_url),
            (None, None) => println!("Gateway {}: unknown", gateway.base_url),
        }
    }
    for step in &report.steps {
        let position = step
            .history_index
            .map_or_else(|| "-".to_string(), |i| (i + 1).to_string());
        match (&step.edit, &step.reply, &step.note) {
            (Some(edit), _, _) => println!(
                "{:<24} {:>10.3}ms  {}x{}  [{position}/{}]",
                step.step,
                edit.duration.as_secs_f64() * 1000.0,
                edit.dimensions.width,
                edit.dimensions.height,
                report.history_len,
            ),
            (None, Some(reply), _) => println!("{:<24} reply: {reply}", step.step),
            (None, None, Some(note)) => println!("{:<24} {note}", step.step),
            (None, None, None) => println!("{:<24} [{position}/{}]", step.step, report.history_len),
        }
    }
    if let Some(ref export) = report.export {
        println!(
            "Exported {} ({} bytes, estimated {} KB)",
            export.path.display(),
            export.bytes,
            export.estimated_kb,
        );
    }
}
