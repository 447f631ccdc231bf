//! ML Builder CLI Module
//!
//! Command-line interface for serving the API, running pipelines offline
//! and profiling datasets.

use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::AppConfig;
use crate::data::{DatasetLoader, DatasetProfile};
use crate::pipeline::{ExecutorConfig, PipelineExecutor, PipelineRequest, PipelineResult, PipelineStep};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn bad(s: &str) -> ColoredString    { s.truecolor(235, 100, 100) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    println!("  {} {}", accent("›"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ml-builder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build and run tabular ML pipelines")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Server port (default: API_PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host (default: API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Directory holding uploaded datasets
        #[arg(long)]
        upload_dir: Option<PathBuf>,

        /// Directory model artifacts are written to
        #[arg(long)]
        models_dir: Option<PathBuf>,
    },

    /// Run a pipeline against an uploaded dataset and print the result
    Run {
        /// Dataset file name inside the upload directory
        #[arg(short, long)]
        dataset: String,

        /// JSON file with the steps: an array of steps or a full request
        #[arg(short, long)]
        steps: PathBuf,

        /// Directory holding uploaded datasets
        #[arg(long)]
        upload_dir: Option<PathBuf>,

        /// Directory model artifacts are written to
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the upload profile of a dataset file as JSON
    Profile {
        /// Input data file (CSV, JSON, or Parquet)
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Read steps from a JSON file holding either `[step, ...]` or a request
/// object with a `steps` field
pub fn read_steps(path: &Path) -> anyhow::Result<Vec<PipelineStep>> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;

    let steps = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(mut map) => match map.remove("steps") {
            Some(steps) => serde_json::from_value(steps)?,
            None => anyhow::bail!("{} has no \"steps\" field", path.display()),
        },
        _ => anyhow::bail!("{} must hold a JSON array of steps", path.display()),
    };
    Ok(steps)
}

pub fn cmd_run(
    dataset: &str,
    steps_path: &Path,
    upload_dir: Option<PathBuf>,
    models_dir: Option<PathBuf>,
    as_json: bool,
) -> anyhow::Result<()> {
    let defaults = AppConfig::default();
    let config = ExecutorConfig::new(
        upload_dir.unwrap_or(defaults.upload_dir),
        models_dir.unwrap_or(defaults.models_dir),
    );

    let steps = read_steps(steps_path)?;
    let request = PipelineRequest::new(dataset, steps);
    let executor = PipelineExecutor::new(config);

    if as_json {
        let result = executor.run(&request);
        println!("{}", serde_json::to_string_pretty(&result)?);
        return finish(&result);
    }

    section("Run");
    step_run(&format!("{} with {} steps", dataset.cyan(), request.steps.len()));
    let start = Instant::now();
    let result = executor.run(&request);

    println!();
    for line in &result.logs {
        println!("  {} {}", dim("│"), line);
    }

    section("Result");
    let status = if result.success { ok(&result.message) } else { bad(&result.message) };
    println!("  {:<20} {}", muted("Status"), status);
    for (key, value) in &result.metrics {
        println!("  {:<20} {}", muted(key), render_metric(value).white());
    }
    if let Some(path) = &result.model_path {
        println!("  {:<20} {}", muted("Artifact"), path.white().bold());
    }
    println!("  {:<20} {}", muted("Time"), format!("{:.3}s", start.elapsed().as_secs_f64()).white());
    println!();

    finish(&result)
}

fn finish(result: &PipelineResult) -> anyhow::Result<()> {
    if result.success {
        Ok(())
    } else {
        anyhow::bail!("pipeline run failed: {}", result.message)
    }
}

fn render_metric(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_object) => format!("{} entries", items.len()),
        other => other.to_string(),
    }
}

pub fn cmd_profile(data_path: &Path) -> anyhow::Result<()> {
    let df = DatasetLoader::load(data_path)?;
    let filename = data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let profile = DatasetProfile::from_frame(filename, &df)?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    upload_dir: Option<PathBuf>,
    models_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    use crate::server::run_server;

    let mut config = AppConfig::default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(dir) = upload_dir {
        config.upload_dir = dir;
    }
    if let Some(dir) = models_dir {
        config.models_dir = dir;
    }

    let base = format!("http://{}", config.bind_address());

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "ML Builder".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("API    ", &format!("{}/api", base)));
    line_box(&kv("Health ", &format!("{}/api/health", base)));
    line_box(&kv("Uploads", &config.upload_dir.display().to_string()));
    line_box(&kv("Models ", &config.models_dir.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}
