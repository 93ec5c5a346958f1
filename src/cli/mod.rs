//! Terminal front end for yieldcast.
//!
//! Provides subcommand handlers for:
//! - `yieldcast predict`: run one prediction cycle and render the result
//! - `yieldcast fields`: list the form schema
//! - `yieldcast health`: check the service and show effective settings
//! - `yieldcast history`: recent cycles from the diagnostics journal
//! - `yieldcast config show|init`: configuration management

use std::ops::ControlFlow;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use yieldcast::client::HttpPredictionClient;
use yieldcast::config;
use yieldcast::derive::{BalancePoint, DerivedSeries, TrendPoint};
use yieldcast::diagnostics::{CycleLogEntry, Journal};
use yieldcast::schema::{self, FormError, FormInput, Section};
use yieldcast::session::runtime::{Observer, Runtime, RuntimeOptions};
use yieldcast::session::{RequestState, Session};

/// Output format for commands that support machine-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// yieldcast predict
// ---------------------------------------------------------------------------

/// Run one prediction cycle with the given `FIELD=VALUE` overrides.
///
/// Returns `Ok(true)` when the cycle ended in Success.
pub fn run_predict(assignments: &[String], format: OutputFormat) -> Result<bool> {
    let mut form = FormInput::defaults();
    for assignment in assignments {
        let (field, value) = parse_assignment(assignment)?;
        form.set(field, value)
            .with_context(|| format!("invalid --set {assignment}"))?;
    }

    let cfg = config::load();
    let client = HttpPredictionClient::from_config(&cfg.service);
    let options = RuntimeOptions::from_config(&cfg, client.endpoint());

    let mut runtime = Runtime::with_form(Arc::new(client), options, form);
    let mut renderer = Renderer::new(format);

    runtime.handle().submit();
    runtime.run(&mut renderer);

    if let Some(err) = renderer.rejected {
        return Err(err).context("form is not ready to submit");
    }

    Ok(renderer.succeeded)
}

/// Split `FIELD=VALUE`.
fn parse_assignment(s: &str) -> Result<(&str, &str)> {
    let (field, value) = s
        .split_once('=')
        .with_context(|| format!("expected FIELD=VALUE, got `{s}`"))?;
    Ok((field.trim(), value.trim()))
}

/// Renders request states as they change and stops once a cycle settles.
struct Renderer {
    format: OutputFormat,
    succeeded: bool,
    rejected: Option<FormError>,
}

impl Renderer {
    fn new(format: OutputFormat) -> Self {
        Self {
            format,
            succeeded: false,
            rejected: None,
        }
    }
}

impl Observer for Renderer {
    fn on_change(&mut self, session: &Session) -> ControlFlow<()> {
        match session.state() {
            RequestState::Idle => {}
            RequestState::Pending => {
                if self.format == OutputFormat::Table {
                    println!("{}", "Running prediction...".green().italic());
                }
            }
            RequestState::Success(_) => {
                self.succeeded = true;
                if let Some(derived) = session.derived() {
                    match self.format {
                        OutputFormat::Table => print_success_table(&derived),
                        OutputFormat::Json => print_success_json(&derived),
                    }
                }
            }
            RequestState::Failure(info) => match self.format {
                OutputFormat::Table => {
                    println!("{} {}", "Error:".red().bold(), info.message.red());
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "error": info.message }));
                }
            },
        }

        if session.state().is_settled() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn on_rejected(&mut self, _session: &Session, error: &FormError) -> ControlFlow<()> {
        self.rejected = Some(error.clone());
        ControlFlow::Break(())
    }
}

fn print_success_table(derived: &DerivedSeries) {
    let h = &derived.headline;
    println!();
    println!("{}", "Yield Prediction".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {} {} {}",
        "Yield per hectare:".bold(),
        format_figure(h.yield_per_hectare).green().bold(),
        h.yield_unit
    );
    println!(
        "  {} {} {}  (for {} ha)",
        "Total yield:      ".bold(),
        format_figure(h.total_yield).bold(),
        h.yield_unit,
        format_figure(h.area_in_hectares)
    );
    println!();

    print_trend(&derived.trend, &h.yield_unit);
    println!();
    print_balance(&derived.balance);
}

fn print_trend(trend: &[TrendPoint], unit: &str) {
    println!("{}", "Yield Trend".bold().cyan());
    let max = trend.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    for (i, point) in trend.iter().enumerate() {
        let line = format!(
            "  {:<6} {:>10} {:<8} {}",
            point.label,
            format_figure(point.value),
            unit,
            bar(point.value, max, 30)
        );
        if i + 1 == trend.len() {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }
}

fn print_balance(balance: &[BalancePoint]) {
    println!("{}", "Soil Nutrient Balance".bold().cyan());
    println!(
        "  {:<12} {:>9} {:>9}  {}",
        "Nutrient", "Observed", "Reference", "Level"
    );
    println!("  {}", "-".repeat(58));
    for point in balance {
        let level = bar(point.observed, point.scale_max, 24);
        let line = format!(
            "  {:<12} {:>9} {:>9}  {}",
            point.nutrient,
            format_figure(point.observed),
            format_figure(point.reference),
            level
        );
        if point.observed < point.reference {
            println!("{}", line.yellow());
        } else {
            println!("{line}");
        }
    }
}

fn print_success_json(derived: &DerivedSeries) {
    match serde_json::to_string_pretty(derived) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to serialize result: {e}"),
    }
}

// ---------------------------------------------------------------------------
// yieldcast fields
// ---------------------------------------------------------------------------

/// List every form field grouped by section.
pub fn run_fields() -> Result<()> {
    println!("{}", "Crop Configuration".bold().cyan());
    println!("{}", "=".repeat(60));

    for section in Section::ALL {
        println!();
        println!("{}", section.to_string().to_uppercase().bold());
        for spec in schema::fields().iter().filter(|f| f.section == section) {
            let kind = if spec.is_numeric() {
                "number".to_string()
            } else {
                spec.choices().unwrap_or_default().join(" | ")
            };
            println!(
                "  {:<18} {:<18} default {:<8} {}",
                spec.name,
                spec.label.dimmed(),
                spec.default,
                kind.dimmed()
            );
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// yieldcast health
// ---------------------------------------------------------------------------

/// Check the prediction service and print the effective settings.
pub fn run_health() -> Result<()> {
    let cfg = config::load();
    let client = HttpPredictionClient::from_config(&cfg.service);

    println!("{}", "yieldcast Health Check".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    println!("{}", "Service".bold());
    println!("  Endpoint:     {}", client.endpoint());
    match client.timeout() {
        Some(t) => println!("  Timeout:      {} ms", t.as_millis()),
        None => println!("  Timeout:      {}", "none".dimmed()),
    }
    match client.health() {
        Ok(status) => println!("  Status:       {}", status.green()),
        Err(e) => println!("  Status:       {} ({})", "unreachable".red(), e.kind()),
    }
    println!();

    println!("{}", "Pacing".bold());
    println!("  Min pending:  {} ms", cfg.pacing.min_pending_ms);
    println!();

    println!("{}", "Configuration".bold());
    print_config_path("Global", config::global_config_file());
    print_config_path("Project", config::project_config_file());
    println!();

    println!("{}", "Diagnostics".bold());
    if cfg.logging.enabled {
        match Journal::default_location() {
            Some(journal) => {
                let count = journal.read_all().len();
                println!("  Journal:      {} ({count} entries)", journal.path().display());
            }
            None => println!("  Journal:      {}", "no home directory".yellow()),
        }
    } else {
        println!("  Journal:      {}", "disabled".dimmed());
    }

    Ok(())
}

fn print_config_path(label: &str, path: Option<std::path::PathBuf>) {
    match path {
        Some(p) if p.exists() => println!("  {label:<13} {} {}", p.display(), "(found)".green()),
        Some(p) => println!("  {label:<13} {} {}", p.display(), "(not found)".dimmed()),
        None => println!("  {label:<13} {}", "unavailable".yellow()),
    }
}

// ---------------------------------------------------------------------------
// yieldcast history
// ---------------------------------------------------------------------------

/// Show recent prediction cycles from the journal.
pub fn run_history(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let journal = Journal::default_location().context("could not determine home directory")?;
    let entries = journal.read_since_days(days);

    if entries.is_empty() {
        println!(
            "{}",
            "No history yet. Run `yieldcast predict` to record a cycle.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Table => print_history_table(&entries),
    }

    Ok(())
}

fn print_history_table(entries: &[CycleLogEntry]) {
    let successes = entries.iter().filter(|e| e.is_success()).count();
    println!("{}", "Prediction History".bold().cyan());
    println!("{}", "=".repeat(76));
    println!(
        "  {} {}   {} {}",
        "Cycles:".bold(),
        entries.len(),
        "Succeeded:".bold(),
        successes
    );
    println!();
    println!(
        "  {:<20} {:<10} {:<10} {:>12} {:>8}  Detail",
        "Time", "Outcome", "Crop", "Yield/ha", "Latency"
    );
    println!("  {}", "-".repeat(74));

    for entry in entries.iter().rev().take(25) {
        let time = entry.timestamp.get(..19).unwrap_or(entry.timestamp.as_str()).replace('T', " ");
        let crop = entry.crop_type.as_deref().unwrap_or("-");
        let yield_ha = entry
            .yield_per_hectare
            .map(|y| format!("{} {}", format_figure(y), entry.yield_unit.as_deref().unwrap_or("")))
            .unwrap_or_else(|| "-".to_string());
        let detail = entry.failure_kind.as_deref().unwrap_or("");

        let line = format!(
            "  {:<20} {:<10} {:<10} {:>12} {:>6}ms  {}",
            time, entry.outcome, crop, yield_ha, entry.latency_ms, detail
        );
        if entry.is_success() {
            println!("{line}");
        } else {
            println!("{}", line.red());
        }
    }
}

// ---------------------------------------------------------------------------
// yieldcast config
// ---------------------------------------------------------------------------

pub fn run_config_show() -> Result<()> {
    println!("{}", config::show_effective_config()?);
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Up to three decimals, trailing zeros dropped.
fn format_figure(value: f64) -> String {
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Horizontal bar of `value / max` scaled to `width` cells.
fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let filled = ((value / max).clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
