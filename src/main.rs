//! Financing Tracker CLI
//!
//! Summaries, schedules, reconciliations and charts for simulation records
//! stored as JSON files.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use financing_tracker::records::{load_history, load_json, load_projects, load_simulations};
use financing_tracker::tracker::Fallbacks;
use financing_tracker::{EngineConfig, Locale, PaymentTracker, TrackerCase, TrackerReport};

/// Housing financing projection and reconciliation
#[derive(Parser)]
#[command(name = "financing-tracker", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Locale for period labels (es-CO, en-US)
    #[arg(long, global = true)]
    locale: Option<Locale>,

    /// Fixed "today" for reproducible runs (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalized financial summary of a simulation
    Summary(CaseArgs),
    /// Projected month-by-month installments
    Schedule(CaseArgs),
    /// Paid, expected and outstanding totals against payment history
    Reconcile(CaseArgs),
    /// Period table of required versus actual payments
    Chart(CaseArgs),
    /// Reports for many cases in parallel
    Batch(BatchArgs),
}

#[derive(Args)]
struct CaseArgs {
    /// Simulation JSON file (single record or array)
    #[arg(long)]
    simulations: Option<PathBuf>,

    /// Simulation to use from the file (default: the first)
    #[arg(long)]
    simulation_id: Option<String>,

    /// Project JSON file, searched for the simulation's project
    #[arg(long)]
    projects: Option<PathBuf>,

    /// Payment history file (JSON or CSV)
    #[arg(long)]
    history: Option<PathBuf>,

    /// Monthly installment when no simulation is given
    #[arg(long)]
    monthly_payment: Option<f64>,

    /// Remaining installments when no simulation is given
    #[arg(long)]
    remaining_months: Option<u32>,
}

#[derive(Args)]
struct BatchArgs {
    /// JSON array of cases: {simulation, project, history, fallbacks}
    #[arg(long)]
    cases: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
    Csv,
}

/// Rendered command result: JSON document plus a header-first row table
struct Output {
    json: Value,
    rows: Vec<Vec<String>>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.locale, cli.today)?;
    let tracker = PaymentTracker::new(config);

    let output = match cli.command {
        Commands::Summary(args) => {
            let report = tracker.report_case(&load_case(&args)?);
            let Some(summary) = report.summary else {
                bail!("summary needs a simulation (--simulations)");
            };
            let json = serde_json::to_value(&summary)?;
            Output {
                rows: key_value_rows(&json),
                json,
            }
        }
        Commands::Schedule(args) => {
            let case = load_case(&args)?;
            if case.simulation.is_none() {
                bail!("schedule needs a simulation (--simulations)");
            }
            let schedule = tracker.report_case(&case).schedule;
            let mut rows = vec![vec!["Period".to_string(), "Required payment".to_string()]];
            rows.extend(
                schedule
                    .iter()
                    .map(|period| vec![period.display_label(), period.required.to_string()]),
            );
            Output {
                json: serde_json::to_value(&schedule)?,
                rows,
            }
        }
        Commands::Reconcile(args) => {
            let reconciliation = tracker.report_case(&load_case(&args)?).reconciliation;
            let mut json = serde_json::to_value(reconciliation)?;
            if let Value::Object(map) = &mut json {
                map.insert("progress".to_string(), reconciliation.progress().into());
            }
            Output {
                rows: key_value_rows(&json),
                json,
            }
        }
        Commands::Chart(args) => {
            let chart = tracker.report_case(&load_case(&args)?).chart;
            if let OutputFormat::Csv = cli.format {
                chart.write_csv(io::stdout().lock())?;
                return Ok(());
            }
            let table = chart.to_table();
            Output {
                rows: table.iter().map(|row| row.iter().map(cell).collect()).collect(),
                json: Value::Array(table.into_iter().map(Value::Array).collect()),
            }
        }
        Commands::Batch(args) => {
            let cases: Vec<TrackerCase> = load_json(&args.cases)
                .with_context(|| format!("loading cases from {}", args.cases.display()))?;
            log::info!("reconciling {} cases", cases.len());
            let reports = tracker.report_batch(&cases);
            Output {
                json: serde_json::to_value(&reports)?,
                rows: batch_rows(&reports),
            }
        }
    };

    emit(cli.format, &output)
}

fn load_config(path: Option<&Path>, locale: Option<Locale>, today: Option<NaiveDate>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_json_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(locale) = locale {
        config = config.with_locale(locale);
    }
    if let Some(today) = today {
        config = config.with_reference_date(today);
    }
    Ok(config)
}

fn load_case(args: &CaseArgs) -> Result<TrackerCase> {
    let simulation = match &args.simulations {
        Some(path) => {
            let simulations = load_simulations(path)
                .with_context(|| format!("loading simulations from {}", path.display()))?;
            let found = match &args.simulation_id {
                Some(id) => simulations.into_iter().find(|s| s.id.as_deref() == Some(id.as_str())),
                None => simulations.into_iter().next(),
            };
            match found {
                Some(simulation) => Some(simulation),
                None => bail!("no matching simulation in {}", path.display()),
            }
        }
        None => None,
    };

    let project = match (&args.projects, &simulation) {
        (Some(path), Some(simulation)) => load_projects(path)
            .with_context(|| format!("loading projects from {}", path.display()))?
            .into_iter()
            .find(|p| p.id == simulation.project_id),
        _ => None,
    };

    let history = match &args.history {
        Some(path) => load_history(path)
            .with_context(|| format!("loading payment history from {}", path.display()))?,
        None => Vec::new(),
    };

    Ok(TrackerCase {
        simulation,
        project,
        history,
        fallbacks: Fallbacks {
            monthly_payment: args.monthly_payment,
            remaining_months: args.remaining_months,
        },
    })
}

fn key_value_rows(json: &Value) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["Field".to_string(), "Value".to_string()]];
    if let Value::Object(map) = json {
        rows.extend(map.iter().map(|(key, value)| vec![key.clone(), cell(value)]));
    }
    rows
}

fn batch_rows(reports: &[TrackerReport]) -> Vec<Vec<String>> {
    let mut rows = vec![[
        "Simulation",
        "Monthly required",
        "Total paid",
        "Total expected",
        "Remaining balance",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect::<Vec<_>>()];

    for report in reports {
        let r = &report.reconciliation;
        rows.push(vec![
            report.simulation_id.clone().unwrap_or_default(),
            format!("{:.0}", r.monthly_required),
            format!("{:.0}", r.total_paid),
            format!("{:.0}", r.total_expected),
            format!("{:.0}", r.remaining_balance),
        ]);
    }
    rows
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn emit(format: OutputFormat, output: &Output) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output.json)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            for row in &output.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => print_table(&output.rows),
    }
    Ok(())
}

fn print_table(rows: &[Vec<String>]) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    for (n, row) in rows.iter().enumerate() {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect();
        println!("{}", line.join("  ").trim_end());
        if n == 0 {
            let total = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
            println!("{}", "-".repeat(total));
        }
    }
}
