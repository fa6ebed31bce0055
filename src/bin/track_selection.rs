//! Drive the sourcing coordinator against a JSON-seeded in-memory store
//!
//! Loads the user's simulation for a project, prints the reconciled view,
//! records a payment, then switches selections quickly to show that only
//! the latest selection lands.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

use financing_tracker::records::PaymentHistoryEntry;
use financing_tracker::sourcing::{fetch_documents, Session, SourcingState};
use financing_tracker::{EngineConfig, InMemoryStore, PaymentTracker, SourcingCoordinator};

#[derive(Parser)]
#[command(name = "track_selection", about = "Load and reconcile a user's project selection")]
struct Args {
    /// Store fixture (JSON)
    #[arg(long, default_value = "demos/store.json")]
    store: PathBuf,

    #[arg(long, default_value = "user-ana")]
    user: String,

    #[arg(long, default_value = "proj-torres")]
    project: String,

    /// Project to switch to while the first load is in flight
    #[arg(long, default_value = "proj-mirador")]
    switch_to: String,

    /// Fixed "today" (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let store = InMemoryStore::from_json_path(&args.store)
        .with_context(|| format!("loading store fixture {}", args.store.display()))?;

    let mut config = EngineConfig::default();
    if let Some(today) = args.today {
        config = config.with_reference_date(today);
    }
    let today = config.today();
    let mut coordinator = SourcingCoordinator::new(store, PaymentTracker::new(config));
    let session = Session::new(args.user.clone());

    println!("Financing Tracker - selection demo");
    println!("==================================\n");

    coordinator.load(session.select(&args.project)).await;
    print_state(coordinator.state());

    if coordinator.state().view().is_some() {
        let entry = PaymentHistoryEntry::paid_on(today, 2_150_000.0)
            .with_notes("registrado desde la demo");
        match coordinator.record_payment(entry).await {
            Ok(id) => {
                println!("Recorded payment {}", id);
                print_state(coordinator.state());
            }
            Err(e) => println!("Could not record payment: {}", e),
        }
    }

    // Two selections in quick succession; only the second may land
    let first = coordinator.select(session.select(&args.project));
    let second = coordinator.select(session.select(&args.switch_to));
    let store = coordinator.store_handle();
    let (first_outcome, second_outcome) = tokio::join!(
        fetch_documents(store.as_ref(), &first),
        fetch_documents(store.as_ref(), &second),
    );

    let second_applied = coordinator.resolve(&second, second_outcome);
    let first_applied = coordinator.resolve(&first, first_outcome);
    println!(
        "Switched selection: generation {} applied={}, generation {} applied={}\n",
        second.generation, second_applied, first.generation, first_applied
    );
    print_state(coordinator.state());

    Ok(())
}

fn print_state(state: &SourcingState) {
    match state {
        SourcingState::Ready(view) => {
            let report = &view.report;
            let name = view
                .project
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or(view.selection.project_id.as_str());
            println!("Project: {}", name);
            if let Some(summary) = &report.summary {
                println!("  Project value:      {:>16.0}", summary.project_value);
                println!("  Financed amount:    {:>16.0}", summary.financed_amount);
                println!("  Down payment:       {:>16.0}", summary.down_payment_required);
                println!("  Available:          {:>16.0}", summary.available_resources);
            }
            if let (Some(first), Some(last)) = (report.schedule.first(), report.schedule.last()) {
                println!(
                    "  Schedule:           {} periods, {} .. {}",
                    report.schedule.len(),
                    first.display_label(),
                    last.display_label()
                );
            }
            let r = &report.reconciliation;
            println!("  Monthly required:   {:>16.0}", r.monthly_required);
            println!("  Total paid:         {:>16.0}", r.total_paid);
            println!("  Total expected:     {:>16.0}", r.total_expected);
            println!("  Remaining balance:  {:>16.0}", r.remaining_balance);
            println!("  Progress:           {:>15.1}%", r.progress() * 100.0);
            for row in report.chart.rows().iter().take(6) {
                println!("    {:<10} {:>12} {:>12}", row.label, row.required, row.actual);
            }
            println!();
        }
        SourcingState::NotFound { selection, message } | SourcingState::Error { selection, message } => {
            println!("Project {}: {}\n", selection.project_id, message);
        }
        SourcingState::Loading { selection } => println!("Loading {}...\n", selection.project_id),
        SourcingState::Idle => println!("Nothing selected\n"),
    }
}
