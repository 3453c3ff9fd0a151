// Entry point of the schedule sync tool.
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the requested command
//
// Commands:
//   schedule-sync [reconcile]
//   schedule-sync append <JOB_NUMBER> <CUSTOMER> [ASSIGNEE] [--next-month]

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use clap::{Parser, Subcommand};

use schedule_sync::core::jobs::{build_candidate_table, JobSource, ScheduleColumnMap};
use schedule_sync::core::schedule::{
    payment_due_date, ScheduleConfig, ScheduleEntry, ScheduleService, SpreadsheetStore,
};
use schedule_sync::infra::google_sheets::{GoogleSheetsClient, ServiceAccountAuth};
use schedule_sync::infra::jobs::JsonJobSource;

const DEFAULT_JOBS_FILE: &str = "data/jobs.json";
const DEFAULT_CLIENT: &str = "ミスミ";

/// Keeps the shared schedule sheet in step with computed job data
#[derive(Parser, Debug)]
#[command(name = "schedule-sync")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Fill empty schedule cells from the job records (default)
    Reconcile,

    /// Add a new job as the last row of the schedule
    Append {
        job_number: String,
        customer: String,
        assignee: Option<String>,

        /// Payment falls due one month later than usual
        #[arg(long)]
        next_month: bool,
    },
}

async fn reconcile<S: SpreadsheetStore>(service: &ScheduleService<S>) -> Result<()> {
    let jobs_file =
        std::env::var("SCHEDULE_JOBS_FILE").unwrap_or_else(|_| DEFAULT_JOBS_FILE.to_string());
    let records = JsonJobSource::new(&jobs_file)
        .load_jobs()
        .await
        .with_context(|| format!("Failed to load job records from {jobs_file}"))?;

    let candidate = build_candidate_table(&records, &ScheduleColumnMap::default());
    tracing::info!(jobs = records.len(), rows = candidate.len(), "Built candidate table");

    let report = service
        .reconcile(&candidate)
        .await
        .context("Failed to reconcile the schedule")?;

    for update in &report.updates {
        tracing::debug!(cell = %update.address, value = %update.value, "Filled");
    }
    tracing::info!(
        updates = report.updates.len(),
        updated_cells = report.updated_cells,
        "Done"
    );
    Ok(())
}

async fn append<S: SpreadsheetStore>(
    service: &ScheduleService<S>,
    job_number: String,
    customer: String,
    assignee: String,
    next_month: bool,
) -> Result<()> {
    let today = Utc::now().with_timezone(&Tokyo).date_naive();
    let payment_due = payment_due_date(today, service.config().payment_day, next_month)
        .context("Could not compute the payment due date")?;

    let entry = ScheduleEntry {
        client: DEFAULT_CLIENT.to_string(),
        job_number,
        assignee,
        start_date: today,
        payment_due,
        customer,
    };

    let response = service
        .append_entry(&entry)
        .await
        .context("Failed to append the schedule entry")?;
    tracing::info!(range = %response.updates.updated_range, "Appended");
    Ok(())
}

async fn run(command: Command) -> Result<()> {
    let config = ScheduleConfig::from_env().context("Invalid schedule configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    let auth = ServiceAccountAuth::from_env()
        .await
        .context("Failed to load Google service account credentials")?;
    tracing::info!(client_email = %auth.client_email(), "Using service account");

    let client = GoogleSheetsClient::new(auth, config.spreadsheet_id.clone());
    let service = ScheduleService::new(client, config);

    match command {
        Command::Reconcile => reconcile(&service).await,
        Command::Append {
            job_number,
            customer,
            assignee,
            next_month,
        } => {
            append(
                &service,
                job_number,
                customer,
                assignee.unwrap_or_default(),
                next_month,
            )
            .await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    if let Err(e) = run(cli.command.unwrap_or(Command::Reconcile)).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
