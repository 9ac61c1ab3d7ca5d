use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use medmonitor_core::{
    Config, Database, DoseAction, DoseOutcome, DosingService, HistoryExporter, MedicationForm,
    Reminder, ReminderPoller, UserForm,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "medmonitor")]
#[command(about = "Medication inventory, dose history and reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a user profile
    AddUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: String,
    },

    /// Add a medication for a user
    AddMedication {
        #[command(flatten)]
        fields: MedicationArgs,
    },

    /// Replace the details of an existing medication
    UpdateMedication {
        medication_id: i64,
        #[command(flatten)]
        fields: MedicationArgs,
    },

    /// Search users by name (case-insensitive substring)
    Search { query: String },

    /// List a user's medications
    List { user_id: i64 },

    /// Record that a dose was taken
    Take {
        medication_id: i64,
        /// Pills consumed (defaults to dosing.default_quantity)
        #[arg(long)]
        quantity: Option<i64>,
    },

    /// Record that a dose was postponed
    Postpone { medication_id: i64 },

    /// Record that a dose was skipped
    Skip { medication_id: i64 },

    /// Show the dose history of a medication
    History { medication_id: i64 },

    /// Export dose history
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Only this user's medications
        #[arg(long)]
        user: Option<i64>,
    },

    /// Poll for due medications and print reminders
    Watch {
        /// Seconds between polls (defaults to reminders.poll_interval_secs)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Poll once and exit
        #[arg(long)]
        once: bool,
    },
}

#[derive(clap::Args)]
struct MedicationArgs {
    #[arg(long)]
    user_id: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    dose: String,
    /// Time of day as HH:MM
    #[arg(long)]
    timing: String,
    #[arg(long, default_value = "")]
    inventory: String,
    #[arg(long, default_value = "")]
    refill_threshold: String,
}

impl From<MedicationArgs> for MedicationForm {
    fn from(args: MedicationArgs) -> Self {
        MedicationForm {
            user_id: args.user_id,
            medication_name: args.name,
            dose: args.dose,
            timing: args.timing,
            inventory_count: args.inventory,
            refill_threshold: args.refill_threshold,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    // Initialize logging
    medmonitor_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };
    let db_path = cli.db.unwrap_or_else(|| config.data.db_path.clone());
    let db = open_database(&db_path)?;

    match cli.command {
        Commands::AddUser { name, age } => cmd_add_user(&db, name, age),
        Commands::AddMedication { fields } => cmd_add_medication(&db, fields.into()),
        Commands::UpdateMedication {
            medication_id,
            fields,
        } => cmd_update_medication(&db, medication_id, fields.into()),
        Commands::Search { query } => cmd_search(&db, &query),
        Commands::List { user_id } => cmd_list(&db, user_id),
        Commands::Take {
            medication_id,
            quantity,
        } => cmd_dose(&db, &config, medication_id, DoseAction::Taken, quantity),
        Commands::Postpone { medication_id } => {
            cmd_dose(&db, &config, medication_id, DoseAction::Postponed, None)
        }
        Commands::Skip { medication_id } => {
            cmd_dose(&db, &config, medication_id, DoseAction::Skipped, None)
        }
        Commands::History { medication_id } => cmd_history(&db, medication_id),
        Commands::Export { format, user } => cmd_export(&db, format, user),
        Commands::Watch { interval, once } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.reminders.poll_interval());
            cmd_watch(&db, interval, once)
        }
    }
}

/// Open the database, creating its directory and schema as needed.
fn open_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Database::open(path).with_context(|| format!("failed to open database {}", path.display()))
}

fn cmd_add_user(db: &Database, name: String, age: String) -> Result<()> {
    let user = UserForm::new(name, age).validate()?;
    let id = db.insert_user(&user)?;
    println!("Added user {} ({})", id, user.name());
    Ok(())
}

fn cmd_add_medication(db: &Database, form: MedicationForm) -> Result<()> {
    let medication = form.validate()?;
    if db.get_user(medication.user_id())?.is_none() {
        tracing::warn!(user_id = medication.user_id(), "medication added for unknown user");
    }
    let id = db.insert_medication(&medication)?;
    println!(
        "Added medication {} ({}) for user {}",
        id,
        medication.medication_name(),
        medication.user_id()
    );
    Ok(())
}

fn cmd_update_medication(db: &Database, medication_id: i64, form: MedicationForm) -> Result<()> {
    let medication = form.validate()?;
    if !db.update_medication(medication_id, &medication)? {
        bail!("medication {} not found", medication_id);
    }
    println!("Updated medication {}", medication_id);
    Ok(())
}

fn cmd_search(db: &Database, query: &str) -> Result<()> {
    let users = db.search_users(query)?;
    if users.is_empty() {
        println!("No users match {:?}", query);
        return Ok(());
    }
    println!("{:>5}  {:<30} {:>4}", "ID", "Name", "Age");
    for user in users {
        println!("{:>5}  {:<30} {:>4}", user.id, user.name, user.age);
    }
    Ok(())
}

fn cmd_list(db: &Database, user_id: i64) -> Result<()> {
    let medications = db.list_medications_for_user(user_id)?;
    if medications.is_empty() {
        println!("No medications for user {}", user_id);
        return Ok(());
    }
    println!(
        "{:>5}  {:<24} {:<16} {:<6} {:>9} {:>9}",
        "ID", "Medication", "Dose", "Timing", "Inventory", "Threshold"
    );
    for med in medications {
        let flag = if med.needs_refill() { "  refill" } else { "" };
        println!(
            "{:>5}  {:<24} {:<16} {:<6} {:>9} {:>9}{}",
            med.id,
            med.medication_name,
            med.dose,
            med.timing,
            med.inventory_count,
            med.refill_threshold,
            flag
        );
    }
    Ok(())
}

fn cmd_dose(
    db: &Database,
    config: &Config,
    medication_id: i64,
    action: DoseAction,
    quantity: Option<i64>,
) -> Result<()> {
    let service = DosingService::new(db).with_default_quantity(config.dosing.default_quantity);
    let outcome = match quantity {
        Some(quantity) => service.record(medication_id, action, quantity)?,
        None => service.record_default(medication_id, action)?,
    };
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &DoseOutcome) {
    println!(
        "Recorded {} for {} at {} (inventory: {})",
        outcome.event.action,
        outcome.medication.medication_name,
        outcome.event.action_time,
        outcome.medication.inventory_count
    );
    if let Some(refill) = &outcome.refill {
        println!(
            "Refill needed: {} has {} left (threshold {})",
            refill.medication_name, refill.inventory_count, refill.refill_threshold
        );
    }
}

fn cmd_history(db: &Database, medication_id: i64) -> Result<()> {
    let medication = db.require_medication(medication_id)?;
    let events = db.list_dose_events(medication_id)?;
    println!("{} ({})", medication.medication_name, medication.dose);
    if events.is_empty() {
        println!("  no doses recorded");
    }
    for event in events {
        println!("  {}  {}", event.action_time, event.action);
    }
    Ok(())
}

fn cmd_export(db: &Database, format: ExportFormat, user: Option<i64>) -> Result<()> {
    let exporter = HistoryExporter::new(db);
    let export = match user {
        Some(user_id) => exporter.export_user(user_id)?,
        None => exporter.export_all()?,
    };
    match format {
        ExportFormat::Json => println!("{}", export.to_json()?),
        ExportFormat::Csv => print!("{}", export.to_csv()),
    }
    Ok(())
}

fn cmd_watch(db: &Database, interval: Duration, once: bool) -> Result<()> {
    let poller = ReminderPoller::new(db).with_interval(interval);
    let mut notify = |reminder: &Reminder| println!("{}", reminder);

    if once {
        poller.run_once(chrono::Local::now().naive_local(), &mut notify);
    } else {
        poller.run(&mut notify, || true);
    }
    Ok(())
}
