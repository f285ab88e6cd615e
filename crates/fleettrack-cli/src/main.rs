use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Parser;
use fleettrack_core::advisory::display_text;
use fleettrack_core::due::{describe_days, DueCalculator};
use fleettrack_core::{
    seed, Config, Error, ExportFormat, Exporter, FleetAdvisor, FleetStore,
};
use fleettrack_tui::App;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fleettrack")]
#[command(version, about = "Terminal fleet maintenance tracker", long_about = None)]
struct Cli {
    /// Fleet JSON file to start from (default: config file, then the demo fleet)
    #[arg(long, global = true, env = "FLEETTRACK_FLEET")]
    fleet: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui,
    /// List vehicles with their next deadline
    Vehicles {
        /// Compute deadlines as of this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Maintenance history of one vehicle, newest first
    History {
        /// Vehicle id (see `vehicles`)
        vehicle_id: String,
    },
    /// Write the maintenance export file
    Export {
        /// Output path (default: maintenance_schedule_template.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format (default: from the file extension, else csv)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Ask the AI provider for a fleet analysis
    Analyze,
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
    /// Write a config file with defaults
    Init,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let in_tui = matches!(cli.command, None | Some(Commands::Tui));
    init_logging(in_tui);

    let config = Config::load().context("Failed to load config")?;
    let store = load_store(cli.fleet.as_deref(), &config)?;
    tracing::info!(
        "Fleet ready: {} vehicles, {} records",
        store.vehicles().len(),
        store.records().len()
    );

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let advisor = FleetAdvisor::gemini(&config.advisory, config.resolve_api_key())?;
            let mut app = App::new(store, config.ui.due_soon_days);
            fleettrack_tui::run_tui(
                &mut app,
                advisor,
                config.export.csv_path(),
                config.ui.mouse_enabled,
            )
            .await?;
        }
        Commands::Vehicles { today } => {
            let now = today
                .map(|d| d.and_time(NaiveTime::MIN).and_utc())
                .unwrap_or_else(Utc::now);
            print_vehicles(&store, now, config.ui.due_soon_days);
        }
        Commands::History { vehicle_id } => {
            print_history(&store, &vehicle_id, Utc::now(), config.ui.due_soon_days)?;
        }
        Commands::Export { output, format } => {
            let (path, format) = export_target(output, format.map(ExportFormat::from), &config);
            Exporter::export_to_file_with_format(
                store.vehicles(),
                store.records(),
                &path,
                format,
            )?;
            println!(
                "Exported {} records to {}",
                store.records().len(),
                path.display()
            );
        }
        Commands::Analyze => {
            let advisor = FleetAdvisor::gemini(&config.advisory, config.resolve_api_key())?;
            println!("Analyzing {} vehicles...\n", store.vehicles().len());
            let outcome = advisor
                .analyze(store.vehicles(), store.records(), Utc::now().date_naive())
                .await;
            termimad::print_text(display_text(&outcome));
        }
        Commands::Config { action } => match action {
            ConfigAction::Path => {
                println!("{}", Config::config_path()?.display());
            }
            ConfigAction::Show => {
                print!("{}", config.redacted().to_toml()?);
            }
            ConfigAction::Init => {
                let path = Config::config_path()?;
                if path.exists() {
                    println!("Config already exists at {}", path.display());
                } else {
                    let path = Config::default().save()?;
                    println!("Wrote default config to {}", path.display());
                }
            }
        },
    }

    Ok(())
}

/// Logs go to a file while the TUI owns the terminal, to stderr otherwise
fn init_logging(in_tui: bool) {
    let filter = |default: &str| {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into())
    };

    if in_tui {
        // Without a log file the TUI runs silent
        if let Some(file) = open_log_file() {
            tracing_subscriber::registry()
                .with(filter("fleettrack=info"))
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .init();
        }
    } else {
        tracing_subscriber::registry()
            .with(filter("fleettrack=warn"))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let path = Config::log_path().ok()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
}

/// `--fleet` beats the config file, which beats the demo fleet
fn load_store(flag: Option<&Path>, config: &Config) -> anyhow::Result<FleetStore> {
    match flag.or(config.fleet.data_file.as_deref()) {
        Some(path) => {
            let store = FleetStore::load_json(path).map_err(|e| {
                tracing::error!("Failed to load fleet from {}: {}", path.display(), e);
                e
            });
            store.with_context(|| format!("Failed to load fleet from {}", path.display()))
        }
        None => {
            tracing::info!("No fleet file configured, using the demo fleet");
            Ok(FleetStore::from_fleet(seed::initial_fleet()))
        }
    }
}

fn export_target(
    output: Option<PathBuf>,
    format: Option<ExportFormat>,
    config: &Config,
) -> (PathBuf, ExportFormat) {
    let format = format
        .or_else(|| {
            output
                .as_ref()
                .and_then(|p| p.extension())
                .and_then(|e| e.to_str())
                .and_then(ExportFormat::from_extension)
        })
        .unwrap_or(ExportFormat::Csv);

    let path = output.unwrap_or_else(|| {
        config
            .export
            .csv_path()
            .with_extension(format.extension())
    });

    (path, format)
}

fn print_vehicles(store: &FleetStore, now: DateTime<Utc>, due_soon_days: i64) {
    for vehicle in store.vehicles() {
        println!("[{}] {}", vehicle.id, vehicle.display_label());
        println!(
            "     {} · {} · {} km",
            vehicle.year, vehicle.color, vehicle.current_mileage
        );

        match store.next_due(&vehicle.id, now) {
            Some(due) => {
                let status = due.status(due_soon_days);
                println!(
                    "     {} {}: {} ({}) [{}]",
                    status.emoji(),
                    due.category.label(),
                    due.due_date.format("%Y-%m-%d"),
                    describe_days(due.days_remaining),
                    status.label()
                );
            }
            None => println!("     No upcoming deadlines"),
        }
        println!();
    }
}

fn print_history(
    store: &FleetStore,
    vehicle_id: &str,
    now: DateTime<Utc>,
    due_soon_days: i64,
) -> anyhow::Result<()> {
    let vehicle = store
        .vehicle(vehicle_id)
        .ok_or_else(|| Error::VehicleNotFound(vehicle_id.to_string()))?;

    let history = store.history(vehicle_id);
    println!("{} · {} records\n", vehicle.display_label(), history.len());

    for record in &history {
        let expiry = match DueCalculator::record_status(record, now, due_soon_days) {
            Some((days, status)) => format!(
                "expires {} ({}) [{}]",
                record
                    .expiry_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                describe_days(days),
                status.label()
            ),
            None => String::new(),
        };
        println!(
            "{}  {:<22} {:>10.2}  {}",
            record.date.format("%Y-%m-%d"),
            record.category.label(),
            record.cost,
            expiry
        );
        if !record.provider.is_empty() || !record.notes.is_empty() {
            println!("            {} {}", record.provider, record.notes);
        }
    }

    let total: f64 = history.iter().map(|r| r.cost).sum();
    println!("\nTotal cost: {:.2}", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_target_defaults_and_extension() {
        let config = Config::default();

        let (path, format) = export_target(None, None, &config);
        assert_eq!(path, PathBuf::from("maintenance_schedule_template.csv"));
        assert_eq!(format, ExportFormat::Csv);

        let (path, format) = export_target(None, Some(ExportFormat::Json), &config);
        assert_eq!(path, PathBuf::from("maintenance_schedule_template.json"));
        assert_eq!(format, ExportFormat::Json);

        let (_, format) = export_target(Some(PathBuf::from("fleet.json")), None, &config);
        assert_eq!(format, ExportFormat::Json);

        let (_, format) = export_target(Some(PathBuf::from("fleet.txt")), None, &config);
        assert_eq!(format, ExportFormat::Csv);
    }

    #[test]
    fn test_load_store_prefers_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.json");
        let json = Exporter::to_json(&seed::initial_vehicles()[..1], &[]).unwrap();
        std::fs::write(&path, json).unwrap();

        let store = load_store(Some(&path), &Config::default()).unwrap();
        assert_eq!(store.vehicles().len(), 1);

        let store = load_store(None, &Config::default()).unwrap();
        assert_eq!(store.vehicles().len(), 5);

        let missing = dir.path().join("missing.json");
        assert!(load_store(Some(&missing), &Config::default()).is_err());
    }
}
