//! Planner CLI - Command-line interface for Peak Planner
//!
//! Commands:
//! - generate: Build a training plan for a date window
//! - buckets: Show how activities group into intensity levels
//! - guide: Print a coaching tip for a workout
//! - levels: Print the intensity levels and their load table
//! - doctor: Diagnose configuration and environment

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use peak_planner::classifier::{GeminiClient, StaticClassifier, API_KEY_ENV};
use peak_planner::load::load_table;
use peak_planner::{
    ClassificationStatus, ClassifierError, GuideBook, LevelBuckets, PlanError, PlanOutcome,
    PlanRequest, Planner, PlannerConfig, PLANNER_VERSION, PRODUCER_NAME,
};

/// Planner - Periodized training calendar generator
#[derive(Parser)]
#[command(name = "planner")]
#[command(version = PLANNER_VERSION)]
#[command(about = "Generate periodized training calendars", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a training plan for a date window
    Generate {
        /// First day of the plan (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the plan, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Goal title, e.g. "Autumn marathon"
        #[arg(long, default_value = "")]
        goal: String,

        /// Free-text description of the training
        #[arg(short, long)]
        description: String,

        /// Classifier-style activity JSON (use - for stdin); skips the LLM call
        #[arg(long)]
        activities: Option<PathBuf>,

        /// Seed for reproducible plans
        #[arg(long)]
        seed: Option<u64>,

        /// Planner config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show how activities group into intensity levels
    Buckets {
        /// Classifier-style activity JSON (use - for stdin)
        #[arg(short, long)]
        activities: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a coaching tip for a workout
    Guide {
        /// Workout name
        workout: String,

        /// Seed for tip selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the intensity levels and their load table
    Levels {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Plain text calendar
    Text,
    /// Newline-delimited JSON (one day per line)
    Ndjson,
    /// Full outcome as JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), PlannerCliError> {
    match cli.command {
        Commands::Generate {
            start,
            end,
            goal,
            description,
            activities,
            seed,
            config,
            output,
            format,
        } => {
            let request = PlanRequest::new(goal, description, start, end);
            cmd_generate(
                &request,
                activities.as_deref(),
                seed,
                config.as_deref(),
                &output,
                format,
            )
        }

        Commands::Buckets { activities, json } => cmd_buckets(&activities, json),

        Commands::Guide { workout, seed } => cmd_guide(&workout, seed),

        Commands::Levels { json } => cmd_levels(json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_generate(
    request: &PlanRequest,
    activities: Option<&Path>,
    seed: Option<u64>,
    config: Option<&Path>,
    output: &Path,
    format: OutputFormat,
) -> Result<(), PlannerCliError> {
    let config = match config {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };

    let mut planner = Planner::new(config.clone());
    if let Some(seed) = seed {
        planner = planner.with_seed(seed);
    }

    let outcome = match activities {
        Some(path) => {
            let classifier = StaticClassifier::from_response(&read_input(path)?)?;
            planner.plan(request, Ok(classifier.activities().to_vec()))?
        }
        None => {
            // Reject bad windows before spending a classifier call
            request.validate(config.max_plan_days)?;
            match GeminiClient::from_env() {
                Ok(client) => {
                    let client = client.with_model(&config.model);
                    let runtime = tokio::runtime::Runtime::new()?;
                    runtime.block_on(planner.plan_with(request, &client))?
                }
                Err(e) => planner.plan(request, Err(e))?,
            }
        }
    };

    let output_data = format_output(&outcome, &format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_buckets(activities: &Path, json: bool) -> Result<(), PlannerCliError> {
    let classifier = StaticClassifier::from_response(&read_input(activities)?)?;
    let buckets = LevelBuckets::from_activities(classifier.activities());

    if json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
        return Ok(());
    }

    println!("Level Buckets");
    println!("=============");
    for (level, names) in buckets.iter() {
        let marker = if buckets.is_synthetic(level) {
            " (placeholder)"
        } else {
            ""
        };
        println!("{}{}", level.label(), marker);
        for name in names {
            println!("  - {}", name);
        }
    }

    Ok(())
}

fn cmd_guide(workout: &str, seed: Option<u64>) -> Result<(), PlannerCliError> {
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    println!("{}", GuideBook::default().tip_for(workout, &mut rng));
    Ok(())
}

fn cmd_levels(json: bool) -> Result<(), PlannerCliError> {
    let rows: Vec<LevelRow> = load_table()
        .map(|(level, load)| LevelRow {
            level: level.value(),
            name: level.display_name().to_string(),
            description: level.description().to_string(),
            training_stress: load.training_stress,
            adaptation_factor: load.adaptation_factor,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<5} {:<26} {:>7} {:>11}", "Lvl", "Name", "Stress", "Adaptation");
    for row in &rows {
        println!(
            "{:<5} {:<26} {:>7.1} {:>11.1}",
            row.level, row.name, row.training_stress, row.adaptation_factor
        );
        println!("      {}", row.description);
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), PlannerCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "planner_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Planner version {}", PLANNER_VERSION),
    });

    let key_present = std::env::var(API_KEY_ENV)
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false);
    checks.push(if key_present {
        DoctorCheck {
            name: "api_key".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} is set", API_KEY_ENV),
        }
    } else {
        DoctorCheck {
            name: "api_key".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "{} is not set; plans will use placeholder workouts unless --activities is given",
                API_KEY_ENV
            ),
        }
    });

    if let Some(config_path) = config {
        if config_path.exists() {
            match PlannerConfig::load(config_path) {
                Ok(loaded) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (max {} days, model {})",
                        loaded.max_plan_days, loaded.model
                    ),
                }),
                Err(e) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            });
        }
    }

    let stdout_check = if atty::is(atty::Stream::Stdout) {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Ok,
            message: "stdout is a TTY (text output suits interactive use)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Ok,
            message: "stdout is a pipe (consider --format ndjson)".to_string(),
        }
    };
    checks.push(stdout_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PLANNER_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Planner Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PlannerCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, PlannerCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn format_output(outcome: &PlanOutcome, format: &OutputFormat) -> Result<String, PlannerCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for day in &outcome.plan.days {
                lines.push(serde_json::to_string(day)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(outcome)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => Ok(format_text(outcome)),
    }
}

fn format_text(outcome: &PlanOutcome) -> String {
    let plan = &outcome.plan;
    let mut out = String::new();

    let (first, last) = match (plan.days.first(), plan.days.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return "Empty plan\n".to_string(),
    };

    out.push_str(&format!(
        "Training plan: {} ({} to {}, {} days, seed {})\n",
        plan.goal,
        first,
        last,
        plan.len(),
        plan.seed
    ));
    match &outcome.classification {
        ClassificationStatus::Classified { activities } => {
            out.push_str(&format!("Activities: {} classified\n\n", activities));
        }
        ClassificationStatus::Degraded { reason } => {
            out.push_str(&format!("Activities: placeholder workouts ({})\n\n", reason));
        }
    }

    for (day, level) in plan.days.iter().zip(&outcome.performance) {
        out.push_str(&format!(
            "{}  {}  {:<11}  {:<26}  {:>6.1}  {}\n",
            day.date,
            day.weekday,
            day.phase.as_str(),
            day.intensity_level.label(),
            day.performance,
            level.glyph
        ));
        out.push_str(&format!("    {}: {}\n", day.workout_name, day.guide));
    }

    if let Some(peak) = plan.peak_day() {
        out.push_str(&format!(
            "\nPeak performance: {} ({}) at {:.1}\n",
            peak.date, peak.weekday, peak.performance
        ));
    }
    let phases: Vec<String> = plan
        .phase_counts()
        .iter()
        .map(|(phase, count)| format!("{} {}", phase, count))
        .collect();
    out.push_str(&format!("Phases: {}\n", phases.join(", ")));

    out
}

// Error types

#[derive(Debug)]
enum PlannerCliError {
    Io(io::Error),
    Plan(PlanError),
    Classifier(ClassifierError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for PlannerCliError {
    fn from(e: io::Error) -> Self {
        PlannerCliError::Io(e)
    }
}

impl From<PlanError> for PlannerCliError {
    fn from(e: PlanError) -> Self {
        PlannerCliError::Plan(e)
    }
}

impl From<ClassifierError> for PlannerCliError {
    fn from(e: ClassifierError) -> Self {
        PlannerCliError::Classifier(e)
    }
}

impl From<serde_json::Error> for PlannerCliError {
    fn from(e: serde_json::Error) -> Self {
        PlannerCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PlannerCliError> for CliError {
    fn from(e: PlannerCliError) -> Self {
        match e {
            PlannerCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PlannerCliError::Plan(e) => {
                let hint = match &e {
                    PlanError::InvalidWindow { .. } => "Pick an end date after the start date",
                    PlanError::WindowTooLong { .. } => "Shorten the window or raise max_plan_days",
                    PlanError::MissingDescription => "Describe the training with --description",
                    PlanError::Config(_) | PlanError::JsonError(_) => "Run 'planner doctor --config <file>'",
                };
                CliError {
                    code: "PLAN_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PlannerCliError::Classifier(e) => CliError {
                code: "ACTIVITIES_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(
                    "Activities must be {\"trainings\": [{\"name\", \"intensity_level\"}]} or an array"
                        .to_string(),
                ),
            },
            PlannerCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PlannerCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct LevelRow {
    level: u8,
    name: String,
    description: String,
    training_stress: f64,
    adaptation_factor: f64,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
