use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clinic_queue_engine::{
    config::{Config, ObservabilityConfig, StateBackend},
    metrics::init_metrics,
    ml::TrainingSample,
    models::{ClockReading, DoctorCandidate, PatientProfile},
    queue::{department_load, PriorityScorer, QueueManager},
    state::create_model_store,
};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic-queue")]
#[command(about = "Clinic queue assignment and wait-time model CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Override the model store directory from configuration
    #[arg(long, global = true)]
    state_path: Option<PathBuf>,

    /// Keep the model in memory only
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick a doctor for a new patient
    Assign {
        /// JSON array of doctor candidates
        #[arg(short, long)]
        candidates: PathBuf,

        #[arg(short, long, default_value = "30")]
        age: u32,

        #[arg(short = 'H', long, default_value = "")]
        history: String,

        /// Hour of day (0-23); defaults to local time
        #[arg(long, requires = "weekday")]
        hour: Option<u32>,

        /// Day of week (0-6, Monday = 0); defaults to local time
        #[arg(long, requires = "hour")]
        weekday: Option<u32>,
    },

    /// Score a patient's priority
    Priority {
        #[arg(short, long)]
        age: u32,

        #[arg(short = 'H', long, default_value = "")]
        history: String,
    },

    /// Retrain the wait-time model from observed outcomes
    Retrain {
        /// JSON array of training samples
        #[arg(short, long)]
        samples: PathBuf,
    },

    /// Summarize department load
    Load {
        /// JSON array of doctor candidates
        #[arg(short, long)]
        candidates: PathBuf,
    },

    /// Show the serving model
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });
    if cli.in_memory {
        config.state.backend = StateBackend::Memory;
    }
    if let Some(path) = cli.state_path {
        config.state.path = Some(path);
    }

    init_tracing(&config.observability);

    if config.observability.prometheus_enabled {
        if let Err(e) = init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        }
    }

    match cli.command {
        Commands::Priority { age, history } => {
            let patient = PatientProfile::new(age, history);
            print_json(&json!({
                "age": patient.age,
                "priority_score": PriorityScorer::score(&patient),
                "matched_keyword": PriorityScorer::matched_keyword(&patient.medical_history),
            }))?;
        }

        Commands::Load { candidates } => {
            let doctors: Vec<DoctorCandidate> = read_json(&candidates)?;
            print_json(&department_load(&doctors))?;
        }

        Commands::Assign {
            candidates,
            age,
            history,
            hour,
            weekday,
        } => {
            let doctors: Vec<DoctorCandidate> = read_json(&candidates)?;
            let patient = PatientProfile::new(age, history);

            let manager = build_manager(&config)?;
            manager.initialize().await?;

            let assignment = match (hour, weekday) {
                (Some(hour), Some(weekday)) => {
                    let now = ClockReading::new(hour, weekday)?;
                    manager.assign_doctor_at(&doctors, &patient, now)?
                }
                _ => manager.assign_doctor(&doctors, &patient)?,
            };

            print_json(&json!({
                "assignment": assignment,
                "priority_score": manager.calculate_priority(&patient),
            }))?;
        }

        Commands::Retrain { samples } => {
            let samples: Vec<TrainingSample> = read_json(&samples)?;

            let manager = build_manager(&config)?;
            manager.initialize().await?;
            let result = manager.update_model(&samples).await?;

            print_json(&result)?;
        }

        Commands::Info => {
            let manager = build_manager(&config)?;
            let init = manager.initialize().await?;
            let metadata = manager
                .handle()
                .try_snapshot()
                .map(|state| state.metadata().clone());

            print_json(&json!({
                "initialization": init,
                "stats": manager.stats(),
                "metadata": metadata,
            }))?;
        }
    }

    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("clinic_queue_engine={0},clinic_queue={0}", config.log_level).into()
    });

    // stdout carries the command output
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_manager(config: &Config) -> Result<QueueManager> {
    let store = create_model_store(&config.state).context("Failed to open model store")?;
    Ok(QueueManager::new(config, store))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clinic_queue_engine::ml::FeatureVector;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.state.backend = StateBackend::Memory;
        config.state.path = None;
        config.estimator.n_trees = 10;
        config.estimator.max_depth = 6;
        config.estimator.bootstrap_samples = 300;
        config
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assign_with_clock() {
        let cli = Cli::try_parse_from([
            "clinic-queue",
            "--in-memory",
            "assign",
            "--candidates",
            "doctors.json",
            "--age",
            "70",
            "--hour",
            "10",
            "--weekday",
            "1",
        ])
        .unwrap();

        assert!(cli.in_memory);
        match cli.command {
            Commands::Assign {
                age, hour, weekday, ..
            } => {
                assert_eq!(age, 70);
                assert_eq!(hour, Some(10));
                assert_eq!(weekday, Some(1));
            }
            _ => panic!("expected assign"),
        }
    }

    #[test]
    fn test_hour_requires_weekday() {
        let result = Cli::try_parse_from([
            "clinic-queue",
            "assign",
            "--candidates",
            "doctors.json",
            "--hour",
            "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_candidates() {
        let file = json_file(
            r#"[
                {"doctor_id": 1, "current_queue_length": 4, "avg_consultation_minutes": 15.0,
                 "appointments_today": 10, "max_daily_capacity": 40},
                {"doctor_id": 2, "current_queue_length": 0, "avg_consultation_minutes": 20.0,
                 "appointments_today": 3, "max_daily_capacity": 30, "is_available": false}
            ]"#,
        );

        let doctors: Vec<DoctorCandidate> = read_json(file.path()).unwrap();

        assert_eq!(doctors.len(), 2);
        assert!(doctors[0].is_available);
        assert!(!doctors[1].is_available);
    }

    #[test]
    fn test_read_json_errors_name_the_file() {
        let file = json_file("not json");
        let err = read_json::<Vec<DoctorCandidate>>(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));

        let missing = Path::new("/nonexistent/doctors.json");
        let err = read_json::<Vec<DoctorCandidate>>(missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[tokio::test]
    async fn test_in_memory_manager_assigns() {
        let file = json_file(
            r#"[
                {"doctor_id": 7, "current_queue_length": 9, "avg_consultation_minutes": 20.0,
                 "appointments_today": 20, "max_daily_capacity": 40},
                {"doctor_id": 8, "current_queue_length": 1, "avg_consultation_minutes": 20.0,
                 "appointments_today": 20, "max_daily_capacity": 40}
            ]"#,
        );
        let doctors: Vec<DoctorCandidate> = read_json(file.path()).unwrap();

        let manager = build_manager(&memory_config()).unwrap();
        manager.initialize().await.unwrap();
        let assignment = manager
            .assign_doctor_at(
                &doctors,
                &PatientProfile::new(40, ""),
                ClockReading::new(10, 1).unwrap(),
            )
            .unwrap();

        assert_eq!(assignment.doctor_id, 8);
        assert!(!manager.stats().loaded_from_store);
    }

    #[tokio::test]
    async fn test_retrain_samples_file() {
        let samples: Vec<TrainingSample> = (0..50)
            .map(|i| {
                let queue = (i % 10) as f64;
                TrainingSample::new(
                    FeatureVector::from_array([
                        queue,
                        15.0,
                        10.0,
                        (i % 7) as f64,
                        1.0,
                    ]),
                    queue * 30.0,
                )
            })
            .collect();
        let file = json_file(&serde_json::to_string(&samples).unwrap());

        let loaded: Vec<TrainingSample> = read_json(file.path()).unwrap();
        let manager = build_manager(&memory_config()).unwrap();
        manager.initialize().await.unwrap();
        let result = manager.update_model(&loaded).await.unwrap();

        assert!(!result.is_skipped());
        assert_eq!(manager.stats().model_version, Some(2));
    }
}
