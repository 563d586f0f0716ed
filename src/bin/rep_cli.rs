use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use physio_trainer::calibration::{CalibrationController, CalibrationPhase, Stage};
use physio_trainer::config::AppConfig;
use physio_trainer::fixtures::{ExpectationDiff, FixtureCatalog, FixtureReplayer};
use physio_trainer::managers::SessionManager;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "rep_cli",
    about = "Deterministic replay harness for the physio trainer rep counter"
)]
struct Cli {
    /// Override directory containing replay fixtures (defaults to ./fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// JSON config file (defaults to $PHYSIO_TRAINER_CONFIG or config/physio_trainer.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a fixture through a session, printing one JSON line per frame
    Replay {
        /// Fixture name or path
        #[arg(long)]
        input: String,
        #[arg(long, default_value = "replay")]
        session: String,
    },
    /// Drive the rep counter with raw knee angles
    Angles {
        /// Comma-separated knee angles in degrees
        #[arg(long, value_delimiter = ',', required = true)]
        knee: Vec<f64>,
    },
    /// Print the effective configuration as JSON
    PrintConfig,
    /// List available fixtures on disk
    DumpFixtures,
    /// Serve the HTTP frame API
    #[cfg(feature = "http")]
    Serve {
        /// Bind address (defaults to server.bind_addr from config)
        #[arg(long)]
        addr: Option<String>,
    },
}

fn main() -> ExitCode {
    physio_trainer::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_else(FixtureCatalog::default);
    let config = match cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Replay { input, session } => run_replay(&catalog, &config, &input, &session),
        Commands::Angles { knee } => run_angles(&config, &knee),
        Commands::PrintConfig => run_print_config(&config),
        Commands::DumpFixtures => run_dump(&catalog),
        #[cfg(feature = "http")]
        Commands::Serve { addr } => run_serve(&config, addr),
    }
}

fn run_replay(
    catalog: &FixtureCatalog,
    config: &AppConfig,
    input: &str,
    session_id: &str,
) -> Result<ExitCode> {
    let fixture = catalog.load(input)?;
    let manager = SessionManager::new(config);
    let outcomes = FixtureReplayer::new(&manager).run(session_id, &fixture);

    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }

    if let Some(expectations) = fixture.expect {
        match expectations.verify(&outcomes) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

#[derive(Serialize)]
struct AngleStep {
    frame: usize,
    knee_angle: f64,
    reps: u32,
    stage: Option<Stage>,
    phase: CalibrationPhase,
    baseline_angle: Option<f64>,
}

fn run_angles(config: &AppConfig, knee_angles: &[f64]) -> Result<ExitCode> {
    let controller = CalibrationController::new(config.rep_counting.thresholds());
    let mut state = controller.initial_state();

    for (frame, &knee_angle) in knee_angles.iter().enumerate() {
        state = controller.advance(state, knee_angle).state;
        let step = AngleStep {
            frame,
            knee_angle,
            reps: state.rep_count,
            stage: state.stage,
            phase: controller.phase(&state),
            baseline_angle: state.baseline_angle,
        };
        println!("{}", serde_json::to_string(&step)?);
    }

    Ok(ExitCode::from(0))
}

fn run_print_config(config: &AppConfig) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for name in fixtures {
        println!("{name}");
    }
    Ok(ExitCode::from(0))
}

#[cfg(feature = "http")]
fn run_serve(config: &AppConfig, addr: Option<String>) -> Result<ExitCode> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    let raw = addr.unwrap_or_else(|| config.server.bind_addr.clone());
    let addr: SocketAddr = raw
        .parse()
        .with_context(|| format!("parsing bind address {raw}"))?;
    let manager = Arc::new(SessionManager::new(config));
    physio_trainer::http::serve_blocking(manager, addr)?;
    Ok(ExitCode::from(0))
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json()).context("encoding diff")?;
    eprintln!("{json}");
    Ok(())
}
