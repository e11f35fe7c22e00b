//! # hvac CLI
//!
//! Reads a project JSON file, runs the engine and writes the report.
//!
//! ```text
//! hvac calc project.json --output report.json
//! hvac psychro --db 95 --rh 50
//! hvac template > project.json
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG=hvac_core=debug` to see the
//! pipeline stages.

mod sink;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hvac_core::calculations::{
    ElectricLoad, EnvelopeComponent, InternalLoadSource, PsychrometricEngine, PsychrometricInput, RoomGeometry,
    RoomInput,
};
use hvac_core::project::ClimateSelection;
use hvac_core::reference::{ComponentKind, Orientation, Season};
use hvac_core::{Engine, EngineSettings, Project, ReferenceData, ReportSink};
use tracing_subscriber::EnvFilter;

use crate::sink::{load_project, render, JsonFileSink};

#[derive(Parser)]
#[command(name = "hvac")]
#[command(about = "Air-conditioning heat load and VRF equipment selection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate loads and select equipment for a project
    Calc {
        /// Path to the project JSON file
        project_path: PathBuf,
        /// Engine settings TOML (defaults when omitted)
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Replacement reference data TOML
        #[arg(long)]
        reference: Option<PathBuf>,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Resolve a moist-air state from two of dry-bulb, wet-bulb and RH
    Psychro {
        /// Dry-bulb (°F)
        #[arg(long)]
        db: Option<f64>,
        /// Wet-bulb (°F)
        #[arg(long)]
        wb: Option<f64>,
        /// Relative humidity (%)
        #[arg(long)]
        rh: Option<f64>,
        /// Total pressure (kPa)
        #[arg(long)]
        pressure: Option<f64>,
    },
    /// Print a sample project
    Template,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Calc {
            project_path,
            settings,
            reference,
            output,
            compact,
        } => cmd_calc(&project_path, settings.as_deref(), reference.as_deref(), output, !compact),
        Commands::Psychro { db, wb, rh, pressure } => cmd_psychro(PsychrometricInput {
            dry_bulb_f: db,
            wet_bulb_f: wb,
            relative_humidity_pct: rh,
            pressure_kpa: pressure,
        }),
        Commands::Template => cmd_template(),
    }
}

fn cmd_calc(
    project_path: &Path,
    settings_path: Option<&Path>,
    reference_path: Option<&Path>,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let project = load_project(project_path)?;

    let settings = match settings_path {
        Some(path) => {
            let source = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            EngineSettings::from_toml_str(&source)?
        }
        None => EngineSettings::default(),
    };

    let custom_reference = match reference_path {
        Some(path) => {
            let source = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            Some(ReferenceData::from_toml_str(&source)?)
        }
        None => None,
    };
    let reference = match &custom_reference {
        Some(data) => data,
        None => ReferenceData::builtin()?,
    };

    let engine = Engine::new(reference, settings)?;
    let report = engine
        .compute(&project)
        .with_context(|| format!("calculating {}", project_path.display()))?;

    for warning in &report.selection.warnings {
        tracing::warn!(?warning, "selection warning");
    }

    match output {
        Some(path) => {
            let mut sink = JsonFileSink::new(path, pretty);
            sink.store(&report)?;
            println!(
                "{} rooms, {:.1} TR diversified, {} outdoor unit(s), total {:.2} -> {}",
                report.building.room_count,
                report.building.adjusted_tonnage,
                report.selection.outdoor_unit_count,
                report.selection.cost.total,
                sink.path().display()
            );
        }
        None => println!("{}", render(&report, pretty)?),
    }
    Ok(())
}

fn cmd_psychro(input: PsychrometricInput) -> Result<()> {
    let result = PsychrometricEngine::new().resolve(&input)?;
    if let Some(warning) = &result.warning {
        tracing::warn!(?warning, "psychrometric solver did not converge");
    }
    println!("{}", render(&result, true)?);
    Ok(())
}

fn cmd_template() -> Result<()> {
    let mut project = Project::new("Designer", "26-001", "Client");
    project.building.name = "Sample office".to_string();
    project.building.climate = ClimateSelection::Preset {
        city: "Houston".to_string(),
        season: Season::Summer,
    };
    project.add_room(
        "Level 1",
        RoomInput {
            label: "Open office".to_string(),
            geometry: RoomGeometry::rectangular(40.0, 30.0, 9.0),
            envelope: vec![
                EnvelopeComponent::new(ComponentKind::Wall, 280.0, Orientation::W),
                EnvelopeComponent::new(ComponentKind::Glass, 80.0, Orientation::W),
            ],
            internal: InternalLoadSource {
                occupants: 12,
                lighting: Some(ElectricLoad::WattsPerSqft(1.0)),
                equipment: Some(ElectricLoad::Watts(2_400.0)),
                ..InternalLoadSource::default()
            },
            ..RoomInput::default()
        },
    );
    project.add_room(
        "Level 1",
        RoomInput {
            label: "Meeting room".to_string(),
            geometry: RoomGeometry::rectangular(15.0, 12.0, 9.0),
            envelope: vec![EnvelopeComponent::new(ComponentKind::Wall, 135.0, Orientation::N)],
            internal: InternalLoadSource {
                occupants: 8,
                ..InternalLoadSource::default()
            },
            ..RoomInput::default()
        },
    );
    println!("{}", render(&project, true)?);
    Ok(())
}
