use anyhow::{anyhow, ensure, Context, Result};
use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::species::SpeciesConfig;


/// Default settings, compiled into the binary.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");
/// Optional settings file looked up in the working directory.
const LOCAL_CONFIG_NAME: &str = "rdcheck";
/// Prefix of environment variable overrides, e.g. `RDCHECK_ROW=2`.
const ENV_PREFIX: &str = "RDCHECK";

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    /// Plotfile directory to check.
    #[serde(default)]
    pub plotfile: PathBuf,
    /// Directory holding the reduced-diagnostic tables.
    pub reduced_dir: PathBuf,
    pub field_energy_file: String,
    pub particle_energy_file: String,
    pub max_field_file: String,
    /// Data row of each table to compare against.
    pub row: usize,
    #[serde(default = "default_time_rtol")]
    pub time_rtol: f64,
    /// Where to write a JSON report, if anywhere.
    #[serde(default)]
    pub json: Option<PathBuf>,
    pub species: Vec<SpeciesConfig>,
    pub fields: FieldNames,
    pub tolerances: Tolerances,
}

fn default_time_rtol() -> f64 {
    1e-6
}

/// Plotfile names of the field components.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FieldNames {
    pub electric: Vec<String>,
    pub magnetic: Vec<String>,
    /// Appended to a component name to get its raw-field name.
    pub raw_suffix: String,
}

impl FieldNames {
    pub fn raw_name(&self, component: &str) -> String {
        format!("{}{}", component, self.raw_suffix)
    }
}

/// Absolute tolerances of the four checks.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct Tolerances {
    pub field_energy: f64,
    pub particle_energy: f64,
    pub max_electric_field: f64,
    pub max_magnetic_field: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            field_energy: 1.0e-3,
            particle_energy: 1.0e-8,
            max_electric_field: 1.0e-9,
            max_magnetic_field: 1.0e-18,
        }
    }
}

impl Settings {
    pub fn field_energy_path(&self) -> PathBuf {
        self.reduced_dir.join(&self.field_energy_file)
    }

    pub fn particle_energy_path(&self) -> PathBuf {
        self.reduced_dir.join(&self.particle_energy_file)
    }

    pub fn max_field_path(&self) -> PathBuf {
        self.reduced_dir.join(&self.max_field_file)
    }
}

/// Loads the compiled-in defaults only, ignoring files, environment and CLI.
pub fn load_default_config() -> Result<Settings> {
    let settings = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .build()
        .context("failed to load default configuration")?;

    settings
        .try_deserialize()
        .context("failed to deserialize default configuration")
}

/// Loads the configuration layers and applies `args` on top.
pub fn load_config_with(args: &CliArgs) -> Result<Settings> {
    let mut builder =
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    builder = match &args.config {
        Some(path) => {
            info!("Using configuration: {:?}", path);
            builder.add_source(File::from(path.as_path()).required(true))
        }
        None => {
            if Path::new(&format!("{}.toml", LOCAL_CONFIG_NAME)).exists() {
                info!("Using local configuration: {}.toml", LOCAL_CONFIG_NAME);
            }
            builder.add_source(File::with_name(LOCAL_CONFIG_NAME).required(false))
        }
    };

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to load configuration")?;

    let mut config: Settings = settings
        .try_deserialize()
        .context("failed to deserialize configuration")?;

    // Parse command-line arguments and override values
    if let Some(plotfile) = &args.plotfile {
        config.plotfile = plotfile.clone();
    }
    if let Some(dir) = &args.reduced_dir {
        config.reduced_dir = dir.clone();
    }
    if let Some(row) = args.row {
        config.row = row;
    }
    if let Some(json) = &args.json {
        config.json = Some(json.clone());
    }
    if let Some(species) = &args.species {
        config.species = species.clone();
    }
    if let Some(tol) = args.tol_field_energy {
        config.tolerances.field_energy = tol;
    }
    if let Some(tol) = args.tol_particle_energy {
        config.tolerances.particle_energy = tol;
    }
    if let Some(tol) = args.tol_max_e {
        config.tolerances.max_electric_field = tol;
    }
    if let Some(tol) = args.tol_max_b {
        config.tolerances.max_magnetic_field = tol;
    }

    if !args.dump_config {
        validate_config(&config)?;
    }

    Ok(config)
}

pub fn validate_config(config: &Settings) -> Result<()> {
    ensure!(
        !config.plotfile.as_os_str().is_empty(),
        "No plotfile given; pass its path as the first argument"
    );
    ensure!(!config.species.is_empty(), "At least one species must be configured");
    for species in &config.species {
        ensure!(
            species.mass >= 0.0 && species.mass.is_finite(),
            "Mass of species '{}' must be a non-negative number, got {}",
            species.name,
            species.mass
        );
    }
    ensure!(
        config.fields.electric.len() == 3 && config.fields.magnetic.len() == 3,
        "Electric and magnetic fields must each name three components"
    );

    let tol = &config.tolerances;
    for (name, value) in [
        ("field energy", tol.field_energy),
        ("particle energy", tol.particle_energy),
        ("maximum electric field", tol.max_electric_field),
        ("maximum magnetic field", tol.max_magnetic_field),
    ] {
        ensure!(value > 0.0, "Tolerance of {} must be greater than 0, got {}", name, value);
    }
    ensure!(config.time_rtol >= 0.0, "Time tolerance must not be negative");

    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "rdcheck - compare reduced diagnostics against plotfile output"
)]
pub struct CliArgs {
    /// Path to the plotfile directory to check.
    pub plotfile: Option<PathBuf>,

    /// Directory holding EF.txt, EP.txt and MF.txt.
    #[arg(short = 'd', long)]
    pub reduced_dir: Option<PathBuf>,

    /// Data row of the tables to compare against, not counting comment lines.
    #[arg(short, long)]
    pub row: Option<usize>,

    /// Settings file to use instead of ./rdcheck.toml.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also write the report as JSON to this file.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Species to sum over, as name=mass with the mass in kg (0 for massless).
    /// May be repeated; replaces the configured species.
    #[arg(short, long, value_parser = parse_species)]
    pub species: Option<Vec<SpeciesConfig>>,

    /// Absolute tolerance of the field energy difference (J).
    #[arg(long)]
    pub tol_field_energy: Option<f64>,

    /// Absolute tolerance of the particle energy difference (J).
    #[arg(long)]
    pub tol_particle_energy: Option<f64>,

    /// Absolute tolerance of the maximum electric field difference (V/m).
    #[arg(long)]
    pub tol_max_e: Option<f64>,

    /// Absolute tolerance of the maximum magnetic field difference (T).
    #[arg(long)]
    pub tol_max_b: Option<f64>,

    /// Print the resolved settings as TOML and exit.
    #[arg(long)]
    pub dump_config: bool,
}

/// Parse a species in the format "name=mass"
fn parse_species(s: &str) -> Result<SpeciesConfig, String> {
    let (name, mass) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid species '{}'. Expected 'name=mass'", s))?;
    if name.trim().is_empty() {
        return Err(format!("Missing species name in '{}'", s));
    }
    let mass = mass
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Failed to parse mass of species '{}': {}", name, mass))?;

    Ok(SpeciesConfig::new(name.trim(), mass))
}

/// Serializes the resolved settings as TOML.
pub fn to_toml(config: &Settings) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| anyhow!("failed to serialize settings: {}", e))
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let species: Vec<&str> = self.species.iter().map(|s| s.name.as_str()).collect();
        write!(
            f,
            "Settings:
  - Plotfile: {}
  - Reduced Diagnostics: {}
  - Row: {}
  - Species: {:?}
  - Tolerances: field energy {:e}, particle energy {:e}, max E {:e}, max B {:e}
  ",
            self.plotfile.display(),
            self.reduced_dir.display(),
            self.row,
            species,
            self.tolerances.field_energy,
            self.tolerances.particle_energy,
            self.tolerances.max_electric_field,
            self.tolerances.max_magnetic_field,
        )
    }
}
