//! End-to-end comparison of a plotfile against the reduced diagnostics.
//!
//! This module ties the readers and the physics together:
//! - Loads the plotfile header and the three reduced-diagnostic tables
//! - Sums the weighted kinetic energy of every configured species
//! - Integrates the level-0 cell-centred field energy
//! - Takes the peak raw field values over all levels
//! - Builds the [`Report`] of tolerance checks
//!
//! # Key Features
//!
//! - [`Verification`]: owns the inputs, the computed quantities and the report
//! - Species and raw field components are read in parallel with rayon
//! - Progress bar over the load steps

use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use ndarray::Array1;
use rayon::prelude::*;

use crate::{
    check::{Check, Quantity, Report},
    energy::{self, FieldEnergy},
    output,
    peaks::FieldPeaks,
    plotfile::Plotfile,
    reduced::{self, Table},
    settings::{self, Settings},
};

/// Energy of one species computed from the plotfile.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SpeciesEnergy {
    pub name: String,
    pub particles: usize,
    pub energy: f64,
}

/// Quantities computed from the plotfile.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct Quantities {
    pub species: Vec<SpeciesEnergy>,
    pub particle_energy: f64,
    pub field_energy: FieldEnergy,
    pub max_electric: FieldPeaks,
    pub max_magnetic: FieldPeaks,
}

/// The same quantities read from the reduced-diagnostic tables.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct ReducedValues {
    pub step: f64,
    pub time: f64,
    pub field_energy: f64,
    pub particle_energy: f64,
    pub max_electric: FieldPeaks,
    pub max_magnetic: FieldPeaks,
}

/// The three reduced-diagnostic tables.
#[derive(Debug, Clone)]
pub struct Tables {
    pub field_energy: Table,
    pub particle_energy: Table,
    pub max_field: Table,
}

impl Tables {
    pub fn read(settings: &Settings) -> Result<Self> {
        let read = |path: PathBuf| {
            Table::read(&path)
                .with_context(|| format!("failed to load reduced diagnostic {:?}", path))
        };
        Ok(Self {
            field_energy: read(settings.field_energy_path())?,
            particle_energy: read(settings.particle_energy_path())?,
            max_field: read(settings.max_field_path())?,
        })
    }

    /// Values of data row `row` of every table.
    pub fn values(&self, row: usize) -> reduced::Result<ReducedValues> {
        let (max_electric, max_magnetic) = self.max_field.max_fields(row)?;
        Ok(ReducedValues {
            step: self.field_energy.step(row)?,
            time: self.field_energy.time(row)?,
            field_energy: self.field_energy.value(row, reduced::TOTAL_ENERGY_COLUMN)?,
            particle_energy: self.particle_energy.value(row, reduced::TOTAL_ENERGY_COLUMN)?,
            max_electric,
            max_magnetic,
        })
    }
}

/// A plotfile checked against the reduced diagnostics of the same run.
#[derive(Debug)]
pub struct Verification {
    pub settings: Settings,
    pub plotfile: Plotfile,
    pub tables: Tables,
    pub quantities: Quantities, // computed from the plotfile
    pub reduced: ReducedValues, // read from the tables
    pub report: Report,
}

impl Verification {
    /// Opens the plotfile and reads the reduced-diagnostic tables.
    pub fn new(settings: Settings) -> Result<Self> {
        settings::validate_config(&settings)?;
        let plotfile = Plotfile::open(&settings.plotfile)
            .with_context(|| format!("failed to open plotfile {:?}", settings.plotfile))?;
        let tables = Tables::read(&settings)?;
        let reduced = tables
            .values(settings.row)
            .context("reduced diagnostics do not have the requested row")?;

        Ok(Self {
            settings,
            plotfile,
            tables,
            quantities: Quantities::default(),
            reduced,
            report: Report::default(),
        })
    }

    /// Computes the plotfile side and compares it against the tables.
    pub fn solve(&mut self) -> Result<()> {
        let start = Instant::now();
        info!("Checking {}", self.settings.plotfile.display());
        self.check_timing();

        let n = self.settings.species.len() as u64 + 2;
        let pb = ProgressBar::new(n);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>3}/{len:3} {msg}",
            )?
            .progress_chars("█▇▆▅▄▃▂▁"),
        );

        pb.set_message("species");
        let species = self.species_energies(&pb)?;
        let particle_energy = species.iter().map(|s| s.energy).sum();

        pb.set_message("fields");
        let field_energy = self.field_energy()?;
        pb.inc(1);

        pb.set_message("raw fields");
        let (max_electric, max_magnetic) = self.raw_field_peaks()?;
        pb.inc(1);
        pb.finish_and_clear();

        self.quantities = Quantities {
            species,
            particle_energy,
            field_energy,
            max_electric,
            max_magnetic,
        };
        self.log_species_breakdown();
        self.report = self.compare();

        info!("Time taken: {:.2?}", start.elapsed());
        Ok(())
    }

    /// Prints the report and writes the JSON output if requested.
    pub fn writeup(&self) -> Result<()> {
        print!("{}", self.report);
        if let Some(path) = &self.settings.json {
            output::write_json(path, self)
                .with_context(|| format!("failed to write JSON report {:?}", path))?;
            info!("Wrote JSON report to {}", path.display());
        }
        Ok(())
    }

    fn species_energies(&self, pb: &ProgressBar) -> Result<Vec<SpeciesEnergy>> {
        self.settings
            .species
            .par_iter()
            .map(|species| {
                let set = self
                    .plotfile
                    .species(&species.name)
                    .with_context(|| format!("failed to read species '{}'", species.name))?;
                let energy = energy::species_energy(&set, species.mass);
                pb.inc(1);
                Ok(SpeciesEnergy {
                    name: species.name.clone(),
                    particles: set.len(),
                    energy,
                })
            })
            .collect()
    }

    fn field_energy(&self) -> Result<FieldEnergy> {
        let fields = &self.settings.fields;
        let names: Vec<&str> = fields
            .electric
            .iter()
            .chain(fields.magnetic.iter())
            .map(String::as_str)
            .collect();
        let grids = self
            .plotfile
            .covering_grids(&names)
            .context("failed to read cell-centred fields")?;
        let (e, b) = grids.split_at(3);
        Ok(energy::field_energy(e, b, self.plotfile.header.cell_volume()))
    }

    fn raw_field_peaks(&self) -> Result<(FieldPeaks, FieldPeaks)> {
        let fields = &self.settings.fields;
        let names: Vec<String> = fields
            .electric
            .iter()
            .chain(fields.magnetic.iter())
            .map(|name| fields.raw_name(name))
            .collect();
        let raw: Vec<Array1<f64>> = names
            .par_iter()
            .map(|name| {
                self.plotfile
                    .raw_field(name)
                    .with_context(|| format!("failed to read raw field '{}'", name))
            })
            .collect::<Result<_>>()?;

        let max_electric = FieldPeaks::from_components(&raw[0], &raw[1], &raw[2])
            .context("electric field peaks")?;
        let max_magnetic = FieldPeaks::from_components(&raw[3], &raw[4], &raw[5])
            .context("magnetic field peaks")?;
        Ok((max_electric, max_magnetic))
    }

    fn compare(&self) -> Report {
        let q = &self.quantities;
        let r = &self.reduced;
        let tol = &self.settings.tolerances;

        let mut report = Report::default();
        report.push(Check::scalar(
            Quantity::FieldEnergy,
            q.field_energy.total(),
            r.field_energy,
            tol.field_energy,
        ));
        report.push(Check::scalar(
            Quantity::ParticleEnergy,
            q.particle_energy,
            r.particle_energy,
            tol.particle_energy,
        ));
        report.push(Check::peaks(
            Quantity::MaxElectricField,
            &q.max_electric,
            &r.max_electric,
            tol.max_electric_field,
        ));
        report.push(Check::peaks(
            Quantity::MaxMagneticField,
            &q.max_magnetic,
            &r.max_magnetic,
            tol.max_magnetic_field,
        ));
        report
    }

    /// Warns when the table row does not look like the plotfile's step.
    fn check_timing(&self) {
        let header = &self.plotfile.header;
        let step = header.levels.first().map(|l| l.step).unwrap_or_default();
        if self.reduced.step != step as f64 {
            warn!(
                "Table row {} is step {} but the plotfile is step {}",
                self.settings.row, self.reduced.step, step
            );
        }
        let scale = header.time.abs().max(self.reduced.time.abs());
        if (header.time - self.reduced.time).abs() > self.settings.time_rtol * scale {
            warn!(
                "Table row {} is at time {:e} but the plotfile is at time {:e}",
                self.settings.row, self.reduced.time, header.time
            );
        }
    }

    /// Logs per-species energies next to the matching table columns, if labelled.
    fn log_species_breakdown(&self) {
        let table = &self.tables.particle_energy;
        for species in &self.quantities.species {
            let table_value = table
                .column_by_label(&species.name)
                .and_then(|col| table.value(self.settings.row, col).ok());
            match table_value {
                Some(value) => info!(
                    "{}: {} particles, {:e} J (table {:e} J)",
                    species.name, species.particles, species.energy, value
                ),
                None => info!(
                    "{}: {} particles, {:e} J",
                    species.name, species.particles, species.energy
                ),
            }
        }
        let fe = &self.quantities.field_energy;
        let split = (
            self.tables
                .field_energy
                .value(self.settings.row, reduced::ELECTRIC_ENERGY_COLUMN),
            self.tables
                .field_energy
                .value(self.settings.row, reduced::MAGNETIC_ENERGY_COLUMN),
        );
        match split {
            (Ok(e), Ok(b)) => info!(
                "field energy: E {:e} J (table {:e} J), B {:e} J (table {:e} J)",
                fe.electric, e, fe.magnetic, b
            ),
            _ => info!("field energy: E {:e} J, B {:e} J", fe.electric, fe.magnetic),
        }
    }
}
