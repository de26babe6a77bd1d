//! Tolerance checks between plotfile-derived and reduced-diagnostic values.
//!
//! A [`Check`] groups one or more [`Comparison`]s of the same physical
//! quantity and passes when the largest absolute difference among them is
//! strictly below the tolerance. A NaN difference never passes.

use std::fmt;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::peaks::FieldPeaks;


/// The physical quantities compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    FieldEnergy,
    ParticleEnergy,
    MaxElectricField,
    MaxMagneticField,
}

impl Quantity {
    pub fn name(&self) -> &'static str {
        match self {
            Quantity::FieldEnergy => "field energy",
            Quantity::ParticleEnergy => "particle energy",
            Quantity::MaxElectricField => "maximum electric field",
            Quantity::MaxMagneticField => "maximum magnetic field",
        }
    }

    fn difference_label(&self) -> String {
        match self {
            Quantity::FieldEnergy | Quantity::ParticleEnergy => {
                format!("difference of {}", self.name())
            }
            _ => format!("maximum difference of {}", self.name()),
        }
    }

    fn tolerance_label(&self) -> String {
        match self {
            Quantity::FieldEnergy | Quantity::ParticleEnergy => {
                format!("tolerance of {}", self.name())
            }
            _ => format!("tolerance of {} difference", self.name()),
        }
    }
}

/// One value computed both ways.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub component: String,
    pub plotfile: f64,
    pub reduced: f64,
}

impl Comparison {
    pub fn new(component: &str, plotfile: f64, reduced: f64) -> Self {
        Self {
            component: component.to_string(),
            plotfile,
            reduced,
        }
    }

    pub fn difference(&self) -> f64 {
        (self.plotfile - self.reduced).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub quantity: Quantity,
    pub comparisons: Vec<Comparison>,
    pub difference: f64,
    pub tolerance: f64,
}

impl Check {
    pub fn new(quantity: Quantity, comparisons: Vec<Comparison>, tolerance: f64) -> Self {
        let difference = comparisons
            .iter()
            .map(Comparison::difference)
            .fold(0.0_f64, |acc, d| {
                if acc.is_nan() || d.is_nan() {
                    f64::NAN
                } else {
                    acc.max(d)
                }
            });
        Self {
            quantity,
            comparisons,
            difference,
            tolerance,
        }
    }

    pub fn scalar(quantity: Quantity, plotfile: f64, reduced: f64, tolerance: f64) -> Self {
        Self::new(quantity, vec![Comparison::new("total", plotfile, reduced)], tolerance)
    }

    pub fn peaks(
        quantity: Quantity,
        plotfile: &FieldPeaks,
        reduced: &FieldPeaks,
        tolerance: f64,
    ) -> Self {
        let comparisons = vec![
            Comparison::new("x", plotfile.x, reduced.x),
            Comparison::new("y", plotfile.y, reduced.y),
            Comparison::new("z", plotfile.z, reduced.z),
            Comparison::new("magnitude", plotfile.magnitude, reduced.magnitude),
        ];
        Self::new(quantity, comparisons, tolerance)
    }

    pub fn passed(&self) -> bool {
        self.difference < self.tolerance
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {:e}", self.quantity.difference_label(), self.difference)?;
        writeln!(f, "{}: {:e}", self.quantity.tolerance_label(), self.tolerance)
    }
}

/// All checks of one run, in the order they are printed.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Report {
    pub checks: Vec<Check>,
}

impl Report {
    pub fn push(&mut self, check: Check) {
        self.checks.push(check);
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(Check::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed())
    }

    /// Errors on the first failing check.
    pub fn ensure(&self) -> Result<()> {
        match self.failures().next() {
            None => Ok(()),
            Some(check) => Err(anyhow!(
                "{} check failed: difference {:e} is not below tolerance {:e}",
                check.quantity.name(),
                check.difference,
                check.tolerance
            )),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            write!(f, "{}", check)?;
        }
        Ok(())
    }
}
