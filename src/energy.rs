//! Particle kinetic energy and electromagnetic field energy.
//!
//! The particle side uses the relativistic kinetic energy of each
//! macro-particle, weighted by the number of physical particles it
//! represents. The field side integrates the energy density
//! `eps0 E^2 / 2 + B^2 / (2 mu0)` over the level-0 cells.

use std::fmt;

use itertools::izip;
use nalgebra::Vector3;
use ndarray::{Array1, Array3};
use serde::Serialize;

use crate::constants::{C, EPSILON_0, MU_0};
use crate::species::ParticleSet;


/// Relativistic kinetic energy (J) of one particle with squared momentum `p2`
/// (kg^2 m^2/s^2) and rest mass `mass` (kg).
pub fn kinetic_energy(p2: f64, mass: f64) -> f64 {
    if mass == 0.0 {
        p2.sqrt() * C
    } else {
        // (E - mc^2) rewritten to avoid cancellation at low momentum
        let pc2 = p2 * C * C;
        let rest = mass * C * C;
        pc2 / ((pc2 + rest * rest).sqrt() + rest)
    }
}

/// Total weighted kinetic energy of a species.
pub fn species_energy(set: &ParticleSet, mass: f64) -> f64 {
    if set.is_empty() {
        return 0.0;
    }
    let energies: Array1<f64> = izip!(
        set.px.iter(),
        set.py.iter(),
        set.pz.iter(),
        set.weight.iter()
    )
    .map(|(&px, &py, &pz, &w)| kinetic_energy(Vector3::new(px, py, pz).norm_squared(), mass) * w)
    .collect();
    energies.sum()
}

/// Electric and magnetic parts of the field energy (J).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FieldEnergy {
    pub electric: f64,
    pub magnetic: f64,
}

impl FieldEnergy {
    pub fn total(&self) -> f64 {
        self.electric + self.magnetic
    }
}

impl fmt::Display for FieldEnergy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Field energy:")?;
        writeln!(f, "  Electric:  {:e}", self.electric)?;
        writeln!(f, "  Magnetic:  {:e}", self.magnetic)?;
        writeln!(f, "  Total:     {:e}", self.total())
    }
}

/// Field energy of cell-centred components over cells of volume `dv`.
pub fn field_energy(e: &[Array3<f64>], b: &[Array3<f64>], dv: f64) -> FieldEnergy {
    let e2: f64 = e.iter().map(sum_of_squares).sum();
    let b2: f64 = b.iter().map(sum_of_squares).sum();
    FieldEnergy {
        electric: 0.5 * e2 * EPSILON_0 * dv,
        magnetic: 0.5 * b2 / MU_0 * dv,
    }
}

fn sum_of_squares(component: &Array3<f64>) -> f64 {
    component.mapv(|v| v * v).sum()
}
