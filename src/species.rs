//! Particle species: their configured rest mass and the macro-particle data
//! read from a plotfile.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::constants::{M_E, M_P};


/// A species to include in the particle energy sum.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SpeciesConfig {
    /// Directory name of the species inside the plotfile.
    pub name: String,
    /// Rest mass in kg. Zero marks a massless species.
    pub mass: f64,
}

impl SpeciesConfig {
    pub fn new(name: &str, mass: f64) -> Self {
        Self {
            name: name.to_string(),
            mass,
        }
    }

    /// Electrons, protons and photons.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("electrons", M_E),
            Self::new("protons", M_P),
            Self::new("photons", 0.0),
        ]
    }

    pub fn is_massless(&self) -> bool {
        self.mass == 0.0
    }
}

/// Momentum (kg m/s) and statistical weight of every macro-particle of one species.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSet {
    pub name: String,
    pub px: Array1<f64>,
    pub py: Array1<f64>,
    pub pz: Array1<f64>,
    pub weight: Array1<f64>,
}

impl ParticleSet {
    pub fn new(
        name: &str,
        px: Vec<f64>,
        py: Vec<f64>,
        pz: Vec<f64>,
        weight: Vec<f64>,
    ) -> anyhow::Result<Self> {
        let n = weight.len();
        if px.len() != n || py.len() != n || pz.len() != n {
            return Err(anyhow::anyhow!(
                "species '{}' has mismatched component lengths: px {}, py {}, pz {}, weight {}",
                name,
                px.len(),
                py.len(),
                pz.len(),
                n
            ));
        }
        Ok(Self {
            name: name.to_string(),
            px: Array1::from(px),
            py: Array1::from(py),
            pz: Array1::from(pz),
            weight: Array1::from(weight),
        })
    }

    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            px: Array1::zeros(0),
            py: Array1::zeros(0),
            pz: Array1::zeros(0),
            weight: Array1::zeros(0),
        }
    }

    pub fn len(&self) -> usize {
        self.weight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weight.is_empty()
    }
}
