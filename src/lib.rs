//! Cross-checks the reduced diagnostics of a particle-in-cell run against the
//! plotfile written at the same step.
//!
//! Particle kinetic energy, field energy and peak field values are computed
//! from the plotfile data and compared with the values the simulation wrote
//! to its `EF.txt`, `EP.txt` and `MF.txt` tables during the run.

pub mod check;
pub mod constants;
pub mod energy;
pub mod output;
pub mod peaks;
pub mod plotfile;
pub mod reduced;
pub mod settings;
pub mod species;
pub mod verification;
