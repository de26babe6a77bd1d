//! Physical constants in SI units (CODATA 2018).

/// Speed of light in vacuum (m/s).
pub const C: f64 = 299_792_458.0;
/// Electron rest mass (kg).
pub const M_E: f64 = 9.109_383_701_5e-31;
/// Proton rest mass (kg).
pub const M_P: f64 = 1.672_621_923_69e-27;
/// Vacuum electric permittivity (F/m).
pub const EPSILON_0: f64 = 8.854_187_812_8e-12;
/// Vacuum magnetic permeability (N/A^2).
pub const MU_0: f64 = 1.256_637_062_12e-6;
