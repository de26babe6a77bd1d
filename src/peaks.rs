//! Peak values of a vector field over a set of samples.

use std::fmt;

use anyhow::{anyhow, Result};
use ndarray::{Array1, Zip};
use ndarray_stats::{errors::MinMaxError, QuantileExt};
use serde::Serialize;


/// Largest absolute value of each component and largest vector magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FieldPeaks {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub magnitude: f64,
}

impl FieldPeaks {
    pub fn from_components(x: &Array1<f64>, y: &Array1<f64>, z: &Array1<f64>) -> Result<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(anyhow!(
                "field components have different sample counts: {}, {}, {}",
                x.len(),
                y.len(),
                z.len()
            ));
        }

        let squared = Zip::from(x)
            .and(y)
            .and(z)
            .map_collect(|a, b, c| a * a + b * b + c * c);

        Ok(Self {
            x: max_abs(x)?,
            y: max_abs(y)?,
            z: max_abs(z)?,
            magnitude: max_of(&squared)?.sqrt(),
        })
    }

    /// Largest absolute difference over the four members.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        [
            (self.x - other.x).abs(),
            (self.y - other.y).abs(),
            (self.z - other.z).abs(),
            (self.magnitude - other.magnitude).abs(),
        ]
        .into_iter()
        .fold(0.0_f64, |acc, d| {
            if acc.is_nan() || d.is_nan() {
                f64::NAN
            } else {
                acc.max(d)
            }
        })
    }
}

impl fmt::Display for FieldPeaks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x: {:e}, y: {:e}, z: {:e}, |v|: {:e}",
            self.x, self.y, self.z, self.magnitude
        )
    }
}

fn max_abs(values: &Array1<f64>) -> Result<f64> {
    max_of(&values.mapv(f64::abs))
}

fn max_of(values: &Array1<f64>) -> Result<f64> {
    match values.max() {
        Ok(max) => Ok(*max),
        Err(MinMaxError::EmptyInput) => Err(anyhow!("no field samples to take a maximum over")),
        Err(MinMaxError::UndefinedOrder) => Err(anyhow!("field samples contain NaN")),
    }
}
