//! Reduced-diagnostic tables written by the simulation during the run.
//!
//! Each table is plain text: an optional `#`-prefixed header naming the
//! columns as `[index]name(unit)`, then one whitespace-separated row per
//! output step. Columns 0 and 1 are always the step and the time.
//!
//! # Layouts
//!
//! - `EF.txt`: `[2]` total field energy, `[3]` electric part, `[4]` magnetic part
//! - `EP.txt`: `[2]` total particle energy, then one column per species
//! - `MF.txt`: `[2..=5]` max Ex, Ey, Ez, |E|; `[6..=9]` max Bx, By, Bz, |B|

use std::{
    fs,
    path::{Path, PathBuf},
};

use ndarray::Array2;
use thiserror::Error;

use crate::peaks::FieldPeaks;


pub const STEP_COLUMN: usize = 0;
pub const TIME_COLUMN: usize = 1;
pub const TOTAL_ENERGY_COLUMN: usize = 2;
pub const ELECTRIC_ENERGY_COLUMN: usize = 3;
pub const MAGNETIC_ENERGY_COLUMN: usize = 4;
pub const MAX_E_COLUMNS: [usize; 4] = [2, 3, 4, 5];
pub const MAX_B_COLUMNS: [usize; 4] = [6, 7, 8, 9];

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' line {line} has {found} columns, expected {expected}")]
    Ragged {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("'{path}' contains no data rows")]
    Empty { path: PathBuf },

    #[error("'{path}' has no value at row {row}, column {col} (table is {rows}x{cols})")]
    OutOfRange {
        path: PathBuf,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub path: PathBuf,
    pub labels: Vec<(usize, String)>,
    pub data: Array2<f64>,
}

impl Table {
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut labels = Vec::new();
        let mut values = Vec::new();
        let mut cols = None;
        let mut rows = 0;

        for (number, line) in text.lines().enumerate() {
            let (content, comment) = match line.find('#') {
                Some(at) => (&line[..at], Some(&line[at + 1..])),
                None => (line, None),
            };
            if labels.is_empty() {
                if let Some(comment) = comment {
                    labels = parse_labels(comment);
                }
            }

            let row: Vec<f64> = content
                .split_whitespace()
                .map(|token| token.parse().unwrap_or(f64::NAN))
                .collect();
            if row.is_empty() {
                continue;
            }

            match cols {
                None => cols = Some(row.len()),
                Some(expected) if expected != row.len() => {
                    return Err(Error::Ragged {
                        path: path.to_path_buf(),
                        line: number + 1,
                        expected,
                        found: row.len(),
                    })
                }
                Some(_) => {}
            }
            values.extend(row);
            rows += 1;
        }

        let cols = cols.ok_or_else(|| Error::Empty {
            path: path.to_path_buf(),
        })?;
        let data = Array2::from_shape_vec((rows, cols), values)
            .map_err(|_| Error::Empty {
                path: path.to_path_buf(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            labels,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn value(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or_else(|| Error::OutOfRange {
                path: self.path.clone(),
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    pub fn column_by_label(&self, name: &str) -> Option<usize> {
        self.labels
            .iter()
            .find(|(_, label)| label == name)
            .map(|(index, _)| *index)
    }

    /// Simulation time of `row`.
    pub fn time(&self, row: usize) -> Result<f64> {
        self.value(row, TIME_COLUMN)
    }

    pub fn step(&self, row: usize) -> Result<f64> {
        self.value(row, STEP_COLUMN)
    }

    /// Electric and magnetic peaks of an `MF.txt` row.
    pub fn max_fields(&self, row: usize) -> Result<(FieldPeaks, FieldPeaks)> {
        let peaks = |cols: [usize; 4]| -> Result<FieldPeaks> {
            Ok(FieldPeaks {
                x: self.value(row, cols[0])?,
                y: self.value(row, cols[1])?,
                z: self.value(row, cols[2])?,
                magnitude: self.value(row, cols[3])?,
            })
        };
        Ok((peaks(MAX_E_COLUMNS)?, peaks(MAX_B_COLUMNS)?))
    }
}

/// Parses `[0]step() [1]time(s) [2]total(J)` into `(index, name)` pairs.
fn parse_labels(comment: &str) -> Vec<(usize, String)> {
    comment
        .split_whitespace()
        .filter_map(|token| {
            let token = token.trim_end_matches(',');
            let rest = token.strip_prefix('[')?;
            let close = rest.find(']')?;
            let index = rest[..close].parse().ok()?;
            let name = &rest[close + 1..];
            let name = match name.rfind('(') {
                Some(open) if name.ends_with(')') => &name[..open],
                _ => name,
            };
            Some((index, name.to_string()))
        })
        .collect()
}
