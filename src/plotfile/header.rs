//! The top-level `Header` of an AMReX plotfile.
//!
//! The header lists the cell-centred variables, the problem domain, the cell
//! size at every level and, per level, the grids and the relative path of the
//! level's FabArray.

use std::path::Path;

use super::boxes::IndexBox;
use super::error::Result;
use super::text::{read_to_string, TextCursor};


/// One refinement level of the plotfile.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub level: usize,
    pub num_grids: usize,
    pub time: f64,
    pub step: u64,
    /// FabArray prefix relative to the plotfile, e.g. `Level_0/Cell`.
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: String,
    pub variables: Vec<String>,
    pub dim: usize,
    pub time: f64,
    pub finest_level: usize,
    pub prob_lo: [f64; 3],
    pub prob_hi: [f64; 3],
    pub ref_ratios: Vec<usize>,
    pub domains: Vec<IndexBox>,
    pub steps: Vec<u64>,
    pub cell_sizes: Vec<[f64; 3]>,
    pub coord_sys: i32,
    pub levels: Vec<Level>,
}

impl Header {
    pub fn read(path: &Path) -> Result<Self> {
        let text = read_to_string(path)?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut cursor = TextCursor::new(path, text);

        let version = cursor.next_line("version string")?.to_string();
        let nvars: usize = cursor.next_parsed("number of variables")?;
        let mut variables = Vec::with_capacity(nvars);
        for _ in 0..nvars {
            variables.push(cursor.next_line("variable name")?.to_string());
        }

        let dim: usize = cursor.next_parsed("space dimension")?;
        if !(1..=3).contains(&dim) {
            return Err(cursor.error(format!("unsupported space dimension {}", dim)));
        }
        let time: f64 = cursor.next_parsed("time")?;
        let finest_level: usize = cursor.next_parsed("finest level")?;
        let prob_lo = padded(&cursor.next_values("lower domain corner")?, dim, 0.0)
            .ok_or_else(|| cursor.error("lower domain corner has the wrong length"))?;
        let prob_hi = padded(&cursor.next_values("upper domain corner")?, dim, 1.0)
            .ok_or_else(|| cursor.error("upper domain corner has the wrong length"))?;

        let ref_ratios: Vec<usize> = cursor.next_values("refinement ratios")?;

        let domains = IndexBox::parse_all(cursor.next_line("domain boxes")?);
        if domains.len() != finest_level + 1 || domains.iter().any(|bx| bx.dim != dim) {
            return Err(cursor.error(format!(
                "expected {} domain boxes of dimension {}",
                finest_level + 1,
                dim
            )));
        }

        let steps: Vec<u64> = cursor.next_values("level steps")?;

        let mut cell_sizes = Vec::with_capacity(finest_level + 1);
        for _ in 0..=finest_level {
            let dx = padded(&cursor.next_values("cell size")?, dim, 1.0)
                .ok_or_else(|| cursor.error("cell size has the wrong length"))?;
            cell_sizes.push(dx);
        }

        let coord_sys: i32 = cursor.next_parsed("coordinate system")?;
        let _bwidth: i32 = cursor.next_parsed("boundary width")?;

        let mut levels = Vec::with_capacity(finest_level + 1);
        for expected_level in 0..=finest_level {
            let fields = cursor.next_line("level description")?;
            let mut tokens = fields.split_whitespace();
            let level: usize = parse_token(tokens.next())
                .ok_or_else(|| cursor.error("missing level index"))?;
            let num_grids: usize = parse_token(tokens.next())
                .ok_or_else(|| cursor.error("missing grid count"))?;
            let level_time: f64 = parse_token(tokens.next())
                .ok_or_else(|| cursor.error("missing level time"))?;
            if level != expected_level {
                return Err(cursor.error(format!(
                    "expected level {}, found level {}",
                    expected_level, level
                )));
            }

            let step: u64 = cursor.next_parsed("level step")?;
            // physical extents of each grid, one line per direction
            for _ in 0..num_grids * dim {
                cursor.next_line("grid extent")?;
            }
            let prefix = cursor.next_line("level prefix")?.to_string();

            levels.push(Level {
                level,
                num_grids,
                time: level_time,
                step,
                prefix,
            });
        }

        Ok(Self {
            version,
            variables,
            dim,
            time,
            finest_level,
            prob_lo,
            prob_hi,
            ref_ratios,
            domains,
            steps,
            cell_sizes,
            coord_sys,
            levels,
        })
    }

    /// Index of a cell-centred variable within each FAB.
    pub fn component(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name)
    }

    /// Number of level-0 cells per direction, 1 beyond the space dimension.
    pub fn domain_dimensions(&self) -> [usize; 3] {
        self.domains[0].cells()
    }

    /// Physical size of the domain, 1 beyond the space dimension.
    pub fn domain_width(&self) -> [f64; 3] {
        let mut width = [1.0; 3];
        for d in 0..self.dim {
            width[d] = self.prob_hi[d] - self.prob_lo[d];
        }
        width
    }

    /// Volume of one level-0 cell, from the domain width and cell count.
    pub fn cell_volume(&self) -> f64 {
        let dims = self.domain_dimensions();
        let width = self.domain_width();
        width
            .iter()
            .zip(dims.iter())
            .map(|(w, n)| w / *n as f64)
            .product()
    }
}

fn padded(values: &[f64], dim: usize, fill: f64) -> Option<[f64; 3]> {
    if values.len() != dim {
        return None;
    }
    let mut out = [fill; 3];
    out[..dim].copy_from_slice(values);
    Some(out)
}

fn parse_token<T: std::str::FromStr>(token: Option<&str>) -> Option<T> {
    token.and_then(|t| t.parse().ok())
}
