//! Particle output of one species: `<plotfile>/<species>/Header` and the
//! `Level_<l>/DATA_<n>` files it indexes.
//!
//! Each grid's block holds the integer data of all its particles (id, cpu
//! and the extra integer components) followed by the real data (positions
//! and the extra real components), particle-major.

use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use log::debug;

use super::error::{Error, Result};
use super::fab::RealFormat;
use super::text::{read_to_string, TextCursor};


/// Location of one grid's particles.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleGrid {
    pub which: usize,
    pub count: usize,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleHeader {
    pub version: String,
    pub format: RealFormat,
    pub dim: usize,
    pub real_names: Vec<String>,
    pub int_names: Vec<String>,
    pub is_checkpoint: bool,
    pub num_particles: u64,
    pub next_id: i64,
    pub finest_level: usize,
    /// Grids of every level.
    pub grids: Vec<Vec<ParticleGrid>>,
}

impl ParticleHeader {
    pub fn read(path: &Path) -> Result<Self> {
        let text = read_to_string(path)?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut cursor = TextCursor::new(path, text);

        let version = cursor.next_line("particle version")?.to_string();
        let format = match version.rsplit('_').next() {
            Some("double") => RealFormat::new(8, false),
            Some("single") => RealFormat::new(4, false),
            _ => {
                return Err(Error::UnsupportedFormat {
                    path: path.to_path_buf(),
                    details: format!("particle version '{}'", version),
                })
            }
        };

        let dim: usize = cursor.next_parsed("space dimension")?;
        let num_reals: usize = cursor.next_parsed("number of real components")?;
        let mut real_names = Vec::with_capacity(num_reals);
        for _ in 0..num_reals {
            real_names.push(cursor.next_line("real component name")?.to_string());
        }
        let num_ints: usize = cursor.next_parsed("number of integer components")?;
        let mut int_names = Vec::with_capacity(num_ints);
        for _ in 0..num_ints {
            int_names.push(cursor.next_line("integer component name")?.to_string());
        }

        let is_checkpoint = cursor.next_parsed::<i32>("checkpoint flag")? != 0;
        let num_particles: u64 = cursor.next_parsed("number of particles")?;
        let next_id: i64 = cursor.next_parsed("next particle id")?;
        let finest_level: usize = cursor.next_parsed("finest level")?;

        let mut grid_counts = Vec::with_capacity(finest_level + 1);
        for _ in 0..=finest_level {
            grid_counts.push(cursor.next_parsed::<usize>("number of grids")?);
        }

        let mut grids = Vec::with_capacity(finest_level + 1);
        for ngrids in grid_counts {
            let mut level = Vec::with_capacity(ngrids);
            for _ in 0..ngrids {
                let values: Vec<i64> = cursor.next_values("grid entry")?;
                match values.as_slice() {
                    [which, count, offset] if *which >= 0 && *count >= 0 && *offset >= 0 => {
                        level.push(ParticleGrid {
                            which: *which as usize,
                            count: *count as usize,
                            offset: *offset as u64,
                        })
                    }
                    _ => return Err(cursor.error("grid entry must be 'which count offset'")),
                }
            }
            grids.push(level);
        }

        let listed: u64 = grids.iter().flatten().map(|g| g.count as u64).sum();
        if listed != num_particles {
            return Err(cursor.error(format!(
                "header declares {} particles but grids hold {}",
                num_particles, listed
            )));
        }

        Ok(Self {
            version,
            format,
            dim,
            real_names,
            int_names,
            is_checkpoint,
            num_particles,
            next_id,
            finest_level,
            grids,
        })
    }

    pub fn reals_per_particle(&self) -> usize {
        self.dim + self.real_names.len()
    }

    /// Id and cpu come first, then the extra integer components.
    pub fn ints_per_particle(&self) -> usize {
        2 + self.int_names.len()
    }

    /// Index of a real component within a particle's real record, positions
    /// included. Accepts names with or without a `particle_` prefix.
    pub fn real_component(&self, name: &str) -> Option<usize> {
        let bare = name.strip_prefix("particle_").unwrap_or(name);
        self.real_names
            .iter()
            .position(|n| n == bare || n == name)
            .map(|i| self.dim + i)
    }
}

/// Reads the requested real components of every particle of the species.
/// Returns one vector per requested component, in request order.
pub fn read_real_components(
    species_dir: &Path,
    header: &ParticleHeader,
    components: &[usize],
) -> Result<Vec<Vec<f64>>> {
    let total = header.num_particles as usize;
    let mut columns: Vec<Vec<f64>> = components.iter().map(|_| Vec::with_capacity(total)).collect();
    let stride = header.reals_per_particle();
    let int_bytes = 4 * header.ints_per_particle();

    for (level, grids) in header.grids.iter().enumerate() {
        for grid in grids.iter().filter(|g| g.count > 0) {
            let path = species_dir
                .join(format!("Level_{}", level))
                .join(format!("DATA_{:05}", grid.which));
            debug!(
                "reading {} particles from {} at offset {}",
                grid.count,
                path.display(),
                grid.offset
            );

            let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
            let mut reader = BufReader::new(file);
            let skip = grid.offset + (grid.count * int_bytes) as u64;
            reader
                .seek(SeekFrom::Start(skip))
                .map_err(|e| Error::io(&path, e))?;

            let expected = grid.count * stride * header.format.bytes;
            let mut raw = vec![0u8; expected];
            reader.read_exact(&mut raw).map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => Error::Truncated {
                    path: path.clone(),
                    expected,
                },
                _ => Error::io(&path, e),
            })?;

            let reals = header.format.decode(&raw);
            for record in reals.chunks_exact(stride) {
                for (column, &comp) in columns.iter_mut().zip(components) {
                    column.push(record[comp]);
                }
            }
        }
    }

    Ok(columns)
}
