//! Reader for AMReX plotfile directories.
//!
//! A plotfile written by the simulation contains:
//! - `Header`: variables, domain geometry and per-level grid layout
//! - `Level_<l>/Cell_H` and `Cell_D_*`: cell-centred fields, all components per FAB
//! - `raw_fields/Level_<l>/<name>_H` and `<name>_D_*`: fields on their native
//!   staggered grid, one component per FabArray
//! - `<species>/Header` and `<species>/Level_<l>/DATA_*`: macro-particles
//!
//! # Key Types
//!
//! - [`Plotfile`]: handle to an opened plotfile directory
//! - [`header::Header`]: parsed top-level header
//! - [`fab::FabArrayHeader`] and [`fab::Fab`]: grid data blocks
//! - [`particles::ParticleHeader`]: per-species particle layout

pub mod boxes;
pub mod error;
pub mod fab;
pub mod header;
pub mod particles;
mod text;

use std::path::{Path, PathBuf};

use log::debug;
use ndarray::{Array1, Array3};

use crate::species::ParticleSet;
pub use error::{Error, Result};
use fab::{Fab, FabArrayHeader};
use header::Header;
use particles::{read_real_components, ParticleHeader};

/// Real components read for every species.
const MOMENTUM_COMPONENTS: [&str; 3] = ["momentum_x", "momentum_y", "momentum_z"];
const WEIGHT_COMPONENT: &str = "weight";
const RAW_FIELDS_DIR: &str = "raw_fields";

#[derive(Debug, Clone)]
pub struct Plotfile {
    pub path: PathBuf,
    pub header: Header,
}

impl Plotfile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let header = Header::read(&path.join("Header"))?;
        debug!(
            "opened plotfile {} ({} variables, {}D, finest level {})",
            path.display(),
            header.variables.len(),
            header.dim,
            header.finest_level
        );
        Ok(Self { path, header })
    }

    /// Assembles cell-centred level-0 variables onto the whole domain.
    ///
    /// Each FAB is read once and every requested component is copied out of
    /// it. Arrays are indexed relative to the domain's lower corner.
    pub fn covering_grids(&self, names: &[&str]) -> Result<Vec<Array3<f64>>> {
        let comps = names
            .iter()
            .map(|name| {
                self.header
                    .component(name)
                    .ok_or_else(|| Error::MissingVariable(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let level = &self.header.levels[0];
        let header_path = self.path.join(format!("{}_H", level.prefix));
        let fab_header = FabArrayHeader::read(&header_path)?;
        let data_dir = header_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.path.clone());

        let domain = self.header.domains[0];
        let dims = domain.cells();
        let mut grids: Vec<Array3<f64>> = comps
            .iter()
            .map(|_| Array3::zeros((dims[0], dims[1], dims[2])))
            .collect();

        for (valid, on_disk) in fab_header.boxes.iter().zip(fab_header.fabs.iter()) {
            let fab_path = data_dir.join(&on_disk.file);
            let fab = Fab::read(&fab_path, on_disk.offset)?;
            if comps.iter().any(|&c| c >= fab.ncomp) {
                return Err(Error::parse(
                    &fab_path,
                    0,
                    format!("FAB holds {} components, fewer than the header lists", fab.ncomp),
                ));
            }

            for idx in cell_indices(valid) {
                if !domain.contains(idx) || !fab.bx.contains(idx) {
                    return Err(Error::parse(
                        &header_path,
                        0,
                        format!("grid {:?}..{:?} lies outside the stored data", valid.lo, valid.hi),
                    ));
                }
                let at = [
                    (idx[0] - domain.lo[0]) as usize,
                    (idx[1] - domain.lo[1]) as usize,
                    (idx[2] - domain.lo[2]) as usize,
                ];
                for (grid, &comp) in grids.iter_mut().zip(comps.iter()) {
                    grid[at] = fab.get(comp, idx);
                }
            }
        }

        Ok(grids)
    }

    pub fn covering_grid(&self, name: &str) -> Result<Array3<f64>> {
        let mut grids = self.covering_grids(&[name])?;
        Ok(grids.remove(0))
    }

    /// Samples a raw (staggered) field once per valid cell on every level.
    ///
    /// The sample taken is the one at the cell's lower corner: for a
    /// node-centred direction this is the node on the cell's low face, so the
    /// extra high node layer and any ghost samples are left out.
    pub fn raw_field(&self, name: &str) -> Result<Array1<f64>> {
        let mut samples = Vec::new();

        for level in 0..=self.header.finest_level {
            let level_dir = self
                .path
                .join(RAW_FIELDS_DIR)
                .join(format!("Level_{}", level));
            let header_path = level_dir.join(format!("{}_H", name));
            if !header_path.exists() {
                if level == 0 {
                    return Err(Error::MissingVariable(format!("{}/{}", RAW_FIELDS_DIR, name)));
                }
                continue;
            }

            let fab_header = FabArrayHeader::read(&header_path)?;
            for (valid, on_disk) in fab_header.boxes.iter().zip(fab_header.fabs.iter()) {
                let fab_path = level_dir.join(&on_disk.file);
                let fab = Fab::read(&fab_path, on_disk.offset)?;
                if fab.ncomp == 0 {
                    return Err(Error::parse(
                        &fab_path,
                        0,
                        format!("FAB of raw field '{}' holds no components", name),
                    ));
                }
                for idx in cell_indices(valid) {
                    if !fab.bx.contains(idx) {
                        return Err(Error::parse(
                            &fab_path,
                            0,
                            format!("sample {:?} lies outside the stored box", idx),
                        ));
                    }
                    samples.push(fab.get(0, idx));
                }
            }
        }

        Ok(Array1::from(samples))
    }

    pub fn particle_header(&self, species: &str) -> Result<ParticleHeader> {
        ParticleHeader::read(&self.path.join(species).join("Header"))
    }

    /// Momentum and weight of every particle of `species`, all levels.
    pub fn species(&self, species: &str) -> Result<ParticleSet> {
        let header = self.particle_header(species)?;

        let mut comps = Vec::with_capacity(4);
        for name in MOMENTUM_COMPONENTS.iter().chain(std::iter::once(&WEIGHT_COMPONENT)) {
            let comp = header
                .real_component(name)
                .ok_or_else(|| Error::MissingComponent {
                    species: species.to_string(),
                    component: name.to_string(),
                })?;
            comps.push(comp);
        }

        let mut columns = read_real_components(&self.path.join(species), &header, &comps)?;
        let weight = columns.pop().unwrap_or_default();
        let pz = columns.pop().unwrap_or_default();
        let py = columns.pop().unwrap_or_default();
        let px = columns.pop().unwrap_or_default();
        debug!("species {}: {} particles", species, weight.len());

        Ok(ParticleSet {
            name: species.to_string(),
            px: Array1::from(px),
            py: Array1::from(py),
            pz: Array1::from(pz),
            weight: Array1::from(weight),
        })
    }
}

/// Global indices of the cells of `bx`, x fastest.
fn cell_indices(bx: &boxes::IndexBox) -> impl Iterator<Item = [i64; 3]> {
    let lo = bx.lo;
    let cells = bx.cells();
    (0..cells[2] as i64).flat_map(move |k| {
        (0..cells[1] as i64).flat_map(move |j| {
            (0..cells[0] as i64).map(move |i| [lo[0] + i, lo[1] + j, lo[2] + k])
        })
    })
}
