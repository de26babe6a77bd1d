//! Writes small synthetic plotfiles and reduced-diagnostic tables.
//!
//! The layout mirrors what the simulation writes: a 3D level-0 domain of
//! 8x4x4 cells split into two grids along x, six cell-centred field
//! components, six staggered raw fields with one ghost layer, and a few
//! particle species. Expected values are computed here from the generated
//! samples, independently of the library's readers.
#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use rand::{rngs::StdRng, Rng, SeedableRng};

pub const C: f64 = 299_792_458.0;
pub const EPSILON_0: f64 = 8.8541878128e-12;
pub const MU_0: f64 = 1.25663706212e-6;
pub const M_E: f64 = 9.1093837015e-31;
pub const M_P: f64 = 1.67262192369e-27;

pub const STEP: u64 = 200;
pub const TIME: f64 = 1.5e-14;

const CELLS: [i64; 3] = [8, 4, 4];
const PROB_HI: [f64; 3] = [8e-6, 4e-6, 4e-6];
/// Level-0 grids, split along x.
const GRIDS: [([i64; 3], [i64; 3]); 2] = [([0, 0, 0], [3, 3, 3]), ([4, 0, 0], [7, 3, 3])];
/// Level-1 patch, refinement ratio 2, over coarse cells (2..=3, 0..=1, 0..=1).
const FINE_GRIDS: [([i64; 3], [i64; 3]); 1] = [([4, 0, 0], [7, 3, 3])];
const FINE_CELLS: usize = 64;
const FIELDS: [&str; 6] = ["Ex", "Ey", "Ez", "Bx", "By", "Bz"];
/// Staggering of the raw fields, Yee layout.
const NODAL: [[bool; 3]; 6] = [
    [false, true, true],
    [true, false, true],
    [true, true, false],
    [true, false, false],
    [false, true, false],
    [false, false, true],
];
/// Stored in ghost samples and the extra node layer, larger than any valid sample.
const JUNK: f64 = 1.0e12;

/// One species' macro-particles.
#[derive(Debug, Clone)]
pub struct Species {
    pub name: String,
    pub mass: f64,
    /// `(px, py, pz, weight)` per particle.
    pub particles: Vec<[f64; 4]>,
}

impl Species {
    pub fn energy(&self) -> f64 {
        self.particles
            .iter()
            .map(|&[px, py, pz, w]| {
                let p2 = px * px + py * py + pz * pz;
                let ke = if self.mass == 0.0 {
                    p2.sqrt() * C
                } else {
                    let rest = self.mass * C * C;
                    p2 * C * C / ((p2 * C * C + rest * rest).sqrt() + rest)
                };
                ke * w
            })
            .sum()
    }
}

/// A consistent synthetic run and the values its tables should hold.
#[derive(Debug, Clone)]
pub struct Synthetic {
    /// Cell-centred values, `[component][i + 8 (j + 4 k)]`.
    pub cell: Vec<Vec<f64>>,
    /// Raw samples at each cell's lower corner, same indexing.
    pub raw: Vec<Vec<f64>>,
    pub species: Vec<Species>,
    /// Second refinement level, if any.
    pub fine: Option<Refinement>,
}

/// A level-1 patch of raw samples, indexed `[component][(i - 4) + 4 (j + 4 k)]`.
#[derive(Debug, Clone)]
pub struct Refinement {
    pub raw: Vec<Vec<f64>>,
    /// Whether `raw_fields/Level_1` is written. The header lists level 1 either way.
    pub with_raw_fields: bool,
}

impl Synthetic {
    /// Random fields of magnitude `e_scale` (electric) and `b_scale`
    /// (magnetic) and a few particles per massive species.
    pub fn random(seed: u64, e_scale: f64, b_scale: f64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let ncells = (CELLS[0] * CELLS[1] * CELLS[2]) as usize;
        let sample = |comp: usize, rng: &mut StdRng| -> Vec<f64> {
            let scale = if comp < 3 { e_scale } else { b_scale };
            (0..ncells)
                .map(|_| rng.random_range(-1.0..1.0) * scale)
                .collect()
        };
        let cell = (0..6).map(|c| sample(c, &mut rng)).collect();
        let raw = (0..6).map(|c| sample(c, &mut rng)).collect();

        let particles = |n: usize, p_scale: f64, rng: &mut StdRng| -> Vec<[f64; 4]> {
            (0..n)
                .map(|_| {
                    [
                        rng.random_range(-1.0..1.0) * p_scale,
                        rng.random_range(-1.0..1.0) * p_scale,
                        rng.random_range(-1.0..1.0) * p_scale,
                        rng.random_range(1.0e3..1.0e4),
                    ]
                })
                .collect()
        };
        let species = vec![
            Species {
                name: "electrons".to_string(),
                mass: M_E,
                particles: particles(7, 1e-22, &mut rng),
            },
            Species {
                name: "protons".to_string(),
                mass: M_P,
                particles: particles(4, 1e-20, &mut rng),
            },
            Species {
                name: "photons".to_string(),
                mass: 0.0,
                particles: Vec::new(),
            },
        ];

        Self {
            cell,
            raw,
            species,
            fine: None,
        }
    }

    /// Adds a refined level whose raw samples are ten times the level-0 scale,
    /// so they set the peaks.
    pub fn refined(
        mut self,
        seed: u64,
        e_scale: f64,
        b_scale: f64,
        with_raw_fields: bool,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let raw = (0..6)
            .map(|comp| {
                let scale = 10.0 * if comp < 3 { e_scale } else { b_scale };
                (0..FINE_CELLS)
                    .map(|_| rng.random_range(-1.0..1.0) * scale)
                    .collect()
            })
            .collect();
        self.fine = Some(Refinement {
            raw,
            with_raw_fields,
        });
        self
    }

    /// Raw samples of `comp` on every level that has raw fields on disk.
    pub fn raw_samples(&self, comp: usize) -> Vec<f64> {
        let mut samples = self.raw[comp].clone();
        if let Some(fine) = self.fine.as_ref().filter(|f| f.with_raw_fields) {
            samples.extend(&fine.raw[comp]);
        }
        samples
    }

    pub fn zero_fields(mut self) -> Self {
        for values in self.cell.iter_mut().chain(self.raw.iter_mut()) {
            values.iter_mut().for_each(|v| *v = 0.0);
        }
        if let Some(fine) = self.fine.as_mut() {
            for values in fine.raw.iter_mut() {
                values.iter_mut().for_each(|v| *v = 0.0);
            }
        }
        self
    }

    pub fn cell_volume(&self) -> f64 {
        (0..3).map(|d| PROB_HI[d] / CELLS[d] as f64).product()
    }

    pub fn field_energy(&self) -> (f64, f64) {
        let sum = |comps: &[Vec<f64>]| -> f64 { comps.iter().flatten().map(|v| v * v).sum() };
        let dv = self.cell_volume();
        (
            0.5 * sum(&self.cell[..3]) * EPSILON_0 * dv,
            0.5 * sum(&self.cell[3..]) / MU_0 * dv,
        )
    }

    pub fn particle_energy(&self) -> f64 {
        self.species.iter().map(Species::energy).sum()
    }

    /// `[max|x|, max|y|, max|z|, max|v|]` of the electric (0) or magnetic (1) raw samples.
    pub fn peaks(&self, which: usize) -> [f64; 4] {
        let comps: Vec<Vec<f64>> = (3 * which..3 * which + 3)
            .map(|comp| self.raw_samples(comp))
            .collect();
        let magnitude = (0..comps[0].len()).map(|n| {
            (comps[0][n] * comps[0][n] + comps[1][n] * comps[1][n] + comps[2][n] * comps[2][n])
                .sqrt()
        });
        [
            max_of(comps[0].iter().map(|v| v.abs())),
            max_of(comps[1].iter().map(|v| v.abs())),
            max_of(comps[2].iter().map(|v| v.abs())),
            max_of(magnitude),
        ]
    }

    /// Writes `<root>/diags/plt00200` and `<root>/diags/reducedfiles`, with
    /// tables matching the plotfile. Returns `(plotfile, reduced_dir)`.
    pub fn write(&self, name: &str) -> (PathBuf, PathBuf) {
        let root = Path::new(env!("CARGO_TARGET_TMPDIR")).join(name);
        if root.exists() {
            fs::remove_dir_all(&root).unwrap();
        }
        let plotfile = root.join("diags").join(format!("plt{:05}", STEP));
        let reduced = root.join("diags").join("reducedfiles");
        fs::create_dir_all(&reduced).unwrap();

        self.write_plotfile(&plotfile);
        let tables = self.tables();
        tables.write(&reduced);
        (plotfile, reduced)
    }

    pub fn write_plotfile(&self, plotfile: &Path) {
        fs::create_dir_all(plotfile.join("Level_0")).unwrap();
        fs::write(plotfile.join("Header"), self.header()).unwrap();
        self.write_cell_fields(&plotfile.join("Level_0"));

        let raw_dir = plotfile.join("raw_fields").join("Level_0");
        fs::create_dir_all(&raw_dir).unwrap();
        for (comp, name) in FIELDS.iter().enumerate() {
            let name = format!("{}_aux", name);
            write_raw_field(&raw_dir, &name, comp, &GRIDS, |idx| self.raw[comp][linear(idx)]);
        }

        if let Some(fine) = self.fine.as_ref().filter(|f| f.with_raw_fields) {
            let fine_dir = plotfile.join("raw_fields").join("Level_1");
            fs::create_dir_all(&fine_dir).unwrap();
            for (comp, name) in FIELDS.iter().enumerate() {
                let name = format!("{}_aux", name);
                write_raw_field(&fine_dir, &name, comp, &FINE_GRIDS, |idx| {
                    fine.raw[comp][fine_linear(idx)]
                });
            }
        }

        for species in &self.species {
            write_species(&plotfile.join(&species.name), species);
        }
    }

    fn write_cell_fields(&self, level_dir: &Path) {
        let boxes: Vec<String> = GRIDS
            .iter()
            .map(|(lo, hi)| box_string(*lo, *hi, [false; 3]))
            .collect();
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for (lo, hi) in GRIDS {
            offsets.push(data.len());
            data.extend(fab_line(lo, hi, [false; 3], 6).into_bytes());
            for comp in 0..6 {
                for_each_index(lo, hi, |idx| {
                    data.extend(self.cell[comp][linear(idx)].to_le_bytes());
                });
            }
        }
        fs::write(level_dir.join("Cell_D_00000"), data).unwrap();
        fs::write(
            level_dir.join("Cell_H"),
            fab_array_header(6, "0", &boxes, "Cell_D_00000", &offsets),
        )
        .unwrap();
    }

    fn header(&self) -> String {
        let finest_level = if self.fine.is_some() { 1 } else { 0 };
        let mut text = String::new();
        text.push_str("HyperCLaw-V1.1\n6\n");
        for name in FIELDS {
            text.push_str(name);
            text.push('\n');
        }
        text.push_str(&format!("3\n{:e}\n{}\n", TIME, finest_level));
        text.push_str("0 0 0\n");
        text.push_str(&format!("{:e} {:e} {:e}\n", PROB_HI[0], PROB_HI[1], PROB_HI[2]));

        let domain = box_string([0, 0, 0], CELLS.map(|n| n - 1), [false; 3]);
        if finest_level == 0 {
            text.push('\n');
            text.push_str(&format!("{}\n{}\n", domain, STEP));
            text.push_str("1e-6 1e-6 1e-6\n");
        } else {
            let fine_domain = box_string([0, 0, 0], CELLS.map(|n| 2 * n - 1), [false; 3]);
            text.push_str("2\n");
            text.push_str(&format!("{} {}\n{} {}\n", domain, fine_domain, STEP, STEP));
            text.push_str("1e-6 1e-6 1e-6\n5e-7 5e-7 5e-7\n");
        }
        text.push_str("0\n0\n");

        level_block(&mut text, 0, &GRIDS, 1e-6);
        if finest_level == 1 {
            level_block(&mut text, 1, &FINE_GRIDS, 5e-7);
        }
        text
    }

    pub fn tables(&self) -> Tables {
        let (electric, magnetic) = self.field_energy();
        let e = self.peaks(0);
        let b = self.peaks(1);

        let mut ep = vec![self.particle_energy()];
        ep.extend(self.species.iter().map(Species::energy));

        let mut ep_labels = vec!["total(J)".to_string()];
        ep_labels.extend(self.species.iter().map(|s| format!("{}(J)", s.name)));

        Tables {
            field_energy: vec![electric + magnetic, electric, magnetic],
            field_energy_labels: vec!["total(J)".into(), "E(J)".into(), "B(J)".into()],
            particle_energy: ep,
            particle_energy_labels: ep_labels,
            max_field: e.iter().chain(b.iter()).copied().collect(),
            max_field_labels: [
                "max_Ex(V/m)",
                "max_Ey(V/m)",
                "max_Ez(V/m)",
                "max_|E|(V/m)",
                "max_Bx(T)",
                "max_By(T)",
                "max_Bz(T)",
                "max_|B|(T)",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Row-1 values of the three tables; row 0 is the all-zero initial step.
#[derive(Debug, Clone)]
pub struct Tables {
    pub field_energy: Vec<f64>,
    pub field_energy_labels: Vec<String>,
    pub particle_energy: Vec<f64>,
    pub particle_energy_labels: Vec<String>,
    pub max_field: Vec<f64>,
    pub max_field_labels: Vec<String>,
}

impl Tables {
    pub fn write(&self, dir: &Path) {
        write_table(&dir.join("EF.txt"), &self.field_energy_labels, &self.field_energy);
        write_table(
            &dir.join("EP.txt"),
            &self.particle_energy_labels,
            &self.particle_energy,
        );
        write_table(&dir.join("MF.txt"), &self.max_field_labels, &self.max_field);
    }
}

fn write_table(path: &Path, labels: &[String], values: &[f64]) {
    let mut text = String::from("#[0]step() [1]time(s)");
    for (i, label) in labels.iter().enumerate() {
        text.push_str(&format!(" [{}]{}", i + 2, label));
    }
    text.push('\n');

    text.push_str("0 0.0");
    for _ in values {
        text.push_str(" 0.0");
    }
    text.push('\n');

    text.push_str(&format!("{} {:e}", STEP, TIME));
    for v in values {
        text.push_str(&format!(" {:e}", v));
    }
    text.push('\n');
    fs::write(path, text).unwrap();
}

/// Writes one raw field component over `grids`, with one ghost layer and the
/// extra node layer filled with junk.
fn write_raw_field(
    dir: &Path,
    name: &str,
    comp: usize,
    grids: &[([i64; 3], [i64; 3])],
    sample: impl Fn([i64; 3]) -> f64,
) {
    let nodal = NODAL[comp];
    let mut boxes = Vec::new();
    let mut data = Vec::new();
    let mut offsets = Vec::new();
    for &(lo, hi) in grids {
        // node-centred directions carry one more sample than cells
        let mut valid_hi = hi;
        for d in 0..3 {
            if nodal[d] {
                valid_hi[d] += 1;
            }
        }
        boxes.push(box_string(lo, valid_hi, nodal));

        let stored_lo = lo.map(|v| v - 1);
        let stored_hi = valid_hi.map(|v| v + 1);
        offsets.push(data.len());
        data.extend(fab_line(stored_lo, stored_hi, nodal, 1).into_bytes());
        for_each_index(stored_lo, stored_hi, |idx| {
            let inside = (0..3).all(|d| idx[d] >= lo[d] && idx[d] <= hi[d]);
            let value = if inside { sample(idx) } else { JUNK };
            data.extend(value.to_le_bytes());
        });
    }
    let data_file = format!("{}_D_00000", name);
    fs::write(dir.join(&data_file), data).unwrap();
    fs::write(
        dir.join(format!("{}_H", name)),
        fab_array_header(1, "(1,1,1)", &boxes, &data_file, &offsets),
    )
    .unwrap();
}

/// Overwrites a level-0 raw field with a single FAB that holds no components.
pub fn write_componentless_raw_field(plotfile: &Path, name: &str) {
    let dir = plotfile.join("raw_fields").join("Level_0");
    let data_file = format!("{}_D_00000", name);
    fs::write(
        dir.join(&data_file),
        fab_line([0, 0, 0], [0, 0, 0], [false; 3], 0),
    )
    .unwrap();
    let boxes = vec![box_string([0, 0, 0], [0, 0, 0], [false; 3])];
    fs::write(
        dir.join(format!("{}_H", name)),
        fab_array_header(0, "0", &boxes, &data_file, &[0]),
    )
    .unwrap();
}

/// Appends one level's grid count, step, physical grid extents and prefix.
fn level_block(text: &mut String, level: usize, grids: &[([i64; 3], [i64; 3])], dx: f64) {
    text.push_str(&format!("{} {} {:e}\n{}\n", level, grids.len(), TIME, STEP));
    for &(lo, hi) in grids {
        for d in 0..3 {
            let extent = (lo[d] as f64 * dx, (hi[d] + 1) as f64 * dx);
            text.push_str(&format!("{:e} {:e}\n", extent.0, extent.1));
        }
    }
    text.push_str(&format!("Level_{}/Cell\n", level));
}

fn write_species(dir: &Path, species: &Species) {
    let level_dir = dir.join("Level_0");
    fs::create_dir_all(&level_dir).unwrap();

    // split into two grids, the second possibly empty
    let split = species.particles.len() / 2;
    let chunks = [&species.particles[..split], &species.particles[split..]];

    let mut data = Vec::new();
    let mut entries = Vec::new();
    for chunk in chunks {
        entries.push(format!("0 {} {}", chunk.len(), data.len()));
        for (n, _) in chunk.iter().enumerate() {
            data.extend((n as i32 + 1).to_le_bytes());
            data.extend(0i32.to_le_bytes());
        }
        for &[px, py, pz, w] in chunk {
            // x, y, z, then weight and the momenta
            for v in [0.5e-6, 0.5e-6, 0.5e-6, w, px, py, pz] {
                data.extend(v.to_le_bytes());
            }
        }
    }
    if !species.particles.is_empty() {
        fs::write(level_dir.join("DATA_00000"), data).unwrap();
    }

    let text = format!(
        "Version_Two_Dot_One_double\n3\n4\nweight\nmomentum_x\nmomentum_y\nmomentum_z\n0\n0\n{}\n{}\n0\n2\n{}\n{}\n",
        species.particles.len(),
        species.particles.len() + 1,
        entries[0],
        entries[1]
    );
    fs::write(dir.join("Header"), text).unwrap();
}

fn fab_array_header(
    ncomp: usize,
    nghost: &str,
    boxes: &[String],
    data_file: &str,
    offsets: &[usize],
) -> String {
    let mut text = format!("1\n0\n{}\n{}\n({} 0\n", ncomp, nghost, boxes.len());
    for bx in boxes {
        text.push_str(bx);
        text.push('\n');
    }
    text.push_str(&format!(")\n{}\n", offsets.len()));
    for offset in offsets {
        text.push_str(&format!("FabOnDisk: {} {}\n", data_file, offset));
    }
    text
}

fn fab_line(lo: [i64; 3], hi: [i64; 3], nodal: [bool; 3], ncomp: usize) -> String {
    format!(
        "FAB ((8, (64 11 52 0 1 12 0 1023)),(8, (8 7 6 5 4 3 2 1))){} {}\n",
        box_string(lo, hi, nodal),
        ncomp
    )
}

fn box_string(lo: [i64; 3], hi: [i64; 3], nodal: [bool; 3]) -> String {
    format!(
        "(({},{},{}) ({},{},{}) ({},{},{}))",
        lo[0],
        lo[1],
        lo[2],
        hi[0],
        hi[1],
        hi[2],
        nodal[0] as u8,
        nodal[1] as u8,
        nodal[2] as u8
    )
}

/// Visits every index of the box, x fastest.
fn for_each_index(lo: [i64; 3], hi: [i64; 3], mut f: impl FnMut([i64; 3])) {
    for k in lo[2]..=hi[2] {
        for j in lo[1]..=hi[1] {
            for i in lo[0]..=hi[0] {
                f([i, j, k]);
            }
        }
    }
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0_f64, f64::max)
}

fn linear(idx: [i64; 3]) -> usize {
    (idx[0] + CELLS[0] * (idx[1] + CELLS[1] * idx[2])) as usize
}

fn fine_linear(idx: [i64; 3]) -> usize {
    ((idx[0] - 4) + 4 * (idx[1] + 4 * idx[2])) as usize
}
