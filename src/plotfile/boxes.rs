//! Integer index boxes as written in AMReX headers.
//!
//! A box is written as `((lo) (hi) (type))`, for example
//! `((0,0,0) (31,31,32) (0,0,1))`. The type entries mark each direction as
//! cell (0) or node (1) centred. A node-centred direction carries one sample
//! more than it has cells, so `hi` is one past the last cell.


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBox {
    pub dim: usize,
    pub lo: [i64; 3],
    pub hi: [i64; 3],
    pub nodal: [bool; 3],
}

impl IndexBox {
    /// Parses a single `((lo) (hi) (type))` box. Directions beyond the box's
    /// dimensionality are padded with a single cell at index 0.
    pub fn parse(s: &str) -> Option<Self> {
        let values = integers(s);
        if values.is_empty() || values.len() % 3 != 0 || values.len() > 9 {
            return None;
        }
        let dim = values.len() / 3;

        let mut lo = [0; 3];
        let mut hi = [0; 3];
        let mut nodal = [false; 3];
        for d in 0..dim {
            lo[d] = values[d];
            hi[d] = values[dim + d];
            nodal[d] = match values[2 * dim + d] {
                0 => false,
                1 => true,
                _ => return None,
            };
            if hi[d] < lo[d] {
                return None;
            }
        }

        Some(Self { dim, lo, hi, nodal })
    }

    /// Parses every box on a line, e.g. one domain box per refinement level.
    pub fn parse_all(s: &str) -> Vec<Self> {
        s.split("((")
            .filter(|piece| !piece.trim().is_empty())
            .filter_map(|piece| Self::parse(&format!("(({}", piece)))
            .collect()
    }

    /// Number of stored samples per direction.
    pub fn shape(&self) -> [usize; 3] {
        let mut shape = [1; 3];
        for d in 0..self.dim {
            shape[d] = (self.hi[d] - self.lo[d] + 1) as usize;
        }
        shape
    }

    /// Number of cells per direction, excluding the extra node layer of
    /// node-centred directions.
    pub fn cells(&self) -> [usize; 3] {
        let mut cells = self.shape();
        for d in 0..self.dim {
            if self.nodal[d] {
                cells[d] -= 1;
            }
        }
        cells
    }

    pub fn num_points(&self) -> usize {
        self.shape().iter().product()
    }

    /// Whether the sample at global index `idx` is stored in this box.
    pub fn contains(&self, idx: [i64; 3]) -> bool {
        (0..self.dim).all(|d| idx[d] >= self.lo[d] && idx[d] <= self.hi[d])
            && (self.dim..3).all(|d| idx[d] == 0)
    }

    /// Fortran-order (x fastest) linear offset of `idx` within the box.
    pub fn offset(&self, idx: [i64; 3]) -> usize {
        let shape = self.shape();
        let i = (idx[0] - self.lo[0]) as usize;
        let j = (idx[1] - self.lo[1]) as usize;
        let k = (idx[2] - self.lo[2]) as usize;
        i + shape[0] * (j + shape[1] * k)
    }
}

/// All signed integers in `s`, in order of appearance.
pub(crate) fn integers(s: &str) -> Vec<i64> {
    s.split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse().ok())
        .collect()
}
