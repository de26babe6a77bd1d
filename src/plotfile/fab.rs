//! FabArray headers (`*_H`) and the binary FAB blocks they point to.
//!
//! A FabArray header lists the valid box of every grid and where its data
//! lives: a data file name relative to the header's directory and a byte
//! offset into it. At that offset each FAB starts with an ASCII line
//!
//! ```text
//! FAB ((8, (64 11 52 0 1 12 0 1023)),(8, (8 7 6 5 4 3 2 1)))((0,0,0) (7,7,7) (0,0,0)) 6
//! ```
//!
//! giving the real width, the byte order, the stored box (including ghost
//! samples) and the number of components, followed by the raw reals in
//! Fortran order, each component stored contiguously.

use std::{
    fs::File,
    io::{BufRead, BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use super::boxes::{integers, IndexBox};
use super::error::{Error, Result};
use super::text::{read_to_string, TextCursor};


/// Width and byte order of stored reals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealFormat {
    pub bytes: usize,
    pub big_endian: bool,
}

impl RealFormat {
    pub fn new(bytes: usize, big_endian: bool) -> Self {
        Self { bytes, big_endian }
    }

    /// Converts raw bytes into reals. Callers guarantee `bytes` is 4 or 8.
    pub fn decode(&self, raw: &[u8]) -> Vec<f64> {
        match (self.bytes, self.big_endian) {
            (8, false) => raw
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
            (8, true) => raw
                .chunks_exact(8)
                .map(|c| f64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
            (_, false) => raw
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
                .collect(),
            (_, true) => raw
                .chunks_exact(4)
                .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FabOnDisk {
    pub file: String,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FabArrayHeader {
    pub ncomp: usize,
    pub nghost: [usize; 3],
    /// Valid (ghost-free) box of every grid.
    pub boxes: Vec<IndexBox>,
    pub fabs: Vec<FabOnDisk>,
}

impl FabArrayHeader {
    pub fn read(path: &Path) -> Result<Self> {
        let text = read_to_string(path)?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut cursor = TextCursor::new(path, text);

        let _version: i32 = cursor.next_parsed("FabArray version")?;
        let _how: i32 = cursor.next_parsed("FabArray layout")?;
        let ncomp: usize = cursor.next_parsed("number of components")?;

        let ghost_line = cursor.next_line("ghost count")?;
        let ghosts = integers(ghost_line);
        let nghost = match ghosts.as_slice() {
            [n] if *n >= 0 => [*n as usize; 3],
            values if !values.is_empty() && values.len() <= 3 && values.iter().all(|n| *n >= 0) => {
                let mut nghost = [0; 3];
                for (d, n) in values.iter().enumerate() {
                    nghost[d] = *n as usize;
                }
                nghost
            }
            _ => return Err(cursor.error(format!("invalid ghost count '{}'", ghost_line))),
        };

        let opening = cursor.next_line("box array")?;
        let nboxes = opening
            .trim_start_matches('(')
            .split_whitespace()
            .next()
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| cursor.error(format!("invalid box array opening '{}'", opening)))?;

        let mut boxes = Vec::with_capacity(nboxes);
        loop {
            let line = cursor.next_line("box")?;
            if line.starts_with(')') {
                break;
            }
            let parsed = IndexBox::parse_all(line);
            if parsed.is_empty() {
                return Err(cursor.error(format!("invalid box '{}'", line)));
            }
            boxes.extend(parsed);
        }
        if boxes.len() != nboxes {
            return Err(cursor.error(format!(
                "box array declares {} boxes but lists {}",
                nboxes,
                boxes.len()
            )));
        }

        let nfabs: usize = cursor.next_parsed("number of FABs")?;
        if nfabs != nboxes {
            return Err(cursor.error(format!("{} FABs listed for {} boxes", nfabs, nboxes)));
        }
        let mut fabs = Vec::with_capacity(nfabs);
        for _ in 0..nfabs {
            let line = cursor.next_line("FabOnDisk entry")?;
            let mut tokens = line.split_whitespace();
            let (tag, file, offset) = (tokens.next(), tokens.next(), tokens.next());
            match (tag, file, offset.and_then(|o| o.parse::<u64>().ok())) {
                (Some("FabOnDisk:"), Some(file), Some(offset)) => fabs.push(FabOnDisk {
                    file: file.to_string(),
                    offset,
                }),
                _ => return Err(cursor.error(format!("invalid FabOnDisk entry '{}'", line))),
            }
        }

        Ok(Self {
            ncomp,
            nghost,
            boxes,
            fabs,
        })
    }
}

/// One grid's data block, all components.
#[derive(Debug, Clone, PartialEq)]
pub struct Fab {
    /// Stored box, ghost samples included.
    pub bx: IndexBox,
    pub ncomp: usize,
    pub data: Vec<f64>,
}

impl Fab {
    pub fn read(path: &Path, offset: u64) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io(path, e))?;

        let mut line = Vec::new();
        reader
            .read_until(b'\n', &mut line)
            .map_err(|e| Error::io(path, e))?;
        let line = String::from_utf8_lossy(&line);
        let (format, bx, ncomp) = parse_fab_line(line.trim()).ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            line: 0,
            details: format!("invalid FAB header at offset {}: '{}'", offset, line.trim()),
        })?;
        if format.bytes != 4 && format.bytes != 8 {
            return Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
                details: format!("{}-byte reals", format.bytes),
            });
        }

        let expected = bx.num_points() * ncomp * format.bytes;
        let mut raw = vec![0u8; expected];
        reader.read_exact(&mut raw).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::Truncated {
                path: path.to_path_buf(),
                expected,
            },
            _ => Error::io(path, e),
        })?;

        Ok(Self {
            bx,
            ncomp,
            data: format.decode(&raw),
        })
    }

    /// Value of component `comp` at global index `idx`, which must lie inside
    /// the stored box.
    pub fn get(&self, comp: usize, idx: [i64; 3]) -> f64 {
        self.data[comp * self.bx.num_points() + self.bx.offset(idx)]
    }
}

/// Splits a `FAB (...)<box> <ncomp>` line into its parts.
fn parse_fab_line(line: &str) -> Option<(RealFormat, IndexBox, usize)> {
    let descriptor = line.strip_prefix("FAB")?;
    let box_start = descriptor.rfind("((")?;
    let box_end = box_start + descriptor[box_start..].find("))")? + 2;

    let bx = IndexBox::parse(&descriptor[box_start..box_end])?;
    let ncomp = descriptor[box_end..].trim().parse().ok()?;

    // (bytes, (format...)),(bytes, (order...))
    let values = integers(&descriptor[..box_start]);
    let bytes = *values.first()? as usize;
    if bytes == 0 || values.len() < bytes {
        return None;
    }
    let order = &values[values.len() - bytes..];
    let big_endian = bytes > 1 && order[0] == 1;

    Some((RealFormat::new(bytes, big_endian), bx, ncomp))
}
