use std::{fs::File, io::BufWriter, io::Write, path::Path};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use crate::{
    check::Check,
    verification::{Quantities, ReducedValues, Verification},
};


/// Serialized form of a finished check.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    plotfile: &'a str,
    step: u64,
    time: f64,
    passed: bool,
    checks: &'a [Check],
    plotfile_values: &'a Quantities,
    reduced_values: &'a ReducedValues,
}

/// Write the report, both sides' values and a timestamp to `path` as JSON
pub fn write_json(path: &Path, verification: &Verification) -> Result<()> {
    let header = &verification.plotfile.header;
    let plotfile = verification.settings.plotfile.to_string_lossy();
    let report = JsonReport {
        generated_at: Local::now().to_rfc3339(),
        plotfile: &plotfile,
        step: header.levels.first().map(|l| l.step).unwrap_or_default(),
        time: header.time,
        passed: verification.report.passed(),
        checks: &verification.report.checks,
        plotfile_values: &verification.quantities,
        reduced_values: &verification.reduced,
    };

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
