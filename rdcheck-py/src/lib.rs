use std::path::PathBuf;

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use rdcheck::{settings, verification::Verification};

/// Checks a plotfile against its reduced diagnostics with the default settings.
///
/// Returns one `(label, difference, tolerance, passed)` tuple per check.
#[pyfunction]
#[pyo3(signature = (plotfile, reduced_dir=None))]
fn verify(
    plotfile: PathBuf,
    reduced_dir: Option<PathBuf>,
) -> PyResult<Vec<(String, f64, f64, bool)>> {
    let run = || -> anyhow::Result<Vec<(String, f64, f64, bool)>> {
        let mut config = settings::load_default_config()?;
        config.plotfile = plotfile;
        if let Some(dir) = reduced_dir {
            config.reduced_dir = dir;
        }
        let mut verification = Verification::new(config)?;
        verification.solve()?;
        Ok(verification
            .report
            .checks
            .iter()
            .map(|check| {
                (
                    check.quantity.name().to_string(),
                    check.difference,
                    check.tolerance,
                    check.passed(),
                )
            })
            .collect())
    };
    run().map_err(|e| PyRuntimeError::new_err(format!("{:#}", e)))
}

/// Python bindings of the reduced-diagnostics checker.
#[pymodule]
fn rdcheck_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(verify, m)?)?;
    Ok(())
}
