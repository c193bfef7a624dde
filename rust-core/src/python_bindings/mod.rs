//! PyO3 bindings for Python integration

use pyo3::prelude::*;

mod spectrum_bindings;

/// Python module definition
#[pymodule]
fn spek(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<spectrum_bindings::PyWindowType>()?;
    m.add_class::<spectrum_bindings::PyAnalysis>()?;

    m.add_function(wrap_pyfunction!(spectrum_bindings::analyze, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::decode, m)?)?;

    Ok(())
}
