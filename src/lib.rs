use pyo3::pymodule;

pub mod messages;
pub mod pad_engine;

/// The Python module implemented in Rust.
#[pymodule]
mod pad_dispatch {
    #[pymodule_export]
    use super::pad_engine::PadSurface;
}
