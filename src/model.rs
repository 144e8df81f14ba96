//! The model which is solved in a single run.
use crate::catalog::Catalogs;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::ModelParameters;

/// A snapshot of all the data needed for a run
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// The sites, substations and cable types
    pub catalogs: Catalogs,
}
