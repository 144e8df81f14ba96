//! Code for reading the cable catalog from a CSV file.
use super::{collect_by_id, input_err_msg, read_csv};
use crate::cable::{CableType, CableTypeMap};
use anyhow::{Context, Result};
use std::path::Path;

const CABLE_TYPES_FILE_NAME: &str = "cable_types.csv";

/// Read cable types from a CSV file.
///
/// The order of rows in the file determines the catalog order.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The cable catalog or an error
pub fn read_cable_types(model_dir: &Path) -> Result<CableTypeMap> {
    let file_path = model_dir.join(CABLE_TYPES_FILE_NAME);
    let cable_types = read_csv::<CableType>(&file_path)?;
    collect_by_id(cable_types).with_context(|| input_err_msg(&file_path))
}
