//! Code for reading [`Substation`]s from a CSV file.
use super::{collect_by_id, input_err_msg, read_csv};
use crate::substation::{Substation, SubstationMap};
use crate::units::Capacity;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const SUBSTATIONS_FILE_NAME: &str = "substations.csv";

#[derive(Deserialize, PartialEq, Debug)]
struct SubstationRaw {
    id: String,
    latitude: f64,
    longitude: f64,
    /// Overrides the model-wide default if present
    #[serde(default)]
    capacity_limit: Option<Capacity>,
}

/// Read substations from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `default_capacity_limit` - Capacity limit for substations which don't specify one
///
/// # Returns
///
/// An [`indexmap::IndexMap`] of substations in file order, or an error
pub fn read_substations(
    model_dir: &Path,
    default_capacity_limit: Capacity,
) -> Result<SubstationMap> {
    let file_path = model_dir.join(SUBSTATIONS_FILE_NAME);
    let substations_csv = read_csv(&file_path)?;
    read_substations_from_iter(substations_csv, default_capacity_limit)
        .with_context(|| input_err_msg(&file_path))
}

fn read_substations_from_iter<I>(iter: I, default_capacity_limit: Capacity) -> Result<SubstationMap>
where
    I: Iterator<Item = SubstationRaw>,
{
    collect_by_id(iter.map(|raw| Substation {
        id: raw.id.into(),
        latitude: raw.latitude,
        longitude: raw.longitude,
        capacity_limit: raw.capacity_limit.unwrap_or(default_capacity_limit),
    }))
}
