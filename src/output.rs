//! The module responsible for writing output data to disk.
use crate::catalog::Catalogs;
use crate::site::SiteID;
use crate::solution::{Assignment, Solution};
use crate::substation::SubstationID;
use crate::units::Capacity;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;
pub use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "gridlink_results";

/// The output file name for connections
const CONNECTIONS_FILE_NAME: &str = "connections.csv";

/// The output file name for unconnected sites
const UNCONNECTED_SITES_FILE_NAME: &str = "unconnected_sites.csv";

/// The output file name for substation loads
const SUBSTATION_LOADS_FILE_NAME: &str = "substation_loads.csv";

/// The output file name for the summary
const SUMMARY_FILE_NAME: &str = "summary.toml";

/// Get the default output directory for the model in the specified directory
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory at `output_dir`.
///
/// If the directory already exists and is not empty, it is only replaced if `allow_overwrite` is
/// true.
///
/// # Returns
///
/// Whether an existing directory was overwritten, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if output_dir.is_dir() {
        let is_empty = output_dir.read_dir()?.next().is_none();
        if is_empty {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass \
            the --overwrite command-line option."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the unconnected sites CSV file
#[derive(Serialize, Debug, PartialEq)]
struct UnconnectedSiteRow {
    site_id: SiteID,
    capacity: Capacity,
}

/// Represents a row in the substation loads CSV file
#[derive(Serialize, Debug, PartialEq)]
struct SubstationLoadRow {
    substation_id: SubstationID,
    load: Capacity,
    capacity_limit: Capacity,
}

/// The contents of the summary file
#[derive(Serialize, Debug, PartialEq)]
struct Summary {
    status: String,
    mode: String,
    feasible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    slack_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    objective_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    totals: Option<Totals>,
}

/// Aggregate values for a feasible assignment
#[derive(Serialize, Debug, PartialEq)]
struct Totals {
    cost: f64,
    connected_capacity: f64,
    unconnected_capacity: f64,
    num_connections: usize,
    num_unconnected_sites: usize,
    substations_used: usize,
}

impl Summary {
    fn new(solution: &Solution) -> Self {
        Self {
            status: solution.status.to_string(),
            mode: solution.mode.to_string(),
            feasible: solution.assignment.is_some(),
            slack_penalty: solution.slack_penalty.map(|penalty| penalty.value()),
            objective_value: solution.objective_value,
            totals: solution.assignment.as_ref().map(|assignment| Totals {
                cost: assignment.total_cost.value(),
                connected_capacity: assignment.total_connected_capacity.value(),
                unconnected_capacity: assignment.total_unconnected_capacity.value(),
                num_connections: assignment.connections.len(),
                num_unconnected_sites: assignment.unconnected_sites.len(),
                substations_used: assignment.substations_used,
            }),
        }
    }
}

/// Write the solution to files in the output directory.
///
/// A summary is always written. Details of connections are only written if a feasible assignment
/// was found.
pub fn write_solution(output_dir: &Path, solution: &Solution, catalogs: &Catalogs) -> Result<()> {
    let file_path = output_dir.join(SUMMARY_FILE_NAME);
    fs::write(&file_path, toml::to_string(&Summary::new(solution))?)
        .with_context(|| format!("Could not write {}", file_path.display()))?;

    if let Some(assignment) = &solution.assignment {
        write_assignment(output_dir, assignment, catalogs)?;
    }

    Ok(())
}

/// Write a series of rows to a CSV file
fn write_csv<T, I>(file_path: &Path, rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Write CSV files describing the connections in an assignment
fn write_assignment(output_dir: &Path, assignment: &Assignment, catalogs: &Catalogs) -> Result<()> {
    write_csv(
        &output_dir.join(CONNECTIONS_FILE_NAME),
        &assignment.connections,
    )?;

    let sites = catalogs.sites();
    write_csv(
        &output_dir.join(UNCONNECTED_SITES_FILE_NAME),
        assignment
            .unconnected_sites
            .iter()
            .map(|site_id| UnconnectedSiteRow {
                site_id: site_id.clone(),
                capacity: sites[site_id].capacity,
            }),
    )?;

    let substations = catalogs.substations();
    write_csv(
        &output_dir.join(SUBSTATION_LOADS_FILE_NAME),
        assignment
            .substation_loads(catalogs)
            .into_iter()
            .map(|(substation_id, load)| SubstationLoadRow {
                capacity_limit: substations[&substation_id].capacity_limit,
                substation_id,
                load,
            }),
    )?;

    Ok(())
}
