//! Code for reading [`Site`]s from a CSV file.
use super::{collect_by_id, input_err_msg, read_csv};
use crate::site::{Site, SiteMap};
use anyhow::{Context, Result};
use std::path::Path;

const SITES_FILE_NAME: &str = "sites.csv";

/// Read sites from a CSV file.
///
/// Sites are expected to have been filtered to the region of interest already.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// An [`indexmap::IndexMap`] of sites in file order, or an error
pub fn read_sites(model_dir: &Path) -> Result<SiteMap> {
    let file_path = model_dir.join(SITES_FILE_NAME);
    let sites = read_csv::<Site>(&file_path)?;
    collect_by_id(sites).with_context(|| input_err_msg(&file_path))
}
