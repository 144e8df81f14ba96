//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::assignment::{AssignmentMode, AssignmentOptions};
use crate::input::{input_err_msg, read_toml};
use crate::units::{Capacity, Dimensionless, MoneyPerCapacity};
use anyhow::{Context, Result, ensure};
use log::info;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_relaxation_factor, Dimensionless, 10.0);
define_unit_param_default!(default_slack_penalty, MoneyPerCapacity, 1e6);
define_unit_param_default!(default_substation_capacity, Capacity, 1000.0);
define_param_default!(default_activity_tolerance, f64, 0.01);
define_param_default!(default_time_limit, f64, 300.0);

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Whether sites may be left unconnected
    #[serde(default)]
    pub mode: AssignmentMode,
    /// The multiplier applied to cable capacity limits in relaxed mode
    #[serde(default = "default_relaxation_factor")]
    pub relaxation_factor: Dimensionless,
    /// The cost per unit of capacity of leaving a site unconnected in relaxed mode.
    ///
    /// If this is too small to dominate every possible connection cost, a larger value is derived
    /// from the catalogs instead.
    #[serde(default = "default_slack_penalty")]
    pub slack_penalty: MoneyPerCapacity,
    /// Variables with values above this are considered to be active connections
    #[serde(default = "default_activity_tolerance")]
    pub activity_tolerance: f64,
    /// The maximum time to allow the solver to run for, in seconds
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
    /// The capacity limit for substations which don't specify their own
    #[serde(default = "default_substation_capacity")]
    pub default_substation_capacity: Capacity,
}

impl Default for ModelParameters {
    fn default() -> Self {
        toml::from_str("").expect("Cannot create parameters from empty TOML file")
    }
}

/// Check that the `relaxation_factor` parameter is valid
fn check_relaxation_factor(value: Dimensionless) -> Result<()> {
    ensure!(
        value.is_finite() && value >= Dimensionless(1.0),
        "relaxation_factor must be a finite number greater than or equal to one"
    );

    Ok(())
}

/// Check that the `slack_penalty` parameter is valid
fn check_slack_penalty(value: MoneyPerCapacity) -> Result<()> {
    ensure!(
        value.is_finite() && value > MoneyPerCapacity(0.0),
        "slack_penalty must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that the `activity_tolerance` parameter is valid
fn check_activity_tolerance(value: f64) -> Result<()> {
    ensure!(
        value > 0.0 && value < 1.0,
        "activity_tolerance must be between zero and one (exclusive)"
    );

    Ok(())
}

/// Check that the `time_limit` parameter is valid
fn check_time_limit(value: f64) -> Result<()> {
    ensure!(
        value > 0.0 && Duration::try_from_secs_f64(value).is_ok(),
        "time_limit must be a finite number of seconds greater than zero"
    );

    Ok(())
}

/// Check that the `default_substation_capacity` parameter is valid
fn check_default_substation_capacity(value: Capacity) -> Result<()> {
    ensure!(
        value.is_finite() && value >= Capacity(0.0),
        "default_substation_capacity must be a finite number greater than or equal to zero"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// If the file is not present, default values are used for all parameters.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        if !file_path.is_file() {
            info!("No {MODEL_PARAMETERS_FILE_NAME} found; using default parameters");
            return Ok(ModelParameters::default());
        }

        let model_params: ModelParameters = read_toml(&file_path)?;
        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    pub fn validate(&self) -> Result<()> {
        check_relaxation_factor(self.relaxation_factor)?;
        check_slack_penalty(self.slack_penalty)?;
        check_activity_tolerance(self.activity_tolerance)?;
        check_time_limit(self.time_limit)?;
        check_default_substation_capacity(self.default_substation_capacity)?;

        Ok(())
    }

    /// The options for building an assignment model
    pub fn assignment_options(&self) -> AssignmentOptions {
        AssignmentOptions {
            mode: self.mode,
            relaxation_factor: self.relaxation_factor,
            slack_penalty: self.slack_penalty,
        }
    }

    /// The solver time limit as a [`Duration`]
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.time_limit)
    }
}
