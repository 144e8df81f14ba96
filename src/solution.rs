//! Interpreting solver output as connections between sites and substations.
use crate::assignment::{AssignmentMode, AssignmentModel};
use crate::cable::CableTypeID;
use crate::catalog::Catalogs;
use crate::distance::DistanceMatrix;
use crate::site::SiteID;
use crate::solver::{SolveStatus, SolverOutput};
use crate::substation::SubstationID;
use crate::units::{Capacity, Distance, Money, MoneyPerCapacity};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

/// A site connected to a substation via a particular type of cable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    /// The connected site
    pub site_id: SiteID,
    /// The substation the site is connected to
    pub substation_id: SubstationID,
    /// The type of cable used
    pub cable_type_id: CableTypeID,
    /// The site's capacity
    pub capacity: Capacity,
    /// The distance between the site and the substation
    pub distance: Distance,
    /// The cost of laying the cable
    pub cost: Money,
}

/// The connections chosen by the optimisation
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Active connections, in site order
    pub connections: Vec<Connection>,
    /// Sites left unconnected (relaxed mode only), in site order
    pub unconnected_sites: Vec<SiteID>,
    /// The total cost of all connections, excluding penalties
    pub total_cost: Money,
    /// The total capacity of connected sites
    pub total_connected_capacity: Capacity,
    /// The total capacity of unconnected sites
    pub total_unconnected_capacity: Capacity,
    /// The number of distinct substations with at least one connection
    pub substations_used: usize,
}

impl Assignment {
    /// The total capacity of sites connected to each substation.
    ///
    /// Every substation in `catalogs` is included, in catalog order.
    pub fn substation_loads(&self, catalogs: &Catalogs) -> IndexMap<SubstationID, Capacity> {
        let mut loads: IndexMap<_, _> = catalogs
            .substations()
            .keys()
            .map(|id| (id.clone(), Capacity(0.0)))
            .collect();
        for connection in &self.connections {
            if let Some(load) = loads.get_mut(&connection.substation_id) {
                *load += connection.capacity;
            }
        }

        loads
    }
}

/// The result of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// The outcome of the solve
    pub status: SolveStatus,
    /// The mode the model was built in
    pub mode: AssignmentMode,
    /// The slack penalty used (relaxed mode only)
    pub slack_penalty: Option<MoneyPerCapacity>,
    /// The objective value reported by the solver, including any penalty terms
    pub objective_value: Option<f64>,
    /// The chosen connections, or `None` if no feasible solution was found
    pub assignment: Option<Assignment>,
}

/// Interpret the output of a solver.
///
/// # Arguments
///
/// * `model` - The model which was solved
/// * `catalogs` - The catalogs the model was built from
/// * `distances` - The distances the model was built from
/// * `output` - The solver's output
/// * `tolerance` - Decision variables with values above this are considered active
///
/// # Returns
///
/// The solution or an error if the solver failed or the values are inconsistent with the model.
pub fn extract_solution(
    model: &AssignmentModel,
    catalogs: &Catalogs,
    distances: &DistanceMatrix,
    output: &SolverOutput,
    tolerance: f64,
) -> Result<Solution> {
    let assignment = match output.status {
        SolveStatus::Error => bail!("The solver failed to solve the model"),
        SolveStatus::Infeasible | SolveStatus::TimedOutNoFeasible => None,
        SolveStatus::Optimal | SolveStatus::TimedOutFeasible => {
            let values = output
                .values
                .as_deref()
                .with_context(|| {
                    format!("Solver returned status {} but no values", output.status)
                })?;
            Some(extract_assignment(
                model, catalogs, distances, values, tolerance,
            )?)
        }
    };

    Ok(Solution {
        status: output.status,
        mode: model.mode(),
        slack_penalty: model.slack_penalty(),
        objective_value: output.objective,
        assignment,
    })
}

fn extract_assignment(
    model: &AssignmentModel,
    catalogs: &Catalogs,
    distances: &DistanceMatrix,
    values: &[f64],
    tolerance: f64,
) -> Result<Assignment> {
    let variables = model.variables();
    ensure!(
        values.len() == variables.num_variables(),
        "Expected {} variable values, got {}",
        variables.num_variables(),
        values.len()
    );

    let mut connections = Vec::new();
    let mut unconnected_sites = Vec::new();
    for (site_idx, site) in catalogs.sites().values().enumerate() {
        let active = variables
            .iter_decisions_for_site(site_idx)
            .filter(|key| values[variables.decision(*key).index()] > tolerance)
            .collect_vec();

        match active.as_slice() {
            [] if model.mode() == AssignmentMode::Baseline => {
                bail!("Site {} has no active connection", site.id)
            }
            [] => unconnected_sites.push(site.id.clone()),
            [key] => {
                let substation = &catalogs.substations()[key.substation];
                let cable_type = &catalogs.cable_types()[key.cable];
                let distance = distances.get(key.site, key.substation);
                connections.push(Connection {
                    site_id: site.id.clone(),
                    substation_id: substation.id.clone(),
                    cable_type_id: cable_type.id.clone(),
                    capacity: site.capacity,
                    distance,
                    cost: distance * cable_type.cost_per_unit_distance,
                });
            }
            _ => bail!(
                "Site {} has {} active connections; only one is permitted",
                site.id,
                active.len()
            ),
        }
    }

    let sites = catalogs.sites();
    Ok(Assignment {
        total_cost: connections.iter().map(|conn| conn.cost).sum(),
        total_connected_capacity: connections.iter().map(|conn| conn.capacity).sum(),
        total_unconnected_capacity: unconnected_sites
            .iter()
            .map(|id| sites[id].capacity)
            .sum(),
        substations_used: connections
            .iter()
            .map(|conn| &conn.substation_id)
            .unique()
            .count(),
        connections,
        unconnected_sites,
    })
}
