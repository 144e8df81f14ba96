//! The end-to-end process of finding the cheapest way to connect sites to substations.
use crate::assignment::AssignmentModel;
use crate::catalog::Catalogs;
use crate::distance::DistanceMatrix;
use crate::model::ModelParameters;
use crate::solution::{Solution, extract_solution};
use crate::solver::Solver;
use anyhow::Result;
use log::info;

/// Build the assignment model, solve it and interpret the result.
///
/// # Arguments
///
/// * `catalogs` - The sites, substations and cable types
/// * `parameters` - Parameters for the model
/// * `solver` - The solver to use
///
/// # Returns
///
/// A [`Solution`], which may indicate that no feasible assignment exists, or an error if the
/// solver failed.
pub fn solve_assignment(
    catalogs: &Catalogs,
    parameters: &ModelParameters,
    solver: &dyn Solver,
) -> Result<Solution> {
    let distances = DistanceMatrix::new(catalogs.sites(), catalogs.substations());

    let options = parameters.assignment_options();
    info!(
        "Building {} model for {} sites, {} substations and {} cable types",
        options.mode,
        catalogs.sites().len(),
        catalogs.substations().len(),
        catalogs.cable_types().len()
    );
    let model = AssignmentModel::build(catalogs, &distances, &options);
    info!(
        "Model has {} variables and {} constraints",
        model.variables().num_variables(),
        model.problem().num_rows()
    );
    if let Some(penalty) = model.slack_penalty() {
        info!("Slack penalty: {penalty} per unit capacity");
    }

    let output = solver.solve(&model, Some(parameters.time_limit()))?;
    info!("Solver status: {}", output.status);

    let solution = extract_solution(
        &model,
        catalogs,
        &distances,
        &output,
        parameters.activity_tolerance,
    )?;
    if let Some(assignment) = &solution.assignment {
        info!(
            "Connected {} sites ({} capacity) at a cost of {}; {} sites ({} capacity) unconnected",
            assignment.connections.len(),
            assignment.total_connected_capacity,
            assignment.total_cost,
            assignment.unconnected_sites.len(),
            assignment.total_unconnected_capacity
        );
    }

    Ok(solution)
}
