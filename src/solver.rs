//! Solving assignment models.
//!
//! The [`Solver`] trait decouples the model from any particular MILP backend. [`HighsSolver`] is
//! the implementation used by the program.
use crate::assignment::AssignmentModel;
use anyhow::{Result, anyhow};
use highs::{HighsModelStatus, RowProblem, Sense};
use log::{debug, error, log_enabled, warn};
use std::time::Duration;

/// Absolute tolerance used when checking whether a solution returned by a solver is feasible
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// The outcome of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SolveStatus {
    /// A provably optimal solution was found
    #[strum(serialize = "optimal")]
    Optimal,
    /// The model has no feasible solution
    #[strum(serialize = "infeasible")]
    Infeasible,
    /// The time limit was reached, but a feasible (possibly suboptimal) solution was found
    #[strum(serialize = "timed out with feasible solution")]
    TimedOutFeasible,
    /// The time limit was reached before any feasible solution was found
    #[strum(serialize = "timed out without feasible solution")]
    TimedOutNoFeasible,
    /// The solver failed for some other reason
    #[strum(serialize = "error")]
    Error,
}

impl SolveStatus {
    /// Whether a solve with this status yields a usable solution
    pub fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::TimedOutFeasible)
    }
}

/// The raw result of a solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    /// The outcome of the solve
    pub status: SolveStatus,
    /// The value of every variable, in column order (only present if there is a solution)
    pub values: Option<Vec<f64>>,
    /// The value of the objective function (only present if there is a solution)
    pub objective: Option<f64>,
}

impl SolverOutput {
    /// An output with the given status and no solution
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            values: None,
            objective: None,
        }
    }
}

/// A MILP solver which can solve an [`AssignmentModel`]
pub trait Solver {
    /// Solve the model, stopping after `time_limit`, if provided.
    ///
    /// Returns an error only if the solver could not be run at all. Failures during solving are
    /// reported via [`SolveStatus::Error`].
    fn solve(&self, model: &AssignmentModel, time_limit: Option<Duration>) -> Result<SolverOutput>;
}

/// A [`Solver`] which uses the HiGHS library
#[derive(Debug, Default, Clone)]
pub struct HighsSolver;

impl Solver for HighsSolver {
    fn solve(&self, model: &AssignmentModel, time_limit: Option<Duration>) -> Result<SolverOutput> {
        let mut highs_model = to_highs_problem(model).optimise(Sense::Minimise);
        enable_highs_logging(&mut highs_model);
        if let Some(time_limit) = time_limit {
            highs_model.set_option("time_limit", time_limit.as_secs_f64());
        }

        let solved = highs_model
            .try_solve()
            .map_err(|status| anyhow!("Could not solve: {status:?}"))?;

        let status = solved.status();
        debug!("HiGHS finished with status {status:?}");
        let values = solved.get_solution().columns().to_vec();
        let status = classify_status(model, status, &values);
        if !status.has_solution() {
            return Ok(SolverOutput::without_solution(status));
        }

        Ok(SolverOutput {
            status,
            values: Some(values),
            objective: Some(solved.objective_value()),
        })
    }
}

/// Map the status reported by HiGHS onto a [`SolveStatus`].
///
/// If the time limit was reached, `values` holds the best solution HiGHS found, which is only
/// accepted if it satisfies every constraint of the model.
fn classify_status(
    model: &AssignmentModel,
    status: HighsModelStatus,
    values: &[f64],
) -> SolveStatus {
    match status {
        HighsModelStatus::Optimal => SolveStatus::Optimal,
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            SolveStatus::Infeasible
        }
        HighsModelStatus::ReachedTimeLimit => {
            if model.is_feasible(values, FEASIBILITY_TOLERANCE) {
                warn!("Time limit reached; the solution found may not be optimal");
                SolveStatus::TimedOutFeasible
            } else {
                warn!("Time limit reached before a feasible solution was found");
                SolveStatus::TimedOutNoFeasible
            }
        }
        status => {
            error!("HiGHS failed with status {status:?}");
            SolveStatus::Error
        }
    }
}

/// Convert the model into a problem for HiGHS.
///
/// Columns and rows are added in the same order as in the model, so variable indexes carry over.
fn to_highs_problem(model: &AssignmentModel) -> RowProblem {
    let mut problem = RowProblem::default();
    let columns = model
        .problem()
        .columns()
        .iter()
        .map(|def| {
            if def.is_integer {
                problem.add_integer_column(def.cost, def.bounds.clone())
            } else {
                problem.add_column(def.cost, def.bounds.clone())
            }
        })
        .collect::<Vec<_>>();

    for constraint in model.problem().rows() {
        problem.add_row(
            constraint.bounds.clone(),
            constraint
                .terms
                .iter()
                .map(|(var, coeff)| (columns[var.index()], *coeff)),
        );
    }

    problem
}

/// Enable HiGHS's own console output if debug logging is enabled
fn enable_highs_logging(model: &mut highs::Model) {
    let enabled = log_enabled!(log::Level::Debug);
    model.set_option("log_to_console", enabled);
    model.set_option("output_flag", enabled);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{AssignmentMode, AssignmentOptions, DecisionKey};
    use crate::catalog::Catalogs;
    use crate::distance::DistanceMatrix;
    use crate::fixture::{catalogs, distances};
    use crate::units::Capacity;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_highs_solver_baseline(catalogs: Catalogs, distances: DistanceMatrix) {
        let model = AssignmentModel::build(&catalogs, &distances, &AssignmentOptions::default());
        let output = HighsSolver.solve(&model, None).unwrap();
        assert_eq!(output.status, SolveStatus::Optimal);

        // Site 1 -> substation 1 via small, site 2 -> substation 2 via large
        assert_approx_eq!(
            f64,
            output.objective.unwrap(),
            0.5 * 100_000.0 + 0.5 * 300_000.0,
            epsilon = 1e-3
        );
        let values = output.values.unwrap();
        let variables = model.variables();
        let active = |site, substation, cable| {
            values[variables
                .decision(DecisionKey {
                    site,
                    substation,
                    cable,
                })
                .index()]
                > 0.5
        };
        assert!(active(0, 0, 0));
        assert!(active(1, 1, 2));
    }

    #[rstest]
    fn test_highs_solver_infeasible(catalogs: Catalogs, distances: DistanceMatrix) {
        // Site 2 is too large for every cable type unless cable limits are relaxed
        let mut sites = catalogs.sites().clone();
        sites[1].capacity = Capacity(250.0);
        let catalogs = Catalogs::new(
            sites,
            catalogs.substations().clone(),
            catalogs.cable_types().clone(),
        )
        .unwrap();

        let model = AssignmentModel::build(&catalogs, &distances, &AssignmentOptions::default());
        let output = HighsSolver.solve(&model, None).unwrap();
        assert_eq!(output.status, SolveStatus::Infeasible);
        assert!(output.values.is_none());
        assert!(output.objective.is_none());

        let options = AssignmentOptions {
            mode: AssignmentMode::Relaxed,
            ..AssignmentOptions::default()
        };
        let model = AssignmentModel::build(&catalogs, &distances, &options);
        let output = HighsSolver.solve(&model, Some(Duration::from_secs(60))).unwrap();
        assert_eq!(output.status, SolveStatus::Optimal);
        let values = output.values.unwrap();
        assert!(model.is_feasible(&values, FEASIBILITY_TOLERANCE));

        // Site 2 is connected rather than left unconnected
        let slack = model.variables().slack(1).unwrap();
        assert!(values[slack.index()] < 0.5);
    }

    /// Values for the baseline fixture model in which every site is connected
    fn feasible_values(model: &AssignmentModel) -> Vec<f64> {
        let variables = model.variables();
        let mut values = vec![0.0; variables.num_variables()];
        for (site, substation, cable) in [(0, 0, 0), (1, 1, 2)] {
            let key = DecisionKey {
                site,
                substation,
                cable,
            };
            values[variables.decision(key).index()] = 1.0;
        }
        values
    }

    #[rstest]
    #[case(HighsModelStatus::Optimal, SolveStatus::Optimal)]
    #[case(HighsModelStatus::Infeasible, SolveStatus::Infeasible)]
    #[case(HighsModelStatus::UnboundedOrInfeasible, SolveStatus::Infeasible)]
    #[case(HighsModelStatus::ReachedTimeLimit, SolveStatus::TimedOutFeasible)]
    #[case(HighsModelStatus::SolveError, SolveStatus::Error)]
    fn test_classify_status(
        catalogs: Catalogs,
        distances: DistanceMatrix,
        #[case] highs_status: HighsModelStatus,
        #[case] expected: SolveStatus,
    ) {
        let model = AssignmentModel::build(&catalogs, &distances, &AssignmentOptions::default());
        let values = feasible_values(&model);
        assert_eq!(classify_status(&model, highs_status, &values), expected);
    }

    #[rstest]
    fn test_classify_status_time_limit(catalogs: Catalogs, distances: DistanceMatrix) {
        let model = AssignmentModel::build(&catalogs, &distances, &AssignmentOptions::default());

        // A feasible incumbent is kept
        let status = classify_status(
            &model,
            HighsModelStatus::ReachedTimeLimit,
            &feasible_values(&model),
        );
        assert_eq!(status, SolveStatus::TimedOutFeasible);
        assert!(status.has_solution());

        // An incumbent which leaves sites unconnected is discarded
        let zeros = vec![0.0; model.variables().num_variables()];
        let status = classify_status(&model, HighsModelStatus::ReachedTimeLimit, &zeros);
        assert_eq!(status, SolveStatus::TimedOutNoFeasible);
        assert!(!status.has_solution());
    }

    #[test]
    fn test_solve_status_has_solution() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::TimedOutFeasible.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::TimedOutNoFeasible.has_solution());
        assert!(!SolveStatus::Error.has_solution());
    }
}
