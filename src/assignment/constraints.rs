//! Code for adding constraints to the assignment problem.
//!
//! With x[i,j,k] the decision variable for connecting site i to substation j via cable type k,
//! s[i] the slack variable for site i (relaxed mode only) and C[i] the capacity of site i, the
//! constraints are:
//!
//! * Assignment: for each site, sum over j,k of x[i,j,k] == 1 (baseline) or
//!   sum over j,k of x[i,j,k] + s[i] == 1 (relaxed)
//! * Edge capacity: for each decision, x[i,j,k] * C[i] <= L[k] * r, where L[k] is the cable
//!   type's capacity limit and r is the relaxation factor (one in baseline mode)
//! * Substation capacity: for each substation, sum over i,k of x[i,j,k] * C[i] <= U[j], where
//!   U[j] is the substation's capacity limit
use super::{DecisionKey, Problem, VariableMap};
use crate::catalog::Catalogs;
use crate::site::SiteID;
use crate::substation::SubstationID;
use crate::units::Dimensionless;

/// Corresponding keys for a group of constraints along with the row offset in the problem
#[derive(Debug, Clone, PartialEq)]
pub struct KeysWithOffset<T> {
    offset: usize,
    keys: Vec<T>,
}

impl<T> KeysWithOffset<T> {
    /// Get the key for the given row, if it belongs to this group
    pub fn get(&self, row: usize) -> Option<&T> {
        row.checked_sub(self.offset)
            .and_then(|idx| self.keys.get(idx))
    }

    /// Iterate over the row indexes and keys of the constraints in this group
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (self.offset + idx, key))
    }

    /// The number of constraints in this group
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether this group has no constraints
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Indicates the site covered by each assignment constraint
pub type AssignmentKeys = KeysWithOffset<SiteID>;

/// Indicates the connection covered by each edge capacity constraint
pub type EdgeCapacityKeys = KeysWithOffset<DecisionKey>;

/// Indicates the substation covered by each substation capacity constraint
pub type SubstationCapacityKeys = KeysWithOffset<SubstationID>;

/// The keys for different constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintKeys {
    /// Keys for assignment constraints
    pub assignment_keys: AssignmentKeys,
    /// Keys for edge capacity constraints
    pub edge_capacity_keys: EdgeCapacityKeys,
    /// Keys for substation capacity constraints
    pub substation_capacity_keys: SubstationCapacityKeys,
}

impl ConstraintKeys {
    /// A human-readable description of the constraint in the given row
    pub fn describe(&self, row: usize) -> String {
        if let Some(site_id) = self.assignment_keys.get(row) {
            format!("assignment for site {site_id}")
        } else if let Some(key) = self.edge_capacity_keys.get(row) {
            format!(
                "edge capacity for site {}, substation {}, cable type {}",
                key.site, key.substation, key.cable
            )
        } else if let Some(substation_id) = self.substation_capacity_keys.get(row) {
            format!("capacity of substation {substation_id}")
        } else {
            format!("unknown constraint (row {row})")
        }
    }
}

/// Add all constraints to the problem.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `variables` - The variables in the problem
/// * `catalogs` - The sites, substations and cable types
/// * `relaxation_factor` - Multiplier for cable capacity limits
///
/// # Returns
///
/// Keys identifying the rows of each group of constraints
pub fn add_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    catalogs: &Catalogs,
    relaxation_factor: Dimensionless,
) -> ConstraintKeys {
    let assignment_keys = add_assignment_constraints(problem, variables, catalogs);
    let edge_capacity_keys =
        add_edge_capacity_constraints(problem, variables, catalogs, relaxation_factor);
    let substation_capacity_keys =
        add_substation_capacity_constraints(problem, variables, catalogs);

    ConstraintKeys {
        assignment_keys,
        edge_capacity_keys,
        substation_capacity_keys,
    }
}

/// Add a constraint for each site ensuring it is connected exactly once (or is unconnected, in
/// relaxed mode).
fn add_assignment_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    catalogs: &Catalogs,
) -> AssignmentKeys {
    // Row offset in problem. This line **must** come before we add more constraints.
    let offset = problem.num_rows();

    let mut keys = Vec::new();
    for (site_idx, site_id) in catalogs.sites().keys().enumerate() {
        let decisions = variables
            .iter_decisions_for_site(site_idx)
            .map(|key| (variables.decision(key), 1.0));
        let slack = variables.slack(site_idx).map(|var| (var, 1.0));

        problem.add_row(1.0..=1.0, decisions.chain(slack));
        keys.push(site_id.clone());
    }

    AssignmentKeys { offset, keys }
}

/// Add a constraint for each decision ensuring the site's capacity does not exceed the cable's
/// (possibly relaxed) capacity limit.
fn add_edge_capacity_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    catalogs: &Catalogs,
    relaxation_factor: Dimensionless,
) -> EdgeCapacityKeys {
    // Row offset in problem. This line **must** come before we add more constraints.
    let offset = problem.num_rows();

    let mut keys = Vec::new();
    for key in variables.iter_decisions() {
        let site = &catalogs.sites()[key.site];
        let cable_type = &catalogs.cable_types()[key.cable];
        let limit = cable_type.capacity_limit * relaxation_factor;

        problem.add_row(
            f64::NEG_INFINITY..=limit.value(),
            [(variables.decision(key), site.capacity.value())],
        );
        keys.push(key);
    }

    EdgeCapacityKeys { offset, keys }
}

/// Add a constraint for each substation ensuring the total capacity of the sites connected to it
/// does not exceed its limit.
fn add_substation_capacity_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    catalogs: &Catalogs,
) -> SubstationCapacityKeys {
    // Row offset in problem. This line **must** come before we add more constraints.
    let offset = problem.num_rows();

    let sites = catalogs.sites();
    let mut keys = Vec::new();
    for (substation_idx, substation) in catalogs.substations().values().enumerate() {
        let terms = variables
            .iter_decisions_for_substation(substation_idx)
            .map(|key| (variables.decision(key), sites[key.site].capacity.value()));

        problem.add_row(f64::NEG_INFINITY..=substation.capacity_limit.value(), terms);
        keys.push(substation.id.clone());
    }

    SubstationCapacityKeys { offset, keys }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{AssignmentMode, AssignmentModel, AssignmentOptions};
    use crate::distance::DistanceMatrix;
    use crate::fixture::{catalogs, distances};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn build(
        catalogs: &Catalogs,
        distances: &DistanceMatrix,
        mode: AssignmentMode,
    ) -> AssignmentModel {
        let options = AssignmentOptions {
            mode,
            ..AssignmentOptions::default()
        };
        AssignmentModel::build(catalogs, distances, &options)
    }

    #[rstest]
    fn test_constraint_keys(catalogs: Catalogs, distances: DistanceMatrix) {
        let model = build(&catalogs, &distances, AssignmentMode::Baseline);
        let keys = model.constraint_keys();

        assert_eq!(keys.assignment_keys.len(), 2);
        assert_eq!(keys.edge_capacity_keys.len(), 12);
        assert_eq!(keys.substation_capacity_keys.len(), 2);

        // Groups are contiguous and in order
        assert_eq!(keys.assignment_keys.get(0), Some(&"site1".into()));
        assert_eq!(keys.edge_capacity_keys.get(1), None);
        assert_eq!(
            keys.edge_capacity_keys.get(2),
            Some(&DecisionKey {
                site: 0,
                substation: 0,
                cable: 0
            })
        );
        assert_eq!(keys.substation_capacity_keys.get(15), Some(&"sub2".into()));
        assert_eq!(keys.describe(14), "capacity of substation sub1");
        assert_eq!(keys.describe(16), "unknown constraint (row 16)");
    }

    #[rstest]
    #[case(AssignmentMode::Baseline, 6)]
    #[case(AssignmentMode::Relaxed, 7)]
    fn test_assignment_constraints(
        catalogs: Catalogs,
        distances: DistanceMatrix,
        #[case] mode: AssignmentMode,
        #[case] expected_terms: usize,
    ) {
        let model = build(&catalogs, &distances, mode);
        let rows = model.problem().rows();
        for (row, _) in model.constraint_keys().assignment_keys.iter() {
            assert_eq!(rows[row].bounds, 1.0..=1.0);
            assert_eq!(rows[row].terms.len(), expected_terms);
        }
    }

    #[rstest]
    #[case(AssignmentMode::Baseline, 50.0)]
    #[case(AssignmentMode::Relaxed, 500.0)]
    fn test_edge_capacity_constraints(
        catalogs: Catalogs,
        distances: DistanceMatrix,
        #[case] mode: AssignmentMode,
        #[case] expected_limit: f64,
    ) {
        let model = build(&catalogs, &distances, mode);
        let keys = &model.constraint_keys().edge_capacity_keys;

        // Site 2 (capacity 120) to substation 1 via the small cable
        let (row, _) = keys
            .iter()
            .find(|(_, key)| key.site == 1 && key.substation == 0 && key.cable == 0)
            .unwrap();
        let constraint = &model.problem().rows()[row];
        assert_approx_eq!(f64, *constraint.bounds.end(), expected_limit);
        assert_eq!(constraint.terms.len(), 1);
        assert_approx_eq!(f64, constraint.terms[0].1, 120.0);
    }

    #[rstest]
    fn test_substation_capacity_constraints(catalogs: Catalogs, distances: DistanceMatrix) {
        let model = build(&catalogs, &distances, AssignmentMode::Baseline);
        let rows = model.problem().rows();
        for (row, _) in model.constraint_keys().substation_capacity_keys.iter() {
            assert_approx_eq!(f64, *rows[row].bounds.end(), 1000.0);
            let total: f64 = rows[row].terms.iter().map(|(_, coeff)| coeff).sum();
            assert_approx_eq!(f64, total, 3.0 * 160.0);
        }
    }
}
