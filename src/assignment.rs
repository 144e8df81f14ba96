//! The optimisation model for connecting sites to substations.
//!
//! The model has a binary decision variable for every combination of site, substation and cable
//! type, indicating whether the site is connected to the substation with that type of cable. In
//! relaxed mode, each site also has a continuous slack variable, which represents the site being
//! left unconnected.
//!
//! The model is built independently of any particular solver (see [`crate::solver`]).
use crate::catalog::Catalogs;
use crate::distance::DistanceMatrix;
use crate::site::Site;
use crate::units::{Capacity, Dimensionless, Money, MoneyPerCapacity};
use log::{debug, warn};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::ops::RangeInclusive;

pub mod constraints;
use constraints::{ConstraintKeys, add_constraints};

/// Factor by which the derived lower bound for the slack penalty is multiplied if the configured
/// penalty is too small
const PENALTY_SAFETY_FACTOR: f64 = 10.0;

/// Whether every site must be connected
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum AssignmentMode {
    /// Every site is connected to exactly one substation
    #[default]
    #[string = "baseline"]
    Baseline,
    /// Sites are connected to at most one substation, with a penalty for each unconnected site
    #[string = "relaxed"]
    Relaxed,
}

/// Options controlling how an [`AssignmentModel`] is built
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentOptions {
    /// Whether sites may be left unconnected
    pub mode: AssignmentMode,
    /// Multiplier for cable capacity limits (relaxed mode only)
    pub relaxation_factor: Dimensionless,
    /// The requested cost per unit capacity of leaving a site unconnected (relaxed mode only)
    pub slack_penalty: MoneyPerCapacity,
}

impl Default for AssignmentOptions {
    fn default() -> Self {
        Self {
            mode: AssignmentMode::Baseline,
            relaxation_factor: Dimensionless(10.0),
            slack_penalty: MoneyPerCapacity(1e6),
        }
    }
}

/// A variable in the optimisation.
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable(usize);

impl Variable {
    /// The column index of the variable
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifies a decision variable by the indexes of its site, substation and cable type in the
/// catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecisionKey {
    /// Index of the site
    pub site: usize,
    /// Index of the substation
    pub substation: usize,
    /// Index of the cable type
    pub cable: usize,
}

/// Maps between variables and what they represent.
///
/// Decision variables occupy the first columns of the problem, ordered by site, then substation,
/// then cable type. Slack variables, if present, follow them with one per site.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableMap {
    num_sites: usize,
    num_substations: usize,
    num_cables: usize,
    has_slack: bool,
}

impl VariableMap {
    fn new(catalogs: &Catalogs, mode: AssignmentMode) -> Self {
        Self {
            num_sites: catalogs.sites().len(),
            num_substations: catalogs.substations().len(),
            num_cables: catalogs.cable_types().len(),
            has_slack: mode == AssignmentMode::Relaxed,
        }
    }

    /// The number of decision variables
    pub fn num_decisions(&self) -> usize {
        self.num_sites * self.num_substations * self.num_cables
    }

    /// The total number of variables
    pub fn num_variables(&self) -> usize {
        let num_slack = if self.has_slack { self.num_sites } else { 0 };
        self.num_decisions() + num_slack
    }

    /// Get the decision variable for the given key
    pub fn decision(&self, key: DecisionKey) -> Variable {
        assert!(
            key.site < self.num_sites
                && key.substation < self.num_substations
                && key.cable < self.num_cables,
            "Decision key out of range"
        );

        Variable((key.site * self.num_substations + key.substation) * self.num_cables + key.cable)
    }

    /// Get the slack variable for a site, if the model has slack variables
    pub fn slack(&self, site: usize) -> Option<Variable> {
        assert!(site < self.num_sites, "Site index out of range");
        self.has_slack.then(|| Variable(self.num_decisions() + site))
    }

    /// Iterate over the decision keys for a given site
    pub fn iter_decisions_for_site(&self, site: usize) -> impl Iterator<Item = DecisionKey> {
        let num_cables = self.num_cables;
        (0..self.num_substations).flat_map(move |substation| {
            (0..num_cables).map(move |cable| DecisionKey {
                site,
                substation,
                cable,
            })
        })
    }

    /// Iterate over the decision keys for a given substation
    pub fn iter_decisions_for_substation(
        &self,
        substation: usize,
    ) -> impl Iterator<Item = DecisionKey> {
        let num_cables = self.num_cables;
        (0..self.num_sites).flat_map(move |site| {
            (0..num_cables).map(move |cable| DecisionKey {
                site,
                substation,
                cable,
            })
        })
    }

    /// Iterate over all decision keys, in column order
    pub fn iter_decisions(&self) -> impl Iterator<Item = DecisionKey> {
        (0..self.num_sites).flat_map(|site| self.iter_decisions_for_site(site))
    }
}

/// The definition of a variable (i.e. column) in the problem
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// The coefficient of the variable in the objective
    pub cost: f64,
    /// The permitted values of the variable
    pub bounds: RangeInclusive<f64>,
    /// Whether the variable must take an integer value
    pub is_integer: bool,
}

/// A linear constraint (i.e. row) in the problem, of the form:
///
/// min <= a1*x1 + a2*x2 + ... <= max
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// The permitted values of the weighted sum
    pub bounds: RangeInclusive<f64>,
    /// The variables and their coefficients
    pub terms: Vec<(Variable, f64)>,
}

/// A minimisation problem, built row by row
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Problem {
    columns: Vec<VariableDefinition>,
    rows: Vec<Constraint>,
}

impl Problem {
    /// Add a variable to the problem
    pub fn add_column(
        &mut self,
        cost: f64,
        bounds: RangeInclusive<f64>,
        is_integer: bool,
    ) -> Variable {
        self.columns.push(VariableDefinition {
            cost,
            bounds,
            is_integer,
        });
        Variable(self.columns.len() - 1)
    }

    /// Add a constraint to the problem
    pub fn add_row<I>(&mut self, bounds: RangeInclusive<f64>, terms: I)
    where
        I: IntoIterator<Item = (Variable, f64)>,
    {
        self.rows.push(Constraint {
            bounds,
            terms: terms.into_iter().collect(),
        });
    }

    /// The number of constraints added so far
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The problem's variables
    pub fn columns(&self) -> &[VariableDefinition] {
        &self.columns
    }

    /// The problem's constraints
    pub fn rows(&self) -> &[Constraint] {
        &self.rows
    }
}

/// A fully built optimisation model, ready to be passed to a solver.
///
/// The model is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentModel {
    mode: AssignmentMode,
    relaxation_factor: Dimensionless,
    slack_penalty: Option<MoneyPerCapacity>,
    variables: VariableMap,
    problem: Problem,
    constraint_keys: ConstraintKeys,
}

impl AssignmentModel {
    /// Build the optimisation model.
    ///
    /// For a description of the formulation, see the module documentation for [`constraints`].
    ///
    /// # Arguments
    ///
    /// * `catalogs` - The sites, substations and cable types
    /// * `distances` - Distances between sites and substations
    /// * `options` - Options for building the model
    pub fn build(
        catalogs: &Catalogs,
        distances: &DistanceMatrix,
        options: &AssignmentOptions,
    ) -> Self {
        let mut problem = Problem::default();
        let variables = VariableMap::new(catalogs, options.mode);

        let slack_penalty = match options.mode {
            AssignmentMode::Baseline => None,
            AssignmentMode::Relaxed => Some(calculate_slack_penalty(
                catalogs,
                distances,
                options.slack_penalty,
            )),
        };
        add_variables(&mut problem, &variables, catalogs, distances, slack_penalty);

        let relaxation_factor = match options.mode {
            AssignmentMode::Baseline => Dimensionless(1.0),
            AssignmentMode::Relaxed => options.relaxation_factor,
        };
        check_for_oversized_sites(catalogs, options.mode, relaxation_factor);

        let constraint_keys =
            add_constraints(&mut problem, &variables, catalogs, relaxation_factor);

        Self {
            mode: options.mode,
            relaxation_factor,
            slack_penalty,
            variables,
            problem,
            constraint_keys,
        }
    }

    /// Whether sites may be left unconnected
    pub fn mode(&self) -> AssignmentMode {
        self.mode
    }

    /// The multiplier applied to cable capacity limits (one in baseline mode)
    pub fn relaxation_factor(&self) -> Dimensionless {
        self.relaxation_factor
    }

    /// The slack penalty actually used (relaxed mode only)
    pub fn slack_penalty(&self) -> Option<MoneyPerCapacity> {
        self.slack_penalty
    }

    /// The model's variables
    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    /// The underlying problem
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Keys identifying what each constraint represents
    pub fn constraint_keys(&self) -> &ConstraintKeys {
        &self.constraint_keys
    }

    /// Check whether a vector of variable values satisfies the model.
    ///
    /// Bounds, integrality and constraints are all checked, allowing for the given (absolute)
    /// tolerance, which is scaled up for constraints with large bounds.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.problem.columns.len() {
            debug!(
                "Expected {} variable values, got {}",
                self.problem.columns.len(),
                values.len()
            );
            return false;
        }

        for (col, (def, &value)) in self.problem.columns.iter().zip(values).enumerate() {
            if !within_bounds(value, &def.bounds, tolerance)
                || (def.is_integer && (value - value.round()).abs() > tolerance)
            {
                debug!("Variable {col} has invalid value {value}");
                return false;
            }
        }

        for (row, constraint) in self.problem.rows.iter().enumerate() {
            let activity: f64 = constraint
                .terms
                .iter()
                .map(|(var, coeff)| values[var.index()] * coeff)
                .sum();
            if !within_bounds(activity, &constraint.bounds, tolerance) {
                debug!(
                    "Constraint violated: {}",
                    self.constraint_keys.describe(row)
                );
                return false;
            }
        }

        true
    }
}

/// Check whether a value lies within the given bounds, allowing for a scaled tolerance
fn within_bounds(value: f64, bounds: &RangeInclusive<f64>, tolerance: f64) -> bool {
    let scaled = |bound: f64| tolerance * bound.abs().max(1.0);
    value >= bounds.start() - scaled(*bounds.start())
        && value <= bounds.end() + scaled(*bounds.end())
}

/// The weight given to a site's slack variable in the objective.
///
/// This is the site's capacity, except for sites with no capacity, which are given a weight of
/// one unit so that connecting them is still preferred.
fn slack_weight(site: &Site) -> Capacity {
    if site.capacity > Capacity(0.0) {
        site.capacity
    } else {
        Capacity(1.0)
    }
}

/// Calculate the cost per unit capacity of leaving a site unconnected.
///
/// For the optimiser to only leave a site unconnected when it cannot otherwise be connected, the
/// penalty for any site must exceed the most expensive connection possible, i.e. the longest
/// distance multiplied by the highest cost per unit distance. If the requested penalty does not
/// meet this bound, a larger penalty is used instead.
pub fn calculate_slack_penalty(
    catalogs: &Catalogs,
    distances: &DistanceMatrix,
    requested: MoneyPerCapacity,
) -> MoneyPerCapacity {
    let max_connection_cost: Money = distances.max() * catalogs.max_cost_per_unit_distance();
    let min_weight = catalogs
        .sites()
        .values()
        .map(slack_weight)
        .fold(Capacity(f64::INFINITY), |a, b| if b < a { b } else { a });
    let lower_bound = max_connection_cost / min_weight;

    if requested > lower_bound {
        return requested;
    }

    let penalty = lower_bound * Dimensionless(PENALTY_SAFETY_FACTOR);
    warn!(
        "The slack penalty ({requested}) does not exceed the most expensive possible connection \
        ({lower_bound} per unit capacity); using {penalty} instead"
    );

    penalty
}

/// Add variables to the problem.
///
/// The objective coefficient for a decision variable is the cost of the connection, i.e. the
/// distance multiplied by the cable cost per unit distance. For a slack variable it is the penalty
/// multiplied by the site's weight.
fn add_variables(
    problem: &mut Problem,
    variables: &VariableMap,
    catalogs: &Catalogs,
    distances: &DistanceMatrix,
    slack_penalty: Option<MoneyPerCapacity>,
) {
    for key in variables.iter_decisions() {
        let cable_type = &catalogs.cable_types()[key.cable];
        let cost = distances.get(key.site, key.substation) * cable_type.cost_per_unit_distance;
        let var = problem.add_column(cost.value(), 0.0..=1.0, true);
        debug_assert_eq!(var, variables.decision(key));
    }

    if let Some(penalty) = slack_penalty {
        for (site_idx, site) in catalogs.sites().values().enumerate() {
            let cost = penalty * slack_weight(site);
            let var = problem.add_column(cost.value(), 0.0..=1.0, false);
            debug_assert_eq!(Some(var), variables.slack(site_idx));
        }
    }
}

/// Log sites which are too large for every cable type.
///
/// No connection is possible for these sites, so in baseline mode the model will be infeasible.
fn check_for_oversized_sites(
    catalogs: &Catalogs,
    mode: AssignmentMode,
    relaxation_factor: Dimensionless,
) {
    let max_capacity = catalogs.max_cable_capacity() * relaxation_factor;
    for site in catalogs.sites().values() {
        if site.capacity <= max_capacity {
            continue;
        }

        match mode {
            AssignmentMode::Baseline => warn!(
                "Site {} has capacity {} which exceeds every cable type's limit; the model will \
                be infeasible",
                site.id, site.capacity
            ),
            AssignmentMode::Relaxed => debug!(
                "Site {} has capacity {} which exceeds every cable type's limit (max {}); it \
                will be left unconnected",
                site.id, site.capacity, max_capacity
            ),
        }
    }
}
