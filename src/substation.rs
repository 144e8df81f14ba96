//! Substations are the grid connection points which sites are connected to.
use crate::id::{define_id_getter, define_id_type};
use crate::units::Capacity;
use indexmap::IndexMap;

define_id_type! {SubstationID}

/// A map of [`Substation`]s, keyed by substation ID
pub type SubstationMap = IndexMap<SubstationID, Substation>;

/// A grid connection point
#[derive(Debug, Clone, PartialEq)]
pub struct Substation {
    /// A unique identifier for the substation
    pub id: SubstationID,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// The total capacity of all the sites which may be connected to this substation
    pub capacity_limit: Capacity,
}
define_id_getter! {Substation, SubstationID}
