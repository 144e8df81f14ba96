//! Cable types are the discrete technologies available for connecting a site to a substation.
use crate::id::{define_id_getter, define_id_type};
use crate::units::{Capacity, MoneyPerDistance};
use indexmap::IndexMap;
use serde::Deserialize;

define_id_type! {CableTypeID}

/// The catalog of available cable types.
///
/// The order of the entries is significant: it is the order in which the cable types were
/// provided, and so the order in which variables are created for them.
pub type CableTypeMap = IndexMap<CableTypeID, CableType>;

/// A cable technology
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CableType {
    /// A unique identifier for the cable type (e.g. "small")
    pub id: CableTypeID,
    /// The maximum capacity the cable can carry
    pub capacity_limit: Capacity,
    /// The cost of laying the cable per unit distance
    pub cost_per_unit_distance: MoneyPerDistance,
}
define_id_getter! {CableType, CableTypeID}
