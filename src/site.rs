//! Sites are renewable generation facilities which need connecting to the grid.
use crate::id::{define_id_getter, define_id_type};
use crate::units::Capacity;
use indexmap::IndexMap;
use serde::Deserialize;

define_id_type! {SiteID}

/// A map of [`Site`]s, keyed by site ID
pub type SiteMap = IndexMap<SiteID, Site>;

/// A renewable generation site with a fixed capacity
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Site {
    /// A unique identifier for the site
    pub id: SiteID,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Generation capacity which must be carried to a substation
    pub capacity: Capacity,
}
define_id_getter! {Site, SiteID}
