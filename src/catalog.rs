//! The validated collection of sites, substations and cable types for a run.
use crate::cable::{CableType, CableTypeMap};
use crate::site::{Site, SiteMap};
use crate::substation::{Substation, SubstationMap};
use crate::units::{Capacity, MoneyPerDistance};
use anyhow::{Context, Result, ensure};

/// The catalogs which an assignment model is built from.
///
/// These can only be constructed via [`Catalogs::new`], which checks that the data is valid, and
/// cannot be modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogs {
    sites: SiteMap,
    substations: SubstationMap,
    cable_types: CableTypeMap,
}

impl Catalogs {
    /// Create a new [`Catalogs`], checking that all entries are valid.
    ///
    /// # Returns
    ///
    /// An error if any catalog is empty, or if any coordinates, capacities or costs are invalid.
    pub fn new(
        sites: SiteMap,
        substations: SubstationMap,
        cable_types: CableTypeMap,
    ) -> Result<Self> {
        ensure!(!sites.is_empty(), "No sites provided");
        ensure!(!substations.is_empty(), "No substations provided");
        ensure!(!cable_types.is_empty(), "No cable types provided");

        for site in sites.values() {
            check_site(site).with_context(|| format!("Invalid site {}", site.id))?;
        }
        for substation in substations.values() {
            check_substation(substation)
                .with_context(|| format!("Invalid substation {}", substation.id))?;
        }
        for cable_type in cable_types.values() {
            check_cable_type(cable_type)
                .with_context(|| format!("Invalid cable type {}", cable_type.id))?;
        }

        Ok(Self {
            sites,
            substations,
            cable_types,
        })
    }

    /// The sites which need connecting
    pub fn sites(&self) -> &SiteMap {
        &self.sites
    }

    /// The substations which sites can be connected to
    pub fn substations(&self) -> &SubstationMap {
        &self.substations
    }

    /// The available cable types, in catalog order
    pub fn cable_types(&self) -> &CableTypeMap {
        &self.cable_types
    }

    /// The total capacity of all sites
    pub fn total_site_capacity(&self) -> Capacity {
        self.sites.values().map(|site| site.capacity).sum()
    }

    /// The largest per-unit-distance cost of any cable type
    pub fn max_cost_per_unit_distance(&self) -> MoneyPerDistance {
        self.cable_types
            .values()
            .map(|cable_type| cable_type.cost_per_unit_distance)
            .fold(MoneyPerDistance(0.0), MoneyPerDistance::max)
    }

    /// The largest capacity limit of any cable type
    pub fn max_cable_capacity(&self) -> Capacity {
        self.cable_types
            .values()
            .map(|cable_type| cable_type.capacity_limit)
            .fold(Capacity(0.0), Capacity::max)
    }
}

/// Check that a pair of coordinates is valid
fn check_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    ensure!(
        latitude.is_finite() && longitude.is_finite(),
        "Coordinates must be finite numbers"
    );

    Ok(())
}

/// Check that a capacity value is valid
fn check_capacity(capacity: Capacity) -> Result<()> {
    ensure!(
        capacity.is_finite() && capacity >= Capacity(0.0),
        "Capacity must be a finite number greater than or equal to zero"
    );

    Ok(())
}

fn check_site(site: &Site) -> Result<()> {
    check_coordinates(site.latitude, site.longitude)?;
    check_capacity(site.capacity)
}

fn check_substation(substation: &Substation) -> Result<()> {
    check_coordinates(substation.latitude, substation.longitude)?;
    check_capacity(substation.capacity_limit)
}

fn check_cable_type(cable_type: &CableType) -> Result<()> {
    check_capacity(cable_type.capacity_limit)?;
    ensure!(
        cable_type.cost_per_unit_distance.is_finite()
            && cable_type.cost_per_unit_distance >= MoneyPerDistance(0.0),
        "Cost per unit distance must be a finite number greater than or equal to zero"
    );

    Ok(())
}
