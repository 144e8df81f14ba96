//! Fixtures for tests

use crate::cable::{CableType, CableTypeMap};
use crate::catalog::Catalogs;
use crate::distance::DistanceMatrix;
use crate::site::{Site, SiteMap};
use crate::substation::{Substation, SubstationMap};
use crate::units::{Capacity, MoneyPerDistance};
use indexmap::indexmap;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn site() -> Site {
    Site {
        id: "site1".into(),
        latitude: 40.0,
        longitude: -77.0,
        capacity: Capacity(40.0),
    }
}

#[fixture]
pub fn sites(site: Site) -> SiteMap {
    let site2 = Site {
        id: "site2".into(),
        latitude: 41.0,
        longitude: -76.0,
        capacity: Capacity(120.0),
    };

    indexmap! {
        site.id.clone() => site,
        site2.id.clone() => site2,
    }
}

#[fixture]
pub fn substations() -> SubstationMap {
    [("sub1", 40.0, -77.5), ("sub2", 41.5, -76.0)]
        .into_iter()
        .map(|(id, latitude, longitude)| {
            let substation = Substation {
                id: id.into(),
                latitude,
                longitude,
                capacity_limit: Capacity(1000.0),
            };
            (substation.id.clone(), substation)
        })
        .collect()
}

#[fixture]
pub fn cable_types() -> CableTypeMap {
    [
        ("small", 50.0, 100_000.0),
        ("medium", 100.0, 200_000.0),
        ("large", 200.0, 300_000.0),
    ]
    .into_iter()
    .map(|(id, capacity_limit, cost)| {
        let cable_type = CableType {
            id: id.into(),
            capacity_limit: Capacity(capacity_limit),
            cost_per_unit_distance: MoneyPerDistance(cost),
        };
        (cable_type.id.clone(), cable_type)
    })
    .collect()
}

#[fixture]
pub fn catalogs(sites: SiteMap, substations: SubstationMap, cable_types: CableTypeMap) -> Catalogs {
    Catalogs::new(sites, substations, cable_types).unwrap()
}

#[fixture]
pub fn distances(sites: SiteMap, substations: SubstationMap) -> DistanceMatrix {
    DistanceMatrix::new(&sites, &substations)
}
