//! Pairwise distances between sites and substations.
use crate::site::SiteMap;
use crate::substation::SubstationMap;
use crate::units::Distance;

/// The distance between every site and every substation.
///
/// Distances are Euclidean in coordinate space (i.e. in degrees), which is an acceptable
/// approximation over a region the size of a single state. Values are stored densely, one row per
/// site, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    num_substations: usize,
    distances: Vec<Distance>,
}

impl DistanceMatrix {
    /// Calculate distances for every site/substation pair.
    pub fn new(sites: &SiteMap, substations: &SubstationMap) -> Self {
        let distances = sites
            .values()
            .flat_map(|site| {
                substations.values().map(|substation| {
                    euclidean_distance(
                        (site.latitude, site.longitude),
                        (substation.latitude, substation.longitude),
                    )
                })
            })
            .collect();

        Self {
            num_substations: substations.len(),
            distances,
        }
    }

    /// Get the distance between the site and substation with the given indexes
    pub fn get(&self, site_idx: usize, substation_idx: usize) -> Distance {
        assert!(
            substation_idx < self.num_substations,
            "Substation index out of range"
        );
        self.distances[site_idx * self.num_substations + substation_idx]
    }

    /// The largest distance between any site and substation
    pub fn max(&self) -> Distance {
        self.distances
            .iter()
            .copied()
            .fold(Distance(0.0), Distance::max)
    }
}

/// Straight-line distance between two (latitude, longitude) points
fn euclidean_distance(a: (f64, f64), b: (f64, f64)) -> Distance {
    Distance((a.0 - b.0).hypot(a.1 - b.1))
}
