//! Nearest-facility lookup over latitude/longitude points.
//!
//! Distances are Euclidean in radian space scaled by the Earth's radius. Over an area
//! the size of Singapore this tracks great-circle distance closely; it is not a
//! geodesic distance.

use crate::error::{PipelineError, Result};
use crate::utils::constants::EARTH_RADIUS_M;

/// A named point of interest (MRT station, mall, CBD).
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Facility {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Closest facility to a query point.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestFacility {
    pub name: String,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Copy)]
struct KdNode {
    point: [f64; 2],
    /// Insertion order of the facility, used to break distance ties.
    index: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Static 2-d tree over facility coordinates in radians.
///
/// Among facilities at exactly the same distance, the one inserted first wins.
#[derive(Debug, Clone)]
pub struct FacilityIndex {
    names: Vec<String>,
    nodes: Vec<KdNode>,
    root: Option<usize>,
}

impl FacilityIndex {
    pub fn build(facilities: &[Facility]) -> Result<Self> {
        if facilities.is_empty() {
            return Err(PipelineError::MissingData(
                "cannot build a facility index without facilities".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(facilities.len());
        for (index, facility) in facilities.iter().enumerate() {
            let point = to_radians(facility.latitude, facility.longitude, &facility.name)?;
            entries.push((point, index));
        }

        let mut index = Self {
            names: facilities.iter().map(|f| f.name.clone()).collect(),
            nodes: Vec::with_capacity(facilities.len()),
            root: None,
        };
        index.root = index.build_subtree(&mut entries, 0);

        Ok(index)
    }

    fn build_subtree(&mut self, entries: &mut [([f64; 2], usize)], depth: usize) -> Option<usize> {
        if entries.is_empty() {
            return None;
        }

        let axis = depth % 2;
        let mid = entries.len() / 2;
        entries.select_nth_unstable_by(mid, |a, b| {
            a.0[axis].total_cmp(&b.0[axis]).then(a.1.cmp(&b.1))
        });

        let (point, index) = entries[mid];
        let node_id = self.nodes.len();
        self.nodes.push(KdNode {
            point,
            index,
            axis,
            left: None,
            right: None,
        });

        let (lower, rest) = entries.split_at_mut(mid);
        let left = self.build_subtree(lower, depth + 1);
        let right = self.build_subtree(&mut rest[1..], depth + 1);
        self.nodes[node_id].left = left;
        self.nodes[node_id].right = right;

        Some(node_id)
    }

    /// Name of and distance in meters to the facility closest to `(latitude, longitude)`.
    pub fn nearest(&self, latitude: f64, longitude: f64) -> Result<NearestFacility> {
        let target = to_radians(latitude, longitude, "query point")?;

        let mut best: Option<(f64, usize)> = None;
        self.search(self.root, target, &mut best);

        let (distance_sq, index) = best.ok_or_else(|| {
            PipelineError::MissingData("facility index is empty".to_string())
        })?;

        Ok(NearestFacility {
            name: self.names[index].clone(),
            distance_m: distance_sq.sqrt() * EARTH_RADIUS_M,
        })
    }

    fn search(&self, node: Option<usize>, target: [f64; 2], best: &mut Option<(f64, usize)>) {
        let Some(node_id) = node else {
            return;
        };
        let node = &self.nodes[node_id];

        let distance_sq = squared_distance(node.point, target);
        let improves = match *best {
            None => true,
            Some((best_sq, best_index)) => {
                distance_sq < best_sq || (distance_sq == best_sq && node.index < best_index)
            }
        };
        if improves {
            *best = Some((distance_sq, node.index));
        }

        let diff = target[node.axis] - node.point[node.axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        self.search(near, target, best);

        // Equal-distance candidates may sit across the splitting plane
        if best.map_or(true, |(best_sq, _)| diff * diff <= best_sq) {
            self.search(far, target, best);
        }
    }
}

/// Find the nearest facility for each query point.
pub fn nearest_facilities(
    queries: &[(f64, f64)],
    facilities: &[Facility],
) -> Result<Vec<NearestFacility>> {
    let index = FacilityIndex::build(facilities)?;
    queries
        .iter()
        .map(|&(latitude, longitude)| index.nearest(latitude, longitude))
        .collect()
}

fn to_radians(latitude: f64, longitude: f64, label: &str) -> Result<[f64; 2]> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(PipelineError::InvalidCoordinate(format!(
            "{}: ({}, {}) is not a finite coordinate",
            label, latitude, longitude
        )));
    }
    Ok([latitude.to_radians(), longitude.to_radians()])
}

fn squared_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let d_lat = a[0] - b[0];
    let d_lon = a[1] - b[1];
    d_lat * d_lat + d_lon * d_lon
}
