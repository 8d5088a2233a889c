use std::sync::Arc;

use aggregate::location::CompositeLocation;
use foundation::bounds::{Aabb2, GeoBounds};
use foundation::math::{Vec2, lat_to_unit_y, lon_to_unit_x, project_lon_lat, unit_per_pixel, unproject};
use tracing::debug;

use crate::cluster::{Cluster, ClusterId};
use crate::kdtree::KdTree;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterOptions {
    /// Cluster radius in screen pixels.
    pub radius_px: f64,
    /// Tile extent in pixels; the radius is relative to it.
    pub extent: f64,
    pub min_zoom: u8,
    /// Above this zoom every location is its own cluster.
    pub max_zoom: u8,
    /// k-d tree leaf size.
    pub leaf_size: usize,
}

/// Deepest clustered zoom an index builds; `max_zoom` is clamped to it.
const MAX_INDEX_ZOOM: u8 = 30;

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius_px: 80.0,
            extent: 512.0,
            min_zoom: 0,
            max_zoom: 12,
            leaf_size: 64,
        }
    }
}

/// A point (single location or merged group) at one zoom level.
#[derive(Debug, Clone)]
struct Node {
    /// Weighted centroid in unit Web-Mercator space.
    pos: Vec2,
    /// Indices into `GeoClusterIndex::locations`, in merge order.
    members: Vec<u32>,
}

#[derive(Debug, Clone)]
struct Level {
    zoom: u8,
    nodes: Vec<Node>,
    tree: KdTree,
}

/// Hierarchical greedy clustering of locations for every zoom level.
///
/// `build` clusters top-down from the finest level (one node per location at
/// `max_zoom + 1`), merging each level's nodes into the next coarser one.
/// Queries only select nodes from the prebuilt level, so the same bounds and
/// zoom always return the same clusters.
#[derive(Debug, Clone)]
pub struct GeoClusterIndex {
    options: ClusterOptions,
    locations: Arc<[CompositeLocation]>,
    /// `levels[i]` holds zoom `min_zoom + i`; the last level is unclustered.
    levels: Vec<Level>,
}

impl GeoClusterIndex {
    /// Build the index. Locations with a zero total are left out.
    pub fn build(locations: &[CompositeLocation], options: ClusterOptions) -> Self {
        let min_zoom = options.min_zoom.min(MAX_INDEX_ZOOM);
        let options = ClusterOptions {
            min_zoom,
            max_zoom: options.max_zoom.clamp(min_zoom, MAX_INDEX_ZOOM),
            ..options
        };
        let locations: Arc<[CompositeLocation]> = locations
            .iter()
            .filter(|l| l.total > 0)
            .cloned()
            .collect();

        let leaves: Vec<Node> = locations
            .iter()
            .enumerate()
            .map(|(i, l)| Node {
                pos: project_lon_lat(l.lon, l.lat),
                members: vec![i as u32],
            })
            .collect();

        let mut levels_rev: Vec<Level> = Vec::with_capacity(usize::from(options.max_zoom - options.min_zoom) + 2);
        levels_rev.push(Level::new(options.max_zoom + 1, leaves, options.leaf_size));

        for zoom in (options.min_zoom..=options.max_zoom).rev() {
            let finer = levels_rev.last().map(|l| cluster_level(l, zoom, &options));
            if let Some(nodes) = finer {
                levels_rev.push(Level::new(zoom, nodes, options.leaf_size));
            }
        }
        levels_rev.reverse();

        debug!(
            locations = locations.len(),
            levels = levels_rev.len(),
            coarsest = levels_rev.first().map(|l| l.nodes.len()).unwrap_or(0),
            "built cluster index"
        );

        Self {
            options,
            locations,
            levels: levels_rev,
        }
    }

    pub fn options(&self) -> ClusterOptions {
        self.options
    }

    /// The indexed locations (positive totals only).
    pub fn locations(&self) -> &[CompositeLocation] {
        &self.locations
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Clusters visible in `bounds` at `zoom`, ordered by cluster id.
    ///
    /// Zooms past `max_zoom` return one cluster per location.
    pub fn query(&self, bounds: &GeoBounds, zoom: u8) -> Vec<Cluster> {
        let Some(level) = self.level(zoom) else {
            return Vec::new();
        };

        let mut ids: Vec<u32> = Vec::new();
        for part in bounds.normalized_parts() {
            let b = Aabb2::new(
                [lon_to_unit_x(part.west), lat_to_unit_y(part.north)],
                [lon_to_unit_x(part.east), lat_to_unit_y(part.south)],
            );
            ids.extend(level.tree.range(&b));
        }
        ids.sort_unstable();
        ids.dedup();

        ids.into_iter()
            .map(|i| self.cluster_for(level, i))
            .collect()
    }

    fn level(&self, zoom: u8) -> Option<&Level> {
        let z = zoom.clamp(self.options.min_zoom, self.options.max_zoom + 1);
        self.levels.get(usize::from(z - self.options.min_zoom))
    }

    fn cluster_for(&self, level: &Level, index: u32) -> Cluster {
        let node = &level.nodes[index as usize];
        let members: Vec<CompositeLocation> = node
            .members
            .iter()
            .map(|&m| self.locations[m as usize].clone())
            .collect();

        // Lone locations keep their exact coordinates.
        let (lon, lat) = match members.as_slice() {
            [only] => (only.lon, only.lat),
            _ => unproject(node.pos),
        };

        Cluster::from_members(
            ClusterId {
                zoom: level.zoom,
                index,
            },
            lat,
            lon,
            members,
        )
    }
}

/// Zoom level for a fractional map zoom: rounded, never negative.
pub fn zoom_level(zoom: f64) -> u8 {
    if !zoom.is_finite() {
        return 0;
    }
    zoom.round().clamp(0.0, f64::from(u8::MAX)) as u8
}

impl Level {
    fn new(zoom: u8, nodes: Vec<Node>, leaf_size: usize) -> Self {
        let tree = KdTree::build(
            nodes.iter().enumerate().map(|(i, n)| (i as u32, n.pos)),
            leaf_size,
        );
        Self { zoom, nodes, tree }
    }
}

/// Greedily merge `finer` nodes lying within the cluster radius at `zoom`.
///
/// Nodes are visited in index order; each unvisited node absorbs every
/// unvisited neighbour, and the merged centroid is weighted by member count.
fn cluster_level(finer: &Level, zoom: u8, options: &ClusterOptions) -> Vec<Node> {
    let radius = options.radius_px * unit_per_pixel(options.extent, zoom);
    let mut visited = vec![false; finer.nodes.len()];
    let mut out: Vec<Node> = Vec::with_capacity(finer.nodes.len());

    for (i, node) in finer.nodes.iter().enumerate() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let neighbours: Vec<usize> = finer
            .tree
            .within(node.pos, radius)
            .into_iter()
            .map(|n| n as usize)
            .filter(|&n| !visited[n])
            .collect();

        if neighbours.is_empty() {
            out.push(node.clone());
            continue;
        }

        let mut weight = node.members.len() as f64;
        let mut weighted = node.pos * weight;
        let mut members = node.members.clone();
        for n in neighbours {
            visited[n] = true;
            let other = &finer.nodes[n];
            let w = other.members.len() as f64;
            weighted = weighted + other.pos * w;
            weight += w;
            members.extend_from_slice(&other.members);
        }

        out.push(Node {
            pos: weighted * (1.0 / weight),
            members,
        });
    }

    out
}
