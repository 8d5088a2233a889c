use std::sync::Arc;

use aggregate::merge::RoleMerger;
use foundation::GeoBounds;
use layers::markers::{Marker, markers};
use layers::symbology::ColorScale;
use parking_lot::Mutex;
use spatial::cluster::Cluster;
use spatial::index::{ClusterOptions, GeoClusterIndex, zoom_level};
use streaming::cache::{RefinementCache, RefinementOptions};
use streaming::service::{CountsSource, DedupService, ServiceError};
use streaming::status::RefinementStatus;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::context::FilterContext;

/// Row cap per counts request.
pub const DEFAULT_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub limit: u32,
    pub cluster: ClusterOptions,
    pub refinement: RefinementOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            cluster: ClusterOptions::default(),
            refinement: RefinementOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("failed to load {role} counts: {source}")]
    Fetch {
        role: String,
        #[source]
        source: ServiceError,
    },
    /// A refresh started later committed first; this one was discarded.
    #[error("refresh superseded by a newer one")]
    Superseded,
}

/// Committed map data. Replaced wholesale, never mutated.
#[derive(Debug)]
pub struct Snapshot {
    /// 0 for the empty snapshot a session starts with.
    pub generation: u64,
    pub index: GeoClusterIndex,
    /// Observations dropped for missing location fields.
    pub dropped: usize,
}

struct SessionState {
    context: Option<FilterContext>,
    /// Generation handed to the most recently started refresh.
    requested: u64,
    snapshot: Arc<Snapshot>,
    last_error: Option<SessionError>,
}

/// One map view's data: the filter context, the committed snapshot and the
/// refinement cache that belongs to that context.
pub struct MapSession {
    source: Arc<dyn CountsSource>,
    refinement: RefinementCache,
    options: SessionOptions,
    scale: ColorScale,
    state: Mutex<SessionState>,
}

impl MapSession {
    pub fn new(source: Arc<dyn CountsSource>, dedup: Arc<dyn DedupService>, options: SessionOptions) -> Self {
        let empty = Snapshot {
            generation: 0,
            index: GeoClusterIndex::build(&[], options.cluster),
            dropped: 0,
        };
        Self {
            source,
            refinement: RefinementCache::new(dedup, options.refinement),
            options,
            scale: ColorScale::default(),
            state: Mutex::new(SessionState {
                context: None,
                requested: 0,
                snapshot: Arc::new(empty),
                last_error: None,
            }),
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn refinement(&self) -> &RefinementCache {
        &self.refinement
    }

    pub fn context(&self) -> Option<FilterContext> {
        self.state.lock().context.clone()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.lock().snapshot.clone()
    }

    /// Error from the latest refresh that failed, cleared by the next commit.
    pub fn last_error(&self) -> Option<SessionError> {
        self.state.lock().last_error.clone()
    }

    /// Load counts for `context`, one request per selected role, and commit
    /// the merged result as a new snapshot.
    ///
    /// A context change invalidates refinement before anything is fetched.
    /// On failure the previous snapshot stays active. When another refresh
    /// started after this one, the result is dropped with
    /// [`SessionError::Superseded`].
    pub async fn refresh(&self, context: FilterContext) -> Result<u64, SessionError> {
        let generation = {
            let mut state = self.state.lock();
            if state.context.as_ref() != Some(&context) {
                self.refinement.invalidate();
                state.context = Some(context.clone());
            }
            state.requested += 1;
            state.requested
        };

        let mut merger = RoleMerger::new();
        for preset in context.presets() {
            let query = context.counts_query(preset, self.options.limit);
            debug!(generation, role = preset.label, "fetching counts");
            match self.source.fetch(query).await {
                Ok(observations) => merger.add_role(preset.label, preset.query, &observations),
                Err(source) => {
                    let err = SessionError::Fetch {
                        role: preset.label.to_string(),
                        source,
                    };
                    warn!(generation, error = %err, "refresh failed; keeping previous map data");
                    let mut state = self.state.lock();
                    if state.requested == generation {
                        state.last_error = Some(err.clone());
                    }
                    return Err(err);
                }
            }
        }

        let report = merger.finish();
        if report.dropped > 0 {
            warn!(generation, dropped = report.dropped, "dropped observations without a location");
        }
        let index = GeoClusterIndex::build(&report.locations, self.options.cluster);

        let mut state = self.state.lock();
        if state.requested != generation {
            debug!(generation, latest = state.requested, "discarding superseded refresh");
            return Err(SessionError::Superseded);
        }
        state.snapshot = Arc::new(Snapshot {
            generation,
            index,
            dropped: report.dropped,
        });
        state.last_error = None;
        info!(generation, locations = report.locations.len(), "map data refreshed");
        Ok(generation)
    }

    /// Clusters of the active snapshot inside `bounds` at a (fractional) map
    /// zoom.
    pub fn clusters(&self, bounds: &GeoBounds, zoom: f64) -> Vec<Cluster> {
        self.snapshot().index.query(bounds, zoom_level(zoom))
    }

    /// Exact total for a cluster, shared with any identical request in flight.
    pub async fn inspect(&self, cluster: &Cluster) -> RefinementStatus {
        self.refinement.resolve(cluster).await
    }

    /// Markers for the viewport, labelled with whatever refinement results
    /// are currently known.
    pub fn markers(&self, bounds: &GeoBounds, zoom: f64) -> Vec<Marker> {
        let clusters = self.clusters(bounds, zoom);
        markers(&clusters, &self.scale, |c| self.refinement.status_of(c))
    }
}
