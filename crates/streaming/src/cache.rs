use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;

use aggregate::location::RoleCount;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use spatial::cluster::Cluster;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::fingerprint::Fingerprint;
use crate::protocol::{DedupRequest, DedupResponse};
use crate::service::{DedupService, ServiceError};
use crate::status::{RefinementStatus, Resolution};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RefinementOptions {
    /// How long a resolved total is served before it is fetched again.
    pub freshness: Duration,
}

impl Default for RefinementOptions {
    fn default() -> Self {
        Self {
            freshness: Duration::from_secs(5 * 60),
        }
    }
}

/// Outcome of one dedup call, before it is committed to the store.
#[derive(Debug)]
enum Outcome {
    Resolved(Resolution),
    Failed(String),
}

impl Outcome {
    fn into_status(self) -> RefinementStatus {
        match self {
            Outcome::Resolved(resolution) => RefinementStatus::Resolved(resolution),
            Outcome::Failed(message) => RefinementStatus::Failed { message },
        }
    }
}

/// A dedup call plus its commit into the store. Completes the same way
/// whichever waiter (or the background driver) polls it.
type SharedFetch = Shared<BoxFuture<'static, RefinementStatus>>;

enum Slot {
    Pending { attempt: u64, fetch: SharedFetch },
    Resolved { resolution: Resolution, at: Instant },
    /// Kept for display only; the next request retries.
    Failed { message: String, at: Instant },
}

impl Slot {
    fn is_expired(&self, freshness: Duration) -> bool {
        match self {
            Slot::Pending { .. } => false,
            Slot::Resolved { at, .. } | Slot::Failed { at, .. } => at.elapsed() >= freshness,
        }
    }
}

struct State {
    /// Bumped on every invalidation; responses from older epochs are dropped.
    epoch: u64,
    next_attempt: u64,
    slots: HashMap<Fingerprint, Slot>,
}

struct Inner {
    service: Arc<dyn DedupService>,
    options: RefinementOptions,
    state: Mutex<State>,
}

/// Session-scoped store of exact deduplicated totals, keyed by cluster
/// fingerprint.
///
/// Cloning is cheap and every clone shares the same store, so a cluster
/// inspected again from anywhere in the session is served from cache.
/// At most one dedup call is outstanding per fingerprint: the
/// check-then-mark-pending step runs under one lock acquisition before any
/// `.await`.
#[derive(Clone)]
pub struct RefinementCache {
    inner: Arc<Inner>,
}

/// Handle returned by [`RefinementCache::request`].
///
/// Dropping a `Waiting` handle does not abandon the call: inside a tokio
/// runtime the fetch is also driven by a detached task, and its result lands
/// in the store either way.
pub enum RefinementRequest {
    Ready(RefinementStatus),
    Waiting(Waiting),
}

pub struct Waiting {
    fetch: SharedFetch,
}

impl RefinementRequest {
    /// Status at the time of the request.
    pub fn status(&self) -> RefinementStatus {
        match self {
            RefinementRequest::Ready(status) => status.clone(),
            RefinementRequest::Waiting(_) => RefinementStatus::Pending,
        }
    }

    pub async fn wait(self) -> RefinementStatus {
        match self {
            RefinementRequest::Ready(status) => status,
            RefinementRequest::Waiting(w) => w.fetch.await,
        }
    }
}

/// Whether a cluster's reported total might double count postings: more
/// than one location, or one location summed over several roles.
pub fn needs_refinement(cluster: &Cluster) -> bool {
    match cluster.members.as_slice() {
        [] => false,
        [only] => only.per_role.len() > 1,
        _ => true,
    }
}

impl RefinementCache {
    pub fn new(service: Arc<dyn DedupService>, options: RefinementOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                options,
                state: Mutex::new(State {
                    epoch: 0,
                    next_attempt: 1,
                    slots: HashMap::new(),
                }),
            }),
        }
    }

    pub fn options(&self) -> RefinementOptions {
        self.inner.options
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a cluster's exact total, from cache when fresh.
    pub async fn resolve(&self, cluster: &Cluster) -> RefinementStatus {
        self.request(cluster).wait().await
    }

    /// Synchronously look up or start the refinement for `cluster`.
    ///
    /// Fresh resolved entries come back `Ready`; a pending entry is joined;
    /// anything else (absent, failed, expired) starts a new dedup call.
    pub fn request(&self, cluster: &Cluster) -> RefinementRequest {
        if !needs_refinement(cluster) {
            return RefinementRequest::Ready(RefinementStatus::Unneeded);
        }

        let fingerprint = Fingerprint::of(cluster);
        let mut state = self.inner.state.lock();

        let freshness = self.inner.options.freshness;
        match state.slots.get(&fingerprint) {
            Some(Slot::Resolved { resolution, at }) if at.elapsed() < freshness => {
                debug!(%fingerprint, "refinement served from cache");
                return RefinementRequest::Ready(RefinementStatus::Resolved(resolution.clone()));
            }
            Some(Slot::Pending { attempt, fetch }) => {
                debug!(%fingerprint, attempt, "joining in-flight refinement");
                return RefinementRequest::Waiting(Waiting { fetch: fetch.clone() });
            }
            _ => {}
        }

        let attempt = state.next_attempt;
        state.next_attempt += 1;
        let epoch = state.epoch;

        let request = DedupRequest::for_cluster(cluster);
        let roles = cluster.roles();
        let call = self.inner.service.count(request);
        let store: Weak<Inner> = Arc::downgrade(&self.inner);
        let key = fingerprint.clone();
        let fetch = async move {
            let outcome = outcome_of(call.await, roles);
            match store.upgrade() {
                Some(inner) => inner.commit(&key, epoch, attempt, outcome),
                None => outcome.into_status(),
            }
        }
        .boxed()
        .shared();

        debug!(%fingerprint, attempt, members = cluster.members.len(), "refinement requested");
        state.slots.retain(|_, slot| !slot.is_expired(freshness));
        state.slots.insert(
            fingerprint.clone(),
            Slot::Pending {
                attempt,
                fetch: fetch.clone(),
            },
        );
        drop(state);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(fetch.clone());
        }

        RefinementRequest::Waiting(Waiting { fetch })
    }

    /// Current status for a fingerprint without starting anything.
    ///
    /// Expired entries read as absent and are evicted.
    pub fn peek(&self, fingerprint: &Fingerprint) -> Option<RefinementStatus> {
        let mut state = self.inner.state.lock();
        if state.slots.get(fingerprint)?.is_expired(self.inner.options.freshness) {
            state.slots.remove(fingerprint);
            return None;
        }
        match state.slots.get(fingerprint)? {
            Slot::Pending { .. } => Some(RefinementStatus::Pending),
            Slot::Resolved { resolution, .. } => Some(RefinementStatus::Resolved(resolution.clone())),
            Slot::Failed { message, .. } => Some(RefinementStatus::Failed {
                message: message.clone(),
            }),
        }
    }

    /// Current status for a cluster, as a renderer would show it.
    pub fn status_of(&self, cluster: &Cluster) -> Option<RefinementStatus> {
        if !needs_refinement(cluster) {
            return None;
        }
        self.peek(&Fingerprint::of(cluster))
    }

    /// Drop every entry and disown in-flight requests. Called when the filter
    /// context changes.
    pub fn invalidate(&self) {
        let mut state = self.inner.state.lock();
        state.epoch += 1;
        let dropped = state.slots.len();
        state.slots.clear();
        debug!(epoch = state.epoch, dropped, "refinement cache invalidated");
    }
}

impl Inner {
    fn commit(&self, fingerprint: &Fingerprint, epoch: u64, attempt: u64, outcome: Outcome) -> RefinementStatus {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            debug!(%fingerprint, "discarding refinement from a superseded context");
            return RefinementStatus::Superseded;
        }

        let owns_slot = matches!(
            state.slots.get(fingerprint),
            Some(Slot::Pending { attempt: a, .. }) if *a == attempt
        );

        match outcome {
            Outcome::Resolved(resolution) => {
                if owns_slot {
                    debug!(%fingerprint, exact_total = resolution.exact_total, "refinement resolved");
                    state.slots.insert(
                        fingerprint.clone(),
                        Slot::Resolved {
                            resolution: resolution.clone(),
                            at: Instant::now(),
                        },
                    );
                }
                RefinementStatus::Resolved(resolution)
            }
            Outcome::Failed(message) => {
                if owns_slot {
                    warn!(%fingerprint, error = %message, "refinement failed");
                    state.slots.insert(
                        fingerprint.clone(),
                        Slot::Failed {
                            message: message.clone(),
                            at: Instant::now(),
                        },
                    );
                }
                RefinementStatus::Failed { message }
            }
        }
    }
}

fn outcome_of(result: Result<DedupResponse, ServiceError>, roles: BTreeMap<String, RoleCount>) -> Outcome {
    let response = match result {
        Ok(r) => r,
        Err(e) => return Outcome::Failed(e.to_string()),
    };
    let Some(exact_total) = response.total else {
        return Outcome::Failed(ServiceError::MissingTotal.to_string());
    };

    let per_role = response.breakdown.map(|breakdown| {
        let mut per_role = roles;
        for entry in breakdown {
            for rc in per_role.values_mut().filter(|rc| rc.query == entry.query) {
                rc.total = entry.total;
            }
        }
        per_role
    });

    Outcome::Resolved(Resolution {
        exact_total,
        per_role,
    })
}
