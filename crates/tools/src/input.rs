use std::collections::HashMap;
use std::fs;
use std::path::Path;

use aggregate::merge::RoleResult;
use aggregate::observation::Observation;
use anyhow::Context;
use futures_util::future::BoxFuture;
use streaming::protocol::CountsQuery;
use streaming::service::{CountsSource, ServiceError};
use tracing::debug;

/// Counts read from a JSON file of role results
/// (`[{"label", "query", "points": [...]}]`) instead of the counts service.
///
/// Rows are filtered by `min_total` and capped at `limit` the way the
/// service would; seniority is not applied.
pub struct FileCounts {
    by_query: HashMap<String, Vec<Observation>>,
}

impl FileCounts {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        let results: Vec<RoleResult> = serde_json::from_slice(bytes)?;
        let mut by_query: HashMap<String, Vec<Observation>> = HashMap::new();
        for r in results {
            by_query.entry(r.query).or_default().extend(r.observations);
        }
        Ok(Self { by_query })
    }
}

impl CountsSource for FileCounts {
    fn fetch(&self, query: CountsQuery) -> BoxFuture<'static, Result<Vec<Observation>, ServiceError>> {
        let rows: Vec<Observation> = self
            .by_query
            .get(&query.query)
            .map(|rows| {
                rows.iter()
                    .filter(|o| o.total >= query.min_total)
                    .take(query.limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        debug!(query = %query.query, rows = rows.len(), "serving counts from file");
        Box::pin(async move { Ok(rows) })
    }
}
