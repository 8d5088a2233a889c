//! Wire types for the counts and deduplication services.
//!
//! Field names follow the services' snake_case JSON.

use aggregate::location::MemberIdentity;
use serde::{Deserialize, Serialize};
use spatial::cluster::Cluster;

/// Body of the dedup (`cluster-count`) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seniority_level: Option<String>,
    pub members: Vec<MemberIdentity>,
}

impl DedupRequest {
    /// `queries` is only sent when the cluster spans two or more role queries.
    pub fn for_cluster(cluster: &Cluster) -> Self {
        let queries = cluster.role_queries();
        Self {
            query: cluster.query.clone().unwrap_or_default(),
            queries: (queries.len() > 1).then_some(queries),
            seniority_level: cluster.seniority_level.clone(),
            members: cluster.members.iter().map(|m| m.identity()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub query: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupResponse {
    /// Absent when the service could not produce a count.
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub breakdown: Option<Vec<BreakdownEntry>>,
}

/// Parameters of one counts-by-location request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountsQuery {
    pub query: String,
    /// Empty means no seniority filter.
    pub seniorities: Vec<String>,
    pub min_total: u64,
    pub limit: u32,
}

impl CountsQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("query", self.query.clone())];
        params.extend(self.seniorities.iter().map(|s| ("seniority", s.clone())));
        params.push(("min_total", self.min_total.to_string()));
        params.push(("limit", self.limit.to_string()));
        params
    }
}
