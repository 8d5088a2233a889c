use spatial::cluster::Cluster;
use streaming::status::RefinementStatus;

pub const REFINING_SUFFIX: &str = "(refining…)";

/// Human-readable total for a cluster given its refinement status.
///
/// - resolved: the exact total
/// - pending with a range: `max–sum (refining…)`
/// - otherwise: `max–sum` when the totals form a range, else the plain total
///
/// An unrefined or failed cluster keeps showing its range instead of
/// collapsing to a single number, so an approximate total never reads as
/// exact.
pub fn total_label(cluster: &Cluster, status: Option<&RefinementStatus>) -> String {
    let range = || format!("{}–{}", cluster.max_total, cluster.sum_total);
    match status {
        Some(RefinementStatus::Resolved(r)) => r.exact_total.to_string(),
        Some(RefinementStatus::Pending) if cluster.has_range() => {
            format!("{} {REFINING_SUFFIX}", range())
        }
        _ if cluster.has_range() => range(),
        _ => cluster.max_total.to_string(),
    }
}
