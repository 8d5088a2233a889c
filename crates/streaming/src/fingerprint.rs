use std::fmt;

use aggregate::location::MemberIdentity;
use foundation::math::precision::canonical_f64;
use serde::{Deserialize, Serialize};
use spatial::cluster::Cluster;

const FIELD_SEP: char = '\u{1f}';
const MEMBER_SEP: char = '\u{1e}';

/// Deterministic identity of a cluster's composition; the refinement cache
/// key.
///
/// Derived from the representative query, the seniority filter, and every
/// member's `(city, state, lat, lon, radius_miles)`. Member order does not
/// matter; any change to a member's identity (radius included) changes the
/// fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(cluster: &Cluster) -> Self {
        let identities: Vec<MemberIdentity> = cluster.members.iter().map(|m| m.identity()).collect();
        Self::from_parts(
            cluster.query.as_deref(),
            cluster.seniority_level.as_deref(),
            &identities,
        )
    }

    pub fn from_parts(
        query: Option<&str>,
        seniority_level: Option<&str>,
        members: &[MemberIdentity],
    ) -> Self {
        let mut member_keys: Vec<String> = members.iter().map(member_key).collect();
        member_keys.sort_unstable();

        let mut canonical = String::new();
        canonical.push_str(query.unwrap_or(""));
        canonical.push(FIELD_SEP);
        canonical.push_str(seniority_level.unwrap_or(""));
        for key in member_keys {
            canonical.push(MEMBER_SEP);
            canonical.push_str(&key);
        }

        Self(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn member_key(m: &MemberIdentity) -> String {
    format!(
        "{}{FIELD_SEP}{}{FIELD_SEP}{}{FIELD_SEP}{}{FIELD_SEP}{}",
        m.city,
        m.state,
        canonical_f64(m.lat),
        canonical_f64(m.lon),
        canonical_f64(m.radius_miles),
    )
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use aggregate::location::MemberIdentity;

    use super::Fingerprint;

    fn member(city: &str, radius: f64) -> MemberIdentity {
        MemberIdentity {
            city: city.to_string(),
            state: "TX".to_string(),
            lat: 30.0,
            lon: -97.0,
            radius_miles: radius,
        }
    }

    #[test]
    fn identical_composition_matches() {
        let a = Fingerprint::from_parts(Some("Software Engineer"), None, &[member("Austin", 25.0), member("Waco", 25.0)]);
        let b = Fingerprint::from_parts(Some("Software Engineer"), None, &[member("Austin", 25.0), member("Waco", 25.0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn member_order_does_not_matter() {
        let a = Fingerprint::from_parts(Some("q"), Some("senior"), &[member("Austin", 25.0), member("Waco", 25.0)]);
        let b = Fingerprint::from_parts(Some("q"), Some("senior"), &[member("Waco", 25.0), member("Austin", 25.0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn radius_changes_fingerprint() {
        let a = Fingerprint::from_parts(Some("q"), None, &[member("Austin", 25.0), member("Waco", 25.0)]);
        let b = Fingerprint::from_parts(Some("q"), None, &[member("Austin", 25.0), member("Waco", 50.0)]);
        assert_ne!(a, b);
    }

    #[test]
    fn context_fields_change_fingerprint() {
        let members = [member("Austin", 25.0)];
        let base = Fingerprint::from_parts(Some("q"), None, &members);
        assert_ne!(base, Fingerprint::from_parts(Some("other"), None, &members));
        assert_ne!(base, Fingerprint::from_parts(Some("q"), Some("entry"), &members));
    }

    #[test]
    fn separators_prevent_field_bleed() {
        let a = Fingerprint::from_parts(Some("ab"), Some("c"), &[]);
        let b = Fingerprint::from_parts(Some("a"), Some("bc"), &[]);
        assert_ne!(a, b);
    }
}
