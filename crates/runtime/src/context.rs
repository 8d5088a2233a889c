use std::fmt;
use std::str::FromStr;

use aggregate::roles::{RolePreset, selected_presets};
use serde::{Deserialize, Serialize};
use streaming::protocol::CountsQuery;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Entry,
    Mid,
    Senior,
    All,
}

impl Seniority {
    pub const GRANULAR: [Seniority; 3] = [Seniority::Entry, Seniority::Mid, Seniority::Senior];

    pub fn as_str(self) -> &'static str {
        match self {
            Seniority::Entry => "entry",
            Seniority::Mid => "mid",
            Seniority::Senior => "senior",
            Seniority::All => "all",
        }
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown seniority level `{0}` (expected entry, mid, senior or all)")]
pub struct UnknownSeniority(pub String);

impl FromStr for Seniority {
    type Err = UnknownSeniority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entry" => Ok(Seniority::Entry),
            "mid" => Ok(Seniority::Mid),
            "senior" => Ok(Seniority::Senior),
            "all" => Ok(Seniority::All),
            _ => Err(UnknownSeniority(s.to_string())),
        }
    }
}

/// A seniority filter. Never empty; `[All]` stands for "no filter".
///
/// Levels are kept in `entry, mid, senior` order so equal selections compare
/// equal however they were built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SenioritySelection {
    levels: Vec<Seniority>,
}

impl Default for SenioritySelection {
    fn default() -> Self {
        Self::all()
    }
}

impl SenioritySelection {
    pub fn all() -> Self {
        Self {
            levels: vec![Seniority::All],
        }
    }

    /// Selection holding `levels`, normalized as if each had been toggled on.
    pub fn from_levels(levels: impl IntoIterator<Item = Seniority>) -> Self {
        let mut selection = Self { levels: Vec::new() };
        for level in levels {
            if level == Seniority::All {
                return Self::all();
            }
            if !selection.levels.contains(&level) {
                selection.levels.push(level);
            }
        }
        selection.normalize();
        selection
    }

    /// Checkbox semantics. Choosing `All` resets the selection; choosing a
    /// granular level flips it and clears `All`. Ending up with every
    /// granular level, or none, collapses back to `All`.
    pub fn toggle(&mut self, level: Seniority) {
        if level == Seniority::All {
            *self = Self::all();
            return;
        }
        self.levels.retain(|l| *l != Seniority::All);
        if let Some(pos) = self.levels.iter().position(|l| *l == level) {
            self.levels.remove(pos);
        } else {
            self.levels.push(level);
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let granular = Seniority::GRANULAR.iter().filter(|g| self.levels.contains(g)).count();
        if granular == 0 || granular == Seniority::GRANULAR.len() {
            self.levels = vec![Seniority::All];
        } else {
            self.levels.sort();
        }
    }

    pub fn levels(&self) -> &[Seniority] {
        &self.levels
    }

    pub fn is_all(&self) -> bool {
        self.levels == [Seniority::All]
    }

    /// Values for the counts service's `seniority` parameter; empty for `All`.
    pub fn params(&self) -> Vec<String> {
        if self.is_all() {
            return Vec::new();
        }
        self.levels.iter().map(|l| l.as_str().to_string()).collect()
    }
}

/// Everything that decides which observations a refresh loads. Refinement
/// state is only valid for the context it was computed under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterContext {
    /// Role preset keys; empty selects every preset.
    pub roles: Vec<String>,
    pub seniorities: SenioritySelection,
    pub min_total: u64,
}

impl FilterContext {
    pub fn new(roles: Vec<String>, seniorities: SenioritySelection, min_total: u64) -> Self {
        Self {
            roles,
            seniorities,
            min_total,
        }
    }

    pub fn presets(&self) -> Vec<&'static RolePreset> {
        selected_presets(&self.roles)
    }

    pub fn counts_query(&self, preset: &RolePreset, limit: u32) -> CountsQuery {
        CountsQuery {
            query: preset.query.to_string(),
            seniorities: self.seniorities.params(),
            min_total: self.min_total,
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{FilterContext, Seniority, SenioritySelection};
    use aggregate::roles::preset;

    #[test]
    fn granular_toggle_clears_all() {
        let mut s = SenioritySelection::all();
        s.toggle(Seniority::Senior);
        assert_eq!(s.levels(), &[Seniority::Senior]);
        s.toggle(Seniority::Entry);
        assert_eq!(s.levels(), &[Seniority::Entry, Seniority::Senior]);
        assert_eq!(s.params(), vec!["entry".to_string(), "senior".to_string()]);
    }

    #[test]
    fn selecting_all_resets() {
        let mut s = SenioritySelection::from_levels([Seniority::Mid]);
        s.toggle(Seniority::All);
        assert!(s.is_all());
        assert!(s.params().is_empty());
    }

    #[test]
    fn every_or_no_granular_level_collapses_to_all() {
        let mut s = SenioritySelection::from_levels([Seniority::Entry, Seniority::Mid]);
        s.toggle(Seniority::Senior);
        assert!(s.is_all());

        let mut s = SenioritySelection::from_levels([Seniority::Mid]);
        s.toggle(Seniority::Mid);
        assert!(s.is_all());
    }

    #[test]
    fn order_does_not_affect_equality() {
        let a = SenioritySelection::from_levels([Seniority::Senior, Seniority::Entry]);
        let b = SenioritySelection::from_levels([Seniority::Entry, Seniority::Senior]);
        assert_eq!(a, b);
    }

    #[test]
    fn parses_levels() {
        assert_eq!("Senior".parse::<Seniority>(), Ok(Seniority::Senior));
        assert!("principal".parse::<Seniority>().is_err());
    }

    #[test]
    fn counts_query_carries_filters() {
        let ctx = FilterContext::new(
            vec!["backend".into()],
            SenioritySelection::from_levels([Seniority::Mid]),
            5,
        );
        let presets = ctx.presets();
        assert_eq!(presets.len(), 1);

        let q = ctx.counts_query(presets[0], 1000);
        assert_eq!(q.query, "Backend Engineer");
        assert_eq!(q.seniorities, vec!["mid".to_string()]);
        assert_eq!(q.min_total, 5);
        assert_eq!(q.limit, 1000);

        let software = preset("software").unwrap();
        assert!(FilterContext::default().counts_query(software, 10).seniorities.is_empty());
    }
}
