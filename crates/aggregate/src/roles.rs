/// A selectable role: stable key, display label, and the search query sent
/// to the counts service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePreset {
    pub key: &'static str,
    pub label: &'static str,
    pub query: &'static str,
}

pub const ROLE_PRESETS: [RolePreset; 7] = [
    RolePreset {
        key: "software",
        label: "Software",
        query: "Software Engineer",
    },
    RolePreset {
        key: "frontend",
        label: "Frontend",
        query: "Frontend Engineer",
    },
    RolePreset {
        key: "backend",
        label: "Backend",
        query: "Backend Engineer",
    },
    RolePreset {
        key: "fullstack",
        label: "Fullstack",
        query: "Full Stack Engineer",
    },
    RolePreset {
        key: "devops",
        label: "DevOps",
        query: "DevOps Engineer",
    },
    RolePreset {
        key: "data",
        label: "Data",
        query: "Data Engineer",
    },
    RolePreset {
        key: "mobile",
        label: "Mobile",
        query: "Mobile Developer",
    },
];

pub fn preset(key: &str) -> Option<&'static RolePreset> {
    ROLE_PRESETS.iter().find(|p| p.key == key)
}

/// Presets for a role selection. An empty selection means every preset;
/// unknown keys are skipped. Selection order is kept.
pub fn selected_presets<S: AsRef<str>>(selected: &[S]) -> Vec<&'static RolePreset> {
    if selected.is_empty() {
        return ROLE_PRESETS.iter().collect();
    }
    selected.iter().filter_map(|k| preset(k.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::{ROLE_PRESETS, preset, selected_presets};

    #[test]
    fn empty_selection_means_all_roles() {
        let none: [&str; 0] = [];
        assert_eq!(selected_presets(&none).len(), ROLE_PRESETS.len());
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let picked = selected_presets(&["backend", "astronaut", "data"]);
        let labels: Vec<_> = picked.iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["Backend", "Data"]);
    }

    #[test]
    fn fullstack_query_has_a_space() {
        assert_eq!(preset("fullstack").unwrap().query, "Full Stack Engineer");
    }
}
