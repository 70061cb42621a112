//! Agent strength profiles
//!
//! Every tier runs through the same [`crate::SearchEngine`]; a profile is
//! pure data. This replaces the usual pile of near-identical per-difficulty
//! player classes with one parameterized implementation.

use serde::{Deserialize, Serialize};

/// Configuration for one strength tier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    /// Shallowest depth iterative deepening must complete
    pub min_depth: u32,
    /// Deepest iteration attempted before the budget is the only limit
    pub max_depth: u32,
    /// Wall-clock budget per decision; 0 means no deadline
    pub time_budget_ms: u64,
    /// Branching cap per ply: only this many ordered candidates are searched
    pub candidate_cap: usize,
    /// Run the win/block/fork/anti-fork stages before any tree search
    pub decisive_checks: bool,
    /// Lowest tiers skip tree search and pick among top shallow moves
    pub tree_search: bool,
    /// When not searching, choose uniformly among this many top moves
    pub shallow_pick: usize,
    /// Bounded leaf jitter for variety; 0 gives bit-for-bit determinism.
    /// Kept below the smallest evaluation increment so noise only breaks
    /// ties, never reorders moves that differ in a real signal.
    pub noise_scale: f32,
}

impl AgentProfile {
    /// No lookahead, no tactics: picks among the four best-looking moves
    pub fn beginner() -> Self {
        Self {
            name: "beginner".to_string(),
            min_depth: 0,
            max_depth: 0,
            time_budget_ms: 0,
            candidate_cap: 0,
            decisive_checks: false,
            tree_search: false,
            shallow_pick: 4,
            noise_scale: 0.2,
        }
    }

    /// Sees immediate wins and blocks, still no lookahead
    pub fn easy() -> Self {
        Self {
            name: "easy".to_string(),
            min_depth: 0,
            max_depth: 0,
            time_budget_ms: 0,
            candidate_cap: 0,
            decisive_checks: true,
            tree_search: false,
            shallow_pick: 2,
            noise_scale: 0.15,
        }
    }

    pub fn medium() -> Self {
        Self {
            name: "medium".to_string(),
            min_depth: 2,
            max_depth: 3,
            time_budget_ms: 1000,
            candidate_cap: 12,
            decisive_checks: true,
            tree_search: true,
            shallow_pick: 1,
            noise_scale: 0.1,
        }
    }

    pub fn hard() -> Self {
        Self {
            name: "hard".to_string(),
            min_depth: 2,
            max_depth: 5,
            time_budget_ms: 3000,
            candidate_cap: 16,
            decisive_checks: true,
            tree_search: true,
            shallow_pick: 1,
            noise_scale: 0.05,
        }
    }

    pub fn master() -> Self {
        Self {
            name: "master".to_string(),
            min_depth: 3,
            max_depth: 7,
            time_budget_ms: 8000,
            candidate_cap: 20,
            decisive_checks: true,
            tree_search: true,
            shallow_pick: 1,
            noise_scale: 0.0,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "beginner" => Some(Self::beginner()),
            "easy" => Some(Self::easy()),
            "medium" => Some(Self::medium()),
            "hard" => Some(Self::hard()),
            "master" => Some(Self::master()),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::beginner(),
            Self::easy(),
            Self::medium(),
            Self::hard(),
            Self::master(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_round_trip() {
        for profile in AgentProfile::all() {
            assert_eq!(AgentProfile::by_name(&profile.name), Some(profile.clone()));
        }
        assert_eq!(AgentProfile::by_name("grandmaster"), None);
    }

    #[test]
    fn test_tiers_scale_up() {
        let tiers = AgentProfile::all();
        for pair in tiers.windows(2) {
            assert!(pair[0].max_depth <= pair[1].max_depth);
            assert!(pair[0].candidate_cap <= pair[1].candidate_cap);
        }
        assert!(!AgentProfile::beginner().tree_search);
        assert!(AgentProfile::master().tree_search);
        assert_eq!(AgentProfile::master().noise_scale, 0.0);
    }

    #[test]
    fn test_profile_is_serializable_data() {
        let text = serde_json::to_string(&AgentProfile::medium()).unwrap();
        let back: AgentProfile = serde_json::from_str(&text).unwrap();
        assert_eq!(back, AgentProfile::medium());
    }
}
