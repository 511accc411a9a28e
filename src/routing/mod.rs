//! Agent routing policies for inbound enquiries
//!
//! Given a snapshot of active sales agents and a routing policy, pick the
//! agent that should own a newly created enquiry. Selection is pure: the
//! caller fetches the candidate snapshot and the round-robin context up
//! front, and persists the chosen assignment itself.
//!
//! Precondition: candidate lists must arrive sorted by a stable key
//! (`agent_id`; the candidate query orders on it). The round-robin policy
//! walks positions in that list, so an unstable order would skew fairness.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::CandidateAgent;

/// The rule used to pick which agent receives a new inbound enquiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    RoundRobin,
    Territory,
    Capacity,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        RoutingPolicy::RoundRobin
    }
}

/// Inputs to a routing decision beyond the candidate list itself
#[derive(Debug, Clone, Default)]
pub struct RoutingContext {
    /// Assignee of the most recently updated enquiry with a non-null
    /// assignee, across the whole enquiry table (not scoped to candidates)
    pub last_assigned_agent: Option<Uuid>,
    /// Free-text country associated with the new enquiry; used only by the
    /// territory policy
    pub country: Option<String>,
}

/// Select exactly one agent to own a new enquiry, or `None` when no active
/// eligible agents exist. `None` means "leave unassigned", not an error.
pub fn select_agent(
    policy: RoutingPolicy,
    candidates: &[CandidateAgent],
    ctx: &RoutingContext,
) -> Option<Uuid> {
    if candidates.is_empty() {
        return None;
    }
    match policy {
        RoutingPolicy::RoundRobin => select_round_robin(candidates, ctx),
        RoutingPolicy::Territory => select_territory(candidates, ctx),
        RoutingPolicy::Capacity => select_capacity(candidates),
    }
}

/// Next agent after the previously assigned one, in candidate-list order,
/// wrapping to the first. An unknown or absent previous assignee is treated
/// as position -1, so selection starts at the first candidate.
fn select_round_robin(candidates: &[CandidateAgent], ctx: &RoutingContext) -> Option<Uuid> {
    let last_index = ctx
        .last_assigned_agent
        .and_then(|last| candidates.iter().position(|c| c.agent_id == last));

    let next_index = match last_index {
        Some(i) => (i + 1) % candidates.len(),
        None => 0,
    };
    Some(candidates[next_index].agent_id)
}

/// First candidate whose office label contains the enquiry's country,
/// case-insensitively. Falls back to round-robin when no country is given
/// or nothing matches (single fallback, not an iterative retry).
fn select_territory(candidates: &[CandidateAgent], ctx: &RoutingContext) -> Option<Uuid> {
    if let Some(country) = ctx.country.as_deref() {
        let needle = country.trim().to_lowercase();
        if !needle.is_empty() {
            let matched = candidates.iter().find(|c| {
                c.office
                    .as_deref()
                    .map(|office| office.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            });
            if let Some(candidate) = matched {
                return Some(candidate.agent_id);
            }
        }
    }
    select_round_robin(candidates, ctx)
}

/// Candidate with the minimum open workload (open leads + open enquiries);
/// ties resolve to the earliest-listed candidate.
fn select_capacity(candidates: &[CandidateAgent]) -> Option<Uuid> {
    candidates
        .iter()
        .min_by_key(|c| c.open_workload())
        .map(|c| c.agent_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidate(n: u128, office: Option<&str>, leads: i64, enquiries: i64) -> CandidateAgent {
        CandidateAgent {
            agent_id: Uuid::from_u128(n),
            display_name: format!("Agent {}", n),
            office: office.map(|s| s.to_string()),
            open_lead_count: leads,
            open_enquiry_count: enquiries,
        }
    }

    #[test]
    fn test_empty_candidates_returns_none_for_all_policies() {
        let ctx = RoutingContext::default();
        for policy in [
            RoutingPolicy::RoundRobin,
            RoutingPolicy::Territory,
            RoutingPolicy::Capacity,
        ] {
            assert_eq!(select_agent(policy, &[], &ctx), None);
        }
    }

    #[test]
    fn test_round_robin_advances_and_wraps() {
        let candidates = vec![
            candidate(1, None, 0, 0),
            candidate(2, None, 0, 0),
            candidate(3, None, 0, 0),
        ];

        let ctx = RoutingContext {
            last_assigned_agent: Some(Uuid::from_u128(1)),
            country: None,
        };
        assert_eq!(
            select_agent(RoutingPolicy::RoundRobin, &candidates, &ctx),
            Some(Uuid::from_u128(2))
        );

        // Last candidate wraps to the first
        let ctx = RoutingContext {
            last_assigned_agent: Some(Uuid::from_u128(3)),
            country: None,
        };
        assert_eq!(
            select_agent(RoutingPolicy::RoundRobin, &candidates, &ctx),
            Some(Uuid::from_u128(1))
        );
    }

    #[test]
    fn test_round_robin_unknown_or_missing_previous_starts_at_first() {
        let candidates = vec![candidate(1, None, 0, 0), candidate(2, None, 0, 0)];

        // No enquiry has ever been assigned
        let ctx = RoutingContext::default();
        assert_eq!(
            select_agent(RoutingPolicy::RoundRobin, &candidates, &ctx),
            Some(Uuid::from_u128(1))
        );

        // Previous assignee no longer in the candidate set (deactivated)
        let ctx = RoutingContext {
            last_assigned_agent: Some(Uuid::from_u128(99)),
            country: None,
        };
        assert_eq!(
            select_agent(RoutingPolicy::RoundRobin, &candidates, &ctx),
            Some(Uuid::from_u128(1))
        );
    }

    #[test]
    fn test_territory_matches_office_substring_case_insensitively() {
        let candidates = vec![
            candidate(1, Some("Dubai Office"), 0, 0),
            candidate(2, Some("Turkey Office"), 0, 0),
        ];
        let ctx = RoutingContext {
            last_assigned_agent: None,
            country: Some("Turkey".to_string()),
        };
        assert_eq!(
            select_agent(RoutingPolicy::Territory, &candidates, &ctx),
            Some(Uuid::from_u128(2))
        );

        let ctx = RoutingContext {
            last_assigned_agent: None,
            country: Some("turkey".to_string()),
        };
        assert_eq!(
            select_agent(RoutingPolicy::Territory, &candidates, &ctx),
            Some(Uuid::from_u128(2))
        );
    }

    #[test]
    fn test_territory_falls_back_to_round_robin() {
        let candidates = vec![
            candidate(1, Some("Dubai Office"), 0, 0),
            candidate(2, Some("London Office"), 0, 0),
        ];

        // No match: behaves exactly like round-robin on the same list
        let ctx = RoutingContext {
            last_assigned_agent: Some(Uuid::from_u128(1)),
            country: Some("Turkey".to_string()),
        };
        assert_eq!(
            select_agent(RoutingPolicy::Territory, &candidates, &ctx),
            select_agent(RoutingPolicy::RoundRobin, &candidates, &ctx),
        );

        // No country supplied
        let ctx = RoutingContext::default();
        assert_eq!(
            select_agent(RoutingPolicy::Territory, &candidates, &ctx),
            Some(Uuid::from_u128(1))
        );
    }

    #[test]
    fn test_capacity_picks_lowest_workload() {
        let candidates = vec![
            candidate(1, None, 4, 2),
            candidate(2, None, 1, 1),
            candidate(3, None, 0, 5),
        ];
        let ctx = RoutingContext::default();
        assert_eq!(
            select_agent(RoutingPolicy::Capacity, &candidates, &ctx),
            Some(Uuid::from_u128(2))
        );
    }

    #[test]
    fn test_capacity_tie_resolves_to_earliest_candidate() {
        let candidates = vec![
            candidate(1, None, 2, 1),
            candidate(2, None, 1, 2),
            candidate(3, None, 0, 3),
        ];
        let ctx = RoutingContext::default();
        assert_eq!(
            select_agent(RoutingPolicy::Capacity, &candidates, &ctx),
            Some(Uuid::from_u128(1))
        );
    }

    #[test]
    fn test_default_policy_is_round_robin() {
        assert_eq!(RoutingPolicy::default(), RoutingPolicy::RoundRobin);
    }

    proptest! {
        /// Capacity always returns a member of a non-empty candidate list,
        /// and no other candidate has a strictly lower workload.
        #[test]
        fn prop_capacity_returns_a_minimum(workloads in prop::collection::vec((0i64..50, 0i64..50), 1..20)) {
            let candidates: Vec<CandidateAgent> = workloads
                .iter()
                .enumerate()
                .map(|(i, (leads, enquiries))| candidate(i as u128 + 1, None, *leads, *enquiries))
                .collect();

            let selected = select_capacity(&candidates).unwrap();
            let selected_load = candidates
                .iter()
                .find(|c| c.agent_id == selected)
                .unwrap()
                .open_workload();
            prop_assert!(candidates.iter().all(|c| c.open_workload() >= selected_load));
        }

        /// Round-robin always returns a member of a non-empty candidate list
        #[test]
        fn prop_round_robin_stays_in_list(len in 1usize..20, last in prop::option::of(0u128..30)) {
            let candidates: Vec<CandidateAgent> =
                (1..=len as u128).map(|i| candidate(i, None, 0, 0)).collect();
            let ctx = RoutingContext {
                last_assigned_agent: last.map(Uuid::from_u128),
                country: None,
            };
            let selected = select_round_robin(&candidates, &ctx).unwrap();
            prop_assert!(candidates.iter().any(|c| c.agent_id == selected));
        }
    }
}
