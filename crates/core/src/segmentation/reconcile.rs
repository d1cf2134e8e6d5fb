//! Mapping of freshly computed ranks onto durable segment records.
//!
//! Everything here is pure: the storage layer loads the current segments,
//! asks for a plan and applies it inside its own transaction.

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use super::segmentation_model::{CustomerSegment, RankProfile, SegmentDefinition, SegmentNaming};
use crate::constants::{
    DEFAULT_SEGMENT_COLORS, DEFAULT_SEGMENT_NAMES, FALLBACK_SEGMENT_COLOR,
    MONEY_DECIMAL_PRECISION, NEW_CUSTOMER_SEGMENT_COLOR, NEW_CUSTOMER_SEGMENT_DESCRIPTION,
    NEW_CUSTOMER_SEGMENT_NAME,
};

/// What to do with the segment of one rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SegmentAction {
    /// Keep the segment's name and color, refresh the description.
    Reuse {
        rank: usize,
        segment_id: String,
        description: String,
    },
    Rename {
        rank: usize,
        segment_id: String,
        name: String,
        color: String,
        description: String,
    },
    Create {
        rank: usize,
        name: String,
        color: String,
        description: String,
    },
}

impl SegmentAction {
    pub fn rank(&self) -> usize {
        match self {
            SegmentAction::Reuse { rank, .. }
            | SegmentAction::Rename { rank, .. }
            | SegmentAction::Create { rank, .. } => *rank,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SegmentAction::Reuse { .. } => "reused",
            SegmentAction::Rename { .. } => "renamed",
            SegmentAction::Create { .. } => "created",
        }
    }
}

/// One action per rank, ordered by rank.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentPlan {
    pub actions: Vec<SegmentAction>,
}

impl SegmentPlan {
    pub fn created(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SegmentAction::Create { .. }))
            .count()
    }
}

/// Default name and color for a rank; ranks past the table get
/// `Segment {rank + 1}`.
pub fn default_segment_style(rank: usize) -> (String, String) {
    match (DEFAULT_SEGMENT_NAMES.get(rank), DEFAULT_SEGMENT_COLORS.get(rank)) {
        (Some(name), Some(color)) => (name.to_string(), color.to_string()),
        _ => (format!("Segment {}", rank + 1), FALLBACK_SEGMENT_COLOR.to_string()),
    }
}

pub fn describe_profile(profile: &RankProfile) -> String {
    format!(
        "Avg. spend {}, frequency {:.1}x, last purchase {:.0} days ago.",
        profile
            .mean_monetary
            .round_dp_with_strategy(MONEY_DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero),
        profile.mean_frequency,
        profile.mean_recency_days
    )
}

pub fn segment_definitions(profiles: &[RankProfile]) -> Vec<SegmentDefinition> {
    profiles
        .iter()
        .map(|profile| {
            let (name, color) = default_segment_style(profile.rank);
            SegmentDefinition {
                rank: profile.rank,
                name,
                color,
                description: describe_profile(profile),
            }
        })
        .collect()
}

/// The bucket for customers without transactions.
pub fn reserved_segment_definition() -> SegmentDefinition {
    SegmentDefinition {
        rank: usize::MAX,
        name: NEW_CUSTOMER_SEGMENT_NAME.to_string(),
        color: NEW_CUSTOMER_SEGMENT_COLOR.to_string(),
        description: NEW_CUSTOMER_SEGMENT_DESCRIPTION.to_string(),
    }
}

/// Decides, per rank, which existing segment carries it.
///
/// Reserved segments never take part. A rank first claims an unclaimed
/// segment named like its default; remaining ranks take the remaining
/// segments in `(created_at, id)` order; anything left is created. Each
/// existing segment is claimed at most once.
pub fn reconcile_segments(
    existing: &[CustomerSegment],
    definitions: &[SegmentDefinition],
    naming: SegmentNaming,
) -> SegmentPlan {
    let mut candidates: Vec<&CustomerSegment> =
        existing.iter().filter(|s| !s.is_reserved).collect();
    candidates.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut claimed = vec![false; candidates.len()];
    let mut assigned: Vec<Option<usize>> = vec![None; definitions.len()];

    for (slot, definition) in definitions.iter().enumerate() {
        if let Some(idx) = candidates
            .iter()
            .enumerate()
            .position(|(idx, c)| !claimed[idx] && c.segment_name == definition.name)
        {
            claimed[idx] = true;
            assigned[slot] = Some(idx);
        }
    }

    for slot in assigned.iter_mut().filter(|a| a.is_none()) {
        if let Some(idx) = claimed.iter().position(|c| !c) {
            claimed[idx] = true;
            *slot = Some(idx);
        }
    }

    let actions = definitions
        .iter()
        .zip(assigned)
        .map(|(definition, candidate)| match candidate.map(|idx| candidates[idx]) {
            Some(segment) => {
                let differs =
                    segment.segment_name != definition.name || segment.color != definition.color;
                if naming == SegmentNaming::ResetToDefaults && differs {
                    SegmentAction::Rename {
                        rank: definition.rank,
                        segment_id: segment.id.clone(),
                        name: definition.name.clone(),
                        color: definition.color.clone(),
                        description: definition.description.clone(),
                    }
                } else {
                    SegmentAction::Reuse {
                        rank: definition.rank,
                        segment_id: segment.id.clone(),
                        description: definition.description.clone(),
                    }
                }
            }
            None => SegmentAction::Create {
                rank: definition.rank,
                name: definition.name.clone(),
                color: definition.color.clone(),
                description: definition.description.clone(),
            },
        })
        .collect();

    SegmentPlan { actions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn segment(id: &str, name: &str, created: u32, reserved: bool) -> CustomerSegment {
        CustomerSegment {
            id: id.to_string(),
            segment_name: name.to_string(),
            description: None,
            color: "#000000".to_string(),
            is_reserved: reserved,
            created_at: day(created),
            updated_at: day(created),
        }
    }

    fn definitions(k: usize) -> Vec<SegmentDefinition> {
        (0..k)
            .map(|rank| {
                let (name, color) = default_segment_style(rank);
                SegmentDefinition {
                    rank,
                    name,
                    color,
                    description: format!("rank {}", rank),
                }
            })
            .collect()
    }

    #[test]
    fn test_first_run_creates_every_rank() {
        let plan = reconcile_segments(&[], &definitions(3), SegmentNaming::PreserveAdminNames);
        assert_eq!(plan.created(), 3);
        match &plan.actions[0] {
            SegmentAction::Create { name, color, .. } => {
                assert_eq!(name, "VIP");
                assert_eq!(color, "#28a745");
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_rerun_reuses_ids_and_skips_reserved() {
        let existing = vec![
            segment("new", NEW_CUSTOMER_SEGMENT_NAME, 1, true),
            segment("s-vip", "VIP", 2, false),
            segment("s-freq", "Frequent Buyer", 2, false),
        ];
        let plan = reconcile_segments(&existing, &definitions(2), SegmentNaming::PreserveAdminNames);
        assert_eq!(
            plan.actions,
            vec![
                SegmentAction::Reuse {
                    rank: 0,
                    segment_id: "s-vip".to_string(),
                    description: "rank 0".to_string()
                },
                SegmentAction::Reuse {
                    rank: 1,
                    segment_id: "s-freq".to_string(),
                    description: "rank 1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_admin_renamed_segment_kept_by_position() {
        let existing = vec![
            segment("s-gold", "Gold Members", 1, false),
            segment("s-freq", "Frequent Buyer", 2, false),
        ];
        let plan = reconcile_segments(&existing, &definitions(3), SegmentNaming::PreserveAdminNames);

        assert!(matches!(
            &plan.actions[0],
            SegmentAction::Reuse { segment_id, .. } if segment_id == "s-gold"
        ));
        assert!(matches!(
            &plan.actions[1],
            SegmentAction::Reuse { segment_id, .. } if segment_id == "s-freq"
        ));
        assert!(matches!(
            &plan.actions[2],
            SegmentAction::Create { name, .. } if name == "Occasional Shopper"
        ));
    }

    #[test]
    fn test_reset_to_defaults_renames() {
        let existing = vec![segment("s-gold", "Gold Members", 1, false)];
        let plan = reconcile_segments(&existing, &definitions(1), SegmentNaming::ResetToDefaults);
        assert!(matches!(
            &plan.actions[0],
            SegmentAction::Rename { segment_id, name, .. } if segment_id == "s-gold" && name == "VIP"
        ));
    }

    #[test]
    fn test_name_match_beats_position() {
        let existing = vec![
            segment("s-old", "Frequent Buyer", 1, false),
            segment("s-vip", "VIP", 3, false),
        ];
        let plan = reconcile_segments(&existing, &definitions(2), SegmentNaming::PreserveAdminNames);
        assert!(matches!(
            &plan.actions[0],
            SegmentAction::Reuse { segment_id, .. } if segment_id == "s-vip"
        ));
        assert!(matches!(
            &plan.actions[1],
            SegmentAction::Reuse { segment_id, .. } if segment_id == "s-old"
        ));
    }

    #[test]
    fn test_no_segment_claimed_twice() {
        let existing = vec![segment("s1", "VIP", 1, false)];
        let plan = reconcile_segments(&existing, &definitions(3), SegmentNaming::PreserveAdminNames);
        assert_eq!(plan.created(), 2);
    }

    #[test]
    fn test_fallback_style_beyond_table() {
        assert_eq!(
            default_segment_style(5),
            ("Segment 6".to_string(), FALLBACK_SEGMENT_COLOR.to_string())
        );
    }

    #[test]
    fn test_description_uses_profile_means() {
        let profile = RankProfile {
            rank: 0,
            customers: 2,
            mean_recency_days: 3.4,
            mean_frequency: 2.5,
            mean_monetary: dec!(1234.565),
        };
        assert_eq!(
            describe_profile(&profile),
            "Avg. spend 1234.57, frequency 2.5x, last purchase 3 days ago."
        );
    }
}
