//! Standard three-stage debate lesson template.
//!
//! The lesson is split 30% / 50% / remainder across the three stages, and
//! each stage budget is split across a fixed list of activities by fixed
//! ratios. Activity ids (`"1-1"`, `"2-3"`, ...) are stable and double as
//! keys into the guidance table.
//!
//! Rounding is half away from zero on the `f64` product, so `61 * 0.5`
//! becomes 31. The third stage absorbs every stage-level rounding error, so
//! the three stage budgets always add up to the requested total. Activity
//! minutes are rounded independently and are not corrected; a stage's
//! recorded total can therefore differ from the sum of its activities by a
//! minute or two until one of its activities is edited.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::model::{Activity, Scenario, Stage};
use crate::error::{Result, ValidationError};

/// Share of the total given to stage 1.
pub const STAGE1_RATIO: f64 = 0.3;
/// Share of the total given to stage 2. Stage 3 receives the remainder.
pub const STAGE2_RATIO: f64 = 0.5;

/// Recommended lesson length range in minutes.
pub const RECOMMENDED_TOTAL_TIME: std::ops::RangeInclusive<u32> = 15..=180;
/// Recommended group count range.
pub const RECOMMENDED_GROUP_COUNT: std::ops::RangeInclusive<u32> = 2..=10;

/// One activity slot of a stage blueprint.
#[derive(Debug, Clone, Copy)]
pub struct ActivitySlot {
    pub id: &'static str,
    pub title: &'static str,
    /// Share of the stage budget (0.0-1.0).
    pub ratio: f64,
}

/// Fixed layout of one stage.
#[derive(Debug, Clone, Copy)]
pub struct StageBlueprint {
    pub id: &'static str,
    pub title: &'static str,
    pub activities: &'static [ActivitySlot],
}

pub const STANDARD_STAGES: [StageBlueprint; 3] = [
    StageBlueprint {
        id: "stage-1",
        title: "Stage 1: Facing Differences",
        activities: &[
            ActivitySlot { id: "1-1", title: "Meeting the motion through questions", ratio: 0.2 },
            ActivitySlot { id: "1-2", title: "Finding the core issues", ratio: 0.2 },
            ActivitySlot { id: "1-3", title: "Research and analysis", ratio: 0.3 },
            ActivitySlot { id: "1-4", title: "Writing the position paper", ratio: 0.3 },
        ],
    },
    StageBlueprint {
        id: "stage-2",
        title: "Stage 2: Understanding Differences",
        activities: &[
            ActivitySlot { id: "2-1", title: "Opening statements", ratio: 0.2 },
            ActivitySlot { id: "2-2", title: "Team caucus", ratio: 0.1 },
            ActivitySlot { id: "2-3", title: "Cross-examination and rebuttal", ratio: 0.3 },
            ActivitySlot { id: "2-4", title: "Caucus and open floor debate", ratio: 0.2 },
            ActivitySlot { id: "2-5", title: "Closing statements toward coexistence", ratio: 0.2 },
        ],
    },
    StageBlueprint {
        id: "stage-3",
        title: "Stage 3: Living With Differences",
        activities: &[
            ActivitySlot { id: "3-1", title: "Sharing thoughts after the debate", ratio: 0.6 },
            ActivitySlot { id: "3-2", title: "Reflection and civic action guidance", ratio: 0.4 },
        ],
    },
];

/// Round a non-negative share of `minutes`, half away from zero.
fn share(minutes: u32, ratio: f64) -> u32 {
    (f64::from(minutes) * ratio).round() as u32
}

/// Split `total_time` into the three stage budgets.
///
/// The result always sums to `total_time`.
pub fn stage_budgets(total_time: u32) -> [u32; 3] {
    let stage1 = share(total_time, STAGE1_RATIO);
    let stage2 = share(total_time, STAGE2_RATIO);
    let stage3 = total_time.saturating_sub(stage1).saturating_sub(stage2);
    [stage1, stage2, stage3]
}

impl StageBlueprint {
    /// Materialize this stage with the given budget.
    ///
    /// Each activity receives at least one minute. `total_time` records the
    /// budget, not the activity sum.
    pub fn build(&self, budget: u32) -> Stage {
        let activities = self
            .activities
            .iter()
            .map(|slot| Activity::new(slot.id, slot.title, share(budget, slot.ratio).max(1)))
            .collect();
        Stage {
            id: self.id.to_string(),
            title: self.title.to_string(),
            activities,
            total_time: budget,
        }
    }
}

/// Generate the standard debate lesson for `topic`.
///
/// # Errors
/// Returns a validation error if the topic is blank, `total_time` is zero or
/// `group_count` is below 2.
pub fn generate_standard(topic: &str, total_time: u32, group_count: u32) -> Result<Scenario> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ValidationError::invalid("topic", "must not be empty").into());
    }
    if total_time == 0 {
        return Err(ValidationError::invalid("total_time", "must be positive").into());
    }
    if group_count < 2 {
        return Err(ValidationError::invalid("group_count", "must be at least 2").into());
    }
    if !RECOMMENDED_TOTAL_TIME.contains(&total_time) {
        warn!(total_time, "lesson length outside the recommended 15-180 minutes");
    }
    if !RECOMMENDED_GROUP_COUNT.contains(&group_count) {
        warn!(group_count, "group count outside the recommended 2-10");
    }

    let budgets = stage_budgets(total_time);
    let stages = STANDARD_STAGES
        .iter()
        .zip(budgets)
        .map(|(blueprint, budget)| blueprint.build(budget))
        .collect();

    let scenario = Scenario {
        id: Uuid::new_v4().to_string(),
        title: topic.to_string(),
        total_time,
        group_count,
        stages,
        created_at: Utc::now(),
        user_id: None,
    };
    info!(id = %scenario.id, total_time, group_count, "generated standard scenario");
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(stage: &Stage) -> Vec<u32> {
        stage.activities.iter().map(|a| a.time_minutes).collect()
    }

    #[test]
    fn sixty_minutes_splits_exactly() {
        let s = generate_standard("School uniforms", 60, 4).unwrap();
        let totals: Vec<u32> = s.stages.iter().map(|st| st.total_time).collect();
        assert_eq!(totals, vec![18, 30, 12]);
        assert_eq!(minutes(&s.stages[0]), vec![4, 4, 5, 5]);
        assert_eq!(minutes(&s.stages[1]), vec![6, 3, 9, 6, 6]);
        assert_eq!(minutes(&s.stages[2]), vec![7, 5]);
    }

    #[test]
    fn sixty_one_rounds_half_up() {
        assert_eq!(stage_budgets(61), [18, 31, 12]);
    }

    #[test]
    fn fixed_ids_and_titles() {
        let s = generate_standard("topic", 45, 3).unwrap();
        let ids: Vec<&str> = s
            .stages
            .iter()
            .flat_map(|st| st.activities.iter().map(|a| a.id.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec!["1-1", "1-2", "1-3", "1-4", "2-1", "2-2", "2-3", "2-4", "2-5", "3-1", "3-2"]
        );
        assert_eq!(s.stages[2].id, "stage-3");
        assert_eq!(s.title, "topic");
        assert!(s.user_id.is_none());
    }

    #[test]
    fn recorded_stage_total_may_differ_from_activity_sum() {
        // 45 -> stage 2 budget round(22.5) = 23; activities 5+2+7+5+5 = 24.
        let s = generate_standard("topic", 45, 3).unwrap();
        assert_eq!(s.stages[1].total_time, 23);
        assert_eq!(s.stages[1].activity_minutes(), 24);
        assert!(!s.stages[1].is_synced());
    }

    #[test]
    fn tiny_lessons_still_give_every_activity_a_minute() {
        let s = generate_standard("topic", 1, 2).unwrap();
        assert!(s.stages.iter().flat_map(|st| &st.activities).all(|a| a.time_minutes >= 1));
        assert_eq!(s.planned_minutes(), 1);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(generate_standard("   ", 60, 4).is_err());
        let err = generate_standard("topic", 0, 4).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
        assert!(generate_standard("topic", 60, 1).is_err());
    }

    #[test]
    fn ids_are_unique_per_scenario() {
        let a = generate_standard("topic", 60, 4).unwrap();
        let b = generate_standard("topic", 60, 4).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.validate().is_ok());
    }
}
