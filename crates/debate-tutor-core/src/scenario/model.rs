//! Scenario → Stage → Activity time-allocation tree.
//!
//! Minutes live on activities. A stage's `total_time` is derived from its
//! activities and is re-synced by [`Stage::recompute_total`] after every edit.
//! The scenario-level `total_time` is the target the lesson was planned for;
//! the sum of stage totals may drift away from it after edits.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,
    /// Duration in minutes, always >= 1.
    pub time_minutes: u32,
}

impl Activity {
    pub fn new(id: impl Into<String>, title: impl Into<String>, time_minutes: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            time_minutes,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.time_minutes).saturating_mul(60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub title: String,
    pub activities: Vec<Activity>,
    pub total_time: u32,
}

impl Stage {
    /// Build a stage whose total is the sum of its activities.
    pub fn new(id: impl Into<String>, title: impl Into<String>, activities: Vec<Activity>) -> Self {
        let mut stage = Self {
            id: id.into(),
            title: title.into(),
            activities,
            total_time: 0,
        };
        stage.recompute_total();
        stage
    }

    /// Sum of the activity minutes, independent of the recorded `total_time`.
    pub fn activity_minutes(&self) -> u32 {
        self.activities.iter().map(|a| a.time_minutes).sum()
    }

    pub fn recompute_total(&mut self) -> u32 {
        self.total_time = self.activity_minutes();
        self.total_time
    }

    /// Whether the recorded total matches the activities.
    pub fn is_synced(&self) -> bool {
        self.total_time == self.activity_minutes()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub total_time: u32,
    pub group_count: u32,
    pub stages: Vec<Stage>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Scenario {
    pub fn stage(&self, stage_index: usize) -> Option<&Stage> {
        self.stages.get(stage_index)
    }

    pub fn activity(&self, stage_index: usize, activity_index: usize) -> Option<&Activity> {
        self.stages.get(stage_index)?.activities.get(activity_index)
    }

    pub fn activity_count(&self) -> usize {
        self.stages.iter().map(|s| s.activities.len()).sum()
    }

    /// Sum of the recorded stage totals.
    pub fn planned_minutes(&self) -> u32 {
        self.stages.iter().map(|s| s.total_time).sum()
    }

    /// Planned minutes minus the target `total_time`. Positive means over budget.
    pub fn drift_minutes(&self) -> i64 {
        i64::from(self.planned_minutes()) - i64::from(self.total_time)
    }

    /// Change one activity's duration and re-sync its stage total.
    ///
    /// Other stages are left untouched, including any pre-existing
    /// mismatch between their recorded totals and their activities.
    pub fn set_activity_time(
        &mut self,
        stage_index: usize,
        activity_index: usize,
        minutes: u32,
    ) -> Result<()> {
        if minutes < 1 {
            return Err(ValidationError::invalid("time_minutes", "must be at least 1 minute").into());
        }
        let stage_len = self.stages.len();
        let stage = self
            .stages
            .get_mut(stage_index)
            .ok_or_else(|| ValidationError::out_of_bounds("stages", stage_index, stage_len))?;
        let activity_len = stage.activities.len();
        let activity = stage
            .activities
            .get_mut(activity_index)
            .ok_or_else(|| ValidationError::out_of_bounds("activities", activity_index, activity_len))?;
        activity.time_minutes = minutes;
        stage.recompute_total();
        Ok(())
    }

    /// Re-sync every stage total from its activities.
    pub fn recompute_totals(&mut self) {
        for stage in &mut self.stages {
            stage.recompute_total();
        }
    }

    /// Check the structural invariants of the tree.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.group_count < 2 {
            return Err(ValidationError::invalid("group_count", "must be at least 2"));
        }
        if self.stages.is_empty() {
            return Err(ValidationError::EmptyCollection("stages".into()));
        }

        let mut stage_ids = HashSet::new();
        for stage in &self.stages {
            if !stage_ids.insert(stage.id.as_str()) {
                return Err(ValidationError::DuplicateId {
                    collection: "stages".into(),
                    id: stage.id.clone(),
                });
            }
            if stage.activities.is_empty() {
                return Err(ValidationError::EmptyCollection(format!(
                    "activities of stage '{}'",
                    stage.id
                )));
            }
            let mut activity_ids = HashSet::new();
            for activity in &stage.activities {
                if !activity_ids.insert(activity.id.as_str()) {
                    return Err(ValidationError::DuplicateId {
                        collection: format!("activities of stage '{}'", stage.id),
                        id: activity.id.clone(),
                    });
                }
                if activity.time_minutes < 1 {
                    return Err(ValidationError::invalid(
                        "time_minutes",
                        format!("activity '{}' must be at least 1 minute", activity.id),
                    ));
                }
            }
        }
        Ok(())
    }
}
