//! Facilitator walkthrough over a bound scenario.
//!
//! The walkthrough owns a cursor into the stage/activity tree and a
//! [`Countdown`] bound to the selected activity. Every cursor change stops
//! the countdown and reloads it with the new activity's duration. Reaching
//! the end is not an error: `next()` at the last activity reports
//! `ScenarioCompleted` and leaves the cursor where it is.
//!
//! ## Usage
//!
//! ```ignore
//! let mut walk = Walkthrough::new(scenario)?;
//! walk.start_timer();
//! walk.next();        // stops and reloads the countdown
//! walk.previous();
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use super::countdown::{Countdown, TimerState};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::scenario::{Activity, Scenario, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub stage_index: usize,
    pub activity_index: usize,
}

impl Cursor {
    pub fn new(stage_index: usize, activity_index: usize) -> Self {
        Self {
            stage_index,
            activity_index,
        }
    }
}

pub struct Walkthrough {
    scenario: Scenario,
    cursor: Cursor,
    countdown: Countdown,
}

/// Every stage needs at least one activity for the cursor to stay valid.
fn check_navigable(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.stages.is_empty() {
        return Err(ValidationError::EmptyCollection("stages".into()));
    }
    if let Some(stage) = scenario.stages.iter().find(|s| s.activities.is_empty()) {
        return Err(ValidationError::EmptyCollection(format!(
            "activities of stage '{}'",
            stage.id
        )));
    }
    Ok(())
}

impl Walkthrough {
    /// Bind `scenario` with the cursor on its first activity and the
    /// countdown stopped.
    ///
    /// # Errors
    /// Returns a validation error if the scenario has no stages or a stage
    /// has no activities.
    pub fn new(scenario: Scenario) -> Result<Self> {
        check_navigable(&scenario)?;
        let duration = scenario.stages[0].activities[0].duration_secs();
        Ok(Self {
            scenario,
            cursor: Cursor::default(),
            countdown: Countdown::new(duration),
        })
    }

    /// Replace the bound scenario and return to the first activity.
    pub fn bind(&mut self, scenario: Scenario) -> Result<Event> {
        check_navigable(&scenario)?;
        self.scenario = scenario;
        Ok(self.move_to(Cursor::default()))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn into_scenario(self) -> Scenario {
        self.scenario
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_stage(&self) -> &Stage {
        &self.scenario.stages[self.cursor.stage_index]
    }

    pub fn current_activity(&self) -> &Activity {
        &self.current_stage().activities[self.cursor.activity_index]
    }

    pub fn timer_state(&self) -> TimerState {
        self.countdown.state()
    }

    /// Receive the countdown's tick and expiry events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.countdown.subscribe()
    }

    pub fn is_at_start(&self) -> bool {
        self.cursor == Cursor::default()
    }

    pub fn is_at_end(&self) -> bool {
        let last_stage = self.scenario.stages.len() - 1;
        self.cursor.stage_index == last_stage
            && self.cursor.activity_index + 1 == self.scenario.stages[last_stage].activities.len()
    }

    /// 0.0 .. 100.0 progress across the whole scenario, by activity minutes.
    pub fn progress_pct(&self) -> f64 {
        let total: u64 = self
            .scenario
            .stages
            .iter()
            .flat_map(|s| &s.activities)
            .map(|a| a.duration_secs())
            .sum();
        if total == 0 {
            return 0.0;
        }

        let mut done: u64 = self.scenario.stages[..self.cursor.stage_index]
            .iter()
            .flat_map(|s| &s.activities)
            .map(|a| a.duration_secs())
            .sum();
        done += self.current_stage().activities[..self.cursor.activity_index]
            .iter()
            .map(|a| a.duration_secs())
            .sum::<u64>();
        let timer = self.countdown.state();
        done += self.countdown.duration_secs().saturating_sub(timer.remaining_secs);

        (done as f64 / total as f64 * 100.0).min(100.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let activity = self.current_activity();
        Event::StateSnapshot {
            cursor: self.cursor,
            stage_title: self.current_stage().title.clone(),
            activity_id: activity.id.clone(),
            activity_title: activity.title.clone(),
            timer: self.countdown.state(),
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Jump to any activity.
    ///
    /// # Errors
    /// Returns [`ValidationError::OutOfBounds`] if either index is out of range.
    pub fn select_activity(&mut self, stage_index: usize, activity_index: usize) -> Result<Event> {
        let stage_count = self.scenario.stages.len();
        let stage = self
            .scenario
            .stages
            .get(stage_index)
            .ok_or_else(|| ValidationError::out_of_bounds("stages", stage_index, stage_count))?;
        if activity_index >= stage.activities.len() {
            return Err(ValidationError::out_of_bounds(
                "activities",
                activity_index,
                stage.activities.len(),
            )
            .into());
        }
        Ok(self.move_to(Cursor::new(stage_index, activity_index)))
    }

    /// Advance to the next activity, crossing into the next stage when needed.
    ///
    /// At the very end the cursor stays put, the countdown is stopped and
    /// reloaded, and `ScenarioCompleted` is returned.
    pub fn next(&mut self) -> Event {
        let Cursor {
            stage_index,
            activity_index,
        } = self.cursor;

        if activity_index + 1 < self.current_stage().activities.len() {
            self.move_to(Cursor::new(stage_index, activity_index + 1))
        } else if stage_index + 1 < self.scenario.stages.len() {
            self.move_to(Cursor::new(stage_index + 1, 0))
        } else {
            self.countdown.reset();
            debug!("scenario complete");
            Event::ScenarioCompleted { at: Utc::now() }
        }
    }

    /// Go back one activity, into the previous stage's last activity when
    /// needed. Returns `None` at the first activity; the cursor stays and the
    /// countdown is stopped and reloaded, as with every other navigation.
    pub fn previous(&mut self) -> Option<Event> {
        let Cursor {
            stage_index,
            activity_index,
        } = self.cursor;

        if activity_index > 0 {
            Some(self.move_to(Cursor::new(stage_index, activity_index - 1)))
        } else if stage_index > 0 {
            let last = self.scenario.stages[stage_index - 1].activities.len() - 1;
            Some(self.move_to(Cursor::new(stage_index - 1, last)))
        } else {
            self.countdown.reset();
            None
        }
    }

    // ── Editing ──────────────────────────────────────────────────────

    /// Change one activity's minutes and re-sync its stage total.
    ///
    /// The countdown is reloaded only when the edited activity is the
    /// current one.
    pub fn set_activity_time(
        &mut self,
        stage_index: usize,
        activity_index: usize,
        minutes: u32,
    ) -> Result<Event> {
        self.scenario
            .set_activity_time(stage_index, activity_index, minutes)?;
        if self.cursor == Cursor::new(stage_index, activity_index) {
            let duration = self.current_activity().duration_secs();
            self.countdown.rebind(duration);
        }
        Ok(Event::ActivityTimeChanged {
            stage_index,
            activity_index,
            time_minutes: minutes,
            stage_total: self.scenario.stages[stage_index].total_time,
            at: Utc::now(),
        })
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn start_timer(&mut self) -> Option<Event> {
        self.countdown.start()
    }

    pub fn pause_timer(&mut self) -> Option<Event> {
        self.countdown.pause()
    }

    pub fn reset_timer(&mut self) -> Event {
        self.countdown.reset()
    }

    /// Advance the countdown by one second. Ignored while a runtime drives it.
    pub fn tick(&self) -> Option<Event> {
        self.countdown.tick()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn move_to(&mut self, cursor: Cursor) -> Event {
        self.cursor = cursor;
        let activity = self.current_activity();
        let duration_secs = activity.duration_secs();
        let activity_id = activity.id.clone();
        self.countdown.rebind(duration_secs);
        debug!(
            stage = cursor.stage_index,
            activity = cursor.activity_index,
            %activity_id,
            "cursor moved"
        );
        Event::ActivitySelected {
            stage_index: cursor.stage_index,
            activity_index: cursor.activity_index,
            activity_id,
            duration_secs,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::generate_standard;

    fn walkthrough() -> Walkthrough {
        Walkthrough::new(generate_standard("Phones at school", 60, 4).unwrap()).unwrap()
    }

    #[test]
    fn binds_at_first_activity_stopped() {
        let walk = walkthrough();
        assert_eq!(walk.cursor(), Cursor::new(0, 0));
        assert_eq!(walk.current_activity().id, "1-1");
        let timer = walk.timer_state();
        assert_eq!(timer.remaining_secs, 4 * 60);
        assert!(!timer.running);
        assert!(!timer.expired);
    }

    #[test]
    fn next_crosses_stage_boundary() {
        let mut walk = walkthrough();
        for _ in 0..3 {
            walk.next();
        }
        assert_eq!(walk.current_activity().id, "1-4");
        match walk.next() {
            Event::ActivitySelected {
                stage_index,
                activity_index,
                activity_id,
                duration_secs,
                ..
            } => {
                assert_eq!((stage_index, activity_index), (1, 0));
                assert_eq!(activity_id, "2-1");
                assert_eq!(duration_secs, 6 * 60);
            }
            other => panic!("expected ActivitySelected, got {other:?}"),
        }
    }

    #[test]
    fn next_at_end_signals_completion_without_moving() {
        let mut walk = walkthrough();
        walk.select_activity(2, 1).unwrap();
        assert!(walk.is_at_end());
        walk.start_timer();
        walk.tick();

        assert!(matches!(walk.next(), Event::ScenarioCompleted { .. }));
        assert_eq!(walk.cursor(), Cursor::new(2, 1));
        let timer = walk.timer_state();
        assert!(!timer.running);
        assert_eq!(timer.remaining_secs, 5 * 60);
    }

    #[test]
    fn previous_moves_to_last_activity_of_previous_stage() {
        let mut walk = walkthrough();
        walk.select_activity(1, 0).unwrap();
        walk.previous().unwrap();
        assert_eq!(walk.cursor(), Cursor::new(0, 3));
        assert_eq!(walk.timer_state().remaining_secs, 5 * 60);
    }

    #[test]
    fn previous_at_start_keeps_cursor_and_stops_timer() {
        let mut walk = walkthrough();
        walk.start_timer();
        walk.tick();
        assert!(walk.previous().is_none());
        assert_eq!(walk.cursor(), Cursor::new(0, 0));
        let timer = walk.timer_state();
        assert!(!timer.running);
        assert!(!timer.expired);
        assert_eq!(timer.remaining_secs, 4 * 60);
    }

    #[test]
    fn navigation_round_trip() {
        let mut walk = walkthrough();
        let n = walk.scenario().activity_count() - 1;
        for _ in 0..n {
            walk.next();
        }
        assert!(walk.is_at_end());
        for _ in 0..n {
            assert!(walk.previous().is_some());
        }
        assert!(walk.is_at_start());
    }

    #[test]
    fn select_activity_validates_and_resets_timer() {
        let mut walk = walkthrough();
        walk.start_timer();
        walk.tick();
        assert!(walk.select_activity(3, 0).is_err());
        assert!(walk.select_activity(2, 2).is_err());
        assert!(walk.timer_state().running, "failed jump leaves the timer alone");

        walk.select_activity(1, 2).unwrap();
        let timer = walk.timer_state();
        assert_eq!(walk.current_activity().id, "2-3");
        assert_eq!(timer.remaining_secs, 9 * 60);
        assert!(!timer.running);
    }

    #[test]
    fn editing_current_activity_reloads_timer() {
        let mut walk = walkthrough();
        walk.start_timer();
        walk.tick();
        walk.set_activity_time(0, 0, 7).unwrap();
        let timer = walk.timer_state();
        assert_eq!(timer.remaining_secs, 7 * 60);
        assert!(!timer.running);
        assert_eq!(walk.scenario().stages[0].total_time, 7 + 4 + 5 + 5);
    }

    #[test]
    fn editing_other_activity_leaves_timer_alone() {
        let mut walk = walkthrough();
        walk.start_timer();
        walk.tick();
        match walk.set_activity_time(1, 1, 10).unwrap() {
            Event::ActivityTimeChanged { stage_total, .. } => assert_eq!(stage_total, 6 + 10 + 9 + 6 + 6),
            other => panic!("unexpected {other:?}"),
        }
        let timer = walk.timer_state();
        assert!(timer.running);
        assert_eq!(timer.remaining_secs, 4 * 60 - 1);
    }

    #[test]
    fn progress_tracks_cursor_and_timer() {
        let mut walk = walkthrough();
        assert_eq!(walk.progress_pct(), 0.0);
        walk.select_activity(2, 1).unwrap();
        let before_last = walk.progress_pct();
        assert!(before_last > 90.0 && before_last < 100.0);
    }

    #[test]
    fn rejects_scenario_with_empty_stage() {
        let mut scenario = generate_standard("t", 60, 4).unwrap();
        scenario.stages[1].activities.clear();
        assert!(Walkthrough::new(scenario).is_err());

        let mut walk = walkthrough();
        let mut empty = generate_standard("t", 60, 4).unwrap();
        empty.stages.clear();
        assert!(walk.bind(empty).is_err());
        assert_eq!(walk.scenario().stages.len(), 3);
    }

    #[test]
    fn bind_resets_cursor() {
        let mut walk = walkthrough();
        walk.select_activity(1, 3).unwrap();
        walk.bind(generate_standard("other", 30, 2).unwrap()).unwrap();
        assert_eq!(walk.cursor(), Cursor::new(0, 0));
        assert_eq!(walk.scenario().title, "other");
    }
}
