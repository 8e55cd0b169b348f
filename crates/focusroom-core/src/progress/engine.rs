//! Progress engine.
//!
//! Turns completed focus sessions into persisted counters (streak, weekly
//! and lifetime focus time, session count) and per-achievement progress.
//! Every public mutation ends with one batched write of the whole progress
//! namespace, so readers never see a half-applied session.
//!
//! ## Session pipeline
//!
//! ```text
//! weekly reset check -> streak += 1 -> focus time += minutes
//!     -> goal milestones -> lifetime/time-of-day achievements -> persist
//! ```

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::achievement::{self, ratio_percent, Achievement, Criteria};
use super::week::WeekWindow;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::storage::{self, KeyValueStore};

pub const ACHIEVEMENTS_KEY: &str = "achievements";
pub const STREAK_KEY: &str = "streak";
pub const WEEKLY_FOCUS_TIME_KEY: &str = "weeklyFocusTime";
pub const TOTAL_FOCUS_TIME_KEY: &str = "totalFocusTime";
pub const TOTAL_SESSIONS_KEY: &str = "totalSessions";
pub const WEEK_WINDOW_KEY: &str = "weekWindow";
pub const WEEKLY_MILESTONE_KEY: &str = "weeklyMilestone";

/// 10 hours.
pub const DEFAULT_WEEKLY_FOCUS_GOAL: u32 = 600;

/// Percent-of-goal thresholds announced once per week.
pub const GOAL_MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// Counters owned by the progress engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    /// Incremented once per completed focus session.
    pub streak: u32,
    /// Minutes since the last weekly reset.
    pub weekly_focus_time: u32,
    /// Minutes; mirrored from settings, always > 0.
    pub weekly_focus_goal: u32,
    pub total_focus_time: u64,
    pub total_sessions: u64,
    /// Highest entry of [`GOAL_MILESTONES`] already announced this week.
    pub weekly_milestone: u8,
    #[serde(flatten)]
    pub window: WeekWindow,
}

impl ProgressState {
    fn fresh(weekly_focus_goal: u32, now: &DateTime<Local>) -> Self {
        Self {
            streak: 0,
            weekly_focus_time: 0,
            weekly_focus_goal: weekly_focus_goal.max(1),
            total_focus_time: 0,
            total_sessions: 0,
            weekly_milestone: 0,
            window: WeekWindow::containing(now),
        }
    }

    /// `min(100, weekly_focus_time / weekly_focus_goal * 100)`, floored.
    pub fn percent_of_goal(&self) -> u8 {
        ratio_percent(
            u64::from(self.weekly_focus_time),
            u64::from(self.weekly_focus_goal),
        )
    }
}

/// Progress view for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    #[serde(flatten)]
    pub state: ProgressState,
    pub percent_of_goal: u8,
    pub unlocked_achievements: usize,
    pub total_achievements: usize,
}

pub struct ProgressEngine {
    state: ProgressState,
    achievements: Vec<Achievement>,
}

impl ProgressEngine {
    /// Fresh engine with the full catalog locked.
    pub fn new(weekly_focus_goal: u32, now: DateTime<Local>) -> Self {
        Self {
            state: ProgressState::fresh(weekly_focus_goal, &now),
            achievements: achievement::catalog(),
        }
    }

    /// Restore counters and achievements from the store.
    ///
    /// Does not apply a pending weekly reset; callers run
    /// [`check_weekly_reset`](Self::check_weekly_reset) right after loading.
    pub fn load(store: &dyn KeyValueStore, weekly_focus_goal: u32, now: DateTime<Local>) -> Self {
        let fresh = ProgressState::fresh(weekly_focus_goal, &now);

        let achievements: Vec<Achievement> = storage::load_or_default(
            store,
            ACHIEVEMENTS_KEY,
            achievement::catalog,
            |a: &Vec<Achievement>| achievement::validate(a),
        );
        let state = ProgressState {
            streak: storage::load_or_default(store, STREAK_KEY, || 0, storage::any),
            weekly_focus_time: storage::load_or_default(
                store,
                WEEKLY_FOCUS_TIME_KEY,
                || 0,
                storage::any,
            ),
            total_focus_time: storage::load_or_default(
                store,
                TOTAL_FOCUS_TIME_KEY,
                || 0,
                storage::any,
            ),
            total_sessions: storage::load_or_default(store, TOTAL_SESSIONS_KEY, || 0, storage::any),
            weekly_milestone: storage::load_or_default(
                store,
                WEEKLY_MILESTONE_KEY,
                || 0,
                |m: &u8| {
                    if *m == 0 || GOAL_MILESTONES.contains(m) {
                        Ok(())
                    } else {
                        Err(format!("{m} is not a goal milestone"))
                    }
                },
            ),
            window: storage::load_or_default(
                store,
                WEEK_WINDOW_KEY,
                || fresh.window.clone(),
                WeekWindow::validate,
            ),
            ..fresh
        };

        Self {
            state,
            achievements: achievement::merge_catalog(achievements),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn next_reset_at(&self) -> DateTime<Local> {
        self.state.window.next_reset_at
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            state: self.state.clone(),
            percent_of_goal: self.state.percent_of_goal(),
            unlocked_achievements: self.achievements.iter().filter(|a| a.unlocked).count(),
            total_achievements: self.achievements.len(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply one completed focus session.
    ///
    /// Returns the events produced, in order: an optional `WeeklyReset`,
    /// then `WeeklyGoalMilestone`s, then `AchievementUnlocked`s.
    pub fn record_session(
        &mut self,
        store: &dyn KeyValueStore,
        duration_minutes: u32,
        timestamp: DateTime<Local>,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        // A crossed boundary resets the week before this session counts.
        events.extend(self.apply_weekly_reset(timestamp));

        let state = &mut self.state;
        state.streak = state.streak.saturating_add(1);
        state.weekly_focus_time = state.weekly_focus_time.saturating_add(duration_minutes);
        state.total_focus_time = state.total_focus_time.saturating_add(u64::from(duration_minutes));
        state.total_sessions = state.total_sessions.saturating_add(1);

        events.extend(self.announce_milestones(timestamp));
        events.extend(self.evaluate(Some((duration_minutes, timestamp)), timestamp));

        info!(
            duration_minutes,
            streak = self.state.streak,
            weekly_focus_time = self.state.weekly_focus_time,
            percent_of_goal = self.state.percent_of_goal(),
            "session recorded"
        );
        self.persist(store);
        events
    }

    /// Run the weekly reset if `now` has crossed the boundary.
    ///
    /// Idempotent within a week: the window advances past `now`, so a second
    /// call before the next boundary returns nothing and changes nothing.
    pub fn check_weekly_reset(&mut self, store: &dyn KeyValueStore, now: DateTime<Local>) -> Vec<Event> {
        let Some(reset) = self.apply_weekly_reset(now) else {
            return Vec::new();
        };
        // Goal milestone progress falls back with the weekly total.
        let mut events = vec![reset];
        events.extend(self.evaluate(None, now));
        self.persist(store);
        events
    }

    /// Change the weekly goal and re-evaluate the goal milestones against it.
    pub fn set_weekly_goal(
        &mut self,
        store: &dyn KeyValueStore,
        weekly_focus_goal: u32,
        now: DateTime<Local>,
    ) -> Vec<Event> {
        let goal = weekly_focus_goal.max(1);
        if goal == self.state.weekly_focus_goal {
            return Vec::new();
        }
        debug!(from = self.state.weekly_focus_goal, to = goal, "weekly goal changed");
        self.state.weekly_focus_goal = goal;

        let mut events = self.announce_milestones(now);
        events.extend(self.evaluate(None, now));
        self.persist(store);
        events
    }

    /// Unlock an event-driven achievement. No-op if already unlocked.
    ///
    /// # Errors
    /// `CoreError::UnknownAchievement` if `id` is not in the set.
    pub fn unlock_achievement(
        &mut self,
        store: &dyn KeyValueStore,
        id: &str,
        now: DateTime<Local>,
    ) -> Result<Option<Event>> {
        let achievement = self
            .achievements
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| CoreError::UnknownAchievement(id.to_string()))?;

        if !achievement.unlock() {
            return Ok(None);
        }
        let event = unlocked_event(achievement, now);
        self.persist(store);
        Ok(Some(event))
    }

    /// Set an achievement's progress, clamped to `0..=100`.
    ///
    /// Reaching 100 unlocks it. Progress of an unlocked achievement is never
    /// lowered; a smaller value for a locked one is taken as is.
    ///
    /// # Errors
    /// `CoreError::UnknownAchievement` if `id` is not in the set.
    pub fn update_progress(
        &mut self,
        store: &dyn KeyValueStore,
        id: &str,
        progress: i64,
        now: DateTime<Local>,
    ) -> Result<Option<Event>> {
        let achievement = self
            .achievements
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| CoreError::UnknownAchievement(id.to_string()))?;

        let clamped = progress.clamp(0, 100) as u8;
        if achievement.unlocked || achievement.progress == clamped {
            return Ok(None);
        }
        let event = achievement
            .set_progress(clamped)
            .then(|| unlocked_event(achievement, now));
        self.persist(store);
        Ok(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply_weekly_reset(&mut self, now: DateTime<Local>) -> Option<Event> {
        if now < self.state.window.last_reset_at {
            // Clock moved backwards; wait for it to catch up.
            warn!(%now, last_reset_at = %self.state.window.last_reset_at, "clock is behind the current week");
            return None;
        }
        let weeks_elapsed = self.state.window.advance_to(&now);
        if weeks_elapsed == 0 {
            return None;
        }

        let cleared = self.state.weekly_focus_time;
        self.state.weekly_focus_time = 0;
        self.state.weekly_milestone = 0;
        info!(
            weeks_elapsed,
            cleared_minutes = cleared,
            next_reset_at = %self.state.window.next_reset_at,
            "weekly focus time reset"
        );
        Some(Event::WeeklyReset {
            weeks_elapsed,
            next_reset_at: self.state.window.next_reset_at,
            at: now,
        })
    }

    /// One event per goal threshold newly reached this week.
    fn announce_milestones(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let percent = self.state.percent_of_goal();
        let mut events = Vec::new();
        for threshold in GOAL_MILESTONES {
            if percent >= threshold && threshold > self.state.weekly_milestone {
                self.state.weekly_milestone = threshold;
                events.push(Event::WeeklyGoalMilestone {
                    percent: threshold,
                    weekly_focus_time: self.state.weekly_focus_time,
                    weekly_focus_goal: self.state.weekly_focus_goal,
                    at: now,
                });
            }
        }
        events
    }

    /// Re-derive progress for every criterion-driven achievement.
    ///
    /// `session` carries the just-recorded session's minutes and timestamp;
    /// per-session criteria are skipped without one.
    fn evaluate(&mut self, session: Option<(u32, DateTime<Local>)>, now: DateTime<Local>) -> Vec<Event> {
        let percent = self.state.percent_of_goal();
        let total_sessions = self.state.total_sessions;
        let total_focus = self.state.total_focus_time;
        let streak = u64::from(self.state.streak);

        let mut events = Vec::new();
        for a in &mut self.achievements {
            let progress = match a.criteria {
                Criteria::SessionsCount(n) => Some(ratio_percent(total_sessions, u64::from(n))),
                Criteria::FocusMinutes(n) => Some(ratio_percent(total_focus, u64::from(n))),
                Criteria::StreakDays(n) => Some(ratio_percent(streak, u64::from(n))),
                Criteria::WeeklyGoalPercent(t) => {
                    Some(ratio_percent(u64::from(percent), u64::from(t)))
                }
                Criteria::SessionMinutes(n) => session.map(|(minutes, _)| {
                    ratio_percent(u64::from(minutes), u64::from(n)).max(a.progress)
                }),
                Criteria::TimeOfDay(part) => session
                    .filter(|(_, at)| part.contains_hour(at.hour()))
                    .map(|_| 100),
                Criteria::Flag => None,
            };

            if let Some(progress) = progress {
                if a.set_progress(progress) {
                    events.push(unlocked_event(a, now));
                }
            }
        }
        events
    }

    fn persist(&self, store: &dyn KeyValueStore) {
        let s = &self.state;
        let entries = [
            storage::to_entry(ACHIEVEMENTS_KEY, &self.achievements),
            storage::to_entry(STREAK_KEY, &s.streak),
            storage::to_entry(WEEKLY_FOCUS_TIME_KEY, &s.weekly_focus_time),
            storage::to_entry(TOTAL_FOCUS_TIME_KEY, &s.total_focus_time),
            storage::to_entry(TOTAL_SESSIONS_KEY, &s.total_sessions),
            storage::to_entry(WEEKLY_MILESTONE_KEY, &s.weekly_milestone),
            storage::to_entry(WEEK_WINDOW_KEY, &s.window),
        ];
        match entries.into_iter().collect::<std::result::Result<Vec<_>, _>>() {
            Ok(entries) => storage::save_batch(store, &entries),
            Err(e) => warn!(error = %e, "failed to serialize progress state"),
        }
    }
}

fn unlocked_event(achievement: &Achievement, now: DateTime<Local>) -> Event {
    info!(id = %achievement.id, name = %achievement.name, "achievement unlocked");
    Event::AchievementUnlocked {
        id: achievement.id.clone(),
        name: achievement.name.clone(),
        at: now,
    }
}
