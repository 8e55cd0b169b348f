//! Achievement records and the built-in catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Part of the day a time-of-day achievement asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPart {
    /// 22:00 and later.
    Night,
    /// Before 06:00.
    Early,
}

impl DayPart {
    pub fn contains_hour(self, hour: u32) -> bool {
        match self {
            DayPart::Night => hour >= 22,
            DayPart::Early => hour < 6,
        }
    }
}

/// What drives an achievement's progress. Exactly one kind per achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criteria {
    /// Lifetime completed focus sessions.
    SessionsCount(u32),
    /// Lifetime focus minutes.
    FocusMinutes(u32),
    /// Streak counter value.
    StreakDays(u32),
    /// Percent of the weekly focus goal reached this week.
    WeeklyGoalPercent(u8),
    /// A single session at least this many minutes long.
    SessionMinutes(u32),
    /// A session completed in the given part of the day.
    TimeOfDay(DayPart),
    /// Unlocked directly by an app event.
    Flag,
}

/// A named milestone with integer progress (0..=100).
///
/// `unlocked` implies `progress == 100`, and an unlocked achievement never
/// goes back to locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub progress: u8,
    pub unlocked: bool,
    pub criteria: Criteria,
}

impl Achievement {
    fn new(id: &str, name: &str, description: &str, criteria: Criteria) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            progress: 0,
            unlocked: false,
            criteria,
        }
    }

    /// Set progress, unlocking at 100. Returns true on the locked -> unlocked
    /// transition. Unlocked achievements are frozen.
    pub(crate) fn set_progress(&mut self, progress: u8) -> bool {
        if self.unlocked {
            return false;
        }
        self.progress = progress.min(100);
        if self.progress == 100 {
            self.unlocked = true;
            return true;
        }
        false
    }

    /// Returns true on the locked -> unlocked transition.
    pub(crate) fn unlock(&mut self) -> bool {
        self.set_progress(100)
    }
}

/// `value / target` as an integer percentage capped at 100.
pub(crate) fn ratio_percent(value: u64, target: u64) -> u8 {
    if target == 0 {
        return 100;
    }
    (value.saturating_mul(100) / target).min(100) as u8
}

/// The built-in achievement set, seeded on first run.
pub fn catalog() -> Vec<Achievement> {
    use Criteria::*;
    vec![
        Achievement::new(
            "first_session",
            "First Session",
            "Complete your first focus session.",
            SessionsCount(1),
        ),
        Achievement::new(
            "weekly_goal_25",
            "Quarter Way",
            "Reach 25% of your weekly focus goal.",
            WeeklyGoalPercent(25),
        ),
        Achievement::new(
            "weekly_goal_50",
            "Halfway There",
            "Reach 50% of your weekly focus goal.",
            WeeklyGoalPercent(50),
        ),
        Achievement::new(
            "weekly_goal_75",
            "Almost There",
            "Reach 75% of your weekly focus goal.",
            WeeklyGoalPercent(75),
        ),
        Achievement::new(
            "weekly_goal_100",
            "Goal Master",
            "Reach 100% of your weekly focus goal.",
            WeeklyGoalPercent(100),
        ),
        Achievement::new(
            "five_sessions",
            "Five Sessions",
            "Complete 5 focus sessions.",
            SessionsCount(5),
        ),
        Achievement::new(
            "ten_sessions",
            "Ten Sessions",
            "Complete 10 focus sessions.",
            SessionsCount(10),
        ),
        Achievement::new(
            "fifty_sessions",
            "Power User",
            "Complete 50 focus sessions.",
            SessionsCount(50),
        ),
        Achievement::new(
            "streak_3",
            "On a Roll",
            "Reach a streak of 3.",
            StreakDays(3),
        ),
        Achievement::new(
            "streak_7",
            "Consistent",
            "Reach a streak of 7.",
            StreakDays(7),
        ),
        Achievement::new(
            "focus_10h",
            "Ten Hours",
            "Reach a total of 10 hours of focused time.",
            FocusMinutes(10 * 60),
        ),
        Achievement::new(
            "focus_25h",
            "Twenty-Five Hours",
            "Reach a total of 25 hours of focused time.",
            FocusMinutes(25 * 60),
        ),
        Achievement::new(
            "focus_50h",
            "Fifty Hours",
            "Reach a total of 50 hours of focused time.",
            FocusMinutes(50 * 60),
        ),
        Achievement::new(
            "deep_work",
            "Deep Work",
            "Complete a single focus session of at least 90 minutes.",
            SessionMinutes(90),
        ),
        Achievement::new(
            "night_owl",
            "Night Owl",
            "Complete a focus session after 10 PM.",
            TimeOfDay(DayPart::Night),
        ),
        Achievement::new(
            "early_bird",
            "Early Bird",
            "Complete a focus session before 6 AM.",
            TimeOfDay(DayPart::Early),
        ),
        Achievement::new(
            "take_a_break",
            "Taking a Break",
            "Finish a break countdown instead of skipping it.",
            Flag,
        ),
    ]
}

/// Append catalog entries missing from a persisted set. Persisted entries
/// are kept as they are, in their stored order.
pub(crate) fn merge_catalog(mut persisted: Vec<Achievement>) -> Vec<Achievement> {
    let known: HashSet<String> = persisted.iter().map(|a| a.id.clone()).collect();
    persisted.extend(catalog().into_iter().filter(|a| !known.contains(&a.id)));
    persisted
}

/// Schema check for a persisted achievement set.
pub(crate) fn validate(achievements: &[Achievement]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for a in achievements {
        if !seen.insert(a.id.as_str()) {
            return Err(format!("duplicate achievement id '{}'", a.id));
        }
        if a.progress > 100 {
            return Err(format!("progress {} out of range for '{}'", a.progress, a.id));
        }
        if a.unlocked && a.progress != 100 {
            return Err(format!("'{}' is unlocked below 100%", a.id));
        }
    }
    Ok(())
}
