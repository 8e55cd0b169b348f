use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::notify::Notification;
use crate::timer::SessionType;

/// Every state change in the engine produces an Event.
/// Subscribers receive them synchronously; the UI re-reads a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Event {
    TimerStarted {
        session_type: SessionType,
        duration_secs: u32,
        remaining_secs: u32,
        at: DateTime<Local>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Local>,
    },
    TimerReset {
        duration_secs: u32,
        at: DateTime<Local>,
    },
    DurationChanged {
        duration_secs: u32,
        at: DateTime<Local>,
    },
    /// A countdown reached zero. Fired exactly once per countdown.
    SessionCompleted {
        session_type: SessionType,
        duration_minutes: u32,
        at: DateTime<Local>,
    },
    /// An achievement went from locked to unlocked.
    AchievementUnlocked {
        id: String,
        name: String,
        at: DateTime<Local>,
    },
    /// Weekly focus time crossed a goal threshold for the first time this week.
    WeeklyGoalMilestone {
        percent: u8,
        weekly_focus_time: u32,
        weekly_focus_goal: u32,
        at: DateTime<Local>,
    },
    WeeklyReset {
        weeks_elapsed: u32,
        next_reset_at: DateTime<Local>,
        at: DateTime<Local>,
    },
}

impl Event {
    /// The user-visible notification this event asks for, if any.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Event::AchievementUnlocked { name, .. } => Some(Notification {
                title: "Achievement unlocked".into(),
                message: name.clone(),
            }),
            Event::WeeklyGoalMilestone {
                percent,
                weekly_focus_time,
                weekly_focus_goal,
                ..
            } => Some(Notification {
                title: "Weekly goal".into(),
                message: format!(
                    "{percent}% of your weekly goal reached ({weekly_focus_time}/{weekly_focus_goal} min)"
                ),
            }),
            _ => None,
        }
    }

    /// The sound this event asks for, if any.
    pub fn sound(&self) -> Option<&'static str> {
        match self {
            Event::SessionCompleted { .. } => Some("session-complete"),
            Event::AchievementUnlocked { .. } => Some("achievement"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let at = Local::now();
        let event = Event::SessionCompleted {
            session_type: SessionType::Focus,
            duration_minutes: 25,
            at,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SessionCompleted");
        assert_eq!(json["durationMinutes"], 25);
        assert_eq!(json["sessionType"], "focus");
        assert!(json.get("duration_minutes").is_none());
    }

    #[test]
    fn only_unlocks_and_milestones_notify() {
        let at = Local::now();
        let unlocked = Event::AchievementUnlocked {
            id: "night_owl".into(),
            name: "Night Owl".into(),
            at,
        };
        assert_eq!(unlocked.notification().unwrap().message, "Night Owl");

        let milestone = Event::WeeklyGoalMilestone {
            percent: 50,
            weekly_focus_time: 120,
            weekly_focus_goal: 240,
            at,
        };
        assert!(milestone.notification().unwrap().message.starts_with("50%"));

        assert!(Event::TimerPaused { remaining_secs: 3, at }.notification().is_none());
    }
}
