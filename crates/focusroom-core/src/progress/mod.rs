mod achievement;
mod engine;
mod week;

pub use achievement::{catalog, Achievement, Criteria, DayPart};
pub use engine::{
    ProgressEngine, ProgressSnapshot, ProgressState, ACHIEVEMENTS_KEY, DEFAULT_WEEKLY_FOCUS_GOAL,
    GOAL_MILESTONES, STREAK_KEY, TOTAL_FOCUS_TIME_KEY, TOTAL_SESSIONS_KEY, WEEKLY_FOCUS_TIME_KEY,
    WEEKLY_MILESTONE_KEY, WEEK_WINDOW_KEY,
};
pub use week::{next_week_start, week_start, WeekWindow};
