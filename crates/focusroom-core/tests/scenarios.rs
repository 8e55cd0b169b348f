//! End-to-end behaviour of the timer and progress engines.

use chrono::{DateTime, Duration, Local, TimeZone};
use focusroom_core::progress::GOAL_MILESTONES;
use focusroom_core::{
    CoreError, Event, KeyValueStore, MemoryStore, ProgressEngine, TimerMachine, TimerMode,
};

fn at(day: u32, hour: u32) -> DateTime<Local> {
    // October 2026: the 11th and 18th are Sundays.
    Local.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
}

fn weekly_unlocked(engine: &ProgressEngine) -> Vec<u8> {
    GOAL_MILESTONES
        .into_iter()
        .filter(|p| {
            engine
                .achievement(&format!("weekly_goal_{p}"))
                .is_some_and(|a| a.unlocked)
        })
        .collect()
}

fn unlocked_ids(events: &[Event]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::AchievementUnlocked { id, .. } => Some(id.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn quarter_of_goal_unlocks_first_milestone_only() {
    let store = MemoryStore::new();
    let mut engine = ProgressEngine::new(240, at(13, 9));

    engine.record_session(&store, 60, at(13, 10));

    assert_eq!(engine.state().weekly_focus_time, 60);
    assert_eq!(engine.state().percent_of_goal(), 25);
    assert_eq!(weekly_unlocked(&engine), vec![25]);
}

#[test]
fn three_quarters_of_goal_unlocks_three_milestones() {
    let store = MemoryStore::new();
    let mut engine = ProgressEngine::new(240, at(13, 9));
    engine.record_session(&store, 60, at(13, 10));

    let events = engine.record_session(&store, 120, at(13, 14));

    assert_eq!(engine.state().weekly_focus_time, 180);
    assert_eq!(engine.state().percent_of_goal(), 75);
    assert_eq!(weekly_unlocked(&engine), vec![25, 50, 75]);
    assert_eq!(engine.achievement("weekly_goal_100").unwrap().progress, 75);
    assert!(unlocked_ids(&events).contains(&"weekly_goal_75"));
}

#[test]
fn late_long_session_unlocks_deep_work_and_night_owl_together() {
    let store = MemoryStore::new();
    let mut engine = ProgressEngine::new(600, at(13, 9));

    let events = engine.record_session(&store, 90, at(13, 23));

    let ids = unlocked_ids(&events);
    assert!(ids.contains(&"deep_work"));
    assert!(ids.contains(&"night_owl"));
    assert!(!ids.contains(&"early_bird"));
}

#[test]
fn countdown_completes_exactly_once() {
    let store = MemoryStore::new();
    let mut timer = TimerMachine::new(1500);
    timer.start(at(13, 9));

    let completions: Vec<Event> = (0..1500)
        .filter_map(|_| timer.tick(&store, at(13, 9)))
        .collect();
    assert_eq!(completions.len(), 1);
    assert!(matches!(
        completions[0],
        Event::SessionCompleted { duration_minutes: 25, .. }
    ));
    assert_eq!(timer.mode(), TimerMode::Idle);

    // Re-entrant ticks after completion are ignored.
    assert!((0..1500).all(|_| timer.tick(&store, at(13, 9)).is_none()));
    assert_eq!(timer.completed_sessions(), 1);
    assert_eq!(timer.history().len(), 1);
}

#[test]
fn negative_duration_is_rejected_without_changes() {
    let store = MemoryStore::new();
    let mut timer = TimerMachine::new(1500);
    timer.start(at(13, 9));
    timer.tick(&store, at(13, 9));
    let before = timer.snapshot();

    let err = timer.set_duration(&store, -5, at(13, 9)).unwrap_err();

    assert!(matches!(err, CoreError::InvalidDuration { seconds: -5 }));
    assert_eq!(timer.snapshot(), before);
    assert!(store.get_raw("duration").unwrap().is_none());
}

#[test]
fn each_completion_appends_history_once() {
    let store = MemoryStore::new();
    let mut timer = TimerMachine::new(60);
    for n in 1..=3 {
        timer.start(at(13, 9));
        while timer.is_running() {
            timer.tick(&store, at(13, 9));
        }
        assert_eq!(timer.completed_sessions(), n);
        assert_eq!(timer.history().len() as u64, n);
    }

    let restored = TimerMachine::load(&store);
    assert_eq!(restored.completed_sessions(), 3);
    assert_eq!(restored.history(), timer.history());
}

#[test]
fn weekly_reset_runs_once_per_boundary() {
    let store = MemoryStore::new();
    let mut engine = ProgressEngine::new(600, at(13, 9));
    engine.record_session(&store, 45, at(13, 10));

    let sunday = at(18, 0) + Duration::minutes(5);
    assert_eq!(engine.check_weekly_reset(&store, sunday).len(), 1);
    engine.record_session(&store, 25, sunday);
    assert!(engine.check_weekly_reset(&store, sunday + Duration::hours(1)).is_empty());

    assert_eq!(engine.state().weekly_focus_time, 25);
    assert_eq!(engine.state().total_focus_time, 70);
    assert_eq!(engine.next_reset_at(), at(25, 0));
}

#[test]
fn returning_user_sees_reset_on_load() {
    let store = MemoryStore::new();
    let mut engine = ProgressEngine::new(600, at(13, 9));
    engine.record_session(&store, 120, at(13, 10));

    // Closed for a month.
    let later = at(13, 10) + Duration::days(31);
    let mut reopened = ProgressEngine::load(&store, 600, later);
    assert_eq!(reopened.state().weekly_focus_time, 120);
    let events = reopened.check_weekly_reset(&store, later);

    assert!(matches!(events[0], Event::WeeklyReset { weeks_elapsed: 4, .. }));
    assert_eq!(reopened.state().weekly_focus_time, 0);
    assert_eq!(reopened.state().total_focus_time, 120);
    assert_eq!(ProgressEngine::load(&store, 600, later).state().weekly_focus_time, 0);
}
