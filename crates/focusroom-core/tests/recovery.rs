//! Persistence across restarts and recovery from bad stored state.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use focusroom_core::progress::{STREAK_KEY, WEEKLY_FOCUS_TIME_KEY};
use focusroom_core::settings::SETTINGS_KEY;
use focusroom_core::timer::{DURATION_KEY, SESSION_HISTORY_KEY};
use focusroom_core::{
    FocusApp, KeyValueStore, LogNotifier, ManualClock, SettingsPatch, SqliteStore, StorageError,
};
use tempfile::TempDir;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Local.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap(),
    ))
}

fn open(dir: &TempDir, clock: &Arc<ManualClock>) -> FocusApp {
    let store = SqliteStore::open_at(dir.path().join("focusroom.db")).unwrap();
    FocusApp::load(Box::new(store), clock.clone(), Box::new(LogNotifier))
}

fn complete(app: &mut FocusApp) {
    app.start();
    while app.is_running() {
        app.tick();
    }
}

#[test]
fn state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let clock = clock();

    let before = {
        let mut app = open(&dir, &clock);
        app.set_duration(45 * 60).unwrap();
        app.update_settings(SettingsPatch {
            weekly_focus_goal: Some(90),
            ..Default::default()
        })
        .unwrap();
        complete(&mut app);
        app.snapshot()
    };

    // A restored timer is idle with a full countdown.
    let after = open(&dir, &clock).snapshot();
    assert_eq!(after.progress, before.progress);
    assert_eq!(after.achievements, before.achievements);
    assert_eq!(after.settings, before.settings);
    assert_eq!(after.timer.session_history, before.timer.session_history);
    assert_eq!(after.timer.remaining_seconds, after.timer.duration_seconds);
    assert_eq!(after.timer.duration_seconds, 45 * 60);
    assert_eq!(after.progress.percent_of_goal, 50);
    assert!(after
        .achievements
        .iter()
        .any(|a| a.id == "weekly_goal_50" && a.unlocked));
}

#[test]
fn corrupt_values_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("focusroom.db");
    {
        let store = SqliteStore::open_at(&path).unwrap();
        store.put_raw(DURATION_KEY, "-30").unwrap();
        store.put_raw(SESSION_HISTORY_KEY, "[{\"type\":\"nap\"}]").unwrap();
        store.put_raw(STREAK_KEY, "6").unwrap();
        store.put_raw(SETTINGS_KEY, "not json").unwrap();
    }

    let app = open(&dir, &clock());
    let snap = app.snapshot();
    assert_eq!(snap.timer.duration_seconds, 1500);
    assert!(snap.timer.session_history.is_empty());
    assert_eq!(snap.progress.state.streak, 6);
    assert_eq!(snap.settings.weekly_focus_goal, 600);

    // Corrupt keys were rewritten with their defaults.
    let store = SqliteStore::open_at(&path).unwrap();
    assert_eq!(store.get_raw(DURATION_KEY).unwrap().as_deref(), Some("1500"));
    assert_eq!(store.get_raw(SESSION_HISTORY_KEY).unwrap().as_deref(), Some("[]"));
}

/// Accepts reads, refuses every write.
struct ReadOnlyStore(SqliteStore);

impl KeyValueStore for ReadOnlyStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get_raw(key)
    }
    fn put_raw(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }
    fn put_batch(&self, _entries: &[(&str, String)]) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }
}

#[test]
fn failing_writes_keep_the_app_running_in_memory() {
    let store = ReadOnlyStore(SqliteStore::open_memory().unwrap());
    let mut app = FocusApp::load(Box::new(store), clock(), Box::new(LogNotifier));

    app.set_duration(60).unwrap();
    complete(&mut app);

    let snap = app.snapshot();
    assert_eq!(snap.timer.completed_sessions, 1);
    assert_eq!(snap.progress.state.weekly_focus_time, 1);
    assert!(snap
        .achievements
        .iter()
        .any(|a| a.id == "first_session" && a.unlocked));
}

#[test]
fn weekly_total_is_one_batch() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let mut app = open(&dir, &clock);
    app.set_duration(20 * 60).unwrap();
    complete(&mut app);

    let store = SqliteStore::open_at(dir.path().join("focusroom.db")).unwrap();
    assert_eq!(store.get_raw(WEEKLY_FOCUS_TIME_KEY).unwrap().as_deref(), Some("20"));
    assert_eq!(store.get_raw(STREAK_KEY).unwrap().as_deref(), Some("1"));
}
