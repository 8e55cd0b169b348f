//! Application facade.
//!
//! [`FocusApp`] owns one timer, one progress engine and the settings, plus
//! the capabilities they run against. Every intent from the outer surface
//! goes through it; each produces zero or more [`Event`]s which are turned
//! into notifications and then handed to subscribers, synchronously, after
//! the update that produced them has been persisted.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::notify::Notifier;
use crate::progress::{Achievement, ProgressEngine, ProgressSnapshot};
use crate::settings::{Settings, SettingsPatch, SettingsStore};
use crate::storage::KeyValueStore;
use crate::timer::{SessionType, TimerMachine, TimerSnapshot};

/// Achievement unlocked by finishing a break countdown.
pub const BREAK_ACHIEVEMENT_ID: &str = "take_a_break";

/// Receives every event after the update that produced it.
pub type Listener = Box<dyn FnMut(&Event) + Send>;

/// Everything the UI renders, in one serializable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub timer: TimerSnapshot,
    pub progress: ProgressSnapshot,
    pub achievements: Vec<Achievement>,
    pub settings: Settings,
}

pub struct FocusApp {
    store: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn Notifier>,
    timer: TimerMachine,
    progress: ProgressEngine,
    settings: SettingsStore,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for FocusApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusApp")
            .field("timer", &self.timer)
            .field("settings", self.settings.settings())
            .finish_non_exhaustive()
    }
}

impl FocusApp {
    /// Restore every component from `store` and apply any weekly reset that
    /// became due while the app was closed.
    pub fn load(
        store: Box<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let now = clock.now();
        let settings = SettingsStore::load(store.as_ref());
        let timer = TimerMachine::load(store.as_ref());
        let progress = ProgressEngine::load(store.as_ref(), settings.weekly_focus_goal(), now);

        let mut app = Self {
            store,
            clock,
            notifier,
            timer,
            progress,
            settings,
            listeners: Vec::new(),
        };
        app.check_weekly_reset();
        app
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    pub fn timer(&self) -> &TimerMachine {
        &self.timer
    }

    pub fn progress(&self) -> &ProgressEngine {
        &self.progress
    }

    pub fn settings(&self) -> &Settings {
        self.settings.settings()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn next_reset_at(&self) -> DateTime<Local> {
        self.progress.next_reset_at()
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            timer: self.timer.snapshot(),
            progress: self.progress.snapshot(),
            achievements: self.progress.achievements().to_vec(),
            settings: self.settings.settings().clone(),
        }
    }

    // ── Timer intents ────────────────────────────────────────────────

    pub fn start(&mut self) {
        let now = self.now();
        if let Some(event) = self.timer.start(now) {
            self.dispatch(event);
        }
    }

    pub fn pause(&mut self) {
        let now = self.now();
        if let Some(event) = self.timer.pause(now) {
            self.dispatch(event);
        }
    }

    pub fn reset(&mut self) {
        let now = self.now();
        let event = self.timer.reset(self.store.as_ref(), now);
        self.dispatch(event);
    }

    /// # Errors
    /// `CoreError::InvalidDuration` when `seconds <= 0`; nothing changes.
    pub fn set_duration(&mut self, seconds: i64) -> Result<()> {
        let now = self.now();
        let event = self.timer.set_duration(self.store.as_ref(), seconds, now)?;
        self.dispatch(event);
        Ok(())
    }

    /// Set the duration from a named preset (case-insensitive).
    ///
    /// # Errors
    /// A validation error if no preset has that name.
    pub fn apply_preset(&mut self, name: &str) -> Result<()> {
        let seconds = self
            .settings
            .settings()
            .preset(name)
            .map(|p| i64::from(p.duration))
            .ok_or_else(|| ValidationError::invalid("preset", format!("no preset named '{name}'")))?;
        self.set_duration(seconds)
    }

    /// Returns false (and changes nothing) while the timer is running.
    pub fn set_session_type(&mut self, session_type: SessionType) -> bool {
        self.timer.set_session_type(session_type)
    }

    /// Deliver one elapsed second.
    pub fn tick(&mut self) {
        let now = self.now();
        let Some(completed) = self.timer.tick(self.store.as_ref(), now) else {
            return;
        };

        let follow_up = match &completed {
            Event::SessionCompleted {
                session_type: SessionType::Focus,
                duration_minutes,
                at,
            } => self
                .progress
                .record_session(self.store.as_ref(), *duration_minutes, *at),
            Event::SessionCompleted {
                session_type: SessionType::Break,
                at,
                ..
            } => match self
                .progress
                .unlock_achievement(self.store.as_ref(), BREAK_ACHIEVEMENT_ID, *at)
            {
                Ok(event) => event.into_iter().collect(),
                Err(e) => {
                    warn!(error = %e, "break achievement missing");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        self.dispatch(completed);
        self.dispatch_all(follow_up);
    }

    // ── Progress intents ─────────────────────────────────────────────

    pub fn check_weekly_reset(&mut self) {
        let now = self.now();
        let events = self.progress.check_weekly_reset(self.store.as_ref(), now);
        self.dispatch_all(events);
    }

    /// # Errors
    /// `CoreError::UnknownAchievement` if `id` is not in the set.
    pub fn unlock_achievement(&mut self, id: &str) -> Result<()> {
        let now = self.now();
        let event = self.progress.unlock_achievement(self.store.as_ref(), id, now)?;
        self.dispatch_all(event);
        Ok(())
    }

    /// # Errors
    /// `CoreError::UnknownAchievement` if `id` is not in the set.
    pub fn update_progress(&mut self, id: &str, progress: i64) -> Result<()> {
        let now = self.now();
        let event = self
            .progress
            .update_progress(self.store.as_ref(), id, progress, now)?;
        self.dispatch_all(event);
        Ok(())
    }

    // ── Settings intents ─────────────────────────────────────────────

    /// Apply a partial settings update. A changed weekly goal is pushed to
    /// the progress engine right away.
    ///
    /// # Errors
    /// A validation error if the patched settings are invalid; nothing changes.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<()> {
        self.settings.update(self.store.as_ref(), patch)?;
        self.sync_weekly_goal();
        Ok(())
    }

    /// Set one setting by dot-path key, parsing `value` into the key's type.
    ///
    /// # Errors
    /// Unknown key, unparsable value or a value that fails validation.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        let patch = self.settings.settings().patch_for(key, value)?;
        self.update_settings(patch)
    }

    pub fn reset_settings(&mut self) {
        self.settings.reset(self.store.as_ref());
        self.sync_weekly_goal();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn sync_weekly_goal(&mut self) {
        let now = self.now();
        let goal = self.settings.weekly_focus_goal();
        let events = self.progress.set_weekly_goal(self.store.as_ref(), goal, now);
        self.dispatch_all(events);
    }

    fn dispatch_all(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        let settings = self.settings.settings();
        if settings.notifications {
            if let Some(notification) = event.notification() {
                self.notifier.notify(&notification);
            }
        }
        if settings.sound {
            if let Some(sound) = event.sound() {
                self.notifier.play_sound(sound);
            }
        }
        debug!(?event, listeners = self.listeners.len(), "dispatch");
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}
