//! Countdown state machine.
//!
//! The machine does not own a thread or a timer. The caller delivers one
//! `tick()` per elapsed second while the machine is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> ... -> Idle (complete)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = TimerMachine::load(&store);
//! timer.start(now);
//! // once per second:
//! if let Some(Event::SessionCompleted { .. }) = timer.tick(&store, now) { /* ... */ }
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::session::{Session, SessionType};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::storage::{self, KeyValueStore};

pub const DURATION_KEY: &str = "duration";
pub const COMPLETED_SESSIONS_KEY: &str = "completedSessions";
pub const SESSION_HISTORY_KEY: &str = "sessionHistory";

/// 25 minutes.
pub const DEFAULT_DURATION_SECS: u32 = 25 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Idle,
    Running,
    Paused,
}

/// Point-in-time view of the timer for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub session_type: SessionType,
    pub duration_seconds: u32,
    pub remaining_seconds: u32,
    pub completed_sessions: u64,
    pub session_history: Vec<Session>,
}

/// Countdown timer.
///
/// Invariants: `duration_secs > 0` and `remaining_secs <= duration_secs`.
#[derive(Debug, Clone)]
pub struct TimerMachine {
    mode: TimerMode,
    session_type: SessionType,
    duration_secs: u32,
    remaining_secs: u32,
    completed_sessions: u64,
    history: Vec<Session>,
}

impl Default for TimerMachine {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_SECS)
    }
}

impl TimerMachine {
    /// Create an idle timer with a full countdown of `duration_secs`.
    ///
    /// A zero duration is bumped to one second.
    pub fn new(duration_secs: u32) -> Self {
        let duration_secs = duration_secs.max(1);
        Self {
            mode: TimerMode::Idle,
            session_type: SessionType::Focus,
            duration_secs,
            remaining_secs: duration_secs,
            completed_sessions: 0,
            history: Vec::new(),
        }
    }

    /// Restore duration, counters and history from the store.
    ///
    /// The countdown itself is not persisted; a restored timer is idle.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let duration_secs = storage::load_or_default(
            store,
            DURATION_KEY,
            || DEFAULT_DURATION_SECS,
            |d: &u32| {
                if *d > 0 {
                    Ok(())
                } else {
                    Err("duration must be positive".into())
                }
            },
        );
        let history: Vec<Session> =
            storage::load_or_default(store, SESSION_HISTORY_KEY, Vec::new, storage::any);
        let completed_sessions = storage::load_or_default(
            store,
            COMPLETED_SESSIONS_KEY,
            || history.iter().filter(|s| s.completed).count() as u64,
            storage::any,
        );

        Self {
            completed_sessions,
            history,
            ..Self::new(duration_secs)
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn completed_sessions(&self) -> u64 {
        self.completed_sessions
    }

    pub fn history(&self) -> &[Session] {
        &self.history
    }

    pub fn is_running(&self) -> bool {
        self.mode == TimerMode::Running
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            session_type: self.session_type,
            duration_seconds: self.duration_secs,
            remaining_seconds: self.remaining_secs,
            completed_sessions: self.completed_sessions,
            session_history: self.history.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: DateTime<Local>) -> Option<Event> {
        match self.mode {
            TimerMode::Running => None,
            TimerMode::Idle | TimerMode::Paused => {
                if self.remaining_secs == 0 {
                    // Finished countdown: re-arm a full one.
                    self.remaining_secs = self.duration_secs;
                }
                self.mode = TimerMode::Running;
                debug!(remaining = self.remaining_secs, "timer started");
                Some(Event::TimerStarted {
                    session_type: self.session_type,
                    duration_secs: self.duration_secs,
                    remaining_secs: self.remaining_secs,
                    at: now,
                })
            }
        }
    }

    pub fn pause(&mut self, now: DateTime<Local>) -> Option<Event> {
        match self.mode {
            TimerMode::Running => {
                self.mode = TimerMode::Paused;
                debug!(remaining = self.remaining_secs, "timer paused");
                Some(Event::TimerPaused {
                    remaining_secs: self.remaining_secs,
                    at: now,
                })
            }
            _ => None,
        }
    }

    /// Back to a full idle countdown.
    ///
    /// A countdown that was started and not finished is kept in the history
    /// as an incomplete session. It does not count as a completed one.
    pub fn reset(&mut self, store: &dyn KeyValueStore, now: DateTime<Local>) -> Event {
        if self.mode != TimerMode::Idle {
            let elapsed_secs = self.duration_secs - self.remaining_secs;
            self.history.push(Session {
                session_type: self.session_type,
                duration_minutes: elapsed_secs / 60,
                completed: false,
                timestamp: now,
            });
            self.persist_sessions(store);
            debug!(elapsed_secs, "countdown abandoned");
        }

        self.mode = TimerMode::Idle;
        self.remaining_secs = self.duration_secs;
        debug!(duration = self.duration_secs, "timer reset");
        Event::TimerReset {
            duration_secs: self.duration_secs,
            at: now,
        }
    }

    /// Change the countdown length.
    ///
    /// Re-bases both the total and the remaining time so the displayed time
    /// always matches the new total, whatever the current mode.
    ///
    /// # Errors
    /// `CoreError::InvalidDuration` when `seconds <= 0` (or beyond `u32`);
    /// the timer is left untouched.
    pub fn set_duration(
        &mut self,
        store: &dyn KeyValueStore,
        seconds: i64,
        now: DateTime<Local>,
    ) -> Result<Event> {
        let secs = u32::try_from(seconds)
            .ok()
            .filter(|s| *s > 0)
            .ok_or(CoreError::InvalidDuration { seconds })?;

        self.duration_secs = secs;
        self.remaining_secs = secs;
        storage::save(store, DURATION_KEY, &secs);
        debug!(duration = secs, "timer duration changed");
        Ok(Event::DurationChanged {
            duration_secs: secs,
            at: now,
        })
    }

    /// Switch between focus and break countdowns. Ignored while running.
    pub fn set_session_type(&mut self, session_type: SessionType) -> bool {
        if self.mode == TimerMode::Running {
            return false;
        }
        self.session_type = session_type;
        true
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `SessionCompleted` on the tick that reaches zero. The running
    /// guard makes any further tick a no-op, so the event fires once.
    pub fn tick(&mut self, store: &dyn KeyValueStore, now: DateTime<Local>) -> Option<Event> {
        if self.mode != TimerMode::Running {
            return None;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        self.mode = TimerMode::Idle;
        let duration_minutes = self.duration_secs / 60;
        self.history.push(Session {
            session_type: self.session_type,
            duration_minutes,
            completed: true,
            timestamp: now,
        });
        self.completed_sessions += 1;
        self.persist_sessions(store);

        info!(
            session_type = ?self.session_type,
            duration_minutes,
            completed_sessions = self.completed_sessions,
            "session completed"
        );
        Some(Event::SessionCompleted {
            session_type: self.session_type,
            duration_minutes,
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist_sessions(&self, store: &dyn KeyValueStore) {
        let entries = [
            storage::to_entry(SESSION_HISTORY_KEY, &self.history),
            storage::to_entry(COMPLETED_SESSIONS_KEY, &self.completed_sessions),
        ];
        match entries.into_iter().collect::<std::result::Result<Vec<_>, _>>() {
            Ok(entries) => storage::save_batch(store, &entries),
            Err(e) => tracing::warn!(error = %e, "failed to serialize session history"),
        }
    }
}
