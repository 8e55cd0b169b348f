//! # Focusroom Core Library
//!
//! The business logic behind the Focusroom focus timer. Every user intent
//! is available through [`FocusApp`], so the CLI (and any GUI) stays a thin
//! layer over the same engine.
//!
//! ## Architecture
//!
//! - **Timer Machine**: countdown state machine; the caller delivers one
//!   `tick()` per elapsed second
//! - **Progress Engine**: streak, weekly and lifetime focus time, weekly
//!   reset and achievements
//! - **Settings**: theme, notification toggles, presets and weekly goal
//! - **Storage**: JSON values in a key/value store (SQLite or in-memory)
//! - **Driver**: tokio task that ticks the timer and wakes for weekly resets
//!
//! ## Key Components
//!
//! - [`FocusApp`]: facade owning every component plus the capabilities
//! - [`TimerMachine`]: countdown state machine
//! - [`ProgressEngine`]: session aggregation and achievement unlocking
//! - [`KeyValueStore`]: persistence capability
//! - [`spawn_driver`]: async driver for long-running frontends

pub mod app;
pub mod clock;
pub mod driver;
pub mod error;
pub mod events;
pub mod notify;
pub mod progress;
pub mod settings;
pub mod storage;
pub mod timer;

pub use app::{AppSnapshot, FocusApp};
pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{spawn_driver, Driver, DriverHandle};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use notify::{LogNotifier, Notification, Notifier};
pub use progress::{Achievement, Criteria, ProgressEngine, ProgressSnapshot, ProgressState};
pub use settings::{Settings, SettingsPatch, SettingsStore, Theme, TimerPreset};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use timer::{Session, SessionType, TimerMachine, TimerMode, TimerSnapshot};
