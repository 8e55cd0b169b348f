//! Async driver for [`FocusApp`].
//!
//! One task owns the app and multiplexes three sources in a `select!` loop:
//! commands from [`DriverHandle`], a one-second ticker (only polled while the
//! timer runs), and a sleep until the next weekly boundary. Each source is
//! handled to completion before the next one is admitted.
//!
//! The weekly sleep is recomputed on every pass and never longer than
//! [`MAX_RESET_WAIT`], so a wall clock that jumps (suspend, manual change) is
//! noticed within that bound.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::app::{AppSnapshot, FocusApp};
use crate::error::{CoreError, Result};
use crate::settings::SettingsPatch;
use crate::timer::SessionType;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on a single weekly-boundary wait.
pub const MAX_RESET_WAIT: Duration = Duration::from_secs(60 * 60);

const COMMAND_BUFFER: usize = 32;

/// Commands sent to the driver task. Each carries a oneshot for the reply.
#[derive(Debug)]
enum Command {
    Start {
        respond_to: oneshot::Sender<()>,
    },
    Pause {
        respond_to: oneshot::Sender<()>,
    },
    Reset {
        respond_to: oneshot::Sender<()>,
    },
    SetDuration {
        seconds: i64,
        respond_to: oneshot::Sender<Result<()>>,
    },
    ApplyPreset {
        name: String,
        respond_to: oneshot::Sender<Result<()>>,
    },
    SetSessionType {
        session_type: SessionType,
        respond_to: oneshot::Sender<bool>,
    },
    UpdateSettings {
        patch: SettingsPatch,
        respond_to: oneshot::Sender<Result<()>>,
    },
    Snapshot {
        respond_to: oneshot::Sender<AppSnapshot>,
    },
    Shutdown,
}

/// Cloneable handle to a running driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    sender: mpsc::Sender<Command>,
}

/// Owns the driver task; returned by [`spawn_driver`].
#[derive(Debug)]
pub struct Driver {
    handle: DriverHandle,
    task: JoinHandle<FocusApp>,
}

/// Move `app` onto a background task and start driving it.
///
/// Must be called from within a tokio runtime.
pub fn spawn_driver(app: FocusApp) -> Driver {
    let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(run(app, receiver));
    Driver {
        handle: DriverHandle { sender },
        task,
    }
}

impl Driver {
    pub fn handle(&self) -> DriverHandle {
        self.handle.clone()
    }

    /// Stop the loop and hand the app back.
    ///
    /// # Errors
    /// `CoreError::DriverStopped` if the task panicked.
    pub async fn shutdown(self) -> Result<FocusApp> {
        // A closed channel means the loop is already on its way out.
        let _ = self.handle.sender.send(Command::Shutdown).await;
        self.task.await.map_err(|_| CoreError::DriverStopped)
    }
}

impl std::ops::Deref for Driver {
    type Target = DriverHandle;

    fn deref(&self) -> &DriverHandle {
        &self.handle
    }
}

impl DriverHandle {
    async fn request<T>(&self, command: Command, reply: oneshot::Receiver<T>) -> Result<T> {
        self.sender
            .send(command)
            .await
            .map_err(|_| CoreError::DriverStopped)?;
        reply.await.map_err(|_| CoreError::DriverStopped)
    }

    pub async fn start(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Start { respond_to: tx }, rx).await
    }

    pub async fn pause(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Pause { respond_to: tx }, rx).await
    }

    pub async fn reset(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Reset { respond_to: tx }, rx).await
    }

    /// # Errors
    /// `CoreError::InvalidDuration` for `seconds <= 0`, or
    /// `CoreError::DriverStopped`.
    pub async fn set_duration(&self, seconds: i64) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(
            Command::SetDuration {
                seconds,
                respond_to: tx,
            },
            rx,
        )
        .await?
    }

    pub async fn apply_preset(&self, name: impl Into<String>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(
            Command::ApplyPreset {
                name: name.into(),
                respond_to: tx,
            },
            rx,
        )
        .await?
    }

    pub async fn set_session_type(&self, session_type: SessionType) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.request(
            Command::SetSessionType {
                session_type,
                respond_to: tx,
            },
            rx,
        )
        .await
    }

    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request(
            Command::UpdateSettings {
                patch,
                respond_to: tx,
            },
            rx,
        )
        .await?
    }

    pub async fn snapshot(&self) -> Result<AppSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Snapshot { respond_to: tx }, rx).await
    }
}

async fn run(mut app: FocusApp, mut receiver: mpsc::Receiver<Command>) -> FocusApp {
    let mut ticker = time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval() fires immediately; the first tick should come one period in.
    ticker.reset();

    info!(next_reset_at = %app.next_reset_at(), "timer driver started");

    loop {
        let reset_wait = reset_wait(&app);

        tokio::select! {
            command = receiver.recv() => {
                let Some(command) = command else { break };
                if matches!(command, Command::Shutdown) {
                    break;
                }
                let was_running = app.is_running();
                handle(&mut app, command);
                if !was_running && app.is_running() {
                    ticker.reset();
                }
            }
            _ = ticker.tick(), if app.is_running() => {
                app.tick();
            }
            () = time::sleep(reset_wait) => {
                app.check_weekly_reset();
            }
        }
    }

    info!("timer driver stopped");
    app
}

fn handle(app: &mut FocusApp, command: Command) {
    debug!(?command, "driver command");
    // A dropped receiver means the caller stopped waiting; nothing to do.
    match command {
        Command::Start { respond_to } => {
            app.start();
            let _ = respond_to.send(());
        }
        Command::Pause { respond_to } => {
            app.pause();
            let _ = respond_to.send(());
        }
        Command::Reset { respond_to } => {
            app.reset();
            let _ = respond_to.send(());
        }
        Command::SetDuration {
            seconds,
            respond_to,
        } => {
            let _ = respond_to.send(app.set_duration(seconds));
        }
        Command::ApplyPreset { name, respond_to } => {
            let _ = respond_to.send(app.apply_preset(&name));
        }
        Command::SetSessionType {
            session_type,
            respond_to,
        } => {
            let _ = respond_to.send(app.set_session_type(session_type));
        }
        Command::UpdateSettings { patch, respond_to } => {
            let _ = respond_to.send(app.update_settings(patch));
        }
        Command::Snapshot { respond_to } => {
            let _ = respond_to.send(app.snapshot());
        }
        Command::Shutdown => {}
    }
}

/// Time until the next weekly boundary by the app's clock, capped.
fn reset_wait(app: &FocusApp) -> Duration {
    (app.next_reset_at() - app.now())
        .to_std()
        .unwrap_or(Duration::ZERO)
        .min(MAX_RESET_WAIT)
}
