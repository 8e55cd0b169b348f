use clap::Subcommand;
use focusroom_core::{spawn_driver, Event, SessionType};
use tokio::sync::mpsc;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a countdown in the foreground until it completes
    Run {
        /// Countdown length in seconds (saved as the new duration)
        #[arg(long, allow_negative_numbers = true)]
        seconds: Option<i64>,
        /// Run a break instead of a focus session
        #[arg(long = "break")]
        is_break: bool,
    },
    /// Print current timer state as JSON
    Status,
    /// Set the countdown length in seconds
    Duration {
        #[arg(allow_negative_numbers = true)]
        seconds: i64,
    },
    /// Set the countdown length from a named preset
    Preset {
        /// Preset name (e.g. "Pomodoro", "Short Break")
        name: String,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    match action {
        TimerAction::Run { seconds, is_break } => run_countdown(seconds, is_break),
        TimerAction::Status => {
            let app = open_app();
            print_json(&app.snapshot().timer)
        }
        TimerAction::Duration { seconds } => {
            let mut app = open_app();
            app.set_duration(seconds)?;
            print_json(&app.snapshot().timer)
        }
        TimerAction::Preset { name } => {
            let mut app = open_app();
            app.apply_preset(&name)?;
            print_json(&app.snapshot().timer)
        }
    }
}

/// Drive one countdown to completion, printing every event as a JSON line.
fn run_countdown(seconds: Option<i64>, is_break: bool) -> CliResult {
    let mut app = open_app();
    let session_type = if is_break {
        SessionType::Break
    } else {
        SessionType::Focus
    };
    app.set_session_type(session_type);
    if let Some(seconds) = seconds {
        app.set_duration(seconds)?;
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    app.subscribe(move |event| {
        let _ = tx.send(event.clone());
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        let driver = spawn_driver(app);
        driver.start().await?;

        while let Some(event) = rx.recv().await {
            println!("{}", serde_json::to_string(&event)?);
            if matches!(event, Event::SessionCompleted { .. }) {
                break;
            }
        }

        let app = driver.shutdown().await?;
        // Unlocks and milestones follow the completion in the same tick.
        while let Ok(event) = rx.try_recv() {
            println!("{}", serde_json::to_string(&event)?);
        }
        print_json(&app.snapshot().progress)
    })
}
