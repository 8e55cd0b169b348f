pub mod config;
pub mod history;
pub mod progress;
pub mod timer;

use std::sync::Arc;

use focusroom_core::{FocusApp, KeyValueStore, MemoryStore, SqliteStore, SystemClock};
use tracing::warn;

use crate::notifier::TerminalNotifier;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the app on the on-disk store, or on an in-memory one if the
/// database cannot be opened.
pub fn open_app() -> FocusApp {
    let store: Box<dyn KeyValueStore> = match SqliteStore::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "database unavailable, nothing will be saved");
            Box::new(MemoryStore::new())
        }
    };
    FocusApp::load(store, Arc::new(SystemClock), Box::new(TerminalNotifier))
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
