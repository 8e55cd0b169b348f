use focusroom_core::{Notification, Notifier};

/// Prints notifications to stderr and rings the terminal bell for sounds.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        eprintln!("[{}] {}", notification.title, notification.message);
    }

    fn play_sound(&self, _id: &str) {
        eprint!("\x07");
    }
}
