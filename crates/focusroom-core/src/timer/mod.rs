mod machine;
mod session;

pub use machine::{
    TimerMachine, TimerMode, TimerSnapshot, COMPLETED_SESSIONS_KEY, DEFAULT_DURATION_SECS,
    DURATION_KEY, SESSION_HISTORY_KEY,
};
pub use session::{Session, SessionType};
