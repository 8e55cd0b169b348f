use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    Focus,
    Break,
}

/// One entry of the append-only session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub duration_minutes: u32,
    pub completed: bool,
    pub timestamp: DateTime<Local>,
}
