use chrono::NaiveDateTime;
use livewatch_core::Liveness;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Last status stored for a target. `Unknown` until the first conclusive check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetStatus {
    Live,
    Die,
    Unknown,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Live => "LIVE",
            TargetStatus::Die => "DIE",
            TargetStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn liveness(self) -> Option<Liveness> {
        match self {
            TargetStatus::Live => Some(Liveness::Live),
            TargetStatus::Die => Some(Liveness::Die),
            TargetStatus::Unknown => None,
        }
    }
}

impl From<Liveness> for TargetStatus {
    fn from(status: Liveness) -> Self {
        match status {
            Liveness::Live => TargetStatus::Live,
            Liveness::Die => TargetStatus::Die,
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Target {
    pub id: String,
    pub url: String,
    pub display_name: Option<String>,
    pub last_status: TargetStatus,
    pub updated_at: Option<NaiveDateTime>,
}
