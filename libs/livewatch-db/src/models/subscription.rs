use super::target::TargetStatus;
use chrono::NaiveDateTime;
use livewatch_core::TargetKind;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub watcher_id: i64,
    pub target_id: String,
    pub annotation: Option<String>,
    pub owner_label: Option<String>,
    pub kind: String, // 'profile' | 'group'
    pub created_at: Option<NaiveDateTime>,
}

impl Subscription {
    pub fn target_kind(&self) -> TargetKind {
        self.kind.parse().unwrap_or_default()
    }
}

/// A watcher's subscription joined with the target it points at.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchedTarget {
    pub target_id: String,
    pub url: String,
    pub display_name: Option<String>,
    pub last_status: TargetStatus,
    pub annotation: Option<String>,
    pub owner_label: Option<String>,
    pub kind: String,
}

impl WatchedTarget {
    pub fn target_kind(&self) -> TargetKind {
        self.kind.parse().unwrap_or_default()
    }
}
