//! Event status and the calendar colour derived from it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Planned,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Planned => "planned",
            EventStatus::Confirmed => "confirmed",
            EventStatus::InProgress => "in_progress",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Hex colour used by calendar clients.
    pub fn color(&self) -> &'static str {
        match self {
            EventStatus::Planned => "#3b82f6",
            EventStatus::Confirmed => "#8b5cf6",
            EventStatus::InProgress => "#10b981",
            EventStatus::Completed => "#6b7280",
            EventStatus::Cancelled => "#ef4444",
        }
    }

    /// Withdrawals and returns are only recorded against live events.
    pub fn accepts_transactions(&self) -> bool {
        matches!(
            self,
            EventStatus::Planned | EventStatus::Confirmed | EventStatus::InProgress
        )
    }

    /// Reservations need a committed event; planned ones are still drafts.
    pub fn accepts_reservations(&self) -> bool {
        matches!(self, EventStatus::Confirmed | EventStatus::InProgress)
    }
}
