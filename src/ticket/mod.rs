//! Helpdesk tickets, their store, and the mapping from run outcomes to
//! ticket status.

mod lifecycle;
mod store;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use lifecycle::TicketProcessor;
pub use store::{InMemoryTicketStore, JsonFileTicketStore, TicketStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    Network,
    Cloud,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Processing,
    Resolved,
    Error,
}

macro_rules! lowercase_enum_text {
    ($ty:ty, $($variant:ident => $text:literal),+ $(,)?) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($text),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("invalid {}: {other}", stringify!($ty))),
                }
            }
        }
    };
}

lowercase_enum_text!(TicketSeverity, Low => "low", Medium => "medium", High => "high", Critical => "critical");
lowercase_enum_text!(TicketCategory, Network => "network", Cloud => "cloud", Other => "other");
lowercase_enum_text!(TicketStatus, Pending => "pending", Processing => "processing", Resolved => "resolved", Error => "error");

/// A helpdesk ticket. Created at intake; changed only by terminal workflow
/// events; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: TicketSeverity,
    pub category: TicketCategory,
    pub status: TicketStatus,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: TicketSeverity,
        category: TicketCategory,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            severity,
            category,
            status: TicketStatus::Pending,
            resolution: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Text handed to the workflow and used as the memory query.
    pub fn brief_text(&self) -> String {
        format!("{}\n{}", self.title.trim(), self.description.trim())
    }

    /// Merge `patch` into this ticket and refresh `updated_at`.
    pub fn apply(&mut self, patch: TicketPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(resolution) = patch.resolution {
            self.resolution = Some(resolution);
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update merged into a stored ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketPatch {
    pub status: Option<TicketStatus>,
    pub resolution: Option<String>,
}

impl TicketPatch {
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            resolution: None,
        }
    }

    pub fn resolved_with(status: TicketStatus, resolution: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            resolution: Some(resolution.into()),
        }
    }
}
