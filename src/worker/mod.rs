//! Worker capabilities: the participants the engine hands control between.
//!
//! Each role is backed by a [`WorkerCapability`]. The engine passes it a
//! read-only [`Context`] and receives a tagged [`WorkerReply`] that carries
//! both the response text and the routing decision, so routing never depends
//! on what the text happens to say.

mod builtin;
mod llm;
mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::TicketCategory;
use crate::workflow::Role;

pub use builtin::{CloserWorker, IntakeWorker, MemoryCheckWorker, TriageWorker};
pub use llm::{LlmWorker, RoleDecision};
pub use scripted::ScriptedWorker;

/// One message in the conversation accumulated during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: Role,
    pub text: String,
    /// Role this message was routed to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Role>,
}

impl ContextMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            next: None,
        }
    }

    pub fn routed(role: Role, text: impl Into<String>, next: Role) -> Self {
        Self {
            next: Some(next),
            ..Self::new(role, text)
        }
    }
}

/// What the run is about: the ticket text plus an optional category hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketBrief {
    pub text: String,
    pub category: Option<TicketCategory>,
}

impl TicketBrief {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
        }
    }

    pub fn with_category(text: impl Into<String>, category: TicketCategory) -> Self {
        Self {
            text: text.into(),
            category: Some(category),
        }
    }
}

/// Read-only view handed to a capability for a single invocation.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub ticket: &'a TicketBrief,
    pub messages: &'a [ContextMessage],
}

impl<'a> Context<'a> {
    pub fn new(ticket: &'a TicketBrief, messages: &'a [ContextMessage]) -> Self {
        Self { ticket, messages }
    }

    pub fn ticket_text(&self) -> &'a str {
        &self.ticket.text
    }

    pub fn latest(&self) -> Option<&'a ContextMessage> {
        self.messages.last()
    }

    /// Most recent message produced by `role`.
    pub fn last_from(&self, role: Role) -> Option<&'a ContextMessage> {
        self.messages.iter().rev().find(|m| m.role == role)
    }
}

/// Tagged result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerReply {
    /// The run is finished and `text` is the resolution.
    Resolved(String),
    /// Hand control to `next`.
    NeedsRoute { next: Role, text: String },
    /// A stored resolution matched the ticket.
    CacheHit(String),
    /// Nothing in memory matched the ticket.
    CacheMiss,
}

impl WorkerReply {
    pub fn route(next: Role, text: impl Into<String>) -> Self {
        WorkerReply::NeedsRoute {
            next,
            text: text.into(),
        }
    }

    /// Text recorded in the conversation for this reply.
    pub fn text(&self) -> &str {
        match self {
            WorkerReply::Resolved(text)
            | WorkerReply::NeedsRoute { text, .. }
            | WorkerReply::CacheHit(text) => text,
            WorkerReply::CacheMiss => "No matching resolution found in memory.",
        }
    }
}

/// Failure of a single invocation, classified for retry decisions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerFault {
    /// Infrastructure hiccup (rate limit, dropped stream). Worth retrying.
    #[error("transient worker fault: {0}")]
    Transient(String),
    /// Anything else. Retrying would not help.
    #[error("fatal worker fault: {0}")]
    Fatal(String),
}

impl WorkerFault {
    pub fn is_transient(&self) -> bool {
        matches!(self, WorkerFault::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            WorkerFault::Transient(msg) | WorkerFault::Fatal(msg) => msg,
        }
    }
}

/// A participant that turns the conversation so far into a reply.
#[async_trait]
pub trait WorkerCapability: Send + Sync {
    async fn invoke(&self, ctx: Context<'_>) -> Result<WorkerReply, WorkerFault>;
}
