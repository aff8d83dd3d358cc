use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{Context, WorkerCapability, WorkerFault, WorkerReply};
use crate::memory::{DurableAppendStore, MemoryCache};
use crate::ticket::TicketCategory;
use crate::workflow::Role;

/// Entry role: every ticket goes to the memory check first.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntakeWorker;

#[async_trait]
impl WorkerCapability for IntakeWorker {
    async fn invoke(&self, ctx: Context<'_>) -> Result<WorkerReply, WorkerFault> {
        Ok(WorkerReply::route(
            Role::MemoryCheck,
            format!("Check memory for this ticket:\n{}", ctx.ticket_text()),
        ))
    }
}

/// Looks tickets up in the resolution memory, and stores fresh worker
/// resolutions on the way to the summarizer.
pub struct MemoryCheckWorker<S> {
    cache: Arc<MemoryCache<S>>,
}

impl<S> MemoryCheckWorker<S> {
    pub fn new(cache: Arc<MemoryCache<S>>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl<S: DurableAppendStore + 'static> WorkerCapability for MemoryCheckWorker<S> {
    async fn invoke(&self, ctx: Context<'_>) -> Result<WorkerReply, WorkerFault> {
        if let Some(resolution) = resolution_to_store(&ctx) {
            let text = match self.cache.store(ctx.ticket_text(), resolution).await {
                Ok(entry) => format!("Memory stored successfully with ID: {}", entry.id),
                Err(e) => {
                    warn!(error = %e, "Could not store resolution, continuing to summary");
                    format!("Memory store failed: {e}")
                }
            };
            return Ok(WorkerReply::route(Role::Summarizer, text));
        }

        match self.cache.find(ctx.ticket_text()).await {
            Some(entry) => {
                info!(id = %entry.id, "Memory hit");
                Ok(WorkerReply::CacheHit(entry.resolution))
            }
            None => {
                info!("Memory miss");
                Ok(WorkerReply::CacheMiss)
            }
        }
    }
}

/// The worker resolution just handed to the memory check, if that is what
/// the latest message is. Declined handoffs carry another target and are
/// never stored.
fn resolution_to_store<'a>(ctx: &Context<'a>) -> Option<&'a str> {
    ctx.latest()
        .filter(|m| m.role.is_worker() && m.next == Some(Role::MemoryCheck))
        .map(|m| m.text.as_str())
}

/// Sends the ticket to the specialist matching its category. Tickets with
/// no category, or category `other`, go to the fallback worker.
#[derive(Debug, Clone, Copy)]
pub struct TriageWorker {
    fallback: Role,
}

impl Default for TriageWorker {
    fn default() -> Self {
        Self::new(Role::NetworkWorker)
    }
}

impl TriageWorker {
    pub fn new(fallback: Role) -> Self {
        Self { fallback }
    }

    pub fn route_for(&self, ctx: &Context<'_>) -> Role {
        match ctx.ticket.category {
            Some(TicketCategory::Network) => Role::NetworkWorker,
            Some(TicketCategory::Cloud) => Role::CloudWorker,
            Some(TicketCategory::Other) | None => self.fallback,
        }
    }
}

#[async_trait]
impl WorkerCapability for TriageWorker {
    async fn invoke(&self, ctx: Context<'_>) -> Result<WorkerReply, WorkerFault> {
        let next = self.route_for(&ctx);
        debug!(%next, category = ?ctx.ticket.category, "Triage decision");
        Ok(WorkerReply::route(
            next,
            format!("Please diagnose and resolve this issue:\n{}", ctx.ticket_text()),
        ))
    }
}

/// Terminal role: closes the ticket with the latest resolution text as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct CloserWorker;

#[async_trait]
impl WorkerCapability for CloserWorker {
    async fn invoke(&self, ctx: Context<'_>) -> Result<WorkerReply, WorkerFault> {
        let text = ctx
            .latest()
            .map(|m| m.text.clone())
            .ok_or_else(|| WorkerFault::Fatal("closer reached with an empty conversation".into()))?;
        Ok(WorkerReply::Resolved(text))
    }
}
