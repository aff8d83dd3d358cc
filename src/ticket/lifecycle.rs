use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{TicketPatch, TicketStatus, TicketStore};
use crate::error::HelpdeskError;
use crate::worker::TicketBrief;
use crate::workflow::{RunResult, WorkflowEngine};

/// Runs stored tickets through the workflow and records the outcome on the
/// ticket.
pub struct TicketProcessor {
    engine: Arc<WorkflowEngine>,
    tickets: Arc<dyn TicketStore>,
}

impl TicketProcessor {
    pub fn new(engine: Arc<WorkflowEngine>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { engine, tickets }
    }

    pub fn tickets(&self) -> &Arc<dyn TicketStore> {
        &self.tickets
    }

    /// Process ticket `id` inline and return the run report.
    ///
    /// The ticket moves to `processing`, then to `resolved` with the final
    /// text, or to `error` with a description of the guard that stopped the
    /// run. A failing worker also leaves the ticket in `error` and the
    /// failure is returned.
    pub async fn process_ticket(&self, id: &str) -> Result<RunResult, HelpdeskError> {
        let ticket = self
            .tickets
            .get(id)
            .await?
            .ok_or_else(|| HelpdeskError::TicketNotFound(id.to_string()))?;

        self.tickets
            .update(id, TicketPatch::status(TicketStatus::Processing))
            .await?;
        info!(ticket = %id, category = %ticket.category, "Processing ticket");

        let brief = TicketBrief::with_category(ticket.brief_text(), ticket.category);
        let result = match self.engine.run_ticket(id, brief).await {
            Ok(result) => result,
            Err(e) => {
                error!(ticket = %id, error = %e, "Ticket processing failed");
                self.tickets
                    .update(
                        id,
                        TicketPatch::resolved_with(
                            TicketStatus::Error,
                            format!("Error during processing: {e}"),
                        ),
                    )
                    .await?;
                return Err(e.into());
            }
        };

        let status = if result.is_resolved() {
            info!(ticket = %id, handoffs = result.handoff_count, "Ticket resolved");
            TicketStatus::Resolved
        } else {
            warn!(ticket = %id, guard = %result.terminated_by, "Ticket stopped by guard");
            TicketStatus::Error
        };
        self.tickets
            .update(
                id,
                TicketPatch::resolved_with(status, result.final_text.clone()),
            )
            .await?;
        Ok(result)
    }

    /// Process ticket `id` on a background task. The outcome lands in the
    /// ticket store; failures are only logged.
    pub fn spawn_process_ticket(self: &Arc<Self>, id: impl Into<String>) -> JoinHandle<()> {
        let processor = Arc::clone(self);
        let id = id.into();
        tokio::spawn(async move {
            if let Err(e) = processor.process_ticket(&id).await {
                error!(ticket = %id, error = %e, "Background ticket processing failed");
            }
        })
    }
}
