use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use super::loop_detector::LoopDetector;
use super::role::Role;
use super::router::{HandoffRouter, Proposal};
use super::session::{
    GuardFault, RoleTiming, RunResult, TerminatedBy, WorkflowLimits, WorkflowSession, millis,
};
use super::timeout::TimeoutSupervisor;
use super::topology::Topology;
use crate::error::EngineError;
use crate::worker::{Context, ContextMessage, TicketBrief, WorkerCapability, WorkerReply};

/// Drives one ticket at a time through the role graph.
///
/// The engine itself holds no per-run state: every call to [`run`](Self::run)
/// creates its own [`WorkflowSession`], so one engine can serve many
/// concurrent tickets behind an `Arc`.
pub struct WorkflowEngine {
    workers: HashMap<Role, Arc<dyn WorkerCapability>>,
    router: HandoffRouter,
    loop_detector: LoopDetector,
    timeouts: TimeoutSupervisor,
    entry_role: Role,
    limits: WorkflowLimits,
}

/// Registers capabilities and settings for a [`WorkflowEngine`].
pub struct WorkflowEngineBuilder {
    workers: HashMap<Role, Arc<dyn WorkerCapability>>,
    topology: Topology,
    entry_role: Role,
    limits: WorkflowLimits,
}

impl Default for WorkflowEngineBuilder {
    fn default() -> Self {
        Self {
            workers: HashMap::new(),
            topology: Topology::default(),
            entry_role: Role::Intake,
            limits: WorkflowLimits::default(),
        }
    }
}

impl WorkflowEngineBuilder {
    pub fn worker(self, role: Role, capability: impl WorkerCapability + 'static) -> Self {
        self.shared_worker(role, Arc::new(capability))
    }

    /// Register a capability the caller keeps a handle to.
    pub fn shared_worker(mut self, role: Role, capability: Arc<dyn WorkerCapability>) -> Self {
        self.workers.insert(role, capability);
        self
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn entry_role(mut self, role: Role) -> Self {
        self.entry_role = role;
        self
    }

    pub fn limits(mut self, limits: WorkflowLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> Result<WorkflowEngine, EngineError> {
        if self.workers.is_empty() {
            return Err(EngineError::EmptyRoleSet);
        }
        if !self.workers.contains_key(&self.entry_role) {
            return Err(EngineError::UndeclaredEntryRole(self.entry_role));
        }

        let declared = self.workers.keys().copied().collect();
        let limits = self.limits;
        Ok(WorkflowEngine {
            workers: self.workers,
            router: HandoffRouter::new(self.topology, declared, limits.max_handoffs),
            loop_detector: LoopDetector::new(limits.loop_window, limits.loop_min_unique),
            timeouts: TimeoutSupervisor::new(limits.role_timeout, limits.run_timeout),
            entry_role: self.entry_role,
            limits,
        })
    }
}

impl WorkflowEngine {
    pub fn builder() -> WorkflowEngineBuilder {
        WorkflowEngineBuilder::default()
    }

    /// Run a ticket given only its text.
    pub async fn start(&self, ticket_text: &str) -> Result<RunResult, EngineError> {
        self.run(TicketBrief::from_text(ticket_text)).await
    }

    pub async fn run(&self, brief: TicketBrief) -> Result<RunResult, EngineError> {
        let ticket_ref = format!("run_{}", Uuid::new_v4().simple());
        self.run_ticket(ticket_ref, brief).await
    }

    /// Run `brief` to its terminal state, tagging logs and the result with
    /// `ticket_ref`.
    ///
    /// Guard conditions end the run with a [`RunResult`] naming the guard.
    /// Only a worker that fails fatally, or keeps failing transiently past
    /// the retry allowance, makes this return an error.
    pub async fn run_ticket(
        &self,
        ticket_ref: impl Into<String>,
        brief: TicketBrief,
    ) -> Result<RunResult, EngineError> {
        let mut session = WorkflowSession::new(ticket_ref, self.entry_role);
        self.timeouts.enter_role(&mut session, self.entry_role);
        let mut conversation: Vec<ContextMessage> = Vec::new();
        let mut timings: Vec<RoleTiming> = Vec::new();

        info!(ticket = %session.ticket_ref, entry = %self.entry_role, "Run started");

        loop {
            let role = session.current_role;
            if let Err(fault) = session.record_iteration(self.limits.max_iterations) {
                return Ok(self.stop(&mut session, fault, timings, conversation));
            }

            let started = Instant::now();
            let reply = self
                .invoke_with_retry(role, Context::new(&brief, &conversation))
                .await?;
            timings.push(RoleTiming {
                role,
                duration_ms: millis(started.elapsed()),
            });

            let next = match &reply {
                WorkerReply::Resolved(text) => {
                    conversation.push(ContextMessage::new(role, text.as_str()));
                    session.terminate(TerminatedBy::Role(role));
                    info!(
                        ticket = %session.ticket_ref,
                        %role,
                        handoffs = session.handoff_count,
                        "Run resolved"
                    );
                    let text = text.clone();
                    return Ok(RunResult::from_session(&session, text, timings, conversation));
                }
                WorkerReply::NeedsRoute { next, .. } => *next,
                WorkerReply::CacheHit(_) => self.router.topology().cache_hit_target(),
                WorkerReply::CacheMiss => self.router.topology().cache_miss_target(),
            };
            conversation.push(ContextMessage::routed(role, reply.text(), next));

            if let Proposal::Reject(reason) = self.router.propose(role, next, &session) {
                let fault = self.router.fault_for(reason, role, next);
                return Ok(self.stop(&mut session, fault, timings, conversation));
            }
            session.accept_handoff(next);
            info!(
                ticket = %session.ticket_ref,
                from = %role,
                to = %next,
                handoffs = session.handoff_count,
                "Handoff"
            );

            if let Some(fault) = self.loop_detector.inspect(&session.handoff_history) {
                return Ok(self.stop(&mut session, fault, timings, conversation));
            }
            let checked = self
                .timeouts
                .check_role(&session, role)
                .and_then(|()| self.timeouts.check_run(&session));
            if let Err(fault) = checked {
                return Ok(self.stop(&mut session, fault, timings, conversation));
            }

            self.timeouts.enter_role(&mut session, next);
        }
    }

    async fn invoke_with_retry(
        &self,
        role: Role,
        ctx: Context<'_>,
    ) -> Result<WorkerReply, EngineError> {
        let worker = self
            .workers
            .get(&role)
            .ok_or(EngineError::MissingCapability(role))?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            match worker.invoke(ctx).await {
                Ok(reply) => return Ok(reply),
                Err(fault) if fault.is_transient() && attempts <= self.limits.max_transient_retries => {
                    warn!(
                        %role,
                        attempt = attempts,
                        max = self.limits.max_transient_retries,
                        error = %fault,
                        "Retrying worker"
                    );
                }
                Err(fault) => {
                    return Err(EngineError::WorkerFailed {
                        role,
                        attempts,
                        message: fault.message().to_string(),
                    });
                }
            }
        }
    }

    fn stop(
        &self,
        session: &mut WorkflowSession,
        fault: GuardFault,
        timings: Vec<RoleTiming>,
        conversation: Vec<ContextMessage>,
    ) -> RunResult {
        warn!(
            ticket = %session.ticket_ref,
            guard = fault.guard_name(),
            role = %session.current_role,
            handoffs = session.handoff_count,
            "{fault}"
        );
        let text = format!("Stopped by {}: {fault}", fault.guard_name());
        session.terminate(TerminatedBy::Guard(fault));
        RunResult::from_session(session, text, timings, conversation)
    }
}
