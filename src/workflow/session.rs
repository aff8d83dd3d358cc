use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

use super::role::Role;
use crate::worker::ContextMessage;

/// Hard safety limits applied to every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowLimits {
    /// Maximum accepted handoffs before the router refuses further transitions.
    pub max_handoffs: u32,
    /// Maximum invocations of any single role within one run.
    pub max_iterations: u32,
    /// Budget for a single role, measured from the moment it is entered.
    pub role_timeout: Duration,
    /// Budget for the whole run.
    pub run_timeout: Duration,
    /// Number of trailing history entries inspected for loops.
    pub loop_window: usize,
    /// Minimum distinct roles expected inside the loop window.
    pub loop_min_unique: usize,
    /// Retries granted to a worker after a transient fault.
    pub max_transient_retries: u32,
}

impl Default for WorkflowLimits {
    fn default() -> Self {
        Self {
            max_handoffs: 12,
            max_iterations: 15,
            role_timeout: Duration::from_secs(90),
            run_timeout: Duration::from_secs(120),
            loop_window: 3,
            loop_min_unique: 2,
            max_transient_retries: 2,
        }
    }
}

/// A guard condition that forced a run to stop early.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuardFault {
    #[error("illegal handoff from {from} to {to}")]
    IllegalTransition { from: Role, to: Role },

    #[error("handoff limit of {max} reached")]
    HandoffLimitExceeded { max: u32 },

    #[error("{role} exceeded its limit of {max} iterations")]
    IterationLimitExceeded { role: Role, max: u32 },

    #[error("{role} ran for {elapsed_ms}ms, over its {budget_ms}ms budget")]
    RoleTimeout {
        role: Role,
        elapsed_ms: u64,
        budget_ms: u64,
    },

    #[error("run took {elapsed_ms}ms, over its {budget_ms}ms budget")]
    RunTimeout { elapsed_ms: u64, budget_ms: u64 },

    #[error("loop detected: last {window} handoffs visited only {distinct} distinct role(s)")]
    LoopDetected { window: usize, distinct: usize },
}

impl GuardFault {
    /// Name of the component that enforces this guard.
    pub fn guard_name(&self) -> &'static str {
        match self {
            GuardFault::IllegalTransition { .. } | GuardFault::HandoffLimitExceeded { .. } => {
                "HandoffRouter"
            }
            GuardFault::IterationLimitExceeded { .. } => "WorkflowEngine",
            GuardFault::RoleTimeout { .. } | GuardFault::RunTimeout { .. } => "TimeoutSupervisor",
            GuardFault::LoopDetected { .. } => "LoopDetector",
        }
    }
}

/// The single terminal state every session ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Completed,
    IllegalTransition,
    HandoffLimitExceeded,
    IterationLimitExceeded,
    RoleTimeout,
    RunTimeout,
    LoopDetected,
}

impl From<&GuardFault> for TerminalState {
    fn from(fault: &GuardFault) -> Self {
        match fault {
            GuardFault::IllegalTransition { .. } => TerminalState::IllegalTransition,
            GuardFault::HandoffLimitExceeded { .. } => TerminalState::HandoffLimitExceeded,
            GuardFault::IterationLimitExceeded { .. } => TerminalState::IterationLimitExceeded,
            GuardFault::RoleTimeout { .. } => TerminalState::RoleTimeout,
            GuardFault::RunTimeout { .. } => TerminalState::RunTimeout,
            GuardFault::LoopDetected { .. } => TerminalState::LoopDetected,
        }
    }
}

/// Who ended the run: the role that resolved it, or the guard that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminatedBy {
    Role(Role),
    Guard(GuardFault),
}

impl fmt::Display for TerminatedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminatedBy::Role(role) => write!(f, "{role}"),
            TerminatedBy::Guard(fault) => f.write_str(fault.guard_name()),
        }
    }
}

/// Mutable state of one run. Owned by the engine and dropped at the end of
/// the run; only the derived [`RunResult`] outlives it.
#[derive(Debug, Clone)]
pub struct WorkflowSession {
    pub ticket_ref: String,
    pub entry_role: Role,
    pub current_role: Role,
    pub handoff_count: u32,
    pub iterations: HashMap<Role, u32>,
    pub run_started: Instant,
    pub role_started: Instant,
    /// Every role entered, in order, starting with the entry role.
    pub handoff_history: Vec<Role>,
    pub terminal_state: Option<TerminalState>,
    pub terminated_by: Option<TerminatedBy>,
}

impl WorkflowSession {
    pub fn new(ticket_ref: impl Into<String>, entry_role: Role) -> Self {
        let now = Instant::now();
        Self {
            ticket_ref: ticket_ref.into(),
            entry_role,
            current_role: entry_role,
            handoff_count: 0,
            iterations: HashMap::new(),
            run_started: now,
            role_started: now,
            handoff_history: vec![entry_role],
            terminal_state: None,
            terminated_by: None,
        }
    }

    /// Count one more invocation of the current role, refusing once the role
    /// has already been invoked `max` times.
    pub fn record_iteration(&mut self, max: u32) -> Result<u32, GuardFault> {
        let role = self.current_role;
        let count = self.iterations.entry(role).or_insert(0);
        if *count >= max {
            return Err(GuardFault::IterationLimitExceeded { role, max });
        }
        *count += 1;
        Ok(*count)
    }

    /// Apply a transition the router has accepted.
    pub fn accept_handoff(&mut self, next: Role) {
        self.handoff_count += 1;
        self.handoff_history.push(next);
        self.current_role = next;
    }

    pub fn role_elapsed(&self) -> Duration {
        self.role_started.elapsed()
    }

    pub fn run_elapsed(&self) -> Duration {
        self.run_started.elapsed()
    }

    pub fn terminate(&mut self, by: TerminatedBy) {
        self.terminal_state = Some(match &by {
            TerminatedBy::Role(_) => TerminalState::Completed,
            TerminatedBy::Guard(fault) => TerminalState::from(fault),
        });
        self.terminated_by = Some(by);
    }

    /// History with consecutive repeats collapsed.
    pub fn deduplicated_history(&self) -> Vec<Role> {
        let mut sequence: Vec<Role> = Vec::with_capacity(self.handoff_history.len());
        for role in &self.handoff_history {
            if sequence.last() != Some(role) {
                sequence.push(*role);
            }
        }
        sequence
    }
}

/// Wall-clock time spent in one visit to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTiming {
    pub role: Role,
    pub duration_ms: u64,
}

/// Report produced when a run reaches its terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub ticket_ref: String,
    /// The resolution for a completed run, or the guard description otherwise.
    pub final_text: String,
    pub handoff_sequence: Vec<Role>,
    pub handoff_count: u32,
    pub role_timings: Vec<RoleTiming>,
    pub terminal_state: TerminalState,
    pub terminated_by: TerminatedBy,
    /// Output of the summarizer, when it ran.
    pub summary: Option<String>,
    pub conversation: Vec<ContextMessage>,
    pub elapsed_ms: u64,
}

impl RunResult {
    /// Build the report from a terminated session.
    pub fn from_session(
        session: &WorkflowSession,
        final_text: String,
        role_timings: Vec<RoleTiming>,
        conversation: Vec<ContextMessage>,
    ) -> Self {
        let terminated_by = session
            .terminated_by
            .clone()
            .unwrap_or(TerminatedBy::Role(session.current_role));
        let terminal_state = session.terminal_state.unwrap_or(TerminalState::Completed);
        let summary = conversation
            .iter()
            .rev()
            .find(|m| m.role == Role::Summarizer)
            .map(|m| m.text.clone());

        Self {
            ticket_ref: session.ticket_ref.clone(),
            final_text,
            handoff_sequence: session.deduplicated_history(),
            handoff_count: session.handoff_count,
            role_timings,
            terminal_state,
            terminated_by,
            summary,
            conversation,
            elapsed_ms: millis(session.run_elapsed()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.terminal_state == TerminalState::Completed
    }

    pub fn guard_fault(&self) -> Option<&GuardFault> {
        match &self.terminated_by {
            TerminatedBy::Guard(fault) => Some(fault),
            TerminatedBy::Role(_) => None,
        }
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
