//! The workflow engine and the guards it runs under.
//!
//! A run starts at the entry role and hands control from role to role until
//! a role resolves the ticket or a guard stops it. [`HandoffRouter`] checks
//! every requested transition against the [`Topology`] and the handoff
//! budget, [`LoopDetector`] watches the trailing history, and
//! [`TimeoutSupervisor`] compares elapsed time against the role and run
//! budgets between invocations.

mod engine;
mod loop_detector;
mod role;
mod router;
mod session;
mod timeout;
mod topology;

pub use engine::{WorkflowEngine, WorkflowEngineBuilder};
pub use loop_detector::LoopDetector;
pub use role::Role;
pub use router::{HandoffRouter, Proposal, RejectReason};
pub use session::{
    GuardFault, RoleTiming, RunResult, TerminalState, TerminatedBy, WorkflowLimits,
    WorkflowSession,
};
pub use timeout::TimeoutSupervisor;
pub use topology::Topology;
