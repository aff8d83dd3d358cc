use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::role::Role;
use super::session::{GuardFault, WorkflowSession};
use super::topology::Topology;

/// Why a proposed handoff was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    LimitExceeded,
    IllegalEdge,
}

/// Outcome of proposing a transition to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proposal {
    Accept,
    Reject(RejectReason),
}

/// Validates requested transitions against the static topology and the
/// handoff budget.
pub struct HandoffRouter {
    topology: Topology,
    declared: BTreeSet<Role>,
    max_handoffs: u32,
}

impl HandoffRouter {
    pub fn new(topology: Topology, declared: BTreeSet<Role>, max_handoffs: u32) -> Self {
        Self {
            topology,
            declared,
            max_handoffs,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn is_declared(&self, role: Role) -> bool {
        self.declared.contains(&role)
    }

    /// Decide whether `from → to` may happen now.
    ///
    /// The edge must exist, `to` must have a registered capability, and the
    /// session must still be under its handoff budget.
    pub fn propose(&self, from: Role, to: Role, session: &WorkflowSession) -> Proposal {
        if !self.topology.is_edge(from, to) || !self.is_declared(to) {
            warn!(%from, %to, "Rejected illegal handoff");
            return Proposal::Reject(RejectReason::IllegalEdge);
        }
        if session.handoff_count >= self.max_handoffs {
            warn!(
                %from,
                %to,
                handoffs = session.handoff_count,
                max = self.max_handoffs,
                "Rejected handoff over limit"
            );
            return Proposal::Reject(RejectReason::LimitExceeded);
        }
        debug!(%from, %to, handoffs = session.handoff_count, "Accepted handoff");
        Proposal::Accept
    }

    /// The guard fault matching a rejection.
    pub fn fault_for(&self, reason: RejectReason, from: Role, to: Role) -> GuardFault {
        match reason {
            RejectReason::LimitExceeded => GuardFault::HandoffLimitExceeded {
                max: self.max_handoffs,
            },
            RejectReason::IllegalEdge => GuardFault::IllegalTransition { from, to },
        }
    }
}
