use std::time::Duration;

use tokio::time::Instant;

use super::role::Role;
use super::session::{GuardFault, WorkflowSession, millis};

/// Wall-clock budgets for a role visit and for the whole run.
///
/// Checks are plain comparisons made between invocations. A running
/// invocation is never interrupted; an overrun is noticed once it returns.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutSupervisor {
    role_budget: Duration,
    run_budget: Duration,
}

impl Default for TimeoutSupervisor {
    fn default() -> Self {
        Self::new(Duration::from_secs(90), Duration::from_secs(120))
    }
}

impl TimeoutSupervisor {
    pub fn new(role_budget: Duration, run_budget: Duration) -> Self {
        Self {
            role_budget,
            run_budget,
        }
    }

    pub fn enter_role(&self, session: &mut WorkflowSession, role: Role) {
        session.current_role = role;
        session.role_started = Instant::now();
    }

    /// Fails when the role entered last has been active longer than its budget.
    pub fn check_role(&self, session: &WorkflowSession, role: Role) -> Result<(), GuardFault> {
        let elapsed = session.role_elapsed();
        if elapsed > self.role_budget {
            return Err(GuardFault::RoleTimeout {
                role,
                elapsed_ms: millis(elapsed),
                budget_ms: millis(self.role_budget),
            });
        }
        Ok(())
    }

    pub fn check_run(&self, session: &WorkflowSession) -> Result<(), GuardFault> {
        let elapsed = session.run_elapsed();
        if elapsed > self.run_budget {
            return Err(GuardFault::RunTimeout {
                elapsed_ms: millis(elapsed),
                budget_ms: millis(self.run_budget),
            });
        }
        Ok(())
    }
}
