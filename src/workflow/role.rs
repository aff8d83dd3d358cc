use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of participants a helpdesk run can hand control between.
///
/// A run usually flows: INTAKE → MEMORY_CHECK → (CLOSER | TRIAGE → WORKER →
/// MEMORY_CHECK → SUMMARIZER → CLOSER)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Intake,
    MemoryCheck,
    Triage,
    NetworkWorker,
    CloudWorker,
    Summarizer,
    Closer,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Intake,
        Role::MemoryCheck,
        Role::Triage,
        Role::NetworkWorker,
        Role::CloudWorker,
        Role::Summarizer,
        Role::Closer,
    ];

    /// Specialist roles that perform diagnostics and produce a resolution.
    pub fn is_worker(self) -> bool {
        matches!(self, Role::NetworkWorker | Role::CloudWorker)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Intake => "intake",
            Role::MemoryCheck => "memory-check",
            Role::Triage => "triage",
            Role::NetworkWorker => "network-worker",
            Role::CloudWorker => "cloud-worker",
            Role::Summarizer => "summarizer",
            Role::Closer => "closer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}
