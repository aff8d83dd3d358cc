use std::collections::BTreeSet;

use super::role::Role;

/// Static directed handoff relation between roles.
///
/// Besides the explicit edges, the topology names where a cache hit and a
/// cache miss reported by the memory check continue. Those targets still
/// need a matching edge to be accepted by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    edges: BTreeSet<(Role, Role)>,
    cache_hit: Role,
    cache_miss: Role,
}

impl Default for Topology {
    /// The helpdesk topology:
    /// ```text
    /// Intake → MemoryCheck
    /// MemoryCheck → Triage | Closer | Summarizer
    /// Triage → NetworkWorker | CloudWorker
    /// NetworkWorker, CloudWorker → MemoryCheck | Triage | Intake
    /// Summarizer → Closer
    /// Closer is terminal
    /// ```
    fn default() -> Self {
        use Role::*;

        let mut topology = Self::empty(Closer, Triage);
        topology.add_edge(Intake, MemoryCheck);
        topology.add_edge(MemoryCheck, Triage);
        topology.add_edge(MemoryCheck, Closer);
        topology.add_edge(MemoryCheck, Summarizer);
        topology.add_edge(Triage, NetworkWorker);
        topology.add_edge(Triage, CloudWorker);
        for worker in [NetworkWorker, CloudWorker] {
            topology.add_edge(worker, MemoryCheck);
            topology.add_edge(worker, Triage);
            topology.add_edge(worker, Intake);
        }
        topology.add_edge(Summarizer, Closer);
        topology
    }
}

impl Topology {
    /// A topology with no edges, for building custom graphs.
    pub fn empty(cache_hit: Role, cache_miss: Role) -> Self {
        Self {
            edges: BTreeSet::new(),
            cache_hit,
            cache_miss,
        }
    }

    pub fn add_edge(&mut self, from: Role, to: Role) {
        self.edges.insert((from, to));
    }

    pub fn with_edge(mut self, from: Role, to: Role) -> Self {
        self.add_edge(from, to);
        self
    }

    pub fn is_edge(&self, from: Role, to: Role) -> bool {
        self.edges.contains(&(from, to))
    }

    pub fn cache_hit_target(&self) -> Role {
        self.cache_hit
    }

    pub fn cache_miss_target(&self) -> Role {
        self.cache_miss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Role::*;

    fn successors(t: &Topology, from: Role) -> Vec<Role> {
        Role::ALL.into_iter().filter(|to| t.is_edge(from, *to)).collect()
    }

    #[test]
    fn intake_only_goes_to_memory_check() {
        let t = Topology::default();
        assert_eq!(successors(&t, Intake), vec![MemoryCheck]);
    }

    #[test]
    fn triage_fans_out_to_workers_only() {
        let t = Topology::default();
        assert_eq!(successors(&t, Triage), vec![NetworkWorker, CloudWorker]);
    }

    #[test]
    fn workers_never_hand_to_each_other() {
        let t = Topology::default();
        assert!(!t.is_edge(NetworkWorker, CloudWorker));
        assert!(!t.is_edge(CloudWorker, NetworkWorker));
        assert!(t.is_edge(NetworkWorker, Triage));
        assert!(t.is_edge(CloudWorker, Intake));
    }

    #[test]
    fn closer_is_terminal_and_only_reached_from_summarizer_or_cache() {
        let t = Topology::default();
        assert!(successors(&t, Closer).is_empty());
        let into_closer: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|r| t.is_edge(*r, Closer))
            .collect();
        assert_eq!(into_closer, vec![MemoryCheck, Summarizer]);
        assert_eq!(t.cache_hit_target(), Closer);
        assert_eq!(t.cache_miss_target(), Triage);
    }

    #[test]
    fn custom_topology_from_edges() {
        let t = Topology::empty(Closer, Triage)
            .with_edge(Triage, NetworkWorker)
            .with_edge(NetworkWorker, Triage);
        assert!(t.is_edge(NetworkWorker, Triage));
        assert!(!t.is_edge(Intake, MemoryCheck));
        assert!(successors(&t, Closer).is_empty());
    }
}
