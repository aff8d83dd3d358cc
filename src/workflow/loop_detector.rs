use std::collections::HashSet;

use super::role::Role;
use super::session::GuardFault;

/// Flags non-converging handoff cycles by looking at the trailing window of
/// the handoff history.
#[derive(Debug, Clone, Copy)]
pub struct LoopDetector {
    window: usize,
    min_unique: usize,
}

impl Default for LoopDetector {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

impl LoopDetector {
    pub fn new(window: usize, min_unique: usize) -> Self {
        Self { window, min_unique }
    }

    /// `true` when the last `window` entries hold fewer than `min_unique`
    /// distinct roles. Always `false` while the history is shorter than the
    /// window.
    pub fn check(&self, history: &[Role]) -> bool {
        self.inspect(history).is_some()
    }

    /// Like [`check`](Self::check) but returns the guard fault describing the loop.
    pub fn inspect(&self, history: &[Role]) -> Option<GuardFault> {
        if self.window == 0 || history.len() < self.window {
            return None;
        }
        let tail = &history[history.len() - self.window..];
        let distinct = tail.iter().collect::<HashSet<_>>().len();
        (distinct < self.min_unique).then_some(GuardFault::LoopDetected {
            window: self.window,
            distinct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Role::*;

    #[test]
    fn alternating_pair_is_not_a_loop() {
        let detector = LoopDetector::default();
        assert!(!detector.check(&[Triage, NetworkWorker, Triage]));
    }

    #[test]
    fn same_role_three_times_is_a_loop() {
        let detector = LoopDetector::default();
        assert!(detector.check(&[NetworkWorker, NetworkWorker, NetworkWorker]));
        assert_eq!(
            detector.inspect(&[NetworkWorker, NetworkWorker, NetworkWorker]),
            Some(GuardFault::LoopDetected {
                window: 3,
                distinct: 1
            })
        );
    }

    #[test]
    fn only_trailing_window_counts() {
        let detector = LoopDetector::default();
        assert!(detector.check(&[Intake, MemoryCheck, Triage, CloudWorker, CloudWorker, CloudWorker]));
        assert!(!detector.check(&[CloudWorker, CloudWorker, CloudWorker, Triage]));
    }

    #[test]
    fn short_history_is_a_no_op() {
        let detector = LoopDetector::default();
        assert!(!detector.check(&[]));
        assert!(!detector.check(&[Triage, Triage]));
    }

    #[test]
    fn stricter_minimum() {
        let detector = LoopDetector::new(4, 3);
        assert!(detector.check(&[Triage, NetworkWorker, Triage, NetworkWorker]));
        assert!(!detector.check(&[Triage, NetworkWorker, MemoryCheck, Triage]));
    }
}
