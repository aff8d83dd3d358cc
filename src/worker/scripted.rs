use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Context, WorkerCapability, WorkerFault, WorkerReply};

/// Replays queued replies, then repeats a default one.
///
/// Stands in for model-backed roles in the offline demo and in tests. An
/// optional delay is awaited before each reply to simulate slow diagnostics.
pub struct ScriptedWorker {
    queue: Mutex<VecDeque<Result<WorkerReply, WorkerFault>>>,
    default: WorkerReply,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl ScriptedWorker {
    pub fn new(default: WorkerReply) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default,
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Queue a one-off result served before the default.
    pub fn then(mut self, result: Result<WorkerReply, WorkerFault>) -> Self {
        self.queue
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times the worker has been invoked.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerCapability for ScriptedWorker {
    async fn invoke(&self, _ctx: Context<'_>) -> Result<WorkerReply, WorkerFault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        queued.unwrap_or_else(|| Ok(self.default.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::TicketBrief;
    use crate::workflow::Role;

    #[tokio::test]
    async fn serves_queue_then_default() {
        let worker = ScriptedWorker::new(WorkerReply::route(Role::MemoryCheck, "fixed"))
            .then(Err(WorkerFault::Transient("stream dropped".into())));
        let brief = TicketBrief::from_text("t");

        let first = worker.invoke(Context::new(&brief, &[])).await;
        assert_eq!(first, Err(WorkerFault::Transient("stream dropped".into())));
        let second = worker.invoke(Context::new(&brief, &[])).await;
        assert_eq!(second, Ok(WorkerReply::route(Role::MemoryCheck, "fixed")));
        assert_eq!(worker.calls(), 2);
    }

    #[tokio::test]
    async fn queued_results_survive_a_poisoned_lock() {
        let worker = ScriptedWorker::new(WorkerReply::route(Role::MemoryCheck, "fixed"));
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = worker.queue.lock().unwrap();
                    panic!("poison the queue");
                })
                .join();
        });
        assert!(worker.queue.is_poisoned());

        let worker = worker.then(Err(WorkerFault::Fatal("disk full".into())));
        let brief = TicketBrief::from_text("t");

        let first = worker.invoke(Context::new(&brief, &[])).await;
        assert_eq!(first, Err(WorkerFault::Fatal("disk full".into())));
        let second = worker.invoke(Context::new(&brief, &[])).await;
        assert_eq!(second, Ok(WorkerReply::route(Role::MemoryCheck, "fixed")));
    }
}
