//! A bounded queue processed by a single worker, per spec's delegation
//! runtime: plans are submitted, queued if the worker is busy, and
//! executed one at a time in submission order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};

use crate::dispatcher::AgentDispatcher;
use crate::error::{DelegationError, DelegationResult};
use crate::runtime;
use crate::types::{NormalizedPlan, TaskOutcome};

/// A plan's full execution result: its outcomes and the wall-clock time
/// the whole plan took to run.
#[derive(Debug, Clone)]
pub struct PlanResult {
    /// One outcome per task actually dispatched.
    pub outcomes: Vec<TaskOutcome>,
    /// Total wall-clock duration of the plan's execution.
    pub duration: Duration,
}

struct QueuedJob {
    plan: NormalizedPlan,
    parent_session_id: String,
    depth: u32,
    max_depth: u32,
    reply: oneshot::Sender<PlanResult>,
}

/// Snapshot of the queue's current load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    /// Plans waiting behind the one currently running.
    pub queued: usize,
    /// Whether the worker is currently executing a plan.
    pub running: bool,
    /// Maximum plans the queue will hold before rejecting submissions.
    pub capacity: usize,
}

/// Submission handle for the delegation worker. Clone freely; all clones
/// share the same queue and worker task.
#[derive(Clone)]
pub struct DelegationQueue {
    sender: mpsc::Sender<QueuedJob>,
    queued: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
    capacity: usize,
}

impl DelegationQueue {
    /// Spawn the worker and return a handle to submit plans to it.
    #[must_use]
    pub fn spawn(capacity: usize, dispatcher: Arc<dyn AgentDispatcher>) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        let queued = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicUsize::new(0));

        tokio::spawn(worker_loop(receiver, dispatcher, queued.clone(), running.clone()));

        Self {
            sender,
            queued,
            running,
            capacity,
        }
    }

    /// Submit a normalized plan for execution, returning a receiver for
    /// its eventual result.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationError::QueueFull`] when the queue is at
    /// capacity.
    pub fn submit(
        &self,
        plan: NormalizedPlan,
        parent_session_id: String,
        depth: u32,
        max_depth: u32,
    ) -> DelegationResult<oneshot::Receiver<PlanResult>> {
        let (reply, receiver) = oneshot::channel();
        let job = QueuedJob {
            plan,
            parent_session_id,
            depth,
            max_depth,
            reply,
        };
        self.sender.try_send(job).map_err(|_| DelegationError::QueueFull)?;
        self.queued.fetch_add(1, Ordering::SeqCst);
        Ok(receiver)
    }

    /// Current queue depth and worker activity.
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            queued: self.queued.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst) == 1,
            capacity: self.capacity,
        }
    }
}

async fn worker_loop(
    mut receiver: mpsc::Receiver<QueuedJob>,
    dispatcher: Arc<dyn AgentDispatcher>,
    queued: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
) {
    while let Some(job) = receiver.recv().await {
        queued.fetch_sub(1, Ordering::SeqCst);
        running.store(1, Ordering::SeqCst);

        let started = Instant::now();
        let outcomes = runtime::execute(
            &job.plan,
            &job.parent_session_id,
            job.depth,
            job.max_depth,
            dispatcher.as_ref(),
        )
        .await;
        let duration = started.elapsed();

        running.store(0, Ordering::SeqCst);
        let _ = job.reply.send(PlanResult { outcomes, duration });
    }
}
