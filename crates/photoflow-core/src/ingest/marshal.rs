//! Handoff from background contexts to the foreground thread of control.
//!
//! Import workers never touch UI state. Everything they report is wrapped in a task and posted
//! here; the UI loop runs those tasks one at a time, in posting order.

use log::debug;
use tokio::sync::mpsc;

/// A unit of work to run on the foreground.
pub type ForegroundTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules tasks onto the foreground thread of control from any thread.
pub trait ForegroundMarshal: Send + Sync {
    /// Queues `task`. Tasks run one at a time, in the order they were posted.
    fn post(&self, task: ForegroundTask);
}

/// Sending half of a `foreground_queue()`.
#[derive(Clone)]
pub struct QueueMarshal {
    sender: mpsc::UnboundedSender<ForegroundTask>,
}

impl ForegroundMarshal for QueueMarshal {
    fn post(&self, task: ForegroundTask) {
        if self.sender.send(task).is_err() {
            debug!("QueueMarshal::post: foreground queue is gone, dropping task");
        }
    }
}

/// Receiving half of a `foreground_queue()`, owned and pumped by the UI loop.
pub struct ForegroundQueue {
    receiver: mpsc::UnboundedReceiver<ForegroundTask>,
}

impl ForegroundQueue {
    /// Runs every task that's already queued, without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits for the next task and runs it. Returns false once every marshal has been dropped
    /// and the queue is drained.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Blocking variant of `run_next` for a plain foreground thread.
    ///
    /// Panics if called from inside an async runtime; use `run_next` there.
    pub fn blocking_run_next(&mut self) -> bool {
        match self.receiver.blocking_recv() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }
}

/// Creates a connected marshal/queue pair.
pub fn foreground_queue() -> (QueueMarshal, ForegroundQueue) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (QueueMarshal { sender }, ForegroundQueue { receiver })
}
