use crate::error::{CamsyncError, Result};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Unit of work that occupies a pool slot until it returns
#[async_trait::async_trait]
pub trait PoolTask: Send + 'static {
    /// Name for logging
    fn name(&self) -> String;

    /// Run to completion. Recording workers never return on their own.
    async fn run(self: Box<Self>);
}

type TaskQueue = Arc<Mutex<mpsc::UnboundedReceiver<Box<dyn PoolTask>>>>;

/// Fixed number of execution slots fed from one FIFO queue
///
/// A task keeps its slot for as long as it runs, so with more submitted tasks
/// than slots the surplus waits in the queue until a running task returns.
pub struct WorkerPool {
    slots: usize,
    sender: Option<mpsc::UnboundedSender<Box<dyn PoolTask>>>,
    active: Arc<AtomicUsize>,
    pending: Arc<AtomicUsize>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `slots` slot loops on the current tokio runtime
    pub fn new(slots: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: TaskQueue = Arc::new(Mutex::new(receiver));
        let active = Arc::new(AtomicUsize::new(0));
        let pending = Arc::new(AtomicUsize::new(0));

        let handles = (0..slots)
            .map(|index| {
                tokio::spawn(run_slot(
                    index,
                    Arc::clone(&queue),
                    Arc::clone(&active),
                    Arc::clone(&pending),
                ))
            })
            .collect();

        info!("Worker pool started with {} slot(s)", slots);

        Self {
            slots,
            sender: Some(sender),
            active,
            pending,
            handles,
        }
    }

    /// Queue a task; it starts as soon as a slot is free
    pub fn submit(&self, task: Box<dyn PoolTask>) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(CamsyncError::PoolClosed)?;
        let name = task.name();

        self.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(task).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(CamsyncError::PoolClosed);
        }

        debug!("Submitted {} to worker pool", name);
        Ok(())
    }

    /// Stop accepting submissions
    ///
    /// Already queued and running tasks are left alone; slots exit once the
    /// queue is empty and their current task has returned.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_some() {
            info!(
                "Worker pool closed ({} active, {} pending)",
                self.active(),
                self.pending()
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Tasks currently holding a slot
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Tasks submitted but still waiting for a slot
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait for every slot loop to finish. Only returns after `shutdown`
    /// once all tasks have returned.
    pub async fn join(&mut self) {
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!("Pool slot panicked: {}", e);
            }
        }
    }
}

async fn run_slot(index: usize, queue: TaskQueue, active: Arc<AtomicUsize>, pending: Arc<AtomicUsize>) {
    loop {
        let task = {
            let mut receiver = queue.lock().await;
            receiver.recv().await
        };
        let Some(task) = task else {
            break;
        };

        pending.fetch_sub(1, Ordering::SeqCst);
        active.fetch_add(1, Ordering::SeqCst);

        let name = task.name();
        debug!("Slot {} running {}", index, name);

        // A panicking task must not take the slot down with it
        if AssertUnwindSafe(task.run()).catch_unwind().await.is_err() {
            error!("Task {} panicked in slot {}", name, index);
        }

        active.fetch_sub(1, Ordering::SeqCst);
        debug!("Slot {} released by {}", index, name);
    }

    debug!("Slot {} exiting", index);
}
