//! Bounded-but-elastic worker pool.
//!
//! # Responsibilities
//! - Execute routing/handling work off the I/O threads
//! - Grow past the base worker count under sustained overload, up to a cap
//! - Turn saturation into a bounded, explicit rejection instead of an
//!   unbounded wait or a silent drop
//!
//! # Design Decisions
//! - Plain OS threads: handler work may block, which would stall an async
//!   executor thread
//! - One mutex guards the queue and the worker count; two condvars signal
//!   "task available" and "queue has room"
//! - A panicking task is logged and isolated; the worker survives

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// A deferred unit of work. Consumed exactly once.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Task>,
    worker_count: usize,
    stopping: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    /// Signalled when a task is queued or the pool is stopping.
    task_ready: Condvar,
    /// Signalled when a task is dequeued, for callers blocked in `submit`.
    queue_room: Condvar,
    max_queue: usize,
    max_workers: usize,
    backpressure_timeout: Duration,
}

/// Fixed base of worker threads plus lazy growth up to a cap.
///
/// `submit` never blocks longer than the configured backpressure timeout.
pub struct WorkerPool {
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Construct a pool with `base_workers` threads started eagerly.
    ///
    /// `max_workers` caps dynamic growth and is clamped to at least
    /// `base_workers`; `max_queue` bounds the task backlog.
    pub fn new(
        base_workers: usize,
        max_queue: usize,
        max_workers: usize,
        backpressure_timeout: Duration,
    ) -> Self {
        let base_workers = base_workers.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                worker_count: base_workers,
                stopping: false,
            }),
            task_ready: Condvar::new(),
            queue_room: Condvar::new(),
            max_queue: max_queue.max(1),
            max_workers: max_workers.max(base_workers),
            backpressure_timeout,
        });

        let mut handles = Vec::with_capacity(base_workers);
        for id in 0..base_workers {
            handles.push(spawn_worker(Arc::clone(&shared), id));
        }

        tracing::info!(
            base_workers,
            max_queue = shared.max_queue,
            max_workers = shared.max_workers,
            timeout_ms = backpressure_timeout.as_millis() as u64,
            "Worker pool started"
        );

        Self {
            shared,
            handles: Mutex::new(handles),
        }
    }

    /// Submit a task. Returns false when the pool is saturated past the
    /// backpressure timeout, or already stopping.
    pub fn submit<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let task: Task = Box::new(task);
        let mut state = self.shared.state.lock().expect("worker pool mutex poisoned");
        if state.stopping {
            return false;
        }

        if state.queue.len() < self.shared.max_queue {
            state.queue.push_back(task);
            self.shared.task_ready.notify_one();
            return true;
        }

        if state.worker_count < self.shared.max_workers {
            // Queue is full but there is headroom: grow by one worker and
            // accept the task anyway.
            let id = state.worker_count;
            state.worker_count += 1;
            state.queue.push_back(task);
            drop(state);

            let handle = spawn_worker(Arc::clone(&self.shared), id);
            self.handles
                .lock()
                .expect("worker pool mutex poisoned")
                .push(handle);
            self.shared.task_ready.notify_one();
            tracing::debug!(worker_id = id, "Worker pool grew under load");
            return true;
        }

        // Full queue, cap reached: wait a bounded time for room.
        let (mut state, timed_out) = self
            .shared
            .queue_room
            .wait_timeout_while(state, self.shared.backpressure_timeout, |s| {
                !s.stopping && s.queue.len() >= self.shared.max_queue
            })
            .expect("worker pool mutex poisoned");
        if state.stopping {
            tracing::debug!("Task rejected: pool is stopping");
            return false;
        }
        if timed_out.timed_out() {
            tracing::warn!(
                timeout_ms = self.shared.backpressure_timeout.as_millis() as u64,
                "Task rejected: pool saturated past backpressure timeout"
            );
            return false;
        }
        state.queue.push_back(task);
        self.shared.task_ready.notify_one();
        true
    }

    /// Current number of worker threads (base plus any dynamic growth).
    pub fn worker_count(&self) -> usize {
        self.shared
            .state
            .lock()
            .expect("worker pool mutex poisoned")
            .worker_count
    }

    /// Stop the pool: queued tasks are drained, then every worker thread is
    /// joined. Safe to call more than once.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock().expect("worker pool mutex poisoned");
            if state.stopping {
                return;
            }
            state.stopping = true;
        }
        self.shared.task_ready.notify_all();
        self.shared.queue_room.notify_all();

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().expect("worker pool mutex poisoned");
            guard.drain(..).collect()
        };
        for handle in handles {
            if handle.join().is_err() {
                // Worker bodies isolate task panics, so this is unexpected.
                tracing::error!("Worker thread terminated abnormally");
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker(shared: Arc<Shared>, id: usize) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name(format!("hearth-worker-{id}"))
        .spawn(move || worker_loop(shared, id))
        .expect("failed to spawn worker thread")
}

fn worker_loop(shared: Arc<Shared>, id: usize) {
    loop {
        let task = {
            let mut state = shared.state.lock().expect("worker pool mutex poisoned");
            loop {
                if let Some(task) = state.queue.pop_front() {
                    shared.queue_room.notify_one();
                    break task;
                }
                if state.stopping {
                    tracing::trace!(worker_id = id, "Worker exiting");
                    return;
                }
                state = shared
                    .task_ready
                    .wait(state)
                    .expect("worker pool mutex poisoned");
            }
        };

        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            tracing::error!(worker_id = id, "Task panicked; worker continues");
        }
    }
}
