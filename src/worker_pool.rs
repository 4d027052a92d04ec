//! C4 — a bounded-concurrency task executor with a "wait until a worker is idle" admission
//! primitive.
//!
//! A FIFO task deque behind a mutex and condvar; a second condvar gates admission on the count of
//! currently-executing tasks, so a producer can block until a worker goes idle rather than until
//! any particular task finishes. Drop sets a shutdown flag, wakes every waiter, and joins all
//! threads.

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Task = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

struct Shared {
    queue: Mutex<VecDeque<Task>>,
    queue_cv: Condvar,
    active: Mutex<usize>,
    vacant_cv: Condvar,
    shutdown: Mutex<bool>,
}

/// A handle to a submitted task's eventual result.
pub(crate) struct JobHandle {
    rx: Receiver<anyhow::Result<()>>,
}

impl JobHandle {
    /// Blocks until the task completes, returning its result (or a disconnection error if the
    /// pool was dropped before running it).
    pub(crate) fn join(self) -> anyhow::Result<()> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(anyhow::anyhow!("worker pool dropped before task ran")))
    }

    /// Non-blocking: `Some(result)` if the task has finished, `None` if still pending.
    pub(crate) fn try_join(&self) -> Option<anyhow::Result<()>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(std::sync::mpsc::TryRecvError::Empty) => None,
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                Some(Err(anyhow::anyhow!("worker pool dropped before task ran")))
            }
        }
    }
}

/// A pool of `workers` OS threads sharing a FIFO task queue.
pub(crate) struct WorkerPool {
    shared: Arc<Shared>,
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers` long-lived OS threads (at least one).
    pub(crate) fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            queue_cv: Condvar::new(),
            active: Mutex::new(0),
            vacant_cv: Condvar::new(),
            shutdown: Mutex::new(false),
        });

        let mut threads = Vec::with_capacity(workers);
        for _ in 0..workers {
            let shared = Arc::clone(&shared);
            threads.push(std::thread::spawn(move || Self::worker_loop(shared)));
        }

        WorkerPool { shared, threads }
    }

    fn worker_loop(shared: Arc<Shared>) {
        loop {
            let task = {
                let mut queue = shared.queue.lock().unwrap();
                loop {
                    if let Some(task) = queue.pop_front() {
                        break Some(task);
                    }
                    if *shared.shutdown.lock().unwrap() {
                        break None;
                    }
                    queue = shared.queue_cv.wait(queue).unwrap();
                }
            };

            let Some(task) = task else { break };

            {
                let mut active = shared.active.lock().unwrap();
                *active += 1;
            }

            let _ = task();

            {
                let mut active = shared.active.lock().unwrap();
                *active -= 1;
            }
            shared.vacant_cv.notify_all();
        }
    }

    /// Enqueues `job`, returning a handle that resolves with its success or captured failure.
    pub(crate) fn submit<F>(&self, job: F) -> JobHandle
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let (tx, rx) = channel();
        let task: Task = Box::new(move || {
            let result = job();
            let _ = tx.send(result);
            Ok(())
        });

        let mut queue = self.shared.queue.lock().unwrap();
        queue.push_back(task);
        self.shared.queue_cv.notify_one();
        drop(queue);

        JobHandle { rx }
    }

    /// Blocks until at least one worker is idle (fewer than `workers` tasks currently executing).
    /// The sole admission primitive the split stage uses to avoid prefetching chunks faster than
    /// they can be sorted.
    pub(crate) fn wait_for_first_vacant(&self, workers: usize) {
        let active = self.shared.active.lock().unwrap();
        let _guard = self
            .shared
            .vacant_cv
            .wait_while(active, |active| *active >= workers)
            .unwrap();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        *self.shared.shutdown.lock().unwrap() = true;
        self.shared.queue_cv.notify_all();
        for thread in self.threads.drain(..) {
            let _ = thread.join();
        }
    }
}
