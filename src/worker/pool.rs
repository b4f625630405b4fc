use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Statistics from the worker pool.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub jobs_submitted: usize,
    pub jobs_completed: usize,
    pub jobs_panicked: usize,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    panicked: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            jobs_submitted: self.submitted.load(Ordering::SeqCst),
            jobs_completed: self.completed.load(Ordering::SeqCst),
            jobs_panicked: self.panicked.load(Ordering::SeqCst),
        }
    }
}

/// Fixed set of threads draining a job queue.
///
/// `submit` never blocks. `shutdown` stops intake, lets the workers finish
/// every job already queued, and joins them.
pub struct WorkerPool {
    jobs: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl WorkerPool {
    pub fn new(name: &str, size: usize) -> std::io::Result<Self> {
        let (tx, rx) = channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        let mut workers = Vec::with_capacity(size);
        for index in 0..size.max(1) {
            let rx = Arc::clone(&rx);
            let counters = Arc::clone(&counters);
            let handle = thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || run(rx, counters))?;
            workers.push(handle);
        }

        Ok(Self {
            jobs: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            counters,
        })
    }

    /// Queue a job. Returns false once the pool is shut down.
    pub fn submit<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(jobs) = self.jobs.lock() else {
            return false;
        };
        let Some(tx) = jobs.as_ref() else {
            return false;
        };
        self.counters.submitted.fetch_add(1, Ordering::SeqCst);
        if tx.send(Box::new(job)).is_err() {
            self.counters.submitted.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Block until every submitted job has finished or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let stats = self.counters.snapshot();
            if stats.jobs_completed + stats.jobs_panicked >= stats.jobs_submitted {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.counters.snapshot()
    }

    /// Stop accepting jobs, drain the queue, and join every worker.
    pub fn shutdown(&self) -> WorkerStats {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.take();
        }
        let handles = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            let _ = handle.join();
        }
        self.counters.snapshot()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Disconnect so idle workers exit; don't join on drop.
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.take();
        }
    }
}

fn run(rx: Arc<Mutex<Receiver<Job>>>, counters: Arc<Counters>) {
    loop {
        let next = match rx.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => return,
        };
        let Ok(job) = next else {
            return;
        };
        match catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => counters.completed.fetch_add(1, Ordering::SeqCst),
            Err(_) => {
                tracing::error!("background job panicked");
                counters.panicked.fetch_add(1, Ordering::SeqCst)
            }
        };
    }
}
