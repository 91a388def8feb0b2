//! Bounded worker pool over a FIFO job queue.
//!
//! Each worker takes one job at a time from the front of the queue and runs
//! it to completion. Jobs share nothing but the queue; every job gets its
//! own cancel handle.

use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use super::types::{JobEntry, JobOutcome};
use crate::context::CancelHandle;

/// Runs one job. Implemented by the orchestrator's job processor.
pub trait JobHandler: Send + Sync {
    fn process(&self, entry: &JobEntry, cancel: &CancelHandle) -> JobOutcome;
}

/// Handle returned by [`WorkerPool::submit`].
#[derive(Debug, Clone)]
pub struct JobTicket {
    pub id: String,
    cancel: CancelHandle,
}

impl JobTicket {
    /// Request cancellation. A queued job is reported as cancelled without
    /// running; a running job stops at its next check.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }
}

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<(JobEntry, CancelHandle)>,
    closing: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<QueueState>,
    available: Condvar,
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    results: Receiver<JobOutcome>,
}

impl WorkerPool {
    /// Start `workers` threads (at least one) feeding `handler`.
    pub fn new(workers: usize, handler: Arc<dyn JobHandler>) -> io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let (tx, results) = mpsc::channel();
        let count = workers.max(1);

        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let shared = Arc::clone(&shared);
            let handler = Arc::clone(&handler);
            let tx = tx.clone();
            let handle = thread::Builder::new()
                .name(format!("lessonclip-worker-{}", index))
                .spawn(move || worker_loop(index, &shared, handler.as_ref(), &tx))?;
            handles.push(handle);
        }
        tracing::info!("Started worker pool with {} worker(s)", count);

        Ok(Self {
            shared,
            workers: handles,
            results,
        })
    }

    /// Queue a job at the back of the FIFO.
    pub fn submit(&self, entry: JobEntry) -> JobTicket {
        let cancel = CancelHandle::new();
        let ticket = JobTicket {
            id: entry.id.clone(),
            cancel: cancel.clone(),
        };
        {
            let mut state = self.shared.state.lock();
            tracing::debug!("Queued job {} ({} waiting)", entry.id, state.jobs.len());
            state.jobs.push_back((entry, cancel));
        }
        self.shared.available.notify_one();
        ticket
    }

    /// Jobs queued but not yet taken by a worker.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().jobs.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Outcomes, in completion order.
    pub fn results(&self) -> &Receiver<JobOutcome> {
        &self.results
    }

    /// Let the workers drain the queue, join them, and return the outcomes
    /// not yet received through [`results`](Self::results).
    pub fn shutdown(mut self) -> Vec<JobOutcome> {
        self.close_and_join();
        self.results.try_iter().collect()
    }

    fn close_and_join(&mut self) {
        self.shared.state.lock().closing = true;
        self.shared.available.notify_all();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.close_and_join();
        }
    }
}

fn worker_loop(index: usize, shared: &Shared, handler: &dyn JobHandler, tx: &Sender<JobOutcome>) {
    loop {
        let (entry, cancel) = {
            let mut state = shared.state.lock();
            loop {
                if let Some(job) = state.jobs.pop_front() {
                    break job;
                }
                if state.closing {
                    tracing::debug!("Worker {} exiting", index);
                    return;
                }
                shared.available.wait(&mut state);
            }
        };

        let outcome = if cancel.is_cancelled() {
            tracing::info!("Job {} cancelled before start", entry.id);
            JobOutcome::cancelled(&entry.id)
        } else {
            tracing::info!("Worker {} running job {} ({})", index, entry.id, entry.name);
            panic::catch_unwind(AssertUnwindSafe(|| handler.process(&entry, &cancel)))
                .unwrap_or_else(|_| {
                    tracing::error!("Job {} panicked", entry.id);
                    JobOutcome::failed(&entry.id, "job panicked")
                })
        };

        if tx.send(outcome).is_err() {
            tracing::debug!("Result receiver dropped; discarding outcome of {}", entry.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::{EpisodeJob, JobSpec, JobStatus};
    use std::path::PathBuf;
    use std::time::Duration;

    fn entry(id: &str) -> JobEntry {
        JobEntry::new(
            id,
            id,
            JobSpec::Episode(EpisodeJob {
                clips: Vec::new(),
                episode_output: PathBuf::from("/out/e.mp4"),
                shorts: Vec::new(),
                shorts_output_dir: PathBuf::from("/out"),
                shorts_prefix: "s".to_string(),
            }),
        )
    }

    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
    }

    impl JobHandler for RecordingHandler {
        fn process(&self, entry: &JobEntry, _cancel: &CancelHandle) -> JobOutcome {
            self.seen.lock().push(entry.id.clone());
            JobOutcome::complete(&entry.id, Vec::new(), Vec::new(), Vec::new())
        }
    }

    /// Blocks on job "first" until the test opens the gate.
    struct GateHandler {
        gate: std::sync::Mutex<mpsc::Receiver<()>>,
        seen: Mutex<Vec<String>>,
    }

    impl JobHandler for GateHandler {
        fn process(&self, entry: &JobEntry, _cancel: &CancelHandle) -> JobOutcome {
            if entry.id == "first" {
                let _ = self.gate.lock().unwrap().recv();
            }
            self.seen.lock().push(entry.id.clone());
            JobOutcome::complete(&entry.id, Vec::new(), Vec::new(), Vec::new())
        }
    }

    #[test]
    fn single_worker_runs_jobs_in_fifo_order() {
        let handler = Arc::new(RecordingHandler::default());
        let pool = WorkerPool::new(1, handler.clone()).unwrap();
        for id in ["a", "b", "c"] {
            pool.submit(entry(id));
        }
        let outcomes = pool.shutdown();

        let ids: Vec<_> = outcomes.iter().map(|o| o.job_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(*handler.seen.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn cancelled_queued_job_never_runs() {
        let (open, gate) = mpsc::channel();
        let handler = Arc::new(GateHandler {
            gate: std::sync::Mutex::new(gate),
            seen: Mutex::new(Vec::new()),
        });
        let pool = WorkerPool::new(1, handler.clone()).unwrap();

        pool.submit(entry("first"));
        let second = pool.submit(entry("second"));
        second.cancel();
        open.send(()).unwrap();

        let outcomes = pool.shutdown();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[1].job_id, "second");
        assert_eq!(outcomes[1].status, JobStatus::Cancelled);
        assert_eq!(*handler.seen.lock(), vec!["first"]);
    }

    #[test]
    fn busy_worker_leaves_jobs_pending() {
        let (open, gate) = mpsc::channel();
        let handler = Arc::new(GateHandler {
            gate: std::sync::Mutex::new(gate),
            seen: Mutex::new(Vec::new()),
        });
        let pool = WorkerPool::new(1, handler.clone()).unwrap();

        pool.submit(entry("first"));
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while pool.pending() > 0 {
            assert!(std::time::Instant::now() < deadline, "worker never took the job");
            std::thread::sleep(Duration::from_millis(5));
        }

        pool.submit(entry("second"));
        pool.submit(entry("third"));
        assert_eq!(pool.pending(), 2);

        open.send(()).unwrap();
        assert_eq!(pool.shutdown().len(), 3);
        assert_eq!(*handler.seen.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn several_workers_process_every_job() {
        let handler = Arc::new(RecordingHandler::default());
        let pool = WorkerPool::new(3, handler.clone()).unwrap();
        assert_eq!(pool.worker_count(), 3);
        for i in 0..10 {
            pool.submit(entry(&format!("job-{}", i)));
        }

        let first = pool.results().recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(first.is_success());
        let rest = pool.shutdown();
        assert_eq!(rest.len(), 9);
        assert_eq!(handler.seen.lock().len(), 10);
    }

    #[test]
    fn zero_workers_still_starts_one() {
        let pool = WorkerPool::new(0, Arc::new(RecordingHandler::default())).unwrap();
        assert_eq!(pool.worker_count(), 1);
        pool.submit(entry("x"));
        assert_eq!(pool.shutdown().len(), 1);
    }
}
