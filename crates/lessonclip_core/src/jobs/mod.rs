//! Jobs and the worker pool that runs them.
//!
//! This module provides:
//! - `JobSpec`: what to build (one expression, or a whole episode)
//! - `JobEntry` / `JobOutcome`: a queued job and its result
//! - `WorkerPool`: bounded pool of workers over a FIFO queue

mod pool;
mod types;

pub use pool::{JobHandler, JobTicket, WorkerPool};
pub use types::{
    EpisodeJob, ExpressionJob, JobEntry, JobOutcome, JobSpec, JobStatus, ShortFormSpec, SlideSpec,
};
