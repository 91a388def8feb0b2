//! Duration-bounded batching of finished segments.
//!
//! Packing is a single greedy pass in input order: a segment is included
//! when it still fits in the budget, otherwise deferred, and the pass moves
//! on (a later, shorter segment may still fit).

use crate::models::{CompositionSegment, MediaAsset};

/// Anything with a playable duration.
pub trait Timed {
    fn duration_seconds(&self) -> f64;
}

impl Timed for CompositionSegment {
    fn duration_seconds(&self) -> f64 {
        CompositionSegment::duration_seconds(self)
    }
}

impl Timed for MediaAsset {
    fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

impl Timed for f64 {
    fn duration_seconds(&self) -> f64 {
        *self
    }
}

/// One greedy pass over the inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan<T> {
    /// Included segments, in input order.
    pub included: Vec<T>,
    pub total_duration_seconds: f64,
    /// Segments that did not fit, in input order.
    pub deferred: Vec<T>,
}

impl<T> BatchPlan<T> {
    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}

/// All batches needed for a list, plus what can never fit.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSchedule<T> {
    pub batches: Vec<BatchPlan<T>>,
    /// Segments longer than the budget on their own.
    pub oversized: Vec<T>,
}

/// Greedy single pass: include while `running + duration <= budget`.
pub fn pack<T: Timed>(segments: Vec<T>, budget_seconds: f64) -> BatchPlan<T> {
    let mut included = Vec::new();
    let mut deferred = Vec::new();
    let mut total = 0.0;

    for segment in segments {
        let duration = segment.duration_seconds();
        if total + duration <= budget_seconds {
            total += duration;
            included.push(segment);
        } else {
            deferred.push(segment);
        }
    }

    BatchPlan {
        included,
        total_duration_seconds: total,
        deferred,
    }
}

/// Pack repeatedly until every segment is in a batch or reported oversized.
pub fn schedule<T: Timed>(segments: Vec<T>, budget_seconds: f64) -> BatchSchedule<T> {
    let (mut remaining, oversized): (Vec<T>, Vec<T>) = segments
        .into_iter()
        .partition(|s| s.duration_seconds() <= budget_seconds);

    // Every remaining segment fits on its own, so each pass includes at
    // least the first one
    let mut batches = Vec::new();
    while !remaining.is_empty() {
        let mut plan = pack(remaining, budget_seconds);
        remaining = std::mem::take(&mut plan.deferred);
        batches.push(plan);
    }
    if !oversized.is_empty() {
        tracing::warn!(
            "{} segment(s) exceed the {:.1}s batch budget on their own",
            oversized.len(),
            budget_seconds
        );
    }

    BatchSchedule { batches, oversized }
}
