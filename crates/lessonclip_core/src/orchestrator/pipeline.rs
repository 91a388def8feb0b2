//! Pipeline runner that executes steps in sequence.

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Pipeline that runs a sequence of steps.
///
/// The pipeline executes steps in order, running validation before
/// and after each step. Cancellation (through the job's cancel handle) is
/// checked at every step boundary.
pub struct Pipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run every step's `validate_input` without executing anything.
    pub fn validate(&self, ctx: &Context) -> PipelineResult<()> {
        for step in &self.steps {
            step.validate_input(ctx)
                .map_err(|e| PipelineError::step_failed(&ctx.job_name, step.name(), e))?;
        }
        Ok(())
    }

    /// Run the pipeline with the given context and state.
    ///
    /// All inputs are validated up front, then each step runs in order:
    /// 1. Check for cancellation
    /// 2. Run `execute`
    /// 3. Run `validate_output` (if execute returned Success)
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        ctx.logger().debug("Validating job inputs");
        if let Err(e) = self.validate(ctx) {
            ctx.logger().error(&format!("Input validation failed: {}", e));
            return Err(e);
        }

        let total_steps = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            let step_name = step.name();

            if ctx.job.is_cancelled() {
                ctx.logger()
                    .warn(&format!("Pipeline cancelled before step '{}'", step_name));
                return Err(PipelineError::cancelled(&ctx.job_name));
            }

            ctx.logger().phase(step_name);

            let percent = ((i as f64 / total_steps as f64) * 100.0) as u32;
            ctx.report_progress(step_name, percent, step.description());

            ctx.logger().debug(&format!("Executing '{}'", step_name));
            let outcome = match step.execute(ctx, state) {
                Ok(outcome) => outcome,
                Err(e) => return Err(self.fail(ctx, step_name, e)),
            };

            match outcome {
                StepOutcome::Success => {
                    ctx.logger()
                        .debug(&format!("Validating output for '{}'", step_name));
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger()
                            .error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
                    }

                    ctx.logger().success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    let message = format!("{} skipped: {}", step_name, reason);
                    if step.is_optional() {
                        ctx.logger().info(&message);
                    } else {
                        ctx.logger().warn(&message);
                    }
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        ctx.report_progress("Complete", 100, "Pipeline finished");
        ctx.logger().success("Pipeline completed successfully");

        Ok(result)
    }

    fn fail(&self, ctx: &Context, step_name: &str, error: StepError) -> PipelineError {
        if error.is_cancelled() {
            ctx.logger()
                .warn(&format!("Pipeline cancelled during step '{}'", step_name));
            return PipelineError::cancelled(&ctx.job_name);
        }
        // Display carries the parameter dump of the assets involved
        ctx.logger().error(&format!("Execution failed: {}", error));
        PipelineError::step_failed(&ctx.job_name, step_name, error)
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all steps completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }

    /// Total number of steps that ran.
    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComposeError;
    use crate::orchestrator::test_support::test_pipeline_context;
    use crate::orchestrator::errors::StepResult;
    use crate::tools::scripted::ScriptedRunner;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            Ok(StepOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }
    }

    /// Cancels the job from inside its own execution.
    struct CancellingStep;

    impl PipelineStep for CancellingStep {
        fn name(&self) -> &str {
            "Cancelling"
        }

        fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
            ctx.job.cancel_handle().cancel();
            Ok(StepOutcome::Skipped("cancelled the job".to_string()))
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }
    }

    struct FailingStep {
        cancelled: bool,
    }

    impl PipelineStep for FailingStep {
        fn name(&self) -> &str {
            "Failing"
        }

        fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
            if self.cancelled {
                Err(ctx.job.cancelled().into())
            } else {
                Err(ComposeError::invalid_input("broken").into())
            }
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }
    }

    fn counting(name: &'static str, counter: &Arc<AtomicUsize>) -> CountingStep {
        CountingStep {
            name,
            execute_count: Arc::clone(counter),
        }
    }

    #[test]
    fn pipeline_builds_correctly() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(counting("Step1", &counter))
            .with_step(counting("Step2", &counter));

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn pipeline_runs_steps_and_reports_progress() {
        let (_dir, ctx) = test_pipeline_context(Arc::new(ScriptedRunner::new()));
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let ctx = ctx.with_progress_callback(Box::new(move |step, percent, _| {
            sink.lock().push((step.to_string(), percent));
        }));

        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(counting("A", &counter))
            .with_step(counting("B", &counter));
        let mut state = JobState::new("job");

        let result = pipeline.run(&ctx, &mut state).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(result.steps_completed, vec!["A", "B"]);
        assert!(result.all_completed());
        assert_eq!(
            *reports.lock(),
            vec![
                ("A".to_string(), 0),
                ("B".to_string(), 50),
                ("Complete".to_string(), 100)
            ]
        );
    }

    #[test]
    fn cancellation_stops_at_next_step() {
        let (_dir, ctx) = test_pipeline_context(Arc::new(ScriptedRunner::new()));
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(CancellingStep)
            .with_step(counting("Never", &counter));
        let mut state = JobState::new("job");

        let err = pipeline.run(&ctx, &mut state).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancellation_inside_a_step_is_reported_as_cancelled() {
        let (_dir, ctx) = test_pipeline_context(Arc::new(ScriptedRunner::new()));
        let pipeline = Pipeline::new().with_step(FailingStep { cancelled: true });
        let err = pipeline.run(&ctx, &mut JobState::new("job")).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn step_failure_names_the_step() {
        let (_dir, ctx) = test_pipeline_context(Arc::new(ScriptedRunner::new()));
        let pipeline = Pipeline::new().with_step(FailingStep { cancelled: false });
        let err = pipeline.run(&ctx, &mut JobState::new("job")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::StepFailed { ref step_name, .. } if step_name == "Failing"
        ));
        assert!(err.to_string().contains("broken"));
    }
}
