//! Per-job context passed explicitly into every engine call.
//!
//! There is no global "current job": the id, workspace, cancel flag,
//! logger, settings and tool runner all travel in a [`JobContext`].

mod cancel;
mod workspace;

pub use cancel::CancelHandle;
pub use workspace::JobWorkspace;

use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::encode::EncodeParameterResolver;
use crate::error::{ComposeError, ComposeResult};
use crate::logging::JobLogger;
use crate::tools::{ToolError, ToolInvocation, ToolOutput, ToolResult, ToolRunner};

pub struct JobContext {
    job_id: String,
    workspace: JobWorkspace,
    cancel: CancelHandle,
    logger: Arc<JobLogger>,
    settings: Arc<Settings>,
    runner: Arc<dyn ToolRunner>,
}

impl JobContext {
    /// Create the context and its workspace under `settings.paths.temp_root`.
    pub fn new(
        job_id: impl Into<String>,
        settings: Arc<Settings>,
        runner: Arc<dyn ToolRunner>,
        logger: Arc<JobLogger>,
        cancel: CancelHandle,
    ) -> ComposeResult<Self> {
        let job_id = job_id.into();
        let workspace = JobWorkspace::create(
            Path::new(&settings.paths.temp_root),
            &job_id,
            settings.workers.keep_temp,
        )
        .map_err(|e| ComposeError::io("creating job workspace", e))?;

        Ok(Self {
            job_id,
            workspace,
            cancel,
            logger,
            settings,
            runner,
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn workspace(&self) -> &JobWorkspace {
        &self.workspace
    }

    pub fn logger(&self) -> &JobLogger {
        &self.logger
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    pub fn resolver(&self) -> EncodeParameterResolver {
        EncodeParameterResolver::new(self.settings.encoding.clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check_cancelled(&self) -> ComposeResult<()> {
        if self.is_cancelled() {
            return Err(self.cancelled());
        }
        Ok(())
    }

    pub fn cancelled(&self) -> ComposeError {
        ComposeError::Cancelled {
            job_id: self.job_id.clone(),
        }
    }

    /// Run one tool, unless the job was cancelled.
    pub fn run(&self, invocation: &ToolInvocation) -> ToolResult<ToolOutput> {
        if self.is_cancelled() {
            return Err(ToolError::Cancelled {
                tool: invocation.tool,
            });
        }
        self.runner.run(invocation, &self.logger)
    }

    /// Map a tool failure into an engine error, keeping cancellation as such.
    pub fn tool_failure(
        &self,
        error: ToolError,
        kind: impl FnOnce(String) -> ComposeError,
    ) -> ComposeError {
        match error {
            ToolError::Cancelled { .. } => self.cancelled(),
            other => kind(other.to_string()),
        }
    }

    /// Remove (or keep, per settings) the workspace.
    pub fn finish(self) -> ComposeResult<()> {
        self.logger.flush();
        self.workspace
            .close()
            .map(|_| ())
            .map_err(|e| ComposeError::io("removing job workspace", e))
    }
}

/// Context over a fresh temp dir with default settings and `runner`.
#[cfg(test)]
pub(crate) fn test_context(
    runner: Arc<crate::tools::scripted::ScriptedRunner>,
) -> (tempfile::TempDir, JobContext) {
    test_context_with(runner, Settings::default())
}

#[cfg(test)]
pub(crate) fn test_context_with(
    runner: Arc<dyn ToolRunner>,
    mut settings: Settings,
) -> (tempfile::TempDir, JobContext) {
    use crate::logging::LogConfig;

    let dir = tempfile::tempdir().unwrap();
    settings.paths.temp_root = dir.path().join("tmp").to_string_lossy().to_string();
    settings.paths.logs_folder = dir.path().join("logs").to_string_lossy().to_string();
    let logger = JobLogger::new("test", dir.path().join("logs"), LogConfig::default(), None).unwrap();
    let ctx = JobContext::new(
        "test",
        Arc::new(settings),
        runner,
        Arc::new(logger),
        CancelHandle::new(),
    )
    .unwrap();
    (dir, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::scripted::ScriptedRunner;
    use crate::tools::Tool;

    #[test]
    fn cancellation_stops_tool_runs() {
        let runner = Arc::new(ScriptedRunner::new());
        let (_dir, ctx) = test_context(runner.clone());

        assert!(ctx.check_cancelled().is_ok());
        ctx.cancel_handle().cancel();

        let inv = ToolInvocation::new(Tool::Ffmpeg, vec!["out.mp4".to_string()]);
        let err = ctx.run(&inv).unwrap_err();
        assert!(matches!(err, ToolError::Cancelled { .. }));
        assert!(runner.calls().is_empty());

        let mapped = ctx.tool_failure(err, |m| ComposeError::invalid_input(m));
        assert!(mapped.is_cancelled());
        assert!(ctx.check_cancelled().unwrap_err().is_cancelled());
    }

    #[test]
    fn finish_removes_workspace() {
        let runner = Arc::new(ScriptedRunner::new());
        let (_dir, ctx) = test_context(runner);
        let ws = ctx.workspace().path().to_path_buf();
        assert!(ws.exists());
        ctx.finish().unwrap();
        assert!(!ws.exists());
    }
}
