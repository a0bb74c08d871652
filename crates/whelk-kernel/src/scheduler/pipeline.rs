//! Pipeline execution: concurrent stages connected by pipes.

use tokio::task::JoinHandle;

use crate::ast::PipelineNode;
use crate::commands::ExecutionContext;
use crate::error::ShellError;

use super::command::PreparedCommand;
use super::coupler::Coupler;
use super::pipe::pipe_default;

/// Exit codes of every stage, in stage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStatus {
    /// One code per stage, left to right.
    pub exit_codes: Vec<i32>,
}

impl PipelineStatus {
    /// The last stage's exit code (0 for an empty pipeline).
    pub fn last_exit_code(&self) -> i32 {
        self.exit_codes.last().copied().unwrap_or(0)
    }

    /// True if every stage exited zero.
    pub fn success(&self) -> bool {
        self.exit_codes.iter().all(|&code| code == 0)
    }
}

/// An executable pipeline: one prepared command per stage.
pub struct Pipeline {
    commands: Vec<PreparedCommand>,
}

impl Pipeline {
    /// Prepare every command of a `pipeline` node, left to right. Static
    /// name lookups happen here, so an unknown command aborts the dispatch
    /// before any stage starts.
    pub async fn build(ctx: &ExecutionContext, node: &PipelineNode) -> Result<Self, ShellError> {
        let mut commands = Vec::with_capacity(node.commands.len());
        for command_node in &node.commands {
            commands.push(PreparedCommand::build(ctx, command_node).await?);
        }
        Ok(Self { commands })
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True for a pipeline with no stages.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run every stage concurrently and wait for the tail output to drain.
    ///
    /// Stage 0 inherits the dispatch's stdin; each later stage reads the
    /// pipe fed by its predecessor; the last stage's pipe drains through a
    /// [`Coupler`] into the dispatch's stdout. Contexts bind forward, tasks
    /// launch in reverse so no producer can fill a pipe before its consumer
    /// exists. A failing stage neither cancels siblings nor is aggregated
    /// into a pipeline-level error; completion waits for every stage and
    /// for the coupler.
    pub fn execute(
        mut self,
        mut ctx: ExecutionContext,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<PipelineStatus, ShellError>> + Send>,
    > {
        // Boxed as a concrete `Send` future: command substitution re-enters
        // the engine (resolve -> execute -> resolve), and an `async fn` here
        // would leave the recursion an opaque type whose `Send`-ness rustc
        // cannot verify. Boxing gives the recursion boundary a concrete type.
        Box::pin(async move {
        if self.commands.is_empty() {
            return Ok(PipelineStatus { exit_codes: vec![] });
        }

        let stage_count = self.commands.len();
        tracing::debug!(stages = stage_count, "pipeline start");

        let mut next_in = ctx.take_stdin().into_stream();
        for command in self.commands.iter_mut() {
            let (pipe_writer, pipe_reader) = pipe_default();
            let stage_ctx = ctx
                .derive()
                .stdin(next_in)
                .stdout(Box::new(pipe_writer))
                .build();
            command.bind(stage_ctx);
            next_in = Box::new(pipe_reader);
        }

        let coupler = Coupler::spawn(next_in, ctx.take_stdout());

        let mut handles: Vec<JoinHandle<Result<i32, ShellError>>> =
            Vec::with_capacity(stage_count);
        for command in self.commands.into_iter().rev() {
            handles.push(tokio::spawn(command.execute()));
        }

        // Handles are in reverse stage order; collect then flip back.
        let mut exit_codes = Vec::with_capacity(stage_count);
        let mut first_error: Option<ShellError> = None;
        for result in futures::future::join_all(handles).await {
            match result {
                Ok(Ok(code)) => exit_codes.push(code),
                Ok(Err(err)) => {
                    tracing::debug!(error = %err, "stage failed");
                    exit_codes.push(-1);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(join_err) => {
                    exit_codes.push(-1);
                    if first_error.is_none() {
                        first_error = Some(ShellError::StagePanic(join_err.to_string()));
                    }
                }
            }
        }
        exit_codes.reverse();

        if let Err(err) = coupler.wait().await {
            if first_error.is_none() {
                first_error = Some(err.into());
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                tracing::debug!(codes = ?exit_codes, "pipeline done");
                Ok(PipelineStatus { exit_codes })
            }
        }
        })
    }
}
