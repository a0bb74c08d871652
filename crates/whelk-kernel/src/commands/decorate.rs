//! Execute-function decorators.
//!
//! Decorators add cross-cutting behavior around a command body without
//! touching the command itself. Each decorator receives the rest of the
//! chain as a [`Next`] continuation; calling `next.run(ctx)` invokes the
//! inner decorators and finally the command's `execute`.
//!
//! The engine wraps in declared order: the last-declared decorator is the
//! outermost layer.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{red_error_line, CommandError};

use super::context::ExecutionContext;
use super::traits::Command;

/// A registered decorator plus the parameters the command declared for it.
pub struct DecoratorBinding {
    /// The decorator implementation.
    pub decorator: Arc<dyn Decorator>,
    /// Parameters from the command's [`DecoratorSpec`](super::DecoratorSpec).
    pub params: serde_json::Value,
}

/// A wrapper around a command's execute function.
#[async_trait]
pub trait Decorator: Send + Sync {
    /// Run with `next` standing in for the inner execute function.
    async fn around(
        &self,
        params: &serde_json::Value,
        next: Next<'_>,
        ctx: &mut ExecutionContext,
    ) -> Result<(), CommandError>;
}

/// Continuation through the remaining decorator chain to the command body.
pub struct Next<'a> {
    command: &'a dyn Command,
    rest: &'a [DecoratorBinding],
}

impl<'a> Next<'a> {
    /// Invoke the rest of the chain.
    pub async fn run(self, ctx: &mut ExecutionContext) -> Result<(), CommandError> {
        match self.rest.split_first() {
            None => self.command.execute(ctx).await,
            Some((binding, rest)) => {
                let next = Next {
                    command: self.command,
                    rest,
                };
                binding.decorator.around(&binding.params, next, ctx).await
            }
        }
    }
}

/// Run `command` through `bindings` (outermost first) down to its body.
pub async fn run_decorated(
    command: &dyn Command,
    bindings: &[DecoratorBinding],
    ctx: &mut ExecutionContext,
) -> Result<(), CommandError> {
    Next {
        command,
        rest: bindings,
    }
    .run(ctx)
    .await
}

/// The `errors` decorator: reports failures itself and suppresses the
/// engine's default red-line formatting.
///
/// Exit signals and interrupts pass through untouched; every other failure
/// is written to the error stream here, the exit code recorded in locals,
/// and `Ok` returned so the engine's own reporting never fires.
pub struct ErrorsDecorator;

#[async_trait]
impl Decorator for ErrorsDecorator {
    async fn around(
        &self,
        _params: &serde_json::Value,
        next: Next<'_>,
        ctx: &mut ExecutionContext,
    ) -> Result<(), CommandError> {
        match next.run(ctx).await {
            Ok(()) => Ok(()),
            Err(err @ CommandError::Exit(_)) => Err(err),
            Err(err) if err.is_interrupt() => Err(err),
            Err(err) => {
                let name = ctx.locals.command.clone().unwrap_or_default();
                ctx.stderr.write(&red_error_line(&name, &err.to_string()));
                ctx.locals.exit = match err {
                    CommandError::Coded { exit_code, .. } => exit_code,
                    _ => -1,
                };
                Ok(())
            }
        }
    }
}
