//! A single pipeline stage, prepared from a `command` AST node.

use std::sync::Arc;

use crate::ast::CommandNode;
use crate::commands::{Command, DecoratorBinding, ExecutionContext};
use crate::error::{red_error_line, CommandError, ShellError};
use crate::io::{BoxRead, MemReader, MemWriter, MultiWriter, NullifyWriter, SignalReader, SyncLinesReader};
use crate::paths;

use super::token::Token;

/// The command slot: resolved eagerly when the name token is static,
/// otherwise carried as a token until execution time.
enum CommandSlot {
    Resolved(Arc<dyn Command>),
    Deferred(Token),
}

/// A redirect destination: a statically resolved path, or a token deferred
/// to execution time.
enum RedirectTarget {
    Path(String),
    Deferred(Token),
}

impl RedirectTarget {
    fn from_node(node: &crate::ast::TokenNode) -> Self {
        let token = Token::new(node.clone());
        match token.maybe_static() {
            Some(path) => RedirectTarget::Path(path),
            None => RedirectTarget::Deferred(token),
        }
    }

    async fn resolve(&self, ctx: &ExecutionContext) -> Result<String, ShellError> {
        match self {
            RedirectTarget::Path(path) => Ok(path.clone()),
            RedirectTarget::Deferred(token) => token.resolve(ctx).await,
        }
    }
}

/// One stage of a pipeline: built once from the AST, bound to a context,
/// executed exactly once.
pub struct PreparedCommand {
    command: CommandSlot,
    args: Vec<Token>,
    input_redirect: Option<RedirectTarget>,
    output_redirects: Vec<RedirectTarget>,
    ctx: Option<ExecutionContext>,
}

impl PreparedCommand {
    /// Build from a `command` node. The first token is the command name; if
    /// it resolves statically the provider lookup happens now, and an
    /// unknown name is fatal to the dispatch. A dynamic name defers lookup
    /// to execution time.
    pub async fn build(ctx: &ExecutionContext, node: &CommandNode) -> Result<Self, ShellError> {
        let mut tokens = node.tokens.iter();
        let name_token = Token::new(tokens.next().ok_or(ShellError::EmptyCommand)?.clone());

        let command = match name_token.maybe_static() {
            Some(name) => match ctx.provider.lookup(&name, ctx).await {
                Some(command) => CommandSlot::Resolved(command),
                None => {
                    return Err(ShellError::UnknownCommand {
                        name,
                        span: name_token.span(),
                    })
                }
            },
            None => CommandSlot::Deferred(name_token),
        };

        Ok(Self {
            command,
            args: tokens.map(|node| Token::new(node.clone())).collect(),
            input_redirect: node.input_redirect.as_ref().map(RedirectTarget::from_node),
            output_redirects: node
                .output_redirects
                .iter()
                .map(RedirectTarget::from_node)
                .collect(),
            ctx: None,
        })
    }

    /// Late-bind the stage context. Must happen before [`execute`].
    ///
    /// [`execute`]: PreparedCommand::execute
    pub fn bind(&mut self, ctx: ExecutionContext) {
        self.ctx = Some(ctx);
    }

    /// Run the stage to completion and return its exit code.
    ///
    /// Failures of the command body are contained here: they become exit
    /// codes and error-stream text. The returned `Err` is reserved for
    /// dispatch-fatal conditions (deferred lookup misses, unbound stage,
    /// unregistered argument scheme). The stage output is closed and
    /// redirect buffers flushed on every path that reaches the body.
    pub async fn execute(self) -> Result<i32, ShellError> {
        let Self {
            command,
            args,
            input_redirect,
            output_redirects,
            ctx,
        } = self;
        let Some(mut ctx) = ctx else {
            return Err(ShellError::Unbound);
        };

        // 1. A dynamic name resolves now; absence is still fatal.
        let command: Arc<dyn Command> = match command {
            CommandSlot::Resolved(command) => command,
            CommandSlot::Deferred(token) => {
                let name = token.resolve(&ctx).await?;
                tracing::debug!(name = %name, "deferred command lookup");
                ctx.provider
                    .lookup(&name, &ctx)
                    .await
                    .ok_or(ShellError::UnknownCommand {
                        name,
                        span: token.span(),
                    })?
            }
        };

        // 2. Arguments resolve in order; each may run sub-pipelines.
        let mut resolved_args = Vec::with_capacity(args.len());
        for token in &args {
            resolved_args.push(token.resolve(&ctx).await?);
        }

        let base_in = ctx.take_stdin();
        let base_out = ctx.take_stdout();

        // 3. Input: redirect replaces the inherited stream with the target
        // file's contents; then the signal race and optional line sync.
        let mut input: BoxRead = base_in.into_stream();
        if let Some(target) = &input_redirect {
            let dest = target.resolve(&ctx).await?;
            let path = paths::resolve_relative(&ctx.vars, &dest);
            match ctx.filesystem.read(&path).await {
                Ok(bytes) => input = Box::new(MemReader::new(bytes)),
                Err(err) => {
                    ctx.stderr
                        .write(&red_error_line(command.name(), &format!("{dest}: {err}")));
                    let mut out = base_out;
                    crate::io::ChunkWrite::close(&mut out).await.ok();
                    return Ok(1);
                }
            }
        }
        input = Box::new(SignalReader::new(input, ctx.signal.subscribe()));
        if command.input_flags().sync_lines {
            input = Box::new(SyncLinesReader::new(input));
        }

        // 4. Output: with redirects, every write fans out to one in-memory
        // writer per target and the original sink sees only the close.
        let mut redirect_writers: Vec<MemWriter> = Vec::new();
        let out: crate::io::BoxWrite = if output_redirects.is_empty() {
            base_out
        } else {
            let mut delegates: Vec<crate::io::BoxWrite> =
                Vec::with_capacity(output_redirects.len() + 1);
            for _ in &output_redirects {
                let writer = MemWriter::new();
                redirect_writers.push(writer.clone());
                delegates.push(Box::new(writer));
            }
            delegates.push(Box::new(NullifyWriter::new(base_out)));
            Box::new(MultiWriter::new(delegates))
        };

        // 5. Derived per-command context.
        let mut cmd_ctx = ctx
            .derive()
            .stdin(input)
            .stdout(out)
            .command_name(command.name())
            .args(resolved_args)
            .build();

        // 6. Argument processing may invalidate the invocation: the body is
        // skipped, exit forced to -1, no error text.
        if let Some(spec) = command.arg_spec() {
            let parser = ctx.registries.argparser(&spec.scheme).ok_or_else(|| {
                ShellError::UnknownArgScheme {
                    scheme: spec.scheme.clone(),
                    command: command.name().to_string(),
                }
            })?;
            parser.process(&mut cmd_ctx, spec);
        }

        if cmd_ctx.exec_state.valid {
            // 7. Decorators wrap in declared order: last declared outermost.
            let mut bindings: Vec<DecoratorBinding> = Vec::new();
            for spec in command.decorators().iter().rev() {
                match ctx.registries.decorator(&spec.id) {
                    Some(decorator) => bindings.push(DecoratorBinding {
                        decorator,
                        params: spec.params.clone(),
                    }),
                    None => {
                        tracing::warn!(id = %spec.id, command = command.name(), "unregistered decorator skipped");
                    }
                }
            }

            // 8. Invoke and map the outcome to an exit code.
            match crate::commands::run_decorated(command.as_ref(), &bindings, &mut cmd_ctx).await
            {
                Ok(()) => {}
                Err(CommandError::Exit(code)) => cmd_ctx.locals.exit = code,
                Err(err) if err.is_interrupt() => cmd_ctx.locals.exit = 130,
                Err(CommandError::Coded {
                    message, exit_code, ..
                }) => {
                    cmd_ctx
                        .stderr
                        .write(&red_error_line(command.name(), &message));
                    cmd_ctx.locals.exit = exit_code;
                }
                Err(err) => {
                    cmd_ctx
                        .stderr
                        .write(&red_error_line(command.name(), &err.to_string()));
                    cmd_ctx.locals.exit = -1;
                }
            }
        } else {
            cmd_ctx.locals.exit = -1;
        }

        // 9. Close the output unconditionally — downstream EOF.
        crate::io::ChunkWrite::close(&mut cmd_ctx.stdout).await.ok();

        // 10. Flush redirect buffers to their destinations, in order.
        for (target, writer) in output_redirects.iter().zip(redirect_writers) {
            let dest = target.resolve(&ctx).await?;
            let path = paths::resolve_relative(&ctx.vars, &dest);
            if let Err(err) = ctx.filesystem.write(&path, &writer.snapshot()).await {
                ctx.stderr
                    .write(&red_error_line(command.name(), &format!("{dest}: {err}")));
                if cmd_ctx.locals.exit == 0 {
                    cmd_ctx.locals.exit = 1;
                }
            }
        }

        Ok(cmd_ctx.locals.exit)
    }
}
