//! Execution contexts.
//!
//! A context carries everything a pipeline stage needs: the shared variable
//! and environment stores, per-stage locals, the stage's streams, the
//! dispatch's signal channel, and the service handles (provider, filesystem,
//! parser, registries).
//!
//! Contexts are hierarchical by derivation, not by linkage: `derive()`
//! shallow-copies the shared handles and gives the child fresh locals and
//! whichever streams the caller supplies. The `vars` and `env` stores stay
//! shared by reference deliberately — a mutation from any stage is visible
//! to siblings and the parent.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::Parser;
use crate::io::{BoxRead, BoxWrite, CommandInput, DiscardWriter, ErrorSink, ErrorStream, NullReader};
use crate::signal::SignalChannel;
use crate::vars::{EnvStore, VarStore};
use crate::vfs::Filesystem;

use super::registry::Registries;
use super::traits::CommandProvider;

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// A boolean flag.
    Flag(bool),
    /// A string value.
    Text(String),
}

/// Per-scope values. Every derived context starts with a fresh copy except
/// for the working-directory snapshot, which is inherited.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    /// Working directory snapshot at derivation time.
    pub pwd: String,
    /// Name of the command bound to this context, if any.
    pub command: Option<String>,
    /// Raw resolved arguments.
    pub args: Vec<String>,
    /// Positional arguments after argument processing.
    pub positionals: Vec<String>,
    /// Named option values after argument processing.
    pub values: HashMap<String, ArgValue>,
    /// Recorded exit code.
    pub exit: i32,
}

impl Locals {
    /// Fresh locals for a child scope, keeping the pwd snapshot.
    pub fn child(&self) -> Self {
        Self {
            pwd: self.pwd.clone(),
            ..Default::default()
        }
    }
}

/// Command execution state set by argument processors.
#[derive(Debug, Clone)]
pub struct ExecState {
    /// False once an argument processor rejects the invocation.
    pub valid: bool,
}

impl Default for ExecState {
    fn default() -> Self {
        Self { valid: true }
    }
}

/// The context a pipeline stage (or the dispatch itself) runs against.
pub struct ExecutionContext {
    /// Shell variables, shared by reference across the session.
    pub vars: Arc<VarStore>,
    /// Exported environment, shared by reference.
    pub env: Arc<EnvStore>,
    /// Per-scope values.
    pub locals: Locals,
    /// Argument-validity state.
    pub exec_state: ExecState,
    /// Standard input.
    pub stdin: CommandInput,
    /// Standard output.
    pub stdout: BoxWrite,
    /// Error stream handle.
    pub stderr: ErrorStream,
    /// The dispatch's signal channel.
    pub signal: SignalChannel,
    /// Command name resolution.
    pub provider: Arc<dyn CommandProvider>,
    /// Filesystem collaborator.
    pub filesystem: Arc<dyn Filesystem>,
    /// Parser collaborator, when the session supplies one.
    pub parser: Option<Arc<dyn Parser>>,
    /// Argument-processor and decorator tables.
    pub registries: Arc<Registries>,
}

impl ExecutionContext {
    /// A root context with fresh stores, standard registries, and inert
    /// streams. Returns the error sink alongside so the caller can observe
    /// error output. Intended for embedders and tests; a full session is
    /// assembled by [`crate::shell::Shell`].
    pub fn root(
        provider: Arc<dyn CommandProvider>,
        filesystem: Arc<dyn Filesystem>,
    ) -> (Self, ErrorSink) {
        let vars = Arc::new(VarStore::new());
        let env = Arc::new(EnvStore::new(vars.clone()));
        let (stderr, sink) = crate::io::error_stream();
        let ctx = Self {
            vars,
            env,
            locals: Locals {
                pwd: "/".to_string(),
                ..Default::default()
            },
            exec_state: ExecState::default(),
            stdin: CommandInput::new(Box::new(NullReader)),
            stdout: Box::new(DiscardWriter),
            stderr,
            signal: SignalChannel::new(),
            provider,
            filesystem,
            parser: None,
            registries: Arc::new(Registries::standard()),
        };
        (ctx, sink)
    }

    /// Start deriving a child context: shared handles cloned, locals fresh
    /// (pwd inherited), streams defaulting to inert unless supplied.
    pub fn derive(&self) -> ContextBuilder {
        ContextBuilder {
            vars: self.vars.clone(),
            env: self.env.clone(),
            locals: self.locals.child(),
            stderr: self.stderr.clone(),
            signal: self.signal.clone(),
            provider: self.provider.clone(),
            filesystem: self.filesystem.clone(),
            parser: self.parser.clone(),
            registries: self.registries.clone(),
            stdin: None,
            stdout: None,
        }
    }

    /// Take this context's stdin, leaving an immediate-EOF reader behind.
    pub fn take_stdin(&mut self) -> CommandInput {
        std::mem::replace(&mut self.stdin, CommandInput::new(Box::new(NullReader)))
    }

    /// Take this context's stdout, leaving a discarding sink behind.
    pub fn take_stdout(&mut self) -> BoxWrite {
        std::mem::replace(&mut self.stdout, Box::new(DiscardWriter))
    }
}

/// Builder returned by [`ExecutionContext::derive`].
pub struct ContextBuilder {
    vars: Arc<VarStore>,
    env: Arc<EnvStore>,
    locals: Locals,
    stderr: ErrorStream,
    signal: SignalChannel,
    provider: Arc<dyn CommandProvider>,
    filesystem: Arc<dyn Filesystem>,
    parser: Option<Arc<dyn Parser>>,
    registries: Arc<Registries>,
    stdin: Option<BoxRead>,
    stdout: Option<BoxWrite>,
}

impl ContextBuilder {
    /// Supply the child's stdin.
    pub fn stdin(mut self, reader: BoxRead) -> Self {
        self.stdin = Some(reader);
        self
    }

    /// Supply the child's stdout.
    pub fn stdout(mut self, writer: BoxWrite) -> Self {
        self.stdout = Some(writer);
        self
    }

    /// Record the bound command's name in locals.
    pub fn command_name(mut self, name: &str) -> Self {
        self.locals.command = Some(name.to_string());
        self
    }

    /// Record resolved arguments in locals.
    pub fn args(mut self, args: Vec<String>) -> Self {
        self.locals.args = args;
        self
    }

    /// Finish the derivation.
    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            vars: self.vars,
            env: self.env,
            locals: self.locals,
            exec_state: ExecState::default(),
            stdin: CommandInput::new(self.stdin.unwrap_or_else(|| Box::new(NullReader))),
            stdout: self.stdout.unwrap_or_else(|| Box::new(DiscardWriter)),
            stderr: self.stderr,
            signal: self.signal,
            provider: self.provider,
            filesystem: self.filesystem,
            parser: self.parser,
            registries: self.registries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemWriter;
    use crate::vfs::MemoryFs;

    fn root_ctx() -> (ExecutionContext, ErrorSink) {
        ExecutionContext::root(
            Arc::new(RegistryProviderStub),
            Arc::new(MemoryFs::new()),
        )
    }

    struct RegistryProviderStub;

    #[async_trait::async_trait]
    impl CommandProvider for RegistryProviderStub {
        async fn lookup(
            &self,
            _name: &str,
            _ctx: &ExecutionContext,
        ) -> Option<Arc<dyn super::super::traits::Command>> {
            None
        }
    }

    #[test]
    fn derived_context_shares_vars_by_reference() {
        let (ctx, _sink) = root_ctx();
        let child = ctx.derive().build();

        child.vars.set("seen", "yes");
        assert_eq!(ctx.vars.get("seen"), Some("yes".to_string()));
    }

    #[test]
    fn derived_locals_are_fresh_except_pwd() {
        let (mut ctx, _sink) = root_ctx();
        ctx.locals.pwd = "/work".to_string();
        ctx.locals.exit = 42;
        ctx.locals.args = vec!["old".to_string()];

        let child = ctx.derive().command_name("cat").build();
        assert_eq!(child.locals.pwd, "/work");
        assert_eq!(child.locals.exit, 0);
        assert!(child.locals.args.is_empty());
        assert_eq!(child.locals.command.as_deref(), Some("cat"));
    }

    #[tokio::test]
    async fn builder_streams_are_installed() {
        let (ctx, _sink) = root_ctx();
        let sink = MemWriter::new();
        let mut child = ctx
            .derive()
            .stdin(Box::new(crate::io::MemReader::new(b"input".to_vec())))
            .stdout(Box::new(sink.clone()))
            .build();

        assert_eq!(child.stdin.read().await.unwrap(), Some(b"input".to_vec()));
        crate::io::ChunkWrite::write(&mut child.stdout, b"output")
            .await
            .unwrap();
        assert_eq!(sink.snapshot(), b"output");
    }

    #[test]
    fn exec_state_defaults_valid() {
        let (ctx, _sink) = root_ctx();
        assert!(ctx.exec_state.valid);
        let child = ctx.derive().build();
        assert!(child.exec_state.valid);
    }
}
