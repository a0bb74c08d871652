//! Session dispatcher: the outermost loop around the pipeline engine.
//!
//! A [`Shell`] owns the root context ingredients — variable and environment
//! stores, registries, the signal channel, and the externs handed in at
//! startup (parser, command provider, filesystem, terminal streams) — and
//! turns input lines into pipeline dispatches. It is the last line of
//! defense: no parse failure, unknown command, or stage error crosses the
//! session boundary as a panic or unwound error.

use std::sync::Arc;

use crate::ast::Parser;
use crate::commands::{CommandProvider, ExecState, ExecutionContext, Locals, Registries};
use crate::error::ShellError;
use crate::io::{
    error_stream, BoxRead, BoxWrite, ChunkWrite, CommandInput, ErrorStream, SharedReader,
    SharedWriter,
};
use crate::scheduler::Pipeline;
use crate::signal::{Signal, SignalChannel};
use crate::vars::{EnvStore, VarStore};
use crate::vfs::Filesystem;

/// Session configuration supplied by the host.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// The authenticated user; drives `$user`, `$home`, and the prompt.
    pub username: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            username: "user".to_string(),
        }
    }
}

/// An interactive shell session.
pub struct Shell {
    vars: Arc<VarStore>,
    env: Arc<EnvStore>,
    registries: Arc<Registries>,
    provider: Arc<dyn CommandProvider>,
    filesystem: Arc<dyn Filesystem>,
    parser: Arc<dyn Parser>,
    input: SharedReader,
    out: SharedWriter,
    stderr: ErrorStream,
    signal: SignalChannel,
    show_ast: bool,
    last_status: i32,
}

impl Shell {
    /// Assemble a session. Must be called inside a tokio runtime: the
    /// error-stream drain task is spawned here.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parser: Arc<dyn Parser>,
        provider: Arc<dyn CommandProvider>,
        filesystem: Arc<dyn Filesystem>,
        stdin: BoxRead,
        stdout: BoxWrite,
        stderr_sink: BoxWrite,
        config: ShellConfig,
    ) -> Self {
        let vars = Arc::new(VarStore::new());
        let env = Arc::new(EnvStore::new(vars.clone()));

        let home = format!("/{}", config.username);
        vars.set("pwd", home.clone());
        vars.set("home", home);
        vars.set("user", config.username);

        // Computed entries track the variable store on every read.
        env.export_computed("PWD", |v| v.get("pwd").unwrap_or_default());
        env.export_computed("HOME", |v| v.get("home").unwrap_or_default());
        env.export_computed("USER", |v| v.get("user").unwrap_or_default());
        env.export_computed("ROWS", |v| v.get("rows").unwrap_or_else(|| "0".to_string()));
        env.export_computed("COLS", |v| v.get("cols").unwrap_or_else(|| "0".to_string()));
        env.export("TERM", "xterm-256color");
        env.export("PS1", r"[\u@whelk \w]\$ ");
        env.export("LANG", "en_US.UTF-8");

        let (stderr, mut errors) = error_stream();
        let mut stderr_sink = stderr_sink;
        tokio::spawn(async move {
            while let Some(text) = errors.recv().await {
                if stderr_sink.write(text.as_bytes()).await.is_err() {
                    break;
                }
            }
        });

        Self {
            vars,
            env,
            registries: Arc::new(Registries::standard()),
            provider,
            filesystem,
            parser,
            input: SharedReader::new(stdin),
            out: SharedWriter::new(stdout),
            stderr,
            signal: SignalChannel::new(),
            show_ast: false,
            last_status: 0,
        }
    }

    /// The session's variable store.
    pub fn vars(&self) -> &Arc<VarStore> {
        &self.vars
    }

    /// The session's environment store.
    pub fn env(&self) -> &Arc<EnvStore> {
        &self.env
    }

    /// Exit code of the most recent dispatch.
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Toggle AST dumping: when on, `run` pretty-prints the parsed tree
    /// instead of executing it.
    pub fn set_show_ast(&mut self, on: bool) {
        self.show_ast = on;
    }

    /// Deliver an interrupt to whatever dispatch is currently running.
    pub fn interrupt(&self) {
        tracing::debug!("interrupt requested");
        self.signal.emit(Signal::Interrupt);
    }

    /// Record the terminal size; `ROWS`/`COLS` follow.
    pub fn set_term_size(&self, rows: u16, cols: u16) {
        self.vars.set("rows", rows.to_string());
        self.vars.set("cols", cols.to_string());
    }

    /// Expand the PS1 prompt string: `\u` user, `\w` working directory,
    /// `\$` a literal dollar.
    pub fn prompt(&self) -> String {
        let ps1 = self.env.get("PS1").unwrap_or_default();
        ps1.replace(r"\u", &self.vars.get("user").unwrap_or_default())
            .replace(r"\w", &self.vars.get("pwd").unwrap_or_default())
            .replace(r"\$", "$")
    }

    /// Parse and run one input line, reporting every failure to the
    /// session's streams. Returns the recorded exit status.
    pub async fn run(&mut self, input: &str) -> i32 {
        if input.trim().is_empty() {
            return self.last_status;
        }

        let ast = match self.parser.parse_line(input) {
            Ok(ast) => ast,
            Err(err) => {
                if let Some(pointer) = err.pointer(input) {
                    self.write_out(&pointer).await;
                    self.write_out("\n").await;
                }
                self.write_out(&format!("error: {err}\n")).await;
                self.last_status = -1;
                return self.last_status;
            }
        };

        if self.show_ast {
            let dump = serde_json::to_string_pretty(&ast)
                .unwrap_or_else(|e| format!("<unprintable ast: {e}>"));
            self.write_out(&dump).await;
            self.write_out("\n").await;
            return self.last_status;
        }

        let ctx = self.dispatch_context();
        let pipeline = match Pipeline::build(&ctx, &ast).await {
            Ok(pipeline) => pipeline,
            Err(err) => {
                self.last_status = self.report_dispatch_error(input, err).await;
                return self.last_status;
            }
        };

        match pipeline.execute(ctx).await {
            Ok(status) => {
                self.last_status = status.last_exit_code();
            }
            Err(err) => {
                self.last_status = self.report_dispatch_error(input, err).await;
            }
        }
        self.last_status
    }

    /// Fresh context for one dispatch, lending the session streams.
    fn dispatch_context(&self) -> ExecutionContext {
        ExecutionContext {
            vars: self.vars.clone(),
            env: self.env.clone(),
            locals: Locals {
                pwd: self.vars.get("pwd").unwrap_or_else(|| "/".to_string()),
                ..Default::default()
            },
            exec_state: ExecState::default(),
            stdin: CommandInput::new(Box::new(self.input.clone())),
            stdout: Box::new(self.out.clone()),
            stderr: self.stderr.clone(),
            signal: self.signal.clone(),
            provider: self.provider.clone(),
            filesystem: self.filesystem.clone(),
            parser: Some(self.parser.clone()),
            registries: self.registries.clone(),
        }
    }

    /// Report a dispatch-fatal error on the primary output with an
    /// `error:` prefix (plus a pointer when the source span is known).
    async fn report_dispatch_error(&mut self, input: &str, err: ShellError) -> i32 {
        match err {
            ShellError::UnknownCommand { name, span } => {
                if let Some(span) = span {
                    self.write_out(&span.pointer(input)).await;
                    self.write_out("\n").await;
                }
                self.write_out(&format!("error: unknown command: {name}\n"))
                    .await;
                127
            }
            err => {
                tracing::debug!(error = %err, "dispatch failed");
                self.write_out(&format!("error: {err}\n")).await;
                -1
            }
        }
    }

    async fn write_out(&mut self, text: &str) {
        let _ = self.out.write(text.as_bytes()).await;
    }
}
