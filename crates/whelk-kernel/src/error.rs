//! Error types for the execution engine.
//!
//! Three layers, matching how failures propagate:
//!
//! - [`SyntaxError`] — raised by the external parser before anything runs.
//! - [`ShellError`] — dispatch-fatal conditions: unknown commands, unbound
//!   stages, pipeline plumbing failures. These abort a dispatch; the session
//!   dispatcher reports them and carries on.
//! - [`CommandError`] — outcomes of a single command body. Contained to that
//!   command: the engine maps them to exit codes and error-stream text, and
//!   sibling pipeline stages are unaffected.

use std::io;

use thiserror::Error;

use crate::ast::SourceSpan;

/// ANSI wrapper for error lines written to the error stream.
const RED_BOLD: &str = "\x1B[31;1m";
const RESET: &str = "\x1B[0m";

/// Format the standard per-command error line: red, `name: message`, newline.
pub fn red_error_line(command: &str, message: &str) -> String {
    format!("{RED_BOLD}{command}: {message}{RESET}\n")
}

/// A parse failure from the external parser.
///
/// Carries an optional span so the dispatcher can render a caret pointer
/// into the offending input line.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SyntaxError {
    /// Human-readable description of the problem.
    pub message: String,
    /// Where in the input the problem is, if known.
    pub span: Option<SourceSpan>,
}

impl SyntaxError {
    /// Create a syntax error with no position information.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    /// Attach a source span.
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Render the caret pointer into `input`, if a span is available.
    pub fn pointer(&self, input: &str) -> Option<String> {
        self.span.map(|s| s.pointer(input))
    }
}

/// Outcome of a command body that did not return normally.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The designated exit signal: terminate with this code, no error text.
    #[error("exit {0}")]
    Exit(i32),

    /// A structured failure with a machine-readable code. The engine writes
    /// one red `name: message` line and records the error's exit code.
    #[error("{message}")]
    Coded {
        /// Machine-readable error code, e.g. `ENOENT`.
        code: String,
        /// Message shown to the user.
        message: String,
        /// Exit status to record.
        exit_code: i32,
    },

    /// An I/O failure from the command's streams. A read interrupted by the
    /// signal channel surfaces here with [`io::ErrorKind::Interrupted`] and
    /// is recorded as exit code 130 with no error text.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Anything else a command body failed with. Formatted via its string
    /// form; exit code forced to -1.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl CommandError {
    /// A coded error with the conventional exit code 1.
    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Coded {
            code: code.into(),
            message: message.into(),
            exit_code: 1,
        }
    }

    /// A coded error with an explicit exit code.
    pub fn coded_with_exit(
        code: impl Into<String>,
        message: impl Into<String>,
        exit_code: i32,
    ) -> Self {
        Self::Coded {
            code: code.into(),
            message: message.into(),
            exit_code,
        }
    }

    /// True if this is an interrupted read (signal-channel cancellation).
    pub fn is_interrupt(&self) -> bool {
        matches!(self, CommandError::Io(e) if e.kind() == io::ErrorKind::Interrupted)
    }
}

/// Dispatch-fatal errors: these abort a pipeline dispatch.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The parser rejected the input.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// The command provider had no entry for this name.
    #[error("unknown command: {name}")]
    UnknownCommand {
        /// The name that failed to resolve.
        name: String,
        /// Span of the name token, for pointer rendering.
        span: Option<SourceSpan>,
    },

    /// A command node with no tokens at all.
    #[error("empty command")]
    EmptyCommand,

    /// A prepared command was executed without being bound to a context.
    #[error("command executed before binding to a context")]
    Unbound,

    /// A command declared an argument-processing scheme nobody registered.
    #[error("unknown argument scheme {scheme:?} declared by {command:?}")]
    UnknownArgScheme {
        /// The scheme identifier.
        scheme: String,
        /// The declaring command.
        command: String,
    },

    /// A pipeline stage task panicked or was aborted.
    #[error("pipeline stage failed: {0}")]
    StagePanic(String),

    /// Stream plumbing failed while draining the pipeline's tail output.
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_error_line_wraps_with_ansi() {
        let line = red_error_line("cat", "no such file");
        assert_eq!(line, "\x1B[31;1mcat: no such file\x1B[0m\n");
    }

    #[test]
    fn coded_defaults_to_exit_one() {
        match CommandError::coded("ENOENT", "missing") {
            CommandError::Coded { exit_code, .. } => assert_eq!(exit_code, 1),
            _ => panic!("expected coded error"),
        }
    }

    #[test]
    fn interrupted_io_is_interrupt() {
        let err = CommandError::Io(io::Error::new(io::ErrorKind::Interrupted, "sigint"));
        assert!(err.is_interrupt());
        let err = CommandError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(!err.is_interrupt());
    }

    #[test]
    fn syntax_error_pointer_requires_span() {
        let err = SyntaxError::new("unexpected token");
        assert!(err.pointer("echo |").is_none());

        let err = err.with_span(crate::ast::SourceSpan::new(5, 6));
        let pointer = err.pointer("echo |").unwrap();
        assert!(pointer.ends_with("     ^"));
    }
}
