//! whelk-kernel: the execution core of the whelk shell.
//!
//! This crate provides:
//!
//! - **AST**: Node types for the pipeline/command/token tree an external
//!   parser produces
//! - **Scheduler**: Pipeline construction and execution — command
//!   resolution, pipe wiring, redirects, concurrent stages, couplers
//! - **IO**: Chunked stream primitives — exact-length buffering, in-memory
//!   readers/writers, fan-out, signal-aware and line-synchronizing reads
//! - **PTY**: The simulated terminal device with one controlling side and
//!   any number of observers
//! - **Commands**: The command descriptor/provider contracts plus argument
//!   processors and execute-function decorators
//! - **VFS**: The filesystem provider contract with in-memory and local
//!   implementations
//! - **Vars**: Observable variable store and computed environment entries
//! - **Shell**: The session dispatcher wiring it all together

pub mod ast;
pub mod commands;
pub mod error;
pub mod io;
pub mod paths;
pub mod pty;
pub mod scheduler;
pub mod shell;
pub mod signal;
pub mod vars;
pub mod vfs;

pub use ast::{CommandNode, Parser, PipelineNode, SourceSpan, TokenComponent, TokenNode};
pub use commands::{
    ArgParser, ArgSpec, ArgValue, Command, CommandProvider, Decorator, DecoratorSpec,
    ExecutionContext, InputFlags, Locals, Registries, RegistryProvider,
};
pub use error::{CommandError, ShellError, SyntaxError};
pub use scheduler::{Coupler, Pipeline, PipelineStatus, PreparedCommand, Token};
pub use shell::{Shell, ShellConfig};
pub use signal::{Signal, SignalChannel};
pub use vars::{EnvStore, VarChange, VarStore};
pub use vfs::{Filesystem, LocalFs, MemoryFs};
