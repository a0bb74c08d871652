//! Command descriptor and provider traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::CommandError;

use super::context::ExecutionContext;

/// How an option's value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean flag; present or absent.
    Flag,
    /// Takes a string value (`--name value` or `--name=value`).
    Value,
}

/// One named option in an argument spec.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    /// Long name (`--parents`).
    pub name: String,
    /// Parsing behavior.
    pub kind: OptionKind,
    /// Optional short alias (`-p`).
    pub short: Option<char>,
}

/// A command's declared argument-processing scheme.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    /// Identifier of the processor to run (`"simple"`).
    pub scheme: String,
    /// Whether positional arguments are accepted.
    pub allow_positionals: bool,
    /// Named options.
    pub options: Vec<OptionSpec>,
}

impl ArgSpec {
    /// Start a spec for the standard simple parser.
    pub fn simple() -> Self {
        Self {
            scheme: "simple".to_string(),
            allow_positionals: false,
            options: Vec::new(),
        }
    }

    /// Allow positional arguments.
    pub fn allow_positionals(mut self, allow: bool) -> Self {
        self.allow_positionals = allow;
        self
    }

    /// Add a boolean flag option.
    pub fn flag(mut self, name: impl Into<String>, short: Option<char>) -> Self {
        self.options.push(OptionSpec {
            name: name.into(),
            kind: OptionKind::Flag,
            short,
        });
        self
    }

    /// Add a value-taking option.
    pub fn value(mut self, name: impl Into<String>, short: Option<char>) -> Self {
        self.options.push(OptionSpec {
            name: name.into(),
            kind: OptionKind::Value,
            short,
        });
        self
    }

    /// Find an option by long name.
    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Find an option by short alias.
    pub fn option_by_short(&self, short: char) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.short == Some(short))
    }
}

/// A decorator the command asks to be wrapped with, plus its parameters.
#[derive(Debug, Clone)]
pub struct DecoratorSpec {
    /// Registry identifier of the decorator.
    pub id: String,
    /// Decorator-specific parameters.
    pub params: serde_json::Value,
}

impl DecoratorSpec {
    /// A decorator with no parameters.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: serde_json::Value::Null,
        }
    }
}

/// Input capability flags a command declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFlags {
    /// The command needs whole-line read granularity on stdin.
    pub sync_lines: bool,
}

/// A resolved command descriptor.
#[async_trait]
pub trait Command: Send + Sync {
    /// The command's name (used in error lines).
    fn name(&self) -> &str;

    /// Declared argument-processing scheme, if any.
    fn arg_spec(&self) -> Option<&ArgSpec> {
        None
    }

    /// Decorators to wrap the execute body with, in declared order.
    fn decorators(&self) -> &[DecoratorSpec] {
        &[]
    }

    /// Input capability flags.
    fn input_flags(&self) -> InputFlags {
        InputFlags::default()
    }

    /// Run the command body against its derived context.
    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<(), CommandError>;
}

/// Resolves command names to descriptors.
#[async_trait]
pub trait CommandProvider: Send + Sync {
    /// Look up a command by name. `None` means unknown command, which is
    /// fatal to the dispatch.
    async fn lookup(&self, name: &str, ctx: &ExecutionContext) -> Option<Arc<dyn Command>>;
}
