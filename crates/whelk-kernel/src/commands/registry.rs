//! Registries: the provider table and the processor/decorator tables.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::argparse::{ArgParser, SimpleParser};
use super::context::ExecutionContext;
use super::decorate::{Decorator, ErrorsDecorator};
use super::traits::{Command, CommandProvider};

/// Argument-processor and decorator tables for a session.
///
/// The identifier sets are effectively fixed per build: everything is
/// registered at startup via [`Registries::standard`] (plus any host
/// additions), and lookups at dispatch time never mutate the tables.
pub struct Registries {
    argparsers: HashMap<String, Arc<dyn ArgParser>>,
    decorators: HashMap<String, Arc<dyn Decorator>>,
}

impl Registries {
    /// Empty tables.
    pub fn new() -> Self {
        Self {
            argparsers: HashMap::new(),
            decorators: HashMap::new(),
        }
    }

    /// The standard set: the `simple` argument parser and the `errors`
    /// decorator.
    pub fn standard() -> Self {
        let mut registries = Self::new();
        registries.register_argparser("simple", Arc::new(SimpleParser));
        registries.register_decorator("errors", Arc::new(ErrorsDecorator));
        registries
    }

    /// Register an argument processor under a scheme identifier.
    pub fn register_argparser(&mut self, scheme: impl Into<String>, parser: Arc<dyn ArgParser>) {
        self.argparsers.insert(scheme.into(), parser);
    }

    /// Register a decorator under an identifier.
    pub fn register_decorator(&mut self, id: impl Into<String>, decorator: Arc<dyn Decorator>) {
        self.decorators.insert(id.into(), decorator);
    }

    /// Look up an argument processor.
    pub fn argparser(&self, scheme: &str) -> Option<Arc<dyn ArgParser>> {
        self.argparsers.get(scheme).cloned()
    }

    /// Look up a decorator.
    pub fn decorator(&self, id: &str) -> Option<Arc<dyn Decorator>> {
        self.decorators.get(id).cloned()
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::standard()
    }
}

/// A command provider backed by a name table.
///
/// The open-ended half of resolution: hosts register whatever commands the
/// session should see. Providers that search a `PATH` or a remote service
/// implement [`CommandProvider`] themselves.
#[derive(Default)]
pub struct RegistryProvider {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl RegistryProvider {
    /// Empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its own name.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[async_trait]
impl CommandProvider for RegistryProvider {
    async fn lookup(&self, name: &str, _ctx: &ExecutionContext) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }
}
