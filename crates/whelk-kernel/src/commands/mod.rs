//! Command descriptors, providers, and per-dispatch registries.
//!
//! A command is anything a provider can resolve a name to: a builtin, a
//! scripted tool, an external program adapter. The engine only sees the
//! [`Command`] trait — name, optional argument spec, optional decorators,
//! input capability flags, and an execute body.
//!
//! ```text
//! CommandProvider::lookup(name) ──▶ Arc<dyn Command>
//!                                     ├── arg_spec()   ──▶ Registries::argparser
//!                                     ├── decorators() ──▶ Registries::decorator
//!                                     └── execute(ctx)
//! ```

mod argparse;
mod context;
mod decorate;
mod registry;
mod traits;

pub use argparse::{ArgParser, SimpleParser};
pub use context::{ArgValue, ContextBuilder, ExecState, ExecutionContext, Locals};
pub use decorate::{run_decorated, Decorator, DecoratorBinding, ErrorsDecorator, Next};
pub use registry::{Registries, RegistryProvider};
pub use traits::{
    ArgSpec, Command, CommandProvider, DecoratorSpec, InputFlags, OptionKind, OptionSpec,
};
