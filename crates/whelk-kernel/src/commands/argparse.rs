//! Argument processors.
//!
//! A command that declares an [`ArgSpec`] gets its raw arguments run
//! through the processor registered for the spec's scheme before the body
//! executes. Processors fill `locals.positionals` and `locals.values`; on
//! malformed input they clear `exec_state.valid`, which makes the engine
//! skip the body and record exit code -1 with no error text.

use super::context::{ArgValue, ExecutionContext};
use super::traits::{ArgSpec, OptionKind, OptionSpec};

/// An argument processor.
pub trait ArgParser: Send + Sync {
    /// Parse `ctx.locals.args` against `spec`, populating
    /// `ctx.locals.{positionals, values}`. Mark `ctx.exec_state.valid =
    /// false` on malformed input.
    fn process(&self, ctx: &mut ExecutionContext, spec: &ArgSpec);
}

/// The standard option parser: long options, `=`-joined values, short
/// aliases, combined short flags, and `--` to end option parsing.
pub struct SimpleParser;

impl SimpleParser {
    fn record(ctx: &mut ExecutionContext, option: &OptionSpec, value: ArgValue) {
        ctx.locals.values.insert(option.name.clone(), value);
    }
}

impl ArgParser for SimpleParser {
    fn process(&self, ctx: &mut ExecutionContext, spec: &ArgSpec) {
        let args = ctx.locals.args.clone();
        let mut positionals = Vec::new();
        let mut options_done = false;
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            if options_done {
                positionals.push(arg);
                continue;
            }
            if arg == "--" {
                options_done = true;
                continue;
            }
            if let Some(long) = arg.strip_prefix("--") {
                let (name, joined) = match long.split_once('=') {
                    Some((n, v)) => (n, Some(v.to_string())),
                    None => (long, None),
                };
                let Some(option) = spec.option(name).cloned() else {
                    tracing::debug!(option = name, "unknown long option");
                    ctx.exec_state.valid = false;
                    return;
                };
                match (option.kind, joined) {
                    (OptionKind::Flag, None) => {
                        Self::record(ctx, &option, ArgValue::Flag(true));
                    }
                    (OptionKind::Flag, Some(_)) => {
                        ctx.exec_state.valid = false;
                        return;
                    }
                    (OptionKind::Value, Some(v)) => {
                        Self::record(ctx, &option, ArgValue::Text(v));
                    }
                    (OptionKind::Value, None) => {
                        let Some(value) = iter.next() else {
                            ctx.exec_state.valid = false;
                            return;
                        };
                        Self::record(ctx, &option, ArgValue::Text(value));
                    }
                }
                continue;
            }
            if let Some(shorts) = arg.strip_prefix('-') {
                if shorts.is_empty() {
                    // A bare "-" is a positional by convention.
                    positionals.push(arg);
                    continue;
                }
                let chars: Vec<char> = shorts.chars().collect();
                for (i, &c) in chars.iter().enumerate() {
                    let Some(option) = spec.option_by_short(c).cloned() else {
                        tracing::debug!(option = %c, "unknown short option");
                        ctx.exec_state.valid = false;
                        return;
                    };
                    match option.kind {
                        OptionKind::Flag => {
                            Self::record(ctx, &option, ArgValue::Flag(true));
                        }
                        OptionKind::Value => {
                            // A value-taking short must be last in the group.
                            if i != chars.len() - 1 {
                                ctx.exec_state.valid = false;
                                return;
                            }
                            let Some(value) = iter.next() else {
                                ctx.exec_state.valid = false;
                                return;
                            };
                            Self::record(ctx, &option, ArgValue::Text(value));
                        }
                    }
                }
                continue;
            }
            positionals.push(arg);
        }

        if !positionals.is_empty() && !spec.allow_positionals {
            ctx.exec_state.valid = false;
            return;
        }
        ctx.locals.positionals = positionals;
    }
}
