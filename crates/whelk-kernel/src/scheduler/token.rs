//! Token resolution, including command substitution.

use crate::ast::{SourceSpan, TokenComponent, TokenNode};
use crate::commands::ExecutionContext;
use crate::error::ShellError;
use crate::io::MemWriter;

use super::pipeline::Pipeline;

/// A resolvable unit of the AST.
///
/// Statically resolvable when every component is literal text; dynamic when
/// any component is a command substitution. Resolution is not cached —
/// resolving twice re-executes any nested substitution.
#[derive(Debug, Clone)]
pub struct Token {
    node: TokenNode,
}

impl Token {
    /// Take ownership of a token node.
    pub fn new(node: TokenNode) -> Self {
        Self { node }
    }

    /// The token's source span, if the parser attached one.
    pub fn span(&self) -> Option<SourceSpan> {
        self.node.span
    }

    /// Concatenate the literal components if, and only if, every component
    /// is literal. `None` means the token must be resolved asynchronously —
    /// never that it resolves to an empty string.
    pub fn maybe_static(&self) -> Option<String> {
        let mut value = String::new();
        for component in &self.node.components {
            value.push_str(component.literal()?);
        }
        Some(value)
    }

    /// Resolve to a string, executing nested substitutions.
    ///
    /// Literal text concatenates in order. Each substitution builds a full
    /// sub-pipeline, runs it with an isolated capture sink, trims exactly
    /// the trailing whitespace run from the captured text, and appends the
    /// result. Substitutions execute one at a time, in document order.
    pub async fn resolve(&self, ctx: &ExecutionContext) -> Result<String, ShellError> {
        let mut value = String::new();
        for component in &self.node.components {
            match component {
                TokenComponent::Symbol(text) | TokenComponent::StringSegment(text) => {
                    value.push_str(text);
                }
                TokenComponent::Substitution(node) => {
                    let pipeline = Pipeline::build(ctx, node).await?;
                    let capture = MemWriter::new();
                    let sub_ctx = ctx.derive().stdout(Box::new(capture.clone())).build();
                    // Boxed: substitution re-enters the engine
                    // (resolve -> execute -> resolve).
                    Box::pin(pipeline.execute(sub_ctx)).await?;
                    let captured = capture.take_string();
                    value.push_str(captured.trim_end());
                }
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CommandNode, PipelineNode};
    use crate::commands::{Command, RegistryProvider};
    use crate::error::CommandError;
    use crate::io::ChunkWrite;
    use crate::vfs::MemoryFs;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Writes a fixed string to stdout.
    struct Emit(&'static str);

    #[async_trait]
    impl Command for Emit {
        fn name(&self) -> &str {
            "emit"
        }

        async fn execute(&self, ctx: &mut ExecutionContext) -> Result<(), CommandError> {
            ctx.stdout.write(self.0.as_bytes()).await?;
            Ok(())
        }
    }

    fn ctx_with_emit(text: &'static str) -> ExecutionContext {
        let mut provider = RegistryProvider::new();
        provider.register(Arc::new(Emit(text)));
        let (ctx, _sink) =
            ExecutionContext::root(Arc::new(provider), Arc::new(MemoryFs::new()));
        // Sink is dropped; error text from substitutions is discarded here.
        ctx
    }

    #[test]
    fn all_literal_components_resolve_statically() {
        let token = Token::new(TokenNode {
            components: vec![
                TokenComponent::Symbol("hello".to_string()),
                TokenComponent::StringSegment(" world".to_string()),
            ],
            span: None,
        });
        assert_eq!(token.maybe_static(), Some("hello world".to_string()));
    }

    #[test]
    fn substitution_component_defeats_static_resolution() {
        let token = Token::new(TokenNode {
            components: vec![
                TokenComponent::Symbol("pre".to_string()),
                TokenComponent::Substitution(PipelineNode { commands: vec![] }),
            ],
            span: None,
        });
        assert_eq!(token.maybe_static(), None);
    }

    #[test]
    fn empty_literal_token_is_statically_empty() {
        // Statically resolving to "" is distinct from "not resolvable".
        let token = Token::new(TokenNode {
            components: vec![TokenComponent::Symbol(String::new())],
            span: None,
        });
        assert_eq!(token.maybe_static(), Some(String::new()));
    }

    #[tokio::test]
    async fn resolve_concatenates_literals_in_order() {
        let ctx = ctx_with_emit("unused");
        let token = Token::new(TokenNode {
            components: vec![
                TokenComponent::Symbol("a".to_string()),
                TokenComponent::StringSegment("b".to_string()),
                TokenComponent::Symbol("c".to_string()),
            ],
            span: None,
        });
        assert_eq!(token.resolve(&ctx).await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn substitution_captures_and_trims_trailing_whitespace_only() {
        let ctx = ctx_with_emit("  result\n\n");
        let sub = PipelineNode::single(CommandNode::from_words(["emit"]));
        let token = Token::new(TokenNode::substitution(sub));

        // Leading whitespace survives; the trailing run is removed.
        assert_eq!(token.resolve(&ctx).await.unwrap(), "  result");
    }

    #[tokio::test]
    async fn substitution_splices_between_literals() {
        let ctx = ctx_with_emit("mid");
        let sub = PipelineNode::single(CommandNode::from_words(["emit"]));
        let token = Token::new(TokenNode {
            components: vec![
                TokenComponent::Symbol("pre-".to_string()),
                TokenComponent::Substitution(sub),
                TokenComponent::Symbol("-post".to_string()),
            ],
            span: None,
        });
        assert_eq!(token.resolve(&ctx).await.unwrap(), "pre-mid-post");
    }

    #[tokio::test]
    async fn resolving_twice_re_executes_the_substitution() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingEmit(Arc<AtomicUsize>);

        #[async_trait]
        impl Command for CountingEmit {
            fn name(&self) -> &str {
                "count"
            }

            async fn execute(&self, ctx: &mut ExecutionContext) -> Result<(), CommandError> {
                let n = self.0.fetch_add(1, Ordering::SeqCst);
                ctx.stdout.write(format!("{n}").as_bytes()).await?;
                Ok(())
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let mut provider = RegistryProvider::new();
        provider.register(Arc::new(CountingEmit(calls.clone())));
        let (ctx, _sink) =
            ExecutionContext::root(Arc::new(provider), Arc::new(MemoryFs::new()));

        let sub = PipelineNode::single(CommandNode::from_words(["count"]));
        let token = Token::new(TokenNode::substitution(sub));

        assert_eq!(token.resolve(&ctx).await.unwrap(), "0");
        assert_eq!(token.resolve(&ctx).await.unwrap(), "1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_command_in_substitution_fails_resolution() {
        let ctx = ctx_with_emit("unused");
        let sub = PipelineNode::single(CommandNode::from_words(["missing"]));
        let token = Token::new(TokenNode::substitution(sub));

        match token.resolve(&ctx).await {
            Err(ShellError::UnknownCommand { name, .. }) => assert_eq!(name, "missing"),
            other => panic!("expected unknown command, got {other:?}"),
        }
    }
}
