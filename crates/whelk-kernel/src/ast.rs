//! AST node types produced by the external parser.
//!
//! The execution engine never parses text itself. A [`Parser`] collaborator
//! turns a raw input line into a [`PipelineNode`], and the engine walks that
//! tree. A pipeline is always the top-level execution unit — a bare command
//! is represented as a one-element pipeline.
//!
//! ```text
//! PipelineNode
//! └── CommandNode[]
//!     ├── tokens: TokenNode[]          (first token is the command name)
//!     ├── input_redirect: TokenNode?
//!     └── output_redirects: TokenNode[]
//!         └── TokenNode
//!             └── components: Symbol | StringSegment | Substitution(PipelineNode)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SyntaxError;

/// A byte range into the original input line, used to render error pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Byte offset of the first byte of the span.
    pub start: usize,
    /// Byte offset one past the last byte of the span.
    pub end: usize,
}

impl SourceSpan {
    /// Create a span covering `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Render a two-line pointer into `input`: the offending line followed
    /// by a caret run underneath the span.
    pub fn pointer(&self, input: &str) -> String {
        // Locate the line containing the span start.
        let line_start = input[..self.start.min(input.len())]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = input[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(input.len());
        let line = &input[line_start..line_end];

        let col = self.start.saturating_sub(line_start);
        let width = (self.end.saturating_sub(self.start)).max(1).min(line.len().saturating_sub(col).max(1));

        let mut out = String::with_capacity(line.len() + col + width + 1);
        out.push_str(line);
        out.push('\n');
        out.extend(std::iter::repeat(' ').take(col));
        out.extend(std::iter::repeat('^').take(width));
        out
    }
}

/// One component of a token.
///
/// `Symbol` and `StringSegment` are both literal text; they are kept distinct
/// because the parser distinguishes bare words from quoted string segments.
/// `Substitution` carries a nested pipeline whose captured output becomes
/// part of the token's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenComponent {
    /// A bare word or part of one.
    Symbol(String),
    /// A segment of a quoted string.
    StringSegment(String),
    /// A command substitution: the nested pipeline's output, trailing
    /// whitespace trimmed, is spliced into the token.
    Substitution(PipelineNode),
}

impl TokenComponent {
    /// Literal text of this component, if it has any.
    pub fn literal(&self) -> Option<&str> {
        match self {
            TokenComponent::Symbol(s) | TokenComponent::StringSegment(s) => Some(s),
            TokenComponent::Substitution(_) => None,
        }
    }
}

/// A token: an ordered list of components plus an optional source span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenNode {
    /// Components in document order.
    pub components: Vec<TokenComponent>,
    /// Span of the token in the original input, when the parser provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<SourceSpan>,
}

impl TokenNode {
    /// A token made of a single literal word.
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            components: vec![TokenComponent::Symbol(text.into())],
            span: None,
        }
    }

    /// A token whose whole value is a command substitution.
    pub fn substitution(pipeline: PipelineNode) -> Self {
        Self {
            components: vec![TokenComponent::Substitution(pipeline)],
            span: None,
        }
    }

    /// Attach a source span.
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }
}

/// A single command: name token, argument tokens, and redirects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandNode {
    /// Tokens in order; the first is the command name.
    pub tokens: Vec<TokenNode>,
    /// At most one input redirect (a path token).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_redirect: Option<TokenNode>,
    /// Zero or more output redirects (path tokens), in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_redirects: Vec<TokenNode>,
}

impl CommandNode {
    /// A command from a list of literal words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: words.into_iter().map(TokenNode::word).collect(),
            input_redirect: None,
            output_redirects: Vec::new(),
        }
    }
}

/// The top-level execution unit: an ordered list of commands connected by
/// pipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineNode {
    /// Commands left to right.
    pub commands: Vec<CommandNode>,
}

impl PipelineNode {
    /// Wrap a single command in a one-element pipeline.
    pub fn single(command: CommandNode) -> Self {
        Self {
            commands: vec![command],
        }
    }
}

/// External parser contract.
///
/// Implementations turn one raw input line into a [`PipelineNode`], or fail
/// with a [`SyntaxError`] carrying enough position information to render a
/// pointer back into the source text. The engine never implements this.
pub trait Parser: Send + Sync {
    /// Parse one line of input into a pipeline.
    fn parse_line(&self, input: &str) -> Result<PipelineNode, SyntaxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_token_is_single_symbol() {
        let tok = TokenNode::word("echo");
        assert_eq!(tok.components.len(), 1);
        assert_eq!(tok.components[0].literal(), Some("echo"));
    }

    #[test]
    fn substitution_component_has_no_literal() {
        let sub = TokenComponent::Substitution(PipelineNode { commands: vec![] });
        assert_eq!(sub.literal(), None);
    }

    #[test]
    fn pointer_marks_span_in_line() {
        let span = SourceSpan::new(4, 7);
        let rendered = span.pointer("cat nope.txt");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "cat nope.txt");
        assert_eq!(lines[1], "    ^^^");
    }

    #[test]
    fn pointer_finds_correct_line_in_multiline_input() {
        let input = "first\nsecond line\nthird";
        // span over "second"
        let span = SourceSpan::new(6, 12);
        let rendered = span.pointer(input);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "second line");
        assert_eq!(lines[1], "^^^^^^");
    }

    #[test]
    fn ast_round_trips_through_json() {
        let node = PipelineNode {
            commands: vec![CommandNode {
                tokens: vec![
                    TokenNode::word("echo"),
                    TokenNode::substitution(PipelineNode::single(CommandNode::from_words(["pwd"]))),
                ],
                input_redirect: None,
                output_redirects: vec![TokenNode::word("out.txt")],
            }],
        };
        let json = serde_json::to_string(&node).unwrap();
        let back: PipelineNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
