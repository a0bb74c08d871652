//! Pipeline construction and execution.
//!
//! ```text
//! PipelineNode ──build──▶ Pipeline[PreparedCommand…]
//!
//!   stdin ─▶ stage 0 ─pipe─▶ stage 1 ─pipe─▶ stage 2 ─pipe─▶ Coupler ─▶ stdout
//! ```
//!
//! Contexts bind forward (stage 0 first) so each stage captures the right
//! pipe ends; tasks launch in reverse (last stage first) so every consumer
//! exists before its producer can fill a pipe. All stages run concurrently;
//! a stage failure is contained to that stage and never cancels siblings.

mod command;
mod coupler;
mod pipe;
mod pipeline;
mod token;

pub use command::PreparedCommand;
pub use coupler::Coupler;
pub use pipe::{pipe, pipe_default, PipeReader, PipeWriter, PIPE_CHUNK_CAPACITY};
pub use pipeline::{Pipeline, PipelineStatus};
pub use token::Token;
