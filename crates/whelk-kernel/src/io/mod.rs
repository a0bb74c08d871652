//! Stream plumbing for the execution engine.
//!
//! Everything that carries bytes between pipeline stages is a chunked
//! stream: readers hand out whole chunks, writers accept them. The engine
//! composes small decorators around a stage's base streams:
//!
//! ```text
//!   base stdin ─▶ SignalReader ─▶ [SyncLinesReader] ─▶ CommandInput ─▶ command
//!   command ─▶ MultiWriter ─▶ [MemWriter…, NullifyWriter(base stdout)]
//! ```

mod chunk_buffer;
mod error_stream;
mod fanout;
mod mem;
mod shared;
mod signal_reader;
mod sync_lines;
mod traits;

pub use chunk_buffer::{ChunkBuffer, CommandInput};
pub use error_stream::{error_stream, ErrorSink, ErrorStream};
pub use fanout::{MultiWriter, NullifyWriter};
pub use mem::{MemReader, MemWriter};
pub use shared::{SharedReader, SharedWriter};
pub use signal_reader::SignalReader;
pub use sync_lines::SyncLinesReader;
pub use traits::{BoxRead, BoxWrite, ChunkRead, ChunkWrite, DiscardWriter, NullReader};
