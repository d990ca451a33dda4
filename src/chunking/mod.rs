/*! Chunking

Splits a [crate::document::SourceDocument] into bounded-size [Unit]s suitable for submission
to a text generation API.

The document is first partitioned into logical [Entry]s (see [Delimiter]),
then entries are packed into units by a [Chunker].
!*/
mod chunker;
mod entry;

pub use chunker::{Chunker, ChunkerConfig, ChunkerConfigBuilder, Chunks, Unit};
pub use entry::{entries, Delimiter, Entry};
