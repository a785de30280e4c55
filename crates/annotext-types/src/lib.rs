//! Shared record types for the annotext extraction pipeline.
//!
//! Everything here is an immutable value record: produced once per
//! document-parse invocation, serialized as-is to API responses and the
//! document store, never mutated afterwards.

pub mod records;

pub use records::{
    CodeLabelPair, CommentRecord, HighlightRecord, LinkRecord, ParagraphRecord, ParsedDocument,
};
