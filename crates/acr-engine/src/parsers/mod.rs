//! One `ReviewParser`/`SummaryParser` pair per output shape a backend can
//! emit; a parser never knows which driver produced the bytes it's handed.

mod fence;
mod jsonl;
mod plain_text;
mod single_json;
mod single_json_summary;
mod stdin_envelope;

pub use jsonl::{JsonlReviewParser, JsonlSummaryParser};
pub use plain_text::PlainTextReviewParser;
pub use single_json::SingleJsonReviewParser;
pub use single_json_summary::SingleJsonSummaryParser;
pub use stdin_envelope::StdinEnvelopeSummaryParser;
