//! Range-aware byte delivery.

pub mod range;

pub use range::{ParsedRange, RangeStreamer, parse_range_header};
