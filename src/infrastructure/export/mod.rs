//! Snapshot exporters
//!
//! Both exporters are pure functions of a snapshot: they never fail and never
//! look at aggregator internals.

pub mod json;
pub mod text;

pub use json::{JsonExporter, render_json};
pub use text::{TextExporter, render_text};
