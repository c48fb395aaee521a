//! Minimal HTML tree used by the sanitizer and the assembler's reference check.

mod arena;
mod tree_sink;

pub use arena::{Dom, NodeData, NodeId};
use tree_sink::DomSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

/// Parse a full document or a fragment. Fragments end up under `<body>`.
pub fn parse_html(html: &str) -> Dom {
    parse_document(DomSink::default(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}
