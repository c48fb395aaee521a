//! Local references in HTML documents and the manifest's file list.

use std::collections::BTreeSet;

use percent_encoding::percent_decode_str;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;

use crate::dom::{Dom, parse_html};
use crate::error::Result;
use crate::media::is_external;

/// Attributes that point at another file.
const LINK_ATTRIBUTES: &[&str] = &["src", "href", "poster"];

/// Resolve `rel` against the document at `base`, both archive-relative.
///
/// `..` segments that would climb above the root are dropped.
pub fn resolve_path(base: &str, rel: &str) -> String {
    if let Some(absolute) = rel.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut stack: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    stack.pop();

    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    stack.join("/")
}

/// Whether a reference leaves the package or stays inside the document.
fn is_local(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    !(lower.is_empty()
        || lower.starts_with('#')
        || is_external(&lower)
        || lower.starts_with("data:")
        || lower.starts_with("blob:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("javascript:")
        || lower.contains("://"))
}

/// Archive paths referenced by `src`, `href` and `poster` attributes in the
/// HTML document stored at `path`.
pub fn html_references(path: &str, html: &str) -> BTreeSet<String> {
    let dom = parse_html(html);
    references_in(&dom, path)
}

fn references_in(dom: &Dom, path: &str) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    for node in dom.descendants(Dom::DOCUMENT) {
        for attr in LINK_ATTRIBUTES {
            let Some(value) = dom.attr(node, attr) else {
                continue;
            };
            if !is_local(value) {
                continue;
            }
            let target = value.trim().split(['?', '#']).next().unwrap_or_default();
            if target.is_empty() {
                continue;
            }
            let decoded = percent_decode_str(target).decode_utf8_lossy();
            refs.insert(resolve_path(path, &decoded));
        }
    }
    refs
}

/// Files a manifest lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestListing {
    /// `<file href>` entries.
    pub files: BTreeSet<String>,
    /// `<resource href>` launch points.
    pub entry_points: BTreeSet<String>,
}

/// Read the file list back out of a rendered manifest.
pub fn manifest_listing(xml: &str) -> Result<ManifestListing> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut listing = ManifestListing::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let target = match e.name().as_ref() {
                    b"file" => &mut listing.files,
                    b"resource" => &mut listing.entry_points,
                    _ => continue,
                };
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"href" {
                        let raw = String::from_utf8_lossy(&attr.value);
                        let value = unescape(&raw)
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| raw.to_string());
                        target.insert(value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(listing)
}
