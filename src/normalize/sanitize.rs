//! Allowlist HTML sanitizer.
//!
//! Author markup is parsed with html5ever (so misnested input is repaired the
//! way a browser would repair it) and re-serialized keeping only presentational
//! elements and attributes. Local `src`/`href` values are dropped and reported:
//! the only package-local references in the output are the ones the renderer
//! writes.

use crate::dom::{Dom, NodeData, NodeId, parse_html};
use crate::model::SafeHtml;
use crate::util::{escape_attr, escape_text};

/// Elements removed together with everything inside them.
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "noscript",
    "template", "svg", "math", "head", "title", "textarea", "select", "button", "form", "input",
    "audio", "video", "source", "track", "canvas", "link", "meta", "base",
];

const ALLOWED_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "cite", "code", "dd", "div", "dl", "dt", "em",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "li", "mark",
    "ol", "p", "pre", "q", "s", "section", "small", "span", "strong", "sub", "sup", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul",
];

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img"];

const ALLOWED_ATTRIBUTES: &[&str] = &[
    "alt", "class", "colspan", "dir", "height", "href", "lang", "rowspan", "src", "title", "width",
];

/// Sanitized markup plus the package-local references removed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sanitized {
    pub html: SafeHtml,
    pub dropped: Vec<String>,
}

/// Sanitize author-supplied markup.
pub fn sanitize_html(input: &str) -> SafeHtml {
    sanitize(input).html
}

/// Sanitize author-supplied markup, reporting dropped local references.
pub fn sanitize(input: &str) -> Sanitized {
    let dom = parse_html(input);
    let mut writer = Writer {
        dom: &dom,
        out: String::with_capacity(input.len()),
        dropped: Vec::new(),
    };
    if let Some(body) = dom.find_tag("body") {
        for &child in dom.children(body) {
            writer.node(child);
        }
    }
    Sanitized {
        html: SafeHtml::from_sanitized(writer.out.trim().to_string()),
        dropped: writer.dropped,
    }
}

/// Convert plain text to markup: escaped, newlines become `<br>`.
pub fn text_to_html(text: &str) -> SafeHtml {
    let lines: Vec<String> = text
        .trim()
        .lines()
        .map(|line| escape_text(line.trim_end()).into_owned())
        .collect();
    SafeHtml::from_sanitized(lines.join("<br>\n"))
}

/// Treat `input` as markup when it contains a tag, as plain text otherwise.
pub fn html_or_text(input: &str) -> SafeHtml {
    markup_or_text(input).html
}

/// [`html_or_text`], keeping the sanitizer's report.
pub fn markup_or_text(input: &str) -> Sanitized {
    if looks_like_markup(input) {
        sanitize(input)
    } else {
        Sanitized {
            html: text_to_html(input),
            dropped: Vec::new(),
        }
    }
}

fn looks_like_markup(input: &str) -> bool {
    input
        .match_indices('<')
        .any(|(i, _)| {
            input[i + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
        })
}

struct Writer<'a> {
    dom: &'a Dom,
    out: String,
    dropped: Vec<String>,
}

impl Writer<'_> {
    fn node(&mut self, id: NodeId) {
        let dom = self.dom;
        let Some(node) = dom.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => self.out.push_str(&escape_text(text)),
            NodeData::Element { name, attrs } => {
                let tag = name.local.as_ref();
                if DROP_WITH_CONTENT.contains(&tag) {
                    return;
                }
                if !ALLOWED_ELEMENTS.contains(&tag) {
                    // Unknown wrapper: keep what is inside.
                    for &child in &node.children {
                        self.node(child);
                    }
                    return;
                }

                let mut kept = Vec::new();
                for attr in attrs {
                    let attr_name = attr.name.local.as_ref();
                    if !ALLOWED_ATTRIBUTES.contains(&attr_name) {
                        continue;
                    }
                    let value = attr.value.trim();
                    if matches!(attr_name, "href" | "src") && !url_allowed(tag, attr_name, value) {
                        if is_local_reference(value) {
                            self.dropped.push(value.to_string());
                        }
                        continue;
                    }
                    kept.push((attr_name, value));
                }
                if tag == "img" && !kept.iter().any(|(n, _)| *n == "src") {
                    return;
                }
                let external_link = tag == "a"
                    && kept
                        .iter()
                        .any(|(n, v)| *n == "href" && crate::media::is_external(v));

                let out = &mut self.out;
                out.push('<');
                out.push_str(tag);
                for (attr_name, value) in &kept {
                    out.push(' ');
                    out.push_str(attr_name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                if external_link {
                    out.push_str(r#" target="_blank" rel="noopener noreferrer""#);
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&tag) {
                    return;
                }
                for &child in &node.children {
                    self.node(child);
                }
                self.out.push_str("</");
                self.out.push_str(tag);
                self.out.push('>');
            }
            NodeData::Document | NodeData::Comment | NodeData::Doctype => {}
        }
    }
}

/// A relative path or file name, as opposed to a URL with a scheme.
fn is_local_reference(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    let head = value.split(['/', '?', '#']).next().unwrap_or_default();
    !head.contains(':')
}

/// Only absolute web URLs, in-page fragments and mail links survive; images
/// may also carry inline `data:image/` sources.
fn url_allowed(tag: &str, attr: &str, value: &str) -> bool {
    let folded: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    if folded.starts_with("http://") || folded.starts_with("https://") {
        return true;
    }
    if tag == "img" && attr == "src" {
        return folded.starts_with("data:image/") && !folded.starts_with("data:image/svg");
    }
    attr == "href" && (folded.starts_with('#') || folded.starts_with("mailto:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_removed_with_content() {
        let html = sanitize_html("<p>Hi</p><script>alert(1)</script><style>p{}</style>");
        assert_eq!(html.as_str(), "<p>Hi</p>");
    }

    #[test]
    fn test_event_handlers_and_js_urls_removed() {
        let html = sanitize_html(
            r#"<p onclick="evil()">x</p><a href="javascript:evil()">y</a><a href="JaVa&#x09;script:z">w</a>"#,
        );
        assert_eq!(html.as_str(), "<p>x</p><a>y</a><a>w</a>");
    }

    #[test]
    fn test_local_references_dropped() {
        let html = sanitize_html(r#"<img src="media/images/a.png" alt="a"><a href="pages/x.html">x</a>"#);
        assert_eq!(html.as_str(), "<a>x</a>");
    }

    #[test]
    fn test_dropped_local_references_reported() {
        let sanitized = sanitize(
            r#"<p><img src="media/images/a.png"><a href="notes.pdf">n</a><a href="javascript:x()">j</a></p>"#,
        );
        assert_eq!(sanitized.html.as_str(), "<p><a>n</a><a>j</a></p>");
        assert_eq!(sanitized.dropped, vec!["media/images/a.png", "notes.pdf"]);
        assert!(markup_or_text("plain words").dropped.is_empty());
    }

    #[test]
    fn test_is_local_reference() {
        assert!(is_local_reference("images/a.png"));
        assert!(is_local_reference("../x.html?a=b:c"));
        assert!(!is_local_reference("javascript:alert(1)"));
        assert!(!is_local_reference("data:text/html,x"));
    }

    #[test]
    fn test_external_links_kept() {
        let html = sanitize_html(r#"<a href="https://example.com/?a=1&b=2">docs</a>"#);
        assert_eq!(
            html.as_str(),
            r#"<a href="https://example.com/?a=1&amp;b=2" target="_blank" rel="noopener noreferrer">docs</a>"#
        );
    }

    #[test]
    fn test_unknown_wrappers_unwrapped() {
        let html = sanitize_html("<font color=red><b>bold</b></font>");
        assert_eq!(html.as_str(), "<b>bold</b>");
    }

    #[test]
    fn test_text_escaped_once() {
        let html = sanitize_html("<p>Fish &amp; chips &lt;3</p>");
        assert_eq!(html.as_str(), "<p>Fish &amp; chips &lt;3</p>");
    }

    #[test]
    fn test_plain_text_newlines() {
        let html = html_or_text("Line one\nLine <two> & three");
        assert_eq!(html.as_str(), "Line one<br>\nLine &lt;two&gt; &amp; three");
    }

    #[test]
    fn test_markup_detection() {
        assert!(looks_like_markup("<p>x</p>"));
        assert!(!looks_like_markup("3 < 4"));
    }
}
