//! Template rendering.
//!
//! [`render`] is a pure function of the course, the resolved media and the
//! build configuration. It produces the manifest, the entry shell, one
//! document per page and the stylesheet; the navigation and shim scripts come
//! from their own modules and are merged in by the pipeline.

mod html;
mod manifest;
mod style;

use std::collections::{BTreeMap, BTreeSet};

pub use html::youtube_embed_url;
pub use manifest::render_manifest;

use crate::config::{BuildConfig, ScormVersion};
use crate::model::{CourseContent, MediaKey, ResolvedMedia};

pub const MANIFEST_PATH: &str = "imsmanifest.xml";
pub const ENTRY_PATH: &str = "index.html";
pub const STYLESHEET_PATH: &str = "styles/main.css";
pub const NAVIGATION_SCRIPT_PATH: &str = "scripts/navigation.js";
pub const SHIM_SCRIPT_PATH: &str = "scripts/scorm-api.js";

/// Scripts in the order every document loads them. The shim must come
/// first so discovery has finished before navigation starts.
pub const SCRIPT_ORDER: [&str; 2] = [SHIM_SCRIPT_PATH, NAVIGATION_SCRIPT_PATH];

/// A generated text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub mime_type: &'static str,
    pub text: String,
}

impl Artifact {
    pub fn new(mime_type: &'static str, text: impl Into<String>) -> Self {
        Self {
            mime_type,
            text: text.into(),
        }
    }

    pub fn is_html(&self) -> bool {
        self.mime_type == "text/html"
    }
}

/// Settings the renderer reads from the build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub scorm_version: ScormVersion,
    pub strict_content_policy: bool,
    pub pass_mark: u8,
}

impl RenderOptions {
    /// Options for `content` under `config`; a configured pass mark overrides
    /// the course's own.
    pub fn new(content: &CourseContent, config: &BuildConfig) -> Self {
        Self {
            scorm_version: config.scorm_version,
            strict_content_policy: config.enable_strict_content_policy,
            pass_mark: config.pass_mark.unwrap_or(content.pass_mark).min(100),
        }
    }
}

/// Everything the renderer produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPackage {
    /// Archive path → artifact, sorted.
    pub artifacts: BTreeMap<String, Artifact>,
    /// Media the rendered documents reference. Only these get packaged.
    pub media_used: BTreeSet<MediaKey>,
}

/// Render all text artifacts except the two scripts.
pub fn render(content: &CourseContent, media: &ResolvedMedia, options: &RenderOptions) -> RenderedPackage {
    let mut package = RenderedPackage::default();

    for page in &content.pages {
        let document = html::render_page(content, page, media, options, &mut package.media_used);
        package
            .artifacts
            .insert(page.id.document_path(), Artifact::new("text/html", document));
    }

    package.artifacts.insert(
        ENTRY_PATH.to_string(),
        Artifact::new("text/html", html::render_entry(content, options)),
    );
    package.artifacts.insert(
        STYLESHEET_PATH.to_string(),
        Artifact::new("text/css", style::stylesheet()),
    );

    let files = package_files(content, media, &package.media_used);
    package.artifacts.insert(
        MANIFEST_PATH.to_string(),
        Artifact::new(
            "application/xml",
            render_manifest(content, &files, options),
        ),
    );

    tracing::debug!(
        artifacts = package.artifacts.len(),
        media = package.media_used.len(),
        "rendered package"
    );
    package
}

/// Every file the manifest lists: fixed files, page documents and used media.
pub fn package_files(
    content: &CourseContent,
    media: &ResolvedMedia,
    media_used: &BTreeSet<MediaKey>,
) -> Vec<String> {
    let mut files: BTreeSet<String> = [ENTRY_PATH, STYLESHEET_PATH, NAVIGATION_SCRIPT_PATH, SHIM_SCRIPT_PATH]
        .into_iter()
        .map(str::to_string)
        .collect();
    files.extend(content.pages.iter().map(|p| p.id.document_path()));
    files.extend(
        media_used
            .iter()
            .filter_map(|key| media.path_of(key))
            .map(str::to_string),
    );
    files.into_iter().collect()
}

/// Content-Security-Policy used when the strict policy is enabled.
pub const STRICT_CONTENT_POLICY: &str = "default-src 'self'; script-src 'self'; style-src 'self'; \
img-src 'self' data: https: blob:; media-src 'self' https: blob:; \
frame-src 'self' https://www.youtube.com https://www.youtube-nocookie.com https://player.vimeo.com; \
connect-src 'self'; object-src 'none'; base-uri 'self'";
