//! The build pipeline: normalize, resolve, render, assemble.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::cancel::CancelToken;
use crate::config::BuildConfig;
use crate::error::{BuildWarning, Result};
use crate::media::{MediaResolver, MediaStore};
use crate::model::{CourseContent, ResolvedMedia};
use crate::navigation::{NavigationGraph, emit_navigation_script};
use crate::normalize::normalize;
use crate::package::Package;
use crate::render::{NAVIGATION_SCRIPT_PATH, RenderOptions, RenderedPackage, SHIM_SCRIPT_PATH, render};
use crate::shim::emit_shim_script;

/// A finished package.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The zip archive.
    pub archive: Vec<u8>,
    /// Non-fatal problems, sorted.
    pub warnings: Vec<BuildWarning>,
    /// Files the manifest lists, sorted.
    pub manifest_files: Vec<String>,
}

/// Compiles course documents into packages.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use coursepack::{BuildConfig, CancelToken, Compiler, MemoryStore};
///
/// # async fn run() -> coursepack::Result<()> {
/// let compiler = Compiler::new(BuildConfig::default(), Arc::new(MemoryStore::new()));
/// let course = serde_json::json!({
///     "courseTitle": "Safety",
///     "topics": [{"title": "Exits", "content": "<p>Know your exits.</p>"}]
/// });
/// let output = compiler.build(&course, &CancelToken::new()).await?;
/// std::fs::write("safety.zip", &output.archive)?;
/// # Ok(())
/// # }
/// ```
pub struct Compiler {
    config: BuildConfig,
    store: Arc<dyn MediaStore>,
}

impl Compiler {
    pub fn new(config: BuildConfig, store: Arc<dyn MediaStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build a package from a raw course document.
    pub async fn build(&self, raw: &Value, cancel: &CancelToken) -> Result<BuildOutput> {
        cancel.check()?;
        let content = normalize(raw)?;
        info!(
            title = %content.title,
            pages = content.pages.len(),
            "normalized course"
        );
        self.build_content(&content, cancel).await
    }

    /// Build a package from an already normalized course.
    pub async fn build_content(
        &self,
        content: &CourseContent,
        cancel: &CancelToken,
    ) -> Result<BuildOutput> {
        cancel.check()?;
        let resolver = MediaResolver::new(Arc::clone(&self.store), &self.config);
        let resolution = resolver.resolve(content, cancel).await?;
        info!(
            resolved = resolution.media.len(),
            missing = resolution.warnings.len(),
            "resolved media"
        );

        cancel.check()?;
        let (rendered, navigation, shim) = self.render_stage(content, &resolution.media)?;
        info!(artifacts = rendered.artifacts.len(), "rendered documents");

        cancel.check()?;
        let package = Package::from_parts(
            rendered,
            [
                (NAVIGATION_SCRIPT_PATH.to_string(), navigation),
                (SHIM_SCRIPT_PATH.to_string(), shim),
            ],
            &resolution.media,
        )?;
        let assembled = package.assemble(self.config.compression_level)?;

        let mut warnings = resolution.warnings;
        warnings.extend(assembled.warnings);
        warnings.extend(content.pages.iter().flat_map(|page| {
            page.dropped_references
                .iter()
                .map(|reference| BuildWarning::DroppedReference {
                    page_id: page.id.clone(),
                    reference: reference.clone(),
                })
        }));
        warnings.sort();

        info!(
            bytes = assembled.archive.len(),
            files = assembled.manifest_files.len(),
            warnings = warnings.len(),
            "build finished"
        );
        Ok(BuildOutput {
            archive: assembled.archive,
            warnings,
            manifest_files: assembled.manifest_files,
        })
    }

    /// Render documents, emit the navigation script and emit the shim. The
    /// three only read shared inputs, so they run side by side.
    fn render_stage(
        &self,
        content: &CourseContent,
        media: &ResolvedMedia,
    ) -> Result<(RenderedPackage, String, String)> {
        let options = RenderOptions::new(content, &self.config);
        let graph = NavigationGraph::from_content(content, options.pass_mark)
            .with_navigation_mode(self.config.navigation_mode)
            .with_allow_retake(self.config.allow_retake);

        let (rendered, navigation, shim) = std::thread::scope(|s| {
            let rendered = s.spawn(|| render(content, media, &options));
            let navigation = s.spawn(|| emit_navigation_script(&graph));
            let shim = s.spawn(|| emit_shim_script(&self.config));
            (
                rendered.join().unwrap_or_else(|e| std::panic::resume_unwind(e)),
                navigation.join().unwrap_or_else(|e| std::panic::resume_unwind(e)),
                shim.join().unwrap_or_else(|e| std::panic::resume_unwind(e)),
            )
        });
        Ok((rendered, navigation?, shim?))
    }
}
