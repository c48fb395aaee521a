//! Package assembly.
//!
//! Collects the rendered artifacts, the two scripts and the used media into
//! one archive. Nothing is written unless every local reference resolves and
//! the manifest lists exactly what is present.

mod references;

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

pub use references::{ManifestListing, html_references, manifest_listing, resolve_path};

use crate::error::{BuildWarning, Error, ManifestMismatch, Result};
use crate::model::ResolvedMedia;
use crate::render::{ENTRY_PATH, MANIFEST_PATH, RenderedPackage};

const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Check that `path` is a safe archive-relative path.
pub fn validate_path(path: &str) -> Result<()> {
    let reason = if path.is_empty() {
        Some("empty path")
    } else if path.starts_with('/') {
        Some("absolute path")
    } else if path.contains('\\') {
        Some("backslash separator")
    } else if path.split('/').any(str::is_empty) {
        Some("empty segment")
    } else if path.split('/').any(|s| s == "..") {
        Some("parent segment")
    } else if path.split('/').any(|s| s == ".") {
        Some("current-directory segment")
    } else if path.split('/').next().is_some_and(|s| s.contains(':')) {
        Some("scheme or drive prefix")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(Error::InvalidPath {
            path: path.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// One archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl PackageFile {
    fn is_html(&self) -> bool {
        self.mime_type == "text/html"
    }
}

/// Result of a successful assembly.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub archive: Vec<u8>,
    pub warnings: Vec<BuildWarning>,
    /// Files the manifest lists, sorted.
    pub manifest_files: Vec<String>,
}

/// Archive contents, keyed and written in path order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    files: BTreeMap<String, PackageFile>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gather everything a build produced: rendered artifacts, the scripts
    /// stored under `scripts`, and the media the documents use.
    pub fn from_parts(
        rendered: RenderedPackage,
        scripts: impl IntoIterator<Item = (String, String)>,
        media: &ResolvedMedia,
    ) -> Result<Self> {
        let mut package = Self::new();
        for (path, artifact) in rendered.artifacts {
            package.insert(path, artifact.mime_type, artifact.text.into_bytes())?;
        }
        for (path, script) in scripts {
            package.insert(path, "text/javascript", script.into_bytes())?;
        }
        for key in &rendered.media_used {
            if let Some(crate::model::ResolvedEntry::File(asset)) = media.get(key) {
                package.insert(asset.path.clone(), asset.mime_type.clone(), asset.data.clone())?;
            }
        }
        Ok(package)
    }

    /// Add a file. Replaces any earlier file at the same path.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<()> {
        let path = path.into();
        validate_path(&path)?;
        self.files.insert(
            path,
            PackageFile {
                mime_type: mime_type.into(),
                data,
            },
        );
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&PackageFile> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check references against contents and manifest.
    ///
    /// Returns the manifest's file list and a warning per file nothing
    /// references.
    pub fn verify(&self) -> Result<(Vec<String>, Vec<BuildWarning>)> {
        let missing_required: Vec<String> = [MANIFEST_PATH, ENTRY_PATH]
            .into_iter()
            .filter(|p| !self.contains(p))
            .map(str::to_string)
            .collect();
        if !missing_required.is_empty() {
            return Err(Error::IncompletePackage {
                missing: missing_required,
            });
        }

        let manifest_text = self
            .get(MANIFEST_PATH)
            .map(|f| String::from_utf8_lossy(&f.data).into_owned())
            .unwrap_or_default();
        let listing = manifest_listing(&manifest_text)?;

        let mut referenced: BTreeSet<String> = listing.entry_points.clone();
        for (path, file) in &self.files {
            if file.is_html() {
                let text = String::from_utf8_lossy(&file.data);
                referenced.extend(html_references(path, &text));
            }
        }

        let mismatch = ManifestMismatch {
            missing: referenced
                .iter()
                .filter(|p| !self.contains(p))
                .cloned()
                .collect(),
            unlisted: referenced
                .iter()
                .filter(|p| self.contains(p) && !listing.files.contains(*p))
                .cloned()
                .collect(),
            dangling: listing
                .files
                .iter()
                .filter(|p| !self.contains(p))
                .cloned()
                .collect(),
        };
        if !mismatch.is_empty() {
            tracing::warn!(%mismatch, "package references do not match contents");
            return Err(Error::ManifestMismatch(mismatch));
        }

        let warnings: Vec<BuildWarning> = self
            .paths()
            .filter(|p| *p != MANIFEST_PATH && !referenced.contains(*p))
            .map(|p| {
                tracing::warn!(path = p, "packaged file is never referenced");
                BuildWarning::UnreferencedFile(p.to_string())
            })
            .collect();

        Ok((listing.files.into_iter().collect(), warnings))
    }

    /// Write the zip. Members are sorted by path and carry a fixed timestamp
    /// and permissions, so identical packages produce identical bytes.
    pub fn write_archive(&self, compression_level: Option<u32>) -> Result<Vec<u8>> {
        let level = compression_level.unwrap_or(DEFAULT_COMPRESSION_LEVEL).min(9);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level)))
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, file) in &self.files {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(&file.data)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Verify and write.
    pub fn assemble(self, compression_level: Option<u32>) -> Result<Assembled> {
        let (manifest_files, warnings) = self.verify()?;
        let archive = self.write_archive(compression_level)?;
        tracing::info!(
            files = self.len(),
            bytes = archive.len(),
            warnings = warnings.len(),
            "assembled package"
        );
        Ok(Assembled {
            archive,
            warnings,
            manifest_files,
        })
    }
}
