//! Build configuration.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Host-integration standard the package targets.
///
/// The delivered shim understands both generations regardless; this picks
/// the manifest schema and which API object is searched for first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScormVersion {
    #[serde(rename = "1.2")]
    Scorm12,
    #[default]
    #[serde(rename = "2004")]
    Scorm2004,
}

impl ScormVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            ScormVersion::Scorm12 => "1.2",
            ScormVersion::Scorm2004 => "2004",
        }
    }
}

impl fmt::Display for ScormVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScormVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "1.2" | "12" => Ok(ScormVersion::Scorm12),
            "2004" | "2004.3" | "2004 3rd Edition" => Ok(ScormVersion::Scorm2004),
            other => Err(format!("unsupported SCORM version '{other}'")),
        }
    }
}

/// How the course outline lets the learner move around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Outline jumps stop at the first unsatisfied gate.
    #[default]
    Linear,
    /// Outline jumps go anywhere. Next and Finish still respect gates.
    Free,
}

impl NavigationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            NavigationMode::Linear => "linear",
            NavigationMode::Free => "free",
        }
    }
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NavigationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(NavigationMode::Linear),
            "free" => Ok(NavigationMode::Free),
            other => Err(format!("unsupported navigation mode '{other}'")),
        }
    }
}

/// Configuration for a package build.
///
/// Deserializes from camelCase JSON; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Emit a strict Content-Security-Policy. Off by default because many
    /// hosts inject inline scripts a strict policy would block.
    pub enable_strict_content_policy: bool,
    pub scorm_version: ScormVersion,
    /// Overrides the pass mark from the course document.
    pub pass_mark: Option<u8>,
    /// Project whose media inventory is consulted before fetching.
    pub project_id: Option<String>,
    pub fetch_timeout_ms: u64,
    /// Ceiling for the whole media stage.
    pub build_timeout_ms: u64,
    pub max_concurrent_fetches: usize,
    /// Host error codes the shim logs and ignores.
    pub tolerated_error_codes: Vec<String>,
    /// Deflate level (0-9, default 6).
    pub compression_level: Option<u32>,
    pub navigation_mode: NavigationMode,
    /// A failed assessment may be submitted again.
    pub allow_retake: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            enable_strict_content_policy: false,
            scorm_version: ScormVersion::default(),
            pass_mark: None,
            project_id: None,
            fetch_timeout_ms: 10_000,
            build_timeout_ms: 120_000,
            max_concurrent_fetches: 4,
            tolerated_error_codes: vec!["101".into(), "103".into(), "403".into()],
            compression_level: None,
            navigation_mode: NavigationMode::default(),
            allow_retake: true,
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let text = crate::util::decode_text(&bytes);
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_strict_content_policy(mut self, enabled: bool) -> Self {
        self.enable_strict_content_policy = enabled;
        self
    }

    pub fn with_scorm_version(mut self, version: ScormVersion) -> Self {
        self.scorm_version = version;
        self
    }

    pub fn with_pass_mark(mut self, pass_mark: u8) -> Self {
        self.pass_mark = Some(pass_mark);
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n;
        self
    }

    pub fn with_navigation_mode(mut self, mode: NavigationMode) -> Self {
        self.navigation_mode = mode;
        self
    }

    pub fn with_allow_retake(mut self, allow: bool) -> Self {
        self.allow_retake = allow;
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_millis(self.build_timeout_ms)
    }

    /// Worker bound, never below one.
    pub fn fetch_concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }
}
