//! Host API compatibility shim.
//!
//! The emitted `scorm-api.js` finds whichever host API generation is
//! reachable and puts one surface in front of both: initialize, getValue,
//! setValue, commit, finish and getLastError. When no host is found the shim
//! runs standalone and every call is logged locally.

use serde::Serialize;

use crate::config::{BuildConfig, ScormVersion};
use crate::error::Result;

const SHIM: &str = include_str!("scorm_api.js");
const CONFIG_PLACEHOLDER: &str = "/*@SHIM_CONFIG@*/null";

/// Window property holding the 2004 API object.
pub const API_2004: &str = "API_1484_11";
/// Window property holding the 1.2 API object.
pub const API_12: &str = "API";
/// Ancestors searched above the starting window.
pub const MAX_ANCESTOR_DEPTH: u8 = 10;
/// Extra attempts for a failing host call before it is logged and dropped.
pub const RETRY_LIMIT: u8 = 1;

/// Window a discovery step starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryScope {
    /// The current window, then its parents.
    Window,
    /// The window that opened this one, then its parents.
    Opener,
    /// The topmost window only.
    Top,
}

/// One step of API discovery, run in order until an API is found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryStep {
    pub scope: DiscoveryScope,
    pub max_depth: u8,
    /// Property names checked at each window, in order.
    pub api_names: Vec<&'static str>,
}

/// Discovery order for `version`: the configured generation is tried first
/// at every window.
pub fn discovery_plan(version: ScormVersion) -> Vec<DiscoveryStep> {
    let names = match version {
        ScormVersion::Scorm2004 => vec![API_2004, API_12],
        ScormVersion::Scorm12 => vec![API_12, API_2004],
    };
    vec![
        DiscoveryStep {
            scope: DiscoveryScope::Window,
            max_depth: MAX_ANCESTOR_DEPTH,
            api_names: names.clone(),
        },
        DiscoveryStep {
            scope: DiscoveryScope::Opener,
            max_depth: MAX_ANCESTOR_DEPTH,
            api_names: names.clone(),
        },
        DiscoveryStep {
            scope: DiscoveryScope::Top,
            max_depth: 0,
            api_names: names,
        },
    ]
}

/// Settings embedded into the delivered shim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShimConfig {
    pub scorm_version: ScormVersion,
    pub discovery: Vec<DiscoveryStep>,
    /// Host error codes logged as warnings and otherwise ignored.
    pub tolerated_error_codes: Vec<String>,
    pub retry_limit: u8,
}

impl ShimConfig {
    pub fn new(config: &BuildConfig) -> Self {
        let mut tolerated: Vec<String> = config
            .tolerated_error_codes
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        tolerated.sort();
        tolerated.dedup();
        Self {
            scorm_version: config.scorm_version,
            discovery: discovery_plan(config.scorm_version),
            tolerated_error_codes: tolerated,
            retry_limit: RETRY_LIMIT,
        }
    }
}

/// The shim script configured for `config`.
pub fn emit_shim_script(config: &BuildConfig) -> Result<String> {
    let shim = ShimConfig::new(config);
    let data = serde_json::to_string(&shim)?.replace("</", "<\\/");
    let script = SHIM.replacen(CONFIG_PLACEHOLDER, &data, 1);
    tracing::debug!(
        version = %shim.scorm_version,
        tolerated = ?shim.tolerated_error_codes,
        "emitted shim script"
    );
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_generation_first() {
        let plan = discovery_plan(ScormVersion::Scorm12);
        assert_eq!(plan[0].api_names, vec!["API", "API_1484_11"]);
        let plan = discovery_plan(ScormVersion::Scorm2004);
        assert_eq!(plan[0].api_names, vec!["API_1484_11", "API"]);
    }

    #[test]
    fn test_discovery_order() {
        let plan = discovery_plan(ScormVersion::Scorm2004);
        let scopes: Vec<_> = plan.iter().map(|s| s.scope).collect();
        assert_eq!(
            scopes,
            vec![DiscoveryScope::Window, DiscoveryScope::Opener, DiscoveryScope::Top]
        );
        assert_eq!(plan[0].max_depth, 10);
        assert_eq!(plan[2].max_depth, 0);
    }

    #[test]
    fn test_tolerated_codes_cleaned() {
        let mut config = BuildConfig::default();
        config.tolerated_error_codes = vec!["403".into(), " 101 ".into(), "".into(), "403".into()];
        let shim = ShimConfig::new(&config);
        assert_eq!(shim.tolerated_error_codes, vec!["101", "403"]);
    }

    #[test]
    fn test_script_embeds_config() {
        let script = emit_shim_script(&BuildConfig::default()).unwrap();
        assert!(!script.contains(CONFIG_PLACEHOLDER));
        assert!(script.contains("\"scormVersion\":\"2004\""));
        assert!(script.contains("\"toleratedErrorCodes\":[\"101\",\"103\",\"403\"]"));
        assert!(script.contains("\"scope\":\"opener\""));
        for name in ["initialize", "getValue", "setValue", "commit", "finish", "getLastError"] {
            assert!(script.contains(&format!("{name}: ")), "missing {name}");
        }
    }
}
