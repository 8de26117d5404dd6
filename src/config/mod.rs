//! Exporter configuration, read from the environment.

use anyhow::{anyhow, bail, Context, Result};
use duration_string::DurationString;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::fivetran::BASE_URL;

pub const API_KEY_VAR: &str = "FIVETRAN_API_KEY";
pub const API_SECRET_VAR: &str = "FIVETRAN_API_SECRET";
pub const API_CALL_TIMEOUT_VAR: &str = "FIVETRAN_API_CALL_TIMEOUT";
pub const COLLECTED_GROUPS_VAR: &str = "FIVETRAN_COLLECTED_GROUPS_CSV";
/// Older name of [`COLLECTED_GROUPS_VAR`], still read when the newer one is unset.
pub const LEGACY_COLLECTED_GROUPS_VAR: &str = "FIVETRAN_COLLECTED_GROUPIDS_CSV";
pub const METRICS_PORT_VAR: &str = "METRICS_PORT";
pub const API_URL_VAR: &str = "FIVETRAN_API_URL";
pub const GROUP_RESOLVER_VAR: &str = "FIVETRAN_GROUP_RESOLVER";

/// Which group resolution strategy to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverKind {
    /// Snapshot the group list once.
    #[default]
    Static,
    /// List groups on every resolution.
    Dynamic,
}

impl FromStr for ResolverKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(ResolverKind::Static),
            "dynamic" => Ok(ResolverKind::Dynamic),
            other => Err(anyhow!(
                "unknown group resolver '{}', expected 'static' or 'dynamic'",
                other
            )),
        }
    }
}

/// Complete exporter configuration
#[derive(Clone)]
pub struct ExporterConfig {
    pub api_key: String,
    pub api_secret: String,
    pub api_url: String,
    pub api_call_timeout: Duration,
    /// Group names to collect, in configured order
    pub group_names: Vec<String>,
    pub metrics_port: u16,
    pub resolver: ResolverKind,
}

// The secret must never reach the logs.
impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("api_call_timeout", &self.api_call_timeout)
            .field("group_names", &self.group_names)
            .field("metrics_port", &self.metrics_port)
            .field("resolver", &self.resolver)
            .finish()
    }
}

impl ExporterConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            let value = lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{} is required", key))?;
            info!(variable = key, "Read configuration variable");
            Ok(value)
        };

        let api_key = required(API_KEY_VAR)?;
        let api_secret = required(API_SECRET_VAR)?;
        let api_call_timeout = parse_timeout(&required(API_CALL_TIMEOUT_VAR)?)
            .with_context(|| format!("{} must be a duration such as '10s'", API_CALL_TIMEOUT_VAR))?;
        let (groups_var, groups_csv) = match required(COLLECTED_GROUPS_VAR) {
            Ok(csv) => (COLLECTED_GROUPS_VAR, csv),
            Err(_) => {
                let csv = required(LEGACY_COLLECTED_GROUPS_VAR).with_context(|| {
                    format!(
                        "{} (or {}) is required",
                        COLLECTED_GROUPS_VAR, LEGACY_COLLECTED_GROUPS_VAR
                    )
                })?;
                (LEGACY_COLLECTED_GROUPS_VAR, csv)
            }
        };
        let group_names = parse_group_names(&groups_csv)
            .with_context(|| format!("{} is invalid", groups_var))?;
        let metrics_port: u16 = required(METRICS_PORT_VAR)?
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid port number", METRICS_PORT_VAR))?;

        let api_url = lookup(API_URL_VAR)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| BASE_URL.to_string());
        let resolver = match lookup(GROUP_RESOLVER_VAR).filter(|v| !v.trim().is_empty()) {
            Some(value) => value
                .parse()
                .with_context(|| format!("{} is invalid", GROUP_RESOLVER_VAR))?,
            None => ResolverKind::default(),
        };

        Ok(Self {
            api_key,
            api_secret,
            api_url,
            api_call_timeout,
            group_names,
            metrics_port,
            resolver,
        })
    }
}

fn parse_timeout(value: &str) -> Result<Duration> {
    let duration: Duration = DurationString::from_str(value.trim())
        .map_err(|e| anyhow!("invalid duration '{}': {}", value, e))?
        .into();
    if duration.is_zero() {
        bail!("timeout must be greater than zero");
    }
    Ok(duration)
}

/// Split a comma-separated list of group names.
///
/// Entries are trimmed. An empty entry (`"a,,b"`, a trailing comma, or a
/// whitespace-only name) is an error rather than silently skipped. A repeated
/// name is dropped, keeping its first position, so each group is collected
/// exactly once per scrape.
pub fn parse_group_names(csv: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for (i, entry) in csv.split(',').enumerate() {
        let name = entry.trim();
        if name.is_empty() {
            bail!("group name at position {} is empty", i + 1);
        }
        if names.iter().any(|existing| existing == name) {
            warn!(group_name = %name, "Ignoring duplicate group name");
            continue;
        }
        names.push(name.to_string());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base_env() -> HashMap<String, String> {
        env(&[
            (API_KEY_VAR, "key"),
            (API_SECRET_VAR, "secret"),
            (API_CALL_TIMEOUT_VAR, "10s"),
            (COLLECTED_GROUPS_VAR, "Staging, Production"),
            (METRICS_PORT_VAR, "9100"),
        ])
    }

    fn load(vars: &HashMap<String, String>) -> Result<ExporterConfig> {
        ExporterConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_load_config() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.api_secret, "secret");
        assert_eq!(config.api_call_timeout, Duration::from_secs(10));
        assert_eq!(config.group_names, vec!["Staging", "Production"]);
        assert_eq!(config.metrics_port, 9100);
        assert_eq!(config.api_url, BASE_URL);
        assert_eq!(config.resolver, ResolverKind::Static);
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = base_env();
        vars.insert(API_URL_VAR.to_string(), "http://localhost:8080/".to_string());
        vars.insert(GROUP_RESOLVER_VAR.to_string(), "Dynamic".to_string());
        vars.insert(API_CALL_TIMEOUT_VAR.to_string(), "2m".to_string());

        let config = load(&vars).unwrap();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.resolver, ResolverKind::Dynamic);
        assert_eq!(config.api_call_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_missing_required_variable() {
        for key in [
            API_KEY_VAR,
            API_SECRET_VAR,
            API_CALL_TIMEOUT_VAR,
            COLLECTED_GROUPS_VAR,
            METRICS_PORT_VAR,
        ] {
            let mut vars = base_env();
            vars.remove(key);
            let err = load(&vars).unwrap_err();
            assert!(err.to_string().contains(key), "{}", err);

            vars.insert(key.to_string(), "  ".to_string());
            assert!(load(&vars).is_err());
        }
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = base_env();
        vars.insert(API_CALL_TIMEOUT_VAR.to_string(), "ten seconds".to_string());
        assert!(load(&vars).is_err());

        let mut vars = base_env();
        vars.insert(API_CALL_TIMEOUT_VAR.to_string(), "0s".to_string());
        assert!(load(&vars).is_err());

        let mut vars = base_env();
        vars.insert(METRICS_PORT_VAR.to_string(), "70000".to_string());
        assert!(load(&vars).is_err());

        let mut vars = base_env();
        vars.insert(GROUP_RESOLVER_VAR.to_string(), "cached".to_string());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_parse_group_names() {
        assert_eq!(parse_group_names("Staging").unwrap(), vec!["Staging"]);
        assert_eq!(
            parse_group_names(" Staging ,Production").unwrap(),
            vec!["Staging", "Production"]
        );
        assert!(parse_group_names("Staging,,Production").is_err());
        assert!(parse_group_names("Staging,").is_err());
        assert!(parse_group_names("Staging, ,Production").is_err());
    }

    #[test]
    fn test_legacy_group_variable() {
        let mut vars = base_env();
        vars.remove(COLLECTED_GROUPS_VAR);
        vars.insert(
            LEGACY_COLLECTED_GROUPS_VAR.to_string(),
            "Staging,Production".to_string(),
        );

        let config = load(&vars).unwrap();
        assert_eq!(config.group_names, vec!["Staging", "Production"]);

        // The current name wins when both are set.
        vars.insert(COLLECTED_GROUPS_VAR.to_string(), "Warehouse".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.group_names, vec!["Warehouse"]);

        // Invalid legacy values are reported under the legacy name.
        vars.remove(COLLECTED_GROUPS_VAR);
        vars.insert(LEGACY_COLLECTED_GROUPS_VAR.to_string(), "Staging,".to_string());
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains(LEGACY_COLLECTED_GROUPS_VAR), "{}", err);
    }

    #[test]
    fn test_duplicate_group_names_collected_once() {
        assert_eq!(
            parse_group_names("Production,Staging, Production").unwrap(),
            vec!["Production", "Staging"]
        );

        let mut vars = base_env();
        vars.insert(COLLECTED_GROUPS_VAR.to_string(), "Production,Production".to_string());
        assert_eq!(load(&vars).unwrap().group_names, vec!["Production"]);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = load(&base_env()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("\"secret\""));
        assert!(debug.contains("<redacted>"));
    }
}
