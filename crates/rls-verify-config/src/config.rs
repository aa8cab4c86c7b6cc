// crates/rls-verify-config/src/config.rs
// ============================================================================
// Module: RLS Verify Configuration
// Description: Configuration loading and validation for the RLS harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: rls-verify-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then overlaid with environment overrides for the target credentials.
//! Missing or invalid configuration fails closed: no request is sent to a
//! backend the harness cannot fully describe.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use rls_verify_core::Endpoint;
use rls_verify_core::Role;
use rls_verify_core::RunPlan;
use rls_verify_core::SecretKey;
use rls_verify_core::Suite;
use rls_verify_core::transport::DEFAULT_USER_AGENT;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::env::ConfigEnv;
use crate::env::read_env_nonempty;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "rls-verify.toml";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum request timeout in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 600_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Harness configuration loaded from `rls-verify.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Target backend and credentials.
    #[serde(default)]
    pub target: TargetConfig,
    /// Roles and suites to run.
    #[serde(default)]
    pub plan: PlanConfig,
    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Run report output.
    #[serde(default)]
    pub report: ReportConfig,
    /// Progress event log output.
    #[serde(default)]
    pub events: EventsConfig,
}

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// A missing file at the default location is treated as an empty config
    /// so the target can come from environment overrides alone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        let mut config = if !explicit && !resolved.exists() {
            Self::default()
        } else {
            Self::from_file(&resolved)?
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses one config file without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, too large, not
    /// UTF-8, or not valid TOML for this model.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses configuration text without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML does not match the model.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Overlays target values from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is empty or not UTF-8.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env_nonempty(ConfigEnv::BaseUrl)? {
            self.target.base_url = Some(value);
        }
        if let Some(value) = read_env_nonempty(ConfigEnv::AnonKey)? {
            self.target.anon_key = Some(value);
        }
        if let Some(value) = read_env_nonempty(ConfigEnv::ServiceKey)? {
            self.target.service_key = Some(value);
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target.validate()?;
        self.plan.validate()?;
        self.http.validate()?;
        if let Some(dir) = &self.report.dir {
            validate_path_field("report.dir", dir)?;
        }
        if let Some(path) = &self.events.path {
            validate_path_field("events.path", path)?;
        }
        Ok(())
    }

    /// Builds the core endpoint from the target and HTTP sections.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a target value is missing or the
    /// base URL is unusable.
    pub fn to_endpoint(&self) -> Result<Endpoint, ConfigError> {
        let base_url = parse_base_url(required("target.base_url", &self.target.base_url)?)?;
        let anon_key = required("target.anon_key", &self.target.anon_key)?;
        let service_key = required("target.service_key", &self.target.service_key)?;
        let mut endpoint =
            Endpoint::new(base_url, SecretKey::new(anon_key), SecretKey::new(service_key));
        endpoint.timeout = self.http.timeout_ms.map(Duration::from_millis);
        endpoint.user_agent.clone_from(&self.http.user_agent);
        Ok(endpoint)
    }

    /// Returns the configured run plan.
    #[must_use]
    pub fn to_plan(&self) -> RunPlan {
        RunPlan {
            roles: self.plan.roles.clone(),
            suites: self.plan.suites.clone(),
        }
    }
}

/// Target backend and the keys the harness holds for it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Backend base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Public anonymous key.
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Service key that bypasses row-level security.
    #[serde(default)]
    pub service_key: Option<String>,
}

impl TargetConfig {
    /// Validates that every target value is present and usable.
    fn validate(&self) -> Result<(), ConfigError> {
        parse_base_url(required("target.base_url", &self.base_url)?)?;
        required("target.anon_key", &self.anon_key)?;
        required("target.service_key", &self.service_key)?;
        Ok(())
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("TargetConfig")
            .field("base_url", &self.base_url)
            .field("anon_key", &redact(&self.anon_key))
            .field("service_key", &redact(&self.service_key))
            .finish()
    }
}

/// Roles and suites selected for a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    /// Roles to exercise.
    #[serde(default = "default_roles")]
    pub roles: Vec<Role>,
    /// Suites to run; empty selects all.
    #[serde(default)]
    pub suites: Vec<Suite>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            roles: default_roles(),
            suites: Vec::new(),
        }
    }
}

impl PlanConfig {
    /// Rejects empty role lists and duplicate entries.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.roles.is_empty() {
            return Err(ConfigError::Invalid("plan.roles must be non-empty".to_string()));
        }
        if self.roles.iter().collect::<BTreeSet<_>>().len() != self.roles.len() {
            return Err(ConfigError::Invalid("plan.roles contains duplicates".to_string()));
        }
        if self.suites.iter().collect::<BTreeSet<_>>().len() != self.suites.len() {
            return Err(ConfigError::Invalid("plan.suites contains duplicates".to_string()));
        }
        Ok(())
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Request timeout in milliseconds; unset keeps the transport default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// User agent for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Validates timeout bounds and the user agent.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(timeout) = self.timeout_ms
            && !(1..=MAX_TIMEOUT_MS).contains(&timeout)
        {
            return Err(ConfigError::Invalid(format!(
                "http.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("http.user_agent must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// Run report output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Directory receiving `summary.json` and `summary.md`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Progress event log output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// JSON Lines file that receives one event per line.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default role list: every role in canonical order.
fn default_roles() -> Vec<Role> {
    Role::ALL.to_vec()
}

/// Default user agent.
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Resolves the config path and whether it was named explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Some(env_path) = read_env_nonempty(ConfigEnv::ConfigPath)? {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    Ok(())
}

/// Validates a configured output path.
fn validate_path_field(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Returns a required, non-blank value.
fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ConfigError::Invalid(format!("{field} is required"))),
    }
}

/// Parses the backend base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|err| ConfigError::Invalid(format!("target.base_url is invalid: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid("target.base_url must use http or https".to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Invalid("target.base_url must include a host".to_string()));
    }
    if url.query().is_some() {
        return Err(ConfigError::Invalid("target.base_url must not carry a query".to_string()));
    }
    Ok(url)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::use_debug, reason = "Test-only assertions.")]

    use std::time::Duration;

    use rls_verify_core::Role;
    use rls_verify_core::Suite;

    use super::ConfigError;
    use super::HarnessConfig;

    const VALID: &str = r#"
[target]
base_url = "https://db.example.test"
anon_key = "anon"
service_key = "service"

[plan]
roles = ["team_member", "system_admin"]
suites = ["rocks", "rpc_start_new_week"]

[http]
timeout_ms = 2500
"#;

    const TARGET: &str =
        "[target]\nbase_url = \"https://d.test\"\nanon_key = \"a\"\nservice_key = \"s\"\n";

    fn invalid(content: &str) -> String {
        let err = HarnessConfig::from_toml_str(content).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err:?}");
        err.to_string()
    }

    #[test]
    fn valid_config_converts_to_endpoint_and_plan() {
        let config = HarnessConfig::from_toml_str(VALID).unwrap();
        config.validate().unwrap();

        let endpoint = config.to_endpoint().unwrap();
        assert_eq!(endpoint.base_url.as_str(), "https://db.example.test/");
        assert_eq!(endpoint.service_key.expose(), "service");
        assert_eq!(endpoint.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(endpoint.user_agent, "rls-verify/0.1");

        let plan = config.to_plan();
        assert_eq!(plan.roles, vec![Role::TeamMember, Role::SystemAdmin]);
        assert_eq!(plan.suites, vec![Suite::Rocks, Suite::RpcStartNewWeek]);
    }

    #[test]
    fn omitted_plan_selects_every_role_and_suite() {
        let config = HarnessConfig::from_toml_str(TARGET).unwrap();
        config.validate().unwrap();
        assert_eq!(config.plan.roles, Role::ALL.to_vec());
        assert!(config.plan.suites.is_empty());
    }

    #[test]
    fn missing_target_values_fail_closed() {
        assert!(invalid("").contains("target.base_url is required"));
        let message = invalid(&TARGET.replace("service_key = \"s\"\n", ""));
        assert!(message.contains("target.service_key is required"));
        let message = invalid(&TARGET.replace("anon_key = \"a\"", "anon_key = \" \""));
        assert!(message.contains("target.anon_key is required"));
    }

    #[test]
    fn base_url_must_be_http_with_host_and_no_query() {
        let target = |url: &str| {
            format!("[target]\nbase_url = \"{url}\"\nanon_key = \"a\"\nservice_key = \"s\"\n")
        };
        assert!(invalid(&target("ftp://db.example.test")).contains("http or https"));
        assert!(invalid(&target("https://db.example.test/?x=1")).contains("query"));
        assert!(invalid(&target("not a url")).contains("invalid"));
    }

    #[test]
    fn plan_rejects_empty_roles_and_duplicates() {
        let base = TARGET;
        assert!(invalid(&format!("{base}[plan]\nroles = []\n")).contains("non-empty"));
        let dup_roles = format!("{base}[plan]\nroles = [\"executive\", \"executive\"]\n");
        assert!(invalid(&dup_roles).contains("plan.roles contains duplicates"));
        let dup_suites = format!("{base}[plan]\nsuites = [\"groups\", \"groups\"]\n");
        assert!(invalid(&dup_suites).contains("plan.suites contains duplicates"));
    }

    #[test]
    fn http_bounds_are_enforced() {
        let base = TARGET;
        assert!(invalid(&format!("{base}[http]\ntimeout_ms = 0\n")).contains("timeout_ms"));
        assert!(invalid(&format!("{base}[http]\ntimeout_ms = 600001\n")).contains("timeout_ms"));
        assert!(invalid(&format!("{base}[http]\nuser_agent = \"\"\n")).contains("user_agent"));
    }

    #[test]
    fn unknown_roles_and_fields_are_parse_errors() {
        let err = HarnessConfig::from_toml_str("[plan]\nroles = [\"superuser\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = HarnessConfig::from_toml_str("[target]\nbase = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = HarnessConfig::from_toml_str(VALID).unwrap();
        let rendered = format!("{:?}", config.target);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("\"service\""));
        assert!(!rendered.contains("\"anon\""));
    }
}
