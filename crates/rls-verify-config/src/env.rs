// crates/rls-verify-config/src/env.rs
// ============================================================================
// Module: Config Environment
// Description: Environment variables recognized by the harness config.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 and empty values fail closed.

use crate::config::ConfigError;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys read by the configuration loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEnv {
    /// Config file path override.
    ConfigPath,
    /// Target base URL override.
    BaseUrl,
    /// Anonymous key override.
    AnonKey,
    /// Service key override.
    ServiceKey,
}

impl ConfigEnv {
    /// Every recognized key.
    pub const ALL: [Self; 4] = [Self::ConfigPath, Self::BaseUrl, Self::AnonKey, Self::ServiceKey];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigPath => "RLS_VERIFY_CONFIG",
            Self::BaseUrl => "RLS_VERIFY_BASE_URL",
            Self::AnonKey => "RLS_VERIFY_ANON_KEY",
            Self::ServiceKey => "RLS_VERIFY_SERVICE_KEY",
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the value contains invalid UTF-8.
pub fn read_env_strict(key: ConfigEnv) -> Result<Option<String>, ConfigError> {
    let name = key.as_str();
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{name} must be valid UTF-8")))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the variable is set but blank.
pub fn read_env_nonempty(key: ConfigEnv) -> Result<Option<String>, ConfigError> {
    match read_env_strict(key)? {
        Some(value) if value.trim().is_empty() => {
            Err(ConfigError::Invalid(format!("{} must not be empty", key.as_str())))
        }
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}
