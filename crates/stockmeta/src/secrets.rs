//! Credential resolution for the inference endpoint.
//!
//! The API key can come from several sources, checked in priority order:
//!
//! 1. **Direct value** - typed by the user or passed on the command line
//! 2. **File reference** - e.g. a Docker secret at `/run/secrets/gemini_key`
//! 3. **Env var reference** - e.g. `GEMINI_API_KEY`
//!
//! The resolved key lives only in memory, wrapped in [`SecretString`] so it
//! never shows up in `Debug` output or logs.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::fs;

/// Keys of this many characters or fewer are rejected outright.
pub const MIN_CREDENTIAL_LENGTH: usize = 10;

/// Default environment variable consulted for the API key.
pub const DEFAULT_API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("API key is too short (must be longer than 10 characters)")]
    CredentialTooShort,
}

/// Result type for secret resolution.
pub type Result<T> = std::result::Result<T, SecretError>;

/// The bearer key used to authorize extraction calls.
///
/// Read-only once constructed; shared by reference with every extractor
/// call of a run.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Builds a credential from user input. Surrounding whitespace is
    /// dropped; anything not longer than [`MIN_CREDENTIAL_LENGTH`] is refused.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.chars().count() <= MIN_CREDENTIAL_LENGTH {
            return Err(SecretError::CredentialTooShort);
        }
        Ok(Self(SecretString::from(trimmed.to_string())))
    }

    /// Builds a credential from an already-resolved secret.
    pub fn from_secret(secret: SecretString) -> Result<Self> {
        Self::new(secret.expose_secret())
    }

    /// Exposes the raw key. Only the extractor's request builder should call this.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Resolves a secret from multiple sources in priority order:
/// 1. Direct value (if provided and non-empty)
/// 2. File contents (if path provided)
/// 3. Environment variable (if name provided)
///
/// # Examples
///
/// ```ignore
/// use stockmeta::secrets::resolve_secret;
///
/// let key = resolve_secret(None, Some("~/.secrets/gemini"), Some("GEMINI_API_KEY"))?;
/// ```
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct {
        if !value.is_empty() {
            return Ok(SecretString::from(value.to_string()));
        }
    }

    if let Some(path) = file_path {
        if !path.is_empty() {
            let expanded = expand_home(path);
            return match fs::read_to_string(&expanded) {
                Ok(content) => Ok(SecretString::from(content.trim().to_string())),
                Err(e) => Err(SecretError::FileReadError {
                    path: expanded,
                    source: e,
                }),
            };
        }
    }

    if let Some(var_name) = env_var {
        if !var_name.is_empty() {
            return match std::env::var(var_name) {
                // env vars may carry trailing newlines
                Ok(value) => Ok(SecretString::from(value.trim().to_string())),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: var_name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: var_name.to_string(),
                }),
            };
        }
    }

    Err(SecretError::NoSourceProvided)
}

/// Expands `~` to the user's home directory (HOME, then USERPROFILE).
/// `~user/path` is not supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
