//! Credential loading and configuration fingerprints.
//!
//! Configuration is read from an [`EnvSource`] rather than straight from `std::env` so the
//! client cache can be exercised against an in-memory environment.

use parking_lot::RwLock;
use sha2::Digest as _;
use std::collections::HashMap;
use thiserror::Error;

pub const API_KEY_VAR: &str = "KINSTA_API_KEY";
pub const COMPANY_ID_VAR: &str = "KINSTA_COMPANY_ID";
pub const BASE_URL_VAR: &str = "KINSTA_API_BASE_URL";

/// Production API root used when `KINSTA_API_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.kinsta.com/v2";

/// A read-only view of environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mutable in-memory environment.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MapEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.vars.write().remove(key);
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let vars = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            vars: RwLock::new(vars),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.read().get(key).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "KINSTA_API_KEY environment variable is required. \
         Generate an API key in MyKinsta under Company settings > API Keys."
    )]
    MissingApiKey,
    #[error(
        "KINSTA_COMPANY_ID environment variable is required. \
         Find your company ID in MyKinsta under Company settings > Billing details."
    )]
    MissingCompanyId,
}

/// Credentials and endpoint for the Kinsta API.
///
/// Immutable once loaded; a changed environment produces a new value.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    api_key: String,
    company_id: String,
    base_url: String,
}

impl Configuration {
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        company_id: impl Into<String>,
        base_url: impl AsRef<str>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            company_id: company_id.into(),
            base_url: normalize_base_url(base_url.as_ref()),
        }
    }

    /// Load configuration from `env`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the missing variable if the API key or company ID is absent or
    /// blank.
    pub fn load(env: &dyn EnvSource) -> Result<Self, ConfigError> {
        let api_key = non_blank(env.var(API_KEY_VAR)).ok_or(ConfigError::MissingApiKey)?;
        let company_id =
            non_blank(env.var(COMPANY_ID_VAR)).ok_or(ConfigError::MissingCompanyId)?;
        Ok(Self::new(api_key, company_id, base_url(env)))
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("api_key", &"<redacted>")
            .field("company_id", &self.company_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// True when both mandatory variables are present. Performs no network I/O.
#[must_use]
pub fn is_configured(env: &dyn EnvSource) -> bool {
    non_blank(env.var(API_KEY_VAR)).is_some() && non_blank(env.var(COMPANY_ID_VAR)).is_some()
}

/// The API root `env` selects, normalized the way [`Configuration`] stores it.
#[must_use]
pub fn base_url(env: &dyn EnvSource) -> String {
    let raw = non_blank(env.var(BASE_URL_VAR)).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    normalize_base_url(&raw)
}

/// Deterministic digest of the raw configuration variables.
///
/// An unset variable and a variable set to the empty string produce different fingerprints.
#[must_use]
pub fn fingerprint(env: &dyn EnvSource) -> String {
    let joined = [API_KEY_VAR, COMPANY_ID_VAR, BASE_URL_VAR]
        .iter()
        .map(|key| match env.var(key) {
            Some(v) => format!("={}:{v}", v.len()),
            None => "!".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n");
    hex::encode(sha2::Sha256::digest(joined.as_bytes()))
}

pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> MapEnv {
        [
            (API_KEY_VAR, "key-1"),
            (COMPANY_ID_VAR, "company-1"),
            (BASE_URL_VAR, "https://example.test/v2/"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn load_reads_all_fields_and_normalizes_base_url() {
        let cfg = Configuration::load(&full_env()).expect("configured");
        assert_eq!(cfg.api_key(), "key-1");
        assert_eq!(cfg.company_id(), "company-1");
        assert_eq!(cfg.base_url(), "https://example.test/v2");
    }

    #[test]
    fn load_defaults_base_url() {
        let env = full_env();
        env.remove(BASE_URL_VAR);
        let cfg = Configuration::load(&env).expect("configured");
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn base_url_matches_loaded_configuration() {
        let env: MapEnv = [(BASE_URL_VAR, " https://example.test/v2// ")].into_iter().collect();
        assert_eq!(base_url(&env), "https://example.test/v2");
        assert_eq!(base_url(&MapEnv::new()), DEFAULT_BASE_URL);
        assert_eq!(
            base_url(&full_env()),
            Configuration::load(&full_env()).expect("configured").base_url()
        );
    }

    #[test]
    fn load_reports_missing_api_key_first() {
        let env = MapEnv::new();
        let err = Configuration::load(&env).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
        assert!(err.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn load_treats_blank_company_id_as_missing() {
        let env = full_env();
        env.set(COMPANY_ID_VAR, "   ");
        let err = Configuration::load(&env).unwrap_err();
        assert_eq!(err, ConfigError::MissingCompanyId);
        assert!(err.to_string().contains(COMPANY_ID_VAR));
        assert!(!is_configured(&env));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let cfg = Configuration::load(&full_env()).expect("configured");
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("key-1"));
        assert!(dbg.contains("company-1"));
    }

    #[test]
    fn fingerprint_is_stable_without_changes() {
        let env = full_env();
        assert_eq!(fingerprint(&env), fingerprint(&env));
    }

    #[test]
    fn fingerprint_changes_with_each_field() {
        let base = fingerprint(&full_env());
        for key in [API_KEY_VAR, COMPANY_ID_VAR, BASE_URL_VAR] {
            let env = full_env();
            env.set(key, "changed");
            assert_ne!(fingerprint(&env), base, "changing {key} must change fingerprint");
        }
    }

    #[test]
    fn fingerprint_distinguishes_unset_from_empty() {
        let unset = full_env();
        unset.remove(BASE_URL_VAR);
        let empty = full_env();
        empty.set(BASE_URL_VAR, "");
        assert_ne!(fingerprint(&unset), fingerprint(&empty));
    }

    #[test]
    fn fingerprint_does_not_alias_across_field_boundaries() {
        let a: MapEnv = [(API_KEY_VAR, "ab"), (COMPANY_ID_VAR, "c")].into_iter().collect();
        let b: MapEnv = [(API_KEY_VAR, "a"), (COMPANY_ID_VAR, "bc")].into_iter().collect();
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
