//! Process-wide configuration for the identifier lifecycle core.
//!
//! Constructed once at startup and threaded through registry, lifecycle and
//! worker construction; no ambient global state. All of it is read-only at
//! runtime and safe to share across concurrent worker invocations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{RegistrarError, Result};
use crate::providers::ProviderCategory;

/// Credentials and endpoint for one managed registration authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityCredentials {
    pub username: String,
    pub password: String,
    /// Identifier namespace owned at the authority, e.g. a DOI prefix `10.1234`
    pub prefix: String,
    pub base_url: String,
    pub enabled: bool,
}

impl AuthorityCredentials {
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty() && !self.prefix.is_empty()
    }
}

/// Per-scheme policy: which providers may govern the scheme and when an
/// identifier of the scheme must exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeConfig {
    /// Whether publish must mint an identifier of this scheme when absent
    pub required_at_publish: bool,
    /// Provider names allowed for this scheme
    pub provider_names: Vec<String>,
    /// Provider used when the caller does not choose one
    pub default_provider: String,
}

/// One row of the provider-transition table: which categories a new version
/// may move to given the category the previous version used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub allowed_next: Vec<ProviderCategory>,
    /// Message template; `{scheme}` is substituted at check time.
    pub message: String,
}

/// Top-level configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// scheme -> policy
    pub scheme_policies: HashMap<String, SchemeConfig>,
    /// previous provider category -> rule for the next version
    pub provider_transitions: HashMap<ProviderCategory, TransitionRule>,
    pub datacite: AuthorityCredentials,
    pub crossref: AuthorityCredentials,
    /// OAI identifier prefix, e.g. `oai:repo.example.org:`
    pub oai_prefix: String,
    /// Base URL of the repository landing pages
    pub landing_base_url: String,
    /// When false, the optional-DOI policy applies and cross-version
    /// provider-transition checks run on draft updates.
    pub doi_required: bool,
    /// Sandbox/test deployments tolerate authority "not found" on restore.
    pub sandbox_mode: bool,
    pub retry_limit: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        let mut scheme_policies = HashMap::new();
        scheme_policies.insert(
            "doi".to_string(),
            SchemeConfig {
                required_at_publish: true,
                provider_names: vec!["datacite".to_string(), "external".to_string()],
                default_provider: "datacite".to_string(),
            },
        );
        scheme_policies.insert(
            "oai".to_string(),
            SchemeConfig {
                required_at_publish: true,
                provider_names: vec!["oai".to_string()],
                default_provider: "oai".to_string(),
            },
        );

        let mut provider_transitions = HashMap::new();
        provider_transitions.insert(
            ProviderCategory::Managed,
            TransitionRule {
                allowed_next: vec![ProviderCategory::Managed],
                message: "a {scheme} registered by a managed authority cannot be removed \
                          or replaced with an externally supplied one"
                    .to_string(),
            },
        );
        provider_transitions.insert(
            ProviderCategory::External,
            TransitionRule {
                allowed_next: vec![ProviderCategory::External, ProviderCategory::Managed],
                message: "an externally supplied {scheme} cannot be removed once a version \
                          has been published with it"
                    .to_string(),
            },
        );
        provider_transitions.insert(
            ProviderCategory::NotNeeded,
            TransitionRule {
                allowed_next: vec![
                    ProviderCategory::NotNeeded,
                    ProviderCategory::Managed,
                    ProviderCategory::External,
                ],
                message: String::new(),
            },
        );

        Self {
            scheme_policies,
            provider_transitions,
            datacite: AuthorityCredentials {
                username: String::new(),
                password: String::new(),
                prefix: "10.1234".to_string(),
                base_url: "https://api.test.datacite.example.org".to_string(),
                enabled: true,
            },
            crossref: AuthorityCredentials {
                username: String::new(),
                password: String::new(),
                prefix: "10.5678".to_string(),
                base_url: "https://api.test.crossref.example.org".to_string(),
                enabled: false,
            },
            oai_prefix: "oai:repo.example.org:".to_string(),
            landing_base_url: "https://repo.example.org".to_string(),
            doi_required: false,
            sandbox_mode: true,
            retry_limit: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 60000,
        }
    }
}

impl RegistrarConfig {
    /// Build from defaults with environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(user) = std::env::var("REGISTRAR_DATACITE_USERNAME") {
            config.datacite.username = user;
        }
        if let Ok(password) = std::env::var("REGISTRAR_DATACITE_PASSWORD") {
            config.datacite.password = password;
        }
        if let Ok(prefix) = std::env::var("REGISTRAR_DATACITE_PREFIX") {
            config.datacite.prefix = prefix;
        }
        if let Ok(url) = std::env::var("REGISTRAR_DATACITE_BASE_URL") {
            config.datacite.base_url = url;
        }
        if let Ok(url) = std::env::var("REGISTRAR_LANDING_BASE_URL") {
            config.landing_base_url = url;
        }
        if let Ok(sandbox) = std::env::var("REGISTRAR_SANDBOX_MODE") {
            config.sandbox_mode = sandbox.parse().map_err(|e| {
                RegistrarError::Configuration(format!("Invalid sandbox_mode: {e}"))
            })?;
        }
        if let Ok(required) = std::env::var("REGISTRAR_DOI_REQUIRED") {
            config.doi_required = required.parse().map_err(|e| {
                RegistrarError::Configuration(format!("Invalid doi_required: {e}"))
            })?;
        }
        if let Ok(retry_limit) = std::env::var("REGISTRAR_RETRY_LIMIT") {
            config.retry_limit = retry_limit.parse().map_err(|e| {
                RegistrarError::Configuration(format!("Invalid retry_limit: {e}"))
            })?;
        }

        Ok(config)
    }

    pub fn scheme(&self, scheme: &str) -> Result<&SchemeConfig> {
        self.scheme_policies.get(scheme).ok_or_else(|| {
            RegistrarError::Configuration(format!("Scheme '{scheme}' is not configured"))
        })
    }

    /// Schemes every published record must carry.
    pub fn required_schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self
            .scheme_policies
            .iter()
            .filter(|(_, policy)| policy.required_at_publish)
            .map(|(scheme, _)| scheme.clone())
            .collect();
        schemes.sort();
        schemes
    }

    pub fn transition_rule(&self, previous: ProviderCategory) -> Option<&TransitionRule> {
        self.provider_transitions.get(&previous)
    }
}
