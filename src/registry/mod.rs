//! # Provider Registry
//!
//! Resolves which provider instance governs a given `(scheme, provider_name)`
//! pair, per the process-wide scheme policy. Built once at startup into a
//! fixed lookup table and immutable afterwards, so it is safe to share across
//! concurrent worker invocations.
//!
//! A miss is always a configuration bug, never a runtime/user error, and is
//! reported as [`RegistrarError::UnknownProvider`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::{RegistrarConfig, SchemeConfig};
use crate::error::{RegistrarError, Result};
use crate::providers::{PidProvider, ProviderCategory};

#[derive(Debug)]
pub struct ProviderRegistry {
    providers: HashMap<(String, String), Arc<dyn PidProvider>>,
    scheme_policies: HashMap<String, SchemeConfig>,
}

impl ProviderRegistry {
    /// Build the lookup table, checking that every provider named by the
    /// scheme policy was actually supplied.
    pub fn build(
        config: &RegistrarConfig,
        providers: Vec<Arc<dyn PidProvider>>,
    ) -> Result<Self> {
        let mut table: HashMap<(String, String), Arc<dyn PidProvider>> = HashMap::new();
        for provider in providers {
            let key = (provider.scheme().to_string(), provider.name().to_string());
            table.insert(key, provider);
        }

        for (scheme, policy) in &config.scheme_policies {
            for name in &policy.provider_names {
                if !table.contains_key(&(scheme.clone(), name.clone())) {
                    return Err(RegistrarError::Configuration(format!(
                        "Scheme '{scheme}' names provider '{name}' but no such provider was supplied"
                    )));
                }
            }
            if !policy.provider_names.contains(&policy.default_provider) {
                return Err(RegistrarError::Configuration(format!(
                    "Default provider '{}' for scheme '{scheme}' is not among its allowed providers",
                    policy.default_provider
                )));
            }
        }

        info!(
            schemes = config.scheme_policies.len(),
            providers = table.len(),
            "provider registry built"
        );

        Ok(Self {
            providers: table,
            scheme_policies: config.scheme_policies.clone(),
        })
    }

    /// Resolve the provider instance governing `(scheme, provider_name)`.
    pub fn provider(&self, scheme: &str, provider_name: &str) -> Result<Arc<dyn PidProvider>> {
        self.providers
            .get(&(scheme.to_string(), provider_name.to_string()))
            .cloned()
            .ok_or_else(|| RegistrarError::UnknownProvider {
                scheme: scheme.to_string(),
                provider: provider_name.to_string(),
            })
    }

    pub fn default_provider_for(&self, scheme: &str) -> Result<Arc<dyn PidProvider>> {
        let name = self.policy(scheme)?.default_provider.clone();
        self.provider(scheme, &name)
    }

    pub fn policy(&self, scheme: &str) -> Result<&SchemeConfig> {
        self.scheme_policies.get(scheme).ok_or_else(|| {
            RegistrarError::Configuration(format!("Scheme '{scheme}' is not configured"))
        })
    }

    /// Whether `provider_name` is allowed at all for `scheme`.
    pub fn is_allowed(&self, scheme: &str, provider_name: &str) -> bool {
        self.scheme_policies
            .get(scheme)
            .map(|p| p.provider_names.iter().any(|n| n == provider_name))
            .unwrap_or(false)
    }

    /// Schemes a published record must carry, sorted for determinism.
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

    /// Category the transition policy assigns to a configured pair.
    pub fn category_of(&self, scheme: &str, provider_name: &str) -> Result<ProviderCategory> {
        Ok(self.provider(scheme, provider_name)?.category())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ExternalDoiProvider, OaiProvider};
    use crate::store::{InMemoryPidStore, PidStore};

    fn oai_only_config() -> RegistrarConfig {
        let mut config = RegistrarConfig::default();
        config.scheme_policies.remove("doi");
        config
    }

    fn oai_provider() -> Arc<dyn PidProvider> {
        let store: Arc<dyn PidStore> = Arc::new(InMemoryPidStore::new());
        Arc::new(OaiProvider::new("oai:repo.example.org:", store))
    }

    #[test]
    fn test_build_rejects_missing_provider() {
        let config = RegistrarConfig::default(); // wants datacite + external + oai
        let err = ProviderRegistry::build(&config, vec![oai_provider()]).unwrap_err();
        assert!(matches!(err, RegistrarError::Configuration(_)));
    }

    #[test]
    fn test_resolution_and_unknown_pair() {
        let config = oai_only_config();
        let registry = ProviderRegistry::build(&config, vec![oai_provider()]).unwrap();

        assert_eq!(registry.provider("oai", "oai").unwrap().name(), "oai");
        assert_eq!(registry.default_provider_for("oai").unwrap().name(), "oai");

        let err = registry.provider("doi", "datacite").unwrap_err();
        assert!(matches!(err, RegistrarError::UnknownProvider { .. }));
    }

    #[test]
    fn test_is_allowed_follows_policy() {
        let config = oai_only_config();
        let store: Arc<dyn PidStore> = Arc::new(InMemoryPidStore::new());
        let external: Arc<dyn PidProvider> =
            Arc::new(ExternalDoiProvider::new(store, vec![]));
        let registry =
            ProviderRegistry::build(&config, vec![oai_provider(), external]).unwrap();

        assert!(registry.is_allowed("oai", "oai"));
        // provider exists in the table but no policy references its scheme
        assert!(!registry.is_allowed("doi", "external"));
    }

    #[test]
    fn test_required_schemes_sorted() {
        let config = RegistrarConfig::default();
        assert_eq!(config.required_schemes(), vec!["doi", "oai"]);
    }
}
