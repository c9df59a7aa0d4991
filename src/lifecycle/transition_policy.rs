//! Cross-version provider-transition policy.
//!
//! An identifier minted by authority X in version 1 restricts which
//! authorities are legal in version 2+: a managed DOI cannot silently become
//! an external or absent one, and vice versa per the configured table.

use std::collections::HashMap;

use crate::config::{RegistrarConfig, TransitionRule};
use crate::error::ValidationIssue;
use crate::models::record::PidsMap;
use crate::providers::ProviderCategory;
use crate::registry::ProviderRegistry;

pub struct ProviderTransitionPolicy {
    rules: HashMap<ProviderCategory, TransitionRule>,
}

impl ProviderTransitionPolicy {
    pub fn from_config(config: &RegistrarConfig) -> Self {
        Self {
            rules: config.provider_transitions.clone(),
        }
    }

    /// Category a pids map holds for one scheme: absent means `NotNeeded`,
    /// otherwise the governing provider's category. An unresolvable provider
    /// name is left to regular validation and skipped here.
    fn category_for(
        registry: &ProviderRegistry,
        pids: &PidsMap,
        scheme: &str,
    ) -> Option<ProviderCategory> {
        match pids.get(scheme) {
            None => Some(ProviderCategory::NotNeeded),
            Some(attrs) => registry.category_of(scheme, &attrs.provider).ok(),
        }
    }

    /// Check the draft's provider choices against the previous published
    /// version's, returning field-scoped issues for disallowed moves.
    pub fn check(
        &self,
        registry: &ProviderRegistry,
        previous: &PidsMap,
        draft: &PidsMap,
        schemes: &[String],
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for scheme in schemes {
            let Some(from) = Self::category_for(registry, previous, scheme) else {
                continue;
            };
            let Some(to) = Self::category_for(registry, draft, scheme) else {
                continue;
            };
            let Some(rule) = self.rules.get(&from) else {
                continue;
            };
            if !rule.allowed_next.contains(&to) {
                let message = if rule.message.is_empty() {
                    format!("the {scheme} cannot move from '{from}' to '{to}' between versions")
                } else {
                    rule.message.replace("{scheme}", scheme)
                };
                issues.push(ValidationIssue::new(format!("pids.{scheme}"), message));
            }
        }

        issues
    }
}
