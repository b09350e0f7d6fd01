//! Provider registry.
//!
//! The registry provides static access to all provider descriptors and is the
//! central point for looking up providers.

use std::sync::Arc;

use tallybar_core::{CoreError, UsageProvider};

use crate::copilot::{COPILOT_DISPLAY_NAME, COPILOT_PROVIDER_ID, CopilotProvider};
use crate::descriptor::ProviderDescriptor;

// ============================================================================
// Static Registry
// ============================================================================

fn build_copilot() -> Result<Arc<dyn UsageProvider>, CoreError> {
    Ok(Arc::new(CopilotProvider::new()?))
}

static DESCRIPTORS: [ProviderDescriptor; 1] = [ProviderDescriptor::new(
    COPILOT_PROVIDER_ID,
    COPILOT_DISPLAY_NAME,
    "copilot",
    &["github", "github-copilot"],
    "https://github.com/settings/personal-access-tokens",
    build_copilot,
)];

// ============================================================================
// Provider Registry
// ============================================================================

/// Global registry of all provider descriptors.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Returns all provider descriptors.
    pub fn all() -> &'static [ProviderDescriptor] {
        &DESCRIPTORS
    }

    /// Gets a provider descriptor by id.
    pub fn get(id: &str) -> Option<&'static ProviderDescriptor> {
        Self::all().iter().find(|d| d.id == id)
    }

    /// Looks up a provider by CLI name or alias.
    pub fn get_by_cli_name(name: &str) -> Option<&'static ProviderDescriptor> {
        Self::all().iter().find(|d| d.matches_cli_name(name))
    }

    /// The provider used when none is named.
    pub fn default_provider() -> &'static ProviderDescriptor {
        &DESCRIPTORS[0]
    }

    /// Returns the number of registered providers.
    pub fn count() -> usize {
        Self::all().len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_by_id() {
        let desc = ProviderRegistry::get("github-copilot").unwrap();
        assert_eq!(desc.display_name, "GitHub Copilot");
        assert!(ProviderRegistry::get("cursor").is_none());
    }

    #[test]
    fn test_cli_name_lookup() {
        for name in ["copilot", "github", "github-copilot"] {
            let desc = ProviderRegistry::get_by_cli_name(name);
            assert_eq!(desc.map(|d| d.id), Some("github-copilot"), "{name}");
        }
        assert!(ProviderRegistry::get_by_cli_name("claude").is_none());
    }

    #[test]
    fn test_default_provider_builds() {
        assert_eq!(ProviderRegistry::count(), 1);
        let provider = ProviderRegistry::default_provider().build().unwrap();
        assert_eq!(provider.id(), "github-copilot");
        assert_eq!(provider.display_name(), "GitHub Copilot");
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = ProviderRegistry::all().iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ProviderRegistry::count());
    }
}
