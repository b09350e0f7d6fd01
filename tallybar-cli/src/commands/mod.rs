//! CLI command implementations.

pub mod cache;
pub mod config;
pub mod usage;
pub mod watch;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tallybar_core::SystemClock;
use tallybar_fetch::SystemKeychain;
use tallybar_providers::{ProviderDescriptor, ProviderRegistry};
use tallybar_store::{
    ConfigStore, FileConfigStore, FileSnapshotStore, RefreshController, RefreshDeps,
    TokioScheduler,
};
use tracing::debug;

use crate::Cli;

/// Resolves a `--provider` value by CLI name or alias.
pub fn resolve_provider(name: &str) -> Result<&'static ProviderDescriptor> {
    ProviderRegistry::get_by_cli_name(name).ok_or_else(|| {
        let known: Vec<_> = ProviderRegistry::all().iter().map(|d| d.cli_name).collect();
        anyhow!("Unknown provider '{name}' (available: {})", known.join(", "))
    })
}

/// Stores shared by every command.
pub struct AppContext {
    /// Provider selected with `--provider`.
    pub provider: &'static ProviderDescriptor,
    /// Persisted configuration.
    pub config: Arc<FileConfigStore>,
    /// Last good snapshot.
    pub snapshots: Arc<FileSnapshotStore>,
    /// Token storage.
    pub secrets: Arc<SystemKeychain>,
}

impl AppContext {
    /// Resolves the provider and opens the stores at their default locations.
    pub async fn load(cli: &Cli) -> Result<Self> {
        let provider = resolve_provider(&cli.provider)?;
        let config = FileConfigStore::load_default().await;
        let snapshots = FileSnapshotStore::at_default_path();
        debug!(
            config = %config.path().display(),
            cache = %snapshots.path().display(),
            provider = provider.id,
            "Opened stores"
        );
        Ok(Self {
            provider,
            config: Arc::new(config),
            snapshots: Arc::new(snapshots),
            secrets: Arc::new(SystemKeychain::new()),
        })
    }

    /// Builds a controller for the selected provider.
    ///
    /// `config` is usually the file store; `watch` passes an in-memory copy
    /// so an interval override is not persisted.
    pub fn controller(&self, config: Arc<dyn ConfigStore>) -> Result<RefreshController> {
        let provider = self.provider.build()?;
        Ok(RefreshController::new(RefreshDeps {
            provider,
            secrets: self.secrets.clone(),
            config,
            snapshots: self.snapshots.clone(),
            scheduler: Arc::new(TokioScheduler::new()),
            clock: Arc::new(SystemClock),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_provider_accepts_aliases() {
        for name in ["copilot", "github", "github-copilot"] {
            assert_eq!(resolve_provider(name).unwrap().id, "github-copilot", "{name}");
        }
    }

    #[test]
    fn test_resolve_provider_rejects_unknown_name() {
        let err = resolve_provider("cursor").unwrap_err().to_string();
        assert!(err.contains("Unknown provider 'cursor'"), "{err}");
        assert!(err.contains("available: copilot"), "{err}");
    }
}
