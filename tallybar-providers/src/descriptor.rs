//! Provider descriptor system.
//!
//! A descriptor contains the static configuration for a provider:
//! - Identity (stable id, display name)
//! - CLI naming (primary name, aliases)
//! - A constructor for the live [`UsageProvider`]

use std::sync::Arc;

use tallybar_core::{CoreError, UsageProvider};

/// Constructor for a provider instance.
pub type BuildProvider = fn() -> Result<Arc<dyn UsageProvider>, CoreError>;

/// Complete descriptor for a provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    /// Provider identifier, matching [`UsageProvider::id`].
    pub id: &'static str,
    /// Display name.
    pub display_name: &'static str,
    /// Name used on the command line.
    pub cli_name: &'static str,
    /// Alternative command-line names.
    pub aliases: &'static [&'static str],
    /// Settings page for creating a token.
    pub token_url: &'static str,
    build: BuildProvider,
}

impl ProviderDescriptor {
    /// Creates a descriptor.
    pub const fn new(
        id: &'static str,
        display_name: &'static str,
        cli_name: &'static str,
        aliases: &'static [&'static str],
        token_url: &'static str,
        build: BuildProvider,
    ) -> Self {
        Self {
            id,
            display_name,
            cli_name,
            aliases,
            token_url,
            build,
        }
    }

    /// Returns true if `name` is the CLI name or one of the aliases.
    pub fn matches_cli_name(&self, name: &str) -> bool {
        self.cli_name == name || self.aliases.contains(&name)
    }

    /// Builds a live provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's transport cannot be initialized.
    pub fn build(&self) -> Result<Arc<dyn UsageProvider>, CoreError> {
        (self.build)()
    }
}
