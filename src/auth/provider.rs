//! Authentication provider trait and implementations
//!
//! Storage accounts addressed by name authenticate through Azure AD. The
//! provider hands the Azure SDK a token credential; connection strings carry
//! their own key and bypass this module.

use azure_core::auth::TokenCredential;
use azure_identity::{DefaultAzureCredential, TokenCredentialOptions};
use std::sync::Arc;

use crate::error::{BlobTierError, Result};

/// Trait for Azure authentication providers
pub trait AzureAuthProvider: Send + Sync {
    /// Short description used in log output
    fn name(&self) -> &str;

    /// Get the underlying token credential for Azure SDK usage
    fn get_token_credential(&self) -> Arc<dyn TokenCredential>;
}

/// Default Azure Credential Provider using DefaultAzureCredential
///
/// Tries environment variables, managed identity and the Azure CLI in turn.
pub struct DefaultAzureCredentialProvider {
    credential: Arc<DefaultAzureCredential>,
}

impl DefaultAzureCredentialProvider {
    /// Create a new DefaultAzureCredentialProvider
    pub fn new() -> Result<Self> {
        let credential = DefaultAzureCredential::create(TokenCredentialOptions::default())
            .map_err(|e| {
                BlobTierError::authentication(format!(
                    "Failed to create DefaultAzureCredential: {e}"
                ))
            })?;

        Ok(Self {
            credential: Arc::new(credential),
        })
    }
}

impl AzureAuthProvider for DefaultAzureCredentialProvider {
    fn name(&self) -> &str {
        "DefaultAzureCredential"
    }

    fn get_token_credential(&self) -> Arc<dyn TokenCredential> {
        self.credential.clone()
    }
}
