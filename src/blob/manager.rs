//! Core blob storage manager
//!
//! This module provides the BlobManager struct, which owns a connected
//! `BlobServiceClient` and handles account-level operations: listing and
//! resolving containers and validating the connection before analysis.

use crate::auth::provider::{AzureAuthProvider, DefaultAzureCredentialProvider};
use crate::blob::models::{StorageConnection, ALL_CONTAINERS};
use crate::blob::operations::{BlobContainerSource, BlobTierChanger};
use crate::error::{BlobTierError, Result};
use crate::utils::retry::{retry_with_backoff, RetryOptions};
use crate::utils::sanitizer::validate_container_name;
use azure_core::error::ErrorKind;
use azure_core::StatusCode;
use azure_storage::{ConnectionString, StorageCredentials};
use azure_storage_blobs::prelude::*;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info};

/// Core blob storage manager
#[derive(Clone)]
pub struct BlobManager {
    account_name: String,
    service: BlobServiceClient,
}

impl BlobManager {
    /// Connect to the account described by `connection`
    pub fn new(connection: &StorageConnection) -> Result<Self> {
        match connection {
            StorageConnection::ConnectionString(value) => {
                let parsed = ConnectionString::new(value).map_err(|e| {
                    BlobTierError::config(format!("Invalid storage connection string: {e}"))
                })?;
                let account_name = parsed
                    .account_name
                    .ok_or_else(|| {
                        BlobTierError::config("Connection string has no AccountName")
                    })?
                    .to_string();
                let credentials = parsed.storage_credentials().map_err(|e| {
                    BlobTierError::config(format!("Unusable storage credentials: {e}"))
                })?;
                Ok(Self::with_credentials(account_name, credentials))
            }
            StorageConnection::Account { account_name } => {
                let provider = Arc::new(DefaultAzureCredentialProvider::new()?);
                Ok(Self::with_auth_provider(account_name.clone(), provider))
            }
        }
    }

    /// Connect with an Azure AD token credential
    pub fn with_auth_provider(account_name: String, provider: Arc<dyn AzureAuthProvider>) -> Self {
        debug!("Authenticating to '{}' with {}", account_name, provider.name());
        let credentials = StorageCredentials::token_credential(provider.get_token_credential());
        Self::with_credentials(account_name, credentials)
    }

    fn with_credentials(account_name: String, credentials: StorageCredentials) -> Self {
        let service = BlobServiceClient::new(account_name.clone(), credentials);
        Self {
            account_name,
            service,
        }
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Names of every container in the account
    pub async fn list_containers(&self) -> Result<Vec<String>> {
        retry_with_backoff(|| self.list_containers_once(), RetryOptions::default()).await
    }

    async fn list_containers_once(&self) -> Result<Vec<String>> {
        let mut pages = self.service.list_containers().into_stream();
        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(BlobTierError::from)?;
            names.extend(page.containers.into_iter().map(|c| c.name));
        }
        debug!("Account '{}' has {} containers", self.account_name, names.len());
        Ok(names)
    }

    /// Expand a container selector: `*` means every container in the account
    pub async fn resolve_containers(&self, selector: &str) -> Result<Vec<String>> {
        validate_container_name(selector)?;
        if selector == ALL_CONTAINERS {
            self.list_containers().await
        } else {
            Ok(vec![selector.to_string()])
        }
    }

    /// Make one cheap request to tell authentication problems from missing containers
    pub async fn validate_connection(&self, selector: &str) -> Result<()> {
        if selector == ALL_CONTAINERS {
            let mut pages = self.service.list_containers().into_stream();
            if let Some(page) = pages.next().await {
                page.map_err(BlobTierError::from)?;
            }
        } else {
            self.service
                .container_client(selector)
                .get_properties()
                .await
                .map_err(|e| container_error(selector, e))?;
        }
        info!("Connected to storage account '{}'", self.account_name);
        Ok(())
    }

    pub fn container_source(&self, container: &str) -> BlobContainerSource {
        BlobContainerSource::new(self.service.container_client(container), container)
    }

    pub fn tier_changer(&self) -> BlobTierChanger {
        BlobTierChanger::new(self.service.clone())
    }
}

fn container_error(container: &str, error: azure_core::Error) -> BlobTierError {
    match error.kind() {
        ErrorKind::HttpResponse {
            status: StatusCode::NotFound,
            ..
        } => BlobTierError::container_not_found(container),
        _ => BlobTierError::from(error),
    }
}
