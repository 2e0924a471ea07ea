//! Container listing and tier changes
//!
//! [`BlobContainerSource`] streams the blobs of one container as storage
//! objects; [`BlobTierChanger`] sets the access tier of single blobs.

use crate::analysis::{StorageObject, Tier};
use crate::blob::models::{access_tier_for, tier_from_access_tier, unrecognized_access_tier};
use crate::error::{BlobTierError, Result};
use crate::migration::TierChanger;
use crate::source::{ObjectSource, ObjectStream};
use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_core::StatusCode;
use azure_storage_blobs::blob::Blob;
use azure_storage_blobs::prelude::*;
use chrono::DateTime;
use futures::{stream, TryStreamExt};
use tracing::{debug, warn};

/// All blobs of one container
pub struct BlobContainerSource {
    name: String,
    client: ContainerClient,
}

impl BlobContainerSource {
    pub fn new<S: Into<String>>(client: ContainerClient, name: S) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }
}

fn to_storage_object(container: &str, blob: &Blob) -> StorageObject {
    // Convert time::OffsetDateTime to chrono::DateTime<Utc>
    let last_modified = DateTime::from_timestamp(blob.properties.last_modified.unix_timestamp(), 0);
    let access_tier = blob.properties.access_tier.as_ref();

    let object = StorageObject {
        container: container.to_string(),
        name: blob.name.clone(),
        size: blob.properties.content_length,
        last_modified,
        tier: tier_from_access_tier(access_tier),
        unrecognized_tier: None,
    };

    match unrecognized_access_tier(access_tier) {
        Some(reported) => {
            debug!(
                "{}/{} is in unsupported tier {}, excluded from matching",
                container, blob.name, reported
            );
            object.with_unrecognized_tier(reported)
        }
        None => object,
    }
}

#[async_trait]
impl ObjectSource for BlobContainerSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn objects(&self) -> Result<ObjectStream<'_>> {
        debug!("Listing blobs in container '{}'", self.name);
        let container = self.name.as_str();

        let objects = self
            .client
            .list_blobs()
            .into_stream()
            .map_err(move |e| BlobTierError::source(container, e.to_string()))
            .map_ok(move |page| {
                let objects: Vec<Result<StorageObject>> = page
                    .blobs
                    .blobs()
                    .map(|blob| Ok(to_storage_object(container, blob)))
                    .collect();
                stream::iter(objects)
            })
            .try_flatten();

        Ok(Box::pin(objects))
    }
}

/// Sets blob access tiers through the Set Blob Tier operation
#[derive(Clone)]
pub struct BlobTierChanger {
    service: BlobServiceClient,
}

impl BlobTierChanger {
    pub fn new(service: BlobServiceClient) -> Self {
        Self { service }
    }
}

/// Whether a failed tier change means no further change can succeed
fn stops_batch(error: &azure_core::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::Credential
            | ErrorKind::HttpResponse {
                status: StatusCode::Unauthorized,
                ..
            }
    )
}

/// Settle one Set Blob Tier call: per-blob failures are reported as `Ok(false)`
fn settle_tier_change<T>(
    container: &str,
    object: &str,
    result: azure_core::Result<T>,
) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if stops_batch(&e) => Err(BlobTierError::from(e)),
        Err(e) => {
            warn!("Failed to set tier of {}/{}: {}", container, object, BlobTierError::from(e));
            Ok(false)
        }
    }
}

#[async_trait]
impl TierChanger for BlobTierChanger {
    async fn change_tier(&self, container: &str, object: &str, target: Tier) -> Result<bool> {
        let result = self
            .service
            .container_client(container)
            .blob_client(object)
            .set_blob_tier(access_tier_for(target))
            .await;

        settle_tier_change(container, object, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_failure(status: StatusCode, code: &str, message: &'static str) -> azure_core::Result<()> {
        Err(azure_core::Error::message(
            ErrorKind::HttpResponse {
                status,
                error_code: Some(code.to_string()),
            },
            message,
        ))
    }

    #[test]
    fn test_rehydrating_blob_does_not_stop_batch() {
        let result = http_failure(
            StatusCode::Conflict,
            "BlobBeingRehydrated",
            "RequestId:9c1f4031-403e-0001-4017-401a3f000000",
        );
        assert!(matches!(settle_tier_change("media", "a.mp4", result), Ok(false)));
    }

    #[test]
    fn test_per_blob_denials_do_not_stop_batch() {
        for (status, code) in [
            (StatusCode::Forbidden, "AuthorizationPermissionMismatch"),
            (StatusCode::NotFound, "BlobNotFound"),
            (StatusCode::ServiceUnavailable, "ServerBusy"),
        ] {
            let result = http_failure(status, code, "failed");
            assert!(matches!(settle_tier_change("media", "a.mp4", result), Ok(false)));
        }
    }

    #[test]
    fn test_credential_failures_stop_batch() {
        let unauthorized = http_failure(StatusCode::Unauthorized, "InvalidAuthenticationInfo", "no");
        assert!(matches!(
            settle_tier_change("media", "a.mp4", unauthorized),
            Err(BlobTierError::AuthenticationError(_))
        ));

        let expired: azure_core::Result<()> =
            Err(azure_core::Error::message(ErrorKind::Credential, "token expired"));
        assert!(settle_tier_change("media", "a.mp4", expired).is_err());
    }

    #[test]
    fn test_success_is_true() {
        assert!(matches!(settle_tier_change("media", "a.mp4", Ok(())), Ok(true)));
    }
}
