//! Data models for blob storage access
//!
//! This module defines how a storage account is reached and how service tier
//! values map onto analysis tiers.

use crate::analysis::Tier;
use crate::error::{BlobTierError, Result};
use azure_storage_blobs::prelude::AccessTier;

/// Container selector meaning "every container in the account"
pub const ALL_CONTAINERS: &str = "*";

/// How to reach a storage account
#[derive(Clone, PartialEq, Eq)]
pub enum StorageConnection {
    /// Full connection string including the account key or SAS
    ConnectionString(String),
    /// Account name, authenticated with Azure AD
    Account { account_name: String },
}

impl StorageConnection {
    /// Prefer a connection string over an account name
    pub fn from_settings(connection_string: Option<&str>, account_name: Option<&str>) -> Result<Self> {
        fn non_empty(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        if let Some(cs) = non_empty(connection_string) {
            return Ok(Self::ConnectionString(cs.to_string()));
        }
        if let Some(account) = non_empty(account_name) {
            return Ok(Self::Account {
                account_name: account.to_string(),
            });
        }
        Err(BlobTierError::config(
            "No storage account configured. Pass --connection-string or --account, \
             or set AZURE_STORAGE_CONNECTION_STRING / AZURE_STORAGE_ACCOUNT.",
        ))
    }
}

// Connection strings hold secrets; never print them.
impl std::fmt::Debug for StorageConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionString(_) => f.write_str("ConnectionString(<redacted>)"),
            Self::Account { account_name } => f
                .debug_struct("Account")
                .field("account_name", account_name)
                .finish(),
        }
    }
}

/// Map a reported access tier. Tiers outside Hot/Cool/Archive count as unreported.
pub fn tier_from_access_tier(access_tier: Option<&AccessTier>) -> Option<Tier> {
    match access_tier? {
        AccessTier::Hot => Some(Tier::Hot),
        AccessTier::Cool => Some(Tier::Cool),
        AccessTier::Archive => Some(Tier::Archive),
        _ => None,
    }
}

/// Name of a reported tier that has no analysis counterpart (e.g. Cold)
pub fn unrecognized_access_tier(access_tier: Option<&AccessTier>) -> Option<String> {
    let reported = access_tier?;
    match tier_from_access_tier(Some(reported)) {
        Some(_) => None,
        None => Some(reported.as_ref().to_string()),
    }
}

pub fn access_tier_for(tier: Tier) -> AccessTier {
    match tier {
        Tier::Hot => AccessTier::Hot,
        Tier::Cool => AccessTier::Cool,
        Tier::Archive => AccessTier::Archive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string_wins() {
        let connection =
            StorageConnection::from_settings(Some("AccountName=a;AccountKey=b"), Some("acct"))
                .unwrap();
        assert!(matches!(connection, StorageConnection::ConnectionString(_)));
        assert!(!format!("{connection:?}").contains("AccountKey"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let connection = StorageConnection::from_settings(Some("  "), Some("acct")).unwrap();
        assert_eq!(
            connection,
            StorageConnection::Account {
                account_name: "acct".to_string()
            }
        );
        assert!(StorageConnection::from_settings(None, Some("")).is_err());
    }

    #[test]
    fn test_access_tier_mapping() {
        assert_eq!(tier_from_access_tier(Some(&AccessTier::Cool)), Some(Tier::Cool));
        assert_eq!(tier_from_access_tier(None), None);
        assert_eq!(tier_from_access_tier(Some(&AccessTier::Cold)), None);
        assert_eq!(
            tier_from_access_tier(Some(&access_tier_for(Tier::Archive))),
            Some(Tier::Archive)
        );
    }

    #[test]
    fn test_cold_is_reported_as_unrecognized() {
        assert_eq!(
            unrecognized_access_tier(Some(&AccessTier::Cold)).as_deref(),
            Some("Cold")
        );
        assert_eq!(unrecognized_access_tier(Some(&AccessTier::Hot)), None);
        assert_eq!(unrecognized_access_tier(None), None);
    }
}
