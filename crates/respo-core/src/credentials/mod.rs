//! Session credential storage
//!
//! The vendor API is authorized by replaying a browser session: a set
//! of cookies plus a bearer token, both copied out of an authenticated
//! browser's request headers. This module owns that credential and its
//! storage backends. The API client only ever borrows a `Credential`
//! per request and never mutates it.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Keyring service name
const KEYRING_SERVICE: &str = "respo";

/// Keyring entry name for the vendor session
const KEYRING_USER: &str = "vendor-session";

/// A captured browser session: cookies, bearer token, optional expiry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Cookie name/value pairs, as copied from the browser
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// Full `Authorization` header value (e.g. "Bearer eyJ...")
    #[serde(default)]
    pub authorization: Option<String>,
    /// Expiry hint, when the user recorded one
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// True when there is nothing to authenticate with
    pub fn is_empty(&self) -> bool {
        let no_cookies = self.cookies.values().all(|v| v.trim().is_empty());
        let no_auth = self
            .authorization
            .as_deref()
            .map(|a| a.trim().is_empty())
            .unwrap_or(true);
        no_cookies && no_auth
    }

    /// True when the recorded expiry has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    /// Assemble the `Cookie` request header, skipping empty values
    pub fn cookie_header(&self) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Authorization value safe for log output
    pub fn redacted_authorization(&self) -> Option<String> {
        self.authorization.as_deref().map(|auth| {
            if auth.chars().count() <= 20 {
                "***".to_string()
            } else {
                let prefix: String = auth.chars().take(20).collect();
                format!("{}...", prefix)
            }
        })
    }
}

/// Storage backend for the session credential.
///
/// The CLI uses the file backend; the keyring backend holds the same
/// record in the OS credential store for users who prefer not to keep
/// tokens on disk.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<Credential>>;
    async fn save(&self, credential: &Credential) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// TOML file under the config directory
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let credential: Credential = toml::from_str(&contents).map_err(|e| {
            Error::CredentialStore(format!(
                "failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(credential))
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string_pretty(credential)
            .map_err(|e| Error::CredentialStore(format!("failed to serialize credential: {}", e)))?;
        fs::write(&self.path, contents)?;

        // Tokens on disk should not be world-readable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %self.path.display(), "Credential saved");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// OS credential store (macOS Keychain, Windows Credential Manager,
/// Linux Secret Service)
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
    user: String,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            user: KEYRING_USER.to_string(),
        }
    }

    /// Custom service/user names, useful for tests
    pub fn with_names(service: &str, user: &str) -> Self {
        Self {
            service: service.to_string(),
            user: user.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, &self.user)
            .map_err(|e| Error::CredentialStore(format!("failed to open keyring entry: {}", e)))
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        let entry = self.entry()?;

        // keyring operations are blocking, so run them off the executor
        let result = tokio::task::spawn_blocking(move || entry.get_password())
            .await
            .map_err(|e| Error::CredentialStore(format!("task join error: {}", e)))?;

        match result {
            Ok(json) => {
                let credential = serde_json::from_str(&json).map_err(|e| {
                    Error::CredentialStore(format!("corrupt keyring entry: {}", e))
                })?;
                Ok(Some(credential))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::CredentialStore(format!(
                "failed to read keyring entry: {}",
                e
            ))),
        }
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let entry = self.entry()?;
        let json = serde_json::to_string(credential)
            .map_err(|e| Error::CredentialStore(format!("failed to serialize credential: {}", e)))?;

        tokio::task::spawn_blocking(move || {
            entry
                .set_password(&json)
                .map_err(|e| Error::CredentialStore(format!("failed to store credential: {}", e)))
        })
        .await
        .map_err(|e| Error::CredentialStore(format!("task join error: {}", e)))?
    }

    async fn clear(&self) -> Result<()> {
        let entry = self.entry()?;

        tokio::task::spawn_blocking(move || match entry.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already cleared
            Err(e) => Err(Error::CredentialStore(format!(
                "failed to delete credential: {}",
                e
            ))),
        })
        .await
        .map_err(|e| Error::CredentialStore(format!("task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn sample() -> Credential {
        let mut cookies = BTreeMap::new();
        cookies.insert("connect.sid".to_string(), "s%3Aabc".to_string());
        cookies.insert("empty".to_string(), "".to_string());
        Credential {
            cookies,
            authorization: Some("Bearer eyJhbGciOiJIUzI1NiJ9.payload".to_string()),
            expires_at: None,
        }
    }

    #[test]
    fn test_empty_detection() {
        assert!(Credential::default().is_empty());

        let mut cookies = BTreeMap::new();
        cookies.insert("sid".to_string(), "  ".to_string());
        let blank = Credential {
            cookies,
            authorization: Some(String::new()),
            expires_at: None,
        };
        assert!(blank.is_empty());

        assert!(!sample().is_empty());
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut credential = sample();
        assert!(!credential.is_expired(now));

        credential.expires_at = Some(now - Duration::hours(1));
        assert!(credential.is_expired(now));

        credential.expires_at = Some(now + Duration::hours(1));
        assert!(!credential.is_expired(now));
    }

    #[test]
    fn test_cookie_header_skips_empty_values() {
        let header = sample().cookie_header().unwrap();
        assert_eq!(header, "connect.sid=s%3Aabc");
    }

    #[test]
    fn test_redacted_authorization() {
        let redacted = sample().redacted_authorization().unwrap();
        assert!(redacted.ends_with("..."));
        assert!(!redacted.contains("payload"));
    }

    #[test]
    fn test_redaction_handles_multibyte_tokens() {
        // Tokens are user-supplied; a multibyte character near the
        // prefix cut must not break redaction
        let credential = Credential {
            authorization: Some("Bearer ééééééé".to_string()),
            ..Credential::default()
        };
        assert_eq!(credential.redacted_authorization().as_deref(), Some("***"));

        let long = Credential {
            authorization: Some(format!("Bearer {}secret", "é".repeat(20))),
            ..Credential::default()
        };
        let redacted = long.redacted_authorization().unwrap();
        assert!(redacted.ends_with("..."));
        assert!(!redacted.contains("secret"));
        assert_eq!(redacted.chars().count(), 23);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.toml"));

        assert_eq!(store.load().await.unwrap(), None);

        let credential = sample();
        store.save(&credential).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(credential));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.toml"));
        store.clear().await.unwrap();
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.toml");
        fs::write(&path, "not = [valid").unwrap();

        let store = FileCredentialStore::new(path);
        assert!(matches!(
            store.load().await,
            Err(Error::CredentialStore(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.toml"));
        store.save(&sample()).await.unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
