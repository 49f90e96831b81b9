//! Read-only contact sources.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A person to call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub number: String,
}

impl Contact {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
        }
    }
}

/// Errors reading from a contact store.
#[derive(Debug, Error)]
pub enum ContactStoreError {
    #[error("Failed to read contacts from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed contacts in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of contacts for a broadcast.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Return all contacts, unfiltered, capped at `limit`.
    async fn fetch(&self, limit: usize) -> Result<Vec<Contact>, ContactStoreError>;

    /// The first stored contact, if any.
    async fn first(&self) -> Result<Option<Contact>, ContactStoreError> {
        Ok(self.fetch(1).await?.into_iter().next())
    }
}

/// Contacts stored as a JSON array of `{ "number": ... }` objects.
///
/// Extra fields on each record are ignored.
#[derive(Debug, Clone)]
pub struct FileContactStore {
    path: PathBuf,
}

impl FileContactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ContactStore for FileContactStore {
    async fn fetch(&self, limit: usize) -> Result<Vec<Contact>, ContactStoreError> {
        let path = self.path.display().to_string();
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ContactStoreError::Io {
                path: path.clone(),
                source,
            })?;

        let mut contacts: Vec<Contact> = serde_json::from_slice(&raw)
            .map_err(|source| ContactStoreError::Parse { path, source })?;
        contacts.truncate(limit);
        Ok(contacts)
    }
}

/// In-memory contacts.
#[derive(Debug, Clone, Default)]
pub struct StaticContactStore {
    contacts: Vec<Contact>,
}

impl StaticContactStore {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    pub fn from_numbers<I, S>(numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(numbers.into_iter().map(Contact::new).collect())
    }
}

#[async_trait]
impl ContactStore for StaticContactStore {
    async fn fetch(&self, limit: usize) -> Result<Vec<Contact>, ContactStoreError> {
        Ok(self.contacts.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_store_ignores_extra_fields_and_caps() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"_id": "1", "number": "447700900001", "name": "Ada"}},
                {{"number": "447700900002"}},
                {{"number": "447700900003"}}
            ]"#
        )
        .unwrap();

        let store = FileContactStore::new(file.path());
        let contacts = store.fetch(2).await.unwrap();
        assert_eq!(
            contacts,
            vec![Contact::new("447700900001"), Contact::new("447700900002")]
        );
    }

    #[tokio::test]
    async fn test_file_store_missing_file() {
        let store = FileContactStore::new("/nonexistent/contacts.json");
        let err = store.fetch(10).await.unwrap_err();
        assert!(matches!(err, ContactStoreError::Io { .. }));
    }

    #[tokio::test]
    async fn test_file_store_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"phone": "1"}}]"#).unwrap();

        let err = FileContactStore::new(file.path()).fetch(10).await.unwrap_err();
        assert!(matches!(err, ContactStoreError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_static_store_caps() {
        let store = StaticContactStore::from_numbers(["1", "2", "3"]);
        assert_eq!(store.fetch(2).await.unwrap().len(), 2);
        assert_eq!(store.fetch(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_first_contact() {
        let store = StaticContactStore::from_numbers(["447700900001", "447700900002"]);
        assert_eq!(store.first().await.unwrap(), Some(Contact::new("447700900001")));

        let empty = StaticContactStore::default();
        assert_eq!(empty.first().await.unwrap(), None);
    }
}
