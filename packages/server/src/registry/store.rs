use std::path::PathBuf;

use common::StorageError;
use common::storage::JsonFileStore;

use crate::entity::{ContributorClaim, Dataset};

/// Dataset records keyed by id, persisted as one JSON array.
pub struct DatasetStore {
    inner: JsonFileStore<Dataset>,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: JsonFileStore::new(path),
        }
    }

    pub async fn load_all(&self) -> Result<Vec<Dataset>, StorageError> {
        self.inner.load_all().await
    }

    pub async fn save_all(&self, datasets: &[Dataset]) -> Result<(), StorageError> {
        self.inner.save_all(datasets).await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Dataset>, StorageError> {
        Ok(self.load_all().await?.into_iter().find(|d| d.id == id))
    }

    /// Replace the record with the same id in place, or append it.
    pub async fn upsert(&self, dataset: Dataset) -> Result<(), StorageError> {
        let mut datasets = self.load_all().await?;
        match datasets.iter_mut().find(|d| d.id == dataset.id) {
            Some(slot) => *slot = dataset,
            None => datasets.push(dataset),
        }
        self.save_all(&datasets).await
    }

    /// Remove a record, returning it if it existed.
    pub async fn delete(&self, id: &str) -> Result<Option<Dataset>, StorageError> {
        let mut datasets = self.load_all().await?;
        let Some(pos) = datasets.iter().position(|d| d.id == id) else {
            return Ok(None);
        };
        let removed = datasets.remove(pos);
        self.save_all(&datasets).await?;
        Ok(Some(removed))
    }
}

/// Verified contributor claims in submission order. Not keyed: several
/// claims share a dataset id, at most one per (dataset id, email).
pub struct ContributorStore {
    inner: JsonFileStore<ContributorClaim>,
}

impl ContributorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: JsonFileStore::new(path),
        }
    }

    pub async fn load_all(&self) -> Result<Vec<ContributorClaim>, StorageError> {
        self.inner.load_all().await
    }

    pub async fn save_all(&self, claims: &[ContributorClaim]) -> Result<(), StorageError> {
        self.inner.save_all(claims).await
    }

    /// Append `claim` unless one already exists for its (dataset id, email).
    ///
    /// Returns whether the claim was added.
    pub async fn append_if_absent(&self, claim: ContributorClaim) -> Result<bool, StorageError> {
        let mut claims = self.load_all().await?;
        if claims
            .iter()
            .any(|c| c.dataset_id == claim.dataset_id && c.email == claim.email)
        {
            return Ok(false);
        }
        claims.push(claim);
        self.save_all(&claims).await?;
        Ok(true)
    }

    pub async fn for_dataset(&self, dataset_id: &str) -> Result<Vec<ContributorClaim>, StorageError> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|c| c.dataset_id == dataset_id)
            .collect())
    }
}
