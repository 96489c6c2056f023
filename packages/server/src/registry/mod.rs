//! Dataset lifecycle: upload, edit, deletion, crowd verification and
//! retrieval.
//!
//! A dataset starts out hosted locally. Every contributor who proves they host
//! a byte-identical copy (same SHA-256) is recorded once per email. When the
//! number of distinct verified copies reaches the threshold the local file is
//! deleted and downloads are redirected to a contributor copy instead.

mod error;
mod fetch;
mod resolver;
mod store;

pub mod id;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use common::ContentHash;
use common::storage::FileStore;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::entity::{ContributorClaim, Dataset, DatasetState};

pub use error::{RegistryError, VerificationError};
pub use fetch::{FetchError, HostFetcher, HttpFetcher};
pub use resolver::{Download, Resolution};
pub use store::{ContributorStore, DatasetStore};

pub const DEFAULT_VERIFICATION_THRESHOLD: u32 = 5;

#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Distinct verified copies after which the local file is deleted.
    pub verification_threshold: u32,
    /// Largest accepted upload in bytes.
    pub max_upload_size: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            verification_threshold: DEFAULT_VERIFICATION_THRESHOLD,
            max_upload_size: u64::MAX,
        }
    }
}

/// An upload to register.
pub struct NewDataset {
    pub title: String,
    pub description: String,
    pub original_filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Default)]
pub struct DatasetUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A contributor's claim to host a copy, before verification.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub dataset_id: String,
    pub name: String,
    pub email: String,
    pub host_link: String,
}

#[derive(Debug)]
pub struct ContributionOutcome {
    pub dataset: Dataset,
    /// `false` when this email had already been verified for the dataset.
    pub newly_recorded: bool,
    /// Whether the dataset has reached the verification threshold.
    pub delisted: bool,
}

pub struct Registry {
    datasets: DatasetStore,
    contributors: ContributorStore,
    files: Arc<dyn FileStore>,
    fetcher: Arc<dyn HostFetcher>,
    settings: RegistrySettings,
    /// Serialises load-modify-save cycles within this process. Never held
    /// across a contributor fetch.
    write_lock: Mutex<()>,
}

impl Registry {
    pub fn new(
        datasets: DatasetStore,
        contributors: ContributorStore,
        files: Arc<dyn FileStore>,
        fetcher: Arc<dyn HostFetcher>,
        settings: RegistrySettings,
    ) -> Self {
        Self {
            datasets,
            contributors,
            files,
            fetcher,
            settings,
            write_lock: Mutex::new(()),
        }
    }

    /// Load both indexes once, failing on unreadable state. Returns the
    /// number of datasets and claims.
    pub async fn check_stores(&self) -> Result<(usize, usize), RegistryError> {
        let datasets = self.datasets.load_all().await?.len();
        let claims = self.contributors.load_all().await?.len();
        Ok((datasets, claims))
    }

    /// All dataset records in upload order, each with its derived state.
    pub async fn list(&self) -> Result<Vec<(Dataset, DatasetState)>, RegistryError> {
        let datasets = self.datasets.load_all().await?;
        let mut listed = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            let state = self.state_of(&dataset).await?;
            listed.push((dataset, state));
        }
        Ok(listed)
    }

    pub async fn get(&self, id: &str) -> Result<Dataset, RegistryError> {
        self.datasets
            .find(id)
            .await?
            .ok_or_else(|| RegistryError::DatasetNotFound(id.to_string()))
    }

    pub async fn state_of(&self, dataset: &Dataset) -> Result<DatasetState, RegistryError> {
        let present = self.files.exists(&dataset.stored_filename).await?;
        Ok(DatasetState::derive(present, dataset.verified_host_count))
    }

    /// Register a new dataset. The bytes are persisted before the record, so
    /// a record never points at a file that was not written.
    pub async fn create(&self, new: NewDataset) -> Result<Dataset, RegistryError> {
        let title = required("Title", &new.title)?;
        let description = required("Description", &new.description)?;
        if new.bytes.len() as u64 > self.settings.max_upload_size {
            return Err(RegistryError::Validation(format!(
                "File exceeds maximum size of {} bytes",
                self.settings.max_upload_size
            )));
        }

        let created_at = Utc::now();
        let dataset_id = id::dataset_id(title, created_at);
        let extension = new
            .original_filename
            .as_deref()
            .map(id::file_extension)
            .unwrap_or_default();
        let stored_filename = format!("{dataset_id}{extension}");
        let original_filename = new
            .original_filename
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| stored_filename.clone());

        let dataset = Dataset {
            id: dataset_id,
            title: title.to_string(),
            description: description.to_string(),
            content_fingerprint: ContentHash::compute(&new.bytes),
            verified_host_count: 0,
            original_filename,
            stored_filename,
            created_at,
        };

        let _guard = self.write_lock.lock().await;
        self.files.put(&dataset.stored_filename, &new.bytes).await?;

        let mut datasets = self.datasets.load_all().await?;
        datasets.push(dataset.clone());
        if let Err(e) = self.datasets.save_all(&datasets).await {
            let _ = self.files.delete(&dataset.stored_filename).await;
            return Err(e.into());
        }

        info!(
            dataset_id = %dataset.id,
            fingerprint = %dataset.content_fingerprint,
            size = new.bytes.len(),
            "Dataset uploaded"
        );
        Ok(dataset)
    }

    /// Apply a partial update to the title and/or description.
    pub async fn edit(&self, id: &str, update: DatasetUpdate) -> Result<Dataset, RegistryError> {
        let title = update
            .title
            .as_deref()
            .map(|t| required("Title", t))
            .transpose()?;
        let description = update
            .description
            .as_deref()
            .map(|d| required("Description", d))
            .transpose()?;

        let _guard = self.write_lock.lock().await;
        let mut datasets = self.datasets.load_all().await?;
        let dataset = datasets
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RegistryError::DatasetNotFound(id.to_string()))?;

        if let Some(title) = title {
            dataset.title = title.to_string();
        }
        if let Some(description) = description {
            dataset.description = description.to_string();
        }
        let updated = dataset.clone();

        self.datasets.save_all(&datasets).await?;
        info!(dataset_id = %id, "Dataset updated");
        Ok(updated)
    }

    /// Remove a dataset record and its local file, if any. Claims are kept.
    pub async fn delete(&self, id: &str) -> Result<Dataset, RegistryError> {
        let _guard = self.write_lock.lock().await;
        let removed = self
            .datasets
            .delete(id)
            .await?
            .ok_or_else(|| RegistryError::DatasetNotFound(id.to_string()))?;

        let file_deleted = self.files.delete(&removed.stored_filename).await?;
        info!(dataset_id = %id, file_deleted, "Dataset deleted");
        Ok(removed)
    }

    /// Verify a contributor's copy and record the claim.
    ///
    /// The copy is fetched and fingerprinted before anything is written; a
    /// failed fetch or a mismatch leaves all state untouched. Resubmitting
    /// the same email for a dataset succeeds without adding a claim.
    pub async fn record_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<ContributionOutcome, RegistryError> {
        let claim = ContributorClaim {
            dataset_id: required("datasetId", &contribution.dataset_id)?.trim().to_string(),
            name: required("name", &contribution.name)?.trim().to_string(),
            email: required("email", &contribution.email)?.trim().to_string(),
            host_link: required("hostLink", &contribution.host_link)?.trim().to_string(),
        };

        let dataset = self.get(&claim.dataset_id).await?;

        let hosted = self
            .fetcher
            .fetch(&claim.host_link)
            .await
            .map_err(|e| {
                warn!(dataset_id = %claim.dataset_id, host_link = %claim.host_link, error = %e, "Contributor fetch failed");
                VerificationError::from(e)
            })?;
        let actual = ContentHash::compute(&hosted);
        if actual != dataset.content_fingerprint {
            warn!(
                dataset_id = %claim.dataset_id,
                host_link = %claim.host_link,
                expected = %dataset.content_fingerprint,
                actual = %actual,
                "Contributor copy does not match"
            );
            return Err(VerificationError::HashMismatch {
                expected: dataset.content_fingerprint,
                actual,
            }
            .into());
        }

        let _guard = self.write_lock.lock().await;
        let mut datasets = self.datasets.load_all().await?;
        let Some(dataset) = datasets.iter_mut().find(|d| d.id == claim.dataset_id) else {
            return Err(RegistryError::DatasetNotFound(claim.dataset_id));
        };

        // Claims are saved first: if the dataset save below fails, the cached
        // count lags the claims and the next contribution recomputes it. The
        // reverse order could over-count and delist early.
        let dataset_id = claim.dataset_id.clone();
        let newly_recorded = self.contributors.append_if_absent(claim).await?;
        dataset.verified_host_count = self.verified_host_count(&dataset_id).await?;
        let updated = dataset.clone();
        self.datasets.save_all(&datasets).await?;

        let delisted = updated.verified_host_count >= self.settings.verification_threshold;
        if delisted && self.files.delete(&updated.stored_filename).await? {
            info!(
                dataset_id = %updated.id,
                verified_host_count = updated.verified_host_count,
                "Verification threshold reached, local copy deleted"
            );
        }

        info!(
            dataset_id = %updated.id,
            newly_recorded,
            verified_host_count = updated.verified_host_count,
            "Contributor verified"
        );
        Ok(ContributionOutcome {
            dataset: updated,
            newly_recorded,
            delisted,
        })
    }

    /// Distinct verified emails for a dataset.
    async fn verified_host_count(&self, dataset_id: &str) -> Result<u32, RegistryError> {
        let claims = self.contributors.for_dataset(dataset_id).await?;
        let distinct: HashSet<&str> = claims.iter().map(|c| c.email.as_str()).collect();
        Ok(u32::try_from(distinct.len()).unwrap_or(u32::MAX))
    }
}

/// `value` as submitted, or a validation error naming `field` when blank.
fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, RegistryError> {
    if value.trim().is_empty() {
        return Err(RegistryError::Validation(format!("{field} is required.")));
    }
    Ok(value)
}
