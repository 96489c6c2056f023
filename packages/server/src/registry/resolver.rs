use common::StorageError;
use common::storage::BoxReader;
use rand::seq::IndexedRandom;
use tracing::debug;

use super::{Registry, RegistryError};

/// Where a download request should be served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The local copy still exists.
    LocalFile {
        stored_filename: String,
        display_name: String,
        size: u64,
    },
    /// The local copy is gone; send the client to a verified contributor copy.
    Redirect { host_link: String },
}

/// An opened download: either a readable local copy or a redirect.
pub enum Download {
    Local {
        reader: BoxReader,
        display_name: String,
        size: u64,
    },
    Redirect { host_link: String },
}

impl Registry {
    /// Resolve a dataset and open its local copy if that is where it lives.
    ///
    /// A delisting can remove the local file between the existence check and
    /// the open; the dataset is then resolved once more, which yields a
    /// contributor redirect.
    pub async fn open_download(&self, id: &str) -> Result<Download, RegistryError> {
        for _ in 0..2 {
            match self.resolve(id).await? {
                Resolution::Redirect { host_link } => return Ok(Download::Redirect { host_link }),
                Resolution::LocalFile {
                    stored_filename,
                    display_name,
                    size,
                } => match self.files.get_stream(&stored_filename).await {
                    Ok(reader) => {
                        return Ok(Download::Local {
                            reader,
                            display_name,
                            size,
                        });
                    }
                    Err(StorageError::NotFound(_)) => {
                        debug!(dataset_id = %id, "Local copy removed while opening, resolving again");
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }
        Err(RegistryError::NoSource(id.to_string()))
    }

    /// Decide how to serve a dataset. Without a local file, one verified
    /// contributor link is picked uniformly at random.
    pub async fn resolve(&self, id: &str) -> Result<Resolution, RegistryError> {
        let dataset = self.get(id).await?;

        if self.files.exists(&dataset.stored_filename).await? {
            let size = self.files.size(&dataset.stored_filename).await?;
            return Ok(Resolution::LocalFile {
                stored_filename: dataset.stored_filename,
                display_name: dataset.original_filename,
                size,
            });
        }

        let claims = self.contributors.for_dataset(id).await?;
        let claim = claims
            .choose(&mut rand::rng())
            .ok_or_else(|| RegistryError::NoSource(id.to_string()))?;
        debug!(dataset_id = %id, host_link = %claim.host_link, "Redirecting to contributor copy");

        Ok(Resolution::Redirect {
            host_link: claim.host_link.clone(),
        })
    }
}
