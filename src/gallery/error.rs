use thiserror::Error;

use super::GalleryId;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("Attachment scan failed: {0}")]
    ScanFailed(String),

    #[error("Gallery {0} not found")]
    NotFound(GalleryId),
}
