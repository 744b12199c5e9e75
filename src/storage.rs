use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    ParseError(#[from] toml_edit::TomlError),

    #[error("TOML decoding error: {0}")]
    DecodeError(#[from] toml_edit::de::Error),

    #[error("TOML encoding error: {0}")]
    EncodeError(#[from] toml_edit::ser::Error),
}

/// Load a TOML-backed store, falling back to its default when the file does not exist yet.
pub async fn load_toml<T>(path: &Path) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    if !fs::try_exists(path).await? {
        debug!("Store {:?} does not exist yet, starting empty", path);
        return Ok(T::default());
    }

    let contents = fs::read_to_string(path).await?;
    let doc = contents.parse::<toml_edit::DocumentMut>()?;
    Ok(toml_edit::de::from_document(doc)?)
}

pub async fn save_toml<T>(path: &Path, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
{
    let doc = toml_edit::ser::to_document(value)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }

    fs::write(path, doc.to_string()).await?;
    Ok(())
}
