use crate::{Config, DEFAULT_SESSION_SECRET};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create storage directory {0}: {1}")]
    StorageDirectoryCreationFailed(String, std::io::Error),

    #[error("Storage path is a directory, expected a file: {0}")]
    StoragePathIsDirectory(String),

    #[error("Session secret is still the default value")]
    DefaultSessionSecret,
}

impl StartupCheckError {
    /// Whether the server cannot run with this problem.
    pub fn is_critical(&self) -> bool {
        !matches!(self, StartupCheckError::DefaultSessionSecret)
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let storage_files = [
        ("galleries", &config.storage.galleries_file),
        ("attachments", &config.storage.attachments_file),
        ("likes", &config.storage.likes_file),
    ];

    for (name, file) in storage_files {
        if let Err(e) = check_storage_file(name, file).await {
            errors.push(e);
        }
    }

    if config.app.session_secret == DEFAULT_SESSION_SECRET {
        warn!("app.session_secret is the default; auth cookies can be forged");
        errors.push(StartupCheckError::DefaultSessionSecret);
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}

async fn check_storage_file(name: &str, file: &Path) -> Result<(), StartupCheckError> {
    if file.is_dir() {
        error!("The {} store path is a directory: {:?}", name, file);
        return Err(StartupCheckError::StoragePathIsDirectory(
            file.display().to_string(),
        ));
    }

    let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    if parent.exists() {
        info!("Storage directory for {} exists: {:?}", name, parent);
        return Ok(());
    }

    info!(
        "Storage directory for {} does not exist, creating: {:?}",
        name, parent
    );
    tokio::fs::create_dir_all(parent).await.map_err(|e| {
        error!("Failed to create storage directory {:?}: {}", parent, e);
        StartupCheckError::StorageDirectoryCreationFailed(parent.display().to_string(), e)
    })
}
