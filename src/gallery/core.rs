use super::{
    AttachmentStore, Gallery, GalleryError, GalleryId, GalleryRecord, GalleryStore,
    GallerySummary, GalleryView, ImageId, SortOutcome, ViewOverrides, apply_sort_selection,
    resolve_options,
};
use crate::{DisplayConfig, StorageConfig, storage};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

impl Gallery {
    /// Load both stores, running the legacy image migration when the gallery store predates it.
    pub async fn load(storage_config: &StorageConfig) -> Result<Self, GalleryError> {
        let mut galleries: GalleryStore =
            storage::load_toml(&storage_config.galleries_file).await?;
        let attachments: AttachmentStore =
            storage::load_toml(&storage_config.attachments_file).await?;

        if galleries.needs_migration() {
            info!(
                "Gallery store {:?} has no version, checking for legacy image lists",
                storage_config.galleries_file
            );
            galleries.migrate_legacy_images();
            storage::save_toml(&storage_config.galleries_file, &galleries).await?;
        }

        info!(
            "Loaded {} galleries and {} attachments",
            galleries.galleries.len(),
            attachments.len()
        );

        Ok(Self {
            storage: storage_config.clone(),
            galleries: Arc::new(RwLock::new(galleries)),
            attachments: Arc::new(RwLock::new(attachments)),
        })
    }

    pub async fn record(&self, id: GalleryId) -> Option<GalleryRecord> {
        self.galleries.read().await.get(id).cloned()
    }

    pub async fn summaries(&self) -> Vec<GallerySummary> {
        self.galleries.read().await.summaries()
    }

    pub async fn attachments(&self) -> AttachmentStore {
        self.attachments.read().await.clone()
    }

    /// Manual (drag and drop) reorder or initial assignment of a gallery's images.
    pub async fn replace_images(
        &self,
        id: GalleryId,
        images: Vec<ImageId>,
    ) -> Result<Vec<ImageId>, GalleryError> {
        let mut galleries = self.galleries.write().await;
        let mut updated = galleries.clone();
        let images = updated.replace_images(id, images).images.clone();
        self.commit_galleries(&mut galleries, updated).await?;

        debug!("Gallery {} now has {} images", id, images.len());
        Ok(images)
    }

    /// Save a new sort selection and reorder the images if the selection changed.
    pub async fn update_sorting(
        &self,
        id: GalleryId,
        selection: &str,
    ) -> Result<SortOutcome, GalleryError> {
        let mut galleries = self.galleries.write().await;
        let mut updated = galleries.clone();
        let record = updated.get_mut(id).ok_or(GalleryError::NotFound(id))?;

        let previous = std::mem::replace(&mut record.sorting, selection.to_string());
        let outcome = {
            let attachments = self.attachments.read().await;
            apply_sort_selection(&record.images, Some(previous.as_str()), selection, &*attachments)
        };

        match &outcome {
            SortOutcome::Sorted(images) => {
                info!(
                    "Sorted gallery {} by '{}' ({} images)",
                    id,
                    selection,
                    images.len()
                );
                record.images = images.clone();
            }
            SortOutcome::Skipped(reason) => {
                debug!("Gallery {} sort skipped: {:?}", id, reason);
            }
        }

        self.commit_galleries(&mut galleries, updated).await?;
        Ok(outcome)
    }

    /// Edit an existing gallery's title or display switches.
    pub async fn update_record<F>(&self, id: GalleryId, update: F) -> Result<GalleryRecord, GalleryError>
    where
        F: FnOnce(&mut GalleryRecord),
    {
        let mut galleries = self.galleries.write().await;
        let mut updated = galleries.clone();
        let record = updated.get_mut(id).ok_or(GalleryError::NotFound(id))?;
        update(record);
        let record = record.clone();

        self.commit_galleries(&mut galleries, updated).await?;
        Ok(record)
    }

    pub async fn migrate_legacy_images(&self) -> Result<usize, GalleryError> {
        let mut galleries = self.galleries.write().await;
        let mut updated = galleries.clone();
        let migrated = updated.migrate_legacy_images();
        self.commit_galleries(&mut galleries, updated).await?;
        Ok(migrated)
    }

    /// Write `updated` to disk, then swap it in. A failed write leaves `current` untouched.
    async fn commit_galleries(
        &self,
        current: &mut GalleryStore,
        updated: GalleryStore,
    ) -> Result<(), GalleryError> {
        storage::save_toml(&self.storage.galleries_file, &updated).await?;
        *current = updated;
        Ok(())
    }

    pub async fn view(
        &self,
        id: GalleryId,
        defaults: &DisplayConfig,
        overrides: &ViewOverrides,
    ) -> Result<GalleryView, GalleryError> {
        let record = self.record(id).await.ok_or(GalleryError::NotFound(id))?;
        let options = resolve_options(defaults, overrides);
        let attachments = self.attachments.read().await;

        Ok(GalleryView::build(id, &record, options, &attachments))
    }

    /// Register new images found under `root` in the attachment store.
    pub async fn scan_attachments(
        &self,
        root: &Path,
        base_url: Option<String>,
    ) -> Result<Vec<ImageId>, GalleryError> {
        let mut attachments = self.attachments.write().await;
        let mut scanned = attachments.clone();
        let root = root.to_path_buf();

        let (scanned, registered) = tokio::task::spawn_blocking(move || {
            let registered = scanned.scan_directory(&root, base_url.as_deref());
            (scanned, registered)
        })
        .await
        .map_err(|e| GalleryError::ScanFailed(e.to_string()))?;
        let registered = registered?;

        if !registered.is_empty() {
            storage::save_toml(&self.storage.attachments_file, &scanned).await?;
            *attachments = scanned;
        }

        Ok(registered)
    }
}
