use super::{GalleryId, GalleryRecord, GallerySummary, ImageId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Persisted gallery records keyed by gallery id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryStore {
    /// Crate version that last wrote the store; empty for stores that predate versioning.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub galleries: BTreeMap<String, GalleryRecord>,
}

impl GalleryStore {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            galleries: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: GalleryId) -> Option<&GalleryRecord> {
        self.galleries.get(&id.to_string())
    }

    pub fn get_mut(&mut self, id: GalleryId) -> Option<&mut GalleryRecord> {
        self.galleries.get_mut(&id.to_string())
    }

    pub fn entry(&mut self, id: GalleryId) -> &mut GalleryRecord {
        self.galleries.entry(id.to_string()).or_default()
    }

    pub fn insert(&mut self, id: GalleryId, record: GalleryRecord) {
        self.galleries.insert(id.to_string(), record);
    }

    pub fn summaries(&self) -> Vec<GallerySummary> {
        self.galleries
            .iter()
            .filter_map(|(key, record)| {
                key.parse().ok().map(|id| GallerySummary {
                    id,
                    title: record.title.clone(),
                    image_count: record.images.len(),
                    sorting: record.sorting.clone(),
                })
            })
            .collect()
    }

    /// Replace a gallery's image list wholesale, dropping repeated ids.
    pub fn replace_images(&mut self, id: GalleryId, images: Vec<ImageId>) -> &GalleryRecord {
        let mut seen = HashSet::new();
        let images: Vec<ImageId> = images.into_iter().filter(|image| seen.insert(*image)).collect();

        let record = self.entry(id);
        record.images = images;
        record
    }

    pub fn needs_migration(&self) -> bool {
        self.version.is_empty()
    }

    /// Move per-entry legacy image ids into the single image list.
    ///
    /// Zero ids are dropped; the legacy entries are cleared either way. Returns the
    /// number of galleries that carried legacy entries.
    pub fn migrate_legacy_images(&mut self) -> usize {
        let mut migrated = 0;

        for (key, record) in self.galleries.iter_mut() {
            if record.legacy_images.is_empty() {
                continue;
            }

            let images: Vec<ImageId> = record
                .legacy_images
                .drain(..)
                .filter(|&id| id != 0)
                .map(ImageId)
                .collect();

            if !images.is_empty() {
                debug!("Migrating {} legacy images for gallery {}", images.len(), key);
                record.images = images;
            }
            migrated += 1;
        }

        self.version = env!("CARGO_PKG_VERSION").to_string();
        if migrated > 0 {
            info!("Migrated legacy image lists for {} galleries", migrated);
        }
        migrated
    }
}
