// Gallery module - image lists, attachment metadata and sorting
mod attachments;
mod core;
mod error;
mod handlers;
mod sort;
mod store;
mod types;
mod view;

// Re-export public items
pub use attachments::{Attachment, AttachmentStore, basename};
pub use error::GalleryError;
pub use handlers::gallery_view_handler;
pub use sort::{
    AttributeLookup, AttributeMap, apply_sort_selection, compare_filenames, prefetch_attributes,
    sort_images,
};
pub use store::GalleryStore;
pub use types::*;
pub use view::{FilterButton, GalleryView, GalleryViewItem, ViewOverrides, is_truthy, resolve_options};

use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedGallery = Arc<Gallery>;

pub struct Gallery {
    pub(crate) storage: crate::StorageConfig,
    pub(crate) galleries: Arc<RwLock<GalleryStore>>,
    pub(crate) attachments: Arc<RwLock<AttachmentStore>>,
}
