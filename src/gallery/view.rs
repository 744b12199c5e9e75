use super::{AttachmentStore, GalleryId, GalleryRecord, ImageId};
use crate::{DisplayConfig, Layout};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-request overrides of the display defaults, as query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewOverrides {
    pub use_lightbox: Option<String>,
    pub show_buttons: Option<String>,
    pub layout: Option<String>,
    pub gap: Option<u32>,
    pub columns_desktop: Option<u32>,
    pub columns_tablet: Option<u32>,
    pub columns_mobile: Option<u32>,
}

/// Empty counts as true; "false", "no" and "0" are false in any case.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    !matches!(value.as_str(), "false" | "no" | "0")
}

pub fn resolve_options(defaults: &DisplayConfig, overrides: &ViewOverrides) -> DisplayConfig {
    let mut options = defaults.clone();

    if let Some(value) = &overrides.use_lightbox {
        options.use_lightbox = is_truthy(value);
    }
    if let Some(value) = &overrides.show_buttons {
        options.show_buttons = is_truthy(value);
    }
    if let Some(layout) = &overrides.layout {
        options.layout = Layout::parse(layout);
    }
    if let Some(gap) = overrides.gap {
        options.gap = gap;
    }
    if let Some(columns) = overrides.columns_desktop {
        options.columns_desktop = columns;
    }
    if let Some(columns) = overrides.columns_tablet {
        options.columns_tablet = columns;
    }
    if let Some(columns) = overrides.columns_mobile {
        options.columns_mobile = columns;
    }

    options
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterButton {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryViewItem {
    pub image_id: ImageId,
    pub url: String,
    pub download_url: Option<String>,
    pub likeable: bool,
}

/// Everything a client needs to lay out one gallery, built fresh per request.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryView {
    pub gallery_id: GalleryId,
    pub title: String,
    pub options: DisplayConfig,
    pub buttons: Vec<FilterButton>,
    pub items: Vec<GalleryViewItem>,
}

impl GalleryView {
    pub fn build(
        gallery_id: GalleryId,
        record: &GalleryRecord,
        options: DisplayConfig,
        attachments: &AttachmentStore,
    ) -> Self {
        let mut buttons = Vec::new();
        if options.show_buttons && record.show_like_icon {
            buttons.push(FilterButton {
                id: format!("filter-liked-photos-{}", gallery_id),
                label: "Show Favourite Photos".to_string(),
            });
        }

        let items = record
            .images
            .iter()
            .filter_map(|&image_id| {
                let Some(attachment) = attachments.get(image_id) else {
                    debug!("Gallery {} references unknown image {}", gallery_id, image_id);
                    return None;
                };

                let download_url = record.show_download_icon.then(|| {
                    if record.download_fullsize_image {
                        attachment
                            .original_location
                            .clone()
                            .unwrap_or_else(|| attachment.location.clone())
                    } else {
                        attachment.location.clone()
                    }
                });

                Some(GalleryViewItem {
                    image_id,
                    url: attachment.location.clone(),
                    download_url,
                    likeable: record.show_like_icon,
                })
            })
            .collect();

        Self {
            gallery_id,
            title: record.title.clone(),
            options,
            buttons,
            items,
        }
    }
}
