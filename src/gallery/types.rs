use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::GalleryError;

pub type GalleryId = u64;

pub const DRAG_N_DROP: &str = "drag_n_drop";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub i64);

impl ImageId {
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl From<i64> for ImageId {
    fn from(value: i64) -> Self {
        ImageId(value)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub(crate) fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// How a gallery's image list is ordered. `DragNDrop` keeps the manual order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    DragNDrop,
    Filename(SortDirection),
    ShootDate(SortDirection),
    FileDate(SortDirection),
    UploadDate(SortDirection),
}

impl SortKey {
    pub const ALL: [SortKey; 9] = [
        SortKey::DragNDrop,
        SortKey::Filename(SortDirection::Asc),
        SortKey::Filename(SortDirection::Desc),
        SortKey::ShootDate(SortDirection::Asc),
        SortKey::ShootDate(SortDirection::Desc),
        SortKey::FileDate(SortDirection::Asc),
        SortKey::FileDate(SortDirection::Desc),
        SortKey::UploadDate(SortDirection::Asc),
        SortKey::UploadDate(SortDirection::Desc),
    ];

    /// Lenient parse: anything unrecognized keeps the current order.
    pub fn parse(value: &str) -> SortKey {
        value.parse().unwrap_or(SortKey::DragNDrop)
    }

    pub fn as_str(&self) -> &'static str {
        use SortDirection::*;
        match self {
            SortKey::DragNDrop => DRAG_N_DROP,
            SortKey::Filename(Asc) => "filename_asc",
            SortKey::Filename(Desc) => "filename_desc",
            SortKey::ShootDate(Asc) => "shoot_date_asc",
            SortKey::ShootDate(Desc) => "shoot_date_desc",
            SortKey::FileDate(Asc) => "file_date_asc",
            SortKey::FileDate(Desc) => "file_date_desc",
            SortKey::UploadDate(Asc) => "upload_date_asc",
            SortKey::UploadDate(Desc) => "upload_date_desc",
        }
    }
}

impl FromStr for SortKey {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .iter()
            .find(|key| key.as_str() == s)
            .copied()
            .ok_or_else(|| GalleryError::UnknownSortKey(s.to_string()))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes the sorter compares, prefetched once per sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageAttributes {
    pub filename: String,
    pub shoot_timestamp: i64,
    pub file_timestamp: i64,
    pub upload_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    ManualOrder,
    Unchanged,
    EmptyGallery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOutcome {
    Skipped(SkipReason),
    Sorted(Vec<ImageId>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub images: Vec<ImageId>,
    #[serde(default = "default_sorting")]
    pub sorting: String,
    #[serde(default = "default_true")]
    pub show_like_icon: bool,
    #[serde(default = "default_true")]
    pub show_download_icon: bool,
    #[serde(default)]
    pub download_fullsize_image: bool,
    /// Per-entry image ids written before the list was stored as one array.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_images: Vec<i64>,
}

impl Default for GalleryRecord {
    fn default() -> Self {
        Self {
            title: String::new(),
            images: Vec::new(),
            sorting: default_sorting(),
            show_like_icon: true,
            show_download_icon: true,
            download_fullsize_image: false,
            legacy_images: Vec::new(),
        }
    }
}

fn default_sorting() -> String {
    DRAG_N_DROP.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct GallerySummary {
    pub id: GalleryId,
    pub title: String,
    pub image_count: usize,
    pub sorting: String,
}
