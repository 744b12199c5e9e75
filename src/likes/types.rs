use crate::gallery::ImageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Images one principal has liked.
pub type LikedSet = BTreeSet<ImageId>;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub image_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikedImagesResponse {
    pub logged_in: bool,
    pub liked_images: Vec<ImageId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub liked: LikedSet,
    /// Whether the stored set was rewritten.
    pub changed: bool,
}
