use super::{GalleryError, GalleryId, GalleryView, ViewOverrides};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{debug, error};

pub async fn gallery_view_handler(
    State(app_state): State<AppState>,
    Path(gallery_id): Path<GalleryId>,
    Query(overrides): Query<ViewOverrides>,
) -> Result<Json<GalleryView>, StatusCode> {
    match app_state
        .gallery
        .view(gallery_id, &app_state.config.display, &overrides)
        .await
    {
        Ok(view) => Ok(Json(view)),
        Err(GalleryError::NotFound(id)) => {
            debug!("Gallery {} not found", id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            error!("Failed to build gallery view for {}: {}", gallery_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
