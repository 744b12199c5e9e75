use super::{
    LikedImagesResponse, LikesError, ToggleRequest, ToggleResponse, client_cookie,
    parse_client_set,
};
use crate::{
    AppState,
    gallery::ImageId,
    session::{Principal, get_cookie_value},
};
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

pub async fn toggle_like_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ToggleRequest>,
) -> Result<Response, LikesError> {
    let principal = Principal::from_headers(&headers, &app_state.config.app.session_secret);
    let username = principal.username().ok_or(LikesError::NotAuthenticated)?;

    let image_id = ImageId(request.image_id);
    let (liked_images, liked) = app_state.likes.toggle_like(username, image_id).await?;

    let message = if liked {
        "Image liked successfully."
    } else {
        "Image unliked successfully."
    };

    let likes_config = app_state.likes.config();
    let cookie = client_cookie(
        &likes_config.cookie_name,
        &liked_images,
        likes_config.cookie_max_age_days,
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(ToggleResponse {
            success: true,
            message: message.to_string(),
            liked: Some(liked),
        }),
    )
        .into_response())
}

pub async fn liked_images_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Json<LikedImagesResponse> {
    let principal = Principal::from_headers(&headers, &app_state.config.app.session_secret);

    let liked_images = match principal.username() {
        Some(username) => app_state
            .likes
            .liked_images(username)
            .await
            .into_iter()
            .collect(),
        None => Vec::new(),
    };

    Json(LikedImagesResponse {
        logged_in: principal.is_authenticated(),
        liked_images,
    })
}

/// Page-load middleware: fold the browser's liked set into the stored one.
///
/// Only authenticated requests carrying the liked cookie are reconciled. The
/// cookie is rewritten only when the stored set changed.
pub async fn sync_liked_images(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let principal =
        Principal::from_headers(request.headers(), &app_state.config.app.session_secret);
    let likes_config = app_state.likes.config();
    let raw_cookie = get_cookie_value(request.headers(), &likes_config.cookie_name);

    let refreshed = match (principal.username(), raw_cookie) {
        (Some(username), Some(raw)) => {
            let client = parse_client_set(&raw);
            match app_state.likes.sync_from_client(username, &client).await {
                Ok(outcome) if outcome.changed => {
                    debug!(
                        "Synced {} liked images for {} from cookie",
                        outcome.liked.len(),
                        username
                    );
                    Some(client_cookie(
                        &likes_config.cookie_name,
                        &outcome.liked,
                        likes_config.cookie_max_age_days,
                    ))
                }
                Ok(_) => None,
                Err(e) => {
                    error!("Failed to sync liked images for {}: {}", username, e);
                    None
                }
            }
        }
        _ => None,
    };

    let mut response = next.run(request).await;

    if let Some(cookie) = refreshed
        && let Ok(value) = HeaderValue::from_str(&cookie)
    {
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    response
}
