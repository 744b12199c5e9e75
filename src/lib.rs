use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub mod gallery;
pub mod likes;
pub mod session;
pub mod startup_checks;
pub mod storage;

pub const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub likes: LikesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    /// Key for the HMAC-signed `auth` cookie.
    pub session_secret: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub galleries_file: PathBuf,
    pub attachments_file: PathBuf,
    pub likes_file: PathBuf,
}

/// Gallery display defaults; requests may override most of them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub use_lightbox: bool,
    pub layout: Layout,
    pub gap: u32,
    pub columns_desktop: u32,
    pub columns_tablet: u32,
    pub columns_mobile: u32,
    pub tablet_breakpoint: u32,
    pub mobile_breakpoint: u32,
    pub show_buttons: bool,
    pub button_color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Grid,
    Masonry,
}

impl Layout {
    /// Anything but "grid" selects masonry.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("grid") {
            Layout::Grid
        } else {
            Layout::Masonry
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LikesConfig {
    pub cookie_name: String,
    pub cookie_max_age_days: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Gallerist".to_string(),
            log_level: "info".to_string(),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            base_url: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            galleries_file: PathBuf::from("data/galleries.toml"),
            attachments_file: PathBuf::from("data/attachments.toml"),
            likes_file: PathBuf::from("data/likes.toml"),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            use_lightbox: true,
            layout: Layout::Grid,
            gap: 20,
            columns_desktop: 3,
            columns_tablet: 2,
            columns_mobile: 1,
            tablet_breakpoint: 768,
            mobile_breakpoint: 480,
            show_buttons: true,
            button_color: "#EE2E4F".to_string(),
        }
    }
}

impl Default for LikesConfig {
    fn default() -> Self {
        Self {
            cookie_name: "liked_images".to_string(),
            cookie_max_age_days: 365,
        }
    }
}

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Gallery error: {0}")]
    Gallery(#[from] gallery::GalleryError),

    #[error("Likes error: {0}")]
    Likes(#[from] likes::LikesError),
}

#[derive(Clone)]
pub struct AppState {
    pub gallery: gallery::SharedGallery,
    pub likes: likes::SharedLikes,
    pub config: Config,
}

impl AppState {
    pub async fn load(config: Config) -> Result<Self, AppError> {
        let gallery = Arc::new(gallery::Gallery::load(&config.storage).await?);
        let likes = Arc::new(
            likes::Likes::load(&config.storage.likes_file, config.likes.clone()).await?,
        );

        Ok(Self {
            gallery,
            likes,
            config,
        })
    }
}

pub async fn create_app(config: Config) -> Result<Router, AppError> {
    let app_state = AppState::load(config).await?;
    Ok(create_router(app_state))
}

pub fn create_router(app_state: AppState) -> Router {
    // Page loads reconcile the browser's liked set before the handler runs
    let page_routes = Router::new()
        .route(
            "/api/galleries/{id}",
            get(gallery::gallery_view_handler),
        )
        .route("/api/likes", get(likes::liked_images_handler))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            likes::sync_liked_images,
        ));

    Router::new()
        .merge(page_routes)
        .route("/api/likes/toggle", post(likes::toggle_like_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let uri = request.uri();
                    let user_agent = request
                        .headers()
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
