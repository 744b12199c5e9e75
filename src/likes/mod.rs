// Likes module - per-user liked images and the browser cookie mirror
mod cookie;
mod core;
mod error;
mod handlers;
mod reconcile;
mod store;
mod types;

pub use self::core::{Likes, SharedLikes};
pub use cookie::{client_cookie, encode_client_set, parse_client_set};
pub use error::LikesError;
pub use handlers::{liked_images_handler, sync_liked_images, toggle_like_handler};
pub use reconcile::{Reconciliation, reconcile, toggle};
pub use store::LikeStore;
pub use types::*;
