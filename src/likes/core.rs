use super::{LikeStore, LikedSet, LikesError, SyncOutcome, reconcile, toggle};
use crate::{LikesConfig, gallery::ImageId, storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub type SharedLikes = Arc<Likes>;

/// Per-user liked images, persisted to a TOML file.
pub struct Likes {
    pub(crate) config: LikesConfig,
    store_path: PathBuf,
    store: Arc<RwLock<LikeStore>>,
}

impl Likes {
    pub async fn load(store_path: &Path, config: LikesConfig) -> Result<Self, LikesError> {
        let store: LikeStore = storage::load_toml(store_path).await?;
        info!("Loaded liked images for {} users", store.users.len());

        Ok(Self {
            config,
            store_path: store_path.to_path_buf(),
            store: Arc::new(RwLock::new(store)),
        })
    }

    pub fn config(&self) -> &LikesConfig {
        &self.config
    }

    pub async fn liked_images(&self, username: &str) -> LikedSet {
        self.store.read().await.liked(username)
    }

    /// Like or unlike one image.
    ///
    /// Returns the user's liked set after the toggle and whether the image is now liked.
    pub async fn toggle_like(
        &self,
        username: &str,
        image_id: ImageId,
    ) -> Result<(LikedSet, bool), LikesError> {
        if !image_id.is_valid() {
            return Err(LikesError::InvalidImage(image_id.0));
        }

        let mut store = self.store.write().await;
        let (liked, was_added) = toggle(&store.liked(username), image_id);
        self.commit(&mut store, username, liked.clone()).await?;

        info!(
            "User {} {} image {}",
            username,
            if was_added { "liked" } else { "unliked" },
            image_id
        );
        Ok((liked, was_added))
    }

    /// Bring the stored set in line with the browser-held one.
    pub async fn sync_from_client(
        &self,
        username: &str,
        client: &LikedSet,
    ) -> Result<SyncOutcome, LikesError> {
        let mut store = self.store.write().await;
        let server = store.liked(username);

        if server == *client {
            return Ok(SyncOutcome {
                liked: server,
                changed: false,
            });
        }

        let reconciliation = reconcile(&server, client);
        debug!(
            "Reconciling likes for {}: {} removed, {} added",
            username,
            reconciliation.removed.len(),
            reconciliation.added.len()
        );

        if !reconciliation.differs_from(&server) {
            return Ok(SyncOutcome {
                liked: server,
                changed: false,
            });
        }

        self.commit(&mut store, username, reconciliation.result.clone())
            .await?;

        Ok(SyncOutcome {
            liked: reconciliation.result,
            changed: true,
        })
    }

    /// Persist a user's new set, then apply it. A failed write leaves `store` untouched.
    async fn commit(
        &self,
        store: &mut LikeStore,
        username: &str,
        liked: LikedSet,
    ) -> Result<(), LikesError> {
        let mut updated = store.clone();
        updated.set_liked(username, liked);
        storage::save_toml(&self.store_path, &updated).await?;
        *store = updated;
        Ok(())
    }
}
