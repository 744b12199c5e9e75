use super::LikedSet;
use crate::gallery::ImageId;

/// Result of merging a browser-held liked set into the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Stored likes the client no longer has.
    pub removed: LikedSet,
    /// Client likes the server has not seen yet.
    pub added: LikedSet,
    pub result: LikedSet,
}

impl Reconciliation {
    pub fn differs_from(&self, server: &LikedSet) -> bool {
        self.result != *server
    }
}

/// Merge `client` into `server` as `(server - removed) | added`.
///
/// With `removed = server - client` and `added = client - server` this always
/// equals `client`; the two sets are kept explicit so a conflict policy can
/// inspect them.
pub fn reconcile(server: &LikedSet, client: &LikedSet) -> Reconciliation {
    let removed: LikedSet = server.difference(client).copied().collect();
    let added: LikedSet = client.difference(server).copied().collect();

    let result = server
        .difference(&removed)
        .copied()
        .chain(added.iter().copied())
        .collect();

    Reconciliation {
        removed,
        added,
        result,
    }
}

/// Flip one image's membership. Returns the new set and whether the image is now liked.
pub fn toggle(server: &LikedSet, image_id: ImageId) -> (LikedSet, bool) {
    let mut updated = server.clone();
    if updated.remove(&image_id) {
        (updated, false)
    } else {
        updated.insert(image_id);
        (updated, true)
    }
}
