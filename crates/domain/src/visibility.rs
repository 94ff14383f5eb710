use std::collections::HashSet;
use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::Viewer;
use crate::ports::users::UserRepository;

/// Computes which posters a viewer may see. The base set is every public
/// account plus everyone the viewer follows, minus everyone the viewer
/// has blocked; block removal runs after the union so a follow never
/// overrides a block. Muting only narrows the feed variant, never direct
/// access.
pub struct VisibilityResolver {
    users: Arc<dyn UserRepository>,
}

impl VisibilityResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn viewable_poster_ids(&self, viewer: &Viewer) -> DomainResult<HashSet<String>> {
        let mut viewable: HashSet<String> =
            self.users.public_poster_ids().await?.into_iter().collect();
        let Some(viewer_id) = viewer.user_id() else {
            return Ok(viewable);
        };
        let user = self
            .users
            .get(viewer_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        viewable.extend(user.following.iter().cloned());
        for blocked_id in &user.blocked {
            viewable.remove(blocked_id);
        }
        Ok(viewable)
    }

    pub async fn viewable_unmuted_poster_ids(
        &self,
        viewer: &Viewer,
    ) -> DomainResult<HashSet<String>> {
        let mut viewable = self.viewable_poster_ids(viewer).await?;
        if let Some(viewer_id) = viewer.user_id() {
            let user = self
                .users
                .get(viewer_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            for muted_id in &user.muted {
                viewable.remove(muted_id);
            }
        }
        Ok(viewable)
    }

    pub async fn is_visible(&self, poster_id: &str, viewer: &Viewer) -> DomainResult<bool> {
        Ok(self.viewable_poster_ids(viewer).await?.contains(poster_id))
    }
}
