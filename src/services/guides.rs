//! Guide lifecycle and authorization.
//!
//! Guides move between `draft` and `published`. Published guides are public;
//! drafts, and every mutation, are gated by an [`AccessPolicy`].

use std::sync::Arc;
use tracing::info;

use super::{ServiceError, ServiceResult};
use crate::db::{Guide, GuideStatus, GuideStore, ListQuery, User};

/// Who may see and change a guide.
pub trait AccessPolicy: Send + Sync {
    /// May `actor` modify, publish, unpublish or delete a guide created by `creator_id`?
    fn can_edit(&self, actor: &User, creator_id: &str) -> bool;

    /// May `actor` (possibly anonymous) read `guide`?
    fn can_view(&self, actor: Option<&User>, guide: &Guide) -> bool {
        guide.is_published() || actor.is_some_and(|a| self.can_edit(a, &guide.creator_id))
    }
}

/// Creators manage their own guides; editors and admins manage everyone's.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl AccessPolicy for RolePolicy {
    fn can_edit(&self, actor: &User, creator_id: &str) -> bool {
        actor.is_active && (actor.id == creator_id || actor.role.is_elevated())
    }
}

#[derive(Clone)]
pub struct GuideService {
    store: GuideStore,
    policy: Arc<dyn AccessPolicy>,
}

/// Only active users may act.
fn require_actor(actor: Option<&User>) -> ServiceResult<&User> {
    match actor {
        Some(user) if user.is_active => Ok(user),
        _ => Err(ServiceError::Unauthenticated),
    }
}

fn require_id(guide_id: &str) -> ServiceResult<&str> {
    let id = guide_id.trim();
    if id.is_empty() {
        return Err(ServiceError::invalid("guide id is required"));
    }
    Ok(id)
}

/// Returns the trimmed title.
fn validate_body<'a>(title: &'a str, content: &str) -> ServiceResult<&'a str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::invalid("title is required"));
    }
    if content.trim().is_empty() {
        return Err(ServiceError::invalid("content is required"));
    }
    Ok(title)
}

impl GuideService {
    pub fn new(store: GuideStore) -> Self {
        Self::with_policy(store, Arc::new(RolePolicy))
    }

    pub fn with_policy(store: GuideStore, policy: Arc<dyn AccessPolicy>) -> Self {
        Self { store, policy }
    }

    /// Load a guide and check that `actor` may change it.
    async fn editable(&self, actor: &User, guide_id: &str) -> ServiceResult<Guide> {
        let guide = self
            .store
            .get_guide(guide_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !self.policy.can_edit(actor, &guide.creator_id) {
            return Err(ServiceError::Forbidden);
        }
        Ok(guide)
    }

    pub async fn create(
        &self,
        actor: Option<&User>,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> ServiceResult<String> {
        let actor = require_actor(actor)?;
        let title = validate_body(title, content)?;

        let id = self.store.create_guide(&actor.id, title, content, tags).await?;
        info!(guide_id = %id, user_id = %actor.id, "Guide created");
        Ok(id)
    }

    /// `tags: None` keeps the current tags; `Some(&[])` clears them.
    pub async fn update(
        &self,
        actor: Option<&User>,
        guide_id: &str,
        title: &str,
        content: &str,
        tags: Option<&[String]>,
    ) -> ServiceResult<()> {
        let actor = require_actor(actor)?;
        let guide_id = require_id(guide_id)?;
        self.editable(actor, guide_id).await?;
        let title = validate_body(title, content)?;

        self.store.update_guide(guide_id, title, content, tags).await?;
        info!(guide_id = %guide_id, user_id = %actor.id, tags_replaced = tags.is_some(), "Guide updated");
        Ok(())
    }

    /// Published guides are visible to anyone; drafts only to those who may edit them.
    pub async fn get(&self, actor: Option<&User>, guide_id: &str) -> ServiceResult<Guide> {
        let guide_id = require_id(guide_id)?;
        let guide = self
            .store
            .get_guide(guide_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        // Deactivated users are treated as anonymous
        let actor = actor.filter(|a| a.is_active);
        if self.policy.can_view(actor, &guide) {
            return Ok(guide);
        }
        match actor {
            None => Err(ServiceError::Unauthenticated),
            Some(_) => Err(ServiceError::Forbidden),
        }
    }

    pub async fn list_published(&self, query: &ListQuery) -> ServiceResult<Vec<Guide>> {
        Ok(self.store.list_published(query).await?)
    }

    pub async fn publish(&self, actor: Option<&User>, guide_id: &str) -> ServiceResult<()> {
        self.transition(actor, guide_id, GuideStatus::Published).await
    }

    pub async fn unpublish(&self, actor: Option<&User>, guide_id: &str) -> ServiceResult<()> {
        self.transition(actor, guide_id, GuideStatus::Draft).await
    }

    async fn transition(
        &self,
        actor: Option<&User>,
        guide_id: &str,
        status: GuideStatus,
    ) -> ServiceResult<()> {
        let actor = require_actor(actor)?;
        let guide_id = require_id(guide_id)?;
        self.editable(actor, guide_id).await?;

        self.store.set_status(guide_id, status).await?;
        info!(guide_id = %guide_id, user_id = %actor.id, status = %status, "Guide status changed");
        Ok(())
    }

    pub async fn delete(&self, actor: Option<&User>, guide_id: &str) -> ServiceResult<()> {
        let actor = require_actor(actor)?;
        let guide_id = require_id(guide_id)?;
        self.editable(actor, guide_id).await?;

        self.store.delete_guide(guide_id).await?;
        info!(guide_id = %guide_id, user_id = %actor.id, "Guide deleted");
        Ok(())
    }
}
