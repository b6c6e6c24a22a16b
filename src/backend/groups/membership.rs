/**
 * Membership Synchronizer
 *
 * `Group::members` is authoritative; `User::groups` is a projection kept in
 * step with it. Every operation here writes the group first, then brings the
 * back-references in line with the stored member set. Replace diffs against
 * the users actually holding the back-reference rather than the previous
 * member list, and join repairs a missing back-reference before reporting
 * `AlreadyMember`, so re-running a partially failed operation converges.
 * A create whose back-reference write fails removes the new group again.
 *
 * There is no per-group lock. Two conflicting writes to the same group
 * (replace racing join, for example) can interleave and one side's change
 * may be lost; each individual write is still atomic in the store.
 */

use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::groups::invite::InviteCodec;
use crate::backend::store::{GroupStore, Repositories, UserStore};
use crate::shared::models::{Group, NewGroup};

/// Members = admin first, then requested ids in order, without duplicates
pub fn normalize_members(admin: Uuid, requested: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    std::iter::once(admin)
        .chain(requested.iter().copied())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Ids in `from` that are not in `other`
fn difference(from: &[Uuid], other: &[Uuid]) -> Vec<Uuid> {
    let other: HashSet<&Uuid> = other.iter().collect();
    from.iter().filter(|id| !other.contains(id)).copied().collect()
}

/// Group lifecycle and membership operations
#[derive(Clone)]
pub struct MembershipService {
    users: Arc<dyn UserStore>,
    groups: Arc<dyn GroupStore>,
    invites: InviteCodec,
}

impl MembershipService {
    pub fn new(repos: &Repositories, invites: InviteCodec) -> Self {
        Self {
            users: repos.users.clone(),
            groups: repos.groups.clone(),
            invites,
        }
    }

    pub fn invites(&self) -> &InviteCodec {
        &self.invites
    }

    /// Drop ids that do not resolve to a user
    async fn existing_users(&self, ids: &[Uuid]) -> BackendResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: HashSet<Uuid> = self.users.find_many(ids).await?.into_iter().map(|u| u.id).collect();
        let (known, unknown): (Vec<Uuid>, Vec<Uuid>) = ids.iter().partition(|id| found.contains(id));
        if !unknown.is_empty() {
            tracing::warn!("Ignoring {} unknown member id(s): {:?}", unknown.len(), unknown);
        }
        Ok(known)
    }

    async fn load(&self, group_id: Uuid) -> BackendResult<Group> {
        self.groups
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Group"))
    }

    /// Load a group the caller administers
    async fn load_as_admin(&self, group_id: Uuid, caller: Uuid) -> BackendResult<Group> {
        let group = self.load(group_id).await?;
        if !group.is_admin(caller) {
            tracing::warn!("User {} attempted admin action on group {}", caller, group_id);
            return Err(BackendError::NotAuthorized);
        }
        Ok(group)
    }

    /// Load a group the caller belongs to
    pub async fn require_member(&self, group_id: Uuid, caller: Uuid) -> BackendResult<Group> {
        let group = self.load(group_id).await?;
        if !group.is_member(caller) {
            return Err(BackendError::NotAuthorized);
        }
        Ok(group)
    }

    /// Create a group with `admin` plus `requested` as members
    pub async fn create(&self, admin: Uuid, name: &str, requested: &[Uuid]) -> BackendResult<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BackendError::validation("name", "Group name is required"));
        }

        let requested = self.existing_users(requested).await?;
        let members = normalize_members(admin, &requested);
        let group = self
            .groups
            .create(NewGroup {
                name: name.to_string(),
                admin,
                members: members.clone(),
            })
            .await?;
        if let Err(e) = self.users.add_group_ref(&members, group.id).await {
            tracing::error!("Back-references for new group {} failed, removing it: {}", group.id, e);
            self.discard(group.id).await;
            return Err(e.into());
        }

        tracing::info!("Group {} created by {} with {} member(s)", group.id, admin, members.len());
        Ok(group)
    }

    /// Best-effort removal of a group whose creation did not complete
    async fn discard(&self, group_id: Uuid) {
        if let Err(e) = self.users.remove_group_ref_everywhere(group_id).await {
            tracing::error!("Failed to clear back-references of group {}: {}", group_id, e);
        }
        if let Err(e) = self.groups.delete(group_id).await {
            tracing::error!("Failed to remove incomplete group {}: {}", group_id, e);
        }
    }

    /// Groups the user belongs to, read from the authoritative side
    pub async fn list_for_user(&self, user_id: Uuid) -> BackendResult<Vec<Group>> {
        Ok(self.groups.list_for_member(user_id).await?)
    }

    /// Issue an invite token for a group the caller administers
    pub async fn issue_invite(&self, group_id: Uuid, caller: Uuid) -> BackendResult<(Group, String)> {
        let group = self.load_as_admin(group_id, caller).await?;
        let token = self.invites.issue(group.id, caller)?;
        Ok((group, token))
    }

    /// Admit `user_id` into the group named by an invite token
    pub async fn join(&self, token: &str, user_id: Uuid) -> BackendResult<Group> {
        let grant = self.invites.redeem(token)?;
        let group = self.load(grant.group_id).await?;
        if group.is_member(user_id) {
            // A previous join may have stopped before the back-reference
            self.users.add_group_ref(&[user_id], group.id).await?;
            return Err(BackendError::AlreadyMember);
        }

        let group = self
            .groups
            .add_members(group.id, &[user_id])
            .await?
            .ok_or_else(|| BackendError::not_found("Group"))?;
        self.users.add_group_ref(&[user_id], group.id).await?;

        tracing::info!("User {} joined group {} (invited by {})", user_id, group.id, grant.inviter_id);
        Ok(group)
    }

    /// Rename and/or replace the member set
    ///
    /// With `members` the new set is `{admin} ∪ members`; users holding a
    /// stale back-reference lose it and members missing one gain it.
    /// Unaffected users are never touched.
    pub async fn replace(
        &self,
        group_id: Uuid,
        caller: Uuid,
        name: Option<&str>,
        members: Option<&[Uuid]>,
    ) -> BackendResult<Group> {
        let group = self.load_as_admin(group_id, caller).await?;

        let name = match name.map(str::trim) {
            Some("") => return Err(BackendError::validation("name", "Group name is required")),
            Some(name) => name.to_string(),
            None => group.name.clone(),
        };
        let new_members = match members {
            Some(requested) => {
                let requested = self.existing_users(requested).await?;
                normalize_members(group.admin, &requested)
            }
            None => group.members.clone(),
        };

        let updated = self
            .groups
            .replace(group.id, &name, &new_members)
            .await?
            .ok_or_else(|| BackendError::not_found("Group"))?;

        let holders = self.users.list_group_holders(group.id).await?;
        let removed = difference(&holders, &new_members);
        let added = difference(&new_members, &holders);
        self.users.remove_group_ref(&removed, group.id).await?;
        self.users.add_group_ref(&added, group.id).await?;

        tracing::info!(
            "Group {} updated: {} added, {} removed",
            group.id,
            added.len(),
            removed.len()
        );
        Ok(updated)
    }

    /// Set-union `ids` into the member set
    pub async fn add_members(&self, group_id: Uuid, caller: Uuid, ids: &[Uuid]) -> BackendResult<Group> {
        self.load_as_admin(group_id, caller).await?;
        let ids = self.existing_users(ids).await?;

        let updated = self
            .groups
            .add_members(group_id, &ids)
            .await?
            .ok_or_else(|| BackendError::not_found("Group"))?;
        self.users.add_group_ref(&ids, group_id).await?;

        tracing::info!("Added {} member(s) to group {}", ids.len(), group_id);
        Ok(updated)
    }

    /// Remove every back-reference, then the group record
    pub async fn delete(&self, group_id: Uuid, caller: Uuid) -> BackendResult<()> {
        let group = self.load_as_admin(group_id, caller).await?;

        let cleared = self.users.remove_group_ref_everywhere(group.id).await?;
        self.groups.delete(group.id).await?;

        tracing::info!("Group {} deleted, {} back-reference(s) cleared", group.id, cleared);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::StoreError;
    use crate::shared::models::{NewUser, ProfileUpdate, User};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Fails the next back-reference write of the armed kind, delegates the rest
    #[derive(Default)]
    struct Interrupt {
        add: AtomicBool,
        remove: AtomicBool,
    }

    struct FlakyUsers {
        inner: Arc<dyn UserStore>,
        interrupt: Arc<Interrupt>,
    }

    fn interrupted(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Corrupt("connection reset".into()));
        }
        Ok(())
    }

    #[async_trait]
    impl UserStore for FlakyUsers {
        async fn create(&self, new: NewUser) -> Result<User, StoreError> {
            self.inner.create(new).await
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.inner.find_by_id(id).await
        }
        async fn find_by_external_uid(&self, uid: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_external_uid(uid).await
        }
        async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_phone(phone).await
        }
        async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
            self.inner.find_many(ids).await
        }
        async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, StoreError> {
            self.inner.search(query, limit).await
        }
        async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, StoreError> {
            self.inner.update_profile(id, update).await
        }
        async fn set_push_token(&self, id: Uuid, token: Option<&str>) -> Result<bool, StoreError> {
            self.inner.set_push_token(id, token).await
        }
        async fn add_group_ref(&self, user_ids: &[Uuid], group_id: Uuid) -> Result<(), StoreError> {
            interrupted(&self.interrupt.add)?;
            self.inner.add_group_ref(user_ids, group_id).await
        }
        async fn remove_group_ref(&self, user_ids: &[Uuid], group_id: Uuid) -> Result<(), StoreError> {
            interrupted(&self.interrupt.remove)?;
            self.inner.remove_group_ref(user_ids, group_id).await
        }
        async fn list_group_holders(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
            self.inner.list_group_holders(group_id).await
        }
        async fn remove_group_ref_everywhere(&self, group_id: Uuid) -> Result<u64, StoreError> {
            self.inner.remove_group_ref_everywhere(group_id).await
        }
    }

    fn flaky(repos: &Repositories) -> (Repositories, Arc<Interrupt>) {
        let interrupt = Arc::new(Interrupt::default());
        let users = Arc::new(FlakyUsers { inner: repos.users.clone(), interrupt: interrupt.clone() });
        (repos.clone().with_users(users), interrupt)
    }

    async fn user(repos: &Repositories, name: &str) -> Uuid {
        repos
            .users
            .create(NewUser {
                external_uid: Some(format!("uid-{}", name)),
                username: name.to_string(),
                phone_number: format!("+1-{}", name),
                dob: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn groups_of(repos: &Repositories, id: Uuid) -> Vec<Uuid> {
        repos.users.find_by_id(id).await.unwrap().unwrap().groups
    }

    fn service(repos: &Repositories) -> MembershipService {
        MembershipService::new(repos, InviteCodec::new("secret", 7))
    }

    #[test]
    fn test_normalize_members_dedupes_and_puts_admin_first() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(normalize_members(a, &[b, a, b]), vec![a, b]);
        assert_eq!(normalize_members(a, &[]), vec![a]);
    }

    #[tokio::test]
    async fn test_create_adds_back_references() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let b = user(&repos, "bob").await;

        let group = svc.create(a, "Hikers", &[b, b]).await.unwrap();
        assert_eq!(group.members, vec![a, b]);
        assert_eq!(groups_of(&repos, a).await, vec![group.id]);
        assert_eq!(groups_of(&repos, b).await, vec![group.id]);
    }

    #[tokio::test]
    async fn test_create_drops_unknown_members() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;

        let group = svc.create(a, "Solo", &[Uuid::new_v4()]).await.unwrap();
        assert_eq!(group.members, vec![a]);
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        assert!(matches!(svc.create(a, "  ", &[]).await, Err(BackendError::Validation(_))));
    }

    #[tokio::test]
    async fn test_join_twice_is_already_member() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let c = user(&repos, "carol").await;
        let group = svc.create(a, "Hikers", &[]).await.unwrap();
        let (_, token) = svc.issue_invite(group.id, a).await.unwrap();

        let joined = svc.join(&token, c).await.unwrap();
        assert_eq!(joined.members, vec![a, c]);
        assert!(matches!(svc.join(&token, c).await, Err(BackendError::AlreadyMember)));
        assert!(matches!(svc.join(&token, c).await, Err(BackendError::AlreadyMember)));

        let group = repos.groups.find_by_id(group.id).await.unwrap().unwrap();
        assert_eq!(group.members, vec![a, c]);
        assert_eq!(groups_of(&repos, c).await, vec![group.id]);
    }

    #[tokio::test]
    async fn test_join_deleted_group_is_not_found() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let c = user(&repos, "carol").await;
        let group = svc.create(a, "Hikers", &[]).await.unwrap();
        let (_, token) = svc.issue_invite(group.id, a).await.unwrap();
        svc.delete(group.id, a).await.unwrap();

        assert!(matches!(svc.join(&token, c).await, Err(BackendError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_replace_with_empty_list_keeps_admin_only() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let b = user(&repos, "bob").await;
        let c = user(&repos, "carol").await;
        let group = svc.create(a, "Hikers", &[b, c]).await.unwrap();

        let updated = svc.replace(group.id, a, None, Some(&[])).await.unwrap();
        assert_eq!(updated.members, vec![a]);
        assert_eq!(updated.name, "Hikers");
        assert_eq!(groups_of(&repos, a).await, vec![group.id]);
        assert!(groups_of(&repos, b).await.is_empty());
        assert!(groups_of(&repos, c).await.is_empty());
    }

    #[tokio::test]
    async fn test_replace_applies_set_difference() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let b = user(&repos, "bob").await;
        let c = user(&repos, "carol").await;
        let d = user(&repos, "dave").await;
        let group = svc.create(a, "Hikers", &[b, c]).await.unwrap();

        let updated = svc.replace(group.id, a, Some("Climbers"), Some(&[c, d])).await.unwrap();
        assert_eq!(updated.name, "Climbers");
        assert_eq!(updated.members, vec![a, c, d]);
        assert!(groups_of(&repos, b).await.is_empty());
        assert_eq!(groups_of(&repos, c).await, vec![group.id]);
        assert_eq!(groups_of(&repos, d).await, vec![group.id]);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_mutate() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let b = user(&repos, "bob").await;
        let group = svc.create(a, "Hikers", &[b]).await.unwrap();

        assert!(matches!(svc.replace(group.id, b, Some("x"), None).await, Err(BackendError::NotAuthorized)));
        assert!(matches!(svc.add_members(group.id, b, &[]).await, Err(BackendError::NotAuthorized)));
        assert!(matches!(svc.delete(group.id, b).await, Err(BackendError::NotAuthorized)));
        assert!(matches!(svc.issue_invite(group.id, b).await, Err(BackendError::NotAuthorized)));
    }

    #[tokio::test]
    async fn test_add_members_is_union() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let b = user(&repos, "bob").await;
        let c = user(&repos, "carol").await;
        let group = svc.create(a, "Hikers", &[b]).await.unwrap();

        let updated = svc.add_members(group.id, a, &[b, c]).await.unwrap();
        assert_eq!(updated.members, vec![a, b, c]);
        assert_eq!(groups_of(&repos, b).await, vec![group.id]);
        assert_eq!(groups_of(&repos, c).await, vec![group.id]);
    }

    #[tokio::test]
    async fn test_delete_leaves_unrelated_users_untouched() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let b = user(&repos, "bob").await;
        let z = user(&repos, "zed").await;
        let doomed = svc.create(a, "Doomed", &[b]).await.unwrap();
        let other = svc.create(z, "Other", &[b]).await.unwrap();

        svc.delete(doomed.id, a).await.unwrap();

        assert!(groups_of(&repos, a).await.is_empty());
        assert_eq!(groups_of(&repos, b).await, vec![other.id]);
        assert_eq!(groups_of(&repos, z).await, vec![other.id]);
        assert!(repos.groups.find_by_id(doomed.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_group_is_not_found() {
        let repos = Repositories::in_memory();
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        assert!(matches!(
            svc.require_member(Uuid::new_v4(), a).await,
            Err(BackendError::NotFound { resource: "Group" })
        ));
    }

    #[tokio::test]
    async fn test_replace_retry_clears_stale_back_reference() {
        let (repos, interrupt) = flaky(&Repositories::in_memory());
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let b = user(&repos, "bob").await;
        let group = svc.create(a, "Hikers", &[b]).await.unwrap();

        interrupt.remove.store(true, Ordering::SeqCst);
        assert!(matches!(svc.replace(group.id, a, None, Some(&[])).await, Err(BackendError::Storage(_))));
        assert_eq!(groups_of(&repos, b).await, vec![group.id]);

        let updated = svc.replace(group.id, a, None, Some(&[])).await.unwrap();
        assert_eq!(updated.members, vec![a]);
        assert!(groups_of(&repos, b).await.is_empty());
        assert_eq!(groups_of(&repos, a).await, vec![group.id]);
    }

    #[tokio::test]
    async fn test_replace_retry_adds_missing_back_reference() {
        let (repos, interrupt) = flaky(&Repositories::in_memory());
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let b = user(&repos, "bob").await;
        let group = svc.create(a, "Hikers", &[]).await.unwrap();

        interrupt.add.store(true, Ordering::SeqCst);
        assert!(svc.replace(group.id, a, None, Some(&[b])).await.is_err());
        assert!(groups_of(&repos, b).await.is_empty());

        svc.replace(group.id, a, None, Some(&[b])).await.unwrap();
        assert_eq!(groups_of(&repos, b).await, vec![group.id]);
    }

    #[tokio::test]
    async fn test_join_retry_repairs_back_reference() {
        let (repos, interrupt) = flaky(&Repositories::in_memory());
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let c = user(&repos, "carol").await;
        let group = svc.create(a, "Hikers", &[]).await.unwrap();
        let (_, token) = svc.issue_invite(group.id, a).await.unwrap();

        interrupt.add.store(true, Ordering::SeqCst);
        assert!(svc.join(&token, c).await.is_err());
        assert!(groups_of(&repos, c).await.is_empty());

        assert!(matches!(svc.join(&token, c).await, Err(BackendError::AlreadyMember)));
        let group = repos.groups.find_by_id(group.id).await.unwrap().unwrap();
        assert_eq!(group.members, vec![a, c]);
        assert_eq!(groups_of(&repos, c).await, vec![group.id]);
    }

    #[tokio::test]
    async fn test_create_failure_leaves_no_group_behind() {
        let (repos, interrupt) = flaky(&Repositories::in_memory());
        let svc = service(&repos);
        let a = user(&repos, "alice").await;
        let b = user(&repos, "bob").await;

        interrupt.add.store(true, Ordering::SeqCst);
        assert!(svc.create(a, "Hikers", &[b]).await.is_err());
        assert!(repos.groups.list_for_member(a).await.unwrap().is_empty());
        assert!(repos.groups.list_for_member(b).await.unwrap().is_empty());

        let group = svc.create(a, "Hikers", &[b]).await.unwrap();
        assert_eq!(repos.groups.list_for_member(a).await.unwrap().len(), 1);
        assert_eq!(groups_of(&repos, b).await, vec![group.id]);
    }
}
