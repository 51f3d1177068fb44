//! Membership ledger — group creation, join/leave/kick and discovery.
//!
//! All authorization checks happen before any mutation; a rejected
//! operation leaves no partial state behind. The member-set change and
//! the member_count adjustment are a single atomic repository operation,
//! so concurrent joins on the same group cannot lose updates.

use rankit_core::error::{RankError, RankResult};
use rankit_core::models::group::{CreateGroup, Group, GroupSummary};
use rankit_core::repository::{GroupRepository, PaginatedResult, Pagination, UserRepository};
use rankit_core::validate::sanitize;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;

/// Membership service.
///
/// Generic over repository implementations so the engine has no
/// dependency on the database crate.
pub struct MembershipService<G: GroupRepository, U: UserRepository> {
    groups: G,
    users: U,
    config: EngineConfig,
}

impl<G: GroupRepository, U: UserRepository> MembershipService<G, U> {
    pub fn new(groups: G, users: U, config: EngineConfig) -> Self {
        Self {
            groups,
            users,
            config,
        }
    }

    /// Create a group with `owner` as its sole member and admin.
    pub async fn create_group(
        &self,
        name: &str,
        description: &str,
        owner: Uuid,
    ) -> RankResult<Group> {
        let name = sanitize(name, self.config.group_name_max_len);
        if name.chars().count() < self.config.group_name_min_len {
            return Err(RankError::Validation {
                message: format!(
                    "Group name must be at least {} characters",
                    self.config.group_name_min_len
                ),
            });
        }

        let description = sanitize(description, self.config.description_max_len);
        if description.is_empty() {
            return Err(RankError::Validation {
                message: "Description is required".into(),
            });
        }

        // Confirm the owner exists before creating anything.
        self.users.get_by_id(owner).await?;

        let group = self
            .groups
            .create(CreateGroup {
                name,
                description,
                owner_id: owner,
            })
            .await?;

        self.users.add_group(owner, group.id).await?;

        info!(group_id = %group.id, owner = %owner, "group created");
        Ok(group)
    }

    /// Join a group. Fails with `AlreadyMember` for existing members;
    /// re-joining never double-increments member_count.
    pub async fn join_group(&self, group_id: Uuid, user: Uuid) -> RankResult<()> {
        let added = self.groups.add_member(group_id, user).await?;
        if !added {
            return Err(RankError::AlreadyMember);
        }

        self.users.add_group(user, group_id).await?;
        info!(group_id = %group_id, user = %user, "member joined");
        Ok(())
    }

    /// Leave a group. The owner can never leave.
    pub async fn leave_group(&self, group_id: Uuid, user: Uuid) -> RankResult<()> {
        let group = self.groups.get_by_id(group_id).await?;
        if group.is_owner(user) {
            return Err(RankError::OwnerCannotLeave);
        }

        let removed = self.groups.remove_member(group_id, user).await?;
        if !removed {
            return Err(RankError::NotAMember);
        }

        self.users.remove_group(user, group_id).await?;
        info!(group_id = %group_id, user = %user, "member left");
        Ok(())
    }

    /// Remove `target` from the group on behalf of `actor`.
    ///
    /// Only admins may kick; the owner can never be removed, and admins
    /// can only be removed by leaving voluntarily.
    pub async fn kick_member(
        &self,
        group_id: Uuid,
        target: Uuid,
        actor: Uuid,
    ) -> RankResult<()> {
        let group = self.groups.get_by_id(group_id).await?;

        if !group.is_admin(actor) {
            return Err(RankError::NotAuthorized {
                reason: "only group admins can remove members".into(),
            });
        }
        if group.is_owner(target) {
            return Err(RankError::CannotRemoveOwner);
        }
        if group.is_admin(target) {
            return Err(RankError::CannotRemoveAdmin);
        }

        let removed = self.groups.remove_member(group_id, target).await?;
        if !removed {
            return Err(RankError::NotAMember);
        }

        self.users.remove_group(target, group_id).await?;
        info!(group_id = %group_id, target = %target, actor = %actor, "member kicked");
        Ok(())
    }

    pub async fn is_member(&self, group_id: Uuid, user: Uuid) -> RankResult<bool> {
        self.groups.is_member(group_id, user).await
    }

    pub async fn is_admin(&self, group_id: Uuid, user: Uuid) -> RankResult<bool> {
        self.groups.is_admin(group_id, user).await
    }

    pub async fn get_group(&self, group_id: Uuid) -> RankResult<Group> {
        self.groups.get_by_id(group_id).await
    }

    /// Paginated group discovery, newest first. `search` matches name or
    /// description case-insensitively. `page` is 1-based.
    pub async fn discover(
        &self,
        search: Option<&str>,
        page: u64,
        viewer: Option<Uuid>,
    ) -> RankResult<PaginatedResult<GroupSummary>> {
        let limit = self.config.discover_page_size;
        let offset = page.saturating_sub(1) * limit;

        let result = self
            .groups
            .search(search, Pagination { offset, limit })
            .await?;

        Ok(PaginatedResult {
            items: result
                .items
                .into_iter()
                .map(|g| summarize(g, viewer))
                .collect(),
            total: result.total,
            offset: result.offset,
            limit: result.limit,
        })
    }

    /// Groups the user belongs to, newest first.
    pub async fn groups_for(&self, user: Uuid) -> RankResult<Vec<GroupSummary>> {
        let groups = self.groups.get_user_groups(user).await?;
        Ok(groups
            .into_iter()
            .map(|g| summarize(g, Some(user)))
            .collect())
    }
}

fn summarize(group: Group, viewer: Option<Uuid>) -> GroupSummary {
    let (is_member, is_admin) = match viewer {
        Some(v) => (group.is_member(v), group.is_admin(v)),
        None => (false, false),
    };
    GroupSummary {
        group,
        is_member,
        is_admin,
    }
}
