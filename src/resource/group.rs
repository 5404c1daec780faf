//! Group lifecycle
//!
//! Member lists come back from the server in no particular order, so every
//! comparison here is by set.

use super::{found, gone};
use crate::error::Result;
use crate::kanidm::client::KanidmClient;
use crate::kanidm::group::{self, Group};
use std::collections::BTreeSet;

/// Desired state of a group
#[derive(Debug, Clone, Default)]
pub struct GroupSpec {
    pub id: String,
    pub description: String,
    /// `None` leaves membership unmanaged
    pub members: Option<Vec<String>>,
}

/// Members to add and remove to get from one member set to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChange {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl MembershipChange {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Whether two member lists hold the same members, ignoring order and duplicates
pub fn same_members(a: &[String], b: &[String]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

/// Set difference between `current` and `desired`, sorted
pub fn diff_members(current: &[String], desired: &[String]) -> MembershipChange {
    let current: BTreeSet<&String> = current.iter().collect();
    let desired: BTreeSet<&String> = desired.iter().collect();

    MembershipChange {
        add: desired.difference(&current).map(|m| m.to_string()).collect(),
        remove: current.difference(&desired).map(|m| m.to_string()).collect(),
    }
}

/// Create a group, set its initial members, and read it back
pub async fn create(client: &KanidmClient, spec: &GroupSpec) -> Result<Group> {
    tracing::debug!("Creating group '{}'", spec.id);

    let created = group::create_group(client, &spec.id, &spec.description).await?;
    let id = created.id.as_str();

    if let Some(members) = spec.members.as_deref().filter(|m| !m.is_empty()) {
        group::update_group(client, id, "", Some(members))
            .await
            .map_err(|e| e.incomplete("group", id, "member update"))?;
    }

    let current = group::get_group(client, id)
        .await
        .map_err(|e| e.incomplete("group", id, "read back"))?;

    tracing::info!("Group '{}' created", id);
    Ok(current)
}

/// Read a group; `None` if it no longer exists
pub async fn read(client: &KanidmClient, id: &str) -> Result<Option<Group>> {
    found(group::get_group(client, id).await, "group", id)
}

/// Apply description and full-replace membership changes, then read back
pub async fn update(client: &KanidmClient, spec: &GroupSpec) -> Result<Group> {
    group::update_group(client, &spec.id, &spec.description, spec.members.as_deref()).await?;
    group::get_group(client, &spec.id).await
}

/// Bring membership to `desired` with incremental add/remove calls.
///
/// Do not mix with [`update`] on the same group: the two paths are not
/// coordinated and a concurrent full replace can undo these edits.
pub async fn sync_members(client: &KanidmClient, id: &str, desired: &[String]) -> Result<MembershipChange> {
    let current = group::get_group(client, id).await?;
    let change = diff_members(&current.members, desired);

    if !change.add.is_empty() {
        group::add_group_members(client, id, &change.add).await?;
    }
    if !change.remove.is_empty() {
        group::remove_group_members(client, id, &change.remove).await?;
    }

    tracing::debug!(
        "Group '{}' membership synced: +{} -{}",
        id,
        change.add.len(),
        change.remove.len()
    );
    Ok(change)
}

/// Delete a group; an already-deleted group is not an error
pub async fn delete(client: &KanidmClient, id: &str) -> Result<()> {
    gone(group::delete_group(client, id).await, "group", id)
}
