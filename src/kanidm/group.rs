//! Kanidm groups
//!
//! Membership can be changed two ways: [`update_group`] replaces the whole
//! member set, while [`add_group_members`] and [`remove_group_members`] edit
//! it incrementally. Nothing here serializes the two paths against each
//! other; callers must pick one strategy per group.

use super::client::{group_path, sub_path, KanidmClient};
use super::entry::{AttrsRequest, Entry};
use crate::error::Result;
use serde::Serialize;

/// A group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: String,
    pub description: String,
    /// Never absent; an unset member attribute reads as empty
    pub members: Vec<String>,
}

impl From<&Entry> for Group {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.get_string("name"),
            description: entry.get_string("description"),
            members: entry.get_string_sequence("member"),
        }
    }
}

#[derive(Serialize)]
struct MembersRequest<'a> {
    attrs: &'a [String],
}

/// Create a group. An empty `description` is left out of the payload.
pub async fn create_group(client: &KanidmClient, name: &str, description: &str) -> Result<Group> {
    let req = AttrsRequest::new()
        .single("name", name)
        .single_if_set("description", description);

    client
        .post(&group_path(None), &req)
        .await
        .map_err(|e| e.context("create group"))?;

    Ok(Group {
        id: name.to_string(),
        description: description.to_string(),
        members: Vec::new(),
    })
}

/// Fetch a group by ID
pub async fn get_group(client: &KanidmClient, id: &str) -> Result<Group> {
    let entry: Entry = client
        .get(&group_path(Some(id)))
        .await
        .and_then(|resp| resp.decode())
        .map_err(|e| e.context("get group"))?;

    Ok(Group::from(&entry))
}

/// Update a group. `Some(members)` replaces the member set, `None` leaves it alone.
pub async fn update_group(
    client: &KanidmClient,
    id: &str,
    description: &str,
    members: Option<&[String]>,
) -> Result<()> {
    let req = AttrsRequest::new()
        .single_if_set("description", description)
        .multi_if_set("member", members);

    client
        .patch(&group_path(Some(id)), &req)
        .await
        .map_err(|e| e.context("update group"))?;

    Ok(())
}

/// Delete a group. A missing group is reported as NotFound.
pub async fn delete_group(client: &KanidmClient, id: &str) -> Result<()> {
    client
        .delete(&group_path(Some(id)))
        .await
        .map_err(|e| e.context("delete group"))?;

    Ok(())
}

/// Add members to a group
pub async fn add_group_members(client: &KanidmClient, group_id: &str, member_ids: &[String]) -> Result<()> {
    let path = sub_path(&group_path(Some(group_id)), &["_attr", "member"]);

    client
        .post(&path, &MembersRequest { attrs: member_ids })
        .await
        .map_err(|e| e.context("add group members"))?;

    Ok(())
}

/// Remove members from a group
pub async fn remove_group_members(client: &KanidmClient, group_id: &str, member_ids: &[String]) -> Result<()> {
    let path = sub_path(&group_path(Some(group_id)), &["_attr", "member"]);

    client
        .send(reqwest::Method::DELETE, &path, &MembersRequest { attrs: member_ids })
        .await
        .map_err(|e| e.context("remove group members"))?;

    Ok(())
}
