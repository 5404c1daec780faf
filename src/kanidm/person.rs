//! Kanidm person accounts

use super::client::{person_path, sub_path, KanidmClient};
use super::entry::{AttrsRequest, Entry};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A person account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: String,
    pub display_name: String,
    pub mail: Vec<String>,
}

impl From<&Entry> for Person {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.get_string("name"),
            display_name: entry.get_string("displayname"),
            mail: entry.get_string_sequence("mail"),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Create a person account.
///
/// The server does not echo attributes back, so the result is built from
/// the inputs.
pub async fn create_person(client: &KanidmClient, name: &str, display_name: &str) -> Result<Person> {
    let req = AttrsRequest::new()
        .single("name", name)
        .single("displayname", display_name);

    client
        .post(&person_path(None), &req)
        .await
        .map_err(|e| e.context("create person"))?;

    Ok(Person {
        id: name.to_string(),
        display_name: display_name.to_string(),
        mail: Vec::new(),
    })
}

/// Fetch a person account by ID
pub async fn get_person(client: &KanidmClient, id: &str) -> Result<Person> {
    let entry: Entry = client
        .get(&person_path(Some(id)))
        .await
        .and_then(|resp| resp.decode())
        .map_err(|e| e.context("get person"))?;

    Ok(Person::from(&entry))
}

/// Update a person account.
///
/// An empty `display_name` and a `None` `mail` leave those attributes
/// unchanged. `Some(&[])` clears mail.
pub async fn update_person(
    client: &KanidmClient,
    id: &str,
    display_name: &str,
    mail: Option<&[String]>,
) -> Result<()> {
    let req = AttrsRequest::new()
        .single_if_set("displayname", display_name)
        .multi_if_set("mail", mail);

    client
        .patch(&person_path(Some(id)), &req)
        .await
        .map_err(|e| e.context("update person"))?;

    Ok(())
}

/// Delete a person account. A missing account is reported as NotFound.
pub async fn delete_person(client: &KanidmClient, id: &str) -> Result<()> {
    client
        .delete(&person_path(Some(id)))
        .await
        .map_err(|e| e.context("delete person"))?;

    Ok(())
}

/// Set the password of a person account through the credential update intent endpoint
pub async fn set_person_password(client: &KanidmClient, id: &str, password: &str) -> Result<()> {
    let path = sub_path(&person_path(Some(id)), &["_credential", "_update_intent"]);

    client
        .post(&path, &json!({ "password": password }))
        .await
        .map_err(|e| e.context("set person password"))?;

    Ok(())
}

/// Mint a one-time credential reset token, optionally with a TTL in seconds
pub async fn create_person_credential_reset_token(
    client: &KanidmClient,
    id: &str,
    ttl: Option<u64>,
) -> Result<String> {
    let base = sub_path(&person_path(Some(id)), &["_credential", "_update_intent"]);
    let path = match ttl {
        Some(ttl) => format!("{}/{}", base, ttl),
        None => base,
    };

    let resp: TokenResponse = client
        .get(&path)
        .await
        .and_then(|resp| resp.decode())
        .map_err(|e| e.context("create person credential reset token"))?;

    Ok(resp.token)
}
