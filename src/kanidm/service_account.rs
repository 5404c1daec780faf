//! Kanidm service accounts

use super::client::{service_account_path, sub_path, KanidmClient};
use super::entry::{AttrsRequest, Entry};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Label given to the token minted when an account is created
pub const INITIAL_TOKEN_LABEL: &str = "terraform-managed";

/// A service account.
///
/// `api_token` is only ever populated by [`create_service_account`]; the
/// server never returns it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceAccount {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl From<&Entry> for ServiceAccount {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.get_string("name"),
            api_token: None,
        }
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    label: &'a str,
    expiry: Option<i64>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Create a service account and mint its initial API token.
///
/// If the token cannot be minted the account still exists; the error is
/// reported as incomplete.
pub async fn create_service_account(client: &KanidmClient, name: &str) -> Result<ServiceAccount> {
    let req = AttrsRequest::new().single("name", name);

    client
        .post(&service_account_path(None), &req)
        .await
        .map_err(|e| e.context("create service account"))?;

    let token = generate_service_account_token(client, name, INITIAL_TOKEN_LABEL, None)
        .await
        .map_err(|e| e.incomplete("service account", name, "initial token generation"))?;

    Ok(ServiceAccount {
        id: name.to_string(),
        api_token: Some(token),
    })
}

/// Fetch a service account by ID
pub async fn get_service_account(client: &KanidmClient, id: &str) -> Result<ServiceAccount> {
    let entry: Entry = client
        .get(&service_account_path(Some(id)))
        .await
        .and_then(|resp| resp.decode())
        .map_err(|e| e.context("get service account"))?;

    Ok(ServiceAccount::from(&entry))
}

/// Update a service account. An empty `display_name` leaves it unchanged.
pub async fn update_service_account(client: &KanidmClient, id: &str, display_name: &str) -> Result<()> {
    let req = AttrsRequest::new().single_if_set("displayname", display_name);

    client
        .patch(&service_account_path(Some(id)), &req)
        .await
        .map_err(|e| e.context("update service account"))?;

    Ok(())
}

/// Delete a service account. A missing account is reported as NotFound.
pub async fn delete_service_account(client: &KanidmClient, id: &str) -> Result<()> {
    client
        .delete(&service_account_path(Some(id)))
        .await
        .map_err(|e| e.context("delete service account"))?;

    Ok(())
}

/// Mint a new API token. `expiry` is a unix timestamp in seconds; `None`
/// means the token does not expire.
pub async fn generate_service_account_token(
    client: &KanidmClient,
    id: &str,
    label: &str,
    expiry: Option<i64>,
) -> Result<String> {
    let path = sub_path(&service_account_path(Some(id)), &["_api_token"]);

    let resp: TokenResponse = client
        .post(&path, &TokenRequest { label, expiry })
        .await
        .and_then(|resp| resp.decode())
        .map_err(|e| e.context("generate api token"))?;

    Ok(resp.token)
}
