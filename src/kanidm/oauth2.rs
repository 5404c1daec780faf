//! Kanidm OAuth2 clients (resource servers)
//!
//! A client is either confidential ("basic", holds a server-generated
//! secret) or public. The kind is fixed at creation.
//!
//! Secret lifecycle:
//!
//! ```text
//! create_basic --> secret generated --get_secret--> unchanged
//!                                   --regenerate_secret--> new secret, old one invalid
//! ```
//!
//! [`get_oauth2_basic_secret`] is read-only and may be repeated freely.
//! [`regenerate_oauth2_basic_secret`] is destructive and must only be used
//! when rotation is the intent.

use super::client::{oauth2_path, sub_path, with_segment, KanidmClient};
use super::entry::{AttrsRequest, Entry};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Attribute whose presence marks a confidential client. The server always
/// hides its value, so only the key is meaningful.
pub const BASIC_SECRET_ATTR: &str = "oauth2_rs_basic_secret";

/// Scopes granted to the members of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMap {
    pub group: String,
    pub scopes: Vec<String>,
}

/// An OAuth2 client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuth2Client {
    pub name: String,
    pub display_name: String,
    /// Origin without the trailing slash the server appends
    pub origin: String,
    pub redirect_uris: Vec<String>,
    pub client_id: String,
    /// Only set by create calls and explicit secret reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub is_public: bool,
}

impl From<&Entry> for OAuth2Client {
    fn from(entry: &Entry) -> Self {
        let mut name = entry.get_string("name");
        if name.is_empty() {
            name = entry.get_string("oauth2_rs_name");
        }

        Self {
            client_id: name.clone(),
            name,
            display_name: entry.get_string("displayname"),
            origin: normalize_origin(&entry.get_string("oauth2_rs_origin")).to_string(),
            redirect_uris: entry.get_string_sequence("oauth2_rs_origin_landing"),
            client_secret: None,
            is_public: !entry.has(BASIC_SECRET_ATTR),
        }
    }
}

/// Strip exactly one trailing slash
pub fn normalize_origin(origin: &str) -> &str {
    origin.strip_suffix('/').unwrap_or(origin)
}

fn create_request(name: &str, display_name: &str, origin: &str) -> AttrsRequest {
    AttrsRequest::new()
        .single("name", name)
        .single("displayname", display_name)
        .single("oauth2_rs_origin_landing", origin)
}

/// Create a confidential client and fetch its generated secret.
///
/// The create response does not carry the secret, so a second call reads
/// it. If that read fails the client exists server-side and the error is
/// reported as incomplete.
pub async fn create_oauth2_basic_client(
    client: &KanidmClient,
    name: &str,
    display_name: &str,
    origin: &str,
) -> Result<OAuth2Client> {
    client
        .post(&sub_path(&oauth2_path(None), &["_basic"]), &create_request(name, display_name, origin))
        .await
        .map_err(|e| e.context("create oauth2 basic client"))?;

    let secret = get_oauth2_basic_secret(client, name)
        .await
        .map_err(|e| e.incomplete("oauth2 client", name, "secret retrieval"))?;

    Ok(OAuth2Client {
        name: name.to_string(),
        display_name: display_name.to_string(),
        origin: origin.to_string(),
        redirect_uris: Vec::new(),
        client_id: name.to_string(),
        client_secret: Some(secret),
        is_public: false,
    })
}

/// Create a public client
pub async fn create_oauth2_public_client(
    client: &KanidmClient,
    name: &str,
    display_name: &str,
    origin: &str,
) -> Result<OAuth2Client> {
    client
        .post(&sub_path(&oauth2_path(None), &["_public"]), &create_request(name, display_name, origin))
        .await
        .map_err(|e| e.context("create oauth2 public client"))?;

    Ok(OAuth2Client {
        name: name.to_string(),
        display_name: display_name.to_string(),
        origin: origin.to_string(),
        redirect_uris: Vec::new(),
        client_id: name.to_string(),
        client_secret: None,
        is_public: true,
    })
}

/// Fetch an OAuth2 client by name
pub async fn get_oauth2_client(client: &KanidmClient, name: &str) -> Result<OAuth2Client> {
    let entry: Entry = client
        .get(&oauth2_path(Some(name)))
        .await
        .and_then(|resp| resp.decode())
        .map_err(|e| e.context("get oauth2 client"))?;

    Ok(OAuth2Client::from(&entry))
}

/// Update an OAuth2 client. Empty strings and `None` leave fields unchanged.
pub async fn update_oauth2_client(
    client: &KanidmClient,
    name: &str,
    display_name: &str,
    origin: &str,
    redirect_uris: Option<&[String]>,
) -> Result<()> {
    let req = AttrsRequest::new()
        .single_if_set("displayname", display_name)
        .single_if_set("oauth2_rs_origin", origin)
        .multi_if_set("oauth2_rs_origin_landing", redirect_uris);

    client
        .patch(&oauth2_path(Some(name)), &req)
        .await
        .map_err(|e| e.context("update oauth2 client"))?;

    Ok(())
}

/// Delete an OAuth2 client. A missing client is reported as NotFound.
pub async fn delete_oauth2_client(client: &KanidmClient, name: &str) -> Result<()> {
    client
        .delete(&oauth2_path(Some(name)))
        .await
        .map_err(|e| e.context("delete oauth2 client"))?;

    Ok(())
}

/// Set the scopes granted to `group_name`. The body is the bare scope list.
pub async fn set_oauth2_scope_map(
    client: &KanidmClient,
    rs_name: &str,
    group_name: &str,
    scopes: &[String],
) -> Result<()> {
    let path = with_segment(&sub_path(&oauth2_path(Some(rs_name)), &["_scopemap"]), group_name);

    client
        .post(&path, scopes)
        .await
        .map_err(|e| e.context("set oauth2 scope map"))?;

    Ok(())
}

/// Remove the scope mapping for `group_name`
pub async fn delete_oauth2_scope_map(client: &KanidmClient, rs_name: &str, group_name: &str) -> Result<()> {
    let path = with_segment(&sub_path(&oauth2_path(Some(rs_name)), &["_scopemap"]), group_name);

    client
        .delete(&path)
        .await
        .map_err(|e| e.context("delete oauth2 scope map"))?;

    Ok(())
}

/// Read the current secret of a confidential client
pub async fn get_oauth2_basic_secret(client: &KanidmClient, name: &str) -> Result<String> {
    let path = sub_path(&oauth2_path(Some(name)), &["_basic_secret"]);

    client
        .get(&path)
        .await
        .and_then(|resp| resp.decode())
        .map_err(|e| e.context("get oauth2 basic secret"))
}

/// Replace the secret of a confidential client. The previous secret stops working.
pub async fn regenerate_oauth2_basic_secret(client: &KanidmClient, name: &str) -> Result<String> {
    let path = sub_path(&oauth2_path(Some(name)), &["_basic_secret"]);

    client
        .send_empty(reqwest::Method::POST, &path)
        .await
        .and_then(|resp| resp.decode())
        .map_err(|e| e.context("regenerate oauth2 basic secret"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> OAuth2Client {
        let entry: Entry = serde_json::from_value(value).unwrap();
        OAuth2Client::from(&entry)
    }

    #[test]
    fn test_normalize_origin() {
        assert_eq!(normalize_origin("https://x.example.com/"), "https://x.example.com");
        assert_eq!(normalize_origin("https://x.example.com"), "https://x.example.com");
        assert_eq!(normalize_origin("https://x.example.com//"), "https://x.example.com/");
        assert_eq!(normalize_origin(""), "");
    }

    #[test]
    fn test_public_detection_uses_key_presence() {
        let confidential = decode(json!({"attrs": {
            "name": ["grafana"],
            "oauth2_rs_basic_secret": []
        }}));
        assert!(!confidential.is_public);

        let hidden_value = decode(json!({"attrs": {
            "name": ["grafana"],
            "oauth2_rs_basic_secret": ""
        }}));
        assert!(!hidden_value.is_public);

        let public = decode(json!({"attrs": {"name": ["spa"]}}));
        assert!(public.is_public);
    }

    #[test]
    fn test_name_falls_back_to_rs_name() {
        let client = decode(json!({"attrs": {
            "oauth2_rs_name": ["legacy"],
            "oauth2_rs_origin": ["https://legacy.example.com/"],
            "oauth2_rs_origin_landing": ["https://legacy.example.com/login"]
        }}));
        assert_eq!(client.name, "legacy");
        assert_eq!(client.client_id, "legacy");
        assert_eq!(client.origin, "https://legacy.example.com");
        assert_eq!(client.redirect_uris, vec!["https://legacy.example.com/login".to_string()]);
    }
}
