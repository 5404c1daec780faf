//! Confidential OAuth2 client lifecycle
//!
//! Scope maps cannot be read back from the server, so the caller keeps the
//! last applied set and hands it to [`update`] for diffing.

use super::{found, gone};
use crate::error::{Error, Result};
use crate::kanidm::client::KanidmClient;
use crate::kanidm::oauth2::{self, OAuth2Client, ScopeMap};
use serde::Serialize;
use std::collections::BTreeMap;

/// Desired state of a confidential OAuth2 client
#[derive(Debug, Clone, Default)]
pub struct OAuth2Spec {
    pub name: String,
    pub display_name: String,
    pub origin: String,
    /// `None` leaves redirect URIs unmanaged
    pub redirect_uris: Option<Vec<String>>,
    pub scope_maps: Vec<ScopeMap>,
}

/// Observed state after a lifecycle call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuth2State {
    #[serde(flatten)]
    pub client: OAuth2Client,
    pub scope_maps: Vec<ScopeMap>,
}

/// Scope-map calls needed to move from one set of mappings to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeMapPlan {
    /// Groups whose mapping must be removed
    pub delete: Vec<String>,
    /// Mappings to (re)apply; one per group, last definition wins
    pub set: Vec<ScopeMap>,
}

/// Plan scope-map calls. Every desired group is set again, even if
/// unchanged, since each set call fully replaces that group's scopes.
pub fn plan_scope_maps(previous: &[ScopeMap], desired: &[ScopeMap]) -> ScopeMapPlan {
    let desired_by_group: BTreeMap<&str, &ScopeMap> =
        desired.iter().map(|sm| (sm.group.as_str(), sm)).collect();

    let mut delete: Vec<String> = previous
        .iter()
        .filter(|sm| !desired_by_group.contains_key(sm.group.as_str()))
        .map(|sm| sm.group.clone())
        .collect();
    delete.sort();
    delete.dedup();

    ScopeMapPlan {
        delete,
        set: desired_by_group.into_values().cloned().collect(),
    }
}

async fn apply_scope_maps(client: &KanidmClient, name: &str, plan: &ScopeMapPlan) -> Result<()> {
    for group in &plan.delete {
        tracing::debug!("Deleting scope map for group '{}' on '{}'", group, name);
        oauth2::delete_oauth2_scope_map(client, name, group).await?;
    }
    for sm in &plan.set {
        tracing::debug!(
            "Setting scope map for group '{}' on '{}' ({} scopes)",
            sm.group,
            name,
            sm.scopes.len()
        );
        oauth2::set_oauth2_scope_map(client, name, &sm.group, &sm.scopes).await?;
    }
    Ok(())
}

/// Create a confidential client, configure it, and read it back.
///
/// The secret comes from the create step; reads never return it.
pub async fn create(client: &KanidmClient, spec: &OAuth2Spec) -> Result<OAuth2State> {
    tracing::debug!("Creating OAuth2 basic client '{}'", spec.name);

    let created =
        oauth2::create_oauth2_basic_client(client, &spec.name, &spec.display_name, &spec.origin).await?;
    let name = created.name.as_str();

    oauth2::update_oauth2_client(
        client,
        name,
        &spec.display_name,
        &spec.origin,
        spec.redirect_uris.as_deref(),
    )
    .await
    .map_err(|e| e.incomplete("oauth2 client", name, "configuration"))?;

    let plan = plan_scope_maps(&[], &spec.scope_maps);
    apply_scope_maps(client, name, &plan)
        .await
        .map_err(|e| e.incomplete("oauth2 client", name, "scope map configuration"))?;

    let mut current = oauth2::get_oauth2_client(client, name)
        .await
        .map_err(|e| e.incomplete("oauth2 client", name, "read back"))?;
    current.client_secret = created.client_secret;

    tracing::info!("OAuth2 basic client '{}' created", name);
    Ok(OAuth2State {
        client: current,
        scope_maps: plan.set,
    })
}

/// Read a confidential client; `None` if it no longer exists.
///
/// A public client under this name is an error. When `known_secret` is
/// empty (e.g. after an import) the secret is fetched with the read-only
/// endpoint; a failure there is logged and leaves the secret unset.
pub async fn read(
    client: &KanidmClient,
    name: &str,
    known_secret: Option<&str>,
) -> Result<Option<OAuth2Client>> {
    let Some(mut current) = found(oauth2::get_oauth2_client(client, name).await, "oauth2 client", name)?
    else {
        return Ok(None);
    };

    if current.is_public {
        return Err(Error::UnexpectedClientKind {
            name: name.to_string(),
        });
    }

    match known_secret.filter(|s| !s.is_empty()) {
        Some(secret) => current.client_secret = Some(secret.to_string()),
        None => match oauth2::get_oauth2_basic_secret(client, name).await {
            Ok(secret) => current.client_secret = Some(secret),
            Err(e) => tracing::warn!("Could not retrieve client secret for '{}': {}", name, e),
        },
    }

    Ok(Some(current))
}

/// Apply attribute and scope-map changes, then read back.
///
/// `previous_scope_maps` is the set last applied by the caller.
pub async fn update(
    client: &KanidmClient,
    spec: &OAuth2Spec,
    previous_scope_maps: &[ScopeMap],
) -> Result<OAuth2State> {
    oauth2::update_oauth2_client(
        client,
        &spec.name,
        &spec.display_name,
        &spec.origin,
        spec.redirect_uris.as_deref(),
    )
    .await?;

    let plan = plan_scope_maps(previous_scope_maps, &spec.scope_maps);
    apply_scope_maps(client, &spec.name, &plan).await?;

    let current = oauth2::get_oauth2_client(client, &spec.name).await?;
    Ok(OAuth2State {
        client: current,
        scope_maps: plan.set,
    })
}

/// Replace the client secret. The previous secret stops working.
pub async fn rotate_secret(client: &KanidmClient, name: &str) -> Result<String> {
    tracing::info!("Regenerating secret for OAuth2 client '{}'", name);
    oauth2::regenerate_oauth2_basic_secret(client, name).await
}

/// Delete a client; an already-deleted client is not an error
pub async fn delete(client: &KanidmClient, name: &str) -> Result<()> {
    gone(oauth2::delete_oauth2_client(client, name).await, "oauth2 client", name)
}
