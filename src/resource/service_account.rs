//! Service account lifecycle

use super::{found, gone};
use crate::error::Result;
use crate::kanidm::client::KanidmClient;
use crate::kanidm::service_account::{self, ServiceAccount};

/// Create a service account; the returned token cannot be read again later
pub async fn create(client: &KanidmClient, id: &str) -> Result<ServiceAccount> {
    tracing::debug!("Creating service account '{}'", id);
    let account = service_account::create_service_account(client, id).await?;
    tracing::info!("Service account '{}' created", id);
    Ok(account)
}

/// Read a service account; `None` if it no longer exists
pub async fn read(client: &KanidmClient, id: &str) -> Result<Option<ServiceAccount>> {
    found(
        service_account::get_service_account(client, id).await,
        "service account",
        id,
    )
}

/// Mint a replacement token. Revoking older tokens is up to the server.
pub async fn rotate_token(
    client: &KanidmClient,
    id: &str,
    label: &str,
    expiry: Option<i64>,
) -> Result<String> {
    service_account::generate_service_account_token(client, id, label, expiry).await
}

/// Delete a service account; an already-deleted account is not an error
pub async fn delete(client: &KanidmClient, id: &str) -> Result<()> {
    gone(
        service_account::delete_service_account(client, id).await,
        "service account",
        id,
    )
}
