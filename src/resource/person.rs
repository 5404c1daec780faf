//! Person lifecycle

use super::{found, gone};
use crate::error::Result;
use crate::kanidm::client::KanidmClient;
use crate::kanidm::person::{self, Person};
use serde::Serialize;

/// Default lifetime of a credential reset token, in seconds
pub const DEFAULT_RESET_TOKEN_TTL: u64 = 3600;

/// How the account's first credential is set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSetup {
    Password(String),
    /// Mint a one-time token for setting credentials through the web UI
    ResetToken { ttl: u64 },
}

impl CredentialSetup {
    pub fn reset_token() -> Self {
        CredentialSetup::ResetToken {
            ttl: DEFAULT_RESET_TOKEN_TTL,
        }
    }
}

/// Desired state of a person
#[derive(Debug, Clone, Default)]
pub struct PersonSpec {
    pub id: String,
    pub display_name: String,
    /// `None` leaves mail unmanaged
    pub mail: Option<Vec<String>>,
    pub credential: Option<CredentialSetup>,
}

/// Observed state after a lifecycle call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonState {
    pub id: String,
    pub display_name: String,
    pub mail: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_reset_token: Option<String>,
}

impl PersonState {
    fn new(person: Person, credential_reset_token: Option<String>) -> Self {
        Self {
            id: person.id,
            display_name: person.display_name,
            mail: person.mail,
            credential_reset_token,
        }
    }
}

async fn apply_credential(
    client: &KanidmClient,
    id: &str,
    credential: Option<&CredentialSetup>,
) -> Result<Option<String>> {
    match credential {
        Some(CredentialSetup::Password(password)) => {
            tracing::debug!("Setting password for person '{}'", id);
            person::set_person_password(client, id, password).await?;
            Ok(None)
        }
        Some(CredentialSetup::ResetToken { ttl }) => {
            tracing::debug!("Generating credential reset token for person '{}'", id);
            let token = person::create_person_credential_reset_token(client, id, Some(*ttl)).await?;
            Ok(Some(token))
        }
        None => Ok(None),
    }
}

/// Create a person, set up its credential and mail, and read it back
pub async fn create(client: &KanidmClient, spec: &PersonSpec) -> Result<PersonState> {
    tracing::debug!("Creating person '{}'", spec.id);

    let created = person::create_person(client, &spec.id, &spec.display_name).await?;
    let id = created.id.as_str();

    let token = apply_credential(client, id, spec.credential.as_ref())
        .await
        .map_err(|e| e.incomplete("person", id, "credential setup"))?;

    if let Some(mail) = spec.mail.as_deref().filter(|mail| !mail.is_empty()) {
        person::update_person(client, id, "", Some(mail))
            .await
            .map_err(|e| e.incomplete("person", id, "mail update"))?;
    }

    let current = person::get_person(client, id)
        .await
        .map_err(|e| e.incomplete("person", id, "read back"))?;

    tracing::info!("Person '{}' created", id);
    Ok(PersonState::new(current, token))
}

/// Read a person; `None` if it no longer exists
pub async fn read(client: &KanidmClient, id: &str) -> Result<Option<Person>> {
    found(person::get_person(client, id).await, "person", id)
}

/// Apply display name, mail and optional credential changes, then read back
pub async fn update(client: &KanidmClient, spec: &PersonSpec) -> Result<PersonState> {
    person::update_person(client, &spec.id, &spec.display_name, spec.mail.as_deref()).await?;

    let token = apply_credential(client, &spec.id, spec.credential.as_ref()).await?;
    let current = person::get_person(client, &spec.id).await?;

    Ok(PersonState::new(current, token))
}

/// Delete a person; an already-deleted person is not an error
pub async fn delete(client: &KanidmClient, id: &str) -> Result<()> {
    gone(person::delete_person(client, id).await, "person", id)
}
