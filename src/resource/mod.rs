//! Resource lifecycle layer
//!
//! Each submodule runs the multi-step flows an infrastructure-as-code
//! adapter needs for one resource kind: create then configure then read
//! back, read that tolerates a vanished resource, update, and delete that
//! treats "already gone" as done. Results are flat state structs; diffing
//! them against desired configuration is the caller's job.
//!
//! # Architecture
//!
//! - [`person`] - Person accounts with optional password or reset token
//! - [`service_account`] - Service accounts and their API tokens
//! - [`group`] - Groups, full-replace and incremental membership
//! - [`oauth2`] - Confidential OAuth2 clients and their scope maps

pub mod group;
pub mod oauth2;
pub mod person;
pub mod service_account;

use crate::error::Result;

/// Turn NotFound into `None` so a read of a deleted resource is not an error
pub(crate) fn found<T>(result: Result<T>, kind: &str, id: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            tracing::warn!("{} '{}' not found, treating as removed", kind, id);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Treat NotFound on delete as already deleted
pub(crate) fn gone(result: Result<()>, kind: &str, id: &str) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => {
            tracing::debug!("{} '{}' already deleted", kind, id);
            Ok(())
        }
        other => other,
    }
}
