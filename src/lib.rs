//! Typed create/read/update/delete operations for Kanidm identity resources.
//!
//! [`kanidm`] holds the API client: one request per operation, with the
//! attribute view normalizing Kanidm's list-valued attributes. [`resource`]
//! builds the multi-step lifecycle flows an infrastructure-as-code adapter
//! runs on top of it.

pub mod config;
pub mod error;
pub mod kanidm;
pub mod resource;

pub use error::{Error, ErrorKind, Result};
pub use kanidm::client::{ClientConfig, KanidmClient};
