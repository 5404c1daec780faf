//! Kanidm API interaction module
//!
//! This module provides typed operations against the Kanidm identity
//! management REST API.
//!
//! # Module Structure
//!
//! - [`http`] - Request execution and status classification
//! - [`client`] - Main Kanidm client and its configuration
//! - [`entry`] - Attribute view over schemaless entries
//! - [`person`] - Person accounts
//! - [`service_account`] - Service accounts and API tokens
//! - [`group`] - Groups and membership
//! - [`oauth2`] - OAuth2 clients, secrets and scope maps
//!
//! # Example
//!
//! ```ignore
//! use kanidm_tf::kanidm::client::{ClientConfig, KanidmClient};
//! use kanidm_tf::kanidm::group;
//!
//! async fn example() -> kanidm_tf::Result<()> {
//!     let client = KanidmClient::new(ClientConfig::new("https://idm.example.com", "token"))?;
//!     let developers = group::get_group(&client, "developers").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod entry;
pub mod group;
pub mod http;
pub mod oauth2;
pub mod person;
pub mod service_account;
