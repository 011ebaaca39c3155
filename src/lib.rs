//! # algoliasearch
//!
//! An async client for the Algolia Search REST API with client-side load
//! balancing and host failover.
//!
//! ## Features
//!
//! - **Failover**: every request is tried against the application's hosts in
//!   an order shuffled once per client, moving on after network errors,
//!   `503` answers and undecodable bodies
//! - **Terminal errors**: `403` and `404` stop the failover immediately
//! - **Query builder**: [`Query`] renders search parameters to a query string
//! - **Rate limit forwarding**: authenticate as admin on behalf of an end user
//!   and a rate-limited key
//! - **Pluggable transport**: [`Transport`] decouples the dispatcher from
//!   `reqwest`, so tests can run against in-memory fakes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use algoliasearch::{Client, Query};
//! use serde_json::json;
//!
//! # async fn example() -> algoliasearch::Result<()> {
//! let client = Client::new("YourApplicationID", "YourAPIKey")?;
//! let index = client.init_index("contacts");
//!
//! let task = index
//!     .add_object(&json!({ "firstname": "Jimmie", "lastname": "Barninger" }))
//!     .await?;
//! if let Some(task_id) = task["taskID"].as_u64() {
//!     index.wait_task(task_id).await?;
//! }
//!
//! let result = index
//!     .search(&Query::with_text("jim").attributes_to_retrieve(["firstname"]))
//!     .await?;
//! println!("{}", result["nbHits"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`dispatcher`] - Multi-host request dispatch
//! - [`query`] - Search parameters
//! - [`index`] - Index-scoped operations
//! - Configuration types re-exported from the private `config` module

mod api;
mod client;
mod config;
pub mod dispatcher;
mod error;
pub mod index;
mod keys;
pub mod query;
mod reqwestx;

pub use api::{HttpRequest, HttpResponse, Method, Transport};
pub use client::Client;
pub use config::*;
pub use dispatcher::RequestDispatcher;
pub use error::{Error, Result, TransportError};
pub use index::{BatchAction, BatchOperation, Index};
pub use keys::{Acl, UserKey};
pub use query::{Query, QueryType};
pub use reqwestx::ReqwestTransport;
