//! Blocking client for the ActiveCampaign v3 REST API.
//!
//! # Overview
//! Covers contacts, tags, lists and custom fields: create/sync/update a
//! contact, tag it, subscribe it to a list, and read fields, tags, lists and
//! field values. Responses come back as `serde_json::Value`.
//!
//! # Design
//! - `Config` holds base URL, default token, API version and the label
//!   dictionary. Build it once and share it through `Arc`.
//! - `ActiveCampaign` resolves the token (instance override, then config),
//!   builds `HttpRequest` values and interprets `HttpResponse` values.
//! - `Transport` performs the round-trip; `UreqTransport` is the default.
//! - Write operations exist twice: `op` returns the decoded body or an
//!   `ApiError`, `try_op` returns a success flag.
//!
//! ```no_run
//! use std::sync::Arc;
//! use activecampaign_core::{ActiveCampaign, Config, ContactInput};
//!
//! let config = Arc::new(Config::new("https://acct.api-us1.com", Some("token")));
//! let mut client = ActiveCampaign::connect(config, None)?;
//! let contact = client.first_or_create_contact(
//!     "ada@example.com",
//!     &ContactInput::with_email("ada@example.com"),
//! )?;
//! println!("{}", contact["contact"]["id"]);
//! # Ok::<(), activecampaign_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{parse_response, ActiveCampaign, LastRequest};
pub use config::Config;
pub use dictionary::Dictionary;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{ContactInput, ContactListInput, ContactTagInput, FieldValue, ListStatus};
