//! Request translator for the ActiveCampaign v3 API.
//!
//! # Design
//! Every operation funnels through `build_request`, which composes
//! `/api/{version}{resource}`, records it as the last request, and shapes
//! the payload by verb: query pairs for GET, a JSON body for POST/PUT. The
//! built `HttpRequest` goes through the `Transport` and the `HttpResponse`
//! is interpreted by `parse_response`.
//!
//! Write operations come in pairs. `create_contact` returns the decoded
//! body or an `ApiError`; `try_create_contact` collapses every failure into
//! `false` and every success into `true`. Reads only have the decoding form.

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::http::{query_pairs, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

/// Method and path of the most recent request, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRequest {
    pub method: HttpMethod,
    pub url: String,
}

/// Client for one API token against the account in `Config`.
///
/// Calls take `&mut self` because each one overwrites `last_request`; use
/// one instance per thread.
#[derive(Debug)]
pub struct ActiveCampaign<T = UreqTransport> {
    config: Arc<Config>,
    api_token: Option<String>,
    transport: T,
    last_request: Option<LastRequest>,
}

impl ActiveCampaign<UreqTransport> {
    /// Build a client using the default blocking transport.
    ///
    /// `api_token` overrides the token stored in `config`.
    pub fn connect(config: Arc<Config>, api_token: Option<&str>) -> Result<Self, ApiError> {
        Self::with_transport(config, api_token, UreqTransport::new())
    }
}

impl<T: Transport> ActiveCampaign<T> {
    /// Build a client that sends requests through `transport`.
    ///
    /// Fails with `ApiError::Configuration` when neither `api_token` nor the
    /// config holds a non-empty token, or when the base URL or API version
    /// is empty.
    pub fn with_transport(
        config: Arc<Config>,
        api_token: Option<&str>,
        transport: T,
    ) -> Result<Self, ApiError> {
        let api_token = api_token.filter(|t| !t.is_empty()).map(str::to_string);
        if api_token.is_none() && config.api_token().map_or(true, str::is_empty) {
            return Err(ApiError::Configuration("an API token".to_string()));
        }
        if config.base_url().is_empty() {
            return Err(ApiError::Configuration("a base URL".to_string()));
        }
        if config.api_version().is_empty() {
            return Err(ApiError::Configuration("an API version".to_string()));
        }

        Ok(Self {
            config,
            api_token,
            transport,
            last_request: None,
        })
    }

    /// The token sent with every request: the instance override if set,
    /// otherwise the config token.
    pub fn api_token(&self) -> &str {
        self.api_token
            .as_deref()
            .or_else(|| self.config.api_token())
            .unwrap_or_default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn last_request(&self) -> Option<&LastRequest> {
        self.last_request.as_ref()
    }

    /// Build the request for `resource` and record it as the last request.
    ///
    /// GET turns `params` (a JSON object or `null`) into query pairs; POST
    /// and PUT serialize it as the body.
    pub fn build_request(
        &mut self,
        method: HttpMethod,
        resource: &str,
        params: &Value,
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("/api/{}{}", self.config.api_version(), resource);
        self.last_request = Some(LastRequest {
            method,
            url: path.clone(),
        });

        let mut headers = vec![
            ("Api-Token".to_string(), self.api_token().to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        let (query, body) = match method {
            HttpMethod::Get => (query_pairs(params)?, None),
            HttpMethod::Post | HttpMethod::Put => {
                let body = serde_json::to_string(params)
                    .map_err(|e| ApiError::SerializationError(e.to_string()))?;
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                (Vec::new(), Some(body))
            }
        };

        Ok(HttpRequest {
            method,
            url: format!("{}{}", self.config.base_url().trim_end_matches('/'), path),
            query,
            headers,
            body,
        })
    }

    fn dispatch(
        &mut self,
        method: HttpMethod,
        resource: &str,
        params: &Value,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(method, resource, params)?;
        debug!(%method, url = %request.url, query_pairs = request.query.len(), "dispatching request");

        let response = self.transport.execute(&request).inspect_err(|e| {
            warn!(%method, url = %request.url, error = %e, "request did not complete");
        })?;
        if !response.is_success() {
            warn!(%method, url = %request.url, status = response.status, "request failed");
        }
        Ok(response)
    }

    fn fetch(&mut self, method: HttpMethod, resource: &str, params: &Value) -> Result<Value, ApiError> {
        let response = self.dispatch(method, resource, params)?;
        parse_response(response)
    }

    fn send<D: Serialize + ?Sized>(
        &mut self,
        method: HttpMethod,
        resource: &str,
        key: &str,
        data: &D,
    ) -> Result<Value, ApiError> {
        let payload = wrap(key, data)?;
        self.fetch(method, resource, &payload)
    }

    fn try_send<D: Serialize + ?Sized>(
        &mut self,
        method: HttpMethod,
        resource: &str,
        key: &str,
        data: &D,
    ) -> bool {
        let Ok(payload) = wrap(key, data) else {
            return false;
        };
        self.dispatch(method, resource, &payload)
            .is_ok_and(|response| response.is_success())
    }

    fn read<Q: Serialize + ?Sized>(&mut self, resource: &str, query: &Q) -> Result<Value, ApiError> {
        let params =
            serde_json::to_value(query).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        self.fetch(HttpMethod::Get, resource, &params)
    }

    // ── Writing ──────────────────────────────────────────────────────────

    pub fn create_contact<D: Serialize + ?Sized>(&mut self, data: &D) -> Result<Value, ApiError> {
        self.send(HttpMethod::Post, "/contacts", "contact", data)
    }

    pub fn try_create_contact<D: Serialize + ?Sized>(&mut self, data: &D) -> bool {
        self.try_send(HttpMethod::Post, "/contacts", "contact", data)
    }

    /// Create the contact, or update the one with the same email.
    pub fn create_or_update_contact<D: Serialize + ?Sized>(&mut self, data: &D) -> Result<Value, ApiError> {
        self.send(HttpMethod::Post, "/contact/sync", "contact", data)
    }

    pub fn try_create_or_update_contact<D: Serialize + ?Sized>(&mut self, data: &D) -> bool {
        self.try_send(HttpMethod::Post, "/contact/sync", "contact", data)
    }

    /// Return `{"contact": <first match>}` for `email`, or create the
    /// contact from `new_data` and return the create response.
    pub fn first_or_create_contact<D: Serialize + ?Sized>(
        &mut self,
        email: &str,
        new_data: &D,
    ) -> Result<Value, ApiError> {
        let found = self.get_contacts_by(&json!({ "email": email }))?;
        match first_contact(&found) {
            Some(contact) => Ok(json!({ "contact": contact })),
            None => self.create_contact(new_data),
        }
    }

    /// `true` when a contact with `email` exists or was just created.
    pub fn try_first_or_create_contact<D: Serialize + ?Sized>(&mut self, email: &str, new_data: &D) -> bool {
        match self.get_contacts_by(&json!({ "email": email })) {
            Ok(found) if first_contact(&found).is_some() => true,
            Ok(_) => self.try_create_contact(new_data),
            Err(_) => false,
        }
    }

    // ── Updating ─────────────────────────────────────────────────────────

    pub fn update_contact<D: Serialize + ?Sized>(
        &mut self,
        contact_id: impl Display,
        data: &D,
    ) -> Result<Value, ApiError> {
        self.send(HttpMethod::Put, &format!("/contacts/{contact_id}"), "contact", data)
    }

    pub fn try_update_contact<D: Serialize + ?Sized>(&mut self, contact_id: impl Display, data: &D) -> bool {
        self.try_send(HttpMethod::Put, &format!("/contacts/{contact_id}"), "contact", data)
    }

    // ── Relating ─────────────────────────────────────────────────────────

    pub fn add_tag_to_contact<D: Serialize + ?Sized>(&mut self, data: &D) -> Result<Value, ApiError> {
        self.send(HttpMethod::Post, "/contactTags", "contactTag", data)
    }

    pub fn try_add_tag_to_contact<D: Serialize + ?Sized>(&mut self, data: &D) -> bool {
        self.try_send(HttpMethod::Post, "/contactTags", "contactTag", data)
    }

    pub fn add_contact_to_list<D: Serialize + ?Sized>(&mut self, data: &D) -> Result<Value, ApiError> {
        self.send(HttpMethod::Post, "/contactLists", "contactList", data)
    }

    pub fn try_add_contact_to_list<D: Serialize + ?Sized>(&mut self, data: &D) -> bool {
        self.try_send(HttpMethod::Post, "/contactLists", "contactList", data)
    }

    // ── Fetching ─────────────────────────────────────────────────────────
    //
    // `query` is anything that serializes to a JSON object; pass `&()` for
    // no query string.

    pub fn get_all_fields<Q: Serialize + ?Sized>(&mut self, query: &Q) -> Result<Value, ApiError> {
        self.read("/fields", query)
    }

    pub fn get_all_custom_fields<Q: Serialize + ?Sized>(&mut self, query: &Q) -> Result<Value, ApiError> {
        self.read("/fieldValues", query)
    }

    pub fn get_all_tags<Q: Serialize + ?Sized>(&mut self, query: &Q) -> Result<Value, ApiError> {
        self.read("/tags", query)
    }

    pub fn get_all_lists<Q: Serialize + ?Sized>(&mut self, query: &Q) -> Result<Value, ApiError> {
        self.read("/lists", query)
    }

    pub fn get_contact_field_values<Q: Serialize + ?Sized>(
        &mut self,
        contact_id: impl Display,
        query: &Q,
    ) -> Result<Value, ApiError> {
        self.read(&format!("/contacts/{contact_id}/fieldValues"), query)
    }

    pub fn get_contact(&mut self, contact_id: impl Display) -> Result<Value, ApiError> {
        self.fetch(HttpMethod::Get, &format!("/contacts/{contact_id}"), &Value::Null)
    }

    pub fn get_contacts_by<Q: Serialize + ?Sized>(&mut self, query: &Q) -> Result<Value, ApiError> {
        self.read("/contacts", query)
    }
}

/// Interpret a response in decoding mode.
///
/// 2xx decodes the body (an empty body becomes `Value::Null`), 400 and above
/// is `HttpError`, anything else is `UnexpectedStatus`.
pub fn parse_response(response: HttpResponse) -> Result<Value, ApiError> {
    if response.is_failure() {
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body,
        });
    }
    if !response.is_success() {
        return Err(ApiError::UnexpectedStatus {
            status: response.status,
            body: response.body,
        });
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// `{ key: data }`, with a `null` payload sent as an empty object.
fn wrap<D: Serialize + ?Sized>(key: &str, data: &D) -> Result<Value, ApiError> {
    let data = match serde_json::to_value(data) {
        Ok(Value::Null) => Value::Object(Map::new()),
        Ok(value) => value,
        Err(e) => return Err(ApiError::SerializationError(e.to_string())),
    };
    let mut payload = Map::new();
    payload.insert(key.to_string(), data);
    Ok(Value::Object(payload))
}

fn first_contact(found: &Value) -> Option<&Value> {
    found.get("contacts")?.as_array()?.first()
}
