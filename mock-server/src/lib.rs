use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEFAULT_API_TOKEN: &str = "test-token";
pub const API_PREFIX: &str = "/api/3";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub perstag: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub id: String,
    pub contact: String,
    pub field: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub tag: String,
    pub tag_type: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct List {
    pub id: String,
    pub name: String,
    pub stringid: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContactTag {
    pub id: String,
    pub contact: String,
    pub tag: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContactList {
    pub id: String,
    pub contact: String,
    pub list: String,
    pub status: u8,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub field_values: Vec<FieldValueInput>,
}

#[derive(Deserialize)]
pub struct FieldValueInput {
    #[serde(deserialize_with = "id")]
    pub field: String,
    pub value: String,
}

#[derive(Deserialize)]
pub struct ContactTagInput {
    #[serde(deserialize_with = "id")]
    pub contact: String,
    #[serde(deserialize_with = "id")]
    pub tag: String,
}

#[derive(Deserialize)]
pub struct ContactListInput {
    #[serde(deserialize_with = "id")]
    pub contact: String,
    #[serde(deserialize_with = "id")]
    pub list: String,
    #[serde(default = "subscribed")]
    pub status: u8,
}

#[derive(Deserialize)]
struct ContactEnvelope {
    contact: ContactInput,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactTagEnvelope {
    contact_tag: ContactTagInput,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactListEnvelope {
    contact_list: ContactListInput,
}

fn subscribed() -> u8 {
    1
}

/// Ids arrive as strings or numbers; the API always answers with strings.
fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
    }
}

/// In-memory account state.
pub struct Store {
    pub contacts: Vec<Contact>,
    pub field_values: Vec<FieldValue>,
    pub contact_tags: Vec<ContactTag>,
    pub contact_lists: Vec<ContactList>,
    pub fields: Vec<Field>,
    pub tags: Vec<Tag>,
    pub lists: Vec<List>,
}

impl Default for Store {
    fn default() -> Self {
        let field = |id: &str, title: &str, kind: &str, perstag: &str| Field {
            id: id.to_string(),
            title: title.to_string(),
            kind: kind.to_string(),
            perstag: perstag.to_string(),
        };
        let tag = |id: &str, name: &str| Tag {
            id: id.to_string(),
            tag: name.to_string(),
            tag_type: "contact".to_string(),
            description: String::new(),
        };
        Self {
            contacts: Vec::new(),
            field_values: Vec::new(),
            contact_tags: Vec::new(),
            contact_lists: Vec::new(),
            fields: vec![
                field("1", "Company", "text", "COMPANY"),
                field("2", "Birthday", "date", "BIRTHDAY"),
            ],
            tags: vec![tag("1", "VIP"), tag("2", "Newsletter")],
            lists: vec![List {
                id: "1".to_string(),
                name: "Master Contact List".to_string(),
                stringid: "master-contact-list".to_string(),
            }],
        }
    }
}

impl Store {
    fn contact_index(&self, id: &str) -> Option<usize> {
        self.contacts.iter().position(|c| c.id == id)
    }

    fn contact_by_email(&self, email: &str) -> Option<usize> {
        self.contacts
            .iter()
            .position(|c| c.email.eq_ignore_ascii_case(email))
    }

    fn insert_contact(&mut self, email: String, input: &ContactInput) -> Contact {
        let mut contact = Contact {
            id: (self.contacts.len() + 1).to_string(),
            email,
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
        };
        apply(&mut contact, input);
        self.contacts.push(contact.clone());
        self.set_field_values(&contact.id, &input.field_values);
        contact
    }

    /// Upsert the values for known fields; unknown field ids are ignored.
    fn set_field_values(&mut self, contact: &str, values: &[FieldValueInput]) {
        for input in values {
            if !self.fields.iter().any(|f| f.id == input.field) {
                continue;
            }
            let existing = self
                .field_values
                .iter_mut()
                .find(|fv| fv.contact == contact && fv.field == input.field);
            match existing {
                Some(fv) => fv.value = input.value.clone(),
                None => {
                    let id = (self.field_values.len() + 1).to_string();
                    self.field_values.push(FieldValue {
                        id,
                        contact: contact.to_string(),
                        field: input.field.clone(),
                        value: input.value.clone(),
                    });
                }
            }
        }
    }

    fn values_of(&self, contact: &str) -> Vec<FieldValue> {
        self.field_values
            .iter()
            .filter(|fv| fv.contact == contact)
            .cloned()
            .collect()
    }
}

fn apply(contact: &mut Contact, input: &ContactInput) {
    if let Some(email) = &input.email {
        contact.email = email.clone();
    }
    if let Some(first_name) = &input.first_name {
        contact.first_name = first_name.clone();
    }
    if let Some(last_name) = &input.last_name {
        contact.last_name = last_name.clone();
    }
    if let Some(phone) = &input.phone {
        contact.phone = phone.clone();
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub api_token: Arc<str>,
    pub db: Db,
}

type Reply = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with_token(DEFAULT_API_TOKEN)
}

pub fn app_with_token(api_token: &str) -> Router {
    let state = AppState {
        api_token: Arc::from(api_token),
        db: Arc::new(RwLock::new(Store::default())),
    };
    let api = Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/{id}", get(get_contact).put(update_contact))
        .route("/contacts/{id}/fieldValues", get(contact_field_values))
        .route("/contact/sync", post(sync_contact))
        .route("/contactTags", post(add_contact_tag))
        .route("/contactLists", post(add_contact_list))
        .route("/fields", get(list_fields))
        .route("/fieldValues", get(list_field_values))
        .route("/tags", get(list_tags))
        .route("/lists", get(list_lists))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state);
    Router::new().nest(API_PREFIX, api)
}

pub async fn run(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get("api-token")
        .and_then(|v| v.to_str().ok());
    if token != Some(&*state.api_token) {
        return (StatusCode::FORBIDDEN, Json(json!({"message": "Forbidden"}))).into_response();
    }
    next.run(request).await
}

fn unprocessable(code: &str, title: &str) -> Reply {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"errors": [{"title": title, "detail": "", "code": code}]})),
    )
}

fn contact_not_found(id: &str) -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": format!("No Result found for Subscriber with id {id}")})),
    )
}

async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let store = state.db.read().await;
    let contacts: Vec<&Contact> = store
        .contacts
        .iter()
        .filter(|c| query.get("email").map_or(true, |e| c.email.eq_ignore_ascii_case(e)))
        .collect();
    let total = contacts.len().to_string();
    (
        StatusCode::OK,
        Json(json!({"contacts": contacts, "meta": {"total": total}})),
    )
}

async fn create_contact(State(state): State<AppState>, Json(input): Json<ContactEnvelope>) -> Reply {
    let input = input.contact;
    let Some(email) = input.email.clone().filter(|e| e.contains('@')) else {
        return unprocessable("email_invalid", "Contact Email Address is not valid.");
    };
    let mut store = state.db.write().await;
    if store.contact_by_email(&email).is_some() {
        return unprocessable("duplicate", "Email address already exists in the system.");
    }
    let contact = store.insert_contact(email, &input);
    let field_values = store.values_of(&contact.id);
    (
        StatusCode::CREATED,
        Json(json!({"contact": contact, "fieldValues": field_values})),
    )
}

async fn sync_contact(State(state): State<AppState>, Json(input): Json<ContactEnvelope>) -> Reply {
    let input = input.contact;
    let Some(email) = input.email.clone().filter(|e| e.contains('@')) else {
        return unprocessable("email_invalid", "Contact Email Address is not valid.");
    };
    let mut store = state.db.write().await;
    let (status, contact) = match store.contact_by_email(&email) {
        Some(index) => {
            apply(&mut store.contacts[index], &input);
            let contact = store.contacts[index].clone();
            store.set_field_values(&contact.id, &input.field_values);
            (StatusCode::OK, contact)
        }
        None => (StatusCode::CREATED, store.insert_contact(email, &input)),
    };
    let field_values = store.values_of(&contact.id);
    (status, Json(json!({"contact": contact, "fieldValues": field_values})))
}

async fn get_contact(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let store = state.db.read().await;
    match store.contact_index(&id) {
        Some(index) => (StatusCode::OK, Json(json!({"contact": store.contacts[index]}))),
        None => contact_not_found(&id),
    }
}

async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ContactEnvelope>,
) -> Reply {
    let input = input.contact;
    let mut store = state.db.write().await;
    let Some(index) = store.contact_index(&id) else {
        return contact_not_found(&id);
    };
    apply(&mut store.contacts[index], &input);
    store.set_field_values(&id, &input.field_values);
    let contact = store.contacts[index].clone();
    let field_values = store.values_of(&id);
    (
        StatusCode::OK,
        Json(json!({"contact": contact, "fieldValues": field_values})),
    )
}

async fn contact_field_values(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let store = state.db.read().await;
    if store.contact_index(&id).is_none() {
        return contact_not_found(&id);
    }
    (StatusCode::OK, Json(json!({"fieldValues": store.values_of(&id)})))
}

async fn add_contact_tag(State(state): State<AppState>, Json(input): Json<ContactTagEnvelope>) -> Reply {
    let input = input.contact_tag;
    let mut store = state.db.write().await;
    if store.contact_index(&input.contact).is_none() {
        return unprocessable("related_missing", "The related contact does not exist.");
    }
    if !store.tags.iter().any(|t| t.id == input.tag) {
        return unprocessable("related_missing", "The related tag does not exist.");
    }
    let contact_tag = ContactTag {
        id: (store.contact_tags.len() + 1).to_string(),
        contact: input.contact,
        tag: input.tag,
    };
    store.contact_tags.push(contact_tag.clone());
    (StatusCode::CREATED, Json(json!({"contactTag": contact_tag})))
}

async fn add_contact_list(State(state): State<AppState>, Json(input): Json<ContactListEnvelope>) -> Reply {
    let input = input.contact_list;
    let mut store = state.db.write().await;
    if store.contact_index(&input.contact).is_none() {
        return unprocessable("related_missing", "The related contact does not exist.");
    }
    if !store.lists.iter().any(|l| l.id == input.list) {
        return unprocessable("related_missing", "The related list does not exist.");
    }
    let existing = store
        .contact_lists
        .iter_mut()
        .find(|cl| cl.contact == input.contact && cl.list == input.list);
    let contact_list = match existing {
        Some(cl) => {
            cl.status = input.status;
            cl.clone()
        }
        None => {
            let contact_list = ContactList {
                id: (store.contact_lists.len() + 1).to_string(),
                contact: input.contact,
                list: input.list,
                status: input.status,
            };
            store.contact_lists.push(contact_list.clone());
            contact_list
        }
    };
    (StatusCode::OK, Json(json!({"contactList": contact_list})))
}

async fn list_fields(State(state): State<AppState>) -> Reply {
    let store = state.db.read().await;
    (StatusCode::OK, Json(json!({"fields": store.fields})))
}

async fn list_field_values(State(state): State<AppState>) -> Reply {
    let store = state.db.read().await;
    (StatusCode::OK, Json(json!({"fieldValues": store.field_values})))
}

async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let store = state.db.read().await;
    let tags: Vec<&Tag> = store
        .tags
        .iter()
        .filter(|t| query.get("search").map_or(true, |s| t.tag.contains(s.as_str())))
        .collect();
    (StatusCode::OK, Json(json!({"tags": tags})))
}

async fn list_lists(State(state): State<AppState>) -> Reply {
    let store = state.db.read().await;
    (StatusCode::OK, Json(json!({"lists": store.lists})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_serializes_with_camel_case() {
        let contact = Contact {
            id: "1".to_string(),
            email: "a@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: String::new(),
            phone: String::new(),
        };
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["id"], "1");
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        let input: ContactTagInput = serde_json::from_str(r#"{"contact":3,"tag":"1"}"#).unwrap();
        assert_eq!(input.contact, "3");
        assert_eq!(input.tag, "1");
    }

    #[test]
    fn ids_reject_other_types() {
        let result: Result<ContactTagInput, _> = serde_json::from_str(r#"{"contact":true,"tag":"1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn contact_list_status_defaults_to_subscribed() {
        let input: ContactListInput = serde_json::from_str(r#"{"contact":"1","list":"1"}"#).unwrap();
        assert_eq!(input.status, 1);
    }

    #[test]
    fn contact_input_all_fields_optional() {
        let input: ContactInput = serde_json::from_str("{}").unwrap();
        assert!(input.email.is_none());
        assert!(input.field_values.is_empty());
    }

    #[test]
    fn field_values_upsert_and_skip_unknown_fields() {
        let mut store = Store::default();
        let contact = store.insert_contact("a@example.com".to_string(), &ContactInput::default());
        let values = |field: &str, value: &str| FieldValueInput {
            field: field.to_string(),
            value: value.to_string(),
        };
        store.set_field_values(&contact.id, &[values("1", "Acme"), values("99", "x")]);
        store.set_field_values(&contact.id, &[values("1", "Globex")]);

        let stored = store.values_of(&contact.id);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value, "Globex");
    }
}
