//! Drives every client operation against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port, then talks to it
//! over real HTTP through `UreqTransport`, so request shaping (paths, query
//! strings, JSON bodies, the `Api-Token` header) is checked end-to-end.

use std::sync::Arc;

use activecampaign_core::{
    ActiveCampaign, ApiError, Config, ContactInput, ContactListInput, ContactTagInput, FieldValue,
    HttpMethod, LastRequest,
};
use serde_json::json;

const TOKEN: &str = mock_server::DEFAULT_API_TOKEN;

/// Start a mock server in a background thread and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, mock_server::app()).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn config(base_url: &str) -> Arc<Config> {
    Arc::new(
        Config::new(base_url, Some(TOKEN))
            .with_dictionary("fields", [("Company", 1), ("Birthday", 2)])
            .with_dictionary("tags", [("VIP", 1), ("Newsletter", 2)])
            .with_dictionary("lists", [("Master", 1)]),
    )
}

#[test]
fn contact_lifecycle() {
    let config = config(&start_server());
    let mut client = ActiveCampaign::connect(config.clone(), None).unwrap();

    // Step 1: nothing matches yet.
    let found = client.get_contacts_by(&json!({"email": "ada@example.com"})).unwrap();
    assert!(found["contacts"].as_array().unwrap().is_empty());

    // Step 2: first-or-create creates.
    let input = ContactInput {
        first_name: Some("Ada".to_string()),
        field_values: vec![FieldValue::labeled(&config, "Company", "Acme").unwrap()],
        ..ContactInput::with_email("ada@example.com")
    };
    let created = client.first_or_create_contact("ada@example.com", &input).unwrap();
    assert_eq!(created["contact"]["email"], "ada@example.com");
    assert_eq!(created["fieldValues"][0]["value"], "Acme");
    let id = created["contact"]["id"].as_str().unwrap().to_string();
    assert_eq!(
        client.last_request(),
        Some(&LastRequest {
            method: HttpMethod::Post,
            url: "/api/3/contacts".to_string(),
        })
    );

    // Step 3: first-or-create finds it the second time.
    let existing = client.first_or_create_contact("ada@example.com", &input).unwrap();
    assert_eq!(existing, json!({"contact": created["contact"].clone()}));
    assert_eq!(client.last_request().unwrap().method, HttpMethod::Get);

    // Step 4: fetch by id.
    let fetched = client.get_contact(&id).unwrap();
    assert_eq!(fetched["contact"]["firstName"], "Ada");

    // Step 5: update.
    let update = ContactInput {
        last_name: Some("Lovelace".to_string()),
        ..ContactInput::default()
    };
    let updated = client.update_contact(&id, &update).unwrap();
    assert_eq!(updated["contact"]["firstName"], "Ada");
    assert_eq!(updated["contact"]["lastName"], "Lovelace");

    // Step 6: sync updates the same contact.
    let synced = client
        .create_or_update_contact(&json!({"email": "ada@example.com", "phone": "555-0100"}))
        .unwrap();
    assert_eq!(synced["contact"]["id"], id.as_str());
    assert_eq!(synced["contact"]["phone"], "555-0100");

    // Step 7: tag and subscribe using dictionary labels.
    let tag = ContactTagInput::labeled(&config, &id, "VIP").unwrap();
    let tagged = client.add_tag_to_contact(&tag).unwrap();
    assert_eq!(tagged["contactTag"]["tag"], "1");
    let subscription = ContactListInput::labeled(&config, "Master", &id).unwrap();
    assert!(client.try_add_contact_to_list(&subscription));

    // Step 8: field values.
    let values = client.get_contact_field_values(&id, &()).unwrap();
    assert_eq!(values["fieldValues"][0]["field"], "1");
    let all = client.get_all_custom_fields(&()).unwrap();
    assert_eq!(all["fieldValues"].as_array().unwrap().len(), 1);
}

#[test]
fn catalog_reads() {
    let mut client = ActiveCampaign::connect(config(&start_server()), None).unwrap();

    let fields = client.get_all_fields(&()).unwrap();
    assert_eq!(fields["fields"].as_array().unwrap().len(), 2);

    let tags = client.get_all_tags(&json!({"search": "News"})).unwrap();
    let tags = tags["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["tag"], "Newsletter");

    let lists = client.get_all_lists(&json!({})).unwrap();
    assert_eq!(lists["lists"][0]["id"], "1");
}

#[test]
fn boolean_mode_reports_success_and_failure() {
    let mut client = ActiveCampaign::connect(config(&start_server()), None).unwrap();

    assert!(client.try_create_contact(&ContactInput::with_email("grace@example.com")));
    // duplicate email is rejected with 422
    assert!(!client.try_create_contact(&ContactInput::with_email("grace@example.com")));
    // missing email is rejected too, even though a body is sent
    assert!(!client.try_create_contact(&json!({})));

    assert!(client.try_first_or_create_contact("grace@example.com", &json!({})));
    assert!(client.try_first_or_create_contact(
        "linus@example.com",
        &ContactInput::with_email("linus@example.com")
    ));
    assert!(!client.try_update_contact(99, &json!({"firstName": "Nobody"})));
}

#[test]
fn decoding_mode_surfaces_http_errors() {
    let mut client = ActiveCampaign::connect(config(&start_server()), None).unwrap();

    let err = client.get_contact(99).unwrap_err();
    assert!(err.is_request_failed());
    match err {
        ApiError::HttpError { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("No Result found"));
        }
        other => panic!("expected HttpError, got {other:?}"),
    }

    let err = client
        .add_tag_to_contact(&json!({"contact": "99", "tag": "1"}))
        .unwrap_err();
    assert_eq!(err.status(), Some(422));
}

#[test]
fn instance_token_overrides_config_token() {
    let base_url = start_server();
    let config = Arc::new(Config::new(&base_url, Some("stale-token")));

    let mut shared = ActiveCampaign::connect(config.clone(), None).unwrap();
    let err = shared.get_all_tags(&()).unwrap_err();
    assert_eq!(err.status(), Some(403));

    let mut own = ActiveCampaign::connect(config, Some(TOKEN)).unwrap();
    assert!(own.get_all_tags(&()).is_ok());
}

#[test]
fn unreachable_server_is_a_transport_failure() {
    // bind then drop to get a port nothing listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let mut client = ActiveCampaign::connect(config(&format!("http://{addr}")), None).unwrap();

    assert!(!client.try_create_contact(&json!({})));
    let err = client.get_all_tags(&()).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.is_request_failed());
}

#[test]
fn construction_requires_configuration() {
    let no_token = Arc::new(Config::new("http://localhost:3000", None));
    assert!(matches!(
        ActiveCampaign::connect(no_token, None).unwrap_err(),
        ApiError::Configuration(_)
    ));

    let no_url = Arc::new(Config::new("", Some(TOKEN)));
    assert!(matches!(
        ActiveCampaign::connect(no_url, None).unwrap_err(),
        ApiError::Configuration(_)
    ));
}
