use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::OnceLock;
use tower::ServiceExt;

use skyguard::config::Config;
use skyguard::db::migrator::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};

const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
const TEST_DATA_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

static KEY_PATH: OnceLock<PathBuf> = OnceLock::new();

fn test_key_path() -> PathBuf {
    KEY_PATH
        .get_or_init(|| {
            use aes_gcm::aead::OsRng;

            let path = std::env::temp_dir().join(format!(
                "skyguard-workflow-test-key-{}.pem",
                std::process::id()
            ));
            let key = rsa::RsaPrivateKey::new(&mut OsRng, 1024).expect("keygen");
            skyguard::crypto::envelope::write_private_key_pem(&key, &path).expect("write key");
            path
        })
        .clone()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// App plus one token per role and a seeded event type and department.
struct Fixture {
    app: Router,
    state: std::sync::Arc<skyguard::api::AppState>,
    admin: String,
    leadership: String,
    dispatch: String,
    head: String,
    officer: String,
    event_type_id: i32,
    department_id: i32,
}

async fn fixture() -> Fixture {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.security.session_secret = TEST_SECRET.to_string();
    config.security.data_key_hex = TEST_DATA_KEY.to_string();
    config.security.private_key_path = test_key_path().to_string_lossy().into_owned();

    let state = skyguard::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let app = skyguard::api::router(state.clone()).await;

    let admin = token_for(&app, DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD).await;

    for (username, role_level) in [
        ("chief", 0),
        ("dispatch", 1),
        ("head", 2),
        ("officer", 3),
    ] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({
                "username": username,
                "password": format!("{username}-password"),
                "role_level": role_level,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "seed user failed: {body}");
    }

    let leadership = token_for(&app, "chief", "chief-password").await;
    let dispatch = token_for(&app, "dispatch", "dispatch-password").await;
    let head = token_for(&app, "head", "head-password").await;
    let officer = token_for(&app, "officer", "officer-password").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/event-types",
        Some(&admin),
        Some(json!({"name": "bird_strike", "description": "Bird strike on approach"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "seed event type failed: {body}");
    let event_type_id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/departments",
        Some(&admin),
        Some(json!({"name": "Airfield Operations"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "seed department failed: {body}");
    let department_id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();

    Fixture {
        app,
        state,
        admin,
        leadership,
        dispatch,
        head,
        officer,
        event_type_id,
        department_id,
    }
}

async fn token_for(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed for {username}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn create_incident(fx: &Fixture, token: &str, description: &str) -> i32 {
    let (status, body) = send(
        &fx.app,
        "POST",
        "/api/incidents",
        Some(token),
        Some(json!({
            "description": description,
            "severity": 2,
            "is_aviation": true,
            "event_type_id": fx.event_type_id,
            "department_ids": [fx.department_id],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    assert_eq!(body["data"]["status"], "draft");
    i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap()
}

async fn transition(
    fx: &Fixture,
    token: &str,
    id: i32,
    action: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send(
        &fx.app,
        "POST",
        &format!("/api/incidents/{id}/{action}"),
        Some(token),
        body,
    )
    .await
}

#[tokio::test]
async fn full_lifecycle_happy_path() {
    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "engine fire on stand 42").await;

    let (status, body) = transition(&fx, &fx.officer, id, "submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "submitted_department_review");

    let (status, body) = transition(&fx, &fx.head, id, "department-approve", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "department_approved");

    let (status, body) = transition(&fx, &fx.head, id, "submit-command-center", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending_command_center");

    let (status, body) = transition(
        &fx,
        &fx.dispatch,
        id,
        "command-center-resolve",
        Some(json!({"resolution": "Fire crew dispatched, stand closed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "command_center_processed");
    assert_eq!(
        body["data"]["resolution"],
        "Fire crew dispatched, stand closed"
    );

    let (status, body) = transition(&fx, &fx.dispatch, id, "issue-emergency-team", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "issued_emergency_team");

    let (status, body) = transition(&fx, &fx.dispatch, id, "resolve", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "resolved");
    assert!(body["data"]["resolved_at"].is_string());
    assert!(body["data"]["closed_at"].is_null());

    let (status, body) = transition(&fx, &fx.leadership, id, "close", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "closed");
    assert!(body["data"]["closed_at"].is_string());

    // Closed is terminal
    let (status, _) = transition(&fx, &fx.admin, id, "resolve", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn description_is_stored_encrypted_but_served_decrypted() {
    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "fuel spill near taxiway B").await;

    let (status, body) = send(
        &fx.app,
        "GET",
        &format!("/api/incidents/{id}"),
        Some(&fx.officer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "fuel spill near taxiway B");
    assert_eq!(
        body["data"]["departments"][0]["name"],
        "Airfield Operations"
    );
}

#[tokio::test]
async fn markup_is_sanitized_on_create_and_resolution() {
    let fx = fixture().await;
    let id = create_incident(
        &fx,
        &fx.officer,
        "<script>alert('xss')</script><b>smoke</b> in terminal",
    )
    .await;

    let (_, body) = send(
        &fx.app,
        "GET",
        &format!("/api/incidents/{id}"),
        Some(&fx.officer),
        None,
    )
    .await;
    assert_eq!(body["data"]["description"], "<b>smoke</b> in terminal");

    transition(&fx, &fx.officer, id, "submit", None).await;
    transition(&fx, &fx.head, id, "department-approve", None).await;
    transition(&fx, &fx.head, id, "submit-command-center", None).await;

    let (status, body) = transition(
        &fx,
        &fx.dispatch,
        id,
        "command-center-resolve",
        Some(json!({"resolution": "<img src=x onerror=alert(1)>ventilation restored"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resolution"], "ventilation restored");
}

#[tokio::test]
async fn only_the_submitter_may_submit_a_draft() {
    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "runway light outage").await;

    let (status, _) = transition(&fx, &fx.head, id, "submit", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin override applies to every transition
    let (status, body) = transition(&fx, &fx.admin, id, "submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "submitted_department_review");
}

#[tokio::test]
async fn rejection_requires_a_reason() {
    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "perimeter fence damage").await;
    transition(&fx, &fx.officer, id, "submit", None).await;

    let (status, _) = transition(&fx, &fx.head, id, "department-reject", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = transition(
        &fx,
        &fx.head,
        id,
        "department-reject",
        Some(json!({"reason": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = transition(
        &fx,
        &fx.head,
        id,
        "department-reject",
        Some(json!({"reason": "location missing from report"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "department_rejected");
    assert_eq!(
        body["data"]["rejection_reason"],
        "location missing from report"
    );
}

#[tokio::test]
async fn empty_resolution_is_rejected() {
    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "bird strike report").await;
    transition(&fx, &fx.officer, id, "submit", None).await;
    transition(&fx, &fx.head, id, "department-approve", None).await;
    transition(&fx, &fx.head, id, "submit-command-center", None).await;

    let (status, _) = transition(&fx, &fx.dispatch, id, "command-center-resolve", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = transition(
        &fx,
        &fx.dispatch,
        id,
        "command-center-resolve",
        Some(json!({"resolution": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resubmission_keeps_the_rejection_verdict_and_takes_edits() {
    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "initial report").await;
    transition(&fx, &fx.officer, id, "submit", None).await;
    transition(
        &fx,
        &fx.head,
        id,
        "department-reject",
        Some(json!({"reason": "too vague"})),
    )
    .await;

    let (status, body) = transition(
        &fx,
        &fx.officer,
        id,
        "resubmit",
        Some(json!({"description": "expanded report with location and time"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "submitted_department_review");
    // The verdict history survives the resubmission
    assert_eq!(body["data"]["rejection_reason"], "too vague");
    assert_eq!(
        body["data"]["description"],
        "expanded report with location and time"
    );
}

#[tokio::test]
async fn wrong_source_state_is_a_conflict_even_for_admin() {
    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "still a draft").await;

    let (status, _) = transition(&fx, &fx.admin, id, "department-approve", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = transition(&fx, &fx.admin, id, "close", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn role_gates_hold_at_each_stage() {
    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "gate check incident").await;
    transition(&fx, &fx.officer, id, "submit", None).await;

    // Review belongs to the department head
    for token in [&fx.officer, &fx.dispatch] {
        let (status, _) = transition(&fx, token, id, "department-approve", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    transition(&fx, &fx.head, id, "department-approve", None).await;
    transition(&fx, &fx.head, id, "submit-command-center", None).await;

    // Resolution belongs to the command center
    let (status, _) = transition(
        &fx,
        &fx.head,
        id,
        "command-center-resolve",
        Some(json!({"resolution": "handled"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    transition(
        &fx,
        &fx.dispatch,
        id,
        "command-center-resolve",
        Some(json!({"resolution": "handled"})),
    )
    .await;
    transition(&fx, &fx.dispatch, id, "issue-emergency-team", None).await;
    transition(&fx, &fx.dispatch, id, "resolve", None).await;

    // Closing is reserved for leadership and admin
    for token in [&fx.officer, &fx.head, &fx.dispatch] {
        let (status, _) = transition(&fx, token, id, "close", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, _) = transition(&fx, &fx.leadership, id, "close", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn a_transition_cannot_be_applied_twice() {
    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "double approval check").await;
    transition(&fx, &fx.officer, id, "submit", None).await;

    let (status, _) = transition(&fx, &fx.head, id, "department-approve", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = transition(&fx, &fx.head, id, "department-approve", None).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[tokio::test]
async fn concurrent_approvals_race_to_a_single_winner() {
    use skyguard::db::TransitionUpdate;
    use skyguard::entities::incidents::IncidentStatus;

    let fx = fixture().await;
    let id = create_incident(&fx, &fx.officer, "simultaneous review attempt").await;
    transition(&fx, &fx.officer, id, "submit", None).await;

    let store = fx.state.store().clone();

    // A stale source state never matches the conditional write, and the
    // record is left untouched.
    let stale = store
        .apply_incident_transition(
            id,
            IncidentStatus::Draft,
            IncidentStatus::DepartmentApproved,
            TransitionUpdate::default(),
        )
        .await
        .unwrap();
    assert!(!stale);
    let record = store.get_incident(id).await.unwrap().unwrap();
    assert_eq!(record.status, IncidentStatus::SubmittedDepartmentReview);

    // Two writers from the same source state: exactly one wins
    let (first, second) = tokio::join!(
        store.apply_incident_transition(
            id,
            IncidentStatus::SubmittedDepartmentReview,
            IncidentStatus::DepartmentApproved,
            TransitionUpdate::default(),
        ),
        store.apply_incident_transition(
            id,
            IncidentStatus::SubmittedDepartmentReview,
            IncidentStatus::DepartmentApproved,
            TransitionUpdate::default(),
        ),
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert!(first ^ second, "exactly one writer may win the race");

    let record = store.get_incident(id).await.unwrap().unwrap();
    assert_eq!(record.status, IncidentStatus::DepartmentApproved);

    // The losing side surfaces as a conflict at the boundary
    let (status, _) = transition(&fx, &fx.head, id, "department-approve", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn creation_validates_references_and_description() {
    let fx = fixture().await;

    let (status, _) = send(
        &fx.app,
        "POST",
        "/api/incidents",
        Some(&fx.officer),
        Some(json!({
            "description": "   ",
            "severity": 1,
            "event_type_id": fx.event_type_id,
            "department_ids": [fx.department_id],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &fx.app,
        "POST",
        "/api/incidents",
        Some(&fx.officer),
        Some(json!({
            "description": "valid text",
            "severity": 1,
            "event_type_id": 9999,
            "department_ids": [fx.department_id],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &fx.app,
        "POST",
        "/api/incidents",
        Some(&fx.officer),
        Some(json!({
            "description": "valid text",
            "severity": 1,
            "event_type_id": fx.event_type_id,
            "department_ids": [9999],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &fx.app,
        "POST",
        &format!("/api/incidents/{}/submit", 4242),
        Some(&fx.officer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reference_data_creation_is_admin_tier() {
    let fx = fixture().await;

    let (status, _) = send(
        &fx.app,
        "POST",
        "/api/departments",
        Some(&fx.officer),
        Some(json!({"name": "Rogue Department"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &fx.app,
        "POST",
        "/api/departments",
        Some(&fx.leadership),
        Some(json!({"name": "Fire Service"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Duplicate names conflict
    let (status, _) = send(
        &fx.app,
        "POST",
        "/api/departments",
        Some(&fx.admin),
        Some(json!({"name": "Fire Service"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Everyone authenticated can list
    let (status, body) = send(&fx.app, "GET", "/api/event-types", Some(&fx.officer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "bird_strike");
}
