//! Client behaviour against a mock backend
//!
//! Each test starts an axum server on an ephemeral port and points an
//! in-memory `AppContext` at it.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crewdesk::api::ApiError;
use crewdesk::recurrence::{
    create_series, expand, Cadence, DayOfWeek, EndCondition, EventTemplate, PreviewRequest, PreviewState,
    RecurrencePattern, RecurrenceType,
};
use crewdesk::router::{Screen, View};
use crewdesk::storage::{keys, KeyValueStore, MemoryStore, StorageError, StorageResult};
use crewdesk::views::send_bulk;
use crewdesk::{AppContext, Config, Organization, Session, User, ViewData};

const TOKEN: &str = "tok-1";

#[derive(Debug, Clone)]
struct Hit {
    path: String,
    bearer: Option<String>,
    body: Value,
}

#[derive(Default)]
struct Mock {
    hits: Mutex<Vec<Hit>>,
    /// Every authenticated route answers 401 when set
    reject_token: Mutex<bool>,
}

type Shared = Arc<Mock>;

impl Mock {
    fn record(&self, path: &str, headers: &HeaderMap, body: Value) {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        self.hits.lock().unwrap().push(Hit {
            path: path.to_string(),
            bearer,
            body,
        });
    }

    fn hits(&self, path: &str) -> Vec<Hit> {
        self.hits.lock().unwrap().iter().filter(|h| h.path == path).cloned().collect()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        !*self.reject_token.lock().unwrap()
            && headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer tok-1")
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid token" }))).into_response()
}

fn auth_body() -> Value {
    json!({
        "token": TOKEN,
        "user": { "id": 7, "email": "coord@example.org", "name": "Coord", "roles": ["admin"] },
        "organization": { "id": 3, "name": "Food Bank" }
    })
}

async fn login(State(mock): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("/api/auth/login", &headers, body.clone());
    if body["password"] == "secret" {
        Json(auth_body()).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Wrong e-mail or password" }))).into_response()
    }
}

async fn logout(State(mock): State<Shared>, headers: HeaderMap) -> Response {
    mock.record("/api/auth/logout", &headers, Value::Null);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

async fn people(State(mock): State<Shared>, headers: HeaderMap) -> Response {
    mock.record("/api/people", &headers, Value::Null);
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        { "id": 1, "name": "Ana", "email": "ana@example.org", "phone": "+15550101", "phone_verified": true },
        { "id": 2, "name": "Ben", "phone": "+15550202", "phone_verified": false }
    ]))
    .into_response()
}

async fn sms_recipients(State(mock): State<Shared>, headers: HeaderMap) -> Response {
    people(State(mock), headers).await
}

async fn broadcasts(State(mock): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("/api/sms/broadcasts", &headers, body.clone());
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    let count = body["recipient_ids"].as_array().map(Vec::len).unwrap_or(0);
    (StatusCode::CREATED, Json(json!({ "id": 40, "recipient_count": count, "status": "queued" }))).into_response()
}

async fn invitations(State(mock): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("/api/invitations", &headers, body.clone());
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if email.starts_with("taken") {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": "Already a member" }))).into_response();
    }
    let id = mock.hits("/api/invitations").len() as i64;
    (StatusCode::CREATED, Json(json!({ "id": id, "email": email, "status": "pending" }))).into_response()
}

async fn validate_invitation(
    State(mock): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    mock.record("/api/invitations/validate", &headers, json!(query));
    match query.get("token").map(String::as_str) {
        Some("abc") => Json(json!({ "valid": true, "email": "new@example.org", "org_name": "Food Bank" })).into_response(),
        _ => Json(json!({ "valid": false })).into_response(),
    }
}

async fn preview(State(mock): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("/api/recurring-series/preview", &headers, body);
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "occurrences": [
            { "sequence": 1, "start_time": "2026-03-02T09:00:00Z" },
            { "sequence": 2, "start_time": "2026-03-09T09:00:00Z", "is_holiday_conflict": true, "holiday_label": "Spring break" }
        ],
        "total_count": 12
    }))
    .into_response()
}

async fn create_event(State(mock): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("/api/events", &headers, body.clone());
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    let n = mock.hits("/api/events").len() as i64;
    if n == 2 {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Database busy" }))).into_response();
    }
    let mut event = body;
    event["id"] = json!(100 + n);
    (StatusCode::CREATED, Json(event)).into_response()
}

async fn locale(State(mock): State<Shared>, headers: HeaderMap, Path((lang, file)): Path<(String, String)>) -> Response {
    let path = format!("/locales/{}/{}", lang, file);
    mock.record(&path, &headers, Value::Null);
    match (lang.as_str(), file.as_str()) {
        ("en", "common.json") => Json(json!({
            "nav": { "people": "People", "schedule": "Schedule" },
            "greeting": "Hello, {{name}}"
        }))
        .into_response(),
        ("es", "common.json") => Json(json!({ "nav": { "people": "Personas" } })).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn onboarding_progress(State(mock): State<Shared>, headers: HeaderMap) -> Response {
    mock.record("/api/onboarding/progress", &headers, Value::Null);
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::NOT_FOUND, Json(json!({ "error": "No onboarding progress" }))).into_response()
}

async fn spawn() -> (Shared, String) {
    let mock: Shared = Arc::new(Mock::default());
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/people", get(people))
        .route("/api/sms/recipients", get(sms_recipients))
        .route("/api/sms/broadcasts", post(broadcasts))
        .route("/api/invitations", post(invitations))
        .route("/api/invitations/validate", get(validate_invitation))
        .route("/api/recurring-series/preview", post(preview))
        .route("/api/events", post(create_event))
        .route("/api/onboarding/progress", get(onboarding_progress))
        .route("/locales/:lang/:file", get(locale))
        .with_state(mock.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (mock, format!("http://{}", addr))
}

fn context(base_url: &str) -> AppContext {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    AppContext::in_memory(config).unwrap()
}

fn coordinator() -> Session {
    Session {
        user: User {
            id: 7,
            email: "coord@example.org".to_string(),
            name: None,
            roles: vec!["admin".to_string()],
        },
        org: Organization {
            id: 3,
            name: "Food Bank".to_string(),
            timezone: None,
        },
        auth_token: TOKEN.to_string(),
    }
}

fn logged_in(base_url: &str) -> AppContext {
    let ctx = context(base_url);
    ctx.session.login(coordinator()).unwrap();
    ctx
}

/// Store that accepts writes but cannot delete anything
struct UndeletableStore(MemoryStore);

impl KeyValueStore for UndeletableStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.0.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.0.set_item(key, value)
    }

    fn remove_item(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.0.keys()
    }
}

// ============================================
// Session
// ============================================

#[tokio::test]
async fn test_login_stores_session_and_sends_bearer() {
    let (mock, url) = spawn().await;
    let ctx = context(&url);

    let session = ctx.api.login("coord@example.org", "secret").await.unwrap();
    assert_eq!(session.org.name, "Food Bank");
    assert_eq!(ctx.store.get_item(keys::AUTH_TOKEN).unwrap().as_deref(), Some(TOKEN));
    assert!(ctx.store.get_item(keys::CURRENT_USER).unwrap().is_some());
    assert!(ctx.store.get_item(keys::CURRENT_ORG).unwrap().is_some());

    let people = ctx.api.list_people().await.unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(mock.hits("/api/people")[0].bearer.as_deref(), Some(TOKEN));
    assert_eq!(mock.hits("/api/auth/login")[0].bearer, None);
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);
    *mock.reject_token.lock().unwrap() = true;

    let err = ctx.api.list_people().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { ref redirect } if redirect == "/login"));
    assert!(!ctx.session.is_loaded());
    for key in keys::SESSION_KEYS {
        assert_eq!(ctx.store.get_item(key).unwrap(), None, "{} should be cleared", key);
    }
}

#[tokio::test]
async fn test_unauthorized_when_store_cannot_clear() {
    let (mock, url) = spawn().await;
    let mut config = Config::default();
    config.api.base_url = url;
    let ctx = AppContext::with_store(config, Arc::new(UndeletableStore(MemoryStore::new()))).unwrap();
    ctx.session.login(coordinator()).unwrap();
    *mock.reject_token.lock().unwrap() = true;

    let err = ctx.api.list_people().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { ref redirect } if redirect == "/login"));
    assert!(!ctx.session.is_loaded());

    // The dead token is not sent again
    let _ = ctx.api.list_people().await;
    assert_eq!(mock.hits("/api/people")[1].bearer, None);
}

#[tokio::test]
async fn test_failed_login_is_a_plain_error() {
    let (_mock, url) = spawn().await;
    let ctx = logged_in(&url);

    let err = ctx.api.login("coord@example.org", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Wrong e-mail or password");
    assert!(ctx.session.is_loaded());
}

#[tokio::test]
async fn test_logout_clears_session_when_backend_fails() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);

    ctx.api.logout().await.unwrap();
    assert_eq!(mock.hits("/api/auth/logout").len(), 1);
    assert!(!ctx.session.is_loaded());
    assert_eq!(ctx.store.get_item(keys::AUTH_TOKEN).unwrap(), None);
}

// ============================================
// Router
// ============================================

#[tokio::test]
async fn test_router_loads_view_from_backend() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);
    let (mut router, loader) = ctx.router();

    let state = router.navigate("/app/people").await;
    assert_eq!(state.screen, Screen::App);
    assert_eq!(state.view, Some(View::People));
    assert_eq!(mock.hits("/api/people").len(), 1);
    match loader.data(View::People) {
        Some(ViewData::People(people)) => assert_eq!(people.len(), 2),
        other => panic!("unexpected view data: {:?}", other),
    }
}

#[tokio::test]
async fn test_router_expired_session_returns_to_login() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);
    *mock.reject_token.lock().unwrap() = true;
    let (mut router, _loader) = ctx.router();

    let state = router.navigate("/app/people").await;
    assert_eq!(state.screen, Screen::Login);
    assert_eq!(state.path, "/login");
    assert!(!ctx.session.is_loaded());
}

#[tokio::test]
async fn test_onboarding_view_without_progress_starts_fresh() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);
    let (mut router, loader) = ctx.router();

    let state = router.navigate("/app/onboarding").await;
    assert_eq!(state.view, Some(View::Onboarding));
    assert_eq!(mock.hits("/api/onboarding/progress").len(), 1);
    assert!(ctx.toasts.is_empty());
    assert_eq!(
        loader.data(View::Onboarding),
        Some(ViewData::Onboarding(Default::default()))
    );
}

#[tokio::test]
async fn test_router_validates_invitation_token() {
    let (mock, url) = spawn().await;
    let ctx = context(&url);
    let (mut router, _loader) = ctx.router();

    let state = router.navigate("/accept-invitation?token=abc").await;
    assert_eq!(state.screen, Screen::AcceptInvitation);

    let state = router.navigate("/accept-invitation?token=stale").await;
    assert_eq!(state.screen, Screen::InvalidLink);
    assert_eq!(mock.hits("/api/invitations/validate").len(), 2);
}

// ============================================
// Recurring events
// ============================================

#[tokio::test]
async fn test_preview_posts_pattern_and_summarizes() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);

    let request = PreviewRequest {
        pattern: RecurrencePattern::new(RecurrenceType::Weekly, EndCondition::Count { occurrence_count: 12 })
            .day(DayOfWeek::Monday),
        start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        duration_minutes: 120,
    };

    let controller = ctx.preview_controller();
    assert!(controller.refresh_now(&request).await);

    match controller.state() {
        PreviewState::Ready(summary) => {
            assert_eq!(summary.total, 12);
            assert_eq!(summary.occurrences.len(), 2);
            assert_eq!(summary.holiday_conflicts, 1);
            assert_eq!(summary.remaining(), 10);
        }
        other => panic!("unexpected state: {:?}", other),
    }

    let body = &mock.hits("/api/recurring-series/preview")[0].body;
    assert_eq!(body["pattern"]["type"], "weekly");
    assert_eq!(body["pattern"]["selected_days"], json!(["monday"]));
    assert_eq!(body["pattern"]["end_condition"], "count");
    assert_eq!(body["pattern"]["occurrence_count"], 12);
    assert_eq!(body["duration_minutes"], 120);
}

#[tokio::test]
async fn test_invalid_pattern_sends_nothing() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);

    let request = PreviewRequest {
        pattern: RecurrencePattern::new(RecurrenceType::Custom, EndCondition::Indefinite),
        start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        duration_minutes: 60,
    };

    let controller = ctx.preview_controller();
    assert!(!controller.refresh_now(&request).await);
    assert!(matches!(controller.state(), PreviewState::Invalid(_)));
    assert!(mock.hits("/api/recurring-series/preview").is_empty());
}

#[tokio::test]
async fn test_client_series_skips_failed_occurrence() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);

    let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    let windows = expand(start, Duration::hours(2), Cadence::Weekly, Some(start + Duration::days(14)));
    assert_eq!(windows.len(), 3);

    let template = EventTemplate {
        title: "Food sort".to_string(),
        ..Default::default()
    };
    let outcome = create_series(&ctx.api, &template, &windows).await;

    assert_eq!(outcome.created_count(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, 1);
    assert!(!outcome.aborted);
    assert_eq!(outcome.summary(), "Created 2 of 3 events");

    let sent = mock.hits("/api/events");
    assert_eq!(sent[2].body["start_time"], "2026-03-16T09:00:00Z");
    assert_eq!(sent[2].body["end_time"], "2026-03-16T11:00:00Z");
}

// ============================================
// Messaging
// ============================================

#[tokio::test]
async fn test_broadcast_sends_to_eligible_selection() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);

    let mut composer = ctx.broadcast_composer();
    composer.load(&ctx.api).await.unwrap();
    composer.select_all_eligible();
    composer.set_message("Shift tomorrow at 9");
    assert_eq!(composer.send_button().label, "Send to 1 recipient");

    let result = composer.send(&ctx.api).await.unwrap();
    assert_eq!(result.recipient_count, 1);

    let body = &mock.hits("/api/sms/broadcasts")[0].body;
    assert_eq!(body["recipient_ids"], json!([1]));
    assert_eq!(body["message"], "Shift tomorrow at 9");
    assert_eq!(composer.selected_count(), 0);
    assert_eq!(composer.message(), "");
}

#[tokio::test]
async fn test_bulk_invite_collects_failures() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);

    let addresses = vec![
        "a@example.org".to_string(),
        "taken@example.org".to_string(),
        "b@example.org".to_string(),
    ];
    let report = send_bulk(&ctx.api, &addresses, Some("volunteer")).await;

    assert_eq!(report.sent.len(), 2);
    assert_eq!(
        report.failed,
        vec![("taken@example.org".to_string(), "Already a member".to_string())]
    );
    assert!(!report.aborted);
    assert_eq!(report.summary(), "Sent 2 of 3 invitations");
    assert_eq!(mock.hits("/api/invitations")[0].body["role"], "volunteer");
}

#[tokio::test]
async fn test_bulk_invite_stops_when_session_expires() {
    let (mock, url) = spawn().await;
    let ctx = logged_in(&url);
    *mock.reject_token.lock().unwrap() = true;

    let addresses = vec!["a@example.org".to_string(), "b@example.org".to_string()];
    let report = send_bulk(&ctx.api, &addresses, None).await;

    assert!(report.aborted);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(mock.hits("/api/invitations").len(), 1);
}

// ============================================
// Locales
// ============================================

#[tokio::test]
async fn test_locale_catalogs_with_fallback() {
    let (mock, url) = spawn().await;
    let ctx = context(&url);

    let mut i18n = ctx.i18n();
    i18n.init().await.unwrap();
    assert_eq!(i18n.t("nav.people"), "People");

    i18n.set_locale("es").await.unwrap();
    assert_eq!(i18n.t("nav.people"), "Personas");
    assert_eq!(i18n.t("common:nav.schedule"), "Schedule");
    assert_eq!(i18n.t_with("greeting", &[("name", "Ana")]), "Hello, Ana");
    assert_eq!(i18n.t("signup:title"), "signup:title");

    assert_eq!(ctx.store.get_item(keys::SIGNUP_LOCALE).unwrap().as_deref(), Some("es"));
    assert_eq!(mock.hits("/locales/en/common.json").len(), 1);
    assert_eq!(mock.hits("/locales/es/signup.json").len(), 1);
}
