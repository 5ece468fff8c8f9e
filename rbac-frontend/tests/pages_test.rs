use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::Response,
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use http_body_util::BodyExt;
use rbac_core::config::ApiConfig;
use rbac_core::{ApiClient, RouteGuard};
use rbac_frontend::config::SessionSettings;
use rbac_frontend::startup::build_router;
use rbac_frontend::AppState;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FUTURE_EXP: i64 = 4_102_444_800;

fn token_with(payload: Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let body = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.test-signature")
}

fn token_for(role: &str) -> String {
    token_with(json!({
        "role": role,
        "email": format!("{}@example.com", role.to_lowercase()),
        "exp": FUTURE_EXP
    }))
}

/// Router wired to `server` with a fresh cookie-session store.
fn app_for(server: &MockServer) -> Router {
    let api = ApiClient::new(&ApiConfig::new(server.uri())).unwrap();
    let state = AppState::new(api, RouteGuard::default());
    build_router(state, &SessionSettings::default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    request
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// `name=value` of the session cookie set by `response`, if any.
fn session_cookie(response: &Response) -> Option<String> {
    let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    set_cookie.split(';').next().map(str::to_string)
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Log in through the form with `token` issued by the mock API and return
/// the visitor's session cookie.
async fn sign_in(app: &Router, server: &MockServer, token: &str) -> String {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": token,
            "expiresAtUtc": "2100-01-01T00:00:00Z"
        })))
        .mount(server)
        .await;

    let response = app
        .clone()
        .oneshot(post_form("/login", "email=someone%40example.com&password=pw"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response).expect("login sets a session cookie")
}

async fn mount_roster(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "u1", "email": "ada@example.com", "firstName": "Ada", "lastName": "Lovelace", "createdAt": "2024-01-01T09:30:00Z" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/u1/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["User"])))
        .mount(server)
        .await;
}

async fn roster_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/api/users"))
        .count()
}

#[tokio::test]
async fn health_check_works() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let response = app.clone().oneshot(get("/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("x-request-id").is_some());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me-1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-me-1");
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_login_with_next() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2F");
    assert!(session_cookie(&response).is_none());

    let response = app.oneshot(get("/protected-admin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fprotected-admin");
}

#[tokio::test]
async fn each_browser_has_its_own_session() {
    let server = MockServer::start().await;
    mount_roster(&server).await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("Admin")).await;

    let response = app
        .clone()
        .oneshot(with_cookie(get("/admin"), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Another browser without the cookie is still anonymous
    let response = app.oneshot(get("/admin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadmin");
}

#[tokio::test]
async fn cross_site_role_grant_is_rejected() {
    let server = MockServer::start().await;
    mount_roster(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/users/u1/roles/Admin"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("Admin")).await;

    let mut forged = with_cookie(post_form("/admin/users/u1/roles/Admin", ""), &cookie);
    forged
        .headers_mut()
        .insert(header::ORIGIN, HeaderValue::from_static("https://evil.example"));
    forged
        .headers_mut()
        .insert(header::HOST, HeaderValue::from_static("127.0.0.1:5173"));
    let response = app.clone().oneshot(forged).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Without the visitor's cookie there is no session to act with
    let response = app
        .clone()
        .oneshot(post_form("/admin/users/u1/roles/Admin", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadmin%2Fusers%2Fu1%2Froles%2FAdmin");

    let response = app.oneshot(get("/admin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(roster_requests(&server).await, 0);
}

#[tokio::test]
async fn logout_is_post_only() {
    let server = MockServer::start().await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("User")).await;

    let response = app
        .clone()
        .oneshot(with_cookie(get("/logout"), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app
        .oneshot(with_cookie(get("/"), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_without_required_role_is_sent_to_not_authorized() {
    let server = MockServer::start().await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("User")).await;

    let response = app
        .clone()
        .oneshot(with_cookie(get("/admin"), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/not-authorized");

    let response = app
        .oneshot(with_cookie(get("/protected-user"), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("User area"));

    // The guard rejects before any roster request is made
    assert_eq!(roster_requests(&server).await, 0);
}

#[tokio::test]
async fn dashboard_lists_roles() {
    let server = MockServer::start().await;
    let app = app_for(&server);
    let token = token_with(json!({ "role": ["User", "Manager"], "exp": FUTURE_EXP }));
    let cookie = sign_in(&app, &server, &token).await;

    let response = app
        .oneshot(with_cookie(get("/"), &cookie))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("User, Manager"));
}

#[tokio::test]
async fn already_expired_token_does_not_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": token_with(json!({ "role": "Admin", "exp": 1 })),
            "expiresAtUtc": "1970-01-01T00:00:01Z"
        })))
        .mount(&server)
        .await;
    let app = app_for(&server);

    let response = app
        .clone()
        .oneshot(post_form("/login", "email=ada%40example.com&password=pw"))
        .await
        .unwrap();
    assert!(session_cookie(&response).is_none());

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn admin_sees_roster_with_role_actions() {
    let server = MockServer::start().await;
    mount_roster(&server).await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("Admin")).await;

    let response = app
        .oneshot(with_cookie(get("/admin"), &cookie))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("ada@example.com"));
    assert!(body.contains("Ada Lovelace"));
    assert!(body.contains("2024-01-01 09:30 UTC"));
    assert!(body.contains("Add Manager"));
    assert!(body.contains("Remove User"));
}

#[tokio::test]
async fn roster_failure_renders_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("Admin")).await;

    let response = app
        .oneshot(with_cookie(get("/admin"), &cookie))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("HTTP 500"));
}

#[tokio::test]
async fn same_origin_grant_calls_the_api_and_rerenders() {
    let server = MockServer::start().await;
    mount_roster(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/users/u1/roles/Manager"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("Admin")).await;

    let mut request = with_cookie(post_form("/admin/users/u1/roles/Manager", ""), &cookie);
    request
        .headers_mut()
        .insert(header::ORIGIN, HeaderValue::from_static("http://127.0.0.1:5173"));
    request
        .headers_mut()
        .insert(header::HOST, HeaderValue::from_static("127.0.0.1:5173"));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("ada@example.com"));
}

#[tokio::test]
async fn revoking_a_role_calls_delete() {
    let server = MockServer::start().await;
    mount_roster(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/u1/roles/User"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("Admin")).await;

    let response = app
        .oneshot(with_cookie(
            post_form("/admin/users/u1/roles/User/delete", ""),
            &cookie,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_grant_shows_error_over_reloaded_roster() {
    let server = MockServer::start().await;
    mount_roster(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/users/u1/roles/Admin"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("Admin")).await;

    let response = app
        .oneshot(with_cookie(
            post_form("/admin/users/u1/roles/Admin", ""),
            &cookie,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_text(response).await;
    assert!(body.contains("Forbidden"));
    assert!(body.contains("ada@example.com"));
}

#[tokio::test]
async fn login_success_redirects_to_next() {
    let server = MockServer::start().await;
    let token = token_for("Manager");
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": &token,
            "expiresAtUtc": "2100-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);

    let response = app
        .clone()
        .oneshot(post_form(
            "/login",
            "email=manager%40example.com&password=pw&next=%2Fprotected-manager",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/protected-manager");
    let cookie = session_cookie(&response).unwrap();

    let response = app
        .oneshot(with_cookie(get("/protected-manager"), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_ignores_offsite_next() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": token_for("User"),
            "expiresAtUtc": "2100-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;
    let app = app_for(&server);

    let response = app
        .oneshot(post_form(
            "/login",
            "email=user%40example.com&password=pw&next=https%3A%2F%2Fevil.example",
        ))
        .await
        .unwrap();

    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn login_failure_shows_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
        .mount(&server)
        .await;
    let app = app_for(&server);

    let response = app
        .oneshot(post_form("/login", "email=ada%40example.com&password=wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response)
        .await
        .contains("Invalid email or password. Please try again."));
}

#[tokio::test]
async fn invalid_login_form_is_rejected_without_calling_api() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let response = app
        .clone()
        .oneshot(post_form("/login", "email=not-an-email&password=pw"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Enter a valid email address"));

    let response = app
        .oneshot(post_form("/login", "email=ada%40example.com&password="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Password is required"));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn register_failure_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Email already in use"))
        .mount(&server)
        .await;
    let app = app_for(&server);

    let response = app
        .oneshot(post_form(
            "/register",
            "first_name=Ada&last_name=Lovelace&email=ada%40example.com&password=pw",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Email already in use"));
}

#[tokio::test]
async fn logout_clears_session() {
    let server = MockServer::start().await;
    let app = app_for(&server);
    let cookie = sign_in(&app, &server, &token_for("User")).await;

    let response = app
        .clone()
        .oneshot(with_cookie(post_form("/logout", ""), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = app
        .oneshot(with_cookie(get("/"), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn unknown_and_forbidden_pages() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let response = app.clone().oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/not-authorized")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("Not authorized"));
}
