use axum::Router;
use axum::body::Body;
use axum::extract::FromRef;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use vestibule_database::Database;
use vestibule_domain::config::JwtConfig;
use vestibule_identity::{IdentityService, identity_router};

#[derive(Debug, Clone)]
struct TestState {
    identity: IdentityService,
}

impl FromRef<TestState> for IdentityService {
    fn from_ref(state: &TestState) -> Self {
        state.identity.clone()
    }
}

/// Fresh in-memory engine per test; migrations run inside `init`.
async fn test_service(db_name: &str) -> IdentityService {
    let db = Database::builder()
        .url("mem://")
        .session("identity_test", db_name)
        .init()
        .await
        .expect("in-memory database");

    IdentityService::new(db, JwtConfig::default())
}

fn test_app(identity: IdentityService) -> Router {
    let (router, _api_doc) =
        identity_router::<TestState>().with_state(TestState { identity }).split_for_parts();
    router
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn valid_payload() -> Value {
    json!({ "email": "test@example.com", "password": "testpass123", "name": "Test Name" })
}

// --- Public endpoints ---

#[tokio::test]
async fn create_valid_user_succeeds() {
    let service = test_service("create_valid").await;
    let app = test_app(service.clone());

    let response =
        app.oneshot(post_json("/api/user/create", valid_payload())).await.expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["name"], "Test Name");
    assert!(body.get("password").is_none(), "password must never appear in responses");

    let stored = service.find_by_email("test@example.com").await.expect("lookup");
    assert!(stored.is_some(), "registration must persist the user");
    service
        .verify_credentials("test@example.com", "testpass123")
        .await
        .expect("stored password must verify");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let service = test_service("duplicate_email").await;
    let app = test_app(service.clone());

    let first =
        app.clone().oneshot(post_json("/api/user/create", valid_payload())).await.expect("first");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second =
        app.oneshot(post_json("/api/user/create", valid_payload())).await.expect("second");
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn short_password_is_rejected_and_nothing_is_stored() {
    let service = test_service("short_password").await;
    let app = test_app(service.clone());

    let payload = json!({ "email": "test@example.com", "password": "123", "name": "Test Name" });
    let response = app.oneshot(post_json("/api/user/create", payload)).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let stored = service.find_by_email("test@example.com").await.expect("lookup");
    assert!(stored.is_none(), "no record may be created for a rejected payload");
}

#[tokio::test]
async fn token_issued_for_valid_credentials() {
    let service = test_service("token_valid").await;
    let app = test_app(service.clone());

    app.clone()
        .oneshot(post_json("/api/user/create", valid_payload()))
        .await
        .expect("registration");

    let response = app
        .oneshot(post_json(
            "/api/user/token",
            json!({ "email": "test@example.com", "password": "testpass123" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().expect("token in body");
    let claims = service.verify_token(token).expect("issued token must verify");
    assert!(!claims.sub.is_empty());
}

#[tokio::test]
async fn token_denied_for_invalid_credentials() {
    let service = test_service("token_invalid").await;
    let app = test_app(service.clone());

    app.clone()
        .oneshot(post_json("/api/user/create", valid_payload()))
        .await
        .expect("registration");

    let response = app
        .oneshot(post_json(
            "/api/user/token",
            json!({ "email": "test@example.com", "password": "anypass" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("token").is_none(), "no token may be issued for bad credentials");
}

#[tokio::test]
async fn token_denied_for_missing_field() {
    let service = test_service("token_missing").await;
    let app = test_app(service);

    let response = app
        .oneshot(post_json("/api/user/token", json!({ "email": "one", "password": "" })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("token").is_none());
}

// --- Authenticated endpoints ---

async fn register_and_login(service: &IdentityService) -> String {
    let app = test_app(service.clone());
    let created =
        app.clone().oneshot(post_json("/api/user/create", valid_payload())).await.expect("create");
    assert_eq!(created.status(), StatusCode::CREATED);

    service.issue_token("test@example.com", "testpass123").await.expect("token")
}

#[tokio::test]
async fn profile_requires_authentication() {
    let service = test_service("me_unauthorized").await;
    let app = test_app(service);

    let response = app
        .oneshot(Request::builder().uri("/api/user/me").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_returns_email_and_name() {
    let service = test_service("me_profile").await;
    let token = register_and_login(&service).await;
    let app = test_app(service);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/user/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "email": "test@example.com", "name": "Test Name" }));
}

#[tokio::test]
async fn post_to_profile_is_not_allowed() {
    let service = test_service("me_post").await;
    let token = register_and_login(&service).await;
    let app = test_app(service);

    let mut request = post_json("/api/user/me", json!({}));
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, format!("Bearer {token}").parse().expect("header"));

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn patch_updates_name_and_password() {
    let service = test_service("me_patch").await;
    let token = register_and_login(&service).await;
    let app = test_app(service.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/user/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "name": "New Name", "password": "newpass456" }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "New Name");

    service
        .verify_credentials("test@example.com", "newpass456")
        .await
        .expect("new password must verify");
    let denied = service.verify_credentials("test@example.com", "testpass123").await;
    assert!(denied.is_err(), "old password must stop working");
}

// --- Service-level cases from the user model ---

#[tokio::test]
async fn superuser_creation_sets_flags() {
    let service = test_service("superuser").await;

    let user =
        service.create_superuser("admin@example.com", "passer123").await.expect("superuser");

    assert!(user.is_superuser);
    assert!(user.is_staff);
}

#[tokio::test]
async fn registration_normalizes_email_domain() {
    let service = test_service("normalize").await;
    let app = test_app(service.clone());

    let payload =
        json!({ "email": "Testemail2@EXampLe.com", "password": "passer123", "name": "N" });
    let response = app.oneshot(post_json("/api/user/create", payload)).await.expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["email"], "Testemail2@example.com");
}
