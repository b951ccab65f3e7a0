pub mod auth;
pub mod cookies;
pub mod error;
mod guides;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// `{"ok": true}`
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Login flow (public)
    let auth_routes = Router::new()
        .route("/:provider/start", get(auth::start))
        .route("/:provider/callback", get(auth::callback))
        .route("/logout", post(auth::logout));

    // Guides: reads are public, writes take an AuthUser
    let guide_routes = Router::new()
        .route("/guides", get(guides::list_guides))
        .route("/guides", post(guides::create_guide))
        .route("/guides/:id", get(guides::get_guide))
        .route("/guides/:id", put(guides::update_guide))
        .route("/guides/:id", delete(guides::delete_guide))
        .route("/guides/:id/publish", post(guides::publish_guide))
        .route("/guides/:id/unpublish", post(guides::unpublish_guide));

    Router::new()
        .route("/healthz", get(health_check))
        .route("/me", get(auth::me))
        .nest("/auth", auth_routes)
        .nest("/api", guide_routes)
        // Runs before every handler; never rejects
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<OkResponse> {
    Json(OkResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{init_memory, Role, SessionStore, User, UserStore};
    use crate::oauth::testing::{profile, FakeProvider};
    use crate::oauth::IdentityProvider;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_state(provider: Option<Arc<FakeProvider>>) -> Arc<AppState> {
        let db = init_memory().await.unwrap();
        let mut config = Config::default();
        config.auth.cookie_secret = "test-cookie-secret".to_string();
        let identity = provider.map(|p| p as Arc<dyn IdentityProvider>);
        Arc::new(AppState::new(config, db, identity))
    }

    /// Create a user with `role` and a live session; returns the user and token.
    async fn signed_in(state: &AppState, email: &str, role: Role) -> (User, String) {
        let users = UserStore::new(state.db.clone());
        let id = users.upsert_by_email(email, email, None, true).await.unwrap();
        users.set_role(&id, role).await.unwrap();
        let token = SessionStore::new(state.db.clone())
            .create(&id, Utc::now() + Duration::days(1))
            .await
            .unwrap();
        (users.get_by_id(&id).await.unwrap().unwrap(), token)
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("sb_session={}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(state: &Arc<AppState>, req: Request<Body>) -> Response {
        create_router(state.clone()).oneshot(req).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn cookie_value(response: &Response, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        set_cookies(response).into_iter().find_map(|c| {
            c.split(';')
                .next()
                .and_then(|pair| pair.strip_prefix(&prefix))
                .map(str::to_string)
        })
    }

    /// Does the response expire `sb_session` (empty value, `Max-Age=0`)?
    fn clears_session(response: &Response) -> bool {
        set_cookies(response)
            .iter()
            .any(|c| c.starts_with("sb_session=;") && c.contains("Max-Age=0"))
    }

    /// `name=value` pairs from every Set-Cookie, ready for a Cookie header.
    fn cookie_header(response: &Response) -> String {
        set_cookies(response)
            .iter()
            .filter_map(|c| c.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }

    async fn count(state: &AppState, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&state.db)
            .await
            .unwrap()
    }

    async fn create_guide(state: &Arc<AppState>, token: &str, body: Value) -> String {
        let response = send(state, request(Method::POST, "/api/guides", Some(token), Some(body))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_healthz() {
        let state = test_state(None).await;
        let response = send(&state, request(Method::GET, "/healthz", None, None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_me_reflects_session() {
        let state = test_state(None).await;

        let response = send(&state, request(Method::GET, "/me", None, None)).await;
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        assert_eq!(body_json(response).await, json!({"authenticated": false}));

        let (user, token) = signed_in(&state, "ada@example.com", Role::Editor).await;
        let response = send(&state, request(Method::GET, "/me", Some(&token), None)).await;
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

        let body = body_json(response).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["user"]["id"], user.id.as_str());
        assert_eq!(body["user"]["role"], "editor");
        assert!(body["user"].get("email").is_none());
    }

    #[tokio::test]
    async fn test_stale_session_cookie_is_cleared() {
        let state = test_state(None).await;
        let response = send(&state, request(Method::GET, "/me", Some("bogus"), None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(clears_session(&response));
        assert_eq!(body_json(response).await, json!({"authenticated": false}));
    }

    #[tokio::test]
    async fn test_deactivated_user_is_anonymous() {
        let state = test_state(None).await;
        let (user, token) = signed_in(&state, "gone@example.com", Role::Member).await;
        UserStore::new(state.db.clone()).set_active(&user.id, false).await.unwrap();

        let response = send(&state, request(Method::GET, "/me", Some(&token), None)).await;
        assert!(clears_session(&response));
        assert_eq!(body_json(response).await["authenticated"], false);

        let response = send(
            &state,
            request(
                Method::POST,
                "/api/guides",
                Some(&token),
                Some(json!({"title": "t", "content": "c"})),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_session_is_anonymous() {
        let state = test_state(None).await;
        let users = UserStore::new(state.db.clone());
        let id = users.upsert_by_email("old@example.com", "Old", None, true).await.unwrap();
        let token = SessionStore::new(state.db.clone())
            .create(&id, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        let response = send(&state, request(Method::GET, "/me", Some(&token), None)).await;
        assert!(clears_session(&response));
        assert_eq!(body_json(response).await["authenticated"], false);
    }

    #[tokio::test]
    async fn test_draft_visibility_over_http() {
        let state = test_state(None).await;
        let (_, author) = signed_in(&state, "author@example.com", Role::Member).await;
        let (_, other) = signed_in(&state, "other@example.com", Role::Member).await;
        let id = create_guide(&state, &author, json!({"title": "Draft", "content": "body"})).await;
        let uri = format!("/api/guides/{}", id);

        let response = send(&state, request(Method::GET, &uri, None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "unauthorized");

        let response = send(&state, request(Method::GET, &uri, Some(&author), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["content"], "body");

        let response = send(&state, request(Method::GET, &uri, Some(&other), None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let publish = format!("/api/guides/{}/publish", id);
        let response = send(&state, request(Method::POST, &publish, Some(&author), None)).await;
        assert_eq!(body_json(response).await, json!({"ok": true}));

        let response = send(&state, request(Method::GET, &uri, None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_normalizes_title_and_tags() {
        let state = test_state(None).await;
        let (user, token) = signed_in(&state, "author@example.com", Role::Member).await;
        let id = create_guide(
            &state,
            &token,
            json!({"title": " My Guide ", "content": "body", "tags": ["Go", "go", "  Go  "]}),
        )
        .await;

        let response = send(&state, request(Method::GET, &format!("/api/guides/{}", id), Some(&token), None)).await;
        let body = body_json(response).await;
        assert_eq!(body["title"], "My Guide");
        assert_eq!(body["status"], "draft");
        assert_eq!(body["creator_id"], user.id.as_str());
        let tags = body["tags"].as_array().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0]["name"], "go");
        assert!(tags[0]["id"].is_string());
        assert!(body["created_at"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_create_requires_auth_and_valid_body() {
        let state = test_state(None).await;

        let response = send(
            &state,
            request(Method::POST, "/api/guides", None, Some(json!({"title": "t", "content": "c"}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let (_, token) = signed_in(&state, "author@example.com", Role::Member).await;
        let response = send(
            &state,
            request(Method::POST, "/api/guides", Some(&token), Some(json!({"title": "  ", "content": "c"}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "invalid_input");

        let malformed = Request::builder()
            .method(Method::POST)
            .uri("/api/guides")
            .header(header::COOKIE, format!("sb_session={}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = send(&state, malformed).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(count(&state, "guides").await, 0);
    }

    #[tokio::test]
    async fn test_list_published_guides() {
        let state = test_state(None).await;
        let (_, token) = signed_in(&state, "author@example.com", Role::Member).await;

        for (title, tag) in [("Rust basics", "rust"), ("Go basics", "go")] {
            let id = create_guide(&state, &token, json!({"title": title, "content": "c", "tags": [tag]})).await;
            let publish = format!("/api/guides/{}/publish", id);
            send(&state, request(Method::POST, &publish, Some(&token), None)).await;
        }
        create_guide(&state, &token, json!({"title": "Rust draft", "content": "c", "tags": ["rust"]})).await;

        let response = send(&state, request(Method::GET, "/api/guides?limit=500&offset=-2", None, None)).await;
        let body = body_json(response).await;
        assert_eq!(body["limit"], 100);
        assert_eq!(body["offset"], 0);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Go basics");
        assert!(items[0].get("content").is_none());

        let response = send(&state, request(Method::GET, "/api/guides?tag=RUST&q=basic", None, None)).await;
        let body = body_json(response).await;
        assert_eq!(body["limit"], 20);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Rust basics");

        let response = send(&state, request(Method::GET, "/api/guides?limit=abc", None, None)).await;
        assert_eq!(body_json(response).await["limit"], 20);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let state = test_state(None).await;
        let (_, author) = signed_in(&state, "author@example.com", Role::Member).await;
        let (_, other) = signed_in(&state, "other@example.com", Role::Member).await;
        let id = create_guide(&state, &author, json!({"title": "T", "content": "c", "tags": ["a", "b"]})).await;
        let uri = format!("/api/guides/{}", id);

        let response = send(
            &state,
            request(Method::PUT, &uri, Some(&other), Some(json!({"title": "X", "content": "y"}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &state,
            request(Method::PUT, &uri, Some(&author), Some(json!({"title": "T2", "content": "c2"}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(send(&state, request(Method::GET, &uri, Some(&author), None)).await).await;
        assert_eq!(body["title"], "T2");
        assert_eq!(body["tags"].as_array().unwrap().len(), 2);

        let response = send(
            &state,
            request(Method::PUT, &uri, Some(&author), Some(json!({"title": "T3", "content": "c3", "tags": []}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(send(&state, request(Method::GET, &uri, Some(&author), None)).await).await;
        assert!(body["tags"].as_array().unwrap().is_empty());

        let response = send(&state, request(Method::DELETE, &uri, Some(&author), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&state, request(Method::GET, &uri, Some(&author), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_editor_can_publish_others_guides() {
        let state = test_state(None).await;
        let (_, author) = signed_in(&state, "author@example.com", Role::Member).await;
        let (_, editor) = signed_in(&state, "editor@example.com", Role::Editor).await;
        let id = create_guide(&state, &author, json!({"title": "T", "content": "c"})).await;

        let publish = format!("/api/guides/{}/publish", id);
        let response = send(&state, request(Method::POST, &publish, Some(&editor), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let unpublish = format!("/api/guides/{}/unpublish", id);
        let response = send(&state, request(Method::POST, &unpublish, Some(&editor), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&state, request(Method::GET, &format!("/api/guides/{}", id), None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout() {
        let state = test_state(None).await;

        let response = send(&state, request(Method::POST, "/auth/logout", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response).is_empty());
        assert_eq!(body_json(response).await, json!({"ok": true}));

        let (_, token) = signed_in(&state, "ada@example.com", Role::Member).await;
        let response = send(&state, request(Method::POST, "/auth/logout", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("sb_session=") && c.contains("Max-Age=0")));
        assert_eq!(count(&state, "sessions").await, 0);

        let response = send(&state, request(Method::GET, "/me", Some(&token), None)).await;
        assert_eq!(body_json(response).await["authenticated"], false);
    }

    #[tokio::test]
    async fn test_start_sets_cookies_and_redirects() {
        let provider = Arc::new(FakeProvider::with_profile(profile(Some("n@example.com"))));
        let state = test_state(Some(provider)).await;

        let response = send(
            &state,
            request(Method::GET, "/auth/discord/start?returnTo=https%3A%2F%2Fevil.example", None, None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://idp.test/authorize?"));

        let cookies = set_cookies(&response);
        for name in ["sb_oauth_state=", "sb_return_to="] {
            let cookie = cookies.iter().find(|c| c.starts_with(name)).unwrap();
            assert!(cookie.contains("HttpOnly"));
            assert!(cookie.contains("Max-Age=600"));
            assert!(cookie.contains("Path=/"));
        }
    }

    #[tokio::test]
    async fn test_strict_policy_keeps_oauth_cookies_lax() {
        let db = init_memory().await.unwrap();
        let mut config = Config::default();
        config.auth.cookie_same_site = crate::config::SameSitePolicy::Strict;
        let provider = Arc::new(FakeProvider::with_profile(profile(Some("n@example.com"))));
        let state = Arc::new(AppState::new(config, db, Some(provider as Arc<dyn IdentityProvider>)));

        let (oauth_state, cookies) = begin_login(&state, "%2F").await;
        let response = send(&state, request(Method::GET, "/auth/discord/start", None, None)).await;
        for name in ["sb_oauth_state=", "sb_return_to="] {
            let cookie = set_cookies(&response).into_iter().find(|c| c.starts_with(name)).unwrap();
            assert!(cookie.contains("SameSite=Lax"), "{}", cookie);
        }

        // The login still completes, and the session cookie follows the policy
        let response = send(
            &state,
            callback_request(&format!("code=abc&state={}", oauth_state), &cookies),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let session = set_cookies(&response)
            .into_iter()
            .find(|c| c.starts_with("sb_session="))
            .unwrap();
        assert!(session.contains("SameSite=Strict"));
    }

    #[tokio::test]
    async fn test_unknown_or_unconfigured_provider() {
        let provider = Arc::new(FakeProvider::with_profile(profile(Some("n@example.com"))));
        let state = test_state(Some(provider)).await;
        let response = send(&state, request(Method::GET, "/auth/github/start", None, None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let state = test_state(None).await;
        let response = send(&state, request(Method::GET, "/auth/discord/start", None, None)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"]["code"], "not_configured");
    }

    /// Run `/start` and return the issued state plus the cookies to send back.
    async fn begin_login(state: &Arc<AppState>, return_to: &str) -> (String, String) {
        let uri = format!("/auth/discord/start?returnTo={}", return_to);
        let response = send(state, request(Method::GET, &uri, None, None)).await;
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        let oauth_state = reqwest::Url::parse(&location)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        (oauth_state, cookie_header(&response))
    }

    fn callback_request(query: &str, cookies: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/auth/discord/callback?{}", query))
            .header(header::COOKIE, cookies)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let provider = Arc::new(FakeProvider::with_profile(profile(Some("Nelly@Example.com"))));
        let state = test_state(Some(provider)).await;

        let (oauth_state, cookies) = begin_login(&state, "%2Fguides%2F42%3Ftab%3Dedit").await;
        let response = send(
            &state,
            callback_request(&format!("code=abc&state={}", oauth_state), &cookies),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/guides/42?tab=edit");
        let set = set_cookies(&response);
        assert!(set.iter().any(|c| c.starts_with("sb_oauth_state=") && c.contains("Max-Age=0")));
        assert!(set.iter().any(|c| c.starts_with("sb_return_to=") && c.contains("Max-Age=0")));

        let token = cookie_value(&response, "sb_session").unwrap();
        assert!(!token.is_empty());

        let body = body_json(send(&state, request(Method::GET, "/me", Some(&token), None)).await).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["user"]["display_name"], "Nelly");
        assert_eq!(body["user"]["role"], "member");

        // Same email, different case: still one user
        let (oauth_state, cookies) = begin_login(&state, "").await;
        let response = send(
            &state,
            callback_request(&format!("code=def&state={}", oauth_state), &cookies),
        )
        .await;
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert_eq!(count(&state, "users").await, 1);
        assert_eq!(count(&state, "sessions").await, 2);
    }

    #[tokio::test]
    async fn test_callback_state_mismatch() {
        let provider = Arc::new(FakeProvider::with_profile(profile(Some("n@example.com"))));
        let state = test_state(Some(provider.clone())).await;

        let (_, cookies) = begin_login(&state, "%2F").await;
        let response = send(&state, callback_request("code=abc&state=forged", &cookies)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(cookie_value(&response, "sb_session").is_none());
        assert_eq!(provider.calls(), 0);
        assert_eq!(count(&state, "users").await, 0);
        assert_eq!(count(&state, "sessions").await, 0);
    }

    #[tokio::test]
    async fn test_callback_rejects_missing_or_tampered_state_cookie() {
        let provider = Arc::new(FakeProvider::with_profile(profile(Some("n@example.com"))));
        let state = test_state(Some(provider.clone())).await;

        let response = send(&state, callback_request("code=abc&state=s", "")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // An unsigned cookie with the right name is ignored
        let response = send(&state, callback_request("code=abc&state=s", "sb_oauth_state=s")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_callback_missing_code() {
        let provider = Arc::new(FakeProvider::with_profile(profile(Some("n@example.com"))));
        let state = test_state(Some(provider.clone())).await;

        let (oauth_state, cookies) = begin_login(&state, "%2F").await;
        let response = send(&state, callback_request(&format!("state={}", oauth_state), &cookies)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_callback_provider_failures() {
        let state = test_state(Some(Arc::new(FakeProvider::failing_exchange()))).await;
        let (oauth_state, cookies) = begin_login(&state, "%2F").await;
        let response = send(
            &state,
            callback_request(&format!("code=abc&state={}", oauth_state), &cookies),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(cookie_value(&response, "sb_session").is_none());
        assert_eq!(body_json(response).await["error"]["code"], "oauth_failed");

        let state = test_state(Some(Arc::new(FakeProvider::with_profile(profile(None))))).await;
        let (oauth_state, cookies) = begin_login(&state, "%2F").await;
        let response = send(
            &state,
            callback_request(&format!("code=abc&state={}", oauth_state), &cookies),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "missing_email_scope");
        assert_eq!(count(&state, "users").await, 0);
    }
}
