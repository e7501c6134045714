use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    // first two segments only, codes travel in the rest of the path
                    let route = req
                        .uri()
                        .path()
                        .split('/')
                        .take(3)
                        .collect::<Vec<_>>()
                        .join("/");
                    tracing::info_span!("http_request", %method, route = %route, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::build_app;
    use crate::{memory::MemoryStore, state::AppState};

    fn app() -> (Router, Arc<MemoryStore>) {
        let (state, store) = AppState::fake();
        (build_app(state), store)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn ann() -> Value {
        json!({
            "email": "a@x.com",
            "password": "p1",
            "firstName": "Ann",
            "lastName": "Lee",
            "country": "PE",
            "image": "https://img.local/ann.png",
            "frontBaseUrl": "https://app.local"
        })
    }

    async fn register_ann(app: &Router, store: &MemoryStore) -> (Uuid, String) {
        let (status, body) = call(app, "POST", "/users", None, Some(ann())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
        let code = store.pending_codes(id).await.pop().unwrap();
        (id, code)
    }

    async fn login(app: &Router, password: &str) -> (StatusCode, Value) {
        call(
            app,
            "POST",
            "/users/login",
            None,
            Some(json!({"email": "a@x.com", "password": password})),
        )
        .await
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app();
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn registration_then_verification_scenario() {
        let (app, store) = app();

        let (status, body) = call(&app, "POST", "/users", None, Some(ann())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["isVerified"], json!(false));
        assert_eq!(body["firstName"], json!("Ann"));
        assert!(body.get("password").is_none());
        assert!(body.get("passwordHash").is_none());

        let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
        let code = store.pending_codes(id).await.pop().unwrap();

        let (status, _) = call(&app, "GET", "/users/verify/wrong-code", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let uri = format!("/users/verify/{code}");
        let (status, body) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isVerified"], json!(true));

        let (status, _) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_registration_is_conflict() {
        let (app, store) = app();
        register_ann(&app, &store).await;
        let (status, _) = call(&app, "POST", "/users", None, Some(ann())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn malformed_registration_is_bad_request() {
        let (app, _) = app();
        let mut body = ann();
        body["email"] = json!("nope");
        let (status, _) = call(&app, "POST", "/users", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_email_on_login_or_reset_is_unauthorized() {
        let (app, _) = app();
        let (status, _) = call(
            &app,
            "POST",
            "/users/login",
            None,
            Some(json!({"email": "bogus", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            "POST",
            "/users/reset_password",
            None,
            Some(json!({"email": "bogus", "frontBaseUrl": "https://app.local"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_folds_email_case_and_whitespace() {
        let (app, store) = app();
        let (_, code) = register_ann(&app, &store).await;
        call(&app, "GET", &format!("/users/verify/{code}"), None, None).await;
        let (status, _) = call(
            &app,
            "POST",
            "/users/login",
            None,
            Some(json!({"email": "  A@X.COM ", "password": "p1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn login_scenario_and_me() {
        let (app, store) = app();
        let (id, code) = register_ann(&app, &store).await;

        let (status, _) = login(&app, "p1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        call(&app, "GET", &format!("/users/verify/{code}"), None, None).await;

        let (status, _) = login(&app, "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = login(&app, "p1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], json!(id.to_string()));
        assert!(body["user"].get("password").is_none());
        let token = body["token"].as_str().unwrap().to_string();

        let (status, me) = call(&app, "GET", "/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], json!("a@x.com"));
        assert_eq!(me["isVerified"], json!(true));
    }

    #[tokio::test]
    async fn me_reflects_token_not_later_edits() {
        let (app, store) = app();
        let (id, code) = register_ann(&app, &store).await;
        call(&app, "GET", &format!("/users/verify/{code}"), None, None).await;
        let (_, body) = login(&app, "p1").await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, updated) = call(
            &app,
            "PUT",
            &format!("/users/{id}"),
            Some(&token),
            Some(json!({"firstName": "Annie"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["firstName"], json!("Annie"));

        let (_, me) = call(&app, "GET", "/users/me", Some(&token), None).await;
        assert_eq!(me["firstName"], json!("Ann"));
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let (app, _) = app();
        for (method, uri) in [
            ("GET", "/users".to_string()),
            ("GET", "/users/me".to_string()),
            ("GET", format!("/users/{}", Uuid::new_v4())),
            ("DELETE", format!("/users/{}", Uuid::new_v4())),
        ] {
            let (status, _) = call(&app, method, &uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
        let (status, _) = call(&app, "GET", "/users", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn user_crud_with_token() {
        let (app, store) = app();
        let (id, code) = register_ann(&app, &store).await;
        call(&app, "GET", &format!("/users/verify/{code}"), None, None).await;
        let (_, body) = login(&app, "p1").await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, list) = call(&app, "GET", "/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, one) = call(&app, "GET", &format!("/users/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["email"], json!("a@x.com"));

        // guarded fields are ignored by the generic update
        let (status, updated) = call(
            &app,
            "PUT",
            &format!("/users/{id}"),
            Some(&token),
            Some(json!({"country": "CL", "email": "evil@x.com", "isVerified": false, "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["country"], json!("CL"));
        assert_eq!(updated["email"], json!("a@x.com"));
        assert_eq!(updated["isVerified"], json!(true));
        let (status, _) = login(&app, "p1").await;
        assert_eq!(status, StatusCode::OK);

        let missing = Uuid::new_v4();
        let (status, _) = call(&app, "GET", &format!("/users/{missing}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(
            &app,
            "PUT",
            &format!("/users/{missing}"),
            Some(&token),
            Some(json!({"country": "CL"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, "DELETE", &format!("/users/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "DELETE", &format!("/users/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn password_reset_scenario() {
        let (app, store) = app();
        let (id, code) = register_ann(&app, &store).await;
        call(&app, "GET", &format!("/users/verify/{code}"), None, None).await;

        let (status, _) = call(
            &app,
            "POST",
            "/users/reset_password",
            None,
            Some(json!({"email": "nobody@x.com", "frontBaseUrl": "https://app.local"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(
            &app,
            "POST",
            "/users/reset_password",
            None,
            Some(json!({"email": "a@x.com", "frontBaseUrl": "https://app.local"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], json!(id.to_string()));

        let reset_code = store.pending_codes(id).await.pop().unwrap();

        let (status, _) = call(
            &app,
            "POST",
            "/users/reset_password/unknown",
            None,
            Some(json!({"password": "p2"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let uri = format!("/users/reset_password/{reset_code}");
        let (status, _) = call(&app, "POST", &uri, None, Some(json!({"password": "p2"}))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, "POST", &uri, None, Some(json!({"password": "p3"}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        assert_eq!(login(&app, "p1").await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(login(&app, "p2").await.0, StatusCode::OK);
    }
}
