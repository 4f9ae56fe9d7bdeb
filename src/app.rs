use crate::state::AppState;
use crate::{auth, comments, tasks};
use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(tasks::router())
        .merge(comments::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{dto::Session, jwt::SessionKeys, provider::tests::mint_assertion};
    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use crate::tasks::dto::CreateTaskRequest;
    use futures_util::StreamExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn token_for(state: &AppState, email: &str, name: &str) -> String {
        SessionKeys::from_ref(state)
            .sign(
                &Session {
                    email: email.into(),
                    name: Some(name.into()),
                },
                "google",
            )
            .unwrap()
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_redirect_home(res: &Response) {
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");
    }

    async fn create(app: &Router, token: &str, text: &str, public: bool) -> Value {
        let res = send(
            app,
            request(
                "POST",
                "/dashboard/tasks",
                Some(token),
                Some(json!({ "task": text, "public": public })),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        json_body(res).await
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(AppState::fake());
        let res = send(&app, request("GET", "/health", None, None)).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dashboard_redirects_anonymous_visitors() {
        let app = build_app(AppState::fake());
        assert_redirect_home(&send(&app, request("GET", "/dashboard", None, None)).await);
        assert_redirect_home(&send(&app, request("GET", "/dashboard/stream", None, None)).await);
        assert_redirect_home(&send(&app, request("GET", "/dashboard", Some("bogus"), None)).await);
    }

    #[tokio::test]
    async fn private_task_is_created_and_listed_for_owner() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");

        let created = create(&app, &alice, "Buy milk", false).await;
        assert_eq!(created["user"], "a@x.com");
        assert_eq!(created["public"], false);
        assert!(created.get("share_url").is_none());

        let res = send(&app, request("GET", "/dashboard", Some(&alice), None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(body["tasks"][0]["task"], "Buy milk");
    }

    #[tokio::test]
    async fn empty_task_is_rejected_without_write() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");

        let res = send(
            &app,
            request("POST", "/dashboard/tasks", Some(&alice), Some(json!({ "task": "" }))),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = json_body(send(&app, request("GET", "/dashboard", Some(&alice), None)).await).await;
        assert!(body["tasks"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_require_a_session() {
        let app = build_app(AppState::fake());
        let res = send(
            &app,
            request("POST", "/dashboard/tasks", None, Some(json!({ "task": "x" }))),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn private_missing_and_malformed_tasks_redirect_home() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");
        let private = create(&app, &alice, "secret", false).await;
        let uri = format!("/task/{}", private["id"].as_str().unwrap());

        assert_redirect_home(&send(&app, request("GET", &uri, None, None)).await);
        // not even the owner sees a private task through the public view
        assert_redirect_home(&send(&app, request("GET", &uri, Some(&alice), None)).await);
        assert_redirect_home(&send(&app, request("GET", "/task/abc123", None, None)).await);
        assert_redirect_home(
            &send(&app, request("GET", &format!("/task/{}", uuid::Uuid::new_v4()), None, None)).await,
        );
    }

    #[tokio::test]
    async fn comment_on_public_task_shows_to_author_and_owner() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");
        let bea = token_for(&state, "b@y.com", "Bea");

        let task = create(&app, &alice, "Plan the trip", true).await;
        let id = task["id"].as_str().unwrap();
        assert_eq!(task["share_url"], format!("http://tarefas.test/task/{id}"));

        let res = send(
            &app,
            request(
                "POST",
                &format!("/task/{id}/comments"),
                Some(&bea),
                Some(json!({ "comment": "Got it" })),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let comment = json_body(res).await;
        assert_eq!(comment["user"], "b@y.com");
        assert_eq!(comment["name"], "Bea");
        assert_eq!(comment["can_delete"], true);

        let page = json_body(send(&app, request("GET", &format!("/task/{id}"), Some(&alice), None)).await).await;
        assert_eq!(page["item"]["task"], "Plan the trip");
        assert_eq!(page["comments"].as_array().unwrap().len(), 1);
        assert_eq!(page["comments"][0]["comment"], "Got it");
        assert_eq!(page["comments"][0]["can_delete"], false);
        assert_eq!(page["can_comment"], true);

        let anonymous = json_body(send(&app, request("GET", &format!("/task/{id}"), None, None)).await).await;
        assert_eq!(anonymous["viewer"], Value::Null);
        assert_eq!(anonymous["can_comment"], false);
    }

    #[tokio::test]
    async fn signed_out_comment_is_rejected_without_write() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");
        let task = create(&app, &alice, "Plan the trip", true).await;
        let id = task["id"].as_str().unwrap();

        let res = send(
            &app,
            request("POST", &format!("/task/{id}/comments"), None, Some(json!({ "comment": "hi" }))),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let page = json_body(send(&app, request("GET", &format!("/task/{id}"), None, None)).await).await;
        assert!(page["comments"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_delete_is_author_only_and_idempotent() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");
        let bea = token_for(&state, "b@y.com", "Bea");
        let task = create(&app, &alice, "Plan the trip", true).await;
        let id = task["id"].as_str().unwrap();

        let comment = json_body(
            send(
                &app,
                request("POST", &format!("/task/{id}/comments"), Some(&bea), Some(json!({ "comment": "bye" }))),
            )
            .await,
        )
        .await;
        let uri = format!("/task/{id}/comments/{}", comment["id"].as_str().unwrap());

        let res = send(&app, request("DELETE", &uri, Some(&alice), None)).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        for _ in 0..2 {
            let res = send(&app, request("DELETE", &uri, Some(&bea), None)).await;
            assert_eq!(res.status(), StatusCode::NO_CONTENT);
        }
        let page = json_body(send(&app, request("GET", &format!("/task/{id}"), None, None)).await).await;
        assert!(page["comments"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn task_delete_checks_owner() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");
        let bea = token_for(&state, "b@y.com", "Bea");
        let task = create(&app, &alice, "mine", false).await;
        let uri = format!("/dashboard/tasks/{}", task["id"].as_str().unwrap());

        assert_eq!(send(&app, request("DELETE", &uri, Some(&bea), None)).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(send(&app, request("DELETE", &uri, Some(&alice), None)).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(send(&app, request("DELETE", &uri, Some(&alice), None)).await.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn share_link_only_for_public_tasks() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");
        let public = create(&app, &alice, "pub", true).await;
        let private = create(&app, &alice, "priv", false).await;

        let uri = format!("/dashboard/tasks/{}/share", public["id"].as_str().unwrap());
        let body = json_body(send(&app, request("GET", &uri, Some(&alice), None)).await).await;
        assert_eq!(body["url"], format!("http://tarefas.test/task/{}", public["id"].as_str().unwrap()));

        let uri = format!("/dashboard/tasks/{}/share", private["id"].as_str().unwrap());
        assert_eq!(send(&app, request("GET", &uri, Some(&alice), None)).await.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn stream_starts_with_current_snapshot() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");
        create(&app, &alice, "Buy milk", false).await;

        let res = send(&app, request("GET", "/dashboard/stream", Some(&alice), None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let mut frames = res.into_body().into_data_stream();
        let first = tokio::time::timeout(Duration::from_secs(1), frames.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = String::from_utf8(first.to_vec()).unwrap();
        assert!(text.contains("event: tasks"));
        assert!(text.contains("Buy milk"));

        drop(frames);
        assert_eq!(state.feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stream_closes_when_token_expires() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let ana = Session {
            email: "a@x.com".into(),
            name: Some("Ana".into()),
        };
        let mut keys = SessionKeys::from_ref(&state);
        keys.ttl = Duration::from_secs(2);
        let short_lived = keys.sign(&ana, "google").unwrap();

        let res = send(&app, request("GET", "/dashboard/stream", Some(&short_lived), None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let mut frames = res.into_body().into_data_stream();
        let first = tokio::time::timeout(Duration::from_secs(1), frames.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(String::from_utf8(first.to_vec()).unwrap().contains("event: tasks"));

        tokio::time::sleep(Duration::from_millis(3100)).await;
        let res = send(&app, request("GET", "/dashboard", Some(&short_lived), None)).await;
        assert_redirect_home(&res);

        tasks::services::create_task(
            &state,
            &ana,
            CreateTaskRequest {
                task: "secret plan".into(),
                public: false,
            },
        )
        .await
        .unwrap();
        let next = tokio::time::timeout(Duration::from_secs(1), frames.next())
            .await
            .expect("expired stream should close");
        assert!(next.is_none(), "no snapshot after expiry");
    }

    #[tokio::test]
    async fn sign_out_closes_open_stream() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = token_for(&state, "a@x.com", "Ana");

        let res = send(&app, request("GET", "/dashboard/stream", Some(&alice), None)).await;
        let mut frames = res.into_body().into_data_stream();
        tokio::time::timeout(Duration::from_secs(1), frames.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let res = send(&app, request("POST", "/auth/signout", Some(&alice), None)).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let next = tokio::time::timeout(Duration::from_secs(1), frames.next())
            .await
            .expect("signed-out stream should close");
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn sign_in_sets_cookie_and_session_resolves() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let assertion = mint_assertion("broker-secret", "test", "a@x.com", Some("Ana"));

        let res = send(
            &app,
            request("POST", "/auth/signin/google", None, Some(json!({ "assertion": assertion }))),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("session=") && cookie.contains("HttpOnly"));
        let pair = cookie.split(';').next().unwrap().to_string();

        let req = Request::builder()
            .uri("/auth/session")
            .header(header::COOKIE, &pair)
            .body(Body::empty())
            .unwrap();
        let body = json_body(send(&app, req).await).await;
        assert_eq!(body["user"]["email"], "a@x.com");

        let req = Request::builder()
            .uri("/header")
            .header(header::COOKIE, &pair)
            .body(Body::empty())
            .unwrap();
        let header_view = json_body(send(&app, req).await).await;
        assert_eq!(header_view["auth"]["state"], "authenticated");
        assert_eq!(header_view["auth"]["display_name"], "ANA");
        assert_eq!(header_view["dashboard"], "/dashboard");
    }

    #[tokio::test]
    async fn sign_in_rejects_unknown_provider_and_bad_assertion() {
        let app = build_app(AppState::fake());
        let assertion = mint_assertion("broker-secret", "test", "a@x.com", Some("Ana"));
        let res = send(
            &app,
            request("POST", "/auth/signin/github", None, Some(json!({ "assertion": assertion }))),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let forged = mint_assertion("guessed", "test", "a@x.com", Some("Ana"));
        let res = send(
            &app,
            request("POST", "/auth/signin/google", None, Some(json!({ "assertion": forged }))),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn anonymous_session_and_header() {
        let app = build_app(AppState::fake());
        let body = json_body(send(&app, request("GET", "/auth/session", None, None)).await).await;
        assert_eq!(body, Value::Null);

        let header_view = json_body(send(&app, request("GET", "/header", None, None)).await).await;
        assert_eq!(header_view["auth"]["state"], "anonymous");
        assert_eq!(header_view["auth"]["sign_in"], "/auth/signin/google");
        assert_eq!(header_view["dashboard"], Value::Null);
    }

    #[tokio::test]
    async fn sign_out_clears_cookie() {
        let app = build_app(AppState::fake());
        let res = send(&app, request("POST", "/auth/signout", None, None)).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
