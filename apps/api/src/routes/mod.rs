pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::formatting::handlers as formatting;
use crate::posts::handlers as posts;
use crate::state::AppState;
use crate::templates::handlers as templates;
use crate::webhooks::handlers as webhooks;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Template API
        .route(
            "/api/templates",
            get(templates::handle_list_templates).post(templates::handle_create_template),
        )
        .route(
            "/api/templates/:id",
            get(templates::handle_get_template)
                .patch(templates::handle_update_template)
                .delete(templates::handle_delete_template),
        )
        // Format API
        .route("/api/format", post(formatting::handle_format))
        // Post API
        .route(
            "/api/posts",
            get(posts::handle_list_posts).post(posts::handle_create_post),
        )
        .route(
            "/api/posts/:id",
            get(posts::handle_get_post)
                .put(posts::handle_update_post)
                .delete(posts::handle_delete_post),
        )
        .route("/api/posts/:id/publish", post(posts::handle_publish_post))
        .route(
            "/api/posts/:id/platforms/:name/publish",
            post(posts::handle_publish_platform),
        )
        // Clerk user sync
        .route("/api/webhooks/clerk", post(webhooks::handle_clerk_webhook))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{session_token, test_state, StubModel, WEBHOOK_SECRET};
    use crate::webhooks::signature::WebhookVerifier;

    fn failing_state() -> AppState {
        test_state(Arc::new(StubModel::failing()))
    }

    fn authed(method: Method, uri: &str, clerk_id: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", session_token(clerk_id)));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn webhook(body: &str, signature: Option<String>) -> Request<Body> {
        let timestamp = Utc::now().timestamp().to_string();
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks/clerk")
            .header("svix-id", "msg_test")
            .header("svix-timestamp", timestamp.as_str());
        let signature = signature.unwrap_or_else(|| {
            WebhookVerifier::new(WEBHOOK_SECRET).unwrap().sign(
                "msg_test",
                &timestamp,
                body.as_bytes(),
            )
        });
        builder = builder.header("svix-signature", signature);
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let state = failing_state();
        let request = Request::get("/health").body(Body::empty()).unwrap();

        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "postforge-api");
    }

    #[tokio::test]
    async fn test_missing_or_invalid_token_is_unauthorized() {
        let state = failing_state();

        let request = Request::get("/api/templates").body(Body::empty()).unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let request = Request::get("/api/posts")
            .header(header::AUTHORIZATION, "Bearer not-a-token")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_first_request_creates_user_and_seeds_templates() {
        let state = failing_state();
        assert!(state.users.find_by_clerk_id("user_a").await.unwrap().is_none());

        let (status, body) =
            send(&state, authed(Method::GET, "/api/templates", "user_a", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);
        let user = state.users.find_by_clerk_id("user_a").await.unwrap().unwrap();
        assert_eq!(user.email, "user_a@example.com");
    }

    #[tokio::test]
    async fn test_format_falls_back_when_model_fails() {
        let state = failing_state();
        let (_, templates) =
            send(&state, authed(Method::GET, "/api/templates", "user_a", None)).await;
        let quick_tip = templates
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["name"] == "Quick Tip")
            .unwrap();

        let (status, body) = send(
            &state,
            authed(
                Method::POST,
                "/api/format",
                "user_a",
                Some(json!({ "content": "Hello world", "templateId": quick_tip["id"] })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "linkedin": "Quick tip for professionals:\n\nHello world",
                "twitter": "Pro tip: Hello world"
            })
        );
    }

    #[tokio::test]
    async fn test_format_validates_fields_and_template_ownership() {
        let state = failing_state();

        let (status, _) = send(
            &state,
            authed(
                Method::POST,
                "/api/format",
                "user_a",
                Some(json!({ "content": "Hello" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, templates) =
            send(&state, authed(Method::GET, "/api/templates", "user_a", None)).await;
        let id = templates[0]["id"].clone();
        let (status, _) = send(
            &state,
            authed(
                Method::POST,
                "/api/format",
                "user_b",
                Some(json!({ "content": "Hello", "templateId": id })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_of_another_user_is_not_found() {
        let state = failing_state();
        let (status, created) = send(
            &state,
            authed(
                Method::POST,
                "/api/posts",
                "user_a",
                Some(json!({
                    "title": "Launch",
                    "content": "We shipped",
                    "formattedContent": { "linkedin": "L", "twitter": "T" }
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "draft");
        assert_eq!(created["platforms"].as_array().unwrap().len(), 2);
        let uri = format!("/api/posts/{}", created["id"].as_str().unwrap());

        let (status, _) = send(
            &state,
            authed(
                Method::PUT,
                &uri,
                "user_b",
                Some(json!({ "title": "Mine now", "content": "hijack" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, authed(Method::DELETE, &uri, "user_b", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, fetched) = send(&state, authed(Method::GET, &uri, "user_a", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Launch");
        assert_eq!(fetched["platforms"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_post_update_replaces_platforms_and_publish_flow() {
        let state = failing_state();
        let (_, created) = send(
            &state,
            authed(
                Method::POST,
                "/api/posts",
                "user_a",
                Some(json!({
                    "title": "Launch",
                    "content": "We shipped",
                    "formattedContent": { "linkedin": "L", "twitter": "T" }
                })),
            ),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/api/posts/{id}");

        let (status, updated) = send(
            &state,
            authed(
                Method::PUT,
                &uri,
                "user_a",
                Some(json!({
                    "title": "Launch v2",
                    "content": "We shipped again",
                    "formattedContent": { "linkedin": "X" }
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let platforms = updated["platforms"].as_array().unwrap();
        assert_eq!(platforms.len(), 1);
        assert_eq!(platforms[0]["name"], "linkedin");
        assert_eq!(platforms[0]["content"], "X");

        let (status, pending) = send(
            &state,
            authed(
                Method::POST,
                &format!("/api/posts/{id}/platforms/linkedin/publish"),
                "user_a",
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending["status"], "pending");

        let (status, _) = send(
            &state,
            authed(
                Method::POST,
                &format!("/api/posts/{id}/platforms/facebook/publish"),
                "user_a",
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, published) = send(
            &state,
            authed(Method::POST, &format!("{uri}/publish"), "user_a", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(published["status"], "published");

        let (status, body) = send(&state, authed(Method::DELETE, &uri, "user_a", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
    }

    #[tokio::test]
    async fn test_create_post_requires_title_and_content() {
        let state = failing_state();
        let (status, body) = send(
            &state,
            authed(
                Method::POST,
                "/api/posts",
                "user_a",
                Some(json!({ "title": "Only a title" })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_ids_and_bodies_get_json_validation_errors() {
        let state = failing_state();

        let (status, body) = send(
            &state,
            authed(
                Method::POST,
                "/api/format",
                "user_a",
                Some(json!({ "content": "Hello", "templateId": "not-a-uuid" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        for uri in ["/api/posts/not-a-uuid", "/api/templates/42"] {
            let (status, body) = send(&state, authed(Method::GET, uri, "user_a", None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "uri: {uri}");
        }

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/posts")
            .header(header::AUTHORIZATION, format!("Bearer {}", session_token("user_a")))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_webhook_without_svix_headers_is_bad_request() {
        let state = failing_state();
        let request = Request::post("/api/webhooks/clerk")
            .header("svix-id", "msg_test")
            .body(Body::from("{}"))
            .unwrap();

        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_with_bad_signature_is_bad_request() {
        let state = failing_state();
        let body = r#"{"type":"user.created","data":{"id":"user_evil"}}"#;

        let (status, _) = send(&state, webhook(body, Some("v1,bm9wZQ==".to_string()))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.users.find_by_clerk_id("user_evil").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signed_webhooks_mirror_user_lifecycle() {
        let state = failing_state();

        let created = json!({
            "type": "user.created",
            "data": {
                "id": "user_hook",
                "email_addresses": [{ "email_address": "hook@example.com" }],
                "first_name": "Grace",
                "last_name": "Hopper"
            }
        })
        .to_string();
        let (status, body) = send(&state, webhook(&created, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
        let user = state.users.find_by_clerk_id("user_hook").await.unwrap().unwrap();
        assert_eq!(user.email, "hook@example.com");
        assert_eq!(user.name.as_deref(), Some("Grace Hopper"));

        let updated = json!({
            "type": "user.updated",
            "data": {
                "id": "user_hook",
                "email_addresses": [{ "email_address": "grace@example.com" }],
                "first_name": "Grace",
                "last_name": null
            }
        })
        .to_string();
        let (status, _) = send(&state, webhook(&updated, None)).await;
        assert_eq!(status, StatusCode::OK);
        let user = state.users.find_by_clerk_id("user_hook").await.unwrap().unwrap();
        assert_eq!(user.email, "grace@example.com");
        assert_eq!(user.name.as_deref(), Some("Grace"));

        let without_emails = json!({
            "type": "user.updated",
            "data": {
                "id": "user_hook",
                "email_addresses": [],
                "first_name": "Grace",
                "last_name": "Hopper"
            }
        })
        .to_string();
        let (status, _) = send(&state, webhook(&without_emails, None)).await;
        assert_eq!(status, StatusCode::OK);
        let user = state.users.find_by_clerk_id("user_hook").await.unwrap().unwrap();
        assert_eq!(user.email, "grace@example.com");
        assert_eq!(user.name.as_deref(), Some("Grace Hopper"));

        let ignored = json!({ "type": "session.created", "data": { "id": "sess_1" } }).to_string();
        let (status, _) = send(&state, webhook(&ignored, None)).await;
        assert_eq!(status, StatusCode::OK);

        let deleted =
            json!({ "type": "user.deleted", "data": { "id": "user_hook", "deleted": true } })
                .to_string();
        let (status, _) = send(&state, webhook(&deleted, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.users.find_by_clerk_id("user_hook").await.unwrap().is_none());
    }
}
