//! Server router definition.
//!
//! The following routes are supported:
//!
//! - GET: `/health`
//! - POST: `/from-docker-hub`
//! - POST: `/from-heroku`

use crate::{
    config::{Config, Source},
    docker_hub, error::Failure, heroku, slack,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use axum_extra::{headers, TypedHeader};
use std::sync::Arc;
use tower_http::trace::{self, TraceLayer};
use tracing::{error, warn, Level};

/// Dependencies shared by routes across requests. Both fields are read-only;
/// the client is cloned per request and shares its connection pool.
#[derive(Clone)]
pub struct Deps {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

/// Instantiate a new router with tracing.
pub fn new(deps: Deps) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
        .on_response(trace::DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/from-docker-hub", post(docker_hub_handler))
        .route("/from-heroku", post(heroku_handler))
        .layer(trace_layer)
        // Exclude the health check route from tracing.
        .route("/health", get(|| async { StatusCode::OK }))
        .with_state(deps)
}

/// Handler for the POST route `/from-docker-hub`.
///
/// Accepts a [docker_hub::PushPayload] in `application/json` format and
/// relays it to the webhook target resolved for [Source::DockerHub].
async fn docker_hub_handler(
    State(deps): State<Deps>,
    TypedHeader(content_type): TypedHeader<headers::ContentType>,
    body: Bytes,
) -> Result<(StatusCode, String), (StatusCode, String)> {
    require_json(&content_type)?;

    let payload = decode::<docker_hub::PushPayload>(&body)?;

    relay(&deps, Source::DockerHub, &payload.notification()).await
}

/// Handler for the POST route `/from-heroku`.
///
/// When a webhook secret is configured, a `Heroku-Webhook-Hmac-SHA256` header
/// containing the HMAC SHA256 signature of the request body must be present.
///
/// Accepts a [heroku::HookPayload] in `application/json` format and relays it
/// to the webhook target resolved for [Source::Heroku].
async fn heroku_handler(
    State(deps): State<Deps>,
    TypedHeader(content_type): TypedHeader<headers::ContentType>,
    headers: HeaderMap,
    // We can't parse this straight away as we need to compare signatures.
    body: Bytes,
) -> Result<(StatusCode, String), (StatusCode, String)> {
    require_json(&content_type)?;

    if let Some(secret) = &deps.config.heroku_secret {
        heroku::auth::verify(secret, &body, &headers).map_err(|e| {
            let msg = match e {
                heroku::auth::SignatureError::Missing => "Missing webhook signature",
                heroku::auth::SignatureError::Mismatch => "Invalid webhook signature",
            };
            warn!(msg);

            (StatusCode::UNAUTHORIZED, String::new())
        })?;
    }

    let payload = decode::<heroku::HookPayload>(&body)?;

    relay(&deps, Source::Heroku, &payload.notification()).await
}

fn require_json(content_type: &headers::ContentType) -> Result<(), (StatusCode, String)> {
    if *content_type == headers::ContentType::json() {
        Ok(())
    } else {
        Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            String::from("Requests must have `Content-Type: application/json`"),
        ))
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, (StatusCode, String)> {
    serde_json::from_slice(body).map_err(|e| {
        let msg = format!("Failed to deserialize payload: {}", e);
        warn!(msg);

        (StatusCode::UNPROCESSABLE_ENTITY, msg)
    })
}

/// Resolve the webhook target for a source and deliver the notification,
/// mirroring Slack's response back to our own caller.
async fn relay(
    deps: &Deps,
    source: Source,
    notif: &slack::Notification,
) -> Result<(StatusCode, String), (StatusCode, String)> {
    let target = deps
        .config
        .targets
        .resolve(source)
        .ok_or_else(|| handle_failure(&Failure::NoWebhookUrl(source)))?;

    let delivery = slack::deliver(&deps.http, target, notif)
        .await
        .map_err(|e| handle_failure(&e))?;

    // Slack's status arrives via a different `http` crate version than the
    // one axum responds with.
    let status = StatusCode::from_u16(delivery.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Ok((status, delivery.body))
}

fn handle_failure(e: &Failure) -> (StatusCode, String) {
    let es = e.to_string();

    error!(es);
    (StatusCode::INTERNAL_SERVER_ERROR, es)
}




#[cfg(test)]
mod tests_heroku {
    use super::{test_helpers::*, *};
    use crate::config::WebhookTargets;
    use crate::heroku::auth::{HerokuSecret, SIGNATURE_HEADER};
    use axum::{body::Body, http::Request};
    use mockito::Matcher;
    use serde_json::json;
    use tower::ServiceExt;

    // Signed test requests must use these bodies byte for byte.
    const BODY_PLAIN: &str =
        r#"{"action":"release","resource":"web","data":{"app":{"name":"myapp"},"status":"succeeded"}}"#;
    const BODY_WITH_STREAM: &str = r#"{"action":"release","resource":"web","data":{"app":{"name":"myapp"},"status":"succeeded","output_stream_url":"https://output.heroku.com/streams/abc123"}}"#;

    const SECRET: &str = "super secret";
    const BODY_PLAIN_SIG: &str = "FP+1zZbHgNlZpwdN9q/GSvtRKOcteaLncObriT+dG5M=";
    const BODY_WITH_STREAM_SIG: &str = "rKnsCOUKO6q9zH40nI5n73FgLFiLwA4Y+C/Tc4GxJ9o=";

    async fn server() -> mockito::ServerGuard {
        mockito::Server::new_async().await
    }

    fn signed(body: &str, sig: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/from-heroku")
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, sig)
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_without_stream_url() {
        let mut srv = server().await;

        let hook_mock = srv
            .mock("POST", "/hooks/default")
            .match_header("content-type", "application/json; charset=utf-8")
            .match_body(Matcher::Json(json!({
                "text": "myapp releases web: succeeded",
                "username": "Heroku",
                "icon_emoji": null,
            })))
            .with_body("ok")
            .create_async()
            .await;

        let targets = WebhookTargets {
            default: Some(target(&srv, "/hooks/default")),
            ..Default::default()
        };

        let res = router(targets, None)
            .oneshot(post_json("/from-heroku", BODY_PLAIN))
            .await
            .unwrap();

        hook_mock.assert_async().await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(plaintext_body(res.into_body()).await, "ok");
    }

    #[tokio::test]
    async fn test_success_with_stream_url() {
        let mut srv = server().await;

        let hook_mock = srv
            .mock("POST", "/hooks/default")
            .match_body(Matcher::Json(json!({
                "text": "myapp releases web: succeeded\nhttps://output.heroku.com/streams/abc123",
                "username": "Heroku",
                "icon_emoji": null,
            })))
            .with_body("ok")
            .create_async()
            .await;

        let targets = WebhookTargets {
            default: Some(target(&srv, "/hooks/default")),
            ..Default::default()
        };

        let res = router(targets, None)
            .oneshot(post_json("/from-heroku", BODY_WITH_STREAM))
            .await
            .unwrap();

        hook_mock.assert_async().await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_valid_signature() {
        let mut srv = server().await;

        let hook_mock = srv
            .mock("POST", "/hooks/default")
            .with_body("ok")
            .create_async()
            .await;

        let targets = WebhookTargets {
            default: Some(target(&srv, "/hooks/default")),
            ..Default::default()
        };

        let res = router(targets, Some(HerokuSecret(SECRET.into())))
            .oneshot(signed(BODY_WITH_STREAM, BODY_WITH_STREAM_SIG))
            .await
            .unwrap();

        hook_mock.assert_async().await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_signature() {
        let mut srv = server().await;

        let hook_mock = srv
            .mock("POST", "/hooks/default")
            .expect(0)
            .create_async()
            .await;

        let targets = WebhookTargets {
            default: Some(target(&srv, "/hooks/default")),
            ..Default::default()
        };

        let res = router(targets, Some(HerokuSecret(SECRET.into())))
            .oneshot(post_json("/from-heroku", BODY_PLAIN))
            .await
            .unwrap();

        hook_mock.assert_async().await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(plaintext_body(res.into_body()).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_signature() {
        let targets = WebhookTargets::default();

        // A signature valid for a different body must not authenticate this
        // one.
        let res = router(targets, Some(HerokuSecret(SECRET.into())))
            .oneshot(signed(BODY_PLAIN, BODY_WITH_STREAM_SIG))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unconfigured_target() {
        let res = router(WebhookTargets::default(), None)
            .oneshot(post_json("/from-heroku", BODY_PLAIN))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            plaintext_body(res.into_body()).await,
            "No webhook URL configured for Heroku"
        );
    }
}
