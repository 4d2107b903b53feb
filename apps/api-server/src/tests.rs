//! End-to-end tests over the HTTP surface with in-process fakes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actix_web::{App, http::StatusCode, test};
use async_trait::async_trait;
use serde_json::{Value, json};

use folio_core::domain::{FailurePolicy, Prompt};
use folio_core::ports::{
    CompletionError, CompletionProvider, Quota, RateLimitError, RateLimitResult, RateLimiter,
};
use folio_core::services::{AdmissionConfig, ChatSettings};
use folio_infra::InMemoryRateLimiter;
use folio_shared::headers::{RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING, RATE_LIMIT_RESET, REQUEST_ID};

use crate::handlers::configure_routes;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

#[derive(Clone, Copy)]
enum Behaviour {
    Echo,
    Throttled,
    Broken,
}

struct FakeProvider {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl FakeProvider {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Echo => Ok(format!("echo: {}", prompt.as_str())),
            Behaviour::Throttled => Err(CompletionError::RateLimited {
                retry_after: Some(Duration::from_secs(9)),
            }),
            Behaviour::Broken => Err(CompletionError::Upstream {
                status: 500,
                message: "model exploded at /srv/secret/path".to_string(),
            }),
        }
    }
}

struct UnreachableStore;

#[async_trait]
impl RateLimiter for UnreachableStore {
    async fn check(&self, _key: &str, _quota: Quota) -> Result<RateLimitResult, RateLimitError> {
        Err(RateLimitError::Timeout)
    }

    fn backend(&self) -> &'static str {
        "unreachable"
    }
}

fn state_with(
    limiter: Arc<dyn RateLimiter>,
    provider: Arc<FakeProvider>,
    policy: FailurePolicy,
) -> AppState {
    AppState::from_parts(
        limiter,
        provider,
        AdmissionConfig {
            quota: Quota::new(5, Duration::from_secs(30)),
            failure_policy: policy,
            ..AdmissionConfig::default()
        },
        ChatSettings {
            context: "ctx".to_string(),
            max_message_chars: 100,
        },
    )
}

fn chat_request(forwarded_for: Option<&str>, message: &str) -> test::TestRequest {
    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({ "message": message }));
    match forwarded_for {
        Some(address) => req.insert_header(("X-Forwarded-For", address)),
        None => req,
    }
}

fn header_i64(resp: &actix_web::dev::ServiceResponse, name: &str) -> i64 {
    resp.headers()
        .get(name)
        .unwrap_or_else(|| panic!("missing header {name}"))
        .to_str()
        .unwrap()
        .parse()
        .unwrap()
}

#[actix_rt::test]
async fn test_sixth_request_in_window_is_denied() {
    let provider = FakeProvider::new(Behaviour::Echo);
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        provider.clone(),
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    for expected_remaining in (0..5).rev() {
        let resp = test::call_service(&app, chat_request(Some("1.2.3.4"), "hi").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header_i64(&resp, RATE_LIMIT_LIMIT), 5);
        assert_eq!(header_i64(&resp, RATE_LIMIT_REMAINING), expected_remaining);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "reply": "echo: Context:ctx\nUser question: hi\n" }));
    }

    let now_ms = chrono::Utc::now().timestamp_millis();
    let resp = test::call_service(&app, chat_request(Some("1.2.3.4"), "hi").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header_i64(&resp, RATE_LIMIT_LIMIT), 5);
    assert_eq!(header_i64(&resp, RATE_LIMIT_REMAINING), 0);

    let reset = header_i64(&resp, RATE_LIMIT_RESET);
    assert!(reset > now_ms - 1_000);
    assert!(reset <= now_ms + 30_000);

    let retry_after = header_i64(&resp, "retry-after");
    assert!((1..=30).contains(&retry_after));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Too many requests. Please wait a moment." }));

    // The denied request never reached the provider
    assert_eq!(provider.calls(), 5);
}

#[actix_rt::test]
async fn test_other_clients_are_unaffected() {
    let provider = FakeProvider::new(Behaviour::Echo);
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        provider,
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    for _ in 0..6 {
        test::call_service(&app, chat_request(Some("1.2.3.4"), "hi").to_request()).await;
    }

    let resp = test::call_service(
        &app,
        chat_request(Some("10.0.0.1, 5.6.7.8"), "hi").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_i64(&resp, RATE_LIMIT_REMAINING), 4);
}

#[actix_rt::test]
async fn test_rotating_forwarded_prefix_is_still_denied() {
    let provider = FakeProvider::new(Behaviour::Echo);
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        provider.clone(),
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    // The caller controls everything left of the address the edge proxy appended
    for i in 0..5 {
        let forwarded = format!("10.9.0.{i}, 1.2.3.4");
        let resp = test::call_service(&app, chat_request(Some(&forwarded), "hi").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = test::call_service(
        &app,
        chat_request(Some("10.9.0.42, 1.2.3.4"), "hi").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(provider.calls(), 5);
}

#[actix_rt::test]
async fn test_missing_forwarded_header_shares_loopback_bucket() {
    let provider = FakeProvider::new(Behaviour::Echo);
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        provider,
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    for _ in 0..5 {
        let resp = test::call_service(&app, chat_request(None, "hi").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = test::call_service(&app, chat_request(Some("127.0.0.1"), "hi").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_rt::test]
async fn test_provider_throttling_is_a_denial_not_an_error() {
    let provider = FakeProvider::new(Behaviour::Throttled);
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        provider,
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    let resp = test::call_service(&app, chat_request(Some("1.2.3.4"), "hi").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    // Provider metadata wins over the local admission's
    assert_eq!(header_i64(&resp, RATE_LIMIT_REMAINING), 0);
    assert_eq!(header_i64(&resp, "retry-after"), 9);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Too many requests. Please wait a moment." }));
}

#[actix_rt::test]
async fn test_provider_failure_is_generic_500() {
    let provider = FakeProvider::new(Behaviour::Broken);
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        provider,
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    let resp = test::call_service(&app, chat_request(Some("1.2.3.4"), "hi").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Error" }));
}

#[actix_rt::test]
async fn test_store_outage_fails_open_to_provider() {
    let provider = FakeProvider::new(Behaviour::Echo);
    let state = state_with(Arc::new(UnreachableStore), provider.clone(), FailurePolicy::Open);
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    let resp = test::call_service(&app, chat_request(Some("1.2.3.4"), "hi").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(provider.calls(), 1);
}

#[actix_rt::test]
async fn test_store_outage_fails_closed_when_configured() {
    let provider = FakeProvider::new(Behaviour::Echo);
    let state = state_with(
        Arc::new(UnreachableStore),
        provider.clone(),
        FailurePolicy::Closed,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    let resp = test::call_service(&app, chat_request(Some("1.2.3.4"), "hi").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header_i64(&resp, RATE_LIMIT_REMAINING), 0);
    assert_eq!(provider.calls(), 0);
}

#[actix_rt::test]
async fn test_invalid_bodies_are_bad_requests() {
    let provider = FakeProvider::new(Behaviour::Echo);
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        provider.clone(),
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Invalid request body" }));

    let resp = test::call_service(&app, chat_request(Some("1.2.3.4"), "   ").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Message must not be empty" }));

    assert_eq!(provider.calls(), 0);
}

#[actix_rt::test]
async fn test_health_reports_limiter_backend() {
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        FakeProvider::new(Behaviour::Echo),
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["rate_limiter"], "memory");
}

#[actix_rt::test]
async fn test_request_id_is_echoed_or_generated() {
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        FakeProvider::new(Behaviour::Echo),
        FailurePolicy::Open,
    );
    let app = test::init_service(
        App::new()
            .wrap(RequestIdMiddleware)
            .configure(configure_routes(state)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("X-Request-ID", "trace-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get(REQUEST_ID).unwrap(), "trace-123");

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    let generated = resp.headers().get(REQUEST_ID).unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[actix_rt::test]
async fn test_unknown_api_route_is_json_404() {
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        FakeProvider::new(Behaviour::Echo),
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    let req = test::TestRequest::get().uri("/api/projects").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[actix_rt::test]
async fn test_wrong_method_on_chat_is_json_405() {
    let provider = FakeProvider::new(Behaviour::Echo);
    let state = state_with(
        Arc::new(InMemoryRateLimiter::new()),
        provider.clone(),
        FailurePolicy::Open,
    );
    let app = test::init_service(App::new().configure(configure_routes(state))).await;

    let req = test::TestRequest::get().uri("/api/chat").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers().get("allow").unwrap(), "POST");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Method not allowed" }));
    assert_eq!(provider.calls(), 0);
}
