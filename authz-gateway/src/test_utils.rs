use crate::config::GatewayConfig;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Test fixture for driving the gateway against a mocked policy engine.
///
/// The fixture starts a wiremock server standing in for OPA, points the
/// gateway configuration at it and sends requests through the router
/// in-process.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///
///     fixture
///         .add_opa_mock(
///             Method::POST,
///             "/v1/data/example/authz",
///             json!({ "result": true }),
///             StatusCode::OK,
///             1,
///         )
///         .await;
///
///     let response = fixture.post("/view_document", &json!({"user": "alice"})).await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration the application was built with
    pub config: GatewayConfig,
    /// Application state, for calling the OPA client directly
    pub state: AppState,
    /// Mock server for OPA
    pub opa_mock: MockServer,
}

impl TestFixture {
    /// Creates a fixture with the default test configuration
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Creates a fixture whose test configuration is adjusted by `customize`
    /// before the application is built.
    pub async fn with_config(customize: impl FnOnce(&mut GatewayConfig)) -> Self {
        let opa_mock = MockServer::start().await;
        let mut config = GatewayConfig::for_test_with_mocks(&opa_mock);
        customize(&mut config);
        Self::build(config, opa_mock)
    }

    /// Creates a fixture from a complete configuration. The mock server is
    /// still started but only receives traffic if the configuration points at it.
    pub async fn with_gateway_config(config: GatewayConfig) -> Self {
        let opa_mock = MockServer::start().await;
        Self::build(config, opa_mock)
    }

    fn build(config: GatewayConfig, opa_mock: MockServer) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let state = AppState::for_testing(&config);
        let app = create_app(state.clone());

        Self {
            app,
            config,
            state,
            opa_mock,
        }
    }

    /// Initializes the test logger. Repeated calls are ignored.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Creates a request builder with a JSON content type
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
    }

    /// Sends a GET request to the specified URI.
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a JSON body to the specified URI.
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::POST, uri)
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a raw body and an optional content type.
    pub async fn post_raw(
        &self,
        uri: impl AsRef<str>,
        content_type: Option<&str>,
        body: impl Into<Body>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(Method::POST).uri(uri.as_ref());
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        let request = builder.body(body.into()).expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse { status, json }
    }

    /// Adds a mock OPA route with the given method, path, and JSON response.
    pub async fn add_opa_mock(
        &self,
        method: Method,
        path: impl Into<String>,
        response_body: impl Serialize,
        status_code: StatusCode,
        expected_calls: u64,
    ) {
        Mock::given(matchers::method(method.as_str()))
            .and(matchers::path(path.into()))
            .respond_with(ResponseTemplate::new(status_code.as_u16()).set_body_json(response_body))
            .expect(expected_calls)
            .mount(&self.opa_mock)
            .await;
    }

    /// Adds a mock OPA decision route answering with a raw (not necessarily JSON) body.
    pub async fn add_opa_mock_raw(
        &self,
        path: impl Into<String>,
        response_body: &str,
        status_code: StatusCode,
    ) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path(path.into()))
            .respond_with(
                ResponseTemplate::new(status_code.as_u16()).set_body_string(response_body),
            )
            .expect(1)
            .mount(&self.opa_mock)
            .await;
    }

    /// Adds a mock OPA decision route that answers only after `delay`.
    pub async fn add_delayed_opa_mock(
        &self,
        path: impl Into<String>,
        response_body: impl Serialize,
        delay: Duration,
    ) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path(path.into()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(response_body)
                    .set_delay(delay),
            )
            .mount(&self.opa_mock)
            .await;
    }

    /// Adds a mock on the configured policy path that only matches the exact `input` document.
    pub async fn add_opa_mock_for_input(&self, input: Value, response_body: impl Serialize) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path(self.config.opa.policy_path.clone()))
            .and(matchers::body_json(serde_json::json!({ "input": input })))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .expect(1)
            .mount(&self.opa_mock)
            .await;
    }

    /// The `input` documents OPA received on the policy path, in arrival order.
    pub async fn received_opa_inputs(&self) -> Vec<Value> {
        self.opa_mock
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == self.config.opa.policy_path)
            .map(|request| {
                let body: Value = request
                    .body_json()
                    .expect("OPA received a non-JSON request body");
                body["input"].clone()
            })
            .collect()
    }
}

/// Response from a test request that provides convenient access to status and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Converts the response body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
