use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use abacus_web::client::ApiClient;
use abacus_web::config::WebConfig;
use abacus_web::routes;
use abacus_web::state::AppState;

/// An address nothing listens on.
pub const UNREACHABLE_API_URL: &str = "http://127.0.0.1:1";

/// Serve the real backend router on an ephemeral loopback port and return
/// its base URL.
pub async fn spawn_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = abacus_api::routes::app(&abacus_api::config::ServerConfig::default());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

/// Build the frontend router pointed at `api_url`.
pub fn build_test_app(api_url: &str, degraded_reason: Option<&str>) -> Router {
    let config = WebConfig {
        api_url: api_url.to_string(),
        request_timeout_secs: 5,
        degraded_reason: degraded_reason.map(str::to_string),
        ..Default::default()
    };

    let api = ApiClient::new(api_url, Duration::from_secs(5)).unwrap();

    routes::app(AppState {
        config: Arc::new(config),
        api: Arc::new(api),
    })
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Submit an urlencoded form body.
pub async fn post_form(app: Router, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();

    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
