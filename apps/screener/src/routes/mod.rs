pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::engagement::handlers as engagement;
use crate::registry::handlers as files;
use crate::screening::handlers as screening;
use crate::state::AppState;

/// Resumes are uploaded through the console before they reach the service.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Files
        .route(
            "/api/v1/files",
            get(files::handle_list_files).post(files::handle_add_files),
        )
        .route("/api/v1/files/:id", delete(files::handle_remove_file))
        .route(
            "/api/v1/files/retry-failed",
            post(files::handle_retry_failed),
        )
        // Screening
        .route(
            "/api/v1/job",
            get(screening::handle_get_job).put(screening::handle_set_job),
        )
        .route("/api/v1/analyze", post(screening::handle_analyze))
        .route("/api/v1/results", get(screening::handle_get_results))
        .route(
            "/api/v1/render/:key/retry",
            post(screening::handle_retry_render),
        )
        // Engagement
        .route("/api/v1/engage", post(engagement::handle_engage))
        .route(
            "/api/v1/engagement",
            get(engagement::handle_get_engagement),
        )
        .route(
            "/api/v1/engagement/tab",
            put(engagement::handle_select_tab),
        )
        .route(
            "/api/v1/engagement/clipboard",
            get(engagement::handle_clipboard),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::service_client::fake::FakeService;
    use crate::session::Session;

    const BOUNDARY: &str = "screener-test-boundary";

    fn app(service: FakeService) -> Router {
        build_router(AppState {
            session: Arc::new(Session::new()),
            service: Arc::new(service),
            config: Config {
                screening_api_url: "http://screening.test".to_string(),
                request_timeout: Duration::from_secs(5),
                port: 0,
                rust_log: "debug".to_string(),
            },
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn upload_request(names: &[&str]) -> Request<Body> {
        let mut body = String::new();
        for name in names {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn job_body() -> Value {
        json!({
            "title": "Backend Engineer",
            "description": "Rust services",
            "company": "Acme"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(FakeService::new()), empty_request(Method::GET, "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_without_job_is_400() {
        let app = app(FakeService::new());
        send(&app, upload_request(&["a.pdf"])).await;

        let (status, body) = send(&app, empty_request(Method::POST, "/api/v1/analyze")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_list_and_remove() {
        let app = app(FakeService::new());

        let (status, body) = send(&app, upload_request(&["a.pdf", "b.pdf"])).await;
        assert_eq!(status, StatusCode::CREATED);
        let first = body["added"][0].as_str().unwrap().to_string();

        let (_, listed) = send(&app, empty_request(Method::GET, "/api/v1/files")).await;
        assert_eq!(listed["files"].as_array().unwrap().len(), 2);
        assert_eq!(listed["files"][0]["status"], "pending");
        assert_eq!(listed["files"][0]["name"], "a.pdf");

        let (status, _) = send(
            &app,
            empty_request(Method::DELETE, &format!("/api/v1/files/{first}")),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &app,
            empty_request(Method::DELETE, &format!("/api/v1/files/{first}")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_screen_and_engage_flow() {
        let app = app(FakeService::new().fail_upload("b.pdf"));
        send(&app, upload_request(&["a.pdf", "b.pdf"])).await;
        let (status, _) = send(&app, json_request(Method::PUT, "/api/v1/job", job_body())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, summary) = send(&app, empty_request(Method::POST, "/api/v1/analyze")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["upload_failed"], 1);
        assert_eq!(summary["results"].as_array().unwrap().len(), 1);
        assert_eq!(summary["results"][0]["recommendation"], "Recommended");
        let result_id = summary["results"][0]["id"].as_str().unwrap().to_string();

        let (_, results) = send(&app, empty_request(Method::GET, "/api/v1/results")).await;
        assert_eq!(results["cards"][0]["state"], "ok");
        assert_eq!(results["cards"][0]["view"]["badge"], "moderate");

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/engage",
                json!({"result_id": result_id, "recruiter_name": ""}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, view) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/engage",
                json!({"result_id": result_id, "recruiter_name": "Grace"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["view"]["tab"], "default");
        assert_eq!(view["view"]["is_acceptance_default"], true);

        let (status, view) = send(
            &app,
            json_request(Method::PUT, "/api/v1/engagement/tab", json!({"tab": "rejection"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(view["view"]["active"]["subject"]
            .as_str()
            .unwrap()
            .starts_with("Rejection"));

        let (_, clipboard) = send(
            &app,
            empty_request(Method::GET, "/api/v1/engagement/clipboard"),
        )
        .await;
        assert!(clipboard["text"].as_str().unwrap().contains("LinkedIn Message:"));
    }

    #[tokio::test]
    async fn test_engagement_before_generation_is_404() {
        let (status, body) = send(
            &app(FakeService::new()),
            empty_request(Method::GET, "/api/v1/engagement"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
