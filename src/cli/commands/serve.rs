//! HTTP API server.
//!
//! `GET /ask?query=...&format=text|json` runs one generation per request.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VerhaalError;
use crate::orchestrator::Orchestrator;
use crate::story::OutputFormat;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

const USAGE: &str = "Verhaal: short Dutch stories for language learners.

GET /ask?query=<request>&format=<text|json>
    query   what the story should be about, e.g.
            \"Tell me a simple story about a football match in Dutch. I am a beginner learner.\"
    format  text (default) or json
GET /health
";

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let spinner = Output::spinner("Connecting to vocabulary store...");
    let orchestrator = Orchestrator::new(&settings).await;
    spinner.finish_and_clear();
    let orchestrator = orchestrator?;

    let app = router(orchestrator, Duration::from_secs(settings.server.request_timeout_secs));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Verhaal API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Usage", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Story", "GET  /ask?query=...&format=text|json");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with CORS and a whole-request timeout that answers 504.
pub fn router(orchestrator: Orchestrator, request_timeout: Duration) -> Router {
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(usage))
        .route("/health", get(health))
        .route("/ask", get(ask))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            request_timeout,
        ))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskParams {
    query: Option<String>,
    format: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

/// HTTP status for a failed generation.
fn status_for(error: &VerhaalError) -> StatusCode {
    match error {
        VerhaalError::Validation(_) => StatusCode::BAD_REQUEST,
        e if e.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn usage() -> &'static str {
    USAGE
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(State(state): State<Arc<AppState>>, Query(params): Query<AskParams>) -> Response {
    let Some(query) = params.query.filter(|q| !q.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required parameter: query");
    };

    let format = match params.format.as_deref() {
        None => OutputFormat::default(),
        Some(f) => match f.parse::<OutputFormat>() {
            Ok(format) => format,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
        },
    };

    info!("Story request ({:?}): {}", format, query);

    match state.orchestrator.generate_formatted(&query, format).await {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, output.content_type())],
            output.body,
        )
            .into_response(),
        Err(e) => {
            let status = status_for(&e);
            warn!("Story request failed with {}: {}", status, e);
            error_response(status, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_support::ScriptedModel;
    use crate::agent::{ChatModel, ChatTurn};
    use crate::config::Prompts;
    use crate::retrieval::test_support::LetterEmbedder;
    use crate::vector_store::MemoryVectorStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use async_trait::async_trait;
    use tower::ServiceExt;

    const STORY: &str = r#"{
        "dutch_sentences": ["Het is zaterdag", "Tom gaat naar de wedstrijd", "Hij ziet de bal", "De keeper springt", "Iedereen juicht"],
        "english_translations": ["It is Saturday", "Tom goes to the match", "He sees the ball", "The goalkeeper jumps", "Everyone cheers"]
    }"#;

    /// Answers only after the router has given up.
    struct SlowModel;

    #[async_trait]
    impl ChatModel for SlowModel {
        async fn complete(&self, _turns: &[ChatTurn], _json_mode: bool) -> crate::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(STORY.to_string())
        }
    }

    fn app_with(model: Arc<dyn ChatModel>, request_timeout: Duration) -> Router {
        let orchestrator = Orchestrator::with_components(
            &Settings::default(),
            Prompts::default(),
            model,
            Arc::new(LetterEmbedder { fail: false }),
            Arc::new(MemoryVectorStore::new()),
            None,
        );
        router(orchestrator, request_timeout)
    }

    fn app(replies: &[&str]) -> Router {
        app_with(Arc::new(ScriptedModel::replying(replies)), Duration::from_secs(5))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_and_usage() {
        let (status, _, body) = get(app(&[]), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);

        let (status, _, body) = get(app(&[]), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/ask?query="));
    }

    #[tokio::test]
    async fn test_missing_or_blank_query_is_bad_request() {
        for uri in ["/ask", "/ask?query=", "/ask?query=%20%20&format=json"] {
            let (status, content_type, body) = get(app(&[]), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
            assert_eq!(content_type, "application/json");
            assert!(body.contains("query"));
        }
    }

    #[tokio::test]
    async fn test_unknown_format_is_bad_request() {
        let (status, _, body) = get(app(&[]), "/ask?query=about%20cats&format=xml").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Unknown format"));
    }

    #[tokio::test]
    async fn test_query_without_topic_is_bad_request() {
        let (status, _, body) = get(app(&[]), "/ask?query=about%20.").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with(r#"{"error":"Invalid request"#));
    }

    #[tokio::test]
    async fn test_text_story() {
        // Empty store: one supplement call (no pairs), then the writer.
        let (status, content_type, body) =
            get(app(&["nothing", STORY]), "/ask?query=A%20story%20about%20football").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/plain; charset=utf-8");
        assert!(body.starts_with("**Dutch Paragraph (5 sentences):**\nHet is zaterdag."));
        assert!(body.contains("**English Translation:**\nIt is Saturday."));
    }

    #[tokio::test]
    async fn test_json_story() {
        let (status, content_type, body) = get(
            app(&["nothing", STORY]),
            "/ask?query=An%20advanced%20story%20about%20football&format=json",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["topic"], "football");
        assert_eq!(value["level"], "advanced");
        assert_eq!(value["english_translations"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_generation_failure_is_bad_gateway() {
        let (status, _, body) = get(app(&["nothing"]), "/ask?query=about%20football").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("Generation failed"));
    }

    #[tokio::test]
    async fn test_slow_upstream_is_gateway_timeout() {
        let app = app_with(Arc::new(SlowModel), Duration::from_millis(100));
        let (status, _, _) = get(app, "/ask?query=about%20football").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&VerhaalError::Validation("no topic".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&VerhaalError::Retrieval("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&VerhaalError::Config("bad".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
