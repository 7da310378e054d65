use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, Request as HttpRequest, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use clap::Parser;
use opentelemetry::global as otel_global;
use opentelemetry::trace::{TraceContextExt as _, TracerProvider as _};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::prelude::*;

use ai_stack_monitor::auth::BasicCredentials;
use ai_stack_monitor::config::{ServiceRegistry, Settings};
use ai_stack_monitor::docker::{ContainerRuntime, DockerRuntime, RuntimeError};
use ai_stack_monitor::error::ApiError;
use ai_stack_monitor::metrics;
use ai_stack_monitor::monitor::{MonitorHandle, ServiceMonitor};

#[derive(Parser)]
#[command(name = "ai-stack-monitor")]
#[command(about = "AI Stack health and resource monitor")]
struct Cli {
    /// Host interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,
    /// Path to the monitor settings file
    #[arg(long, default_value = "config/monitor.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config).await?;
    let registry = ServiceRegistry::load();

    info!("🚀 Starting AI Stack monitor");
    info!("📊 Monitoring {} services", registry.len());

    let runtime: Arc<dyn ContainerRuntime> =
        Arc::new(DockerRuntime::connect(&settings.monitoring.docker_socket));

    let monitor = ServiceMonitor::new(settings, registry, runtime);
    // Seed placeholder upstream fragments before the first pass so nginx can
    // start even when every backend is down.
    monitor.reconciler().seed_default_upstreams();
    let handle = monitor.start();

    let credentials = BasicCredentials::resolve().map(Arc::new);
    if credentials.is_some() {
        info!("🔒 Dashboard basic auth enabled");
    }

    let state = AppState {
        monitor: handle,
        credentials,
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;

    info!("🌐 Monitor listening on http://{}", addr);
    info!("📈 Prometheus metrics: http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    monitor: MonitorHandle,
    credentials: Option<Arc<BasicCredentials>>,
}

fn build_router(state: AppState) -> Router {
    let views = Router::new()
        .route("/", get(dashboard_view))
        .route("/logs/{service}", get(logs_view))
        .route("/resources", get(resources_view))
        .route("/alerts", get(alerts_view))
        .route("/trends", get(trends_view))
        .layer(middleware::from_fn_with_state(state.clone(), require_basic_auth));

    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/status", get(api_status))
        .route("/api/logs/{service}", get(api_logs))
        .route("/api/resources", get(api_resources))
        .route("/api/alerts", get(api_alerts))
        .route("/api/trends", get(api_trends))
        .route("/api/services", get(api_services))
        .route("/api/restart/{service}", post(api_restart));

    views
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(http_metrics_middleware))
                .layer(middleware::from_fn(security_headers_middleware)),
        )
        .with_state(state)
}

// ---------- Views ----------

async fn dashboard_view() -> Html<&'static str> {
    Html(include_str!("../templates/dashboard.html"))
}

async fn logs_view() -> Html<&'static str> {
    Html(include_str!("../templates/logs.html"))
}

async fn resources_view() -> Html<&'static str> {
    Html(include_str!("../templates/resources.html"))
}

async fn alerts_view() -> Html<&'static str> {
    Html(include_str!("../templates/alerts.html"))
}

async fn trends_view() -> Html<&'static str> {
    Html(include_str!("../templates/trends.html"))
}

// ---------- API ----------

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "ai-stack-monitor",
        "timestamp": chrono::Utc::now()
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    // Pull-side sampling: refresh system and container gauges inline before
    // encoding, on top of the periodic push from the scheduler.
    state.monitor.refresh_scrape_metrics().await;
    metrics::render()
}

async fn api_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let statuses = state.monitor.current_statuses().await;
    let mut services = serde_json::Map::new();
    for (service, outcome) in statuses {
        let mut entry = serde_json::to_value(&outcome).unwrap_or_default();
        if let Some(object) = entry.as_object_mut() {
            object.insert("name".to_string(), json!(service.name));
        }
        services.insert(service.key, entry);
    }
    Json(json!({ "services": services }))
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    level: Option<String>,
    search: Option<String>,
    lines: Option<usize>,
}

async fn api_logs(
    Path(service): Path<String>,
    Query(params): Query<LogsQuery>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.monitor.registry().get(&service).is_none() {
        return Err(ApiError::ServiceNotFound);
    }

    let lines = params.lines.unwrap_or(50);
    let level = params.level.unwrap_or_else(|| "all".to_string());
    let search = params.search.unwrap_or_default();

    let logs = match state.monitor.runtime().fetch_logs(&service, lines, None).await {
        Ok(logs) => logs,
        Err(RuntimeError::NotFound(name)) => vec![format!("Container '{name}' not found")],
        Err(err) => return Err(err.into()),
    };

    Ok(Json(json!({ "logs": filter_logs(logs, &level, search.trim()) })))
}

/// Level filtering first (token containment, case-insensitive), then
/// substring search.
fn filter_logs(lines: Vec<String>, level: &str, search: &str) -> Vec<String> {
    let level_token = level.to_uppercase();
    let search_lower = search.to_lowercase();
    lines
        .into_iter()
        .filter(|line| level.eq_ignore_ascii_case("all") || line.to_uppercase().contains(&level_token))
        .filter(|line| search_lower.is_empty() || line.to_lowercase().contains(&search_lower))
        .collect()
}

async fn api_resources(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut resources = serde_json::Map::new();
    for (service, stats) in state.monitor.resources().await {
        let mut entry = serde_json::to_value(&stats).unwrap_or_default();
        if let Some(object) = entry.as_object_mut() {
            object.insert("name".to_string(), json!(service.name));
        }
        resources.insert(service.key, entry);
    }
    Json(json!({ "resources": resources }))
}

async fn api_alerts(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "alerts": state.monitor.alerts().await }))
}

async fn api_trends(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.monitor.trends())
}

async fn api_services(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let containers = state.monitor.runtime().list_containers(None).await?;
    let services: Vec<serde_json::Value> = containers
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "name": c.name,
                "status": c.status,
                "image": c.image,
            })
        })
        .collect();
    Ok(Json(json!(services)))
}

async fn api_restart(
    Path(service): Path<String>,
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req_id = get_or_make_request_id(&headers);
    let parent_ctx = extract_traceparent(&headers);
    let span = tracing::info_span!("restart_service", %service, %req_id);
    if let Some(ctx) = &parent_ctx {
        span.set_parent(ctx.clone());
    }

    async move {
        if state.monitor.registry().get(&service).is_none() {
            return Err(ApiError::ServiceNotFound);
        }
        state.monitor.runtime().restart(&service).await?;
        tracing::info!("container restarted");
        Ok(Json(json!({ "status": "success", "service": service })))
    }
    .instrument(span)
    .await
}

// ---------- Middleware ----------

async fn http_metrics_middleware(
    req: HttpRequest<Body>,
    next: middleware::Next,
) -> Result<Response, StatusCode> {
    let method = req.method().to_string();
    let raw_path = req.uri().path().to_string();
    let start = Instant::now();
    let resp = next.run(req).await;
    let status = resp.status().as_u16();
    // Prefer the matched route pattern to keep label cardinality bounded.
    let endpoint = resp
        .extensions()
        .get::<axum::extract::MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or(raw_path);
    metrics::record_http_request(&method, &endpoint, status);
    metrics::observe_http_request_duration(&method, &endpoint, start.elapsed().as_secs_f64());
    Ok(resp)
}

async fn security_headers_middleware(req: HttpRequest<Body>, next: middleware::Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    headers.insert("X-Frame-Options", HeaderValue::from_static("SAMEORIGIN"));
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    resp
}

async fn require_basic_auth(
    State(state): State<AppState>,
    req: HttpRequest<Body>,
    next: middleware::Next,
) -> Response {
    if let Some(credentials) = &state.credentials {
        let header = req
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if !credentials.check_header(header) {
            return Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .header("WWW-Authenticate", "Basic realm=\"Monitoring Dashboard\"")
                .body(Body::from("Authentication required"))
                .unwrap_or_else(|_| StatusCode::UNAUTHORIZED.into_response());
        }
    }
    next.run(req).await
}

// ---------- Startup plumbing ----------

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, EnvFilter, Registry};
    let json = matches!(std::env::var("AI_STACK_JSON_LOG").as_deref(), Ok("1") | Ok("true"));
    let otlp_endpoint = std::env::var("AI_STACK_OTEL_ENDPOINT").ok();
    let service_name = std::env::var("AI_STACK_SERVICE_NAME").unwrap_or_else(|_| "ai-stack-monitor".into());

    let base = Registry::default().with(EnvFilter::from_default_env());
    let fmt_layer = if json { fmt::layer().with_target(false) } else { fmt::layer() };

    if let Some(endpoint) = otlp_endpoint {
        use opentelemetry::KeyValue;
        use opentelemetry_otlp::WithExportConfig;
        use opentelemetry_sdk::{trace as sdktrace, Resource};

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint)
            .build()?;
        let resource = Resource::builder_empty()
            .with_attribute(KeyValue::new("service.name", service_name.clone()))
            .build();
        let mut builder = sdktrace::SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource);

        if let Ok(ratio_str) = std::env::var("AI_STACK_TRACE_SAMPLE_RATIO") {
            if let Ok(ratio) = ratio_str.parse::<f64>() {
                builder = builder.with_sampler(sdktrace::Sampler::TraceIdRatioBased(ratio));
            }
        }

        let provider = builder.build();
        let tracer = provider.tracer("ai-stack-monitor");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        base.with(fmt_layer).with(otel_layer).try_init()?;
        tracing::info!("OTLP tracing enabled");
        otel_global::set_tracer_provider(provider);
    } else {
        base.with(fmt_layer).try_init()?;
    }
    Ok(())
}

fn get_or_make_request_id(headers: &axum::http::HeaderMap) -> String {
    if let Some(v) = headers.get("x-request-id").and_then(|h| h.to_str().ok()) {
        return v.to_string();
    }
    uuid::Uuid::new_v4().to_string()
}

fn extract_traceparent(headers: &axum::http::HeaderMap) -> Option<opentelemetry::Context> {
    let ctx = opentelemetry::global::get_text_map_propagator(|prop| prop.extract(&HeaderExtractor(headers)));
    if ctx.span().span_context().is_valid() {
        Some(ctx)
    } else {
        None
    }
}

struct HeaderExtractor<'a>(&'a axum::http::HeaderMap);
impl<'a> opentelemetry::propagation::Extractor for HeaderExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }
    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to install ctrl_c handler");
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_stack_monitor::docker::{ContainerBrief, RawStatsSample};
    use ai_stack_monitor::models::ServiceDescriptor;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    struct FakeRuntime {
        available: bool,
        containers: Vec<ContainerBrief>,
        logs: Vec<String>,
    }

    impl FakeRuntime {
        fn unavailable() -> Self {
            Self {
                available: false,
                containers: vec![],
                logs: vec![],
            }
        }

        fn with_containers(containers: Vec<ContainerBrief>) -> Self {
            Self {
                available: true,
                containers,
                logs: vec![],
            }
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn list_containers(&self, name_filter: Option<&str>) -> Result<Vec<ContainerBrief>, RuntimeError> {
            if !self.available {
                return Err(RuntimeError::Unavailable);
            }
            let mut containers = self.containers.clone();
            if let Some(filter) = name_filter {
                containers.retain(|c| c.name.contains(filter));
            }
            Ok(containers)
        }

        async fn fetch_logs(&self, name: &str, tail: usize, _since: Option<i64>) -> Result<Vec<String>, RuntimeError> {
            if !self.available {
                return Err(RuntimeError::Unavailable);
            }
            if !self.containers.iter().any(|c| c.name.contains(name)) {
                return Err(RuntimeError::NotFound(name.to_string()));
            }
            let skip = self.logs.len().saturating_sub(tail);
            Ok(self.logs[skip..].to_vec())
        }

        async fn sample_stats(&self, name: &str) -> Result<RawStatsSample, RuntimeError> {
            if !self.available {
                return Err(RuntimeError::Unavailable);
            }
            Err(RuntimeError::NotFound(name.to_string()))
        }

        async fn send_signal(&self, name: &str, _signal: &str) -> Result<(), RuntimeError> {
            if !self.available {
                return Err(RuntimeError::Unavailable);
            }
            Err(RuntimeError::NotFound(name.to_string()))
        }

        async fn restart(&self, name: &str) -> Result<(), RuntimeError> {
            if !self.available {
                return Err(RuntimeError::Unavailable);
            }
            if !self.containers.iter().any(|c| c.name.contains(name)) {
                return Err(RuntimeError::NotFound(name.to_string()));
            }
            Ok(())
        }

        async fn exec(&self, name: &str, _argv: &[String]) -> Result<String, RuntimeError> {
            if !self.available {
                return Err(RuntimeError::Unavailable);
            }
            Err(RuntimeError::NotFound(name.to_string()))
        }
    }

    fn test_state(runtime: Arc<dyn ContainerRuntime>, registry: ServiceRegistry) -> AppState {
        let mut settings = Settings::default();
        settings.nginx.upstream_dir = std::env::temp_dir()
            .join("ai-stack-monitor-test-upstreams")
            .to_string_lossy()
            .to_string();
        let monitor = ServiceMonitor::new(settings, registry, runtime);
        AppState {
            monitor: monitor.handle(),
            credentials: None,
        }
    }

    fn single_service_registry() -> ServiceRegistry {
        ServiceRegistry::from_descriptors(vec![ServiceDescriptor {
            key: "dify-api".to_string(),
            name: "Dify API".to_string(),
            // Nothing listens on port 1, probes fail fast.
            url: "http://127.0.0.1:1/health".to_string(),
            optional: false,
        }])
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), 256 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn api_status_reports_down_with_name() {
        let state = test_state(Arc::new(FakeRuntime::unavailable()), single_service_registry());
        let app = build_router(state);
        let resp = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        let entry = &v["services"]["dify-api"];
        assert_eq!(entry["status"], "down");
        assert_eq!(entry["name"], "Dify API");
        assert!(entry["response_time"].is_null());
        assert!(entry["error"].is_string());
    }

    #[tokio::test]
    async fn api_logs_unknown_service_is_404() {
        let state = test_state(Arc::new(FakeRuntime::unavailable()), single_service_registry());
        let app = build_router(state);
        let resp = app
            .oneshot(Request::builder().uri("/api/logs/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"], "Service not found");
    }

    #[tokio::test]
    async fn api_logs_without_runtime_is_503() {
        let state = test_state(Arc::new(FakeRuntime::unavailable()), single_service_registry());
        let app = build_router(state);
        let resp = app
            .oneshot(Request::builder().uri("/api/logs/dify-api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(resp).await["error"], "Docker socket not available");
    }

    #[tokio::test]
    async fn api_logs_filters_by_level_and_search() {
        let runtime = FakeRuntime {
            available: true,
            containers: vec![ContainerBrief {
                id: "c0ffee000001".to_string(),
                name: "ai-stack-dify-api-1".to_string(),
                image: "dify:latest".to_string(),
                state: "running".to_string(),
                status: "Up 1 hour".to_string(),
            }],
            logs: vec![
                "2026-01-01T00:00:01Z ERROR database timeout".to_string(),
                "2026-01-01T00:00:02Z INFO request served".to_string(),
                "2026-01-01T00:00:03Z error: worker crashed".to_string(),
            ],
        };
        let state = test_state(Arc::new(runtime), single_service_registry());
        let app = build_router(state);
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/logs/dify-api?level=error&search=worker")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        let logs = v["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].as_str().unwrap().contains("worker crashed"));
    }

    #[tokio::test]
    async fn api_services_without_runtime_is_503() {
        let state = test_state(Arc::new(FakeRuntime::unavailable()), single_service_registry());
        let app = build_router(state);
        let resp = app
            .oneshot(Request::builder().uri("/api/services").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(resp).await["error"], "Docker socket not available");
    }

    #[tokio::test]
    async fn api_services_lists_containers() {
        let runtime = FakeRuntime::with_containers(vec![ContainerBrief {
            id: "deadbeef0001".to_string(),
            name: "ai-stack-nginx-1".to_string(),
            image: "nginx:alpine".to_string(),
            state: "running".to_string(),
            status: "Up 2 hours".to_string(),
        }]);
        let state = test_state(Arc::new(runtime), single_service_registry());
        let app = build_router(state);
        let resp = app
            .oneshot(Request::builder().uri("/api/services").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v[0]["name"], "ai-stack-nginx-1");
        assert_eq!(v[0]["image"], "nginx:alpine");
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_text_exposition() {
        let state = test_state(Arc::new(FakeRuntime::unavailable()), single_service_registry());
        let app = build_router(state);
        let resp = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("ai_stack_system_cpu_percent"));
        assert!(body.contains("ai_stack_system_memory_percent"));
    }

    #[tokio::test]
    async fn responses_carry_security_headers() {
        let state = test_state(Arc::new(FakeRuntime::unavailable()), single_service_registry());
        let app = build_router(state);
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.headers()["X-Frame-Options"], "SAMEORIGIN");
        assert_eq!(resp.headers()["X-Content-Type-Options"], "nosniff");
        assert_eq!(resp.headers()["Referrer-Policy"], "strict-origin-when-cross-origin");
    }

    #[tokio::test]
    async fn views_require_auth_when_credentials_configured() {
        let mut state = test_state(Arc::new(FakeRuntime::unavailable()), single_service_registry());
        state.credentials = Some(Arc::new(BasicCredentials::new("admin", "hunter2")));
        let app = build_router(state);

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key("WWW-Authenticate"));

        use base64::Engine;
        let header = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode("admin:hunter2")
        );
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("Authorization", header)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // The JSON API stays open for the scrape and dashboard fetches.
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn restart_unknown_service_is_404() {
        let state = test_state(Arc::new(FakeRuntime::unavailable()), single_service_registry());
        let app = build_router(state);
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/restart/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn filter_logs_level_then_search() {
        let lines = vec![
            "WARN disk almost full".to_string(),
            "INFO started".to_string(),
            "warning: retrying".to_string(),
        ];
        let filtered = filter_logs(lines.clone(), "warning", "");
        assert_eq!(filtered, vec!["warning: retrying".to_string()]);

        let filtered = filter_logs(lines.clone(), "all", "DISK");
        assert_eq!(filtered, vec!["WARN disk almost full".to_string()]);

        let filtered = filter_logs(lines, "all", "");
        assert_eq!(filtered.len(), 3);
    }
}
