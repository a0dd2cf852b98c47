//! Browser-facing relay that forwards a chat completion to a caller-named endpoint.

use std::time::Duration;

use actix_web::{
    http::{header, Method, StatusCode},
    middleware, web, App, HttpResponse, HttpServer,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    core::DEFAULT_MODEL,
    error::{PlannerError, Result},
    services::llm_client::{ChatCompletionRequest, LlmClient},
};

pub const PROXY_PATH: &str = "/api/llm-proxy";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub upstream_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

impl RelayConfig {
    /// Read `HOST`, `PORT` and `RELAY_TIMEOUT_SECS`, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }
        if let Ok(raw) = std::env::var("PORT") {
            config.port = raw.trim().parse().map_err(|_| {
                PlannerError::Config(format!("PORT must be a port number, got {raw:?}"))
            })?;
        }
        if let Ok(raw) = std::env::var("RELAY_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PlannerError::Config(format!(
                    "RELAY_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?;
            config.upstream_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

impl ProxyRequest {
    fn chat_request(&self) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": self.prompt}));

        let model = self
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL);
        ChatCompletionRequest::new(model, messages)
    }
}

/// Adds `Access-Control-Allow-Origin: *` to every response.
pub fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new().add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
}

/// Registers the proxy resource. Expects a `web::Data<RelayConfig>` in app data.
///
/// Other methods on the proxy path get the same JSON 404 as unknown routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(PROXY_PATH)
            .route(web::post().to(proxy))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::to(not_found)),
    );
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "error": {"code": "NOT_FOUND", "message": "Not found", "retryable": false}
    }))
}

async fn preflight() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"))
        .insert_header((header::ACCESS_CONTROL_MAX_AGE, "86400"))
        .finish()
}

async fn proxy(config: web::Data<RelayConfig>, body: web::Json<ProxyRequest>) -> HttpResponse {
    let request = body.into_inner();

    let api_key = request.api_key.as_deref().map(str::trim).unwrap_or_default();
    let endpoint = request.endpoint.as_deref().map(str::trim).unwrap_or_default();
    if api_key.is_empty() || endpoint.is_empty() {
        let err = PlannerError::Validation("apiKey and endpoint are required".to_string());
        return HttpResponse::BadRequest().json(err.to_error_payload());
    }

    let client = LlmClient::new(api_key);
    let chat = request.chat_request();
    info!(target: "tripagent::relay", endpoint, model = chat.model(), "forwarding completion");

    match client
        .forward(endpoint, &chat.to_value(), config.upstream_timeout)
        .await
    {
        Ok((status, body)) => passthrough(status, body),
        Err(err) => error_response(&err),
    }
}

fn passthrough(status: u16, body: Value) -> HttpResponse {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    match body {
        Value::String(text) => HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(text),
        other => HttpResponse::build(status).json(other),
    }
}

fn error_response(err: &PlannerError) -> HttpResponse {
    warn!(target: "tripagent::relay", error = %err, "relay request failed");
    let status = match err {
        PlannerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    HttpResponse::build(status).json(err.to_error_payload())
}

/// Bind and run the relay until the server stops.
pub async fn serve(config: RelayConfig) -> std::io::Result<()> {
    let bind = (config.host.clone(), config.port);
    info!(target: "tripagent::relay", host = %bind.0, port = bind.1, "starting relay");

    let data = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors_headers())
            .app_data(data.clone())
            .configure(configure)
            .default_service(web::to(not_found))
    })
    .bind(bind)?
    .run()
    .await
}
