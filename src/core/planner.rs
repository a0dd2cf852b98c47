use std::{sync::Arc, time::Duration};

use serde_json::json;
use tracing::{debug, info};

use crate::{
    error::{PlannerError, Result},
    extract::{extract_required_attractions, RequiredEntitySet},
    geo::fill_transport_coordinates,
    reconcile::Reconciler,
    schemas::{inject_schema_instructions, CompletionSchema},
    services::{
        llm_client::{ChatCompletionRequest, CompletionBackend, LlmClient, DEFAULT_BASE_URL},
        planning::{build_system_prompt, build_user_prompt},
    },
    types::{PlanRequest, ReconciliationResult, TripPlan},
};

pub const DEFAULT_MODEL: &str = "openai/gpt-4.1-mini";
/// Upper bound on one model call; long itineraries can take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection settings for the model endpoint.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl PlannerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: Some(8000),
            temperature: Some(0.7),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read `OPENAI_API_KEY`, `OPENAI_BASE_URL` (or `OPENROUTER_BASE_URL`),
    /// `TRIP_AGENT_MODEL` and `TRIP_AGENT_TIMEOUT_SECS`, after loading `.env`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            PlannerError::Config(
                "OPENAI_API_KEY environment variable must be set before creating a TripPlanner"
                    .to_string(),
            )
        })?;
        let mut config = Self::new(api_key);

        if let Ok(base_url) =
            std::env::var("OPENAI_BASE_URL").or_else(|_| std::env::var("OPENROUTER_BASE_URL"))
        {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("TRIP_AGENT_MODEL") {
            config.model = model;
        }
        if let Ok(raw) = std::env::var("TRIP_AGENT_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PlannerError::Config(format!(
                    "TRIP_AGENT_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

/// Extract required attractions, call the model under a deadline, reconcile the reply.
pub struct TripPlanner {
    backend: Arc<dyn CompletionBackend>,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout: Duration,
    reconciler: Reconciler,
}

impl TripPlanner {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(PlannerConfig::new(api_key))
    }

    pub fn from_config(config: PlannerConfig) -> Self {
        let client = LlmClient::new(config.api_key).with_base_url(config.base_url);
        Self {
            backend: Arc::new(client),
            model: config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout,
            reconciler: Reconciler::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(PlannerConfig::from_env()?))
    }

    /// Planner over any backend, with default model settings.
    pub fn with_backend(backend: impl CompletionBackend + 'static) -> Self {
        let defaults = PlannerConfig::new(String::new());
        Self {
            backend: Arc::new(backend),
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout: defaults.timeout,
            reconciler: Reconciler::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Chat request for `request`, with the `TripPlan` output contract in the system message.
    pub fn build_request(
        &self,
        request: &PlanRequest,
        required: &RequiredEntitySet,
    ) -> ChatCompletionRequest {
        let mut messages = vec![
            json!({"role": "system", "content": build_system_prompt()}),
            json!({"role": "user", "content": build_user_prompt(request, required)}),
        ];
        inject_schema_instructions(&mut messages, TripPlan::schema());

        ChatCompletionRequest::new(self.model.clone(), messages)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_json_object_format()
    }

    /// Raw model reply for `request`. Exceeding the deadline is [`PlannerError::Timeout`].
    pub async fn complete_raw(
        &self,
        request: &PlanRequest,
        required: &RequiredEntitySet,
    ) -> Result<String> {
        let chat = self.build_request(request, required);
        debug!(
            target: "tripagent::planner",
            model = %self.model,
            required = required.len(),
            "calling model"
        );

        tokio::time::timeout(self.timeout, self.backend.complete(&chat, self.timeout))
            .await
            .map_err(|_| {
                PlannerError::Timeout(format!(
                    "model call exceeded {}s",
                    self.timeout.as_secs()
                ))
            })?
    }

    pub async fn plan(&self, request: &PlanRequest) -> Result<ReconciliationResult> {
        let required = extract_required_attractions(&request.user_text);
        info!(
            target: "tripagent::planner",
            destination = %request.destination,
            required = ?required.as_slice(),
            "planning trip"
        );

        let raw = self.complete_raw(request, &required).await?;
        let mut result = self
            .reconciler
            .reconcile(&raw, &required, &request.destination)?
            .echo_request(request);

        let filled = fill_transport_coordinates(&mut result.itinerary);
        if filled > 0 {
            debug!(target: "tripagent::planner", filled, "filled transport hub coordinates");
        }

        info!(
            target: "tripagent::planner",
            days = result.day_count(),
            missing = result.missing_entities.len(),
            "trip planned"
        );
        Ok(result)
    }
}
