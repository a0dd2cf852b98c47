//! Response reconciliation: raw model text in, checked itinerary out.

pub mod coverage;
pub mod salvage;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::{PlannerError, Result},
    extract::{extract_required_attractions, RequiredEntitySet},
    schemas::{contract_issues, CompletionSchema},
    types::{coerce_trip_plan, PlanRequest, ReconciliationResult, TripPlan},
};

use salvage::{
    close_truncated, decode_double_encoding, escape_control_chars, isolate_object, parse_object,
    strip_code_fence, truncate_after_last_brace,
};

pub use coverage::{coverage_warning, missing_entities};

pub const DEFAULT_PLACEHOLDER_SUGGESTIONS: &str = "暂无额外建议";

/// Tuning knobs for [`Reconciler`].
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Suggestions text used when the model wrote none
    pub placeholder_suggestions: String,
    /// Characters of the raw response kept in a format error
    pub snippet_chars: usize,
    /// Run advisory schema checks on the parsed object
    pub check_contract: bool,
    pub max_contract_issues: usize,
    /// Cut points tried when closing a truncated response
    pub max_truncation_attempts: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            placeholder_suggestions: DEFAULT_PLACEHOLDER_SUGGESTIONS.to_string(),
            snippet_chars: 200,
            check_contract: true,
            max_contract_issues: 5,
            max_truncation_attempts: 16,
        }
    }
}

type TextStage = fn(&str) -> Option<String>;

// Applied in order while the candidate still does not parse.
const TEXT_STAGES: [(&str, TextStage); 3] = [
    ("truncation_guard", truncation_guard),
    ("double_encoding", decode_double_encoding),
    ("object_isolation", object_isolation),
];

fn truncation_guard(text: &str) -> Option<String> {
    let cut = truncate_after_last_brace(text);
    (cut.len() != text.len()).then(|| cut.to_string())
}

fn object_isolation(text: &str) -> Option<String> {
    let span = isolate_object(text);
    (span.len() != text.len()).then(|| span.to_string())
}

/// Turns untrusted model output into a [`ReconciliationResult`].
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    pub fn with_placeholder_suggestions(mut self, text: impl Into<String>) -> Self {
        self.config.placeholder_suggestions = text.into();
        self
    }

    pub fn with_contract_checks(mut self, enabled: bool) -> Self {
        self.config.check_contract = enabled;
        self
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Recover a JSON object from raw model text.
    ///
    /// Fails with [`PlannerError::Format`] only when every repair stage has been tried.
    pub fn salvage(&self, raw: &str) -> Result<Value> {
        let mut candidate = strip_code_fence(raw).to_string();
        let mut failure = match parse_object(&candidate) {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        for (stage, apply) in TEXT_STAGES {
            let Some(next) = apply(&candidate) else {
                continue;
            };
            debug!(target: "tripagent::reconcile", stage, "applied repair stage");
            candidate = next;
            match parse_object(&candidate) {
                Ok(value) => return Ok(value),
                Err(next_failure) => failure = next_failure,
            }
        }

        let repaired = escape_control_chars(&candidate);
        if repaired != candidate {
            debug!(target: "tripagent::reconcile", stage = "control_chars", "applied repair stage");
        }
        let outcome = match parse_object(&repaired) {
            Ok(value) => Ok(value),
            Err(repair_failure) => match repair_failure.eof_offset {
                Some(offset) => {
                    debug!(target: "tripagent::reconcile", stage = "close_truncated", offset, "response looks truncated");
                    close_truncated(&repaired, offset, self.config.max_truncation_attempts)
                        .ok_or(repair_failure)
                }
                None => Err(repair_failure),
            },
        };

        outcome.map_err(|last| {
            let message = if last.message == failure.message {
                last.message
            } else {
                format!("{} (before repair: {})", last.message, failure.message)
            };
            warn!(target: "tripagent::reconcile", error = %message, "no JSON object could be recovered");
            PlannerError::format(
                format!("no JSON object could be recovered: {message}"),
                raw,
                self.config.snippet_chars,
            )
        })
    }

    /// Full pipeline: salvage, normalize, then check the required attractions are covered.
    pub fn reconcile(
        &self,
        raw: &str,
        required: &RequiredEntitySet,
        fallback_destination: &str,
    ) -> Result<ReconciliationResult> {
        let value = self.salvage(raw)?;

        let contract = if self.config.check_contract {
            contract_issues(TripPlan::schema(), &value, self.config.max_contract_issues)
        } else {
            Vec::new()
        };

        let plan = coerce_trip_plan(&value).map_err(|err| match err {
            PlannerError::Validation(message) => {
                PlannerError::format(message, raw, self.config.snippet_chars)
            }
            other => other,
        })?;

        let mut result = self.normalize(plan, fallback_destination);
        result.contract_issues = contract;

        let missing = missing_entities(&result.itinerary, required);
        if !missing.is_empty() {
            warn!(
                target: "tripagent::reconcile",
                ?missing,
                "itinerary leaves out requested attractions"
            );
            result.suggestions = coverage::append_warning(&result.suggestions, &missing);
        }
        result.missing_entities = missing;

        debug!(
            target: "tripagent::reconcile",
            days = result.day_count(),
            destination = %result.destination,
            "reconciled model response"
        );
        Ok(result)
    }

    /// Reconcile against a planning request: required attractions come from the
    /// request's text and its budget, travelers and preferences are echoed back.
    pub fn reconcile_request(&self, raw: &str, request: &PlanRequest) -> Result<ReconciliationResult> {
        let required = extract_required_attractions(&request.user_text);
        let result = self.reconcile(raw, &required, &request.destination)?;
        Ok(result.echo_request(request))
    }

    fn normalize(&self, plan: TripPlan, fallback_destination: &str) -> ReconciliationResult {
        let destination = plan
            .destination
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| fallback_destination.to_string());

        let suggestions = plan
            .suggestions
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.config.placeholder_suggestions.clone());

        let mut itinerary = plan.itinerary;
        for (position, day) in itinerary.iter_mut().enumerate() {
            if day.day.is_none() {
                day.day = Some(u32::try_from(position + 1).unwrap_or(u32::MAX));
            }
        }

        ReconciliationResult {
            destination,
            itinerary,
            suggestions,
            total_cost: plan.total_cost,
            budget: None,
            travelers: None,
            preferences: Vec::new(),
            missing_entities: Vec::new(),
            contract_issues: Vec::new(),
        }
    }
}

/// [`Reconciler::reconcile`] with the default configuration.
pub fn reconcile(
    raw: &str,
    required: &RequiredEntitySet,
    fallback_destination: &str,
) -> Result<ReconciliationResult> {
    Reconciler::default().reconcile(raw, required, fallback_destination)
}
