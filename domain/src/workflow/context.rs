//! Per-run workflow context and `{{key}}` parameter resolution.

use super::value_objects::{StepResult, WorkflowError};
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("placeholder pattern"));

/// Memory key under which a completed step's output is stored
pub fn step_output_key(step_id: &str) -> String {
    format!("steps.{}.output", step_id)
}

/// Render a JSON value for substitution: strings verbatim, everything else
/// serialized.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// State of one workflow run. Created at start, discarded at the end.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub workflow_id: String,
    pub started_at: DateTime<Utc>,
    pub results: HashMap<String, StepResult>,
    pub memory: HashMap<String, Value>,
    pub errors: Vec<WorkflowError>,
    /// Caller params, consulted before memory
    params: HashMap<String, Value>,
}

impl WorkflowContext {
    /// Memory starts as a copy of the caller params.
    pub fn new(workflow_id: impl Into<String>, params: HashMap<String, Value>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            started_at: Utc::now(),
            results: HashMap::new(),
            memory: params.clone(),
            errors: Vec::new(),
            params,
        }
    }

    /// Record a settled step; completed outputs become visible to later
    /// steps as `steps.<id>.output`.
    pub fn record(&mut self, result: StepResult) {
        if result.status.is_completed()
            && let Some(output) = &result.output
        {
            self.memory
                .insert(step_output_key(&result.step_id), Value::String(output.clone()));
        }
        self.results.insert(result.step_id.clone(), result);
    }

    pub fn push_error(&mut self, error: WorkflowError) {
        self.errors.push(error);
    }

    /// Value for `key`: caller params first, then memory.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .or_else(|| self.memory.get(key))
            .map(render)
    }

    /// Replace `{{key}}` placeholders. Unknown keys are left untouched.
    pub fn resolve(&self, template: &str) -> String {
        self.resolve_with(template, |_| None)
    }

    /// Like [`resolve`](Self::resolve), consulting `local` before the
    /// context.
    pub fn resolve_with<F>(&self, template: &str, local: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| {
                let key = &caps[1];
                local(key)
                    .or_else(|| self.lookup(key))
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    pub fn step_result(&self, step_id: &str) -> Option<&StepResult> {
        self.results.get(step_id)
    }
}
