use std::time::Duration;

use serde_json::Value;

use super::{Tool, ToolError};
use crate::config::{self, ConfigError};

const APIFY_BASE: &str = "https://api.apify.com/v2";

/// Runs a named Apify actor synchronously and returns its dataset items.
///
/// Uses the `run-sync-get-dataset-items` endpoint: the query becomes the
/// actor input, the response is the dataset as a JSON array.
pub struct ApifyActorTool {
    actor: String,
    token: String,
    base_url: String,
    agent: ureq::Agent,
}

impl ApifyActorTool {
    /// Create a tool for the given actor (slash form, e.g.
    /// `code_crafter/apollo-io-scraper`). An empty token fails here.
    pub fn new(actor: impl Into<String>, token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::MissingEnv("APIFY_API_TOKEN"));
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(120)))
            .build()
            .into();

        Ok(Self {
            actor: actor.into(),
            token,
            base_url: APIFY_BASE.to_string(),
            agent,
        })
    }

    /// Create a tool with the token resolved from `APIFY_API_TOKEN`.
    pub fn from_env(actor: impl Into<String>) -> Result<Self, ConfigError> {
        let token = config::require_env("APIFY_API_TOKEN")?;
        Self::new(actor, token)
    }

    /// Point the tool at a different API host, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn run_sync_url(&self) -> String {
        // The API path wants `owner~name` where the actor id is `owner/name`.
        let actor = self.actor.replace('/', "~");
        format!(
            "{}/acts/{}/run-sync-get-dataset-items?token={}",
            self.base_url, actor, self.token
        )
    }
}

impl Tool for ApifyActorTool {
    fn name(&self) -> &str {
        &self.actor
    }

    fn invoke(&self, query: &Value) -> Result<Vec<Value>, ToolError> {
        let raw = self
            .agent
            .post(&self.run_sync_url())
            .send_json(query)?
            .body_mut()
            .read_to_string()?;

        parse_items(&raw)
    }
}

fn parse_items(raw: &str) -> Result<Vec<Value>, ToolError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(ToolError::malformed(format!(
            "expected a record array, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ToolError::malformed(format!("not a record array: {e}"))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
