use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::config::{self, ConfigError};

/// Model used when the `MODEL` environment variable is unset.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Completion settings resolved once, before the pipeline is built.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ModelConfig {
    /// Create a config with the given credential and model id.
    ///
    /// An empty credential fails here, so a misconfigured process dies
    /// before any task runs.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingEnv("GROQ_API_KEY"));
        }
        Ok(Self {
            api_key,
            model: model.into(),
            temperature: 0.1,
            max_tokens: None,
        })
    }

    /// Resolve the config from `GROQ_API_KEY` (required) and `MODEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = config::require_env("GROQ_API_KEY")?;
        let model = config::env_or("MODEL", DEFAULT_MODEL);
        Self::new(api_key, model)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// One completion call: behavioral instructions plus the rendered directive.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

/// Boundary seam for a language-model completion capability.
///
/// Implemented by [`GroqClient`] in production and by hand-written fakes in
/// tests. No observable side effects beyond the returned text.
pub trait CompletionModel: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;
}

/// Error type for completion calls.
#[derive(Debug)]
pub enum ModelError {
    /// Transport failure (DNS, connect, TLS, timeout).
    Transport(String),
    /// The endpoint answered 429.
    RateLimited(String),
    /// The endpoint answered with a non-success status.
    Api(String),
    /// The endpoint answered, but the payload was not a completion.
    Malformed(String),
}

impl ModelError {
    pub fn transport(msg: impl Into<String>) -> Self {
        ModelError::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        ModelError::Malformed(msg.into())
    }
}

impl From<ureq::Error> for ModelError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(429) => ModelError::RateLimited("http status 429".into()),
            ureq::Error::StatusCode(code) => ModelError::Api(format!("http status {code}")),
            other => ModelError::Transport(other.to_string()),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::RateLimited(msg) => write!(f, "rate limited: {msg}"),
            Self::Api(msg) => write!(f, "api: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Client for the Groq OpenAI-compatible chat completions endpoint.
pub struct GroqClient {
    config: ModelConfig,
    endpoint: String,
    agent: ureq::Agent,
}

impl GroqClient {
    pub fn new(config: ModelConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(60)))
            .build()
            .into();

        Self {
            config,
            endpoint: GROQ_ENDPOINT.to_string(),
            agent,
        }
    }

    /// Point the client at a different endpoint, e.g. a local stub.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
        });
        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }
        body
    }
}

impl CompletionModel for GroqClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let auth = format!("Bearer {}", self.config.api_key);
        let raw = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", auth.as_str())
            .send_json(self.request_body(request))?
            .body_mut()
            .read_to_string()
            .map_err(|e| ModelError::transport(e.to_string()))?;

        parse_completion(&raw)
    }
}

fn parse_completion(raw: &str) -> Result<String, ModelError> {
    let response: ChatResponse = serde_json::from_str(raw)
        .map_err(|e| ModelError::malformed(format!("not a completion payload: {e}")))?;

    match response.choices.into_iter().next() {
        Some(choice) => Ok(choice.message.content),
        None => Err(ModelError::malformed("completion payload has no choices")),
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ModelConfig {
        ModelConfig::new("test-key", DEFAULT_MODEL).unwrap()
    }

    // --- ModelConfig ---

    #[test]
    fn empty_credential_rejected_at_construction() {
        let err = ModelConfig::new("", DEFAULT_MODEL).err().unwrap();
        assert!(matches!(err, ConfigError::MissingEnv("GROQ_API_KEY")));
    }

    #[test]
    fn whitespace_credential_rejected_at_construction() {
        let err = ModelConfig::new("   ", DEFAULT_MODEL).err().unwrap();
        assert!(matches!(err, ConfigError::MissingEnv("GROQ_API_KEY")));
    }

    #[test]
    fn default_generation_settings() {
        let config = config();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_tokens, None);
    }

    // --- request body ---

    #[test]
    fn request_body_shape() {
        let client = GroqClient::new(config());
        let body = client.request_body(&CompletionRequest {
            system: "You research leads.".into(),
            user: "Find leads.".into(),
        });

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You research leads.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Find leads.");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn request_body_includes_max_tokens_when_set() {
        let client = GroqClient::new(config().with_max_tokens(512));
        let body = client.request_body(&CompletionRequest {
            system: "s".into(),
            user: "u".into(),
        });
        assert_eq!(body["max_tokens"], 512);
    }

    // --- response parsing ---

    #[test]
    fn parse_completion_extracts_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"two leads"}}]}"#;
        assert_eq!(parse_completion(raw).unwrap(), "two leads");
    }

    #[test]
    fn parse_completion_rejects_empty_choices() {
        let err = parse_completion(r#"{"choices":[]}"#).err().unwrap();
        assert!(matches!(err, ModelError::Malformed(_)));
    }

    #[test]
    fn parse_completion_rejects_garbage() {
        let err = parse_completion("not json").err().unwrap();
        assert!(matches!(err, ModelError::Malformed(_)));
    }

    // --- transport ---

    #[test]
    fn complete_against_unreachable_endpoint_fails() {
        let client = GroqClient::new(config()).with_endpoint("http://localhost:1/nope");
        let err = client
            .complete(&CompletionRequest {
                system: "s".into(),
                user: "u".into(),
            })
            .err()
            .unwrap();
        assert!(matches!(err, ModelError::Transport(_)));
    }

    #[test]
    fn display_rate_limited() {
        let err = ModelError::RateLimited("http status 429".into());
        assert_eq!(err.to_string(), "rate limited: http status 429");
    }
}
