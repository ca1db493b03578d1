use std::env;
use std::fmt;

/// Configuration failures, raised while wiring the pipeline and before any
/// task runs.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    MissingEnv(&'static str),
    /// A required pipeline input variable was not supplied.
    MissingInput(&'static str),
    /// The crew profile has no role with this name.
    UnknownRole(String),
    /// The crew profile has no task with this name.
    UnknownTask(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEnv(key) => {
                write!(f, "missing required environment variable: {key}")
            }
            Self::MissingInput(key) => {
                write!(f, "missing required input variable: {key}")
            }
            Self::UnknownRole(name) => write!(f, "unknown role: {name}"),
            Self::UnknownTask(name) => write!(f, "unknown task: {name}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read a required environment variable. Empty values count as missing.
pub fn require_env(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(key)),
    }
}

/// Read an environment variable, falling back to a default when unset or empty.
pub fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_env_missing_variable() {
        let err = require_env("LEADGEN_TEST_UNSET_VARIABLE").err().unwrap();
        assert!(matches!(err, ConfigError::MissingEnv("LEADGEN_TEST_UNSET_VARIABLE")));
    }

    #[test]
    fn env_or_falls_back_to_default() {
        let value = env_or("LEADGEN_TEST_UNSET_VARIABLE", "fallback");
        assert_eq!(value, "fallback");
    }

    #[test]
    fn display_missing_env() {
        let err = ConfigError::MissingEnv("GROQ_API_KEY");
        assert_eq!(
            err.to_string(),
            "missing required environment variable: GROQ_API_KEY"
        );
    }

    #[test]
    fn display_missing_input() {
        let err = ConfigError::MissingInput("topic");
        assert_eq!(err.to_string(), "missing required input variable: topic");
    }

    #[test]
    fn display_unknown_role() {
        let err = ConfigError::UnknownRole("closer".into());
        assert_eq!(err.to_string(), "unknown role: closer");
    }
}
