use std::collections::BTreeMap;

use crate::config::ConfigError;

/// The input variables every pipeline run must supply.
pub const REQUIRED_VARS: [&str; 5] = ["topic", "role", "location", "budget_min", "max_results"];

/// Typed invocation input for one pipeline run.
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Subject area to research leads for.
    pub topic: String,
    /// Target role or function at the lead organizations.
    pub role: String,
    /// Location filter, e.g. a city or "Remote".
    pub location: String,
    /// Ignore opportunities below this budget.
    pub budget_min: u64,
    /// Cap on the number of leads to collect.
    pub max_results: u32,
}

/// The fixed set of input variables supplied at pipeline start.
///
/// Immutable for the lifetime of a run. Tasks see these variables, plus
/// their upstream outputs, when their instruction templates are rendered.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    vars: BTreeMap<String, String>,
}

impl ExecutionContext {
    pub fn new(inputs: Inputs) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("topic".to_string(), inputs.topic);
        vars.insert("role".to_string(), inputs.role);
        vars.insert("location".to_string(), inputs.location);
        vars.insert("budget_min".to_string(), inputs.budget_min.to_string());
        vars.insert("max_results".to_string(), inputs.max_results.to_string());
        Self { vars }
    }

    /// Build a context from loose key/value pairs.
    ///
    /// Every variable in [`REQUIRED_VARS`] must be present and non-empty.
    pub fn from_vars(vars: BTreeMap<String, String>) -> Result<Self, ConfigError> {
        for key in REQUIRED_VARS {
            match vars.get(key) {
                Some(value) if !value.trim().is_empty() => {}
                _ => return Err(ConfigError::MissingInput(key)),
            }
        }
        Ok(Self { vars })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|value| value.as_str())
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> Inputs {
        Inputs {
            topic: "AI Agents".into(),
            role: "AI Agent Development".into(),
            location: "Remote".into(),
            budget_min: 1000,
            max_results: 50,
        }
    }

    #[test]
    fn typed_inputs_populate_all_variables() {
        let ctx = ExecutionContext::new(inputs());
        assert_eq!(ctx.get("topic"), Some("AI Agents"));
        assert_eq!(ctx.get("role"), Some("AI Agent Development"));
        assert_eq!(ctx.get("location"), Some("Remote"));
        assert_eq!(ctx.get("budget_min"), Some("1000"));
        assert_eq!(ctx.get("max_results"), Some("50"));
    }

    #[test]
    fn from_vars_accepts_complete_set() {
        let ctx = ExecutionContext::new(inputs());
        let rebuilt = ExecutionContext::from_vars(ctx.vars().clone()).unwrap();
        assert_eq!(rebuilt.get("topic"), Some("AI Agents"));
    }

    #[test]
    fn from_vars_rejects_missing_key() {
        let mut vars = ExecutionContext::new(inputs()).vars().clone();
        vars.remove("location");
        let err = ExecutionContext::from_vars(vars).err().unwrap();
        assert!(matches!(err, ConfigError::MissingInput("location")));
    }

    #[test]
    fn from_vars_rejects_empty_value() {
        let mut vars = ExecutionContext::new(inputs()).vars().clone();
        vars.insert("topic".into(), "  ".into());
        let err = ExecutionContext::from_vars(vars).err().unwrap();
        assert!(matches!(err, ConfigError::MissingInput("topic")));
    }

    #[test]
    fn extra_variables_are_kept() {
        let mut vars = ExecutionContext::new(inputs()).vars().clone();
        vars.insert("industry".into(), "fintech".into());
        let ctx = ExecutionContext::from_vars(vars).unwrap();
        assert_eq!(ctx.get("industry"), Some("fintech"));
    }
}
