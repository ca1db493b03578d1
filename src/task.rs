use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Input context for one task: the execution-context variables plus each
/// upstream task's output, keyed by that task's id.
pub type TaskContext = BTreeMap<String, String>;

/// Task lifecycle. Succeeded and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Running => write!(f, "running"),
            TaskState::Succeeded => write!(f, "succeeded"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

/// One unit of pipeline work bound to an agent.
///
/// The instruction template and dependency list are fixed at construction;
/// only the lifecycle state moves, through the runner.
pub struct Task {
    id: String,
    agent: String,
    template: String,
    depends_on: Vec<String>,
    output_file: Option<String>,
    state: TaskState,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        agent: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            agent: agent.into(),
            template: template.into(),
            depends_on: vec![],
            output_file: None,
            state: TaskState::Pending,
        }
    }

    /// Declare an upstream task whose output feeds this task's context.
    pub fn depends_on(mut self, task_id: impl Into<String>) -> Self {
        self.depends_on.push(task_id.into());
        self
    }

    /// Persist this task's output to a path template. `{timestamp}` expands
    /// to the completion time as `YYYYMMDD_HHMMSS`.
    pub fn with_output_file(mut self, template: impl Into<String>) -> Self {
        self.output_file = Some(template.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub fn output_file(&self) -> Option<&str> {
        self.output_file.as_deref()
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Render the instruction template against a task context.
    pub fn render(&self, context: &TaskContext) -> Result<String, RenderError> {
        render(&self.template, context)
    }

    /// Resolve the artifact path for the given completion time.
    pub fn artifact_path(&self, finished_at: DateTime<Utc>) -> Option<String> {
        self.output_file.as_ref().map(|template| {
            template.replace(
                "{timestamp}",
                &finished_at.format("%Y%m%d_%H%M%S").to_string(),
            )
        })
    }

    pub(crate) fn reset(&mut self) {
        self.state = TaskState::Pending;
    }

    pub(crate) fn start(&mut self) {
        self.state = TaskState::Running;
    }

    pub(crate) fn succeed(&mut self) {
        self.state = TaskState::Succeeded;
    }

    pub(crate) fn fail(&mut self) {
        self.state = TaskState::Failed;
    }
}

/// The immutable record of one finished task.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task: String,
    pub output: String,
    pub finished_at: DateTime<Utc>,
    pub state: TaskState,
}

impl TaskResult {
    pub(crate) fn succeeded(task: &str, output: String, finished_at: DateTime<Utc>) -> Self {
        Self {
            task: task.to_string(),
            output,
            finished_at,
            state: TaskState::Succeeded,
        }
    }

    pub(crate) fn failed(task: &str, finished_at: DateTime<Utc>) -> Self {
        Self {
            task: task.to_string(),
            output: String::new(),
            finished_at,
            state: TaskState::Failed,
        }
    }
}

/// A template referenced a variable missing from the task context.
#[derive(Debug)]
pub struct RenderError {
    pub variable: String,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown template variable: {}", self.variable)
    }
}

impl std::error::Error for RenderError {}

/// Substitute `{variable}` placeholders from the context. Braces around
/// anything that is not a variable name pass through literally.
pub(crate) fn render(template: &str, context: &TaskContext) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let name = &after[..end];
        let is_var =
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !is_var {
            out.push('{');
            rest = after;
            continue;
        }

        match context.get(name) {
            Some(value) => out.push_str(value),
            None => {
                return Err(RenderError {
                    variable: name.to_string(),
                });
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn context() -> TaskContext {
        let mut context = TaskContext::new();
        context.insert("topic".into(), "AI Agents".into());
        context.insert("max_results".into(), "50".into());
        context.insert("research_task".into(), "lead one, lead two".into());
        context
    }

    // --- rendering ---

    #[test]
    fn render_substitutes_variables() {
        let task = Task::new(
            "research_task",
            "researcher",
            "Find {max_results} leads about {topic}.",
        );
        let directive = task.render(&context()).unwrap();
        assert_eq!(directive, "Find 50 leads about AI Agents.");
    }

    #[test]
    fn render_substitutes_upstream_output() {
        let task = Task::new("reporting_task", "analyst", "Report on:\n{research_task}");
        let directive = task.render(&context()).unwrap();
        assert_eq!(directive, "Report on:\nlead one, lead two");
    }

    #[test]
    fn render_fails_on_unknown_variable() {
        let task = Task::new("t", "a", "Find leads in {region}.");
        let err = task.render(&context()).err().unwrap();
        assert_eq!(err.variable, "region");
    }

    #[test]
    fn render_keeps_non_variable_braces() {
        let task = Task::new("t", "a", "Emit JSON like {\"name\": \"{topic}\"}");
        let directive = task.render(&context()).unwrap();
        assert_eq!(directive, "Emit JSON like {\"name\": \"AI Agents\"}");
    }

    #[test]
    fn render_keeps_unclosed_brace() {
        let task = Task::new("t", "a", "a { b");
        assert_eq!(task.render(&context()).unwrap(), "a { b");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let mut context = context();
        context.insert("topic".into(), "{max_results}".into());
        let task = Task::new("t", "a", "{topic}");
        assert_eq!(task.render(&context).unwrap(), "{max_results}");
    }

    // --- state machine ---

    #[test]
    fn lifecycle_pending_running_succeeded() {
        let mut task = Task::new("t", "a", "tpl");
        assert_eq!(task.state(), TaskState::Pending);

        task.start();
        assert_eq!(task.state(), TaskState::Running);

        task.succeed();
        assert_eq!(task.state(), TaskState::Succeeded);
    }

    #[test]
    fn lifecycle_pending_running_failed() {
        let mut task = Task::new("t", "a", "tpl");
        task.start();
        task.fail();
        assert_eq!(task.state(), TaskState::Failed);
    }

    #[test]
    fn reset_returns_to_pending() {
        let mut task = Task::new("t", "a", "tpl");
        task.start();
        task.succeed();
        task.reset();
        assert_eq!(task.state(), TaskState::Pending);
    }

    // --- artifact paths ---

    #[test]
    fn artifact_path_formats_completion_time() {
        let task = Task::new("reporting_task", "analyst", "tpl")
            .with_output_file("reports/lead_report_{timestamp}.md");
        let finished_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        assert_eq!(
            task.artifact_path(finished_at).unwrap(),
            "reports/lead_report_20240102_030405.md"
        );
    }

    #[test]
    fn artifact_path_without_output_file() {
        let task = Task::new("t", "a", "tpl");
        let finished_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(task.artifact_path(finished_at), None);
    }

    #[test]
    fn artifact_path_without_timestamp_placeholder() {
        let task = Task::new("t", "a", "tpl").with_output_file("reports/latest.md");
        let finished_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(task.artifact_path(finished_at).unwrap(), "reports/latest.md");
    }

    // --- results ---

    #[test]
    fn succeeded_result_carries_output() {
        let finished_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let result = TaskResult::succeeded("research_task", "two leads".into(), finished_at);
        assert_eq!(result.task, "research_task");
        assert_eq!(result.output, "two leads");
        assert_eq!(result.state, TaskState::Succeeded);
    }

    #[test]
    fn failed_result_has_empty_output() {
        let finished_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let result = TaskResult::failed("research_task", finished_at);
        assert!(result.output.is_empty());
        assert_eq!(result.state, TaskState::Failed);
    }

    #[test]
    fn display_states() {
        assert_eq!(TaskState::Pending.to_string(), "pending");
        assert_eq!(TaskState::Failed.to_string(), "failed");
    }
}
