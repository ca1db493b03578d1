//! The lead-generation crew: a researcher feeding a reporting analyst.
//!
//! Role and task definitions live here as immutable profiles, looked up by
//! name and validated before the pipeline is built. [`lead_pipeline`] wires
//! them to a completion model and a scraping tool.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::agent::{Agent, ToolPolicy};
use crate::config::ConfigError;
use crate::model::CompletionModel;
use crate::pipeline::{Pipeline, PipelineError};
use crate::task::Task;
use crate::tools::Tool;

pub const RESEARCHER: &str = "researcher";
pub const REPORTING_ANALYST: &str = "reporting_analyst";
pub const RESEARCH_TASK: &str = "research_task";
pub const REPORTING_TASK: &str = "reporting_task";

/// Immutable role definition: name plus behavioral instructions.
#[derive(Debug, Clone, Copy)]
pub struct RoleProfile {
    pub name: &'static str,
    pub instructions: &'static str,
}

/// Immutable task definition: id, instruction template, owning role,
/// upstream dependencies, and optional artifact path template.
#[derive(Debug, Clone, Copy)]
pub struct TaskProfile {
    pub id: &'static str,
    pub agent: &'static str,
    pub template: &'static str,
    pub depends_on: &'static [&'static str],
    pub output_file: Option<&'static str>,
}

const ROLES: [RoleProfile; 2] = [
    RoleProfile {
        name: RESEARCHER,
        instructions: "You are a senior lead research specialist. You find companies and \
            decision makers that match a target profile, working from scraped prospect \
            data when it is available and from your own domain knowledge when it is not. \
            You only report leads you can justify and you never invent contact details.",
    },
    RoleProfile {
        name: REPORTING_ANALYST,
        instructions: "You are a lead reporting analyst. You turn raw research findings \
            into a clear markdown report a sales team can act on: an executive summary, \
            a ranked lead list, and recommended next steps. Plain markdown only, no \
            surrounding code fences.",
    },
];

const TASKS: [TaskProfile; 2] = [
    TaskProfile {
        id: RESEARCH_TASK,
        agent: RESEARCHER,
        template: "Research potential leads for {topic}. Target roles: {role}. Location \
            filter: {location}. Ignore opportunities with a budget below {budget_min} and \
            collect at most {max_results} leads. For each lead capture the organization, \
            a contact, what they are working on, and why they fit.",
        depends_on: &[],
        output_file: None,
    },
    TaskProfile {
        id: REPORTING_TASK,
        agent: REPORTING_ANALYST,
        template: "Using the research findings below, write a lead-generation report for \
            {topic}. Rank the leads by fit, keep contact details exactly as researched, \
            and close with recommended outreach steps.\n\nResearch findings:\n{research_task}",
        depends_on: &[RESEARCH_TASK],
        output_file: Some("lead_report_{timestamp}.md"),
    },
];

/// Directory the report artifact lands in by default.
pub const REPORTS_DIR: &str = "reports";

/// Look up a role profile by name.
pub fn role(name: &str) -> Result<&'static RoleProfile, ConfigError> {
    ROLES
        .iter()
        .find(|profile| profile.name == name)
        .ok_or_else(|| ConfigError::UnknownRole(name.to_string()))
}

/// Look up a task profile by id.
pub fn task(id: &str) -> Result<&'static TaskProfile, ConfigError> {
    TASKS
        .iter()
        .find(|profile| profile.id == id)
        .ok_or_else(|| ConfigError::UnknownTask(id.to_string()))
}

/// Error type for crew assembly.
#[derive(Debug)]
pub enum CrewError {
    Config(ConfigError),
    Pipeline(PipelineError),
}

impl From<ConfigError> for CrewError {
    fn from(e: ConfigError) -> Self {
        CrewError::Config(e)
    }
}

impl From<PipelineError> for CrewError {
    fn from(e: PipelineError) -> Self {
        CrewError::Pipeline(e)
    }
}

impl fmt::Display for CrewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(source) => write!(f, "{source}"),
            Self::Pipeline(source) => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for CrewError {}

/// Assemble the two-stage lead-generation pipeline.
///
/// The researcher gets the scraping tool as best-effort input: a scraper
/// outage degrades the report to model knowledge instead of failing the
/// run. The analyst works from the researcher's output alone.
pub fn lead_pipeline(
    model: Arc<dyn CompletionModel>,
    search_tool: Box<dyn Tool>,
) -> Result<Pipeline, CrewError> {
    lead_pipeline_in(model, search_tool, REPORTS_DIR)
}

/// Same crew, with the report artifact rooted under a different directory.
pub fn lead_pipeline_in(
    model: Arc<dyn CompletionModel>,
    search_tool: Box<dyn Tool>,
    reports_dir: impl AsRef<Path>,
) -> Result<Pipeline, CrewError> {
    let researcher = role(RESEARCHER)?;
    let analyst = role(REPORTING_ANALYST)?;
    let research = task(RESEARCH_TASK)?;
    let reporting = task(REPORTING_TASK)?;

    let researcher = Agent::new(researcher.name, researcher.instructions, Arc::clone(&model))
        .with_tool(search_tool)
        .with_tool_policy(ToolPolicy::BestEffort);
    let analyst = Agent::new(analyst.name, analyst.instructions, model);

    let reports_dir = reports_dir.as_ref();
    let pipeline = Pipeline::builder("leadgen")
        .agent(researcher)
        .agent(analyst)
        .task(build_task(research, reports_dir))
        .task(build_task(reporting, reports_dir))
        .build()?;

    Ok(pipeline)
}

fn build_task(profile: &TaskProfile, reports_dir: &Path) -> Task {
    let mut task = Task::new(profile.id, profile.agent, profile.template);
    for dependency in profile.depends_on {
        task = task.depends_on(*dependency);
    }
    if let Some(output_file) = profile.output_file {
        task = task.with_output_file(reports_dir.join(output_file).display().to_string());
    }
    task
}
