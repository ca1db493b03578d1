use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::agent::Agent;
use crate::task::Task;

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum PipelineError {
    Empty,
    DuplicateAgent(String),
    DuplicateTask(String),
    UnknownAgent { task: String, agent: String },
    UnknownDependency { task: String, dependency: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "pipeline has no tasks"),
            Self::DuplicateAgent(role) => write!(f, "duplicate agent role: {role}"),
            Self::DuplicateTask(id) => write!(f, "duplicate task id: {id}"),
            Self::UnknownAgent { task, agent } => {
                write!(f, "task '{task}' references unknown agent '{agent}'")
            }
            Self::UnknownDependency { task, dependency } => write!(
                f,
                "task '{task}' depends on '{dependency}', which is not declared earlier in the pipeline"
            ),
        }
    }
}

impl std::error::Error for PipelineError {}

// ---------------------------------------------------------------------------
// PipelineBuilder
// ---------------------------------------------------------------------------

pub struct PipelineBuilder {
    name: &'static str,
    agents: HashMap<String, Agent>,
    tasks: Vec<Task>,
    duplicate_agent: Option<String>,
    duplicate_task: Option<String>,
}

impl PipelineBuilder {
    pub fn agent(mut self, agent: Agent) -> Self {
        let role = agent.role().to_string();
        if self.agents.contains_key(&role) {
            self.duplicate_agent = Some(role.clone());
        }
        self.agents.insert(role, agent);
        self
    }

    /// Append a task. Execution order is declaration order.
    pub fn task(mut self, task: Task) -> Self {
        if self.tasks.iter().any(|existing| existing.id() == task.id()) {
            self.duplicate_task = Some(task.id().to_string());
        }
        self.tasks.push(task);
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        if let Some(role) = self.duplicate_agent {
            return Err(PipelineError::DuplicateAgent(role));
        }
        if let Some(id) = self.duplicate_task {
            return Err(PipelineError::DuplicateTask(id));
        }
        if self.tasks.is_empty() {
            return Err(PipelineError::Empty);
        }

        // Every task needs a registered agent, and every dependency must
        // point at an earlier task. That keeps the chain a DAG: no cycles,
        // no forward references.
        let mut seen: HashSet<&str> = HashSet::new();
        for task in &self.tasks {
            if !self.agents.contains_key(task.agent()) {
                return Err(PipelineError::UnknownAgent {
                    task: task.id().to_string(),
                    agent: task.agent().to_string(),
                });
            }
            for dependency in task.dependencies() {
                if !seen.contains(dependency.as_str()) {
                    return Err(PipelineError::UnknownDependency {
                        task: task.id().to_string(),
                        dependency: dependency.clone(),
                    });
                }
            }
            seen.insert(task.id());
        }

        Ok(Pipeline {
            name: self.name,
            agents: self.agents,
            tasks: self.tasks,
        })
    }
}

// ---------------------------------------------------------------------------
// Pipeline (validated, only constructed via build())
// ---------------------------------------------------------------------------

pub struct Pipeline {
    name: &'static str,
    agents: HashMap<String, Agent>,
    tasks: Vec<Task>,
}

impl Pipeline {
    pub fn builder(name: &'static str) -> PipelineBuilder {
        PipelineBuilder {
            name,
            agents: HashMap::new(),
            tasks: Vec::new(),
            duplicate_agent: None,
            duplicate_task: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    // --- stuff the runner uses (keep pub(crate)) ---

    pub(crate) fn agent(&self, role: &str) -> Option<&Agent> {
        self.agents.get(role)
    }

    pub(crate) fn task_mut(&mut self, index: usize) -> &mut Task {
        &mut self.tasks[index]
    }

    pub(crate) fn reset_tasks(&mut self) {
        for task in &mut self.tasks {
            task.reset();
        }
    }
}
