use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::agent::AgentError;
use crate::context::ExecutionContext;
use crate::memory::Memory;
use crate::pipeline::Pipeline;
use crate::task::{TaskContext, TaskResult, TaskState};
use crate::tools::write_file;

/// Passed to the `on_task` hook after a task completes successfully.
pub struct TaskEvent<'a> {
    pub task: &'a str,
    pub agent: &'a str,
    pub duration: Duration,
    /// 1-based position in the chain.
    pub position: usize,
    pub total: usize,
}

/// Passed to the `on_error` hook when a task fails and the run halts.
pub struct ErrorEvent<'a> {
    pub task: &'a str,
    pub error: &'a RunError,
    pub position: usize,
}

/// Overall status of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed { task: String },
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed { task } => write!(f, "failed at {task}"),
        }
    }
}

/// Aggregate record of one pipeline invocation: the inputs it ran with,
/// the task order, and one write-once result per finished task.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    context: ExecutionContext,
    order: Vec<String>,
    results: BTreeMap<String, TaskResult>,
    status: RunStatus,
}

impl PipelineRun {
    pub(crate) fn new(context: ExecutionContext, order: Vec<String>) -> Self {
        Self {
            context,
            order,
            results: BTreeMap::new(),
            status: RunStatus::Running,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn result(&self, task: &str) -> Option<&TaskResult> {
        self.results.get(task)
    }

    /// Output text of the last task in the chain, once it has finished.
    pub fn final_output(&self) -> Option<&str> {
        self.order
            .last()
            .and_then(|id| self.results.get(id))
            .filter(|result| result.state == TaskState::Succeeded)
            .map(|result| result.output.as_str())
    }

    pub(crate) fn record(&mut self, result: TaskResult) {
        self.results.insert(result.task.clone(), result);
    }

    pub(crate) fn finish(&mut self) {
        self.status = RunStatus::Succeeded;
    }

    pub(crate) fn set_failed(&mut self, task: &str) {
        self.status = RunStatus::Failed {
            task: task.to_string(),
        };
    }
}

/// Error type for pipeline execution. Always names the failing task.
#[derive(Debug)]
pub enum RunError {
    /// An agent could not produce output for a task.
    Task { task: String, source: AgentError },
    /// A task's template referenced a variable missing from its context.
    MissingVariable { task: String, variable: String },
    /// A task referenced an agent the pipeline does not hold.
    UnknownAgent { task: String, agent: String },
    /// The task succeeded but its artifact could not be written.
    Artifact { path: String, source: std::io::Error },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task { task, source } => write!(f, "task '{task}' failed: {source}"),
            Self::MissingVariable { task, variable } => {
                write!(f, "task '{task}' references unknown variable '{variable}'")
            }
            Self::UnknownAgent { task, agent } => {
                write!(f, "task '{task}' references unknown agent '{agent}'")
            }
            Self::Artifact { path, source } => {
                write!(f, "failed to write artifact '{path}': {source}")
            }
        }
    }
}

impl std::error::Error for RunError {}

/// Executes a [`Pipeline`] strictly in task order.
///
/// Each task sees the execution-context variables plus its upstream
/// outputs; the run halts at the first failure and reports which task
/// failed. One runner can be kicked off repeatedly; every invocation gets
/// a fresh [`PipelineRun`].
pub struct Runner {
    pipeline: Pipeline,
    on_task: Option<Box<dyn FnMut(&TaskEvent)>>,
    on_error: Option<Box<dyn FnMut(&ErrorEvent)>>,
}

impl Runner {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            on_task: None,
            on_error: None,
        }
    }

    /// Register a callback that fires after each successful task.
    pub fn on_task(mut self, cb: impl FnMut(&TaskEvent) + 'static) -> Self {
        self.on_task = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires when a task fails.
    pub fn on_error(mut self, cb: impl FnMut(&ErrorEvent) + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Set both hooks to print task transitions and failures to stderr.
    pub fn with_tracing(self) -> Self {
        self.on_task(|e| {
            eprintln!(
                "[task {}/{}] {} ({}) finished in {:.3}s",
                e.position,
                e.total,
                e.task,
                e.agent,
                e.duration.as_secs_f64()
            );
        })
        .on_error(|e| {
            eprintln!("[error] stage {}: {}", e.position, e.error);
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run every task in order against the given inputs.
    pub fn kickoff(
        &mut self,
        inputs: &ExecutionContext,
        memory: &mut Memory,
    ) -> Result<PipelineRun, RunError> {
        let total = self.pipeline.tasks().len();
        let order: Vec<String> = self
            .pipeline
            .tasks()
            .iter()
            .map(|task| task.id().to_string())
            .collect();
        let mut run = PipelineRun::new(inputs.clone(), order);
        self.pipeline.reset_tasks();

        for index in 0..total {
            let position = index + 1;
            let (id, agent_role, dependencies) = {
                let task = &self.pipeline.tasks()[index];
                (
                    task.id().to_string(),
                    task.agent().to_string(),
                    task.dependencies().to_vec(),
                )
            };

            // A task with no upstream dependencies sees exactly the
            // execution context.
            let mut context: TaskContext = inputs.vars().clone();
            for dependency in &dependencies {
                if let Some(result) = run.result(dependency) {
                    context.insert(dependency.clone(), result.output.clone());
                }
            }

            self.pipeline.task_mut(index).start();
            let directive = match self.pipeline.tasks()[index].render(&context) {
                Ok(directive) => directive,
                Err(e) => {
                    let error = RunError::MissingVariable {
                        task: id.clone(),
                        variable: e.variable,
                    };
                    return Err(self.abort(index, position, &mut run, error));
                }
            };

            let started = Instant::now();
            let outcome = {
                let agent = self.pipeline.agent(&agent_role).ok_or_else(|| {
                    RunError::UnknownAgent {
                        task: id.clone(),
                        agent: agent_role.clone(),
                    }
                })?;
                agent.execute(&directive, &context, memory)
            };
            let duration = started.elapsed();

            match outcome {
                Ok(output) => {
                    let finished_at = Utc::now();
                    let result = TaskResult::succeeded(&id, output, finished_at);

                    if let Some(path) = self.pipeline.tasks()[index].artifact_path(finished_at)
                        && let Err(source) = write_file(&path, &result.output)
                    {
                        let error = RunError::Artifact { path, source };
                        return Err(self.abort(index, position, &mut run, error));
                    }

                    self.pipeline.task_mut(index).succeed();
                    if let Some(cb) = &mut self.on_task {
                        cb(&TaskEvent {
                            task: &id,
                            agent: &agent_role,
                            duration,
                            position,
                            total,
                        });
                    }
                    run.record(result);
                }
                Err(source) => {
                    let error = RunError::Task {
                        task: id.clone(),
                        source,
                    };
                    return Err(self.abort(index, position, &mut run, error));
                }
            }
        }

        run.finish();
        Ok(run)
    }

    /// Mark the task and run as failed, fire the error hook, and hand the
    /// error back for propagation. No later task runs.
    fn abort(
        &mut self,
        index: usize,
        position: usize,
        run: &mut PipelineRun,
        error: RunError,
    ) -> RunError {
        self.pipeline.task_mut(index).fail();
        let id = self.pipeline.tasks()[index].id().to_string();
        run.record(TaskResult::failed(&id, Utc::now()));
        run.set_failed(&id);

        if let Some(cb) = &mut self.on_error {
            cb(&ErrorEvent {
                task: &id,
                error: &error,
                position,
            });
        }
        error
    }
}
