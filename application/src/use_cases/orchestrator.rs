//! Orchestrator use case
//!
//! Runs registered workflows and dynamically decomposed tasks against the
//! agent pool. Steps are layered by their dependencies; each layer (batch)
//! runs concurrently and the next batch starts only once the previous one
//! has settled.

use super::agent_pool::AgentPool;
use super::shared::{Cancelled, check_cancelled, execute_with_timeout, sleep_cancellable};
use crate::config::OrchestratorConfig;
use crate::ports::agent_executor::AgentExecutor;
use crate::ports::event_observer::{EventObserver, NoObserver};
use chrono::Utc;
use conclave_domain::decomposition::layer_by_dependencies;
use conclave_domain::{
    AgentInstance, AgentRole, DomainError, ErrorPolicy, ExecutionStrategy, OrchestrationEvent,
    StepResult, SubTask, TaskDecomposer, TaskDefinition, TaskResult, Workflow, WorkflowContext,
    WorkflowError, WorkflowReport, WorkflowStep,
};
use conclave_domain::task::elapsed_ms;
use futures::future::join_all;
use regex::Captures;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that prevent a run from starting
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("Run cancelled before it started")]
    Cancelled,
}

impl From<Cancelled> for OrchestratorError {
    fn from(_: Cancelled) -> Self {
        OrchestratorError::Cancelled
    }
}

const CANCELLED_MESSAGE: &str = "cancelled";

/// Workflow and task orchestrator
pub struct Orchestrator<E: AgentExecutor + 'static> {
    pool: Arc<AgentPool>,
    executor: Arc<E>,
    decomposer: RwLock<TaskDecomposer>,
    workflows: RwLock<HashMap<String, Workflow>>,
    config: OrchestratorConfig,
    observer: Arc<dyn EventObserver>,
    cancellation: Option<CancellationToken>,
}

impl<E: AgentExecutor + 'static> Orchestrator<E> {
    pub fn new(pool: Arc<AgentPool>, executor: Arc<E>) -> Self {
        Self {
            pool,
            executor,
            decomposer: RwLock::new(TaskDecomposer::new()),
            workflows: RwLock::new(HashMap::new()),
            config: OrchestratorConfig::default(),
            observer: Arc::new(NoObserver),
            cancellation: None,
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_decomposer(mut self, decomposer: TaskDecomposer) -> Self {
        self.decomposer = RwLock::new(decomposer);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn pool(&self) -> &Arc<AgentPool> {
        &self.pool
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // ==================== Registry ====================

    /// Register a workflow, replacing any workflow with the same id.
    pub fn register_workflow(&self, workflow: Workflow) {
        info!(workflow_id = %workflow.id, steps = workflow.steps.len(), "Workflow registered");
        self.workflows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(workflow.id.clone(), workflow);
    }

    pub fn workflow(&self, id: &str) -> Option<Workflow> {
        self.workflows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Registered workflow ids, sorted
    pub fn workflow_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .workflows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Register a decomposition pattern used by [`execute_dynamic`](Self::execute_dynamic).
    pub fn register_pattern<F>(&self, name: &str, matcher: &str, generator: F) -> Result<(), DomainError>
    where
        F: Fn(&TaskDefinition, &Captures<'_>) -> Vec<SubTask> + Send + Sync + 'static,
    {
        self.decomposer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_pattern(name, matcher, generator)
    }

    // ==================== Execution ====================

    /// Run a registered workflow with caller `params`.
    pub async fn execute_workflow(
        &self,
        id: &str,
        params: HashMap<String, Value>,
    ) -> Result<WorkflowReport, OrchestratorError> {
        let workflow = self
            .workflow(id)
            .ok_or_else(|| OrchestratorError::WorkflowNotFound(id.to_string()))?;
        self.run_workflow(&workflow, params).await
    }

    /// Decompose `task` and run its sub-tasks as an ad-hoc workflow.
    pub async fn execute_dynamic(&self, task: &TaskDefinition) -> Result<WorkflowReport, OrchestratorError> {
        let decomposition = self
            .decomposer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .decompose(task);

        info!(
            task_id = %task.id,
            pattern = %decomposition.pattern,
            subtasks = decomposition.subtasks.len(),
            complexity = decomposition.complexity,
            "Task decomposed"
        );

        let workflow = Workflow::from_decomposition(task, &decomposition, self.config.dynamic_on_error);
        self.run_workflow(&workflow, HashMap::new()).await
    }

    /// Acquire an agent, run `task`, release; retried up to
    /// `retry_attempts` more times.
    pub async fn execute_task(&self, task: &TaskDefinition, roles: &[AgentRole]) -> TaskResult {
        let mut runs = self
            .run_attempts(task, roles, 1, self.config.max_attempts())
            .await;
        runs.pop()
            .unwrap_or_else(|| TaskResult::failed(task.id.clone(), None, "no agent ran the task", Utc::now()))
    }

    async fn run_workflow(
        &self,
        workflow: &Workflow,
        params: HashMap<String, Value>,
    ) -> Result<WorkflowReport, OrchestratorError> {
        check_cancelled(&self.cancellation)?;

        let started = Utc::now();
        let mut context = WorkflowContext::new(workflow.id.clone(), params);
        let mut results: Vec<StepResult> = Vec::new();
        let mut cancelled = false;
        // Steps skipped because a dependency failed or was itself blocked
        let mut blocked: HashSet<String> = HashSet::new();

        let layering = layer_by_dependencies(
            workflow
                .steps
                .iter()
                .map(|s| (s.id.as_str(), s.dependencies.as_slice())),
        );

        if !layering.unresolved.is_empty() {
            let known: HashSet<&str> = workflow.steps.iter().map(|s| s.id.as_str()).collect();
            for id in &layering.unresolved {
                let message = workflow
                    .step(id)
                    .and_then(|s| s.dependencies.iter().find(|d| !known.contains(d.as_str())))
                    .map(|missing| format!("unknown dependency '{}'", missing))
                    .unwrap_or_else(|| "dependency cycle".to_string());
                context.push_error(WorkflowError::structural(id.clone(), message));
            }
            warn!(
                workflow_id = %workflow.id,
                unresolved = ?layering.unresolved,
                "Workflow has unresolvable steps"
            );
            self.observer.on_event(&OrchestrationEvent::DecompositionStalled {
                workflow_id: workflow.id.clone(),
                unresolved: layering.unresolved.clone(),
            });
        }

        let attempts = match workflow.on_error {
            ErrorPolicy::Retry => 1 + workflow.max_retries.unwrap_or(self.config.retry_attempts),
            ErrorPolicy::Stop | ErrorPolicy::Continue => 1,
        };

        info!(
            workflow_id = %workflow.id,
            steps = workflow.steps.len(),
            batches = layering.batches.len(),
            on_error = %workflow.on_error,
            "Starting workflow"
        );
        self.observer.on_event(&OrchestrationEvent::WorkflowStarted {
            workflow_id: workflow.id.clone(),
            steps: workflow.steps.len(),
            batches: layering.batches.len(),
        });

        for (index, batch) in layering.batches.iter().enumerate() {
            if check_cancelled(&self.cancellation).is_err() {
                cancelled = true;
                context.push_error(WorkflowError::cancelled(format!(
                    "cancelled before batch {}",
                    index + 1
                )));
                break;
            }

            info!(workflow_id = %workflow.id, batch = index + 1, steps = ?batch, "Running batch");
            self.observer.on_event(&OrchestrationEvent::BatchStarted {
                workflow_id: workflow.id.clone(),
                batch: index + 1,
                steps: batch.clone(),
            });

            let steps: Vec<(&WorkflowStep, Option<&String>)> = batch
                .iter()
                .filter_map(|id| workflow.step(id))
                .map(|step| {
                    let blocked_by = step.dependencies.iter().find(|d| {
                        blocked.contains(d.as_str())
                            || context.step_result(d).is_some_and(StepResult::is_failed)
                    });
                    (step, blocked_by)
                })
                .collect();
            blocked.extend(
                steps
                    .iter()
                    .filter(|(_, blocked_by)| blocked_by.is_some())
                    .map(|(step, _)| step.id.clone()),
            );
            let settled = join_all(steps.iter().map(|(step, blocked_by)| {
                self.run_step(&workflow.id, step, *blocked_by, &context, attempts)
            }))
            .await;

            let batch_cancelled = check_cancelled(&self.cancellation).is_err();
            let mut batch_failed = false;
            for result in settled {
                if result.is_failed() {
                    batch_failed = true;
                    let error = result.error.clone().unwrap_or_default();
                    if !batch_cancelled {
                        context.push_error(WorkflowError::execution(result.step_id.clone(), error));
                    }
                }
                results.push(result.clone());
                context.record(result);
            }

            if batch_cancelled {
                cancelled = true;
                context.push_error(WorkflowError::cancelled(format!(
                    "cancelled during batch {}",
                    index + 1
                )));
                break;
            }

            if batch_failed && workflow.on_error != ErrorPolicy::Continue {
                warn!(
                    workflow_id = %workflow.id,
                    batch = index + 1,
                    policy = %workflow.on_error,
                    "Batch failed, aborting remaining batches"
                );
                break;
            }
        }

        let report = WorkflowReport {
            workflow_id: workflow.id.clone(),
            results,
            errors: context.errors,
            unresolved: layering.unresolved,
            total_steps: workflow.steps.len(),
            cancelled,
            started_at: started,
            duration_ms: elapsed_ms(started, Utc::now()),
        };

        info!(
            workflow_id = %workflow.id,
            success = report.success(),
            completed = report.completed_count(),
            failed = report.failed_steps().len(),
            duration_ms = report.duration_ms,
            "Workflow finished"
        );
        self.observer.on_event(&OrchestrationEvent::WorkflowCompleted {
            workflow_id: workflow.id.clone(),
            success: report.success(),
            completed: report.completed_count(),
            failed: report.failed_steps().len(),
            cancelled: report.cancelled,
            duration_ms: report.duration_ms,
        });

        Ok(report)
    }

    async fn run_step(
        &self,
        workflow_id: &str,
        step: &WorkflowStep,
        blocked_by: Option<&String>,
        context: &WorkflowContext,
        max_attempts: u32,
    ) -> StepResult {
        if blocked_by.is_some() || !step.should_run(context) {
            if let Some(dependency) = blocked_by {
                debug!(step_id = %step.id, dependency = %dependency, "Skipping step blocked by failed dependency");
            } else {
                debug!(step_id = %step.id, "Step condition not met, skipping");
            }
            self.observer.on_event(&OrchestrationEvent::StepSkipped {
                workflow_id: workflow_id.to_string(),
                step_id: step.id.clone(),
            });
            return StepResult::skipped(step.id.clone());
        }

        self.observer.on_event(&OrchestrationEvent::StepStarted {
            workflow_id: workflow_id.to_string(),
            step_id: step.id.clone(),
        });

        let params: BTreeMap<String, String> = step
            .params
            .iter()
            .map(|(k, v)| (k.clone(), context.resolve(v)))
            .collect();
        let action = if step.action.is_empty() { &step.name } else { &step.action };
        let description = context.resolve_with(action, |key| params.get(key).cloned());
        let task = step.to_task(description);

        let fanout = match step.strategy {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Parallel => self.config.parallel_fanout.max(1),
        };

        let started = Utc::now();
        let runs = self.run_attempts(&task, &step.roles, fanout, max_attempts).await;
        let result = match step.strategy {
            ExecutionStrategy::Sequential => match runs.into_iter().next() {
                Some(run) => StepResult::from_task(step.id.clone(), run),
                None => StepResult::failed(step.id.clone(), Vec::new(), "no agent ran the step", started),
            },
            ExecutionStrategy::Parallel => StepResult::from_runs(step.id.clone(), runs, started),
        }
        .with_params(params);

        if result.is_completed() {
            debug!(step_id = %step.id, agents = ?result.agent_ids, attempts = result.attempts, "Step completed");
            self.observer.on_event(&OrchestrationEvent::StepCompleted {
                workflow_id: workflow_id.to_string(),
                step_id: step.id.clone(),
                agent_ids: result.agent_ids.clone(),
                duration_ms: result.duration_ms,
                attempts: result.attempts,
            });
        } else {
            let error = result.error.clone().unwrap_or_default();
            warn!(step_id = %step.id, attempts = result.attempts, "Step failed: {}", error);
            self.observer.on_event(&OrchestrationEvent::StepFailed {
                workflow_id: workflow_id.to_string(),
                step_id: step.id.clone(),
                error,
                attempts: result.attempts,
            });
        }

        result
    }

    /// Run `task` on up to `fanout` agents per attempt until one run
    /// completes or `max_attempts` is exhausted. Returns the last attempt's
    /// runs, each stamped with the attempt number.
    async fn run_attempts(
        &self,
        task: &TaskDefinition,
        roles: &[AgentRole],
        fanout: usize,
        max_attempts: u32,
    ) -> Vec<TaskResult> {
        let mut attempt = 1;
        loop {
            if check_cancelled(&self.cancellation).is_err() {
                return vec![
                    TaskResult::failed(task.id.clone(), None, CANCELLED_MESSAGE, Utc::now())
                        .with_attempts(attempt - 1),
                ];
            }

            let runs: Vec<TaskResult> = self
                .attempt(task, roles, fanout)
                .await
                .into_iter()
                .map(|run| run.with_attempts(attempt))
                .collect();

            if runs.iter().any(TaskResult::is_completed) || attempt >= max_attempts {
                return runs;
            }

            let error = runs
                .iter()
                .rev()
                .find_map(|r| r.error.clone())
                .unwrap_or_default();
            warn!(
                task_id = %task.id,
                attempt,
                max_attempts,
                "Attempt failed, retrying in {:?}: {}",
                self.config.retry_delay,
                error
            );
            self.observer.on_event(&OrchestrationEvent::TaskRetry {
                task_id: task.id.clone(),
                attempt: attempt + 1,
                error,
            });

            if sleep_cancellable(self.config.retry_delay, &self.cancellation)
                .await
                .is_err()
            {
                return runs;
            }
            attempt += 1;
        }
    }

    /// One attempt: wait for a first agent, grab up to `fanout - 1` more
    /// idle ones, run them concurrently and release each with its outcome.
    async fn attempt(&self, task: &TaskDefinition, roles: &[AgentRole], fanout: usize) -> Vec<TaskResult> {
        let started = Utc::now();
        let Some(first) = self
            .pool
            .acquire_agent_waiting(Some(task), roles, self.config.agent_wait_timeout)
            .await
        else {
            return vec![TaskResult::failed(
                task.id.clone(),
                None,
                format!(
                    "no agent available within {}ms",
                    self.config.agent_wait_timeout.as_millis()
                ),
                started,
            )];
        };

        let mut agents = vec![first];
        while agents.len() < fanout {
            match self.pool.acquire_agent_with_roles(Some(task), roles) {
                Some(agent) => agents.push(agent),
                None => break,
            }
        }

        join_all(agents.iter().map(|agent| self.run_on(agent, task))).await
    }

    async fn run_on(&self, agent: &AgentInstance, task: &TaskDefinition) -> TaskResult {
        let started = Utc::now();
        debug!(agent_id = %agent.id(), task_id = %task.id, "Executing task");

        let result = match execute_with_timeout(self.executor.as_ref(), agent, task, self.config.task_timeout).await {
            Ok(output) => TaskResult::completed(task.id.clone(), Some(agent.id().to_string()), output, started),
            Err(e) => TaskResult::failed(task.id.clone(), Some(agent.id().to_string()), e.to_string(), started),
        };

        if let Err(e) = self.pool.release_agent(agent.id(), Some(result.outcome())) {
            warn!("Failed to release agent {}: {}", agent.id(), e);
        }
        result
    }
}
