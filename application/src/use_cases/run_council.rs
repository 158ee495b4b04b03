//! Council use case
//!
//! Three-stage deliberation over a set of pool agents:
//!
//! 1. **Respond**: every member executes the task independently
//! 2. **Rank**: every member ranks the anonymized responses
//! 3. **Synthesize**: the member with the best-ranked response combines
//!    them using the strategy the consensus level selects
//!
//! Member failures are recorded and deliberation continues with whoever
//! is left; only zero usable responses fails the run.

use super::agent_pool::AgentPool;
use super::shared::{Cancelled, check_cancelled, execute_with_timeout};
use crate::config::CouncilConfig;
use crate::ports::agent_executor::AgentExecutor;
use crate::ports::event_observer::{EventObserver, NoObserver};
use conclave_domain::council::{
    CouncilPrompt, anonymous_id, candidates_from, select_chairman,
};
use conclave_domain::ranking::{
    aggregate_rankings, detect_conflicts, determine_consensus, parse_ranking_text,
};
use conclave_domain::synthesis::{
    generate_synthesis_prompt, local_synthesis, parse_synthesis_response,
};
use conclave_domain::{
    AgentInstance, ChairmanSynthesis, CouncilResult, CouncilStage, MemberRanking, MemberResponse,
    OrchestrationEvent, RankingEntry, SynthesisAnswer, TaskDefinition, TaskOutcome,
    select_strategy,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that end a deliberation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CouncilError {
    #[error("No council members")]
    NoMembers,

    #[error("All council members failed to respond")]
    AllMembersFailed,

    #[error("Council deliberation cancelled")]
    Cancelled,
}

impl From<Cancelled> for CouncilError {
    fn from(_: Cancelled) -> Self {
        CouncilError::Cancelled
    }
}

/// Use case for running a council deliberation
pub struct CouncilUseCase<E: AgentExecutor + 'static> {
    executor: Arc<E>,
    pool: Arc<AgentPool>,
    config: CouncilConfig,
    observer: Arc<dyn EventObserver>,
    cancellation: Option<CancellationToken>,
}

impl<E: AgentExecutor + 'static> CouncilUseCase<E> {
    pub fn new(executor: Arc<E>, pool: Arc<AgentPool>) -> Self {
        Self {
            executor,
            pool,
            config: CouncilConfig::default(),
            observer: Arc::new(NoObserver),
            cancellation: None,
        }
    }

    pub fn with_config(mut self, config: CouncilConfig) -> Self {
        self.config = config;
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

    /// Acquire up to `size` members from the pool (default: the configured
    /// council size), deliberate, and release each member with the outcome
    /// of its stage-1 response.
    pub async fn convene(
        &self,
        task: &TaskDefinition,
        size: Option<usize>,
    ) -> Result<CouncilResult, CouncilError> {
        let size = size.unwrap_or(self.config.size);
        let members: Vec<AgentInstance> = std::iter::from_fn(|| self.pool.acquire_agent(Some(task)))
            .take(size)
            .collect();

        info!(task_id = %task.id, requested = size, acquired = members.len(), "Council convened");

        let result = self.deliberate(task, &members).await;

        for member in &members {
            let outcome = match &result {
                Ok(council) => council
                    .stage1
                    .iter()
                    .find(|r| r.member_id == member.id())
                    .map(|r| TaskOutcome::new(r.is_usable(), r.duration_ms)),
                Err(CouncilError::AllMembersFailed) => Some(TaskOutcome::new(false, 0)),
                Err(_) => None,
            };
            if let Err(e) = self.pool.release_agent(member.id(), outcome) {
                warn!("Failed to release council member {}: {}", member.id(), e);
            }
        }

        result
    }

    /// Run the three stages with `members`.
    pub async fn deliberate(
        &self,
        task: &TaskDefinition,
        members: &[AgentInstance],
    ) -> Result<CouncilResult, CouncilError> {
        if members.is_empty() {
            return Err(CouncilError::NoMembers);
        }

        info!(task_id = %task.id, members = members.len(), "Starting council deliberation");
        check_cancelled(&self.cancellation)?;

        // Stage 1: Respond
        let stage1 = self.stage_respond(task, members).await;
        if !stage1.iter().any(MemberResponse::is_usable) {
            warn!(task_id = %task.id, "No council member produced a usable response");
            return Err(CouncilError::AllMembersFailed);
        }
        check_cancelled(&self.cancellation)?;

        // Stage 2: Rank
        let stage2 = self.stage_rank(task, members, &stage1).await;
        check_cancelled(&self.cancellation)?;

        // Stage 3: Synthesize
        let entries: Vec<RankingEntry> = stage2.iter().flat_map(|r| r.entries.clone()).collect();
        let per_reviewer: Vec<Vec<RankingEntry>> =
            stage2.iter().map(|r| r.entries.clone()).collect();

        let aggregated = aggregate_rankings(&entries);
        let conflicts = detect_conflicts(&entries);
        let consensus = determine_consensus(&per_reviewer);

        let stage3 = self
            .stage_synthesize(task, members, &stage1, &aggregated, &conflicts, consensus)
            .await?;

        info!(
            task_id = %task.id,
            consensus = %consensus,
            strategy = %stage3.strategy,
            chairman = %stage3.chairman_id,
            fallback = stage3.fallback,
            "Council deliberation complete"
        );
        self.observer.on_event(&OrchestrationEvent::CouncilCompleted {
            task_id: task.id.clone(),
            consensus,
            strategy: stage3.strategy,
            chairman_id: stage3.chairman_id.clone(),
            fallback: stage3.fallback,
        });

        Ok(CouncilResult {
            task_id: task.id.clone(),
            final_answer: stage3.answer.answer.clone(),
            stage1,
            stage2,
            stage3,
            aggregated,
            conflicts,
            consensus,
        })
    }

    fn stage_started(&self, task: &TaskDefinition, stage: CouncilStage, members: usize) {
        info!("Stage {}: {}", stage.number(), stage);
        self.observer.on_event(&OrchestrationEvent::CouncilStageStarted {
            task_id: task.id.clone(),
            stage,
            members,
        });
    }

    fn stage_completed(&self, task: &TaskDefinition, stage: CouncilStage, succeeded: usize, total: usize) {
        self.observer.on_event(&OrchestrationEvent::CouncilStageCompleted {
            task_id: task.id.clone(),
            stage,
            succeeded,
            failed: total - succeeded,
        });
    }

    /// Run one task per member concurrently; results come back in member order.
    async fn run_all(
        &self,
        members: &[AgentInstance],
        tasks: Vec<TaskDefinition>,
    ) -> Vec<(Result<String, String>, u64)> {
        let mut join_set = JoinSet::new();

        for (index, (member, member_task)) in members.iter().zip(tasks).enumerate() {
            let executor = Arc::clone(&self.executor);
            let member = member.clone();
            let timeout = self.config.member_timeout;

            join_set.spawn(async move {
                let started = Instant::now();
                let result = execute_with_timeout(executor.as_ref(), &member, &member_task, timeout)
                    .await
                    .map_err(|e| e.to_string());
                (index, result, started.elapsed().as_millis() as u64)
            });
        }

        let mut slots: Vec<Option<(Result<String, String>, u64)>> = vec![None; members.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result, duration_ms)) => slots[index] = Some((result, duration_ms)),
                Err(e) => warn!("Task join error: {}", e),
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| (Err("member task aborted".to_string()), 0)))
            .collect()
    }

    async fn stage_respond(&self, task: &TaskDefinition, members: &[AgentInstance]) -> Vec<MemberResponse> {
        self.stage_started(task, CouncilStage::Respond, members.len());

        let tasks = vec![task.clone(); members.len()];
        let outcomes = self.run_all(members, tasks).await;

        let mut next_label = 0;
        let responses: Vec<MemberResponse> = members
            .iter()
            .zip(outcomes)
            .map(|(member, (result, duration_ms))| {
                let mut response = match result {
                    Ok(content) => MemberResponse::success(member.id(), content, duration_ms),
                    Err(e) => MemberResponse::failure(member.id(), e, duration_ms),
                };
                if response.is_usable() {
                    response.response_id = Some(anonymous_id(next_label));
                    next_label += 1;
                    debug!("Member {} responded", member.id());
                } else {
                    warn!(
                        "Member {} failed: {}",
                        member.id(),
                        response.error.as_deref().unwrap_or("empty response")
                    );
                }
                response
            })
            .collect();

        self.stage_completed(task, CouncilStage::Respond, next_label, members.len());
        responses
    }

    async fn stage_rank(
        &self,
        task: &TaskDefinition,
        members: &[AgentInstance],
        responses: &[MemberResponse],
    ) -> Vec<MemberRanking> {
        self.stage_started(task, CouncilStage::Rank, members.len());

        let anonymized: Vec<(String, String)> = responses
            .iter()
            .filter_map(|r| Some((r.response_id.clone()?, r.content.clone()?)))
            .collect();
        let known: HashSet<&str> = anonymized.iter().map(|(id, _)| id.as_str()).collect();

        let prompt = CouncilPrompt::ranking_prompt(&task.description, &anonymized);
        let tasks = members
            .iter()
            .map(|m| {
                TaskDefinition::new(format!("{}-rank-{}", task.id, m.id()), prompt.clone())
                    .with_priority(task.priority)
            })
            .collect();
        let outcomes = self.run_all(members, tasks).await;

        let rankings: Vec<MemberRanking> = members
            .iter()
            .zip(outcomes)
            .map(|(member, (result, _))| match result {
                Ok(reply) => {
                    let entries = parse_ranking_text(&reply)
                        .into_iter()
                        .filter(|e| known.contains(e.response_id.as_str()))
                        .collect();
                    let ranking = MemberRanking::parsed(member.id(), entries);
                    if !ranking.is_present() {
                        warn!("Member {} returned no usable ranking", member.id());
                    }
                    ranking
                }
                Err(e) => {
                    warn!("Member {} ranking failed: {}", member.id(), e);
                    MemberRanking::absent(member.id(), e)
                }
            })
            .collect();

        let present = rankings.iter().filter(|r| r.is_present()).count();
        self.stage_completed(task, CouncilStage::Rank, present, members.len());
        rankings
    }

    async fn stage_synthesize(
        &self,
        task: &TaskDefinition,
        members: &[AgentInstance],
        responses: &[MemberResponse],
        aggregated: &std::collections::BTreeMap<String, f64>,
        conflicts: &[conclave_domain::ConflictEntry],
        consensus: conclave_domain::ConsensusLevel,
    ) -> Result<ChairmanSynthesis, CouncilError> {
        self.stage_started(task, CouncilStage::Synthesize, 1);

        let chairman_id = select_chairman(responses, aggregated)
            .ok_or(CouncilError::AllMembersFailed)?
            .to_string();
        let chairman = members
            .iter()
            .find(|m| m.id() == chairman_id)
            .ok_or(CouncilError::AllMembersFailed)?;

        let strategy = select_strategy(consensus);
        let candidates = candidates_from(responses, aggregated);
        let prompt = generate_synthesis_prompt(strategy, &task.description, &candidates, conflicts);
        let synthesis_task =
            TaskDefinition::new(format!("{}-synthesis", task.id), prompt).with_priority(task.priority);

        debug!(chairman = %chairman_id, strategy = %strategy, "Chairman synthesizing");
        let reply = execute_with_timeout(
            self.executor.as_ref(),
            chairman,
            &synthesis_task,
            self.config.member_timeout,
        )
        .await;

        let chairman_answer = match reply {
            Ok(text) => {
                let parsed = parse_synthesis_response(&text);
                if parsed.answer.trim().is_empty() {
                    Err("chairman returned an empty answer".to_string())
                } else {
                    Ok(parsed)
                }
            }
            Err(e) => Err(e.to_string()),
        };

        let synthesis = match chairman_answer {
            Ok(answer) => {
                self.stage_completed(task, CouncilStage::Synthesize, 1, 1);
                ChairmanSynthesis {
                    chairman_id,
                    strategy,
                    answer,
                    fallback: false,
                    error: None,
                }
            }
            Err(error) => {
                warn!(
                    "Chairman {} failed ({}), combining {} candidates locally",
                    chairman_id,
                    error,
                    candidates.len()
                );
                self.stage_completed(task, CouncilStage::Synthesize, 0, 1);
                let answer = local_synthesis(strategy, &candidates, self.config.merge_top_k)
                    .ok_or(CouncilError::AllMembersFailed)?;
                ChairmanSynthesis {
                    chairman_id,
                    strategy,
                    answer: SynthesisAnswer {
                        answer,
                        rationale: Some(format!("Combined locally using {}", strategy)),
                        key_points: Vec::new(),
                    },
                    fallback: true,
                    error: Some(error),
                }
            }
        };

        Ok(synthesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::ports::agent_executor::ExecutorError;
    use crate::ports::event_observer::ChannelObserver;
    use async_trait::async_trait;
    use conclave_domain::{
        AgentDefinition, AgentRole, ConsensusLevel, LoadBalancingStrategy, SynthesisStrategy,
    };
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    /// Scripted replies per (agent, stage). Stage is inferred from the task id.
    struct ScriptedExecutor {
        replies: Mutex<HashMap<(String, &'static str), VecDeque<Result<String, ExecutorError>>>>,
    }

    impl ScriptedExecutor {
        fn new() -> Self {
            Self {
                replies: Mutex::new(HashMap::new()),
            }
        }

        fn on(self, agent: &str, stage: &'static str, reply: Result<&str, ExecutorError>) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry((agent.to_string(), stage))
                .or_default()
                .push_back(reply.map(str::to_string));
            self
        }
    }

    fn stage_of(task: &TaskDefinition) -> &'static str {
        if task.id.contains("-rank-") {
            "rank"
        } else if task.id.ends_with("-synthesis") {
            "synthesis"
        } else {
            "respond"
        }
    }

    #[async_trait]
    impl AgentExecutor for ScriptedExecutor {
        async fn execute(
            &self,
            agent: &AgentInstance,
            task: &TaskDefinition,
        ) -> Result<String, ExecutorError> {
            self.replies
                .lock()
                .unwrap()
                .get_mut(&(agent.id().to_string(), stage_of(task)))
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Err(ExecutorError::Failed("no scripted reply".to_string())))
        }
    }

    fn members(ids: &[&str]) -> Vec<AgentInstance> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| AgentInstance::new(AgentDefinition::new(*id, AgentRole::Generalist), i))
            .collect()
    }

    fn council(executor: ScriptedExecutor) -> CouncilUseCase<ScriptedExecutor> {
        CouncilUseCase::new(Arc::new(executor), Arc::new(AgentPool::default()))
    }

    const RANK_A_FIRST: &str = "1. Response A (Score: 9/10) - best\n2. Response B (Score: 5/10)";
    const RANK_B_FIRST: &str = "1. Response B (Score: 8/10)\n2. Response A (Score: 4/10)";

    #[tokio::test]
    async fn test_full_deliberation() {
        let executor = ScriptedExecutor::new()
            .on("m1", "respond", Ok("Use Postgres"))
            .on("m2", "respond", Ok("Use SQLite"))
            .on("m1", "rank", Ok(RANK_A_FIRST))
            .on("m2", "rank", Ok(RANK_A_FIRST))
            .on("m1", "synthesis", Ok("FINAL ANSWER: Postgres\nRATIONALE: both agree"));

        let task = TaskDefinition::new("db", "Pick a database");
        let result = council(executor)
            .deliberate(&task, &members(&["m1", "m2"]))
            .await
            .unwrap();

        assert_eq!(result.stage1[0].response_id.as_deref(), Some("A"));
        assert_eq!(result.stage1[1].response_id.as_deref(), Some("B"));
        assert_eq!(result.aggregated["A"], 9.0);
        assert_eq!(result.aggregated["B"], 5.0);
        assert!(result.conflicts.is_empty());
        assert_eq!(result.consensus, ConsensusLevel::Unanimous);
        assert_eq!(result.stage3.strategy, SynthesisStrategy::BestOfN);
        assert_eq!(result.stage3.chairman_id, "m1");
        assert!(!result.stage3.fallback);
        assert_eq!(result.final_answer, "Postgres");
    }

    #[tokio::test]
    async fn test_split_vote_uses_debate_and_conflicts() {
        let executor = ScriptedExecutor::new()
            .on("m1", "respond", Ok("alpha"))
            .on("m2", "respond", Ok("beta"))
            .on("m1", "rank", Ok(RANK_A_FIRST))
            .on("m2", "rank", Ok(RANK_B_FIRST))
            .on("m1", "synthesis", Ok("alpha, after debate"));

        let task = TaskDefinition::new("t", "Choose");
        let result = council(executor)
            .deliberate(&task, &members(&["m1", "m2"]))
            .await
            .unwrap();

        assert_eq!(result.consensus, ConsensusLevel::Split);
        assert_eq!(result.stage3.strategy, SynthesisStrategy::DebateResolution);
        assert_eq!(result.conflicts.len(), 2);
        // A and B both average 6.5; the tie keeps the earlier response
        assert_eq!(result.stage3.chairman_id, "m1");
        assert_eq!(result.final_answer, "alpha, after debate");
    }

    #[tokio::test]
    async fn test_degraded_path_and_local_fallback() {
        let executor = ScriptedExecutor::new()
            .on("m1", "respond", Err(ExecutorError::Timeout))
            .on("m2", "respond", Ok("only answer"))
            .on("m3", "respond", Ok("   "))
            .on("m2", "rank", Ok("no idea"));

        let task = TaskDefinition::new("t", "Answer");
        let result = council(executor)
            .deliberate(&task, &members(&["m1", "m2", "m3"]))
            .await
            .unwrap();

        assert_eq!(result.usable_responses().count(), 1);
        assert_eq!(result.failed_members(), vec!["m1", "m3"]);
        assert_eq!(result.response("A").unwrap().member_id, "m2");
        assert!(result.stage2.iter().all(|r| !r.is_present()));
        assert_eq!(result.consensus, ConsensusLevel::Split);
        assert_eq!(result.stage3.chairman_id, "m2");
        assert!(result.stage3.fallback);
        assert_eq!(result.final_answer, "only answer");
    }

    #[tokio::test]
    async fn test_all_members_failed() {
        let executor = ScriptedExecutor::new()
            .on("m1", "respond", Err(ExecutorError::Failed("down".to_string())));

        let task = TaskDefinition::new("t", "Answer");
        let err = council(executor)
            .deliberate(&task, &members(&["m1", "m2"]))
            .await
            .unwrap_err();
        assert_eq!(err, CouncilError::AllMembersFailed);
    }

    #[tokio::test]
    async fn test_no_members() {
        let err = council(ScriptedExecutor::new())
            .deliberate(&TaskDefinition::new("t", "x"), &[])
            .await
            .unwrap_err();
        assert_eq!(err, CouncilError::NoMembers);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let err = council(ScriptedExecutor::new())
            .with_cancellation(token)
            .deliberate(&TaskDefinition::new("t", "x"), &members(&["m1"]))
            .await
            .unwrap_err();
        assert_eq!(err, CouncilError::Cancelled);
    }

    #[tokio::test]
    async fn test_convene_acquires_and_releases_members() {
        let pool = Arc::new(AgentPool::new(
            PoolConfig::default().with_strategy(LoadBalancingStrategy::RoundRobin),
        ));
        for id in ["m1", "m2", "m3"] {
            pool.register_agent(AgentDefinition::new(id, AgentRole::Generalist));
        }

        let executor = ScriptedExecutor::new()
            .on("m1", "respond", Ok("one"))
            .on("m2", "respond", Err(ExecutorError::Failed("boom".to_string())))
            .on("m1", "rank", Ok("1. Response A (Score: 7/10)"))
            .on("m1", "synthesis", Ok("FINAL ANSWER: one"));

        let (observer, mut rx) = ChannelObserver::channel();
        let use_case = CouncilUseCase::new(Arc::new(executor), Arc::clone(&pool))
            .with_observer(Arc::new(observer));

        let result = use_case
            .convene(&TaskDefinition::new("t", "Answer"), Some(2))
            .await
            .unwrap();
        assert_eq!(result.stage1.len(), 2);
        assert_eq!(result.final_answer, "one");

        let stats = pool.get_stats();
        assert_eq!(stats.available, 3);
        assert_eq!(pool.get_agent("m1").unwrap().stats.success_rate, 1.0);
        assert_eq!(pool.get_agent("m2").unwrap().stats.success_rate, 0.0);
        assert_eq!(pool.get_agent("m3").unwrap().stats.total_tasks, 0);

        let types: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.event_type())
            .collect();
        assert_eq!(
            types,
            vec![
                "council:stage_started",
                "council:stage_completed",
                "council:stage_started",
                "council:stage_completed",
                "council:stage_started",
                "council:stage_completed",
                "council:completed",
            ]
        );
    }
}
