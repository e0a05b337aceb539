use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::adaptive::catalog::TopicGraph;
use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::difficulty::select_difficulty;
use crate::adaptive::scoring::extract_score;
use crate::adaptive::session::SessionState;
use crate::adaptive::topic_selector::select_next_topic;
use crate::adaptive::types::*;
use crate::constants::SESSION_LOCK_PRUNE_THRESHOLD;
use crate::error::EngineError;
use crate::services::llm_provider::{ModelOptions, TextGenerator};
use crate::services::prompts;
use crate::store::Store;

/// 测评会话引擎：选择下一练习内容，调用文本生成器出题与评估，并持久化每次掌握度更新。
///
/// 同一会话的操作由会话锁串行化，调用生成器期间不持有该锁；不同会话并行执行。
pub struct AssessmentEngine {
    graph: Arc<TopicGraph>,
    config: Arc<RwLock<AdaptiveConfig>>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<Store>,
    model_options: ModelOptions,
    session_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl AssessmentEngine {
    pub fn new(
        graph: Arc<TopicGraph>,
        config: AdaptiveConfig,
        generator: Arc<dyn TextGenerator>,
        store: Arc<Store>,
    ) -> Self {
        Self {
            graph,
            config: Arc::new(RwLock::new(config)),
            generator,
            store,
            model_options: ModelOptions::default(),
            session_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_model_options(mut self, options: ModelOptions) -> Self {
        self.model_options = options;
        self
    }

    pub fn graph(&self) -> &TopicGraph {
        &self.graph
    }

    pub async fn reload_config(&self, new_config: AdaptiveConfig) -> Result<(), EngineError> {
        new_config.validate().map_err(EngineError::Config)?;
        let mut cfg = self.config.write().await;
        *cfg = new_config;
        tracing::info!("Adaptive config reloaded");
        Ok(())
    }

    pub async fn get_config(&self) -> AdaptiveConfig {
        self.config.read().await.clone()
    }

    async fn acquire_lock(&self, key: String) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;

        // strong_count == 1：仅 map 持有，无人等待
        if locks.len() > SESSION_LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, v| Arc::strong_count(v) > 1);
        }

        locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn acquire_session_lock(&self, user_id: &str, session_id: &str) -> Arc<Mutex<()>> {
        self.acquire_lock(format!("{}:{}", user_id, session_id)).await
    }

    #[cfg(test)]
    async fn lock_count(&self) -> usize {
        self.session_locks.lock().await.len()
    }

    /// 恢复用户的活跃会话，或以目录默认值新建会话
    pub async fn start_session(&self, user_id: &str) -> Result<SessionState, EngineError> {
        // 会话 id 不含 ':'，裸用户 id 不会与会话锁键冲突
        let user_lock = self.acquire_lock(user_id.to_string()).await;
        let _guard = user_lock.lock().await;

        if let Some(active) = self.store.active_session_for_user(user_id)? {
            if let Some(state) = self.store.load_session_state(user_id, &active.id)? {
                tracing::info!(user_id, session_id = %state.id, "Resuming active session");
                return Ok(state);
            }
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let state = SessionState::new(&session_id, user_id, &self.graph);
        self.store.create_assessment_session(&state.to_record())?;
        tracing::info!(user_id, session_id = %session_id, topics = self.graph.len(), "Session created");
        Ok(state)
    }

    pub async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionState, EngineError> {
        self.store
            .load_session_state(user_id, session_id)?
            .ok_or_else(|| EngineError::SessionNotFound {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
            })
    }

    /// 选择下一主题和难度档位，不调用生成器
    pub async fn plan_next(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<PracticePlan, EngineError> {
        let config = self.get_config().await;
        let lock = self.acquire_session_lock(user_id, session_id).await;
        let _guard = lock.lock().await;

        let state = self.get_session(user_id, session_id).await?;
        state.ensure_active()?;
        self.plan(&state, &config)
    }

    fn plan(&self, state: &SessionState, config: &AdaptiveConfig) -> Result<PracticePlan, EngineError> {
        let selected = select_next_topic(
            &self.graph,
            &state.mastery_map(),
            &state.attempts_by_topic(),
            config,
        )
        .ok_or_else(|| EngineError::Config("topic catalog is empty".to_string()))?;

        let recent = state.recent_scores(&selected.topic, config.difficulty.recent_window);
        let difficulty = select_difficulty(&recent, &config.difficulty);

        Ok(PracticePlan {
            topic: selected.topic,
            difficulty,
            mastery: selected.mastery,
            topic_score: selected.score,
            prerequisites: selected.prerequisites,
        })
    }

    pub async fn next_question(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Question, EngineError> {
        let config = self.get_config().await;
        let plan = self.plan_next(user_id, session_id).await?;

        tracing::debug!(
            user_id,
            session_id,
            topic = %plan.topic,
            difficulty = %plan.difficulty,
            mastery = plan.mastery,
            "Generating question"
        );

        let prompt = prompts::question_prompt(&plan.topic, plan.difficulty);
        let text = self
            .generate(&prompt, &self.model_options, config.engine.generation_timeout_ms)
            .await?;

        Ok(Question {
            session_id: session_id.to_string(),
            topic: plan.topic,
            difficulty: plan.difficulty,
            text,
        })
    }

    /// 评估答案并应用掌握度更新
    ///
    /// 校验与更新分别在会话锁内执行，生成反馈时不持锁。生成失败时会话保持原样。
    pub async fn submit_answer(
        &self,
        user_id: &str,
        session_id: &str,
        submission: AnswerSubmission,
    ) -> Result<Evaluation, EngineError> {
        let config = self.get_config().await;

        {
            let lock = self.acquire_session_lock(user_id, session_id).await;
            let _guard = lock.lock().await;
            let state = self.get_session(user_id, session_id).await?;
            state.ensure_active()?;
            if !self.graph.contains(&submission.topic) || !state.knows_topic(&submission.topic) {
                return Err(EngineError::InvalidTopic(submission.topic));
            }
        }

        let prompt = prompts::evaluation_prompt(
            &submission.topic,
            submission.difficulty,
            &submission.question,
            &submission.answer,
        );
        let feedback = self
            .generate(
                &prompt,
                &self.model_options.for_evaluation(),
                config.engine.generation_timeout_ms,
            )
            .await?;
        let score = extract_score(&feedback);

        let lock = self.acquire_session_lock(user_id, session_id).await;
        let _guard = lock.lock().await;

        // 解锁期间会话可能已结束或已推进
        let mut state = self.get_session(user_id, session_id).await?;
        let topic = submission.topic.clone();
        let record = AttemptRecord {
            topic: submission.topic,
            question: submission.question,
            answer: submission.answer,
            score,
            difficulty: submission.difficulty,
            timestamp: Utc::now(),
            time_spent_secs: submission.time_spent_secs.max(0.0),
        };
        let outcome = state.record_attempt(record, &config.mastery)?;

        let (Some(knowledge), Some(attempt)) = (state.knowledge(&topic), state.attempts().last())
        else {
            return Err(EngineError::InvalidTopic(topic));
        };
        self.store
            .persist_attempt(&state.to_record(), knowledge, attempt)?;

        let recent = state.recent_scores(&topic, config.difficulty.recent_window);
        let next_difficulty = select_difficulty(&recent, &config.difficulty);

        tracing::info!(
            user_id,
            session_id,
            topic = %topic,
            score,
            mastery = outcome.new_mastery,
            streak = outcome.streak,
            "Answer evaluated"
        );

        Ok(Evaluation {
            session_id: session_id.to_string(),
            topic,
            score,
            feedback,
            outcome,
            next_difficulty,
        })
    }

    pub async fn complete_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionSnapshot, EngineError> {
        self.close_session(user_id, session_id, SessionStatus::Completed)
            .await
    }

    pub async fn abandon_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionSnapshot, EngineError> {
        self.close_session(user_id, session_id, SessionStatus::Abandoned)
            .await
    }

    async fn close_session(
        &self,
        user_id: &str,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<SessionSnapshot, EngineError> {
        let config = self.get_config().await;
        let lock = self.acquire_session_lock(user_id, session_id).await;
        let _guard = lock.lock().await;

        let mut state = self.get_session(user_id, session_id).await?;
        match status {
            SessionStatus::Abandoned => state.abandon()?,
            _ => state.complete()?,
        }
        self.store.update_session_meta(&state.to_record())?;

        let snapshot = state.snapshot(&config.mastery);
        tracing::info!(
            user_id,
            session_id,
            status = %snapshot.status,
            total_attempts = snapshot.total_attempts,
            average_score = snapshot.average_score,
            "Session closed"
        );
        Ok(snapshot)
    }

    pub async fn session_stats(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionSnapshot, EngineError> {
        let config = self.get_config().await;
        let state = self.get_session(user_id, session_id).await?;
        Ok(state.snapshot(&config.mastery))
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &ModelOptions,
        timeout_ms: u64,
    ) -> Result<String, EngineError> {
        let call = self.generator.generate_text(prompt, options);
        match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Text generation failed");
                Err(e.into())
            }
            Err(_) => {
                tracing::warn!(timeout_ms, "Text generation timed out");
                Err(EngineError::GenerationUnavailable(format!(
                    "no response within {timeout_ms}ms"
                )))
            }
        }
    }
}
